//! # Tables, fields and indexes
//!
//! Schema tables are materialized into the semantic index the first time a unit refers
//! to them. Temp-tables and work-tables are built field by field while their DEFINE
//! statement is visited and frozen when the statement closes.

use abl_compiler_syntax::{DataType, NodeId};
use bitflags::bitflags;
use smol_str::SmolStr;

use crate::symbol::Extent;

index_vec::define_index_type! {
    pub struct TableId = u32;
}

index_vec::define_index_type! {
    pub struct FieldId = u32;
}

index_vec::define_index_type! {
    pub struct IndexId = u32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Schema,
    TempTable,
    WorkTable,
}

impl From<TableKind> for abl_compiler_syntax::StoreType {
    fn from(kind: TableKind) -> Self {
        match kind {
            TableKind::Schema => Self::DbTable,
            TableKind::TempTable => Self::TempTable,
            TableKind::WorkTable => Self::WorkTable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: SmolStr,
    /// Logical database name, for schema tables
    pub database: Option<SmolStr>,
    pub kind: TableKind,
    pub fields: Vec<FieldId>,
    pub indexes: Vec<IndexId>,
    pub definition_node: Option<NodeId>,
    frozen: bool,
}

impl Table {
    pub const fn new(name: SmolStr, kind: TableKind, definition_node: Option<NodeId>) -> Self {
        Self {
            name,
            database: None,
            kind,
            fields: Vec::new(),
            indexes: Vec::new(),
            definition_node,
            frozen: false,
        }
    }

    pub const fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub(crate) fn freeze(&mut self) {
        self.frozen = true;
    }

    pub(crate) fn push_field(&mut self, field: FieldId) {
        assert!(!self.frozen, "field added to frozen table '{}'", self.name);
        self.fields.push(field);
    }

    pub(crate) fn push_index(&mut self, index: IndexId) {
        assert!(!self.frozen, "index added to frozen table '{}'", self.name);
        self.indexes.push(index);
    }

    /// `db.table` for schema tables, the bare name otherwise.
    pub fn qualified_name(&self) -> SmolStr {
        match &self.database {
            Some(database) => SmolStr::new(format!("{database}.{}", self.name)),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: SmolStr,
    /// Owning table; `None` while a temp-table field is still being defined
    pub table: Option<TableId>,
    pub data_type: Option<DataType>,
    pub class_name: Option<SmolStr>,
    pub extent: Extent,
}

impl Field {
    pub const fn new(name: SmolStr) -> Self {
        Self {
            name,
            table: None,
            data_type: None,
            class_name: None,
            extent: Extent::Scalar,
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct IndexFlags: u8 {
        const UNIQUE  = 1 << 0;
        const PRIMARY = 1 << 1;
        const WORD    = 1 << 2;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: SmolStr,
    pub table: TableId,
    pub fields: Vec<FieldId>,
    pub flags: IndexFlags,
}

impl Index {
    pub const fn is_unique(&self) -> bool {
        self.flags.contains(IndexFlags::UNIQUE)
    }

    pub const fn is_primary(&self) -> bool {
        self.flags.contains(IndexFlags::PRIMARY)
    }
}

/// A field found on a table by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMatch {
    pub field: FieldId,
    /// The name used was a strict prefix of the field name
    pub abbreviated: bool,
}

/// Case-insensitive match of `name` against a list of candidates: an exact match wins,
/// otherwise, when `allow_abbreviation` is set, the single candidate that `name` is a
/// prefix of. Ambiguous prefixes match nothing.
pub(crate) fn match_name<'a, T: Copy>(
    name: &str,
    candidates: impl Iterator<Item = (&'a str, T)> + Clone,
    allow_abbreviation: bool,
) -> Option<(T, bool)> {
    if let Some((_, item)) = candidates
        .clone()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
    {
        return Some((item, false));
    }
    if !allow_abbreviation || name.is_empty() {
        return None;
    }
    let mut prefixed = candidates.filter(|(candidate, _)| {
        candidate.len() > name.len()
            && candidate.as_bytes()[..name.len()].eq_ignore_ascii_case(name.as_bytes())
    });
    match (prefixed.next(), prefixed.next()) {
        (Some((_, item)), None) => Some((item, true)),
        _ => None,
    }
}
