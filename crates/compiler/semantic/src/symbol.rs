//! # Symbols
//!
//! Every named entity the tree parser creates is a [`Symbol`]: a common header (name,
//! owning scope, defining node, reference counts, definition state) plus a
//! [`SymbolKind`] payload.
//!
//! Symbols are defined in two phases. A freshly defined symbol is [`DefinitionState::Pending`]:
//! its attributes can be set by the clauses of its defining statement, but name lookup
//! does not see it. Attaching the symbol to its scope at the end of the statement makes
//! it [`DefinitionState::Attached`].

use abl_compiler_syntax::{ContextQualifier, DataType, NodeId, ScopeId, SymbolId, WidgetKind};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::table::{FieldId, TableId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionState {
    Pending,
    Attached,
}

/// Array dimension of a variable or field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Extent {
    #[default]
    Scalar,
    Fixed(u32),
    /// `EXTENT` without a size, fixed at run time
    Indeterminate,
}

/// Reference counts per context qualifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceCounts([u32; ContextQualifier::ALL.len()]);

impl ReferenceCounts {
    pub fn note(&mut self, qualifier: ContextQualifier) {
        self.0[qualifier.index()] += 1;
    }

    pub const fn get(&self, qualifier: ContextQualifier) -> u32 {
        self.0[qualifier.index()]
    }

    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    /// References under a qualifier that writes (REFUP, UPDATING).
    pub fn writes(&self) -> u32 {
        ContextQualifier::ALL
            .iter()
            .filter(|qualifier| qualifier.is_write())
            .map(|qualifier| self.get(*qualifier))
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: SmolStr,
    /// Scope the symbol is defined in (and attached to)
    pub scope: ScopeId,
    pub definition_node: Option<NodeId>,
    pub state: DefinitionState,
    pub references: ReferenceCounts,
    pub kind: SymbolKind,
}

impl Symbol {
    pub fn new(
        name: impl Into<SmolStr>,
        scope: ScopeId,
        definition_node: Option<NodeId>,
        kind: SymbolKind,
    ) -> Self {
        Self {
            name: name.into(),
            scope,
            definition_node,
            state: DefinitionState::Pending,
            references: ReferenceCounts::default(),
            kind,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.state == DefinitionState::Attached
    }

    pub fn note_reference(&mut self, qualifier: ContextQualifier) {
        self.references.note(qualifier);
    }

    pub const fn as_variable(&self) -> Option<&Variable> {
        match &self.kind {
            SymbolKind::Variable(variable) => Some(variable),
            _ => None,
        }
    }

    pub const fn as_routine(&self) -> Option<&Routine> {
        match &self.kind {
            SymbolKind::Routine(routine) => Some(routine),
            _ => None,
        }
    }

    pub const fn as_table_buffer(&self) -> Option<&TableBuffer> {
        match &self.kind {
            SymbolKind::TableBuffer(buffer) => Some(buffer),
            _ => None,
        }
    }

    pub const fn as_field_buffer(&self) -> Option<&FieldBuffer> {
        match &self.kind {
            SymbolKind::FieldBuffer(field_buffer) => Some(field_buffer),
            _ => None,
        }
    }

    pub const fn as_event(&self) -> Option<&Event> {
        match &self.kind {
            SymbolKind::Event(event) => Some(event),
            _ => None,
        }
    }

    pub const fn as_browse(&self) -> Option<&Browse> {
        match &self.kind {
            SymbolKind::Browse(browse) => Some(browse),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    Variable(Variable),
    Routine(Routine),
    TableBuffer(TableBuffer),
    FieldBuffer(FieldBuffer),
    Event(Event),
    Browse(Browse),
    Widget(WidgetKind),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variable {
    pub data_type: Option<DataType>,
    /// Class or interface name when `data_type` is [`DataType::Class`]
    pub class_name: Option<SmolStr>,
    pub extent: Extent,
    pub is_parameter: bool,
    pub is_property: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutineKind {
    Program,
    Procedure,
    Function,
    Method,
    Constructor,
    Destructor,
    PropertyAccessor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterMode {
    Input,
    Output,
    InputOutput,
    Return,
    Buffer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameter {
    pub symbol: SymbolId,
    pub mode: ParameterMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routine {
    pub kind: RoutineKind,
    /// Scope introduced by the routine
    pub routine_scope: ScopeId,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<DataType>,
    pub return_class: Option<SmolStr>,
    /// Node of the FORWARD declaration this routine was first seen at, if any
    pub forward_node: Option<NodeId>,
}

impl Routine {
    pub const fn new(kind: RoutineKind, routine_scope: ScopeId) -> Self {
        Self {
            kind,
            routine_scope,
            parameters: Vec::new(),
            return_type: None,
            return_class: None,
            forward_node: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableBuffer {
    pub table: TableId,
    /// The unnamed buffer a table name refers to, as opposed to a DEFINE BUFFER
    pub is_default: bool,
    pub(crate) field_buffers: FxHashMap<FieldId, SymbolId>,
}

impl TableBuffer {
    pub fn new(table: TableId, is_default: bool) -> Self {
        Self {
            table,
            is_default,
            field_buffers: FxHashMap::default(),
        }
    }

    pub fn field_buffer(&self, field: FieldId) -> Option<SymbolId> {
        self.field_buffers.get(&field).copied()
    }
}

/// The handle through which one buffer reaches one field of its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldBuffer {
    pub buffer: SymbolId,
    pub field: FieldId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    /// Signature parameters; never reachable by name
    pub parameters: Vec<SymbolId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Browse {
    pub query: Option<SmolStr>,
    /// Symbols of the displayed columns, in display order
    pub columns: Vec<SymbolId>,
}
