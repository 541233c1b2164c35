//! # Scopes
//!
//! Lexical scopes form a tree rooted at the program (or class) scope. Each scope owns the
//! names attached to it and the root block of its control-flow block tree.

use std::fmt;

use abl_compiler_syntax::{BlockId, NodeId, ScopeId, SymbolId};
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use smol_str::SmolStr;

use crate::table::TableId;
use crate::type_info::TypeInfo;

pub mod table;

pub use table::{NameEntry, NameTable, Namespace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Program,
    Class,
    Interface,
    Procedure,
    Function,
    Method,
    Constructor,
    Destructor,
    PropertyAccessor,
    Trigger,
    Catch,
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Program => "program",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Procedure => "procedure",
            Self::Function => "function",
            Self::Method => "method",
            Self::Constructor => "constructor",
            Self::Destructor => "destructor",
            Self::PropertyAccessor => "property accessor",
            Self::Trigger => "trigger",
            Self::Catch => "catch",
        };
        f.write_str(text)
    }
}

/// Represents a scope in the program
#[derive(Debug, Clone)]
pub struct Scope {
    parent: Option<ScopeId>,
    pub kind: ScopeKind,
    /// Node that introduced the scope
    pub node: Option<NodeId>,
    /// Routine whose body this scope is, if any
    pub routine: Option<SymbolId>,
    root_block: Option<BlockId>,
    /// Class name and compiled type info, on the root scope of a class or interface
    pub class_name: Option<SmolStr>,
    pub type_info: Option<TypeInfo>,
    pub(crate) names: NameTable,
    /// Default buffers of the tables referenced through this scope, in first-reference order
    pub(crate) unnamed_buffers: IndexMap<TableId, SymbolId, FxBuildHasher>,
}

impl Scope {
    pub fn new(parent: Option<ScopeId>, kind: ScopeKind, node: Option<NodeId>) -> Self {
        Self {
            parent,
            kind,
            node,
            routine: None,
            root_block: None,
            class_name: None,
            type_info: None,
            names: NameTable::new(),
            unnamed_buffers: IndexMap::default(),
        }
    }

    pub const fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn root_block(&self) -> BlockId {
        self.root_block
            .expect("scope root block is set when the scope is created")
    }

    pub(crate) fn set_root_block(&mut self, block: BlockId) {
        assert!(self.root_block.is_none(), "scope root block set twice");
        self.root_block = Some(block);
    }

    /// Direct lookup, without walking to the parent scope.
    pub fn lookup(&self, namespace: Namespace, name: &str) -> Option<SymbolId> {
        self.names.lookup(namespace, name)
    }

    /// Names attached to this scope, in definition order.
    pub fn names(&self) -> impl Iterator<Item = &NameEntry> {
        self.names.iter()
    }

    pub fn unnamed_buffer(&self, table: TableId) -> Option<SymbolId> {
        self.unnamed_buffers.get(&table).copied()
    }
}
