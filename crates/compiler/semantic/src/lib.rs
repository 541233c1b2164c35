#![allow(clippy::option_if_let_else)]

//! # ABL Semantic Analysis
//!
//! The tree parser: a single depth-first pass over an ABL parse tree that resolves every
//! name the tree mentions and records what it finds.
//!
//! ## Architecture
//!
//! 1. **Scopes & Blocks**: procedures, functions, methods, triggers and CATCH blocks
//!    introduce scopes; DO, FOR and REPEAT introduce blocks that buffers are scoped to
//! 2. **Symbols**: variables, routines, buffers, events, browses and widgets, defined in
//!    two phases so a symbol is invisible to lookup until its statement is complete
//! 3. **Tables**: schema tables come from a [`SchemaLookup`]; temp-tables are built from
//!    their DEFINE statement, inheriting fields and indexes through LIKE
//! 4. **Qualifiers**: every reference is tagged with how it uses its target (read, write,
//!    buffer initialization, bare name lookup)
//!
//! ## Main entry point
//!
//! [`analyze`] runs the pass over one parse unit and returns its [`SemanticIndex`];
//! [`analyze_units`] does the same for many units in parallel.

pub mod block;
mod builder;
pub mod options;
pub mod qualifier;
pub mod schema;
pub mod scope;
pub mod semantic_errors;
pub mod semantic_index;
pub mod symbol;
pub mod table;
pub mod type_info;

pub use block::{Block, BlockKind, BufferScope, BufferScopeStrength};
pub use options::TreeParserOptions;
pub use qualifier::{ContextQualifier, TableNameResolution};
pub use schema::{Schema, SchemaLookup, SchemaTableRef};
pub use scope::{Namespace, Scope, ScopeKind};
pub use semantic_errors::SemanticError;
pub use semantic_index::{analyze, analyze_units, SemanticIndex, UnresolvedReference};
pub use symbol::{
    DefinitionState, Extent, Parameter, ParameterMode, Routine, RoutineKind, Symbol, SymbolKind,
};
pub use table::{Field, FieldId, Index, IndexFlags, IndexId, Table, TableId, TableKind};
pub use type_info::{TypeInfo, TypeInfoLookup, TypeInfoRegistry};
