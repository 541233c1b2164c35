//! # ABL Syntax Model
//!
//! The parse tree consumed by the semantic pass: tokens with their provenance, node-kind
//! tags, and an arena of nodes addressed by stable [`NodeId`]s. Nodes carry a slot of
//! [`NodeAttributes`] that the semantic pass fills in place.

pub mod attrs;
pub mod builder;
pub mod kind;
pub mod token;
pub mod tree;

pub use attrs::{
    AttributeFlags, BlockId, BufferScopeId, ContextQualifier, NodeAttributes, ScopeId, StoreType,
    SymbolId,
};
pub use builder::TreeBuilder;
pub use kind::{DataType, Keyword, NodeKind, UnknownDataType, WidgetKind};
pub use token::ProToken;
pub use tree::{Node, NodeFlags, NodeId, ParseTree};
