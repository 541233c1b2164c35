//! Per-node attributes written by the semantic pass.
//!
//! The identifiers declared here index arenas owned by the semantic index. They live in
//! the syntax crate so that a node can link to the symbol, scope, block and buffer scope
//! it resolved to without the tree depending on the semantic model.

use bitflags::bitflags;
use std::fmt;

index_vec::define_index_type! {
    /// A symbol in the semantic index
    pub struct SymbolId = u32;
}

index_vec::define_index_type! {
    /// A lexical scope in the semantic index
    pub struct ScopeId = u32;
}

index_vec::define_index_type! {
    /// A control-flow block in the semantic index
    pub struct BlockId = u32;
}

index_vec::define_index_type! {
    /// A buffer scope (the binding of a buffer to a block)
    pub struct BufferScopeId = u32;
}

/// How a name is being used at a reference site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContextQualifier {
    /// Plain read
    Ref,
    /// Read and write
    RefUp,
    /// Write
    Updating,
    /// Record reference that scopes the buffer to the enclosing block
    Init,
    /// Record reference that adds a weak buffer scope to the current block
    InitWeak,
    /// Name lookup only, no reference
    Symbol,
    /// Existing buffer lookup only
    BufferSymbol,
    /// Temp-table name lookup only
    TempTableSymbol,
    /// Schema table name lookup only
    SchemaTableSymbol,
}

impl ContextQualifier {
    pub const ALL: [Self; 9] = [
        Self::Ref,
        Self::RefUp,
        Self::Updating,
        Self::Init,
        Self::InitWeak,
        Self::Symbol,
        Self::BufferSymbol,
        Self::TempTableSymbol,
        Self::SchemaTableSymbol,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether a reference under this qualifier writes to the referenced value.
    pub const fn is_write(self) -> bool {
        matches!(self, Self::RefUp | Self::Updating)
    }
}

impl fmt::Display for ContextQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Ref => "REF",
            Self::RefUp => "REFUP",
            Self::Updating => "UPDATING",
            Self::Init => "INIT",
            Self::InitWeak => "INITWEAK",
            Self::Symbol => "SYMBOL",
            Self::BufferSymbol => "BUFFERSYMBOL",
            Self::TempTableSymbol => "TEMPTABLESYMBOL",
            Self::SchemaTableSymbol => "SCHEMATABLESYMBOL",
        };
        f.write_str(text)
    }
}

/// Coarse storage kind of what a field reference resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreType {
    Variable,
    DbTable,
    TempTable,
    WorkTable,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AttributeFlags: u8 {
        /// The reference abbreviates the table or field name it resolved to
        const ABBREVIATED       = 1 << 0;
        /// A table field referenced without its table name
        const UNQUALIFIED_FIELD = 1 << 1;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeAttributes {
    pub symbol: Option<SymbolId>,
    pub scope: Option<ScopeId>,
    pub block: Option<BlockId>,
    pub buffer_scope: Option<BufferScopeId>,
    pub store_type: Option<StoreType>,
    pub qualifier: Option<ContextQualifier>,
    pub flags: AttributeFlags,
}

impl NodeAttributes {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
