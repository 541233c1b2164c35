//! # Blocks and buffer scopes
//!
//! Blocks mirror the control-flow nesting of the unit (DO, FOR, REPEAT, routine bodies)
//! and answer one question: which block a buffer is scoped to. Block parent links are the
//! only source of "enclosing block" information; a scope's root block has the block that
//! was current at the scope's definition as its parent.

use abl_compiler_syntax::{BlockId, BufferScopeId, NodeId, ScopeId, SymbolId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Root block of a scope (program, routine, trigger, catch, accessor)
    Root,
    Do,
    For,
    Repeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferScopeStrength {
    /// `DO FOR` / `REPEAT FOR`: the buffer is scoped to exactly this block
    Strong,
    /// `FOR EACH` / `PRESELECT`: scoped here unless a free reference raises it
    Weak,
    /// Free reference (FIND, field access) outside any strong or weak scope
    Reference,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferScope {
    pub block: BlockId,
    pub buffer: SymbolId,
    pub strength: BufferScopeStrength,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub parent: Option<BlockId>,
    pub scope: ScopeId,
    pub kind: BlockKind,
    pub node: Option<NodeId>,
    pub buffer_scopes: Vec<BufferScopeId>,
    has_strong_scope: bool,
}

impl Block {
    pub const fn new(
        parent: Option<BlockId>,
        scope: ScopeId,
        kind: BlockKind,
        node: Option<NodeId>,
    ) -> Self {
        Self {
            parent,
            scope,
            kind,
            node,
            buffer_scopes: Vec::new(),
            has_strong_scope: false,
        }
    }

    /// Whether a free buffer reference may be scoped to this block. A plain DO block only
    /// scopes records when it names them with `DO FOR`.
    pub const fn scopes_records(&self) -> bool {
        match self.kind {
            BlockKind::Root | BlockKind::For | BlockKind::Repeat => true,
            BlockKind::Do => self.has_strong_scope,
        }
    }

    pub(crate) fn add_buffer_scope(&mut self, id: BufferScopeId, strength: BufferScopeStrength) {
        if strength == BufferScopeStrength::Strong {
            self.has_strong_scope = true;
        }
        self.buffer_scopes.push(id);
    }
}
