//! Write-once, read-once node side tables.
//!
//! A parent production assigns a value to a child node before visiting it; the child's
//! handler takes it. Context qualifiers and table-name resolution hints both travel this
//! way.

use abl_compiler_syntax::NodeId;
use rustc_hash::FxHashMap;

pub use abl_compiler_syntax::ContextQualifier;

/// Which table a field name inside a FIELDS/EXCEPT/USING-style phrase belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TableNameResolution {
    /// General lookup through variables and visible buffers
    #[default]
    Any,
    /// The table referenced most recently
    Last,
    /// The table referenced before the most recent one
    Previous,
}

#[derive(Debug)]
pub struct SideTable<T> {
    entries: FxHashMap<NodeId, T>,
}

impl<T> Default for SideTable<T> {
    fn default() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }
}

impl<T: Copy> SideTable<T> {
    pub fn set(&mut self, node: NodeId, value: T) {
        self.entries.insert(node, value);
    }

    /// Remove and return the value for `node`.
    pub fn take(&mut self, node: NodeId) -> Option<T> {
        self.entries.remove(&node)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub type QualifierMap = SideTable<ContextQualifier>;
pub type ResolutionHints = SideTable<TableNameResolution>;
