//! The arena parse tree.

use bitflags::bitflags;
use index_vec::IndexVec;
use smol_str::SmolStr;

use crate::attrs::NodeAttributes;
use crate::kind::{Keyword, NodeKind};
use crate::token::ProToken;

index_vec::define_index_type! {
    /// Stable identifier of a node within its parse tree
    pub struct NodeId = u32;
}

bitflags! {
    /// Flags set by the parser.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NodeFlags: u8 {
        /// A field reference that also defines a variable of that name
        const INLINE_VAR_DEF = 1 << 0;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub token: ProToken,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub flags: NodeFlags,
    pub attrs: NodeAttributes,
}

/// A parse unit: the node arena plus the names of the files its tokens point into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTree {
    nodes: IndexVec<NodeId, Node>,
    file_names: Vec<SmolStr>,
}

impl ParseTree {
    /// Create a tree holding only its root node.
    pub fn new(root_kind: NodeKind, root_token: ProToken) -> Self {
        let mut nodes = IndexVec::new();
        nodes.push(Node {
            kind: root_kind,
            token: root_token,
            parent: None,
            children: Vec::new(),
            flags: NodeFlags::empty(),
            attrs: NodeAttributes::default(),
        });
        Self {
            nodes,
            file_names: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::new(0)
    }

    /// Append a child to `parent` and return its id.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        token: ProToken,
        flags: NodeFlags,
    ) -> NodeId {
        let id = self.nodes.push(Node {
            kind,
            token,
            parent: Some(parent),
            children: Vec::new(),
            flags,
            attrs: NodeAttributes::default(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    pub fn set_file_names(&mut self, names: impl IntoIterator<Item = impl Into<SmolStr>>) {
        self.file_names = names.into_iter().map(Into::into).collect();
    }

    pub fn file_name(&self, file_index: u32) -> Option<&str> {
        self.file_names.get(file_index as usize).map(SmolStr::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter_enumerated()
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id].kind
    }

    pub fn text(&self, id: NodeId) -> &str {
        &self.nodes[id].token.text
    }

    pub fn token(&self, id: NodeId) -> &ProToken {
        &self.nodes[id].token
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].children.first().copied()
    }

    pub fn child_of_kind(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children_of_kind(id, kind).next()
    }

    pub fn children_of_kind(
        &self,
        id: NodeId,
        kind: NodeKind,
    ) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id]
            .children
            .iter()
            .copied()
            .filter(move |child| self.nodes[*child].kind == kind)
    }

    pub fn has_keyword(&self, id: NodeId, keyword: Keyword) -> bool {
        self.child_of_kind(id, NodeKind::Keyword(keyword)).is_some()
    }

    /// Text of the first `Identifier` child, the name of most defining constructs.
    pub fn identifier(&self, id: NodeId) -> Option<&str> {
        self.child_of_kind(id, NodeKind::Identifier)
            .map(|child| self.text(child))
    }

    /// All nodes of `kind` in tree order.
    pub fn find_all(&self, kind: NodeKind) -> Vec<NodeId> {
        self.nodes
            .iter_enumerated()
            .filter(|(_, node)| node.kind == kind)
            .map(|(id, _)| id)
            .collect()
    }

    /// First node of `kind` whose token text equals `text`, ignoring case.
    pub fn find(&self, kind: NodeKind, text: &str) -> Option<NodeId> {
        self.nodes
            .iter_enumerated()
            .find(|(_, node)| node.kind == kind && node.token.text.eq_ignore_ascii_case(text))
            .map(|(id, _)| id)
    }

    pub fn attrs(&self, id: NodeId) -> &NodeAttributes {
        &self.nodes[id].attrs
    }

    pub fn attrs_mut(&mut self, id: NodeId) -> &mut NodeAttributes {
        &mut self.nodes[id].attrs
    }

    /// Drop every attribute written by a previous semantic pass.
    pub fn clear_attributes(&mut self) {
        for node in self.nodes.iter_mut() {
            node.attrs = NodeAttributes::default();
        }
    }
}
