//! Nested construction of parse trees.
//!
//! ```
//! use abl_compiler_syntax::{DataType, NodeKind, TreeBuilder};
//!
//! let tree = TreeBuilder::program("test.p", |b| {
//!     b.node(NodeKind::DefineVariable, "DEFINE", |b| {
//!         b.leaf(NodeKind::Identifier, "x");
//!         b.node(NodeKind::AsClause, "AS", |b| {
//!             b.leaf(NodeKind::Datatype(DataType::Integer), "INTEGER");
//!         });
//!     });
//! });
//! assert_eq!(tree.len(), 5);
//! ```

use smol_str::SmolStr;

use crate::kind::{Keyword, NodeKind};
use crate::token::ProToken;
use crate::tree::{NodeFlags, NodeId, ParseTree};

/// Builds a tree top-down. Every token gets its own line in file 0, which gives each node
/// a distinct position for diagnostics.
pub struct TreeBuilder {
    tree: ParseTree,
    stack: Vec<NodeId>,
    next_line: u32,
}

impl TreeBuilder {
    pub fn new(root_kind: NodeKind, file_name: impl Into<SmolStr>) -> Self {
        let mut tree = ParseTree::new(root_kind, ProToken::synthetic(""));
        tree.set_file_names([file_name.into()]);
        let root = tree.root();
        Self {
            tree,
            stack: vec![root],
            next_line: 1,
        }
    }

    /// Build a `Program` tree in one go.
    pub fn program(file_name: impl Into<SmolStr>, f: impl FnOnce(&mut Self)) -> ParseTree {
        let mut builder = Self::new(NodeKind::Program, file_name);
        f(&mut builder);
        builder.finish()
    }

    fn parent(&self) -> NodeId {
        *self
            .stack
            .last()
            .expect("TreeBuilder always keeps the root on its stack")
    }

    fn next_token(&mut self, text: &str) -> ProToken {
        let token = ProToken::new(text, 0, self.next_line, 1);
        self.next_line += 1;
        token
    }

    /// Add a node with children built by `f`.
    pub fn node(&mut self, kind: NodeKind, text: &str, f: impl FnOnce(&mut Self)) -> NodeId {
        let token = self.next_token(text);
        self.node_with_token(kind, token, NodeFlags::empty(), f)
    }

    /// Add a node with an explicit token and parser flags.
    pub fn node_with_token(
        &mut self,
        kind: NodeKind,
        token: ProToken,
        flags: NodeFlags,
        f: impl FnOnce(&mut Self),
    ) -> NodeId {
        let parent = self.parent();
        let id = self.tree.add_child(parent, kind, token, flags);
        self.stack.push(id);
        f(self);
        self.stack.pop();
        id
    }

    pub fn leaf(&mut self, kind: NodeKind, text: &str) -> NodeId {
        self.node(kind, text, |_| {})
    }

    pub fn flagged_leaf(&mut self, kind: NodeKind, text: &str, flags: NodeFlags) -> NodeId {
        let token = self.next_token(text);
        self.node_with_token(kind, token, flags, |_| {})
    }

    pub fn keyword(&mut self, keyword: Keyword) -> NodeId {
        self.leaf(NodeKind::Keyword(keyword), keyword.text())
    }

    pub fn identifier(&mut self, name: &str) -> NodeId {
        self.leaf(NodeKind::Identifier, name)
    }

    pub fn field(&mut self, name: &str) -> NodeId {
        self.leaf(NodeKind::Field, name)
    }

    pub fn record(&mut self, name: &str) -> NodeId {
        self.leaf(NodeKind::Record, name)
    }

    pub fn finish(self) -> ParseTree {
        self.tree
    }
}
