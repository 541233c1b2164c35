//! Qualifier producers of statements and phrases that need more than a fixed qualifier
//! for all their children.

use abl_compiler_diagnostics::Diagnostic;
use abl_compiler_syntax::{ContextQualifier, Keyword, NodeId, NodeKind, SymbolId, WidgetKind};

use super::SemanticIndexBuilder;
use crate::qualifier::TableNameResolution;
use crate::scope::Namespace;
use crate::semantic_errors::SemanticError;

impl SemanticIndexBuilder<'_> {
    /// Expressions and form items pass their own qualifier on to their operands.
    pub(super) fn propagate_qualifier(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let qualifier = self.take_qualifier(node);
        self.tree.attrs_mut(node).qualifier = Some(qualifier);
        self.visit_qualified_children(node, qualifier)
    }

    /// A record phrase hands its qualifier to the record it names. WHERE, BY and OF
    /// expressions inside it are plain reads.
    pub(super) fn record_phrase(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let qualifier = self.take_qualifier(node);
        self.visit_children_qualifying(node, NodeKind::Record, qualifier)
    }

    /// Field lists (FIELDS, EXCEPT, key fields): the names belong to the table referenced
    /// just before the list.
    pub(super) fn phrase_fields(
        &mut self,
        node: NodeId,
        qualifier: ContextQualifier,
    ) -> Result<(), SemanticError> {
        let has_table = self.last_table_referenced.is_some();
        for child in self.children(node) {
            if self.tree.kind(child) == NodeKind::Field {
                self.qualify(child, qualifier);
                if has_table {
                    self.hint(child, TableNameResolution::Last);
                }
            }
            self.visit(child)?;
        }
        Ok(())
    }

    /// USING reads the fields it names when it is part of BUFFER-COMPARE or BUFFER-COPY.
    pub(super) fn using_phrase(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let reads = self.tree.parent(node).is_some_and(|parent| {
            matches!(
                self.tree.kind(parent),
                NodeKind::BufferCompare | NodeKind::BufferCopy
            )
        });
        let qualifier = if reads {
            ContextQualifier::Ref
        } else {
            ContextQualifier::Symbol
        };
        self.phrase_fields(node, qualifier)
    }

    /// `RELATION-FIELDS (parent-field, child-field, ...)` of a data-relation: the pairs
    /// alternate between the parent (previous) and child (last) buffer.
    pub(super) fn relation_fields(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let mut parent_side = true;
        for child in self.children(node) {
            if self.tree.kind(child) == NodeKind::Field {
                self.qualify(child, ContextQualifier::Symbol);
                let resolution = if parent_side {
                    TableNameResolution::Previous
                } else {
                    TableNameResolution::Last
                };
                self.hint(child, resolution);
                parent_side = !parent_side;
            }
            self.visit(child)?;
        }
        Ok(())
    }

    /// MESSAGE ... SET|UPDATE field: the field is read and written.
    pub(super) fn message_option(&mut self, node: NodeId) -> Result<(), SemanticError> {
        if self.tree.has_keyword(node, Keyword::Set) || self.tree.has_keyword(node, Keyword::Update) {
            self.visit_children_qualifying(node, NodeKind::Field, ContextQualifier::RefUp)
        } else {
            self.visit_children(node)
        }
    }

    fn run_parameter_qualifier(&self, node: NodeId) -> ContextQualifier {
        if self.tree.has_keyword(node, Keyword::InputOutput) {
            ContextQualifier::RefUp
        } else if self.tree.has_keyword(node, Keyword::Output) {
            ContextQualifier::Updating
        } else {
            ContextQualifier::Ref
        }
    }

    /// A parameter of RUN or of a function call: the mode decides whether the argument is
    /// read, written or both.
    pub(super) fn run_parameter(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let qualifier = self.run_parameter_qualifier(node);
        self.visit_qualified_children(node, qualifier)
    }

    /// `TABLE-HANDLE h` and `DATASET-HANDLE h` arguments. The handle variable is
    /// initialized by the call; output modes also count as a write of it.
    pub(super) fn parameter_handle(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let mode = self
            .tree
            .parent(node)
            .filter(|parent| self.tree.kind(*parent) == NodeKind::RunParameter)
            .map_or(ContextQualifier::Ref, |parent| self.run_parameter_qualifier(parent));
        for child in self.children(node) {
            let is_field = self.tree.kind(child) == NodeKind::Field;
            if is_field {
                self.qualify(child, ContextQualifier::Init);
            }
            self.visit(child)?;
            if is_field && mode.is_write() {
                if let Some(symbol) = self.tree.attrs(child).symbol {
                    self.note_reference(symbol, mode);
                }
            }
        }
        Ok(())
    }

    /// SET-SIZE, PUT-BYTES and friends write to their first argument.
    pub(super) fn memory_management_function(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let qualifier = self.take_qualifier(node);
        self.tree.attrs_mut(node).qualifier = Some(qualifier);
        self.visit_operands(node, ContextQualifier::Updating, ContextQualifier::Ref)
    }

    /// `object:member` references. `THIS-OBJECT:name` and `ClassName:name` inside the
    /// class name a member variable of the class being compiled.
    pub(super) fn widget_attribute(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let qualifier = self.take_qualifier(node);
        let children = self.children(node);
        let Some(&target) = children.first() else {
            return Ok(());
        };
        let member = children
            .get(1)
            .copied()
            .filter(|member| self.tree.kind(*member) == NodeKind::Identifier);

        let self_reference = match self.tree.kind(target) {
            NodeKind::Keyword(Keyword::ThisObject) => true,
            NodeKind::Field => self
                .class_short_name()
                .is_some_and(|class| class.eq_ignore_ascii_case(self.tree.text(target))),
            _ => false,
        };

        if self_reference {
            if let Some(member) = member {
                self.member_reference(member, qualifier);
            }
        }

        for child in children {
            if child == target {
                if self_reference {
                    continue;
                }
                self.qualify(child, ContextQualifier::Ref);
            }
            self.visit(child)?;
        }
        Ok(())
    }

    fn member_reference(&mut self, member: NodeId, qualifier: ContextQualifier) {
        let name = self.tree.text(member);
        if let Some(variable) = self.index.resolve_variable(self.current_scope(), name) {
            self.note_reference(variable, qualifier);
            let attrs = self.tree.attrs_mut(member);
            attrs.symbol = Some(variable);
            attrs.qualifier = Some(qualifier);
        }
    }

    /// `BUFFER name`, `FRAME name`, `BROWSE name` used as a widget.
    pub(super) fn widget_name(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let name = self.tree.text(node).to_owned();
        let symbol = if self.tree.has_keyword(node, Keyword::Buffer) {
            let buffer = self
                .index
                .resolve(self.current_scope(), Namespace::Buffer, &name)
                .or_else(|| {
                    self.index.scopes[self.index.root_scope()].lookup(Namespace::Table, &name)
                });
            if buffer.is_none() {
                tracing::warn!(%name, "BUFFER widget names an unknown buffer");
                self.report(Diagnostic::unresolved_buffer(&name, self.location(node)));
            }
            buffer
        } else if self.tree.has_keyword(node, Keyword::Frame) {
            self.widget_symbol(WidgetKind::Frame, &name)
        } else if self.tree.has_keyword(node, Keyword::Browse) {
            self.widget_symbol(WidgetKind::Browse, &name)
        } else {
            None
        };

        if let Some(symbol) = symbol {
            self.note_reference(symbol, ContextQualifier::Symbol);
            self.tree.attrs_mut(node).symbol = Some(symbol);
        }
        Ok(())
    }

    fn widget_symbol(&self, kind: WidgetKind, name: &str) -> Option<SymbolId> {
        self.index
            .resolve(self.current_scope(), Namespace::Widget(kind), name)
    }
}
