//! Routines, triggers, CATCH blocks and class headers.

use abl_compiler_diagnostics::Diagnostic;
use abl_compiler_syntax::{Keyword, NodeId, NodeKind, ScopeId, SymbolId};
use smol_str::SmolStr;

use super::SemanticIndexBuilder;
use crate::scope::ScopeKind;
use crate::semantic_errors::SemanticError;
use crate::symbol::{Routine, RoutineKind, SymbolKind, Variable};

impl SemanticIndexBuilder<'_> {
    /// Create the routine symbol of `routine_scope` in `defining_scope` and attach it.
    fn create_routine(
        &mut self,
        defining_scope: ScopeId,
        node: NodeId,
        name: SmolStr,
        kind: RoutineKind,
        routine_scope: ScopeId,
    ) -> SymbolId {
        let routine = self.create_symbol(
            defining_scope,
            Some(node),
            name,
            SymbolKind::Routine(Routine::new(kind, routine_scope)),
        );
        self.index.scopes[routine_scope].routine = Some(routine);
        self.attach(routine);
        routine
    }

    fn routine_name(&self, node: NodeId) -> SmolStr {
        SmolStr::new(self.tree.identifier(node).unwrap_or_default())
    }

    pub(super) fn procedure(&mut self, node: NodeId) -> Result<(), SemanticError> {
        self.named_routine(node, RoutineKind::Procedure, ScopeKind::Procedure)
    }

    pub(super) fn method(&mut self, node: NodeId) -> Result<(), SemanticError> {
        self.named_routine(node, RoutineKind::Method, ScopeKind::Method)
    }

    fn named_routine(
        &mut self,
        node: NodeId,
        kind: RoutineKind,
        scope_kind: ScopeKind,
    ) -> Result<(), SemanticError> {
        let name = self.routine_name(node);
        let defining_scope = self.current_scope();
        self.with_scope(scope_kind, node, |builder, scope| {
            builder.create_routine(defining_scope, node, name, kind, scope);
            builder.visit_children(node)
        })
    }

    /// Constructors, destructors and property accessors: a scope and a routine, but no
    /// name to call them by.
    pub(super) fn unnamed_routine(
        &mut self,
        node: NodeId,
        kind: RoutineKind,
        scope_kind: ScopeKind,
    ) -> Result<(), SemanticError> {
        let defining_scope = self.current_scope();
        self.with_scope(scope_kind, node, |builder, scope| {
            builder.create_routine(defining_scope, node, SmolStr::default(), kind, scope);
            builder.visit_children(node)
        })
    }

    /// FUNCTION statements.
    ///
    /// A `FORWARD` declaration creates the function and its scope. A later body without a
    /// parameter list re-enters that scope, so the parameters declared on the forward are
    /// the ones in effect. A body that restates its parameters gets a fresh scope.
    pub(super) fn function(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let name = self.routine_name(node);
        let key = SmolStr::new(name.to_ascii_lowercase());
        let is_forward = self.tree.has_keyword(node, Keyword::Forwards);
        let has_parameters = self.tree.children(node).iter().any(|child| {
            matches!(
                self.tree.kind(*child),
                NodeKind::FunctionParameter | NodeKind::BufferParameter | NodeKind::TableParameter
            )
        });

        let forward = if is_forward {
            None
        } else {
            self.forward_functions.remove(&key)
        };

        if let Some(routine) = forward.filter(|_| !has_parameters) {
            let scope = self.index.symbols[routine]
                .as_routine()
                .expect("forward declarations are routines")
                .routine_scope;
            tracing::trace!(function = %name, "body re-enters forward declaration scope");
            self.index.symbols[routine].definition_node = Some(node);
            self.tree.attrs_mut(node).symbol = Some(routine);
            return self.with_existing_scope(scope, node, |builder| builder.visit_children(node));
        }

        let forward_node = forward.and_then(|routine| self.index.symbols[routine].definition_node);
        let defining_scope = self.current_scope();
        self.with_scope(ScopeKind::Function, node, |builder, scope| {
            let routine =
                builder.create_routine(defining_scope, node, name, RoutineKind::Function, scope);
            if let SymbolKind::Routine(routine) = &mut builder.index.symbols[routine].kind {
                routine.forward_node = if is_forward { Some(node) } else { forward_node };
            }
            if is_forward {
                builder.forward_functions.insert(key, routine);
            }
            builder.visit_children(node)
        })
    }

    /// ON triggers run in a scope of their own that belongs to no routine.
    pub(super) fn on_statement(&mut self, node: NodeId) -> Result<(), SemanticError> {
        self.with_scope(ScopeKind::Trigger, node, |builder, _| {
            builder.visit_children(node)
        })
    }

    /// `CATCH name AS CLASS ...:` defines the error variable in the block's own scope.
    pub(super) fn catch_block(&mut self, node: NodeId) -> Result<(), SemanticError> {
        self.with_scope(ScopeKind::Catch, node, |builder, _| {
            let name = SmolStr::new(builder.tree.identifier(node).unwrap_or_default());
            let variable =
                builder.define_symbol(node, name, SymbolKind::Variable(Variable::default()));
            let mut open = true;
            for child in builder.children(node) {
                builder.visit(child)?;
                if open && builder.tree.kind(child) == NodeKind::AsClause {
                    builder.end_definition(variable);
                    builder.attach(variable);
                    open = false;
                }
            }
            if open {
                builder.end_definition(variable);
                builder.attach(variable);
            }
            Ok(())
        })
    }

    /// CLASS and INTERFACE headers turn the root scope into the class scope.
    pub(super) fn class_statement(
        &mut self,
        node: NodeId,
        kind: ScopeKind,
    ) -> Result<(), SemanticError> {
        let name = self
            .tree
            .child_of_kind(node, NodeKind::TypeName)
            .map(|type_name| SmolStr::new(self.tree.text(type_name)))
            .unwrap_or_default();
        let root = self.index.root_scope();

        let type_info = self.types.type_info(&name).cloned();
        if type_info.is_none() {
            tracing::info!(class = %name, "no type information available");
            self.report(Diagnostic::missing_type_info(&name, self.location(node)));
        }

        let scope = &mut self.index.scopes[root];
        scope.kind = kind;
        scope.class_name = Some(name);
        scope.type_info = type_info;
        self.tree.attrs_mut(node).scope = Some(root);

        self.visit_children(node)
    }

    /// Unqualified name of the class being compiled, if this unit is a class.
    pub(super) fn class_short_name(&self) -> Option<&str> {
        let root = self.index.root_scope();
        self.index.scopes[root]
            .class_name
            .as_deref()
            .map(|name| name.rsplit('.').next().unwrap_or(name))
    }
}
