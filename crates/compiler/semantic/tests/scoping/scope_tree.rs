//! Tests for the shape of the scope tree.

use crate::*;
use abl_compiler_semantic::{RoutineKind, ScopeKind};
use abl_compiler_syntax::{DataType, NodeKind};

#[test]
fn test_scope_parent_chains_reach_the_root() {
    let analyzed = analyze_ok!(|b| {
        b.node(NodeKind::ProcedureStatement, "PROCEDURE", |b| {
            b.identifier("outer");
            b.node(NodeKind::OnStatement, "ON", |b| {
                define_variable(b, "pressed", DataType::Logical);
            });
            b.node(NodeKind::CatchBlock, "CATCH", |b| {
                b.identifier("err");
                b.node(NodeKind::AsClause, "AS", |b| {
                    b.leaf(NodeKind::TypeName, "Progress.Lang.Error");
                });
            });
        });
        b.node(NodeKind::FunctionStatement, "FUNCTION", |b| {
            b.identifier("twice");
        });
    });

    let index = &analyzed.index;
    let root = index.root_scope();
    assert_eq!(index.scopes().count(), 5);
    for (id, scope) in index.scopes() {
        let chain: Vec<_> = index.scope_chain(id).collect();
        assert!(chain.len() <= index.scopes().count(), "cycle through {id:?}");
        assert_eq!(chain.last(), Some(&root));
        if let Some(parent) = scope.parent() {
            assert!(parent < id, "parent created after child");
        }
    }

    let procedure = analyzed.scope_of(NodeKind::ProcedureStatement);
    let trigger = analyzed.scope_of(NodeKind::OnStatement);
    let catch = analyzed.scope_of(NodeKind::CatchBlock);
    assert_eq!(index.scope(trigger).parent(), Some(procedure));
    assert_eq!(index.scope(catch).parent(), Some(procedure));
    assert_eq!(index.scope(trigger).kind, ScopeKind::Trigger);
    assert_eq!(index.scope(catch).kind, ScopeKind::Catch);
    assert_eq!(
        index.child_scopes(root).collect::<Vec<_>>(),
        vec![procedure, analyzed.scope_of(NodeKind::FunctionStatement)]
    );
}

#[test]
fn test_procedure_is_registered_in_defining_scope() {
    let analyzed = analyze_ok!(|b| {
        b.node(NodeKind::ProcedureStatement, "PROCEDURE", |b| {
            b.identifier("calcTotals");
        });
    });

    let index = &analyzed.index;
    let scope = analyzed.scope_of(NodeKind::ProcedureStatement);
    let routine = index
        .resolve_routine(index.root_scope(), "CALCTOTALS")
        .expect("procedure visible by name");
    let symbol = index.symbol(routine);
    let routine_data = symbol.as_routine().unwrap();
    assert_eq!(routine_data.kind, RoutineKind::Procedure);
    assert_eq!(routine_data.routine_scope, scope);
    assert_eq!(symbol.scope, index.root_scope());
    assert_eq!(index.scope(scope).routine, Some(routine));
    assert_eq!(index.scope(scope).kind, ScopeKind::Procedure);
}

#[test]
fn test_trigger_scope_belongs_to_no_routine() {
    let analyzed = analyze_ok!(|b| {
        b.node(NodeKind::OnStatement, "ON", |b| {
            define_variable(b, "pressed", DataType::Logical);
        });
    });

    let index = &analyzed.index;
    let trigger = analyzed.scope_of(NodeKind::OnStatement);
    assert_eq!(index.scope(trigger).routine, None);
    assert!(index.resolve_variable(trigger, "pressed").is_some());
    assert!(index.resolve_variable(index.root_scope(), "pressed").is_none());
}

#[test]
fn test_program_routine_owns_root_scope() {
    let analyzed = analyze_ok!(|_| {});

    let index = &analyzed.index;
    let root = index.root_scope();
    let program = index.scope(root).routine.expect("program routine");
    assert_eq!(
        index.symbol(program).as_routine().unwrap().kind,
        RoutineKind::Program
    );
    assert_eq!(index.symbol(program).name, "test_program_routine_owns_root_scope.p");
    assert!(index.scope(root).names().next().is_none());
    assert_eq!(analyzed.tree.attrs(analyzed.tree.root()).scope, Some(root));
}
