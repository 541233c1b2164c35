use crate::*;
use abl_compiler_semantic::ScopeKind;
use abl_compiler_syntax::{ContextQualifier, DataType, Keyword, NodeKind, TreeBuilder};

/// `ASSIGN target:member = 1.`
fn assign_member(b: &mut TreeBuilder, target: impl FnOnce(&mut TreeBuilder), member: &str) {
    b.node(NodeKind::AssignStatement, "ASSIGN", |b| {
        b.node(NodeKind::AssignEqual, "=", |b| {
            b.node(NodeKind::WidgetAttribute, ":", |b| {
                target(b);
                b.identifier(member);
            });
            b.node(NodeKind::Expression, "EXPR", |b| {
                b.leaf(NodeKind::Literal, "1");
            });
        });
    });
}

#[test]
fn test_class_header_sets_root_scope() {
    let analyzed = analyze_ok!(|b| {
        b.node(NodeKind::ClassStatement, "CLASS", |b| {
            b.leaf(NodeKind::TypeName, "acme.Customer");
        });
    });

    let index = &analyzed.index;
    let root = index.scope(index.root_scope());
    assert_eq!(root.kind, ScopeKind::Class);
    assert_eq!(root.class_name.as_deref(), Some("acme.Customer"));
    let type_info = root.type_info.as_ref().expect("type info from the registry");
    assert_eq!(type_info.type_name, "acme.Customer");
    assert!(index.diagnostics().is_empty());
}

#[test]
fn test_class_without_type_info() {
    let analyzed = analyze_ok!(|b| {
        b.node(NodeKind::InterfaceStatement, "INTERFACE", |b| {
            b.leaf(NodeKind::TypeName, "acme.IUnknown");
        });
    });

    let root = analyzed.index.scope(analyzed.index.root_scope());
    assert_eq!(root.kind, ScopeKind::Interface);
    assert!(root.type_info.is_none());
    insta::assert_snapshot!(analyzed.format_diagnostics(), @"info[2002] line 1: No type information for class 'acme.IUnknown'");
}

#[test]
fn test_this_object_member_is_written() {
    let analyzed = analyze_ok!(|b| {
        b.node(NodeKind::ClassStatement, "CLASS", |b| {
            b.leaf(NodeKind::TypeName, "acme.Customer");
            define_variable(b, "count", DataType::Integer);
            b.node(NodeKind::MethodStatement, "METHOD", |b| {
                b.identifier("bump");
                assign_member(b, |b| { b.keyword(Keyword::ThisObject); }, "count");
                assign_member(b, |b| { b.field("Customer"); }, "count");
            });
        });
    });

    let index = &analyzed.index;
    let count = analyzed.variable(index.root_scope(), "count");
    assert_eq!(index.symbol(count).references.get(ContextQualifier::Updating), 2);
    let member = analyzed.nth(NodeKind::Identifier, "count", 1);
    assert_eq!(analyzed.tree.attrs(member).symbol, Some(count));
    assert_eq!(analyzed.tree.attrs(member).qualifier, Some(ContextQualifier::Updating));

    // The class name itself is not looked up as a field
    assert!(analyzed.attrs(NodeKind::Field, "Customer").symbol.is_none());
    assert!(index.unresolved_references().is_empty());
}

#[test]
fn test_method_is_registered_as_routine() {
    let analyzed = analyze_ok!(|b| {
        b.node(NodeKind::ClassStatement, "CLASS", |b| {
            b.leaf(NodeKind::TypeName, "acme.Customer");
            b.node(NodeKind::MethodStatement, "METHOD", |b| {
                b.identifier("Save");
                returns_logical(b);
            });
        });
    });

    let index = &analyzed.index;
    let routine = index.resolve_routine(index.root_scope(), "save").unwrap();
    let routine_data = index.symbol(routine).as_routine().unwrap();
    assert_eq!(routine_data.routine_scope, analyzed.scope_of(NodeKind::MethodStatement));
    assert_eq!(routine_data.return_type, Some(DataType::Logical));
}

fn returns_logical(b: &mut TreeBuilder) {
    b.node(NodeKind::ReturnsClause, "RETURNS", |b| {
        b.leaf(NodeKind::Datatype(DataType::Logical), "LOGICAL");
    });
}
