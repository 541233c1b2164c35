use crate::*;
use abl_compiler_syntax::{AttributeFlags, ContextQualifier, DataType, NodeKind, StoreType};

#[test]
fn test_variable_shadows_table_field() {
    let analyzed = analyze_ok!(|b| {
        define_variable(b, "name", DataType::Character);
        for_each(b, "customer", |b| {
            display(b, &["name", "city"]);
        });
    });

    let index = &analyzed.index;
    let name = analyzed.attrs(NodeKind::Field, "name");
    assert_eq!(name.symbol, Some(analyzed.variable(index.root_scope(), "name")));
    assert_eq!(name.store_type, Some(StoreType::Variable));
    assert!(!name.flags.contains(AttributeFlags::UNQUALIFIED_FIELD));

    let city = analyzed.attrs(NodeKind::Field, "city");
    assert_eq!(city.store_type, Some(StoreType::DbTable));
    assert!(city.flags.contains(AttributeFlags::UNQUALIFIED_FIELD));
}

#[test]
fn test_qualified_and_abbreviated_field() {
    let analyzed = analyze_ok!(|b| {
        display(b, &["customer.name", "cust.creditl"]);
    });

    let index = &analyzed.index;
    let name = analyzed.attrs(NodeKind::Field, "customer.name");
    assert!(name.flags.is_empty());
    let credit = analyzed.attrs(NodeKind::Field, "cust.creditl");
    assert!(credit.flags.contains(AttributeFlags::ABBREVIATED));
    let field = index.symbol(credit.symbol.unwrap()).as_field_buffer().unwrap();
    assert_eq!(index.field(field.field).name, "CreditLimit");

    // Both go through the same default buffer and its one reference scope
    let buffer = index.symbol(name.symbol.unwrap()).as_field_buffer().unwrap().buffer;
    assert_eq!(field.buffer, buffer);
    assert_eq!(name.buffer_scope, credit.buffer_scope);
    assert_eq!(index.symbol(buffer).references.get(ContextQualifier::Ref), 2);
}

#[test]
fn test_field_found_on_visible_buffer() {
    // FIND customer. DISPLAY balance.
    let analyzed = analyze_ok!(|b| {
        find(b, "customer");
        display(b, &["balance"]);
    });

    let record = analyzed.attrs(NodeKind::Record, "customer");
    let field = analyzed.attrs(NodeKind::Field, "balance");
    assert_eq!(field.buffer_scope, record.buffer_scope);
    let field_buffer = analyzed.index.symbol(field.symbol.unwrap()).as_field_buffer().unwrap();
    assert_eq!(Some(field_buffer.buffer), record.symbol);
}

#[test]
fn test_except_list_tolerates_unknown_fields() {
    // FIND customer. DISPLAY customer EXCEPT bogus comments.
    let analyzed = analyze_ok!(|b| {
        find(b, "customer");
        b.node(NodeKind::DisplayStatement, "DISPLAY", |b| {
            b.record("customer");
            b.node(NodeKind::ExceptPhrase, "EXCEPT", |b| {
                b.field("bogus");
                b.field("comments");
            });
        });
    });

    let index = &analyzed.index;
    assert!(index.diagnostics().is_empty());
    assert!(index.unresolved_references().is_empty());
    assert!(analyzed.attrs(NodeKind::Field, "bogus").symbol.is_none());

    let comments = analyzed.attrs(NodeKind::Field, "comments");
    assert_eq!(comments.qualifier, Some(ContextQualifier::Symbol));
    let field_buffer = index.symbol(comments.symbol.unwrap()).as_field_buffer().unwrap();
    assert_eq!(Some(field_buffer.buffer), analyzed.attrs(NodeKind::Record, "customer").symbol);
}

#[test]
fn test_fields_phrase_binds_to_its_record() {
    // DEFINE VARIABLE name AS CHARACTER. FOR EACH customer FIELDS (name bogus): END.
    let analyzed = analyze_ok!(|b| {
        define_variable(b, "name", DataType::Character);
        b.node(NodeKind::ForBlock, "FOR", |b| {
            b.node(NodeKind::RecordPhrase, "EACH", |b| {
                b.record("customer");
                b.node(NodeKind::FieldsPhrase, "FIELDS", |b| {
                    b.field("name");
                    b.field("bogus");
                });
            });
        });
    });

    let index = &analyzed.index;
    assert!(index.diagnostics().is_empty());
    assert!(index.unresolved_references().is_empty());
    assert!(analyzed.attrs(NodeKind::Field, "bogus").symbol.is_none());

    // The table hint wins over the variable of the same name
    let name = analyzed.attrs(NodeKind::Field, "name");
    assert_eq!(name.qualifier, Some(ContextQualifier::Symbol));
    assert_eq!(name.store_type, Some(StoreType::DbTable));
    assert_eq!(name.buffer_scope, None);
    let field_buffer = index.symbol(name.symbol.unwrap()).as_field_buffer().unwrap();
    assert_eq!(Some(field_buffer.buffer), analyzed.attrs(NodeKind::Record, "customer").symbol);
    assert_eq!(index.field(field_buffer.field).name, "Name");
}

#[test]
fn test_relation_fields_alternate_parent_and_child() {
    // DEFINE DATA-RELATION rel FOR customer, order RELATION-FIELDS (custnum, custnum).
    let analyzed = analyze_ok!(|b| {
        b.node(NodeKind::DataRelation, "DATA-RELATION", |b| {
            b.identifier("rel");
            b.record("customer");
            b.record("order");
            b.node(NodeKind::RelationFields, "RELATION-FIELDS", |b| {
                b.field("custnum");
                b.field("custnum");
                b.field("bogus");
            });
        });
    });

    let index = &analyzed.index;
    let buffer_of = |n| {
        let symbol = analyzed.symbol_at(analyzed.nth(NodeKind::Field, "custnum", n));
        index.symbol(symbol).as_field_buffer().unwrap().buffer
    };
    assert_eq!(buffer_of(0), analyzed.record_symbol("customer"));
    assert_eq!(buffer_of(1), analyzed.record_symbol("order"));

    // Outside a tolerant field list a missing field is reported
    assert_eq!(index.unresolved_references().len(), 1);
    insta::assert_snapshot!(analyzed.format_diagnostics(), @"warning[1002] line 8: Field 'bogus' not found in table 'Customer'");
}

#[test]
fn test_unresolved_field_is_recorded() {
    let analyzed = analyze_ok!(|b| {
        b.node(NodeKind::ProcedureStatement, "PROCEDURE", |b| {
            b.identifier("p");
            display(b, &["nothing"]);
        });
    });

    let unresolved = analyzed.index.unresolved_references();
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].name, "nothing");
    assert_eq!(unresolved[0].scope, analyzed.scope_of(NodeKind::ProcedureStatement));
    assert!(analyzed.index.diagnostics().is_empty());
}

#[test]
fn test_input_field_is_not_resolved() {
    let analyzed = analyze_ok!(|b| {
        b.node(NodeKind::DisplayStatement, "DISPLAY", |b| {
            b.node(NodeKind::Field, "anything", |b| {
                b.keyword(abl_compiler_syntax::Keyword::Input);
            });
        });
    });

    assert!(analyzed.attrs(NodeKind::Field, "anything").symbol.is_none());
    assert!(analyzed.index.unresolved_references().is_empty());
}
