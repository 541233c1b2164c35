use crate::*;
use abl_compiler_semantic::{Extent, TableKind};
use abl_compiler_syntax::{DataType, NodeKind, StoreType};

#[test]
fn test_fields_from_clauses_and_like() {
    let analyzed = analyze_ok!(|b| {
        b.node(NodeKind::DefineTempTable, "DEFINE", |b| {
            b.identifier("ttCust");
            b.node(NodeKind::TableLike, "LIKE", |b| {
                b.record("customer");
            });
            b.node(NodeKind::TableField, "FIELD", |b| {
                b.identifier("selected");
                as_clause(b, DataType::Logical);
            });
            b.node(NodeKind::TableField, "FIELD", |b| {
                b.identifier("notes");
                b.node(NodeKind::LikeClause, "LIKE", |b| {
                    b.field("customer.comments");
                });
                b.node(NodeKind::ExtentClause, "EXTENT", |b| {
                    b.leaf(NodeKind::Literal, "3");
                });
            });
        });
    });

    let index = &analyzed.index;
    let table_id = index.temp_table("ttcust").unwrap();
    let table = index.table(table_id);
    assert_eq!(table.kind, TableKind::TempTable);
    assert_eq!(table.fields.len(), 11);
    assert!(table.is_frozen());

    let selected = index.lookup_table_field(table_id, "selected").unwrap();
    assert_eq!(index.field(selected.field).data_type, Some(DataType::Logical));
    let notes = index.field(index.lookup_table_field(table_id, "notes").unwrap().field);
    assert_eq!(notes.data_type, Some(DataType::Character));
    assert_eq!(notes.extent, Extent::Fixed(3));
    assert_eq!(notes.table, Some(table_id));

    // Temp-table fields are never abbreviated
    assert!(index.lookup_table_field(table_id, "sel").is_none());
}

#[test]
fn test_field_like_earlier_field_of_same_table() {
    let analyzed = analyze_ok!(|b| {
        b.node(NodeKind::DefineTempTable, "DEFINE", |b| {
            b.identifier("tt");
            b.node(NodeKind::TableField, "FIELD", |b| {
                b.identifier("amount");
                as_clause(b, DataType::Decimal);
            });
            b.node(NodeKind::TableField, "FIELD", |b| {
                b.identifier("total");
                b.node(NodeKind::LikeClause, "LIKE", |b| {
                    b.field("tt.amount");
                });
            });
        });
    });

    let index = &analyzed.index;
    let table = index.temp_table("tt").unwrap();
    let total = index.lookup_table_field(table, "total").unwrap();
    assert_eq!(index.field(total.field).data_type, Some(DataType::Decimal));
    assert!(index.diagnostics().is_empty());
}

#[test]
fn test_work_table_store_type() {
    let analyzed = analyze_ok!(|b| {
        b.node(NodeKind::DefineWorkTable, "DEFINE", |b| {
            b.identifier("wSum");
            b.node(NodeKind::TableField, "FIELD", |b| {
                b.identifier("total");
                as_clause(b, DataType::Decimal);
            });
        });
        for_each(b, "wSum", |b| {
            display(b, &["total"]);
        });
    });

    let index = &analyzed.index;
    let table = index.temp_table("wsum").unwrap();
    assert_eq!(index.table(table).kind, TableKind::WorkTable);
    assert_eq!(
        analyzed.attrs(NodeKind::Record, "wSum").store_type,
        Some(StoreType::WorkTable)
    );
    assert_eq!(
        analyzed.attrs(NodeKind::Field, "total").store_type,
        Some(StoreType::WorkTable)
    );
}
