use crate::*;
use abl_compiler_semantic::Namespace;
use abl_compiler_syntax::{ContextQualifier, Keyword, NodeKind, StoreType, WidgetKind};

#[test]
fn test_browse_columns_resolve_through_query_buffer() {
    // DEFINE QUERY q FOR customer.
    // DEFINE BROWSE br QUERY q DISPLAY name balance.
    let analyzed = analyze_ok!(|b| {
        b.node(NodeKind::DefineWidget(WidgetKind::Query), "DEFINE", |b| {
            b.identifier("q");
            b.record("customer");
        });
        b.node(NodeKind::DefineBrowse, "DEFINE", |b| {
            b.identifier("br");
            b.identifier("q");
            b.node(NodeKind::BrowseDisplay, "DISPLAY", |b| {
                b.field("name");
                b.field("balance");
            });
        });
    });

    let index = &analyzed.index;
    let root = index.root_scope();
    let query = index.resolve(root, Namespace::Widget(WidgetKind::Query), "q").unwrap();
    assert!(index.symbol(query).is_attached());
    assert_eq!(
        analyzed.attrs(NodeKind::Record, "customer").qualifier,
        Some(ContextQualifier::Init)
    );

    let browse = index.resolve(root, Namespace::Widget(WidgetKind::Browse), "br").unwrap();
    let browse_data = index.symbol(browse).as_browse().unwrap();
    assert_eq!(browse_data.query.as_deref(), Some("q"));
    assert_eq!(
        browse_data.columns,
        vec![analyzed.field_symbol("name"), analyzed.field_symbol("balance")]
    );
    assert!(browse_data
        .columns
        .iter()
        .all(|column| index.symbol(*column).as_field_buffer().is_some()));
}

#[test]
fn test_button_is_a_field_level_widget() {
    let analyzed = analyze_ok!(|b| {
        b.node(NodeKind::DefineWidget(WidgetKind::Button), "DEFINE", |b| {
            b.identifier("btnOk");
        });
        display(b, &["btnOk"]);
    });

    let button = analyzed.field_symbol("btnOk");
    assert!(matches!(
        analyzed.index.symbol(button).kind,
        abl_compiler_semantic::SymbolKind::Widget(WidgetKind::Button)
    ));
    assert_eq!(analyzed.attrs(NodeKind::Field, "btnOk").store_type, Some(StoreType::Variable));
}

#[test]
fn test_event_reference_is_variable_storage() {
    let analyzed = analyze_ok!(|b| {
        b.node(NodeKind::DefineEvent, "DEFINE", |b| {
            b.identifier("Changed");
        });
        display(b, &["Changed"]);
    });

    let changed = analyzed.attrs(NodeKind::Field, "Changed");
    assert!(analyzed.index.symbol(changed.symbol.unwrap()).as_event().is_some());
    assert_eq!(changed.store_type, Some(StoreType::Variable));
    assert_eq!(changed.qualifier, Some(ContextQualifier::Ref));
}

#[test]
fn test_frame_widget_name() {
    let analyzed = analyze_ok!(|b| {
        b.node(NodeKind::DefineWidget(WidgetKind::Frame), "DEFINE", |b| {
            b.identifier("fMain");
        });
        b.node(NodeKind::EnableStatement, "ENABLE", |b| {
            b.node(NodeKind::WidgetName, "fMain", |b| {
                b.keyword(Keyword::Frame);
            });
        });
    });

    let index = &analyzed.index;
    let frame = index
        .resolve(index.root_scope(), Namespace::Widget(WidgetKind::Frame), "fmain")
        .unwrap();
    assert_eq!(analyzed.symbol_at(analyzed.node(NodeKind::WidgetName, "fMain")), frame);
    assert_eq!(index.symbol(frame).references.get(ContextQualifier::Symbol), 1);
}

#[test]
fn test_unknown_buffer_widget_warns() {
    let analyzed = analyze_ok!(|b| {
        b.node(NodeKind::Statement, "APPLY", |b| {
            b.node(NodeKind::WidgetName, "bNone", |b| {
                b.keyword(Keyword::Buffer);
            });
        });
    });

    assert!(analyzed.attrs(NodeKind::WidgetName, "bNone").symbol.is_none());
    insta::assert_snapshot!(analyzed.format_diagnostics(), @"warning[1004] line 2: Unknown buffer 'bNone'");
}
