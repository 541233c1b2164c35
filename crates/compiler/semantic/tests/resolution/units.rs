//! Analyzing several parse units against one shared schema.

use crate::*;
use abl_compiler_semantic::analyze_units;
use abl_compiler_syntax::{DataType, TreeBuilder};

#[test]
fn test_units_fail_independently() -> anyhow::Result<()> {
    abl_test_utils::init_tracing();
    let schema = sports_schema();
    let types = class_types();
    let mut units = vec![
        TreeBuilder::program("first.p", |b| {
            find(b, "customer");
        }),
        TreeBuilder::program("broken.p", |b| {
            define_variable(b, "x", DataType::Integer);
            find(b, "warehouse");
        }),
        TreeBuilder::program("third.p", |b| {
            define_variable(b, "y", DataType::Decimal);
        }),
    ];

    let results = analyze_units(&mut units, &schema, &types, &TreeParserOptions::default());
    assert_eq!(results.len(), 3);

    let first = results[0].as_ref().map_err(Clone::clone)?;
    assert!(first.temp_table("customer").is_none());
    assert_eq!(first.tables().count(), 1);

    match &results[1] {
        Err(SemanticError::UnresolvedTable { name, file, .. }) => {
            assert_eq!(name.as_str(), "warehouse");
            assert_eq!(file.as_str(), "broken.p");
        }
        Ok(_) => panic!("broken.p should not resolve"),
    }
    let broken = &units[1];
    assert!(broken.nodes().all(|(node, _)| broken.attrs(node).symbol.is_none()));

    let third = results[2].as_ref().map_err(Clone::clone)?;
    assert!(third.resolve_variable(third.root_scope(), "y").is_some());
    Ok(())
}
