use crate::*;
use abl_compiler_semantic::{Namespace, ParameterMode};
use abl_compiler_syntax::{AttributeFlags, DataType, Keyword, NodeKind};

#[test]
fn test_define_parameter_modes() {
    let analyzed = analyze_ok!(|b| {
        b.node(NodeKind::ProcedureStatement, "PROCEDURE", |b| {
            b.identifier("lookup");
            b.node(NodeKind::DefineParameter, "DEFINE", |b| {
                b.keyword(Keyword::Input);
                b.identifier("key");
                as_clause(b, DataType::Integer);
            });
            b.node(NodeKind::DefineParameter, "DEFINE", |b| {
                b.keyword(Keyword::Output);
                b.identifier("found");
                as_clause(b, DataType::Logical);
            });
            b.node(NodeKind::DefineParameter, "DEFINE", |b| {
                b.keyword(Keyword::InputOutput);
                b.identifier("hits");
                as_clause(b, DataType::Integer);
            });
        });
    });

    let index = &analyzed.index;
    let procedure = analyzed.scope_of(NodeKind::ProcedureStatement);
    let routine = index.resolve_routine(index.root_scope(), "lookup").unwrap();
    let parameters = &index.symbol(routine).as_routine().unwrap().parameters;

    let modes: Vec<_> = parameters.iter().map(|parameter| parameter.mode).collect();
    assert_eq!(
        modes,
        vec![ParameterMode::Input, ParameterMode::Output, ParameterMode::InputOutput]
    );
    assert_eq!(parameters[1].symbol, analyzed.variable(procedure, "found"));
    assert!(index.symbol(parameters[0].symbol).as_variable().unwrap().is_parameter);
    assert!(index.resolve_variable(index.root_scope(), "found").is_none());
}

#[test]
fn test_buffer_parameter_is_usable_in_body() {
    // FUNCTION hasCredit RETURNS LOGICAL (BUFFER b FOR customer): DISPLAY b.name. END.
    let analyzed = analyze_ok!(|b| {
        b.node(NodeKind::FunctionStatement, "FUNCTION", |b| {
            b.identifier("hasCredit");
            b.node(NodeKind::ReturnsClause, "RETURNS", |b| {
                b.leaf(NodeKind::Datatype(DataType::Logical), "LOGICAL");
            });
            b.node(NodeKind::BufferParameter, "BUFFER", |b| {
                b.identifier("b");
                b.record("customer");
            });
            display(b, &["b.name"]);
        });
    });

    let index = &analyzed.index;
    let function = analyzed.scope_of(NodeKind::FunctionStatement);
    let buffer = index.resolve(function, Namespace::Buffer, "b").unwrap();
    assert!(!index.symbol(buffer).as_table_buffer().unwrap().is_default);

    let routine = index.scope(function).routine.unwrap();
    let routine_data = index.symbol(routine).as_routine().unwrap();
    assert_eq!(routine_data.return_type, Some(DataType::Logical));
    assert_eq!(routine_data.parameters.len(), 1);
    assert_eq!(routine_data.parameters[0].mode, ParameterMode::Buffer);
    assert_eq!(routine_data.parameters[0].symbol, buffer);

    let field = analyzed.attrs(NodeKind::Field, "b.name");
    let field_buffer = index.symbol(field.symbol.unwrap()).as_field_buffer().unwrap();
    assert_eq!(field_buffer.buffer, buffer);
    assert!(!field.flags.contains(AttributeFlags::UNQUALIFIED_FIELD));
    let scope = index.buffer_scope(field.buffer_scope.unwrap());
    assert_eq!(scope.block, index.scope(function).root_block());
}

#[test]
fn test_table_parameter_uses_default_buffer() {
    let analyzed = analyze_ok!(|b| {
        b.node(NodeKind::DefineTempTable, "DEFINE", |b| {
            b.identifier("ttResult");
            b.node(NodeKind::TableField, "FIELD", |b| {
                b.identifier("id");
                as_clause(b, DataType::Integer);
            });
        });
        b.node(NodeKind::ProcedureStatement, "PROCEDURE", |b| {
            b.identifier("fill");
            b.node(NodeKind::TableParameter, "PARAMETER", |b| {
                b.keyword(Keyword::Output);
                b.record("ttResult");
            });
        });
    });

    let index = &analyzed.index;
    let default_buffer = index
        .scope(index.root_scope())
        .lookup(Namespace::Table, "ttresult")
        .unwrap();
    let routine = index.resolve_routine(index.root_scope(), "fill").unwrap();
    let parameters = &index.symbol(routine).as_routine().unwrap().parameters;
    assert_eq!(parameters.len(), 1);
    assert_eq!(parameters[0].symbol, default_buffer);
    assert_eq!(parameters[0].mode, ParameterMode::Output);
}

#[test]
fn test_event_parameters_are_not_visible() {
    let analyzed = analyze_ok!(|b| {
        b.node(NodeKind::DefineEvent, "DEFINE", |b| {
            b.identifier("Changed");
            function_parameter(b, Some(Keyword::Input), "newValue", DataType::Integer);
        });
    });

    let index = &analyzed.index;
    let root = index.root_scope();
    let event = index.resolve(root, Namespace::Event, "changed").unwrap();
    let parameters = &index.symbol(event).as_event().unwrap().parameters;
    assert_eq!(parameters.len(), 1);
    assert!(!index.symbol(parameters[0]).is_attached());
    assert!(index.resolve_variable(root, "newValue").is_none());

    // The program routine gets no parameters from the event signature
    let program = index.scope(root).routine.unwrap();
    assert!(index.symbol(program).as_routine().unwrap().parameters.is_empty());
}
