//! Common test utilities for tree parser tests
//!
//! This module contains all shared test infrastructure including:
//! - Schema and type-information fixtures
//! - Analysis entry points used by the `analyze_ok!` / `analyze_err!` macros
//! - Helpers for building the parse-tree shapes of common ABL statements
//! - Accessors for the annotations a test wants to check

use abl_compiler_diagnostics::DiagnosticSeverity;
use abl_compiler_syntax::{
    DataType, Keyword, NodeAttributes, NodeFlags, NodeId, NodeKind, ParseTree, ScopeId, SymbolId,
    TreeBuilder,
};

pub use abl_compiler_semantic::{
    analyze, Schema, SemanticError, SemanticIndex, TreeParserOptions, TypeInfoRegistry,
};

// ===== Fixtures =====

pub fn sports_schema() -> Schema {
    abl_test_utils::load_json_fixture("schema/sports.json").expect("sports schema fixture")
}

pub fn class_types() -> TypeInfoRegistry {
    TypeInfoRegistry::from_json(&abl_test_utils::read_fixture("types/classes.json"))
        .expect("class type fixture")
}

// ===== Analysis =====

/// A parse tree together with the index its analysis produced.
pub struct Analyzed {
    pub tree: ParseTree,
    pub index: SemanticIndex,
}

fn file_name_for(test_name: &str) -> String {
    let local_name = test_name.rsplit("::").next().unwrap_or(test_name);
    format!("{local_name}.p")
}

pub fn analyze_ok_impl(
    test_name: &str,
    options: &TreeParserOptions,
    build: impl FnOnce(&mut TreeBuilder),
) -> Analyzed {
    abl_test_utils::init_tracing();
    let mut tree = TreeBuilder::program(file_name_for(test_name), build);
    match analyze(&mut tree, &sports_schema(), &class_types(), options) {
        Ok(index) => Analyzed { tree, index },
        Err(error) => panic!("{test_name}: analysis failed: {error}"),
    }
}

pub fn analyze_err_impl(
    test_name: &str,
    build: impl FnOnce(&mut TreeBuilder),
) -> (ParseTree, SemanticError) {
    abl_test_utils::init_tracing();
    let mut tree = TreeBuilder::program(file_name_for(test_name), build);
    match analyze(
        &mut tree,
        &sports_schema(),
        &class_types(),
        &TreeParserOptions::default(),
    ) {
        Ok(_) => panic!("{test_name}: expected analysis to fail"),
        Err(error) => (tree, error),
    }
}

impl Analyzed {
    /// The `n`-th node (in tree order) of `kind` whose text is `text`.
    pub fn nth(&self, kind: NodeKind, text: &str, n: usize) -> NodeId {
        self.tree
            .find_all(kind)
            .into_iter()
            .filter(|node| self.tree.text(*node).eq_ignore_ascii_case(text))
            .nth(n)
            .unwrap_or_else(|| panic!("no node #{n} of kind {kind:?} with text '{text}'"))
    }

    pub fn node(&self, kind: NodeKind, text: &str) -> NodeId {
        self.nth(kind, text, 0)
    }

    pub fn attrs(&self, kind: NodeKind, text: &str) -> &NodeAttributes {
        self.tree.attrs(self.node(kind, text))
    }

    pub fn symbol_at(&self, node: NodeId) -> SymbolId {
        self.tree
            .attrs(node)
            .symbol
            .unwrap_or_else(|| panic!("node '{}' has no symbol", self.tree.text(node)))
    }

    /// Symbol of the first `Field` node with text `name`.
    pub fn field_symbol(&self, name: &str) -> SymbolId {
        self.symbol_at(self.node(NodeKind::Field, name))
    }

    /// Symbol of the first `Record` node with text `name`.
    pub fn record_symbol(&self, name: &str) -> SymbolId {
        self.symbol_at(self.node(NodeKind::Record, name))
    }

    /// Scope introduced by the first node of `kind` (a procedure, function, ...).
    pub fn scope_of(&self, kind: NodeKind) -> ScopeId {
        let node = self
            .tree
            .find_all(kind)
            .into_iter()
            .next()
            .unwrap_or_else(|| panic!("no node of kind {kind:?}"));
        self.tree
            .attrs(node)
            .scope
            .unwrap_or_else(|| panic!("{kind:?} node has no scope"))
    }

    pub fn variable(&self, scope: ScopeId, name: &str) -> SymbolId {
        self.index
            .resolve_variable(scope, name)
            .unwrap_or_else(|| panic!("variable '{name}' not visible from {scope:?}"))
    }

    /// Diagnostics one per line, for inline snapshots.
    pub fn format_diagnostics(&self) -> String {
        self.index
            .diagnostics()
            .iter()
            .map(|diagnostic| {
                let severity = match diagnostic.severity {
                    DiagnosticSeverity::Error => "error",
                    DiagnosticSeverity::Warning => "warning",
                    DiagnosticSeverity::Info => "info",
                };
                format!(
                    "{severity}[{}] line {}: {}",
                    u32::from(diagnostic.code),
                    diagnostic.location.line,
                    diagnostic.message
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ===== Tree shapes =====

/// `DEFINE VARIABLE name AS type.`
pub fn define_variable(b: &mut TreeBuilder, name: &str, data_type: DataType) -> NodeId {
    b.node(NodeKind::DefineVariable, "DEFINE", |b| {
        b.identifier(name);
        as_clause(b, data_type);
    })
}

/// `DEFINE VARIABLE name LIKE source.`
pub fn define_variable_like(b: &mut TreeBuilder, name: &str, source: &str) -> NodeId {
    b.node(NodeKind::DefineVariable, "DEFINE", |b| {
        b.identifier(name);
        b.node(NodeKind::LikeClause, "LIKE", |b| {
            b.field(source);
        });
    })
}

pub fn as_clause(b: &mut TreeBuilder, data_type: DataType) -> NodeId {
    b.node(NodeKind::AsClause, "AS", |b| {
        b.leaf(NodeKind::Datatype(data_type), &format!("{data_type:?}").to_uppercase());
    })
}

/// `[INPUT|OUTPUT|...] PARAMETER name AS type` of a function or method header.
pub fn function_parameter(b: &mut TreeBuilder, mode: Option<Keyword>, name: &str, data_type: DataType) -> NodeId {
    b.node(NodeKind::FunctionParameter, "PARAMETER", |b| {
        if let Some(mode) = mode {
            b.keyword(mode);
        }
        b.identifier(name);
        as_clause(b, data_type);
    })
}

/// `FIND table.`
pub fn find(b: &mut TreeBuilder, table: &str) -> NodeId {
    b.node(NodeKind::FindStatement, "FIND", |b| {
        b.node(NodeKind::RecordPhrase, "RECORD", |b| {
            b.record(table);
        });
    })
}

/// `FOR EACH table: body END.`
pub fn for_each(b: &mut TreeBuilder, table: &str, body: impl FnOnce(&mut TreeBuilder)) -> NodeId {
    b.node(NodeKind::ForBlock, "FOR", |b| {
        b.node(NodeKind::RecordPhrase, "EACH", |b| {
            b.record(table);
        });
        body(b);
    })
}

/// `DISPLAY field field ...`
pub fn display(b: &mut TreeBuilder, fields: &[&str]) -> NodeId {
    b.node(NodeKind::DisplayStatement, "DISPLAY", |b| {
        for field in fields {
            b.field(field);
        }
    })
}

/// `ASSIGN target = value.` with a single-field right-hand side.
pub fn assign(b: &mut TreeBuilder, target: &str, value: &str) -> NodeId {
    b.node(NodeKind::AssignStatement, "ASSIGN", |b| {
        b.node(NodeKind::AssignEqual, "=", |b| {
            b.field(target);
            b.node(NodeKind::Expression, "EXPR", |b| {
                b.field(value);
            });
        });
    })
}

/// A field reference that also defines a variable of its name.
pub fn inline_variable(b: &mut TreeBuilder, name: &str) -> NodeId {
    b.flagged_leaf(NodeKind::Field, name, NodeFlags::INLINE_VAR_DEF)
}
