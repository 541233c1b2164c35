//! # Semantic Index
//!
//! The result of running the tree parser over one parse unit: the scope tree, the block
//! tree with its buffer scopes, every symbol and table the unit defines or references,
//! and the recoverable diagnostics met on the way.
//!
//! The parse tree itself is annotated in place: each resolved node links to its symbol,
//! scope, block and buffer scope through [`abl_compiler_syntax::NodeAttributes`].

use abl_compiler_diagnostics::DiagnosticCollection;
use abl_compiler_syntax::{
    BlockId, BufferScopeId, DataType, NodeId, ParseTree, ScopeId, SymbolId,
};
use index_vec::IndexVec;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::block::{Block, BufferScope};
use crate::builder::SemanticIndexBuilder;
use crate::options::TreeParserOptions;
use crate::schema::SchemaLookup;
use crate::scope::{Namespace, Scope};
use crate::semantic_errors::SemanticError;
use crate::symbol::{Extent, Symbol, SymbolKind};
use crate::table::{match_name, Field, FieldId, FieldMatch, Index, IndexId, Table, TableId, TableKind};
use crate::type_info::TypeInfoLookup;

/// Resolve every name in `tree`, annotating it in place.
///
/// On a fatal resolution failure the annotations written so far are removed again, so the
/// caller sees either a fully resolved tree or an untouched one.
pub fn analyze(
    tree: &mut ParseTree,
    schema: &dyn SchemaLookup,
    types: &dyn TypeInfoLookup,
    options: &TreeParserOptions,
) -> Result<SemanticIndex, SemanticError> {
    let file = tree.file_name(0).map(SmolStr::new);
    let _span = tracing::trace_span!("tree_parser", ?file).entered();

    let result = SemanticIndexBuilder::new(tree, schema, types, options).build();
    if result.is_err() {
        tree.clear_attributes();
    }
    result
}

/// Analyze independent parse units in parallel against one shared schema and type
/// registry. Each unit succeeds or fails on its own.
pub fn analyze_units(
    units: &mut [ParseTree],
    schema: &dyn SchemaLookup,
    types: &dyn TypeInfoLookup,
    options: &TreeParserOptions,
) -> Vec<Result<SemanticIndex, SemanticError>> {
    units
        .par_iter_mut()
        .map(|tree| analyze(tree, schema, types, options))
        .collect()
}

/// A field or variable name that matched nothing outside a tolerant phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    pub node: NodeId,
    pub name: SmolStr,
    pub scope: ScopeId,
}

#[derive(Debug, Default)]
pub struct SemanticIndex {
    pub(crate) scopes: IndexVec<ScopeId, Scope>,
    pub(crate) blocks: IndexVec<BlockId, Block>,
    pub(crate) buffer_scopes: IndexVec<BufferScopeId, BufferScope>,
    pub(crate) symbols: IndexVec<SymbolId, Symbol>,
    pub(crate) tables: IndexVec<TableId, Table>,
    pub(crate) fields: IndexVec<FieldId, Field>,
    pub(crate) indexes: IndexVec<IndexId, Index>,
    /// Materialized schema tables, keyed by lowercased `db.table`
    pub(crate) schema_tables: FxHashMap<SmolStr, TableId>,
    pub(crate) unresolved: Vec<UnresolvedReference>,
    pub(crate) defaulted_qualifiers: Vec<NodeId>,
    pub(crate) diagnostics: DiagnosticCollection,
}

impl SemanticIndex {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Scopes =====

    pub fn root_scope(&self) -> ScopeId {
        ScopeId::new(0)
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    pub fn scopes(&self) -> impl Iterator<Item = (ScopeId, &Scope)> {
        self.scopes.iter_enumerated()
    }

    pub fn child_scopes(&self, parent: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        self.scopes
            .iter_enumerated()
            .filter(move |(_, scope)| scope.parent() == Some(parent))
            .map(|(id, _)| id)
    }

    /// `scope` followed by its ancestors up to the root.
    pub fn scope_chain(&self, scope: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(scope), |id| self.scopes[*id].parent())
    }

    /// Look `name` up in `scope` and then in its ancestors.
    pub fn resolve(&self, scope: ScopeId, namespace: Namespace, name: &str) -> Option<SymbolId> {
        self.scope_chain(scope)
            .find_map(|id| self.scopes[id].lookup(namespace, name))
    }

    pub fn resolve_variable(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.resolve(scope, Namespace::Variable, name)
    }

    pub fn resolve_routine(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.resolve(scope, Namespace::Routine, name)
    }

    // ===== Blocks =====

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id]
    }

    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &Block)> {
        self.blocks.iter_enumerated()
    }

    /// `block` followed by its enclosing blocks.
    pub fn block_chain(&self, block: BlockId) -> impl Iterator<Item = BlockId> + '_ {
        std::iter::successors(Some(block), |id| self.blocks[*id].parent)
    }

    pub fn buffer_scope(&self, id: BufferScopeId) -> &BufferScope {
        &self.buffer_scopes[id]
    }

    // ===== Symbols =====

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id]
    }

    pub fn symbols(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols.iter_enumerated()
    }

    /// All symbols with the given name, attached or not, in definition order.
    pub fn symbols_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = SymbolId> + 'a {
        self.symbols
            .iter_enumerated()
            .filter(move |(_, symbol)| symbol.name.eq_ignore_ascii_case(name))
            .map(|(id, _)| id)
    }

    pub fn data_type(&self, symbol: SymbolId) -> Option<DataType> {
        match &self.symbols[symbol].kind {
            SymbolKind::Variable(variable) => variable.data_type,
            SymbolKind::FieldBuffer(field_buffer) => self.fields[field_buffer.field].data_type,
            _ => None,
        }
    }

    pub fn class_name(&self, symbol: SymbolId) -> Option<&str> {
        match &self.symbols[symbol].kind {
            SymbolKind::Variable(variable) => variable.class_name.as_deref(),
            SymbolKind::FieldBuffer(field_buffer) => {
                self.fields[field_buffer.field].class_name.as_deref()
            }
            _ => None,
        }
    }

    pub fn extent(&self, symbol: SymbolId) -> Extent {
        match &self.symbols[symbol].kind {
            SymbolKind::Variable(variable) => variable.extent,
            SymbolKind::FieldBuffer(field_buffer) => self.fields[field_buffer.field].extent,
            _ => Extent::Scalar,
        }
    }

    /// Table a buffer symbol is bound to.
    pub fn buffer_table(&self, symbol: SymbolId) -> Option<TableId> {
        self.symbols[symbol].as_table_buffer().map(|buffer| buffer.table)
    }

    // ===== Tables =====

    pub fn table(&self, id: TableId) -> &Table {
        &self.tables[id]
    }

    pub fn tables(&self) -> impl Iterator<Item = (TableId, &Table)> {
        self.tables.iter_enumerated()
    }

    pub fn field(&self, id: FieldId) -> &Field {
        &self.fields[id]
    }

    pub fn index(&self, id: IndexId) -> &Index {
        &self.indexes[id]
    }

    /// Temp-table or work-table defined by this unit.
    pub fn temp_table(&self, name: &str) -> Option<TableId> {
        self.scopes[self.root_scope()]
            .lookup(Namespace::Table, name)
            .and_then(|buffer| self.buffer_table(buffer))
    }

    /// A field of `table` by name. Schema fields may be abbreviated; temp-table fields
    /// must be spelled out.
    pub fn lookup_table_field(&self, table: TableId, name: &str) -> Option<FieldMatch> {
        let table = &self.tables[table];
        let candidates = table
            .fields
            .iter()
            .map(|field| (self.fields[*field].name.as_str(), *field));
        match_name(name, candidates, table.kind == TableKind::Schema)
            .map(|(field, abbreviated)| FieldMatch { field, abbreviated })
    }

    pub fn index_named(&self, table: TableId, name: &str) -> Option<IndexId> {
        self.tables[table]
            .indexes
            .iter()
            .copied()
            .find(|index| self.indexes[*index].name.eq_ignore_ascii_case(name))
    }

    /// Field names of an index, in index order.
    pub fn index_field_names(&self, index: IndexId) -> Vec<&str> {
        self.indexes[index]
            .fields
            .iter()
            .map(|field| self.fields[*field].name.as_str())
            .collect()
    }

    // ===== Results =====

    pub fn unresolved_references(&self) -> &[UnresolvedReference] {
        &self.unresolved
    }

    /// Nodes whose context qualifier defaulted to REF (recorded only when enabled).
    pub fn defaulted_qualifiers(&self) -> &[NodeId] {
        &self.defaulted_qualifiers
    }

    pub const fn diagnostics(&self) -> &DiagnosticCollection {
        &self.diagnostics
    }
}
