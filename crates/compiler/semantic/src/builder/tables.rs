//! Temp-table, work-table and buffer definitions.
//!
//! A table definition is built while its statement is visited: LIKE copies the source
//! table's fields, FIELD clauses add fields, INDEX clauses add indexes. Index fields and
//! the indexes inherited through LIKE are resolved when the statement closes, once every
//! field is known, and the table is frozen.

use abl_compiler_diagnostics::Diagnostic;
use abl_compiler_syntax::{ContextQualifier, Keyword, NodeId, NodeKind, SymbolId};
use smol_str::SmolStr;

use super::SemanticIndexBuilder;
use crate::block::BufferScopeStrength;
use crate::semantic_errors::SemanticError;
use crate::symbol::{DefinitionState, ParameterMode, SymbolKind, TableBuffer};
use crate::table::{Field, FieldId, Index, IndexFlags, IndexId, Table, TableId, TableKind};

/// State of the temp-table statement being visited.
#[derive(Debug)]
pub(super) struct TableDefinition {
    table: TableId,
    buffer: SymbolId,
    /// Source table of a LIKE clause
    like: Option<TableId>,
    /// USE-INDEX names, applied to the LIKE source's indexes
    use_index: Vec<(SmolStr, NodeId)>,
    has_explicit_index: bool,
    index_fields: Vec<PendingIndexField>,
}

#[derive(Debug)]
struct PendingIndexField {
    index: IndexId,
    name: SmolStr,
    node: NodeId,
}

/// A FIELD clause being visited: the field exists, but is not yet part of its table.
struct PendingField {
    field: FieldId,
    symbol: SymbolId,
}

impl SemanticIndexBuilder<'_> {
    fn table_definition(&mut self) -> &mut TableDefinition {
        self.table_definition
            .as_mut()
            .expect("table clause outside of a table definition")
    }

    pub(super) fn define_temp_table(&mut self, node: NodeId, kind: TableKind) -> Result<(), SemanticError> {
        assert!(
            self.table_definition.is_none(),
            "table definitions do not nest"
        );
        let name = SmolStr::new(self.tree.identifier(node).unwrap_or_default());
        let buffer = self.define_table(node, name, kind);
        let table = self
            .index
            .buffer_table(buffer)
            .expect("define_table creates a table buffer");

        self.table_definition = Some(TableDefinition {
            table,
            buffer,
            like: None,
            use_index: Vec::new(),
            has_explicit_index: false,
            index_fields: Vec::new(),
        });
        let result = self.visit_children(node);
        let definition = self
            .table_definition
            .take()
            .expect("table definition still open");
        self.end_definition(buffer);
        result?;

        self.post_define_table(definition);
        Ok(())
    }

    /// Create a temp-table and its default buffer. Temp-tables are global to the
    /// compilation unit, so the buffer is registered in the root scope right away.
    fn define_table(&mut self, node: NodeId, name: SmolStr, kind: TableKind) -> SymbolId {
        let table = self
            .index
            .tables
            .push(Table::new(name.clone(), kind, Some(node)));
        let root = self.index.root_scope();
        let buffer = self.create_symbol(
            root,
            Some(node),
            name,
            SymbolKind::TableBuffer(TableBuffer::new(table, true)),
        );
        self.attach(buffer);
        self.symbol_stack.push(buffer);
        tracing::trace!(table = %self.index.tables[table].name, ?kind, "define table");
        buffer
    }

    /// `LIKE table`: copy every field of the source table.
    pub(super) fn table_like(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let Some(record) = self.tree.child_of_kind(node, NodeKind::Record) else {
            return self.visit_children(node);
        };
        self.qualify(record, ContextQualifier::Symbol);
        let source_buffer = self.record_reference(record)?;
        let source = self
            .index
            .buffer_table(source_buffer)
            .expect("record references resolve to table buffers");
        self.table_definition().like = Some(source);
        self.define_fields_like(source);
        Ok(())
    }

    fn define_fields_like(&mut self, source: TableId) {
        let table = self.table_definition().table;
        for field in self.index.tables[source].fields.clone() {
            let source_field = &self.index.fields[field];
            let copy = Field {
                table: Some(table),
                ..source_field.clone()
            };
            let copy = self.index.fields.push(copy);
            self.index.tables[table].push_field(copy);
        }
    }

    pub(super) fn table_use_index(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let name = SmolStr::new(self.tree.identifier(node).unwrap_or_default());
        self.table_definition().use_index.push((name, node));
        Ok(())
    }

    /// FIELD clause. The field joins its table only once its own clauses are done, so a
    /// `LIKE` inside the clause cannot see it.
    pub(super) fn table_field(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let name = SmolStr::new(self.tree.identifier(node).unwrap_or_default());
        let pending = self.begin_field(node, name);
        let result = self.visit_children(node);
        self.finalize_field(pending);
        result
    }

    fn begin_field(&mut self, node: NodeId, name: SmolStr) -> PendingField {
        let buffer = self.table_definition().buffer;
        let field = self.index.fields.push(Field::new(name));
        let symbol = self.field_buffer(buffer, field);
        self.tree.attrs_mut(node).symbol = Some(symbol);
        self.index.symbols[symbol].definition_node = Some(node);
        self.symbol_stack.push(symbol);
        PendingField { field, symbol }
    }

    fn finalize_field(&mut self, pending: PendingField) {
        self.end_definition(pending.symbol);
        let table = self.table_definition().table;
        self.index.fields[pending.field].table = Some(table);
        self.index.tables[table].push_field(pending.field);
    }

    /// INDEX clause. Its fields are looked up when the table definition closes.
    pub(super) fn table_index(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let name = SmolStr::new(self.tree.identifier(node).unwrap_or_default());
        let mut flags = IndexFlags::empty();
        flags.set(IndexFlags::UNIQUE, self.tree.has_keyword(node, Keyword::Unique));
        flags.set(IndexFlags::PRIMARY, self.tree.has_keyword(node, Keyword::Primary));
        flags.set(IndexFlags::WORD, self.tree.has_keyword(node, Keyword::Word));

        let table = self.table_definition().table;
        let index = self.index.indexes.push(Index {
            name,
            table,
            fields: Vec::new(),
            flags,
        });
        self.index.tables[table].push_index(index);

        let fields: Vec<PendingIndexField> = self
            .tree
            .children_of_kind(node, NodeKind::IndexField)
            .map(|field| PendingIndexField {
                index,
                name: SmolStr::new(self.tree.text(field)),
                node: field,
            })
            .collect();
        let definition = self.table_definition();
        definition.has_explicit_index = true;
        definition.index_fields.extend(fields);
        Ok(())
    }

    /// Close a table definition.
    ///
    /// Indexes of a LIKE source are inherited unless the definition declares indexes of
    /// its own. USE-INDEX restricts the inherited indexes to the ones it names, and is
    /// honored even alongside explicit indexes.
    fn post_define_table(&mut self, definition: TableDefinition) {
        let table = definition.table;
        match definition.like {
            Some(source) if !definition.use_index.is_empty() => {
                for (name, node) in &definition.use_index {
                    match self.index.index_named(source, name) {
                        Some(index) => self.define_index_like(index, table),
                        None => {
                            let source_name = self.index.tables[source].name.clone();
                            tracing::warn!(index = %name, table = %source_name, "USE-INDEX names an unknown index");
                            self.report(Diagnostic::unknown_use_index(
                                name,
                                &source_name,
                                self.location(*node),
                            ));
                        }
                    }
                }
            }
            Some(source) if !definition.has_explicit_index => {
                for index in self.index.tables[source].indexes.clone() {
                    self.define_index_like(index, table);
                }
            }
            Some(_) => {}
            None => {
                for (name, node) in &definition.use_index {
                    let table_name = self.index.tables[table].name.clone();
                    self.report(Diagnostic::unknown_use_index(
                        name,
                        &table_name,
                        self.location(*node),
                    ));
                }
            }
        }

        for pending in definition.index_fields {
            match self.index.lookup_table_field(table, &pending.name) {
                Some(found) => self.index.indexes[pending.index].fields.push(found.field),
                None => {
                    let index_name = self.index.indexes[pending.index].name.clone();
                    tracing::info!(field = %pending.name, index = %index_name, "index field not in table, skipped");
                    self.report(Diagnostic::skipped_index_field(
                        &pending.name,
                        &index_name,
                        self.location(pending.node),
                    ));
                }
            }
        }

        self.index.tables[table].freeze();
    }

    /// Copy `source` onto `table`, mapping its fields by name. Fields the new table does
    /// not have are left out of the copy.
    fn define_index_like(&mut self, source: IndexId, table: TableId) {
        let source_index = self.index.indexes[source].clone();
        let definition_node = self.index.tables[table]
            .definition_node
            .expect("temp-tables keep their DEFINE node");
        let mut fields = Vec::with_capacity(source_index.fields.len());
        for field in &source_index.fields {
            let name = self.index.fields[*field].name.clone();
            match self.index.lookup_table_field(table, &name) {
                Some(found) => fields.push(found.field),
                None => {
                    tracing::info!(field = %name, index = %source_index.name, "index field not in table, skipped");
                    self.report(Diagnostic::skipped_index_field(
                        &name,
                        &source_index.name,
                        self.location(definition_node),
                    ));
                }
            }
        }
        let index = self.index.indexes.push(Index {
            table,
            fields,
            ..source_index
        });
        self.index.tables[table].push_index(index);
    }

    // ===== Buffers =====

    /// `DEFINE BUFFER name FOR [TEMP-TABLE] table`.
    pub(super) fn define_buffer(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let buffer = self.named_buffer_for(node)?;
        self.end_definition(buffer);
        self.attach(buffer);
        Ok(())
    }

    /// `BUFFER name FOR table` in a parameter list. The buffer is usable as soon as it
    /// is declared and is scoped to the routine.
    pub(super) fn buffer_parameter(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let buffer = self.named_buffer_for(node)?;
        self.end_definition(buffer);
        self.add_parameter(buffer, ParameterMode::Buffer, true);
        let root_block = self.index.scopes[self.current_scope()].root_block();
        self.add_buffer_scope(root_block, buffer, BufferScopeStrength::Reference);
        Ok(())
    }

    /// Resolve the table of a buffer definition and define the buffer, leaving it open.
    fn named_buffer_for(&mut self, node: NodeId) -> Result<SymbolId, SemanticError> {
        let qualifier = if self.tree.has_keyword(node, Keyword::TempTable) {
            ContextQualifier::TempTableSymbol
        } else {
            ContextQualifier::Symbol
        };
        let mut table = None;
        for child in self.children(node) {
            if table.is_none() && self.tree.kind(child) == NodeKind::Record {
                self.qualify(child, qualifier);
                let source = self.record_reference(child)?;
                table = self.index.buffer_table(source);
            } else {
                self.visit(child)?;
            }
        }
        let table = table.expect("buffer definitions name their table");
        let name = SmolStr::new(self.tree.identifier(node).unwrap_or_default());
        Ok(self.define_symbol(
            node,
            name,
            SymbolKind::TableBuffer(TableBuffer::new(table, false)),
        ))
    }

    /// `TABLE tt` in a parameter list: the temp-table's default buffer is the parameter.
    pub(super) fn table_parameter(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let mode = self.parameter_mode(node);
        let mut buffer = None;
        for child in self.children(node) {
            if buffer.is_none() && self.tree.kind(child) == NodeKind::Record {
                self.qualify(child, ContextQualifier::TempTableSymbol);
                buffer = Some(self.record_reference(child)?);
            } else {
                self.visit(child)?;
            }
        }
        if let Some(buffer) = buffer {
            debug_assert_eq!(
                self.index.symbols[buffer].state,
                DefinitionState::Attached,
                "temp-table buffers are attached when defined"
            );
            self.add_parameter(buffer, mode, false);
        }
        Ok(())
    }
}
