//! Record and field resolution.

use abl_compiler_diagnostics::Diagnostic;
use abl_compiler_syntax::{
    AttributeFlags, BufferScopeId, ContextQualifier, Keyword, NodeFlags, NodeId, NodeKind,
    ScopeId, StoreType, SymbolId, WidgetKind,
};
use smol_str::SmolStr;

use super::SemanticIndexBuilder;
use crate::block::BufferScopeStrength;
use crate::qualifier::TableNameResolution;
use crate::scope::Namespace;
use crate::semantic_errors::SemanticError;
use crate::schema::SchemaTableRef;
use crate::semantic_index::UnresolvedReference;
use crate::symbol::{DefinitionState, Extent, FieldBuffer, SymbolKind, TableBuffer, Variable};
use crate::table::{Field, FieldId, Index, IndexFlags, Table, TableId, TableKind};

/// Where a record name is looked up, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordLookup {
    /// Named buffer, then temp-table, then schema table
    Buffer,
    TempTable,
    SchemaTable,
}

impl From<ContextQualifier> for RecordLookup {
    fn from(qualifier: ContextQualifier) -> Self {
        match qualifier {
            ContextQualifier::TempTableSymbol => Self::TempTable,
            ContextQualifier::SchemaTableSymbol => Self::SchemaTable,
            ContextQualifier::Ref
            | ContextQualifier::RefUp
            | ContextQualifier::Updating
            | ContextQualifier::Init
            | ContextQualifier::InitWeak
            | ContextQualifier::Symbol
            | ContextQualifier::BufferSymbol => Self::Buffer,
        }
    }
}

/// What an unqualified or `buffer.field` name resolved to.
#[derive(Debug, Clone, Copy)]
struct FieldLookup {
    symbol: SymbolId,
    buffer_scope: Option<BufferScopeId>,
    unqualified: bool,
    abbreviated: bool,
}

impl FieldLookup {
    const fn plain(symbol: SymbolId) -> Self {
        Self {
            symbol,
            buffer_scope: None,
            unqualified: false,
            abbreviated: false,
        }
    }
}

/// Field-level widgets take part in unqualified field lookup.
const FIELD_LEVEL_WIDGETS: [WidgetKind; 4] = [
    WidgetKind::Button,
    WidgetKind::Image,
    WidgetKind::Rectangle,
    WidgetKind::Browse,
];

impl SemanticIndexBuilder<'_> {
    // ===== Records =====

    /// Resolve a `Record` node to a buffer and annotate it. A record that names nothing
    /// ends the analysis of the unit.
    pub(super) fn record_reference(&mut self, node: NodeId) -> Result<SymbolId, SemanticError> {
        let qualifier = self.take_qualifier(node);
        let name = SmolStr::new(self.tree.text(node));

        let Some(buffer) = self.find_buffer(&name, RecordLookup::from(qualifier)) else {
            let location = self.location(node);
            tracing::error!(%name, %qualifier, %location, "could not resolve table");
            return Err(SemanticError::UnresolvedTable {
                name,
                file: self.file_name(node),
                location,
            });
        };

        let buffer_scope = match qualifier {
            ContextQualifier::Init
            | ContextQualifier::Ref
            | ContextQualifier::RefUp
            | ContextQualifier::Updating => Some(self.get_buffer_for_reference(buffer)),
            ContextQualifier::InitWeak => Some(self.weak_buffer_scope(buffer)),
            _ => None,
        };
        self.note_reference(buffer, qualifier);

        let table = self
            .index
            .buffer_table(buffer)
            .expect("record lookups only return table buffers");
        let abbreviated = self.is_abbreviated_table_name(buffer, &name);
        let attrs = self.tree.attrs_mut(node);
        attrs.symbol = Some(buffer);
        attrs.qualifier = Some(qualifier);
        attrs.store_type = Some(self.index.tables[table].kind.into());
        attrs.buffer_scope = buffer_scope;
        if abbreviated {
            self.annotate_flags(node, AttributeFlags::ABBREVIATED);
        }

        self.prev_table_referenced = self.last_table_referenced.replace(buffer);
        self.visit_children(node)?;
        Ok(buffer)
    }

    /// Find the buffer a record name refers to, materializing schema tables on first use.
    /// Named buffers shadow tables, including the schema tables their name abbreviates.
    fn find_buffer(&mut self, name: &str, lookup: RecordLookup) -> Option<SymbolId> {
        match lookup {
            RecordLookup::Buffer => self
                .named_buffer(name)
                .or_else(|| self.temp_table_buffer(name))
                .or_else(|| self.schema_buffer(name)),
            RecordLookup::TempTable => self.temp_table_buffer(name),
            RecordLookup::SchemaTable => self.schema_buffer(name),
        }
    }

    fn named_buffer(&self, name: &str) -> Option<SymbolId> {
        self.index
            .resolve(self.current_scope(), Namespace::Buffer, name)
    }

    fn temp_table_buffer(&self, name: &str) -> Option<SymbolId> {
        let root = self.index.root_scope();
        self.index.scopes[root].lookup(Namespace::Table, name)
    }

    fn schema_buffer(&mut self, name: &str) -> Option<SymbolId> {
        let schema = self.schema;
        let table = schema.lookup_table(name)?;
        let table = self.materialize_schema_table(table);
        Some(self.default_buffer(table))
    }

    /// Copy a schema table into the index the first time the unit refers to it.
    fn materialize_schema_table(&mut self, source: SchemaTableRef<'_>) -> TableId {
        let key = SmolStr::new(format!("{}.{}", source.database, source.table.name).to_ascii_lowercase());
        if let Some(table) = self.index.schema_tables.get(&key) {
            return *table;
        }

        let mut table = Table::new(source.table.name.clone(), TableKind::Schema, None);
        table.database = Some(SmolStr::new(source.database));
        let table_id = self.index.tables.push(table);

        for schema_field in &source.table.fields {
            let mut field = Field::new(schema_field.name.clone());
            field.table = Some(table_id);
            field.data_type = Some(schema_field.data_type);
            if schema_field.extent > 0 {
                field.extent = Extent::Fixed(schema_field.extent);
            }
            let field = self.index.fields.push(field);
            self.index.tables[table_id].push_field(field);
        }

        for schema_index in &source.table.indexes {
            let fields = schema_index
                .fields
                .iter()
                .filter_map(|name| {
                    self.index
                        .lookup_table_field(table_id, name)
                        .filter(|found| !found.abbreviated)
                        .map(|found| found.field)
                })
                .collect();
            let mut flags = IndexFlags::empty();
            flags.set(IndexFlags::UNIQUE, schema_index.unique);
            flags.set(IndexFlags::PRIMARY, schema_index.primary);
            flags.set(IndexFlags::WORD, schema_index.word);
            let index = self.index.indexes.push(Index {
                name: schema_index.name.clone(),
                table: table_id,
                fields,
                flags,
            });
            self.index.tables[table_id].push_index(index);
        }

        self.index.tables[table_id].freeze();
        self.index.schema_tables.insert(key, table_id);
        tracing::debug!(table = %self.index.tables[table_id].qualified_name(), "schema table loaded");
        table_id
    }

    /// The unnamed buffer of a schema table, owned by the root scope.
    fn default_buffer(&mut self, table: TableId) -> SymbolId {
        let root = self.index.root_scope();
        if let Some(buffer) = self.index.scopes[root].unnamed_buffer(table) {
            return buffer;
        }
        let name = self.index.tables[table].name.clone();
        let buffer = self.create_symbol(
            root,
            None,
            name,
            SymbolKind::TableBuffer(TableBuffer::new(table, true)),
        );
        self.index.symbols[buffer].state = DefinitionState::Attached;
        self.index.scopes[root].unnamed_buffers.insert(table, buffer);
        buffer
    }

    /// A default schema buffer referred to by a shortened table name.
    fn is_abbreviated_table_name(&self, buffer: SymbolId, name: &str) -> bool {
        let Some(buffer) = self.index.symbols[buffer].as_table_buffer() else {
            return false;
        };
        let table = &self.index.tables[buffer.table];
        let used = name.rsplit('.').next().unwrap_or(name);
        buffer.is_default && table.kind == TableKind::Schema && used.len() < table.name.len()
    }

    // ===== Buffer scopes =====

    /// The buffer scope a reference to `buffer` from the current block binds to: an
    /// existing scope on this block or an enclosing one, otherwise a new reference scope
    /// on the nearest enclosing block that scopes records.
    fn get_buffer_for_reference(&mut self, buffer: SymbolId) -> BufferScopeId {
        let current = self.current_block();
        if let Some(existing) = self.enclosing_buffer_scope(buffer) {
            return existing;
        }
        let target = self
            .index
            .block_chain(current)
            .find(|block| self.index.blocks[*block].scopes_records())
            .expect("every scope's root block scopes records");
        self.add_buffer_scope(target, buffer, BufferScopeStrength::Reference)
    }

    fn weak_buffer_scope(&mut self, buffer: SymbolId) -> BufferScopeId {
        let current = self.current_block();
        let existing = self.index.blocks[current]
            .buffer_scopes
            .iter()
            .copied()
            .find(|scope| self.index.buffer_scopes[*scope].buffer == buffer);
        match existing {
            Some(scope) => scope,
            None => self.add_buffer_scope(current, buffer, BufferScopeStrength::Weak),
        }
    }

    fn enclosing_buffer_scope(&self, buffer: SymbolId) -> Option<BufferScopeId> {
        self.index
            .block_chain(self.current_block())
            .flat_map(|block| self.index.blocks[block].buffer_scopes.iter().copied())
            .find(|scope| self.index.buffer_scopes[*scope].buffer == buffer)
    }

    // ===== Fields =====

    /// Resolve a `Field` node to a variable, widget, event or field buffer.
    pub(super) fn field_reference(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let qualifier = self.take_qualifier(node);
        let resolution = self.take_hint(node);

        // `INPUT name` reads the frame's screen value, not the field itself
        if self.tree.has_keyword(node, Keyword::Input) {
            return self.visit_children(node);
        }

        if self.tree.node(node).flags.contains(NodeFlags::INLINE_VAR_DEF) {
            self.define_inline_variable(node);
        }

        let name = SmolStr::new(self.tree.text(node));
        let wants_buffer_scope = qualifier != ContextQualifier::Symbol;
        let found = match resolution {
            TableNameResolution::Any => self.lookup_field(&name, wants_buffer_scope),
            TableNameResolution::Last | TableNameResolution::Previous => {
                let buffer = match resolution {
                    TableNameResolution::Last => self.last_table_referenced,
                    _ => self.prev_table_referenced,
                };
                match buffer {
                    Some(buffer) => match self.field_of_buffer(buffer, &name) {
                        Some(found) => Some(found),
                        None => {
                            self.missing_table_field(node, buffer, &name);
                            return self.visit_children(node);
                        }
                    },
                    None => self.lookup_field(&name, wants_buffer_scope),
                }
            }
        };

        match found {
            Some(found) => self.annotate_field(node, found, qualifier),
            None => {
                tracing::debug!(%name, line = self.tree.token(node).line, "unresolved field");
                self.index.unresolved.push(UnresolvedReference {
                    node,
                    name,
                    scope: self.current_scope(),
                });
            }
        }
        self.visit_children(node)
    }

    /// A name the hinted table does not have. Field lists of FIELDS, EXCEPT and USING
    /// phrases may name fields that do not exist; those are dropped without a warning.
    fn missing_table_field(&mut self, node: NodeId, buffer: SymbolId, name: &SmolStr) {
        let tolerant = self.tree.parent(node).is_some_and(|parent| {
            matches!(
                self.tree.kind(parent),
                NodeKind::FieldsPhrase | NodeKind::ExceptPhrase | NodeKind::UsingPhrase
            )
        });
        let table = self.index.symbols[buffer].name.clone();
        if tolerant {
            tracing::debug!(field = %name, %table, "field list names an unknown field, skipped");
            return;
        }
        tracing::warn!(field = %name, %table, "field not found in table");
        self.report(Diagnostic::unresolved_field(name, &table, self.location(node)));
        self.index.unresolved.push(UnresolvedReference {
            node,
            name: name.clone(),
            scope: self.current_scope(),
        });
    }

    /// `name` as a field of one specific buffer; a `table.` prefix is ignored.
    fn field_of_buffer(&mut self, buffer: SymbolId, name: &str) -> Option<FieldLookup> {
        let field_name = name.rsplit('.').next().unwrap_or(name);
        let table = self.index.buffer_table(buffer)?;
        let found = self.index.lookup_table_field(table, field_name)?;
        Some(FieldLookup {
            symbol: self.field_buffer(buffer, found.field),
            buffer_scope: None,
            unqualified: !name.contains('.'),
            abbreviated: found.abbreviated,
        })
    }

    /// Look a field name up from the current scope and block.
    ///
    /// A qualified name (`buffer.field`, `db.table.field`) is split at its last dot and
    /// resolved on the named buffer. An unqualified name is tried, in order, as a
    /// variable, a field-level widget, an event, a field of a buffer scoped to an
    /// enclosing block, and a field of any buffer visible from the current scope.
    fn lookup_field(&mut self, name: &str, wants_buffer_scope: bool) -> Option<FieldLookup> {
        if let Some((table_name, field_name)) = name.rsplit_once('.') {
            let buffer = self.find_buffer(table_name, RecordLookup::Buffer)?;
            let table = self.index.buffer_table(buffer)?;
            let found = self.index.lookup_table_field(table, field_name)?;
            let buffer_scope = wants_buffer_scope.then(|| self.get_buffer_for_reference(buffer));
            return Some(FieldLookup {
                symbol: self.field_buffer(buffer, found.field),
                buffer_scope,
                unqualified: false,
                abbreviated: found.abbreviated || self.is_abbreviated_table_name(buffer, table_name),
            });
        }

        let scope = self.current_scope();
        if let Some(variable) = self.index.resolve_variable(scope, name) {
            return Some(FieldLookup::plain(variable));
        }
        if let Some(widget) = FIELD_LEVEL_WIDGETS
            .iter()
            .find_map(|kind| self.index.resolve(scope, Namespace::Widget(*kind), name))
        {
            return Some(FieldLookup::plain(widget));
        }
        if let Some(event) = self.index.resolve(scope, Namespace::Event, name) {
            return Some(FieldLookup::plain(event));
        }

        // Buffers scoped to the enclosing blocks, innermost first
        let scoped = self
            .index
            .block_chain(self.current_block())
            .flat_map(|block| self.index.blocks[block].buffer_scopes.iter().copied())
            .find_map(|scope| {
                let buffer = self.index.buffer_scopes[scope].buffer;
                let table = self.index.buffer_table(buffer)?;
                self.index
                    .lookup_table_field(table, name)
                    .map(|found| (buffer, found, Some(scope)))
            });

        // Then every buffer visible from the scope chain
        let (buffer, found, buffer_scope) = match scoped {
            Some(found) => found,
            None => {
                let (buffer, found) = self.visible_buffers(scope).into_iter().find_map(|buffer| {
                    let table = self.index.buffer_table(buffer)?;
                    self.index
                        .lookup_table_field(table, name)
                        .map(|found| (buffer, found))
                })?;
                let buffer_scope = wants_buffer_scope.then(|| self.get_buffer_for_reference(buffer));
                (buffer, found, buffer_scope)
            }
        };

        Some(FieldLookup {
            symbol: self.field_buffer(buffer, found.field),
            buffer_scope: if wants_buffer_scope { buffer_scope } else { None },
            unqualified: true,
            abbreviated: found.abbreviated,
        })
    }

    /// Buffers reachable from `scope`: named buffers and table defaults of each scope,
    /// innermost scope first.
    fn visible_buffers(&self, scope: ScopeId) -> Vec<SymbolId> {
        self.index
            .scope_chain(scope)
            .flat_map(|scope| {
                let scope = &self.index.scopes[scope];
                scope
                    .names
                    .in_namespace(Namespace::Buffer)
                    .chain(scope.names.in_namespace(Namespace::Table))
                    .map(|entry| entry.symbol)
                    .chain(scope.unnamed_buffers.values().copied())
            })
            .collect()
    }

    fn annotate_field(&mut self, node: NodeId, found: FieldLookup, qualifier: ContextQualifier) {
        let store_type = match &self.index.symbols[found.symbol].kind {
            SymbolKind::Variable(_)
            | SymbolKind::Widget(_)
            | SymbolKind::Browse(_)
            | SymbolKind::Event(_) => Some(StoreType::Variable),
            SymbolKind::FieldBuffer(field_buffer) => self
                .index
                .buffer_table(field_buffer.buffer)
                .map(|table| self.index.tables[table].kind.into()),
            _ => None,
        };

        let attrs = self.tree.attrs_mut(node);
        attrs.symbol = Some(found.symbol);
        attrs.qualifier = Some(qualifier);
        attrs.store_type = store_type;
        attrs.buffer_scope = found.buffer_scope;
        if found.unqualified && store_type.is_some_and(|store| store != StoreType::Variable) {
            attrs.flags |= AttributeFlags::UNQUALIFIED_FIELD;
        }
        if found.abbreviated {
            attrs.flags |= AttributeFlags::ABBREVIATED;
        }

        self.note_reference(found.symbol, qualifier);
        if let Some(field_buffer) = self.index.symbols[found.symbol].as_field_buffer().copied() {
            self.note_reference(field_buffer.buffer, qualifier);
        }
    }

    /// The field buffer through which `buffer` reaches `field`, created on first use.
    pub(super) fn field_buffer(&mut self, buffer: SymbolId, field: FieldId) -> SymbolId {
        let table_buffer = self.index.symbols[buffer]
            .as_table_buffer()
            .expect("field buffers hang off table buffers");
        if let Some(existing) = table_buffer.field_buffer(field) {
            return existing;
        }

        let scope = self.index.symbols[buffer].scope;
        let name = self.index.fields[field].name.clone();
        let symbol = self.create_symbol(
            scope,
            None,
            name,
            SymbolKind::FieldBuffer(FieldBuffer { buffer, field }),
        );
        self.index.symbols[symbol].state = DefinitionState::Attached;
        if let SymbolKind::TableBuffer(table_buffer) = &mut self.index.symbols[buffer].kind {
            table_buffer.field_buffers.insert(field, symbol);
        }
        symbol
    }

    /// A field reference flagged by the parser as also defining a variable of its name.
    fn define_inline_variable(&mut self, node: NodeId) {
        let name = SmolStr::new(self.tree.text(node));
        let variable = self.define_symbol(node, name, SymbolKind::Variable(Variable::default()));
        self.end_definition(variable);
        self.attach(variable);
    }
}
