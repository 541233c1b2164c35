//! # Semantic Index Builder
//!
//! Walks a parse tree depth-first and builds the [`SemanticIndex`] while annotating the
//! tree in place.
//!
//! The builder keeps three stacks:
//! - the scope stack, whose top is the scope new names are attached to,
//! - the block stack, whose top is the block buffer scopes are resolved against,
//! - the symbol stack, whose top is the symbol the clauses of the current definition
//!   (AS, LIKE, EXTENT, ...) apply to.
//!
//! Context qualifiers and table-name hints flow from a construct to its sub-nodes through
//! two side tables. A producer writes the entry before the child is visited, and the
//! child takes (removes) it when it is visited. A consumer with no entry defaults to REF.
//!
//! Handlers are split by concern:
//! - `routines`: procedures, functions (with FORWARD handling), methods, triggers.
//! - `definitions`: variables, parameters, properties, events, browses, widgets.
//! - `tables`: temp-table and buffer definitions, including index copying.
//! - `resolve`: record and field resolution.
//! - `statements`: the qualifier producers of ordinary statements and phrases.

use abl_compiler_diagnostics::{Diagnostic, Location};
use abl_compiler_syntax::{
    AttributeFlags, BlockId, BufferScopeId, ContextQualifier, NodeId, NodeKind, ParseTree,
    ScopeId, SymbolId,
};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::block::{Block, BlockKind, BufferScope, BufferScopeStrength};
use crate::options::TreeParserOptions;
use crate::qualifier::{QualifierMap, ResolutionHints, TableNameResolution};
use crate::schema::SchemaLookup;
use crate::scope::{Namespace, Scope, ScopeKind};
use crate::semantic_errors::SemanticError;
use crate::semantic_index::SemanticIndex;
use crate::symbol::{DefinitionState, Routine, RoutineKind, Symbol, SymbolKind};
use crate::type_info::TypeInfoLookup;

mod definitions;
mod resolve;
mod routines;
mod statements;
mod tables;

use tables::TableDefinition;

type Children = SmallVec<[NodeId; 8]>;

pub(crate) struct SemanticIndexBuilder<'a> {
    tree: &'a mut ParseTree,
    schema: &'a dyn SchemaLookup,
    types: &'a dyn TypeInfoLookup,
    options: &'a TreeParserOptions,

    index: SemanticIndex,
    /// Active scopes; the top is where new names are attached
    scope_stack: Vec<ScopeId>,
    /// Active blocks; the top is the innermost control block
    block_stack: Vec<BlockId>,
    /// Symbols being defined; the top receives the clauses of its defining statement
    symbol_stack: Vec<SymbolId>,

    qualifiers: QualifierMap,
    hints: ResolutionHints,

    /// FUNCTION ... FORWARD declarations still waiting for their body, by lowercased name
    forward_functions: FxHashMap<SmolStr, SymbolId>,
    /// The temp-table or work-table being defined
    table_definition: Option<TableDefinition>,
    /// Set while inside DEFINE EVENT: parameters go to the event's signature
    define_event: Option<SymbolId>,
    last_table_referenced: Option<SymbolId>,
    prev_table_referenced: Option<SymbolId>,
}

impl<'a> SemanticIndexBuilder<'a> {
    pub(crate) fn new(
        tree: &'a mut ParseTree,
        schema: &'a dyn SchemaLookup,
        types: &'a dyn TypeInfoLookup,
        options: &'a TreeParserOptions,
    ) -> Self {
        let mut index = SemanticIndex::new();
        let root = tree.root();

        let root_scope = index
            .scopes
            .push(Scope::new(None, ScopeKind::Program, Some(root)));
        let root_block = index.blocks.push(Block::new(
            None,
            root_scope,
            BlockKind::Root,
            Some(root),
        ));
        index.scopes[root_scope].set_root_block(root_block);

        // The compilation unit itself is a routine; it is reachable from the root scope
        // but never by name.
        let mut program = Symbol::new(
            tree.file_name(0).unwrap_or_default(),
            root_scope,
            Some(root),
            SymbolKind::Routine(Routine::new(RoutineKind::Program, root_scope)),
        );
        program.state = DefinitionState::Attached;
        let program = index.symbols.push(program);
        index.scopes[root_scope].routine = Some(program);

        let attrs = tree.attrs_mut(root);
        attrs.scope = Some(root_scope);
        attrs.block = Some(root_block);
        attrs.symbol = Some(program);

        Self {
            tree,
            schema,
            types,
            options,
            index,
            scope_stack: vec![root_scope],
            block_stack: vec![root_block],
            symbol_stack: Vec::new(),
            qualifiers: QualifierMap::default(),
            hints: ResolutionHints::default(),
            forward_functions: FxHashMap::default(),
            table_definition: None,
            define_event: None,
            last_table_referenced: None,
            prev_table_referenced: None,
        }
    }

    pub(crate) fn build(mut self) -> Result<SemanticIndex, SemanticError> {
        let root = self.tree.root();
        self.visit_children(root)?;

        debug_assert_eq!(self.scope_stack.len(), 1, "scope stack not unwound");
        debug_assert_eq!(self.block_stack.len(), 1, "block stack not unwound");
        debug_assert!(self.symbol_stack.is_empty(), "definition left open");
        debug_assert!(
            self.qualifiers.is_empty(),
            "context qualifier assigned to a node that was never visited"
        );

        if !self.forward_functions.is_empty() {
            tracing::debug!(
                count = self.forward_functions.len(),
                "forward-declared functions without a body in this unit"
            );
        }
        Ok(self.index)
    }

    // ===== Tree walk =====

    fn visit(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let kind = self.tree.kind(node);
        if self.options.trace_rules {
            tracing::trace!(?kind, text = self.tree.text(node), line = self.tree.token(node).line, "visit");
        }

        match kind {
            NodeKind::Program | NodeKind::Statement => self.visit_children(node),
            NodeKind::ClassStatement => self.class_statement(node, ScopeKind::Class),
            NodeKind::InterfaceStatement => self.class_statement(node, ScopeKind::Interface),

            NodeKind::DoBlock => self.control_block(node, BlockKind::Do),
            NodeKind::RepeatBlock => self.control_block(node, BlockKind::Repeat),
            NodeKind::ForBlock => self.for_block(node),
            NodeKind::BlockFor => self.block_for(node),
            NodeKind::BlockIterator => {
                self.visit_operands(node, ContextQualifier::RefUp, ContextQualifier::Ref)
            }
            NodeKind::BlockWhile => self.visit_qualified_children(node, ContextQualifier::Ref),
            NodeKind::BlockPreselect => self.visit_children_qualifying(
                node,
                NodeKind::RecordPhrase,
                ContextQualifier::InitWeak,
            ),

            NodeKind::ProcedureStatement => self.procedure(node),
            NodeKind::FunctionStatement => self.function(node),
            NodeKind::MethodStatement => self.method(node),
            NodeKind::ConstructorStatement => {
                self.unnamed_routine(node, RoutineKind::Constructor, ScopeKind::Constructor)
            }
            NodeKind::DestructorStatement => {
                self.unnamed_routine(node, RoutineKind::Destructor, ScopeKind::Destructor)
            }
            NodeKind::PropertyAccessor => self.unnamed_routine(
                node,
                RoutineKind::PropertyAccessor,
                ScopeKind::PropertyAccessor,
            ),
            NodeKind::OnStatement => self.on_statement(node),
            NodeKind::CatchBlock => self.catch_block(node),

            NodeKind::DefineVariable => self.define_variable(node),
            NodeKind::DefineParameter | NodeKind::FunctionParameter => self.parameter(node),
            NodeKind::DefineProperty => self.define_property(node),
            NodeKind::DefineTempTable => self.define_temp_table(node, crate::table::TableKind::TempTable),
            NodeKind::DefineWorkTable => self.define_temp_table(node, crate::table::TableKind::WorkTable),
            NodeKind::DefineBuffer => self.define_buffer(node),
            NodeKind::DefineEvent => self.define_event(node),
            NodeKind::DefineBrowse => self.define_browse(node),
            NodeKind::DefineWidget(widget) => self.define_widget(node, widget),
            NodeKind::BufferParameter => self.buffer_parameter(node),
            NodeKind::TableParameter => self.table_parameter(node),
            NodeKind::AsClause => self.as_clause(node),
            NodeKind::LikeClause => self.like_clause(node),
            NodeKind::ExtentClause => self.extent_clause(node),
            NodeKind::ReturnsClause => self.returns_clause(node),
            NodeKind::TableLike => self.table_like(node),
            NodeKind::TableUseIndex => self.table_use_index(node),
            NodeKind::TableField => self.table_field(node),
            NodeKind::TableIndex => self.table_index(node),
            // Index fields are resolved when the table definition closes
            NodeKind::IndexField => Ok(()),
            NodeKind::BrowseDisplay => self.visit_qualified_children(node, ContextQualifier::Symbol),
            NodeKind::BrowseEnable => self.visit_qualified_children(node, ContextQualifier::Symbol),
            NodeKind::DataRelation | NodeKind::ParentIdRelation | NodeKind::SourceBufferPhrase => {
                self.visit_children_qualifying(node, NodeKind::Record, ContextQualifier::Init)
            }
            NodeKind::RelationFields => self.relation_fields(node),
            NodeKind::KeyFields => self.phrase_fields(node, ContextQualifier::Symbol),
            NodeKind::AggregatePhrase => self.visit_children(node),
            NodeKind::AggregateOption => self.aggregate_option(node),

            NodeKind::AssignStatement => {
                self.visit_children_qualifying(node, NodeKind::Record, ContextQualifier::Updating)
            }
            NodeKind::AssignEqual => {
                self.visit_operands(node, ContextQualifier::Updating, ContextQualifier::Ref)
            }
            NodeKind::BufferCompare => {
                self.visit_operands(node, ContextQualifier::Ref, ContextQualifier::Ref)
            }
            NodeKind::BufferCopy => {
                self.visit_operands(node, ContextQualifier::Ref, ContextQualifier::Updating)
            }
            NodeKind::CreateStatement | NodeKind::DeleteStatement => {
                self.visit_children_qualifying(node, NodeKind::Record, ContextQualifier::Updating)
            }
            NodeKind::ReleaseStatement | NodeKind::ValidateStatement => {
                self.visit_children_qualifying(node, NodeKind::Record, ContextQualifier::Ref)
            }
            NodeKind::DisplayStatement => self.visit_qualified_children(node, ContextQualifier::Ref),
            NodeKind::FormStatement | NodeKind::EnableStatement | NodeKind::PromptForStatement => {
                self.visit_qualified_children(node, ContextQualifier::Symbol)
            }
            NodeKind::SetStatement | NodeKind::UpdateStatement => {
                self.visit_qualified_children(node, ContextQualifier::RefUp)
            }
            NodeKind::FindStatement | NodeKind::OpenQuery => {
                self.visit_children_qualifying(node, NodeKind::RecordPhrase, ContextQualifier::Init)
            }
            NodeKind::RawTransfer => {
                self.visit_operands(node, ContextQualifier::Ref, ContextQualifier::Updating)
            }
            NodeKind::MessageStatement | NodeKind::RunStatement => self.visit_children(node),
            NodeKind::MessageOption => self.message_option(node),
            NodeKind::SystemDialog => self.visit_qualified_children(node, ContextQualifier::RefUp),
            NodeKind::RunParameter => self.run_parameter(node),
            NodeKind::RunSet => self.visit_qualified_children(node, ContextQualifier::Updating),
            NodeKind::ParameterTable => self.visit_children_qualifying(
                node,
                NodeKind::Record,
                ContextQualifier::TempTableSymbol,
            ),
            NodeKind::ParameterTableHandle | NodeKind::ParameterDatasetHandle => {
                self.parameter_handle(node)
            }
            NodeKind::ParameterBuffer => {
                self.visit_children_qualifying(node, NodeKind::Record, ContextQualifier::Init)
            }

            NodeKind::RecordPhrase => self.record_phrase(node),
            NodeKind::FieldsPhrase | NodeKind::ExceptPhrase => {
                self.phrase_fields(node, ContextQualifier::Symbol)
            }
            NodeKind::UsingPhrase => self.using_phrase(node),
            NodeKind::FormItem | NodeKind::Expression => self.propagate_qualifier(node),

            NodeKind::MemoryManagementFunction => self.memory_management_function(node),
            NodeKind::RecordFunction => {
                self.visit_children_qualifying(node, NodeKind::Record, ContextQualifier::Ref)
            }
            NodeKind::WidgetAttribute => self.widget_attribute(node),
            NodeKind::WidgetName => self.widget_name(node),
            NodeKind::Field => self.field_reference(node),
            NodeKind::Record => self.record_reference(node).map(|_| ()),

            NodeKind::Identifier
            | NodeKind::TypeName
            | NodeKind::Literal
            | NodeKind::Datatype(_)
            | NodeKind::Keyword(_) => Ok(()),
        }
    }

    fn children(&self, node: NodeId) -> Children {
        self.tree.children(node).iter().copied().collect()
    }

    fn visit_children(&mut self, node: NodeId) -> Result<(), SemanticError> {
        for child in self.children(node) {
            self.visit(child)?;
        }
        Ok(())
    }

    /// Visit the children of `node`, giving every qualifier consumer among them `qualifier`.
    fn visit_qualified_children(
        &mut self,
        node: NodeId,
        qualifier: ContextQualifier,
    ) -> Result<(), SemanticError> {
        for child in self.children(node) {
            self.qualify(child, qualifier);
            self.visit(child)?;
        }
        Ok(())
    }

    /// Visit the children of `node`, giving only those of `kind` `qualifier`.
    fn visit_children_qualifying(
        &mut self,
        node: NodeId,
        kind: NodeKind,
        qualifier: ContextQualifier,
    ) -> Result<(), SemanticError> {
        for child in self.children(node) {
            if self.tree.kind(child) == kind {
                self.qualify(child, qualifier);
            }
            self.visit(child)?;
        }
        Ok(())
    }

    /// Visit the children of `node`: the first qualifier consumer gets `first`, the
    /// remaining ones get `rest`.
    fn visit_operands(
        &mut self,
        node: NodeId,
        first: ContextQualifier,
        rest: ContextQualifier,
    ) -> Result<(), SemanticError> {
        let mut seen_first = false;
        for child in self.children(node) {
            if self.tree.kind(child).consumes_qualifier() {
                self.qualify(child, if seen_first { rest } else { first });
                seen_first = true;
            }
            self.visit(child)?;
        }
        Ok(())
    }

    // ===== Qualifiers =====

    /// Assign `qualifier` to `node` if the node reads one.
    fn qualify(&mut self, node: NodeId, qualifier: ContextQualifier) {
        if self.tree.kind(node).consumes_qualifier() {
            self.qualifiers.set(node, qualifier);
        }
    }

    fn hint(&mut self, node: NodeId, resolution: TableNameResolution) {
        self.hints.set(node, resolution);
    }

    /// The qualifier assigned to `node`, REF when no producer assigned one.
    fn take_qualifier(&mut self, node: NodeId) -> ContextQualifier {
        match self.qualifiers.take(node) {
            Some(qualifier) => qualifier,
            None => {
                if self.options.record_defaulted_qualifiers {
                    self.index.defaulted_qualifiers.push(node);
                }
                ContextQualifier::Ref
            }
        }
    }

    fn take_hint(&mut self, node: NodeId) -> TableNameResolution {
        self.hints.take(node).unwrap_or_default()
    }

    // ===== Scopes and blocks =====

    fn current_scope(&self) -> ScopeId {
        *self
            .scope_stack
            .last()
            .expect("SemanticIndexBuilder should have created a root scope")
    }

    fn current_block(&self) -> BlockId {
        *self
            .block_stack
            .last()
            .expect("SemanticIndexBuilder should have created a root block")
    }

    /// The routine whose body is being visited: the nearest enclosing scope that belongs
    /// to a routine. Triggers and CATCH blocks share the routine of their parent.
    fn current_routine(&self) -> SymbolId {
        self.index
            .scope_chain(self.current_scope())
            .find_map(|scope| self.index.scopes[scope].routine)
            .expect("the root scope always has the program routine")
    }

    /// Enter a defining construct: a new child scope of the current one, with its root
    /// block nested in the current block.
    fn push_scope(&mut self, kind: ScopeKind, node: NodeId) -> ScopeId {
        let parent = self.current_scope();
        let parent_block = self.current_block();
        let scope = self
            .index
            .scopes
            .push(Scope::new(Some(parent), kind, Some(node)));
        let block = self.index.blocks.push(Block::new(
            Some(parent_block),
            scope,
            BlockKind::Root,
            Some(node),
        ));
        self.index.scopes[scope].set_root_block(block);
        self.enter_scope(scope, node);
        tracing::trace!(%kind, ?scope, "enter scope");
        scope
    }

    fn enter_scope(&mut self, scope: ScopeId, node: NodeId) {
        let block = self.index.scopes[scope].root_block();
        self.scope_stack.push(scope);
        self.block_stack.push(block);
        let attrs = self.tree.attrs_mut(node);
        attrs.scope = Some(scope);
        attrs.block = Some(block);
    }

    /// Leave a defining construct, restoring the scope and block that were current
    /// before it.
    fn pop_scope(&mut self) {
        let scope = self
            .scope_stack
            .pop()
            .expect("tried to pop from empty scope stack");
        let block = self
            .block_stack
            .pop()
            .expect("tried to pop from empty block stack");
        debug_assert_eq!(
            block,
            self.index.scopes[scope].root_block(),
            "control block left open at the end of a scope"
        );
        debug_assert!(!self.scope_stack.is_empty(), "popped the root scope");
    }

    fn with_scope<F>(&mut self, kind: ScopeKind, node: NodeId, f: F) -> Result<(), SemanticError>
    where
        F: FnOnce(&mut Self, ScopeId) -> Result<(), SemanticError>,
    {
        let scope = self.push_scope(kind, node);
        let result = f(self, scope);
        self.pop_scope();
        result
    }

    /// Re-enter an existing scope for the body of a construct whose declaration created
    /// it (a FUNCTION body after its FORWARD declaration).
    fn with_existing_scope<F>(&mut self, scope: ScopeId, node: NodeId, f: F) -> Result<(), SemanticError>
    where
        F: FnOnce(&mut Self) -> Result<(), SemanticError>,
    {
        self.enter_scope(scope, node);
        tracing::trace!(?scope, "re-enter scope");
        let result = f(self);
        self.pop_scope();
        result
    }

    /// Enter a control block nested in the current one.
    fn push_block(&mut self, kind: BlockKind, node: NodeId) -> BlockId {
        let parent = self.current_block();
        let scope = self.current_scope();
        debug_assert!(
            self.index
                .block_chain(parent)
                .any(|block| block == self.index.scopes[scope].root_block()),
            "current block is outside the current scope"
        );
        let block = self
            .index
            .blocks
            .push(Block::new(Some(parent), scope, kind, Some(node)));
        self.block_stack.push(block);
        self.tree.attrs_mut(node).block = Some(block);
        block
    }

    fn pop_block(&mut self) {
        let block = self
            .block_stack
            .pop()
            .expect("tried to pop from empty block stack");
        debug_assert_ne!(
            self.index.blocks[block].kind,
            BlockKind::Root,
            "scope root block popped as a control block"
        );
    }

    fn with_block<F>(&mut self, kind: BlockKind, node: NodeId, f: F) -> Result<(), SemanticError>
    where
        F: FnOnce(&mut Self) -> Result<(), SemanticError>,
    {
        self.push_block(kind, node);
        let result = f(self);
        self.pop_block();
        result
    }

    fn control_block(&mut self, node: NodeId, kind: BlockKind) -> Result<(), SemanticError> {
        self.with_block(kind, node, |builder| builder.visit_children(node))
    }

    fn for_block(&mut self, node: NodeId) -> Result<(), SemanticError> {
        self.with_block(BlockKind::For, node, |builder| {
            builder.visit_children_qualifying(node, NodeKind::RecordPhrase, ContextQualifier::InitWeak)
        })
    }

    /// `DO FOR buffer`: the buffers named get a strong scope on the block being entered.
    fn block_for(&mut self, node: NodeId) -> Result<(), SemanticError> {
        for child in self.children(node) {
            if self.tree.kind(child) == NodeKind::Record {
                self.qualify(child, ContextQualifier::BufferSymbol);
                let buffer = self.record_reference(child)?;
                let scope = self.add_buffer_scope(
                    self.current_block(),
                    buffer,
                    BufferScopeStrength::Strong,
                );
                self.tree.attrs_mut(child).buffer_scope = Some(scope);
            } else {
                self.visit(child)?;
            }
        }
        Ok(())
    }

    fn add_buffer_scope(
        &mut self,
        block: BlockId,
        buffer: SymbolId,
        strength: BufferScopeStrength,
    ) -> BufferScopeId {
        let id = self.index.buffer_scopes.push(BufferScope {
            block,
            buffer,
            strength,
        });
        self.index.blocks[block].add_buffer_scope(id, strength);
        tracing::trace!(?block, buffer = %self.index.symbols[buffer].name, ?strength, "buffer scope");
        id
    }

    // ===== Symbols =====

    /// Create a symbol owned by `scope`, not yet visible to name lookup.
    fn create_symbol(
        &mut self,
        scope: ScopeId,
        node: Option<NodeId>,
        name: impl Into<SmolStr>,
        kind: SymbolKind,
    ) -> SymbolId {
        let symbol = self.index.symbols.push(Symbol::new(name, scope, node, kind));
        if let Some(node) = node {
            self.tree.attrs_mut(node).symbol = Some(symbol);
        }
        symbol
    }

    /// First phase of a definition: create the symbol in the current scope and make it
    /// the target of the clauses that follow. Lookups cannot see it until it is attached.
    fn define_symbol(&mut self, node: NodeId, name: impl Into<SmolStr>, kind: SymbolKind) -> SymbolId {
        let scope = self.current_scope();
        let symbol = self.create_symbol(scope, Some(node), name, kind);
        self.symbol_stack.push(symbol);
        symbol
    }

    fn end_definition(&mut self, symbol: SymbolId) {
        let top = self.symbol_stack.pop();
        debug_assert_eq!(top, Some(symbol), "definitions closed out of order");
    }

    fn current_symbol(&self) -> Option<SymbolId> {
        self.symbol_stack.last().copied()
    }

    /// Second phase of a definition: make the symbol visible in the scope it was created
    /// in. Symbols without a name stay unreachable by lookup.
    fn attach(&mut self, symbol: SymbolId) {
        let entry = &mut self.index.symbols[symbol];
        entry.state = DefinitionState::Attached;
        if entry.name.is_empty() {
            return;
        }
        let namespace = match &entry.kind {
            SymbolKind::Variable(_) => Namespace::Variable,
            SymbolKind::Routine(_) => Namespace::Routine,
            SymbolKind::TableBuffer(buffer) if buffer.is_default => Namespace::Table,
            SymbolKind::TableBuffer(_) => Namespace::Buffer,
            SymbolKind::Event(_) => Namespace::Event,
            SymbolKind::Browse(_) => Namespace::Widget(abl_compiler_syntax::WidgetKind::Browse),
            SymbolKind::Widget(kind) => Namespace::Widget(*kind),
            SymbolKind::FieldBuffer(_) => unreachable!("field buffers are reached through their buffer"),
        };
        let (name, scope) = (entry.name.clone(), entry.scope);
        if let Some(previous) = self.index.scopes[scope].names.insert(namespace, name, symbol) {
            tracing::debug!(
                name = %self.index.symbols[symbol].name,
                ?previous,
                "definition replaces an earlier one in the same scope"
            );
        }
    }

    fn note_reference(&mut self, symbol: SymbolId, qualifier: ContextQualifier) {
        self.index.symbols[symbol].note_reference(qualifier);
    }

    // ===== Annotations and reporting =====

    fn annotate_flags(&mut self, node: NodeId, flags: AttributeFlags) {
        self.tree.attrs_mut(node).flags |= flags;
    }

    fn location(&self, node: NodeId) -> Location {
        self.tree.token(node).location()
    }

    fn file_name(&self, node: NodeId) -> SmolStr {
        let file = self.tree.token(node).file_index;
        SmolStr::new(self.tree.file_name(file).unwrap_or("<unknown>"))
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        self.index.diagnostics.add(diagnostic);
    }
}
