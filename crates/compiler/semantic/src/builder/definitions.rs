//! DEFINE statements for variables, parameters, properties, events, browses and widgets,
//! and the clauses that shape the symbol being defined.

use abl_compiler_diagnostics::Diagnostic;
use abl_compiler_syntax::{
    ContextQualifier, DataType, Keyword, NodeId, NodeKind, SymbolId, WidgetKind,
};
use smol_str::SmolStr;

use super::SemanticIndexBuilder;
use crate::semantic_errors::SemanticError;
use crate::symbol::{Browse, Event, Extent, Parameter, ParameterMode, SymbolKind, Variable};

impl SemanticIndexBuilder<'_> {
    fn definition_name(&self, node: NodeId) -> SmolStr {
        SmolStr::new(self.tree.identifier(node).unwrap_or_default())
    }

    /// Define a symbol, visit the clauses of its statement with the symbol current, and
    /// close the definition. Attaching is left to the caller.
    fn with_definition(
        &mut self,
        node: NodeId,
        kind: SymbolKind,
    ) -> Result<SymbolId, SemanticError> {
        let name = self.definition_name(node);
        let symbol = self.define_symbol(node, name, kind);
        let result = self.visit_children(node);
        self.end_definition(symbol);
        result.map(|()| symbol)
    }

    pub(super) fn define_variable(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let variable = self.with_definition(node, SymbolKind::Variable(Variable::default()))?;
        self.attach(variable);
        Ok(())
    }

    /// DEFINE PARAMETER and the parameters of a FUNCTION or METHOD header.
    pub(super) fn parameter(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let mode = self.parameter_mode(node);
        let variable = self.with_definition(
            node,
            SymbolKind::Variable(Variable {
                is_parameter: true,
                ..Variable::default()
            }),
        )?;
        self.add_parameter(variable, mode, true);
        Ok(())
    }

    pub(super) fn parameter_mode(&self, node: NodeId) -> ParameterMode {
        if self.tree.has_keyword(node, Keyword::InputOutput) {
            ParameterMode::InputOutput
        } else if self.tree.has_keyword(node, Keyword::Output) {
            ParameterMode::Output
        } else if self.tree.has_keyword(node, Keyword::Return) {
            ParameterMode::Return
        } else if self.tree.has_keyword(node, Keyword::Buffer) {
            ParameterMode::Buffer
        } else {
            ParameterMode::Input
        }
    }

    /// Add a parameter to the routine being defined, or to the event signature while
    /// inside DEFINE EVENT. Event parameters are never visible by name.
    pub(super) fn add_parameter(&mut self, symbol: SymbolId, mode: ParameterMode, attach: bool) {
        if let Some(event) = self.define_event {
            if let SymbolKind::Event(event) = &mut self.index.symbols[event].kind {
                event.parameters.push(symbol);
            }
            return;
        }
        if attach {
            self.attach(symbol);
        }
        let routine = self.current_routine();
        if let SymbolKind::Routine(routine) = &mut self.index.symbols[routine].kind {
            routine.parameters.push(Parameter { symbol, mode });
        }
    }

    /// DEFINE PROPERTY: the property is attached before its accessors are visited so that
    /// their bodies can refer to it.
    pub(super) fn define_property(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let name = self.definition_name(node);
        let property = self.define_symbol(
            node,
            name,
            SymbolKind::Variable(Variable {
                is_property: true,
                ..Variable::default()
            }),
        );
        let mut open = true;
        for child in self.children(node) {
            if open && self.tree.kind(child) == NodeKind::PropertyAccessor {
                self.end_definition(property);
                self.attach(property);
                open = false;
            }
            if let Err(error) = self.visit(child) {
                if open {
                    self.end_definition(property);
                }
                return Err(error);
            }
        }
        if open {
            self.end_definition(property);
            self.attach(property);
        }
        Ok(())
    }

    // ===== Clauses =====

    fn set_data_type(&mut self, symbol: SymbolId, data_type: DataType, class_name: Option<SmolStr>) {
        match &mut self.index.symbols[symbol].kind {
            SymbolKind::Variable(variable) => {
                variable.data_type = Some(data_type);
                variable.class_name = class_name;
            }
            SymbolKind::FieldBuffer(field_buffer) => {
                let field = &mut self.index.fields[field_buffer.field];
                field.data_type = Some(data_type);
                field.class_name = class_name;
            }
            _ => {}
        }
    }

    fn set_extent(&mut self, symbol: SymbolId, extent: Extent) {
        match &mut self.index.symbols[symbol].kind {
            SymbolKind::Variable(variable) => variable.extent = extent,
            SymbolKind::FieldBuffer(field_buffer) => {
                self.index.fields[field_buffer.field].extent = extent;
            }
            _ => {}
        }
    }

    /// Data type of an `AS` or `RETURNS` clause: a built-in type keyword, or a class name.
    fn clause_type(&self, node: NodeId) -> Option<(DataType, Option<SmolStr>)> {
        self.tree.children(node).iter().find_map(|child| match self.tree.kind(*child) {
            NodeKind::Datatype(data_type) => Some((data_type, None)),
            NodeKind::TypeName => Some((
                DataType::Class,
                Some(SmolStr::new(self.tree.text(*child))),
            )),
            _ => None,
        })
    }

    pub(super) fn as_clause(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let symbol = self
            .current_symbol()
            .expect("AS clause outside of a definition");
        if let Some((data_type, class_name)) = self.clause_type(node) {
            self.set_data_type(symbol, data_type, class_name);
        }
        Ok(())
    }

    pub(super) fn returns_clause(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let Some((data_type, class_name)) = self.clause_type(node) else {
            return Ok(());
        };
        let routine = self.current_routine();
        if let SymbolKind::Routine(routine) = &mut self.index.symbols[routine].kind {
            routine.return_type = Some(data_type);
            routine.return_class = class_name;
        }
        Ok(())
    }

    /// `LIKE field`: copy type and extent from the field or variable named. The symbol
    /// being defined is still pending, so `DEFINE VARIABLE x LIKE x` finds an outer `x`.
    pub(super) fn like_clause(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let target = self
            .current_symbol()
            .expect("LIKE clause outside of a definition");
        let Some(source) = self.tree.child_of_kind(node, NodeKind::Field) else {
            return self.visit_children(node);
        };
        self.qualify(source, ContextQualifier::Symbol);
        self.visit(source)?;

        match self.tree.attrs(source).symbol {
            Some(symbol) => {
                if let Some(data_type) = self.index.data_type(symbol) {
                    let class_name = self.index.class_name(symbol).map(SmolStr::new);
                    self.set_data_type(target, data_type, class_name);
                }
                let extent = self.index.extent(symbol);
                self.set_extent(target, extent);
            }
            None => {
                let name = self.tree.text(source).to_owned();
                tracing::warn!(%name, "LIKE source not found, type left unset");
                self.report(Diagnostic::unresolved_like_source(&name, self.location(source)));
            }
        }
        Ok(())
    }

    pub(super) fn extent_clause(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let symbol = self
            .current_symbol()
            .expect("EXTENT clause outside of a definition");
        let extent = self
            .tree
            .child_of_kind(node, NodeKind::Literal)
            .and_then(|literal| self.tree.text(literal).parse::<u32>().ok())
            .map_or(Extent::Indeterminate, Extent::Fixed);
        self.set_extent(symbol, extent);
        self.visit_children(node)
    }

    // ===== Events, browses and widgets =====

    /// DEFINE EVENT: the parameters of its signature belong to the event.
    pub(super) fn define_event(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let name = self.definition_name(node);
        let event = self.define_symbol(node, name, SymbolKind::Event(Event::default()));
        let outer = self.define_event.replace(event);
        let result = self.visit_children(node);
        self.define_event = outer;
        self.end_definition(event);
        result?;
        self.attach(event);
        Ok(())
    }

    pub(super) fn define_browse(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let name = self.definition_name(node);
        let query = self
            .tree
            .children_of_kind(node, NodeKind::Identifier)
            .nth(1)
            .map(|query| SmolStr::new(self.tree.text(query)));
        let browse = self.define_symbol(
            node,
            name,
            SymbolKind::Browse(Browse {
                query,
                columns: Vec::new(),
            }),
        );
        let result = self.visit_children(node);
        self.end_definition(browse);
        result?;

        let columns = self
            .tree
            .children_of_kind(node, NodeKind::BrowseDisplay)
            .flat_map(|display| self.tree.children(display).iter().copied())
            .filter_map(|item| match self.tree.kind(item) {
                NodeKind::Field => Some(item),
                NodeKind::FormItem => self.tree.child_of_kind(item, NodeKind::Field),
                _ => None,
            })
            .filter_map(|field| self.tree.attrs(field).symbol)
            .collect();
        if let SymbolKind::Browse(browse) = &mut self.index.symbols[browse].kind {
            browse.columns = columns;
        }
        self.attach(browse);
        Ok(())
    }

    /// DEFINE BUTTON, FRAME, QUERY, ... Queries and datasets scope the records they name;
    /// frames only look their items up.
    pub(super) fn define_widget(&mut self, node: NodeId, kind: WidgetKind) -> Result<(), SemanticError> {
        let name = self.definition_name(node);
        let widget = self.define_symbol(node, name, SymbolKind::Widget(kind));
        let qualifier = match kind {
            WidgetKind::Query | WidgetKind::Dataset => Some(ContextQualifier::Init),
            WidgetKind::Frame => Some(ContextQualifier::Symbol),
            _ => None,
        };
        let result = match qualifier {
            Some(qualifier) => self.visit_qualified_children(node, qualifier),
            None => self.visit_children(node),
        };
        self.end_definition(widget);
        result?;
        self.attach(widget);
        Ok(())
    }

    /// An accumulator of an aggregate phrase: an anonymous DECIMAL that lookups never see.
    pub(super) fn aggregate_option(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let scope = self.current_scope();
        let accumulator = self.create_symbol(
            scope,
            Some(node),
            SmolStr::default(),
            SymbolKind::Variable(Variable {
                data_type: Some(DataType::Decimal),
                ..Variable::default()
            }),
        );
        self.attach(accumulator);
        self.visit_children(node)
    }
}
