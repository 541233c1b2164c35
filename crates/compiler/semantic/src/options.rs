use serde::Deserialize;

/// Knobs for a tree-parser run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TreeParserOptions {
    /// Emit a trace event for every node dispatched
    pub trace_rules: bool,
    /// Record the nodes whose context qualifier fell back to REF because no producer set one
    pub record_defaulted_qualifiers: bool,
}
