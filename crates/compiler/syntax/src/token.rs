//! Tokens and their provenance.

use abl_compiler_diagnostics::Location;
use smol_str::SmolStr;

/// The primary token of a parse-tree node.
///
/// Positions are 1-based. A token produced by preprocessor expansion keeps the position
/// of the expansion site and is flagged with `macro_expansion`; `macro_source` numbers the
/// preprocessor source it came from (0 is the main source).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProToken {
    pub text: SmolStr,
    pub file_index: u32,
    pub line: u32,
    pub column: u32,
    pub end_file_index: u32,
    pub end_line: u32,
    pub end_column: u32,
    pub macro_source: u32,
    pub macro_expansion: bool,
    /// Set when the token was inserted by the parser rather than read by the lexer
    pub synthetic: bool,
    /// Attribute string of the enclosing `&ANALYZE-SUSPEND` section, if any
    pub analyze_suspend: Option<SmolStr>,
}

impl ProToken {
    pub fn new(text: impl Into<SmolStr>, file_index: u32, line: u32, column: u32) -> Self {
        let text = text.into();
        let width = text.chars().count() as u32;
        Self {
            text,
            file_index,
            line,
            column,
            end_file_index: file_index,
            end_line: line,
            end_column: column + width.saturating_sub(1),
            ..Self::default()
        }
    }

    /// A parser-generated token without a source position of its own.
    pub fn synthetic(text: impl Into<SmolStr>) -> Self {
        Self {
            text: text.into(),
            synthetic: true,
            ..Self::default()
        }
    }

    pub const fn is_natural(&self) -> bool {
        !self.synthetic
    }

    pub const fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    pub fn location(&self) -> Location {
        Location::new(self.file_index, self.line, self.column).with_end(self.end_line, self.end_column)
    }

    /// Whether the App Builder can edit the code section this token lives in.
    pub fn is_editable_in_app_builder(&self) -> bool {
        self.analyze_suspend
            .as_deref()
            .map_or(true, is_editable_in_app_builder)
    }
}

/// Decides from an `&ANALYZE-SUSPEND` attribute string whether the section is App Builder
/// editable.
pub fn is_editable_in_app_builder(analyze_suspend: &str) -> bool {
    let attrs: Vec<&str> = analyze_suspend
        .split(',')
        .map(str::trim)
        .filter(|attr| !attr.is_empty())
        .collect();
    let Some(first) = attrs.first() else {
        return false;
    };
    if !first.eq_ignore_ascii_case("_UIB-CODE-BLOCK") {
        return false;
    }
    match attrs.as_slice() {
        [_, custom, definitions, ..]
            if custom.eq_ignore_ascii_case("_CUSTOM")
                && definitions.eq_ignore_ascii_case("_DEFINITIONS") =>
        {
            true
        }
        [_, control, ..] if control.eq_ignore_ascii_case("_CONTROL") => true,
        [_, "_PROCEDURE", _, _] => true,
        [_, "_PROCEDURE", _, _, "_FREEFORM"] => true,
        [_, "_FUNCTION", ..] => true,
        _ => false,
    }
}
