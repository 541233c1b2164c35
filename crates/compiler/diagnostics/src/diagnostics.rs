//! # Diagnostic System for Semantic Resolution
//!
//! This module provides the diagnostic infrastructure for reporting the recoverable
//! conditions met while resolving an ABL parse unit, and for rendering the single
//! fatal condition that aborts a unit.

use ariadne::ReportKind;
use std::fmt;

/// A position range inside a parse unit.
///
/// Lines and columns are 1-based, as produced by the ABL lexer. `file_index` is the
/// index of the source file in the unit's include-file table (0 is the main file).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    pub file_index: u32,
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Location {
    pub const fn new(file_index: u32, line: u32, column: u32) -> Self {
        Self {
            file_index,
            line,
            column,
            end_line: line,
            end_column: column,
        }
    }

    pub const fn with_end(mut self, end_line: u32, end_column: u32) -> Self {
        self.end_line = end_line;
        self.end_column = end_column;
        self
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file_index, self.line, self.column)
    }
}

/// A diagnostic message from semantic resolution
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub code: DiagnosticCode,
    pub message: String,
    /// Source location where this diagnostic applies
    pub location: Location,
    /// Optional related locations for additional context
    pub related_locations: Vec<(Location, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
}

impl From<DiagnosticSeverity> for ReportKind<'static> {
    fn from(severity: DiagnosticSeverity) -> Self {
        match severity {
            DiagnosticSeverity::Error => ReportKind::Error,
            DiagnosticSeverity::Warning => ReportKind::Warning,
            DiagnosticSeverity::Info => ReportKind::Advice,
        }
    }
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    // Name resolution (1000-1999)
    UnresolvedTable,
    UnresolvedField,
    UnresolvedLikeSource,
    UnresolvedBuffer,
    UnknownUseIndex,

    // Definitions (2000-2999)
    SkippedIndexField,
    MissingTypeInfo,
}

impl From<DiagnosticCode> for u32 {
    fn from(code: DiagnosticCode) -> Self {
        match code {
            DiagnosticCode::UnresolvedTable => 1001,
            DiagnosticCode::UnresolvedField => 1002,
            DiagnosticCode::UnresolvedLikeSource => 1003,
            DiagnosticCode::UnresolvedBuffer => 1004,
            DiagnosticCode::UnknownUseIndex => 1005,
            DiagnosticCode::SkippedIndexField => 2001,
            DiagnosticCode::MissingTypeInfo => 2002,
        }
    }
}

impl Diagnostic {
    fn new(severity: DiagnosticSeverity, code: DiagnosticCode, message: String) -> Self {
        Self {
            severity,
            code,
            message,
            location: Location::default(),
            related_locations: Vec::new(),
        }
    }

    /// Create an error diagnostic
    pub fn error(code: DiagnosticCode, message: String) -> Self {
        Self::new(DiagnosticSeverity::Error, code, message)
    }

    /// Create a warning diagnostic
    pub fn warning(code: DiagnosticCode, message: String) -> Self {
        Self::new(DiagnosticSeverity::Warning, code, message)
    }

    /// Create an info diagnostic
    pub fn info(code: DiagnosticCode, message: String) -> Self {
        Self::new(DiagnosticSeverity::Info, code, message)
    }

    /// Add location information to this diagnostic
    pub const fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    /// Add a related location with context message
    pub fn with_related_location(mut self, location: Location, message: String) -> Self {
        self.related_locations.push((location, message));
        self
    }

    pub fn unresolved_table(name: &str, location: Location) -> Self {
        Self::error(
            DiagnosticCode::UnresolvedTable,
            format!("Could not resolve table '{name}'"),
        )
        .with_location(location)
    }

    pub fn unresolved_field(name: &str, table: &str, location: Location) -> Self {
        Self::warning(
            DiagnosticCode::UnresolvedField,
            format!("Field '{name}' not found in table '{table}'"),
        )
        .with_location(location)
    }

    pub fn unresolved_like_source(name: &str, location: Location) -> Self {
        Self::warning(
            DiagnosticCode::UnresolvedLikeSource,
            format!("Unable to resolve LIKE source '{name}'"),
        )
        .with_location(location)
    }

    pub fn unresolved_buffer(name: &str, location: Location) -> Self {
        Self::warning(
            DiagnosticCode::UnresolvedBuffer,
            format!("Unknown buffer '{name}'"),
        )
        .with_location(location)
    }

    pub fn unknown_use_index(index: &str, table: &str, location: Location) -> Self {
        Self::warning(
            DiagnosticCode::UnknownUseIndex,
            format!("Index '{index}' not found in table '{table}'"),
        )
        .with_location(location)
    }

    pub fn skipped_index_field(field: &str, index: &str, location: Location) -> Self {
        Self::info(
            DiagnosticCode::SkippedIndexField,
            format!("Field '{field}' of index '{index}' not found, skipped"),
        )
        .with_location(location)
    }

    pub fn missing_type_info(class_name: &str, location: Location) -> Self {
        Self::info(
            DiagnosticCode::MissingTypeInfo,
            format!("No type information for class '{class_name}'"),
        )
        .with_location(location)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;
        write!(f, " (at {})", self.location)?;
        for (location, message) in &self.related_locations {
            write!(f, "\n  note: {message} (at {location})")?;
        }
        Ok(())
    }
}

/// Collection of diagnostics from semantic resolution
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiagnosticCollection {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic to the collection
    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn all(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Get only error diagnostics
    pub fn errors(&self) -> Vec<&Diagnostic> {
        self.with_severity(DiagnosticSeverity::Error)
    }

    /// Get only warning diagnostics
    pub fn warnings(&self) -> Vec<&Diagnostic> {
        self.with_severity(DiagnosticSeverity::Warning)
    }

    fn with_severity(&self, severity: DiagnosticSeverity) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .collect()
    }

    /// Diagnostics carrying the given code, in emission order
    pub fn with_code(&self, code: DiagnosticCode) -> Vec<&Diagnostic> {
        self.diagnostics.iter().filter(|d| d.code == code).collect()
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == DiagnosticSeverity::Error)
    }

    pub const fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Sort diagnostics by position, then severity (errors first)
    pub fn sort(&mut self) {
        self.diagnostics
            .sort_by(|a, b| a.location.cmp(&b.location).then(a.severity.cmp(&b.severity)));
    }

    /// Get summary statistics
    pub fn summary(&self) -> String {
        let errors = self.errors().len();
        let warnings = self.warnings().len();
        if self.diagnostics.is_empty() {
            "No issues found".to_string()
        } else {
            format!("{errors} errors, {warnings} warnings")
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }
}

impl<'a> IntoIterator for &'a DiagnosticCollection {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}
