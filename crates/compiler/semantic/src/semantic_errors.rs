//! Errors that abort the analysis of a parse unit.

use abl_compiler_diagnostics::{Diagnostic, Location};
use smol_str::SmolStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SemanticError {
    /// A record reference names no buffer, temp-table or schema table. Nothing that
    /// follows can be resolved reliably without the table.
    #[error(
        "could not resolve table '{name}' in {file} at line {}, column {}",
        .location.line,
        .location.column
    )]
    UnresolvedTable {
        name: SmolStr,
        file: SmolStr,
        location: Location,
    },
}

impl SemanticError {
    pub const fn location(&self) -> Location {
        match self {
            Self::UnresolvedTable { location, .. } => *location,
        }
    }

    /// The error as an error-severity diagnostic, for rendering with the shared reporter.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::UnresolvedTable { name, location, .. } => {
                Diagnostic::unresolved_table(name, *location)
            }
        }
    }
}
