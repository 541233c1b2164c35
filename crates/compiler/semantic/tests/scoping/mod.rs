//! # Scoping Tests
//!
//! Tests for the scope tree, control-block nesting and the visibility of names:
//!
//! - Scopes introduced by routines, triggers and CATCH blocks
//! - Block stack restoration after nested DO / REPEAT / FOR blocks
//! - Buffer scope strength (strong, weak, reference)
//! - Two-phase definitions: a symbol is invisible until its statement ends

pub mod scope_tree;
