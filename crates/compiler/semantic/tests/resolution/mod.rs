//! # Resolution Tests
//!
//! Record and field resolution: lookup order, abbreviations, qualified names, field
//! lists that tolerate unknown names, and the fatal unresolved-table error.

pub mod fields;
pub mod units;
