mod diagnostics;
pub mod reporting;

pub use diagnostics::*;
