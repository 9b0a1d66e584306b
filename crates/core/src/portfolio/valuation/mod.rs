//! Monthly portfolio valuation - the capital rollup with override semantics.

pub mod valuation_calculator;
pub mod valuation_model;

pub use valuation_calculator::*;
pub use valuation_model::*;
