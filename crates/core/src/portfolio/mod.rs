//! The valuation and trade-economics engine: monthly capital rollup, FIFO
//! trade economics, annualized return, and the recalculation pass that
//! ties them together.

pub mod metrics;
pub mod performance;
pub mod recalculation;
pub mod valuation;

pub use metrics::*;
pub use performance::*;
pub use recalculation::*;
pub use valuation::*;
