//! Trade economics - FIFO lot matching and per-trade derived metrics.

pub mod fifo_matcher;
pub mod metrics_calculator;

pub use fifo_matcher::*;
pub use metrics_calculator::*;

#[cfg(test)]
mod metrics_calculator_tests;
