//! Capital ledger module - starting capitals, overrides, and cash flows.

pub mod capital_ledger;
pub mod ledger_model;

pub use capital_ledger::*;
pub use ledger_model::*;
