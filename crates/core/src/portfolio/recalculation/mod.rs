//! Recalculation orchestration - the single pass that rewrites the trade
//! list's derived fields.

pub mod recalculation_service;

pub use recalculation_service::*;
