//! Trade records - the closed schema the engine computes over.

pub mod trades_model;

pub use trades_model::*;
