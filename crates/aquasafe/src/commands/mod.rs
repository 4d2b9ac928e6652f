//! CLI command implementations.

pub mod predict;
pub mod serve;
pub mod train;
