//! AquaSafe water contamination risk prediction.
//!
//! Library half of the `aquasafe` binary: the risk classifier built on a
//! trained pipeline, the HTTP service exposing it, and the CLI commands.

pub mod classifier;
pub mod commands;
pub mod risk;
pub mod server;

pub use classifier::{ContaminationModel, PipelineModel, PredictError, RiskClassifier};
pub use server::{AppState, build_router};
