//! Serve command - runs the HTTP prediction service.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::classifier::{PipelineModel, RiskClassifier};
use crate::server::{self, AppState};

/// Loads the pipeline once; a missing or incompatible artifact leaves the
/// service running without a model.
#[must_use]
pub fn load_state(model_path: &Path) -> AppState {
    match PipelineModel::load(model_path) {
        Ok(model) => {
            info!(model_path = %model_path.display(), "Model loaded");
            AppState::new(RiskClassifier::new(Arc::new(model)))
        }
        Err(e) => {
            error!(
                model_path = %model_path.display(),
                error = %e,
                "Failed to load model, /predict will answer 500"
            );
            AppState::new(RiskClassifier::unavailable())
        }
    }
}

/// Runs the serve command.
///
/// # Errors
///
/// Returns an error if the listen address cannot be bound or the server fails.
pub async fn run(listen_addr: SocketAddr, model_path: &Path) -> Result<()> {
    let state = Arc::new(load_state(model_path));

    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("Failed to bind {listen_addr}"))?;

    server::serve(listener, state).await.context("Server error")?;

    Ok(())
}
