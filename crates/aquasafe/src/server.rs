//! HTTP prediction service.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use water_structs::FeatureRecord;

use crate::classifier::{PredictError, RiskClassifier};

/// Body of `GET /`.
pub const LIVENESS_MESSAGE: &str = "AquaSafe Backend Running. Use /predict endpoint.";

/// Shared, read-only service state.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub classifier: RiskClassifier,
}

impl AppState {
    #[must_use]
    pub const fn new(classifier: RiskClassifier) -> Self {
        Self { classifier }
    }
}

/// Body of `POST /predict`.
///
/// Fields are optional here so that a missing field is reported by name
/// instead of as a generic deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictRequest {
    pub criteria: Option<String>,
    pub percentage: Option<NumericField>,
    pub salt_count: Option<NumericField>,
}

/// A numeric value sent either as a JSON number or as a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumericField {
    Number(f64),
    Text(String),
}

impl NumericField {
    fn parse(&self, field: &str) -> Result<f64, PredictError> {
        let value = match self {
            Self::Number(value) => *value,
            Self::Text(text) => text.trim().parse::<f64>().map_err(|_| {
                PredictError::InvalidInput(format!("{field} must be a number, got {text:?}"))
            })?,
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(PredictError::InvalidInput(format!(
                "{field} must be a finite number, got {value}"
            )))
        }
    }
}

impl PredictRequest {
    /// Validates the request and converts it into a feature record.
    ///
    /// # Errors
    ///
    /// Returns [`PredictError::InvalidInput`] naming the first missing or
    /// non-numeric field.
    pub fn into_record(self) -> Result<FeatureRecord, PredictError> {
        let criteria = self.criteria.ok_or_else(|| missing("criteria"))?;
        let percentage = self
            .percentage
            .ok_or_else(|| missing("percentage"))?
            .parse("percentage")?;
        let salt_count = self
            .salt_count
            .ok_or_else(|| missing("salt_count"))?
            .parse("salt_count")?;

        Ok(FeatureRecord::new(criteria, percentage, salt_count))
    }
}

fn missing(field: &str) -> PredictError {
    PredictError::InvalidInput(format!("missing field: {field}"))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn api_error(status: StatusCode, message: &str) -> Response {
    let body = ErrorBody {
        error: message.to_string(),
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::ModelUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        api_error(status, &self.to_string())
    }
}

/// `GET /`
async fn index_handler() -> &'static str {
    LIVENESS_MESSAGE
}

/// `POST /predict`
async fn predict_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Response {
    // Without a model every request fails, whatever its body.
    if !state.classifier.is_ready() {
        warn!("Prediction requested but no model is loaded");
        return PredictError::ModelUnavailable("no model loaded".into()).into_response();
    }

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected prediction request");
            return api_error(StatusCode::BAD_REQUEST, &rejection.body_text());
        }
    };

    info!(
        criteria = ?request.criteria,
        percentage = ?request.percentage,
        salt_count = ?request.salt_count,
        "Received prediction request"
    );

    let result = request
        .into_record()
        .and_then(|record| state.classifier.classify(&record));

    match result {
        Ok(prediction) => {
            info!(
                prediction = %prediction.label,
                risk_level = %prediction.risk_level,
                "Prediction served"
            );
            Json(prediction).into_response()
        }
        Err(e) => {
            warn!(error = %e, "Prediction failed");
            e.into_response()
        }
    }
}

/// Builds the service router.
#[must_use]
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/predict", post(predict_handler))
        .layer(cors)
        .with_state(state)
}

/// Serves requests on `listener` until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the server fails.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, ready = state.classifier.is_ready(), "Prediction service listening");
    }
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
