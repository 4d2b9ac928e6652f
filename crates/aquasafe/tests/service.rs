use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use aquasafe::build_router;
use aquasafe::commands;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use config::Config;
use ml_model::{ModelError, TrainedPipeline, TrainingConfig, WaterDataset, train};
use tempfile::TempDir;
use tower::ServiceExt;

/// Writes a dataset with two well separated groups and returns its path.
///
/// Low readings with `Present` are labeled 0 (safe), high readings with
/// `Absent` are labeled 1. The reference row `Present,19,19000,0` is included.
fn write_dataset(dir: &Path) -> PathBuf {
    let mut csv = String::from("Region,Criteria,%percentage,Salt_Count,Viability\n");
    csv.push_str("15624510,Present,19,19000,0\n");
    for i in 0..30 {
        let f = f64::from(i);
        writeln!(
            csv,
            "{},Present,{},{},0",
            15_600_000 + i,
            12.0 + f * 0.4,
            14_000.0 + f * 350.0
        )
        .unwrap();
        writeln!(
            csv,
            "{},Absent,{},{},1",
            15_700_000 + i,
            55.0 + f * 0.5,
            120_000.0 + f * 2_000.0
        )
        .unwrap();
    }
    let path = dir.join("Water_contamination.csv");
    fs::write(&path, csv).unwrap();
    path
}

fn trained_app(dir: &TempDir) -> Router {
    let data = write_dataset(dir.path());
    let output = dir.path().join("model").join("trained_model.json");
    let evaluation = commands::train::run(
        &Config::default(),
        Some(data.as_path()),
        Some(output.as_path()),
        &TrainingConfig::default(),
    )
    .unwrap();
    assert!((evaluation.accuracy - 1.0).abs() < f64::EPSILON);

    build_router(Arc::new(commands::serve::load_state(&output)))
}

fn predict_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, body: &str) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(predict_request(body)).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_reference_row_is_safe_low() {
    let dir = TempDir::new().unwrap();
    let app = trained_app(&dir);

    let (status, json) = send(
        &app,
        r#"{"criteria": "Present", "percentage": 19, "salt_count": 19000}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["prediction"], "Safe");
    assert_eq!(json["risk_level"], "Low");
}

#[tokio::test]
async fn test_contaminated_row_is_critical() {
    let dir = TempDir::new().unwrap();
    let app = trained_app(&dir);

    let (status, json) = send(
        &app,
        r#"{"criteria": "Absent", "percentage": "62", "salt_count": "150000"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["prediction"], "Contaminated");
    assert_eq!(json["risk_level"], "Critical");
}

#[tokio::test]
async fn test_identical_requests_identical_responses() {
    let dir = TempDir::new().unwrap();
    let app = trained_app(&dir);
    let body = r#"{"criteria": "Present", "percentage": 30, "salt_count": 60000}"#;

    let first = send(&app, body).await;
    let second = send(&app, body).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_unknown_criteria_still_predicts() {
    let dir = TempDir::new().unwrap();
    let app = trained_app(&dir);

    let (status, json) = send(
        &app,
        r#"{"criteria": "Unclear", "percentage": 19, "salt_count": 19000}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["prediction"].is_string());
    assert!(json["risk_level"].is_string());
}

#[tokio::test]
async fn test_invalid_requests_are_rejected() {
    let dir = TempDir::new().unwrap();
    let app = trained_app(&dir);

    let (status, json) = send(&app, r#"{"criteria": "Present", "salt_count": 19000}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!json["error"].as_str().unwrap().is_empty());

    let (status, json) = send(
        &app,
        r#"{"criteria": "Present", "percentage": 19, "salt_count": "abc"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!json["error"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_artifact_answers_500() {
    let dir = TempDir::new().unwrap();
    let state = commands::serve::load_state(&dir.path().join("missing.json"));
    assert!(!state.classifier.is_ready());
    let app = build_router(Arc::new(state));

    let (status, json) = send(
        &app,
        r#"{"criteria": "Present", "percentage": 19, "salt_count": 19000}"#,
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!json["error"].as_str().unwrap().is_empty());
}

#[test]
fn test_saved_pipeline_reproduces_predictions() {
    let dir = TempDir::new().unwrap();
    let dataset = WaterDataset::from_csv(&write_dataset(dir.path())).unwrap();
    let output = train(&dataset, &TrainingConfig::default().with_n_trees(30)).unwrap();

    let path = dir.path().join("trained_model.json");
    output.pipeline.save(&path).unwrap();
    let loaded = TrainedPipeline::load(&path).unwrap();

    let features = dataset.features();
    assert_eq!(
        loaded.predict_batch(&features).unwrap(),
        output.pipeline.predict_batch(&features).unwrap()
    );
    for record in &features {
        assert!(
            (loaded.contamination_probability(record).unwrap()
                - output.pipeline.contamination_probability(record).unwrap())
            .abs()
                < 1e-12
        );
    }
}

#[test]
fn test_train_without_dataset_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nowhere.csv");
    let err = commands::train::run(
        &Config::default(),
        Some(missing.as_path()),
        Some(dir.path().join("out.json").as_path()),
        &TrainingConfig::default(),
    )
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ModelError>(),
        Some(ModelError::DataNotFound { .. })
    ));
    assert!(!dir.path().join("out.json").exists());
}
