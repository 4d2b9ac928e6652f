//! Risk classification of single water samples.

use std::path::Path;
use std::sync::Arc;

use ml_model::{ModelError, TrainedPipeline};
use tracing::debug;
use water_structs::{ContaminationLabel, FeatureRecord, PredictionResult};

use crate::risk::{confidence, risk_level};

/// Errors returned when classifying a sample.
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    /// The request is missing a field or carries an unusable value.
    #[error("{0}")]
    InvalidInput(String),

    /// No model is loaded, or the model rejected the sample.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
}

/// A fitted binary contamination model.
pub trait ContaminationModel: Send + Sync {
    /// Predicted viability class, 0 or 1.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot score `features`.
    fn classify(&self, features: &FeatureRecord) -> Result<u8, ModelError>;

    /// Probability of class 1.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot score `features`.
    fn class_probability(&self, features: &FeatureRecord) -> Result<f64, ModelError>;
}

/// [`ContaminationModel`] backed by a deserialized [`TrainedPipeline`].
#[derive(Debug, Clone)]
pub struct PipelineModel {
    pipeline: TrainedPipeline,
}

impl PipelineModel {
    #[must_use]
    pub const fn new(pipeline: TrainedPipeline) -> Self {
        Self { pipeline }
    }

    /// Loads and validates the artifact at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be read or is incompatible.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        TrainedPipeline::load(path).map(Self::new)
    }

    #[must_use]
    pub const fn pipeline(&self) -> &TrainedPipeline {
        &self.pipeline
    }
}

impl ContaminationModel for PipelineModel {
    fn classify(&self, features: &FeatureRecord) -> Result<u8, ModelError> {
        self.pipeline.predict(features)
    }

    fn class_probability(&self, features: &FeatureRecord) -> Result<f64, ModelError> {
        self.pipeline.contamination_probability(features)
    }
}

/// Turns raw samples into a label and a risk tier.
///
/// Constructed without a model, every classification fails with
/// [`PredictError::ModelUnavailable`].
#[derive(Clone, Default)]
pub struct RiskClassifier {
    model: Option<Arc<dyn ContaminationModel>>,
}

impl RiskClassifier {
    #[must_use]
    pub fn new(model: Arc<dyn ContaminationModel>) -> Self {
        Self { model: Some(model) }
    }

    /// A classifier with no model loaded.
    #[must_use]
    pub const fn unavailable() -> Self {
        Self { model: None }
    }

    /// Returns true if a model is loaded.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.model.is_some()
    }

    /// Classifies one sample.
    ///
    /// # Errors
    ///
    /// Returns [`PredictError::ModelUnavailable`] if no model is loaded or
    /// the model fails, and [`PredictError::InvalidInput`] if a numeric
    /// feature is not finite. A missing model is reported first.
    pub fn classify(&self, features: &FeatureRecord) -> Result<PredictionResult, PredictError> {
        let Some(model) = &self.model else {
            return Err(PredictError::ModelUnavailable("no model loaded".into()));
        };

        for (name, value) in [
            ("percentage", features.percentage),
            ("salt_count", features.salt_count),
        ] {
            if !value.is_finite() {
                return Err(PredictError::InvalidInput(format!(
                    "{name} must be a finite number, got {value}"
                )));
            }
        }

        let unavailable = |e: ModelError| PredictError::ModelUnavailable(e.to_string());
        let class = model.classify(features).map_err(unavailable)?;
        let probability = model.class_probability(features).map_err(unavailable)?;

        let label = ContaminationLabel::from_class(class);
        let confidence = confidence(class, probability);
        let risk_level = risk_level(label, confidence);
        debug!(class, probability, confidence, %label, %risk_level, "Classified sample");

        Ok(PredictionResult { label, risk_level })
    }
}

impl std::fmt::Debug for RiskClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskClassifier")
            .field("ready", &self.is_ready())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use water_structs::RiskLevel;

    use super::*;

    /// Model returning a fixed class and probability.
    pub(crate) struct StubModel {
        pub(crate) class: u8,
        pub(crate) probability: f64,
    }

    impl ContaminationModel for StubModel {
        fn classify(&self, _features: &FeatureRecord) -> Result<u8, ModelError> {
            Ok(self.class)
        }

        fn class_probability(&self, _features: &FeatureRecord) -> Result<f64, ModelError> {
            Ok(self.probability)
        }
    }

    /// Model that always fails.
    struct BrokenModel;

    impl ContaminationModel for BrokenModel {
        fn classify(&self, _features: &FeatureRecord) -> Result<u8, ModelError> {
            Err(ModelError::FeatureCount {
                expected: 4,
                actual: 3,
            })
        }

        fn class_probability(&self, _features: &FeatureRecord) -> Result<f64, ModelError> {
            Ok(0.0)
        }
    }

    fn classifier(class: u8, probability: f64) -> RiskClassifier {
        RiskClassifier::new(Arc::new(StubModel { class, probability }))
    }

    fn sample() -> FeatureRecord {
        FeatureRecord::new("Present", 19.0, 19000.0)
    }

    #[test]
    fn test_safe_and_certain() {
        let result = classifier(0, 0.05).classify(&sample()).unwrap();
        assert_eq!(result.label, ContaminationLabel::Safe);
        assert_eq!(result.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_contaminated_uncertain() {
        let result = classifier(1, 0.6).classify(&sample()).unwrap();
        assert_eq!(result.label, ContaminationLabel::Contaminated);
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_confidence_uses_predicted_class() {
        // P(class 1) = 0.3 means 0.7 confidence in a safe prediction.
        let result = classifier(0, 0.3).classify(&sample()).unwrap();
        assert_eq!(result.risk_level, RiskLevel::Moderate);
    }

    #[test]
    fn test_rejects_non_finite() {
        let record = FeatureRecord::new("Present", f64::INFINITY, 19000.0);
        let err = classifier(0, 0.0).classify(&record).unwrap_err();
        assert!(matches!(err, PredictError::InvalidInput(ref msg) if msg.contains("percentage")));
    }

    #[test]
    fn test_unavailable() {
        let classifier = RiskClassifier::unavailable();
        assert!(!classifier.is_ready());
        assert!(matches!(
            classifier.classify(&sample()),
            Err(PredictError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_unavailable_takes_precedence_over_bad_input() {
        let record = FeatureRecord::new("Present", f64::NAN, 19000.0);
        assert!(matches!(
            RiskClassifier::unavailable().classify(&record),
            Err(PredictError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_model_failure_is_unavailable() {
        let classifier = RiskClassifier::new(Arc::new(BrokenModel));
        assert!(matches!(
            classifier.classify(&sample()),
            Err(PredictError::ModelUnavailable(_))
        ));
    }
}
