//! Risk tier derivation.

use water_structs::{CONTAMINATED_CLASS, ContaminationLabel, RiskLevel};

/// Confidence above which a prediction is considered certain.
///
/// The comparison is strict: a confidence of exactly this value falls into
/// the less certain tier.
pub const CONFIDENCE_THRESHOLD: f64 = 0.8;

/// Confidence in the predicted `class`, given the probability of contamination.
#[must_use]
pub fn confidence(class: u8, contamination_probability: f64) -> f64 {
    if class == CONTAMINATED_CLASS {
        contamination_probability
    } else {
        1.0 - contamination_probability
    }
}

/// Maps a label and its confidence to a risk tier.
///
/// | label        | confidence > 0.8 | otherwise |
/// |--------------|------------------|-----------|
/// | Contaminated | Critical         | High      |
/// | Safe         | Low              | Moderate  |
#[must_use]
pub fn risk_level(label: ContaminationLabel, confidence: f64) -> RiskLevel {
    let certain = confidence > CONFIDENCE_THRESHOLD;
    match (label, certain) {
        (ContaminationLabel::Contaminated, true) => RiskLevel::Critical,
        (ContaminationLabel::Contaminated, false) => RiskLevel::High,
        (ContaminationLabel::Safe, true) => RiskLevel::Low,
        (ContaminationLabel::Safe, false) => RiskLevel::Moderate,
    }
}
