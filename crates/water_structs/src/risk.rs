use serde::{Deserialize, Serialize};

/// Coarse risk tier reported alongside a prediction.
///
/// Ordered from least to most severe.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}
