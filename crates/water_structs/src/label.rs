use serde::{Deserialize, Serialize};

/// Viability class that denotes a contaminated sample.
///
/// The dataset never states its polarity. This mapping is an explicit
/// assumption: high salt rows tend to carry `1`, and the reference row
/// `Present,19,19000` is labeled `0` and treated as safe. Change it here and
/// nowhere else.
pub const CONTAMINATED_CLASS: u8 = 1;

/// Viability class that denotes a safe sample.
pub const SAFE_CLASS: u8 = 0;

/// Contamination status reported for a sample.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum ContaminationLabel {
    Contaminated,
    Safe,
}

impl ContaminationLabel {
    /// Maps a predicted viability class to a label.
    ///
    /// Every class other than [`CONTAMINATED_CLASS`] is reported as safe.
    #[must_use]
    pub const fn from_class(class: u8) -> Self {
        if class == CONTAMINATED_CLASS {
            Self::Contaminated
        } else {
            Self::Safe
        }
    }

    /// Returns the viability class this label corresponds to.
    #[must_use]
    pub const fn class(self) -> u8 {
        match self {
            Self::Contaminated => CONTAMINATED_CLASS,
            Self::Safe => SAFE_CLASS,
        }
    }
}
