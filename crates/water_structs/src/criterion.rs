use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Categorical presence/absence criterion of a sample.
///
/// Values outside the known vocabulary are kept verbatim in [`Criterion::Other`]
/// so that the encoder can map them to an all-zero encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Criterion {
    Absent,
    Present,
    Other(String),
}

impl Criterion {
    /// Returns the category string exactly as it appears in the dataset.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Absent => "Absent",
            Self::Present => "Present",
            Self::Other(value) => value,
        }
    }

    /// Whether this value belongs to the known vocabulary.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl FromStr for Criterion {
    type Err = core::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "Absent" => Self::Absent,
            "Present" => Self::Present,
            other => Self::Other(other.to_string()),
        })
    }
}

impl From<&str> for Criterion {
    fn from(value: &str) -> Self {
        let Ok(criterion) = value.parse::<Self>();
        criterion
    }
}

impl From<String> for Criterion {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Criterion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Criterion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from(value))
    }
}
