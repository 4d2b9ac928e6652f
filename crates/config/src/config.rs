use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

/// File name of the labeled dataset.
pub const DATASET_FILE_NAME: &str = "Water_contamination.csv";

/// Dataset locations tried in order, relative to the base path.
pub const DATASET_CANDIDATES: [&str; 2] = ["../data", "data"];

/// Default location of the trained pipeline, relative to the base path.
pub const DEFAULT_MODEL_PATH: &str = "model/trained_model.json";

/// Default address the prediction service binds to.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5000";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory relative paths are resolved against.
    pub base_path: PathBuf,

    /// Location of the serialized pipeline artifact.
    pub model_path: PathBuf,

    /// Explicit dataset location, bypassing the candidate search.
    pub data_path: Option<PathBuf>,

    /// Address the prediction service binds to, as configured.
    ///
    /// Parsed by [`Config::socket_addr`] so that commands which never listen
    /// are unaffected by a bad value.
    pub listen_addr: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `AQUASAFE_HOME`: base directory (default: current directory)
    /// - `AQUASAFE_MODEL_PATH`: artifact path (default: `model/trained_model.json` under the base)
    /// - `AQUASAFE_DATA_PATH`: dataset path (default: search [`DATASET_CANDIDATES`])
    /// - `AQUASAFE_LISTEN_ADDR`: service address (default: `0.0.0.0:5000`)
    #[must_use]
    pub fn from_env() -> Self {
        // Load .env file
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_path = lookup("AQUASAFE_HOME").map_or_else(|| PathBuf::from("."), PathBuf::from);

        let model_path = lookup("AQUASAFE_MODEL_PATH").map_or_else(
            || base_path.join(DEFAULT_MODEL_PATH),
            |path| resolve(&base_path, Path::new(&path)),
        );

        let data_path = lookup("AQUASAFE_DATA_PATH").map(|path| resolve(&base_path, Path::new(&path)));

        let listen_addr = lookup("AQUASAFE_LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());

        let config = Self {
            base_path,
            model_path,
            data_path,
            listen_addr,
        };
        debug!(?config, "Loaded configuration");

        config
    }

    /// The listen address as a socket address.
    ///
    /// # Errors
    ///
    /// Returns an error if `AQUASAFE_LISTEN_ADDR` is not a socket address.
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        self.listen_addr.parse().with_context(|| {
            format!("AQUASAFE_LISTEN_ADDR is not a socket address: {}", self.listen_addr)
        })
    }

    /// Dataset locations to try, in order.
    #[must_use]
    pub fn dataset_candidates(&self) -> Vec<PathBuf> {
        self.data_path.as_ref().map_or_else(
            || {
                DATASET_CANDIDATES
                    .iter()
                    .map(|dir| self.base_path.join(dir).join(DATASET_FILE_NAME))
                    .collect()
            },
            |path| vec![path.clone()],
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        let base_path = PathBuf::from(".");
        Self {
            model_path: base_path.join(DEFAULT_MODEL_PATH),
            base_path,
            data_path: None,
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
        }
    }
}

/// Joins `path` onto `base` unless it is already absolute.
fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
