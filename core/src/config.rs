use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_FILE: &str = "visitors.csv";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// The flat file holding every visitor row.
    pub data_file:  PathBuf,
    /// Default `env_logger` filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_file:  PathBuf::from(DEFAULT_DATA_FILE),
            log_filter: "info".into(),
        }
    }
}

impl LedgerConfig {
    /// Load from a JSON file. Keys left out fall back to the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        let config: LedgerConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config {}: {e}", path.display()))?;
        Ok(config)
    }

    /// Like `load`, but a missing file just means "use the defaults".
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            log::debug!("No config at {}; using defaults", path.as_ref().display());
            Ok(Self::default())
        }
    }

    /// Config pointing at a specific data file, everything else default.
    pub fn with_data_file<P: Into<PathBuf>>(data_file: P) -> Self {
        Self { data_file: data_file.into(), ..Self::default() }
    }
}
