use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ron::ser::{to_string_pretty, PrettyConfig};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::model::{PageSize, DEFAULT_PAGE_SIZE};
use crate::schema::RecordSchema;
use crate::{targets, Error, StorageAction};

pub const DEFAULT_CONFIG_PATH: &str = "casedesk.ron";
pub const CONFIG_PATH_ENV: &str = "CASEDESK_CONFIG";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000/api";
const MAX_TOAST_DURATION: Duration = Duration::from_secs(600);

/// What happens to selected ids that disappear from a refetched collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectionPolicy {
    #[default]
    Preserve,
    PruneOnRefetch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub base_url: String,
    pub schema: RecordSchema,
    pub page_size: usize,
    pub request_timeout_ms: u64,
    pub selection_policy: SelectionPolicy,
    pub toast_duration_ms: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            schema: RecordSchema::default(),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout_ms: 10_000,
            selection_policy: SelectionPolicy::default(),
            toast_duration_ms: 4_000,
        }
    }
}

impl DashboardConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Capped at ten minutes.
    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms).min(MAX_TOAST_DURATION)
    }

    pub fn page_size(&self) -> PageSize {
        match PageSize::new(self.page_size) {
            Some(size) => size,
            None => {
                warn!(
                    target: targets::CONFIG,
                    page_size = self.page_size,
                    "Unsupported page size, using default"
                );
                PageSize::default()
            }
        }
    }

    pub fn from_ron(contents: &str, path: Option<&Path>) -> Result<Self, Error> {
        ron::from_str(contents).map_err(|error| Error::Ron {
            action: StorageAction::Load,
            path: path.map(|value| value.display().to_string()),
            source: error.code,
        })
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path).map_err(|source| Error::StorageIo {
            action: StorageAction::Load,
            path: Some(path.display().to_string()),
            source,
        })?;
        Self::from_ron(&contents, Some(path))
    }

    /// Missing files yield defaults; unreadable or malformed files are logged
    /// and also fall back to defaults.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => {
                info!(
                    target: targets::CONFIG,
                    path = %path.display(),
                    base_url = %config.base_url,
                    schema = %config.schema,
                    "Configuration loaded"
                );
                config
            }
            Err(Error::StorageIo { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                info!(
                    target: targets::CONFIG,
                    path = %path.display(),
                    "No configuration file, using defaults"
                );
                Self::default()
            }
            Err(error) => {
                warn!(
                    target: targets::CONFIG,
                    error = %error.technical_detail(),
                    "Configuration unusable, using defaults"
                );
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let contents =
            to_string_pretty(self, PrettyConfig::new()).map_err(|source| Error::Ron {
                action: StorageAction::Save,
                path: Some(path.display().to_string()),
                source,
            })?;
        fs::write(path, contents).map_err(|source| Error::StorageIo {
            action: StorageAction::Save,
            path: Some(path.display().to_string()),
            source,
        })
    }
}

pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
