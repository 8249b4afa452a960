use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{BoardError, BoardResult};

const DEFAULT_LOG_FILTER: &str = "info";
pub const DEFAULT_DRAG_THRESHOLD_PX: i32 = 5;
const DEFAULT_EVENT_BUFFER: usize = 16;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub log_filter: Option<String>,
    #[serde(default)]
    pub drag_threshold_px: Option<i32>,
    #[serde(default)]
    pub event_buffer: Option<usize>,
}

impl SyncConfig {
    pub fn config_path() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            dirs::home_dir().map(|home| home.join(".config/taskboard/config.toml"))
        }
        #[cfg(target_os = "linux")]
        {
            dirs::config_dir().map(|config| config.join("taskboard/config.toml"))
        }
        #[cfg(target_os = "windows")]
        {
            dirs::config_dir().map(|config| config.join("taskboard\\config.toml"))
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            None
        }
    }

    /// Load from the platform config path, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load() -> Self {
        if let Some(config_path) = Self::config_path() {
            if config_path.exists() {
                match Self::load_from(&config_path) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Ignoring config at {}: {}", config_path.display(), e)
                    }
                }
            }
        }
        Self::default()
    }

    pub fn load_from(path: &Path) -> BoardResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> BoardResult<Self> {
        toml::from_str(content).map_err(|e| BoardError::Config(e.to_string()))
    }

    pub fn effective_log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    pub fn effective_drag_threshold_px(&self) -> i32 {
        self.drag_threshold_px
            .filter(|px| *px >= 0)
            .unwrap_or(DEFAULT_DRAG_THRESHOLD_PX)
    }

    pub fn effective_event_buffer(&self) -> usize {
        self.event_buffer
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_EVENT_BUFFER)
    }
}
