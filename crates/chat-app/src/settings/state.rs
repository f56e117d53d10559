use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use doodle_api::StoreConfig;
use doodle_sync::{DEFAULT_AUTHOR, DEFAULT_POLL_INTERVAL, NEAR_BOTTOM_THRESHOLD, SyncConfig};
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_VIEWPORT_ROWS: u16 = 20;
pub const SETTINGS_DIRECTORY_NAME: &str = "doodle";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const ENV_PREFIX: &str = "DOODLE_";

/// Client settings, layered as defaults, then the settings file, then
/// `DOODLE_*` environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSettings {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub api_token: String,
    #[serde(default = "default_author")]
    pub author: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_near_bottom_threshold_px")]
    pub near_bottom_threshold_px: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
    #[serde(default = "default_viewport_rows")]
    pub viewport_rows: u16,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_token: String::new(),
            author: default_author(),
            poll_interval_ms: default_poll_interval_ms(),
            near_bottom_threshold_px: default_near_bottom_threshold_px(),
            initial_limit: None,
            request_timeout_ms: None,
            viewport_rows: default_viewport_rows(),
        }
    }
}

impl ChatSettings {
    pub fn has_token(&self) -> bool {
        !self.api_token.trim().is_empty()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self.normalized()
    }

    pub fn store_config(&self) -> StoreConfig {
        let config = StoreConfig::new(self.api_url.clone(), self.api_token.clone());
        match self.request_timeout() {
            Some(timeout) => config.with_request_timeout(timeout),
            None => config,
        }
    }

    pub fn sync_config(&self) -> SyncConfig {
        let config = SyncConfig::new(self.author.clone()).with_poll_interval(self.poll_interval());
        match self.initial_limit {
            Some(limit) => config.with_initial_limit(limit),
            None => config,
        }
    }

    pub fn normalized(mut self) -> Self {
        self.api_url = if self.api_url.trim().is_empty() {
            default_api_url()
        } else {
            self.api_url.trim().to_string()
        };
        self.api_token = self.api_token.trim().to_string();
        self.author = if self.author.trim().is_empty() {
            default_author()
        } else {
            self.author.trim().to_string()
        };
        if self.poll_interval_ms == 0 {
            self.poll_interval_ms = default_poll_interval_ms();
        }
        if !self.near_bottom_threshold_px.is_finite() || self.near_bottom_threshold_px < 0.0 {
            self.near_bottom_threshold_px = default_near_bottom_threshold_px();
        }
        self.initial_limit = self.initial_limit.filter(|limit| *limit > 0);
        self.request_timeout_ms = self.request_timeout_ms.filter(|timeout| *timeout > 0);
        if self.viewport_rows == 0 {
            self.viewport_rows = default_viewport_rows();
        }

        self
    }
}

pub struct SettingsStore {
    settings: Arc<ArcSwap<ChatSettings>>,
    config_path: PathBuf,
}

impl SettingsStore {
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|path| path.join(SETTINGS_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(".doodle"))
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join(SETTINGS_FILE_NAME)
    }

    pub fn new(config_path: PathBuf) -> Self {
        let settings = Self::load_layers(&config_path);
        Self {
            settings: Arc::new(ArcSwap::from_pointee(settings)),
            config_path,
        }
    }

    pub fn load() -> Self {
        Self::new(Self::default_config_path())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> Arc<ChatSettings> {
        self.settings.load_full()
    }

    pub fn update(&self, settings: ChatSettings) -> Result<(), SettingsError> {
        let normalized_settings = settings.normalized();
        self.persist(&normalized_settings)?;
        self.settings.store(Arc::new(normalized_settings));
        Ok(())
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(ChatSettings::default()))
            .merge(Json::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    fn load_layers(path: &Path) -> ChatSettings {
        if !path.exists() {
            tracing::info!("settings file not found at {:?}, using defaults", path);
        }

        match Self::figment(path).extract::<ChatSettings>() {
            Ok(settings) => settings.normalized(),
            Err(error) => {
                tracing::warn!(
                    "failed to parse settings from {:?}: {}. using defaults",
                    path,
                    error
                );
                ChatSettings::default()
            }
        }
    }

    fn persist(&self, settings: &ChatSettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).context(CreateDirSnafu {
                stage: "create-settings-directory",
                path: parent.to_path_buf(),
            })?;
        }

        let content = serde_json::to_string_pretty(settings).context(SerializeConfigSnafu {
            stage: "serialize-settings-json",
        })?;

        let temp_path = self.config_path.with_extension("json.tmp");
        std::fs::write(&temp_path, content).context(WriteFileSnafu {
            stage: "write-temporary-settings-file",
            path: temp_path.clone(),
        })?;

        std::fs::rename(&temp_path, &self.config_path).context(RenameTempFileSnafu {
            stage: "rename-temporary-settings-file",
            from: temp_path,
            to: self.config_path.clone(),
        })?;

        tracing::info!("saved settings to {:?}", self.config_path);
        Ok(())
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SettingsError {
    #[snafu(display("failed to create settings directory at {path:?} on `{stage}`: {source}"))]
    CreateDir {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to serialize settings on `{stage}`: {source}"))]
    SerializeConfig {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("failed to write settings file at {path:?} on `{stage}`: {source}"))]
    WriteFile {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display(
        "failed to replace settings file from {from:?} to {to:?} on `{stage}`: {source}"
    ))]
    RenameTempFile {
        stage: &'static str,
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_author() -> String {
    DEFAULT_AUTHOR.to_string()
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

fn default_near_bottom_threshold_px() -> f32 {
    NEAR_BOTTOM_THRESHOLD
}

fn default_viewport_rows() -> u16 {
    DEFAULT_VIEWPORT_ROWS
}
