//! Configuration loading and typed config structures for the live radar.
//!
//! The configuration lives in `liveradar-config.yaml` next to the binary
//! (or wherever `--config` points). Every field has a default, so an
//! empty or missing file is a valid configuration. After interactive
//! prompts the binary writes the answers back with [`RadarConfig::save`]
//! so the next start needs none.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ingest::IngestIntervals;
use crate::maps::LocalMapCatalog;
use crate::projection::MapTransform;

/// Default config file name.
pub const DEFAULT_CONFIG_FILE: &str = "liveradar-config.yaml";

/// Errors that can occur when loading or saving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write the configuration file.
    #[error("failed to access config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse or emit YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level radar configuration.
///
/// Mirrors the structure of `liveradar-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RadarConfig {
    /// Which recording to follow and which map it is on.
    #[serde(default)]
    pub source: SourceConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerSettings,

    /// Ingestion poll intervals.
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Extra or replacement map transforms, keyed by map name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub maps: BTreeMap<String, MapTransform>,
}

impl RadarConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `LIVERADAR_PORT` overrides `server.port`
    /// - `LIVERADAR_RECORDING` overrides the recording path
    /// - `LIVERADAR_MAP` overrides `source.map_name`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, applying env overrides.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load `path` if it exists, otherwise return defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Write the configuration to `path` as YAML.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let yaml = serde_yml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Map catalog built from the `maps` overrides and image sources.
    pub fn map_catalog(&self) -> LocalMapCatalog {
        LocalMapCatalog::new()
            .with_overrides(self.maps.clone())
            .with_radar_dir(self.source.radar_dir.clone())
            .with_custom_image(self.source.custom_image.clone())
    }

    /// Override settings with environment variables when set.
    ///
    /// Unparseable values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(port) = std::env::var("LIVERADAR_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.server.port = port;
        }
        if let Ok(val) = std::env::var("LIVERADAR_RECORDING") {
            self.source.set_recording_path(Path::new(&val));
        }
        if let Ok(val) = std::env::var("LIVERADAR_MAP") {
            self.source.map_name = val;
        }
    }
}

/// Recording and map selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Full path of the recording. When set it is used exactly as given
    /// and `recording_dir`/`recording_name` are ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording: Option<PathBuf>,

    /// Directory the game writes recordings into.
    #[serde(default)]
    pub recording_dir: Option<PathBuf>,

    /// Recording file name, with or without extension.
    #[serde(default)]
    pub recording_name: Option<String>,

    /// Extension appended to `recording_name` when it has none.
    #[serde(default = "default_recording_extension")]
    pub recording_extension: String,

    /// Map the match is played on.
    #[serde(default = "default_map_name")]
    pub map_name: String,

    /// Directory holding `<map>.png` radar images.
    #[serde(default)]
    pub radar_dir: Option<PathBuf>,

    /// Background image used regardless of map.
    #[serde(default)]
    pub custom_image: Option<PathBuf>,
}

impl SourceConfig {
    /// Full path of the recording to follow.
    ///
    /// An explicit [`recording`](Self::recording) path wins. Otherwise
    /// the path is `recording_dir` joined with `recording_name`, the
    /// name getting `recording_extension` appended when it lacks it. A
    /// name that is already absolute ignores the directory.
    pub fn recording_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.recording {
            return Some(path.clone());
        }
        let name = self.recording_name.as_deref()?.trim();
        if name.is_empty() {
            return None;
        }
        let file = with_extension(name, &self.recording_extension);
        let file = Path::new(&file);
        if file.is_absolute() {
            return Some(file.to_path_buf());
        }
        self.recording_dir.as_ref().map(|dir| dir.join(file))
    }

    /// Follow exactly `path`, whatever its extension.
    pub fn set_recording_path(&mut self, path: &Path) {
        self.recording = Some(path.to_path_buf());
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            recording: None,
            recording_dir: None,
            recording_name: None,
            recording_extension: default_recording_extension(),
            map_name: default_map_name(),
            radar_dir: None,
            custom_image: None,
        }
    }
}

/// Append `.{extension}` to `name` unless it already ends with it
/// (case-insensitively).
pub fn with_extension(name: &str, extension: &str) -> String {
    let extension = extension.trim_start_matches('.');
    if extension.is_empty() {
        return name.to_owned();
    }
    let suffix = format!(".{}", extension.to_lowercase());
    if name.to_lowercase().ends_with(&suffix) {
        name.to_owned()
    } else {
        format!("{name}.{extension}")
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whether to open the radar page in a browser at startup.
    #[serde(default = "default_true")]
    pub open_browser: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            open_browser: true,
        }
    }
}

/// Ingestion poll intervals in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Between checks for the recording to appear.
    #[serde(default = "default_source_poll_ms")]
    pub source_poll_ms: u64,

    /// Between read attempts when the recording has no new bytes.
    #[serde(default = "default_read_retry_ms")]
    pub read_retry_ms: u64,

    /// After a stalled or corrupt decode.
    #[serde(default = "default_decode_backoff_ms")]
    pub decode_backoff_ms: u64,
}

impl IngestConfig {
    /// Convert to the intervals used by the ingestion loop.
    pub fn intervals(&self) -> IngestIntervals {
        IngestIntervals::from_millis(
            self.source_poll_ms,
            self.read_retry_ms,
            self.decode_backoff_ms,
        )
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            source_poll_ms: default_source_poll_ms(),
            read_retry_ms: default_read_retry_ms(),
            decode_backoff_ms: default_decode_backoff_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive, used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_recording_extension() -> String {
    String::from("jsonl")
}

fn default_map_name() -> String {
    String::from("de_mirage")
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    8080
}

const fn default_true() -> bool {
    true
}

const fn default_source_poll_ms() -> u64 {
    1000
}

const fn default_read_retry_ms() -> u64 {
    1
}

const fn default_decode_backoff_ms() -> u64 {
    5
}

fn default_log_level() -> String {
    String::from("info")
}
