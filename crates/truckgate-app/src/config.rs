//! Configuration management for truckgate
//!
//! Config stored at: ~/.config/truckgate/config.toml
//!
//! `OPENAI_API_KEY`, `CAMERA_URL` and `TRUCKGATE_DATA_DIR` override the file.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use truckgate_infra::camera::DEFAULT_CAPTURE_COMMAND;
use truckgate_types::{ConfigError, OutputFormat, Result};
use truckgate_vision::ai::backend_impl::{DEFAULT_BASE_URL, DEFAULT_MODEL};

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_CAMERA_URL: &str = "CAMERA_URL";
pub const ENV_DATA_DIR: &str = "TRUCKGATE_DATA_DIR";

/// Which truck record store to open
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Json,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Sqlite => write!(f, "sqlite"),
            StoreBackend::Json => write!(f, "json"),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Vision service API key
    #[serde(default)]
    pub api_key: Option<String>,

    /// Chat-completions base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Vision model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Upper bound for one recognition request
    #[serde(default = "default_recognition_timeout_secs")]
    pub recognition_timeout_secs: u64,

    /// Camera stream URL (RTSP/HTTP)
    #[serde(default)]
    pub camera_url: Option<String>,

    /// Frame grab command; `{url}` is replaced with the camera URL
    #[serde(default = "default_capture_command")]
    pub capture_command: String,

    /// Root for the record store, uploads, audio and cache
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub store_backend: StoreBackend,

    /// e.g. `espeak -s 150`; no local speech when unset
    #[serde(default)]
    pub local_speech_command: Option<String>,

    /// Language of the stored announcement audio
    #[serde(default = "default_tts_lang")]
    pub tts_lang: String,

    /// Cache plate readings by image hash
    #[serde(default)]
    pub cache_enabled: bool,

    /// Default output format (table, json)
    #[serde(default)]
    pub output_format: OutputFormat,
}

fn default_api_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_recognition_timeout_secs() -> u64 {
    30
}

fn default_capture_command() -> String {
    DEFAULT_CAPTURE_COMMAND.to_string()
}

fn default_tts_lang() -> String {
    truckgate_speech::DEFAULT_ARTIFACT_LANG.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: default_api_base_url(),
            model: default_model(),
            recognition_timeout_secs: default_recognition_timeout_secs(),
            camera_url: None,
            capture_command: default_capture_command(),
            data_dir: None,
            store_backend: StoreBackend::default(),
            local_speech_command: None,
            tts_lang: default_tts_lang(),
            cache_enabled: false,
            output_format: OutputFormat::default(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NotFound)?
            .join("truckgate");
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load the config file and apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load the config file only, or the defaults when there is none
    pub fn load_file() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SaveError(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveError(e.to_string()))?;
        Ok(())
    }

    /// Apply environment overrides. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(url) = get(ENV_CAMERA_URL) {
            self.camera_url = Some(url);
        }
        if let Some(dir) = get(ENV_DATA_DIR) {
            self.data_dir = Some(PathBuf::from(dir));
        }
    }

    /// Set one field from its `key` and string value
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        let optional = |v: &str| {
            let v = v.trim();
            (!v.is_empty()).then(|| v.to_string())
        };

        match key {
            "api_key" => self.api_key = optional(value),
            "api_base_url" => self.api_base_url = value.trim().to_string(),
            "model" => self.model = value.trim().to_string(),
            "recognition_timeout_secs" => {
                self.recognition_timeout_secs = value
                    .trim()
                    .parse()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or_else(invalid)?;
            }
            "camera_url" => self.camera_url = optional(value),
            "capture_command" => self.capture_command = value.trim().to_string(),
            "data_dir" => self.data_dir = optional(value).map(PathBuf::from),
            "store_backend" => {
                self.store_backend = StoreBackend::from_str(value.trim(), true).map_err(|_| invalid())?;
            }
            "local_speech_command" => self.local_speech_command = optional(value),
            "tts_lang" => self.tts_lang = value.trim().to_string(),
            "cache_enabled" => {
                self.cache_enabled = value.trim().parse().map_err(|_| invalid())?;
            }
            "output_format" => {
                self.output_format = OutputFormat::from_str(value.trim(), true).map_err(|_| invalid())?;
            }
            _ => return Err(invalid().into()),
        }
        Ok(())
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }

        let data_dir = dirs::data_dir()
            .ok_or(ConfigError::NotFound)?
            .join("truckgate");
        Ok(data_dir)
    }

    /// Directory for license, challan and plate images
    pub fn uploads_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("uploads"))
    }

    /// Directory for announcement MP3 files
    pub fn audio_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("audio"))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("cache"))
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("trucks.sqlite"))
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dir = |p: Result<PathBuf>| {
            p.map(|p| p.display().to_string())
                .unwrap_or_else(|_| "(error)".to_string())
        };

        writeln!(f, "Truckgate Configuration")?;
        writeln!(f, "=======================")?;
        writeln!(f)?;
        writeln!(
            f,
            "API key:          {}",
            if self.api_key.is_some() { "(set)" } else { "(not set)" }
        )?;
        writeln!(f, "API base URL:     {}", self.api_base_url)?;
        writeln!(f, "Model:            {}", self.model)?;
        writeln!(f, "Timeout:          {}s", self.recognition_timeout_secs)?;
        writeln!(
            f,
            "Camera URL:       {}",
            self.camera_url.as_deref().unwrap_or("(not set)")
        )?;
        writeln!(f, "Capture command:  {}", self.capture_command)?;
        writeln!(f, "Data dir:         {}", dir(self.data_dir()))?;
        writeln!(f, "Store backend:    {}", self.store_backend)?;
        writeln!(
            f,
            "Local speech:     {}",
            self.local_speech_command.as_deref().unwrap_or("(disabled)")
        )?;
        writeln!(f, "TTS language:     {}", self.tts_lang)?;
        writeln!(f, "Cache enabled:    {}", self.cache_enabled)?;
        writeln!(f, "Output format:    {}", self.output_format)?;

        if let Ok(path) = Self::config_path() {
            writeln!(f)?;
            writeln!(f, "Config file:      {}", path.display())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;
    use truckgate_types::Error;

    #[test]
    fn test_defaults_from_empty_file() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.recognition_timeout_secs, 30);
        assert_eq!(config.store_backend, StoreBackend::Sqlite);
        assert_eq!(config.tts_lang, "hi");
        assert!(!config.cache_enabled);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.set("camera_url", "rtsp://10.0.0.5/stream").unwrap();
        config.set("store_backend", "json").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.store_backend, StoreBackend::Json);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("none.toml")).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_unparseable_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "recognition_timeout_secs = \"soon\"").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(Error::Config(ConfigError::ParseError(_)))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_API_KEY, "sk-test"),
            (ENV_CAMERA_URL, ""),
            (ENV_DATA_DIR, "/var/lib/truckgate"),
        ]
        .into_iter()
        .collect();

        let mut config = Config {
            camera_url: Some("rtsp://file".to_string()),
            ..Config::default()
        };
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.camera_url.as_deref(), Some("rtsp://file"));
        assert_eq!(config.uploads_dir().unwrap(), PathBuf::from("/var/lib/truckgate/uploads"));
        assert_eq!(config.database_path().unwrap(), PathBuf::from("/var/lib/truckgate/trucks.sqlite"));
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.set("recognition_timeout_secs", "0").is_err());
        assert!(config.set("store_backend", "postgres").is_err());
        assert!(config.set("cache_enabled", "maybe").is_err());
        assert!(matches!(
            config.set("colour", "blue"),
            Err(Error::Config(ConfigError::InvalidValue { .. }))
        ));

        config.set("cache_enabled", "true").unwrap();
        config.set("local_speech_command", "espeak -s 150").unwrap();
        config.set("api_key", " ").unwrap();
        assert!(config.cache_enabled);
        assert_eq!(config.local_speech_command.as_deref(), Some("espeak -s 150"));
        assert_eq!(config.api_key, None);
    }
}
