// Configuration management for tunedeck
// Handles loading/saving settings, with sensible defaults when config is missing

use anyhow::Result;
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::audio::DEFAULT_EXTENSIONS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Folder opened at startup. `None` starts with an empty song list.
    pub music_directory: Option<PathBuf>,
    pub supported_extensions: Vec<String>,
    pub log_directory: PathBuf,
    pub playback: PlaybackConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub grace_period_ms: u64,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub auto_play: bool,
    pub flashing_background: bool,
    pub flash_interval_ms: u64,
    pub tick_rate_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tunedeck");

        Self {
            music_directory: dirs::audio_dir(),
            supported_extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            log_directory: data_dir.join("logs"),
            playback: PlaybackConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            grace_period_ms: 1000,
            poll_interval_ms: 100,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            auto_play: false,
            flashing_background: false,
            flash_interval_ms: 1000,
            tick_rate_ms: 100,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path()?)
    }

    /// Read `path`, or write the defaults there when it does not exist yet.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("tunedeck");

        Ok(config_dir.join("config.toml"))
    }
}
