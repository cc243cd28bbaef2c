//! Configuration module for fanout
//!
//! Manages user-wide settings: read sizes, the collision bound, which file
//! extensions a scan picks up, and the last opened working folder.
//! Configuration is stored in the user's config directory
//! (`~/.config/fanout/config.toml` on Linux).
//!
//! Settings that belong to one working folder (its publish target, whether
//! done items are shown) live in that folder's database instead.

use std::fs;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::engine::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_COLLISION_SUFFIX};
use crate::publish::PublishOptions;
use crate::scan::DEFAULT_EXTENSIONS;

/// Keys accepted by [`FanoutConfig::get`] and [`FanoutConfig::set`]
pub const KEYS: [&str; 5] = [
    "chunk_size",
    "max_collision_suffix",
    "extensions",
    "quiet",
    "last_folder",
];

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

const fn default_max_collision_suffix() -> u32 {
    DEFAULT_MAX_COLLISION_SUFFIX
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect()
}

/// Application configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FanoutConfig {
    /// Read size in bytes for hashing, comparing and copying (0 = default)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Highest `name (n).ext` suffix tried before a file is reported as failed
    #[serde(default = "default_max_collision_suffix")]
    pub max_collision_suffix: u32,

    /// File extensions picked up by a scan, without the dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Suppress informational output by default
    #[serde(default)]
    pub quiet: bool,

    /// Working folder used when none is given
    #[serde(default)]
    pub last_folder: Option<PathBuf>,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_collision_suffix: DEFAULT_MAX_COLLISION_SUFFIX,
            extensions: default_extensions(),
            quiet: false,
            last_folder: None,
        }
    }
}

impl FanoutConfig {
    /// Get the path to the config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the system config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::Message("Could not determine config directory".to_string()))?;

        Ok(config_dir.join("fanout").join("config.toml"))
    }

    /// Load configuration from file, creating default if it doesn't exist
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config file cannot be read, parsed, or created.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, creating it with defaults if absent
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, parsed, or created.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let default_config = Self::default();
            default_config.save_to(path)?;
            return Ok(default_config);
        }

        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .build()?;

        settings.try_deserialize()
    }

    /// Save configuration to file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config directory cannot be created, the configuration
    /// cannot be serialized to TOML, or the file cannot be written.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to `path`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the directory cannot be created, the configuration
    /// cannot be serialized to TOML, or the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Message(format!("Failed to create config directory: {e}")))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Message(format!("Failed to serialize config: {e}")))?;

        fs::write(path, toml_string)
            .map_err(|e| ConfigError::Message(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Current value of `key` as text
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` for an unknown key.
    pub fn get(&self, key: &str) -> Result<String, ConfigError> {
        Ok(match key {
            "chunk_size" => self.chunk_size.to_string(),
            "max_collision_suffix" => self.max_collision_suffix.to_string(),
            "extensions" => self.extensions.join(","),
            "quiet" => self.quiet.to_string(),
            "last_folder" => self
                .last_folder
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            _ => return Err(ConfigError::NotFound(key.to_string())),
        })
    }

    /// Parse `value` into `key`
    ///
    /// `extensions` takes a comma-separated list; an empty `last_folder`
    /// clears it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` for an unknown key and
    /// `ConfigError::Message` if the value does not parse.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match key {
            "chunk_size" => self.chunk_size = parse(key, value)?,
            "max_collision_suffix" => {
                let bound: u32 = parse(key, value)?;
                if bound == 0 {
                    return Err(ConfigError::Message(
                        "max_collision_suffix must be at least 1".to_string(),
                    ));
                }
                self.max_collision_suffix = bound;
            }
            "extensions" => {
                let extensions: Vec<String> = value
                    .split(',')
                    .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                    .filter(|e| !e.is_empty())
                    .collect();
                if extensions.is_empty() {
                    return Err(ConfigError::Message("extensions cannot be empty".to_string()));
                }
                self.extensions = extensions;
            }
            "quiet" => self.quiet = parse(key, value)?,
            "last_folder" => {
                self.last_folder = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            _ => return Err(ConfigError::NotFound(key.to_string())),
        }
        Ok(())
    }

    /// Engine settings derived from this configuration
    #[must_use]
    pub fn publish_options(&self) -> PublishOptions {
        PublishOptions {
            chunk_size: if self.chunk_size == 0 {
                DEFAULT_CHUNK_SIZE
            } else {
                self.chunk_size
            },
            max_collision_suffix: self.max_collision_suffix,
        }
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| ConfigError::Message(format!("Invalid value for {key}: {e}")))
}
