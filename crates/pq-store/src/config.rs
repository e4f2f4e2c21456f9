//! Configuration: TOML file plus environment overrides.
//!
//! Lookup order for the file: explicit path, `PQ_CONFIG`, then
//! `~/.paleo-query/config.toml` if it exists. No file means defaults.

use std::path::{Path, PathBuf};
use std::{env, fs};

use pq_core::{CompileOptions, UnknownPolicy};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_ENDPOINT: &str = "https://linkedearth.graphdb.mint.isi.edu";
pub const DEFAULT_REPOSITORY: &str = "LiPDVerse-dynamic";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoint: EndpointConfig,
    pub compile: CompileConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub url: String,
    pub repository: String,
    /// Whole-request timeout. Unset means none.
    pub timeout_secs: Option<u64>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_ENDPOINT.to_string(),
            repository: DEFAULT_REPOSITORY.to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    /// Reject unknown periods, regions and overlap modes instead of dropping them.
    pub strict: bool,
}

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

pub fn default_config_path() -> PathBuf {
    dirs_home().join(".paleo-query").join("config.toml")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(origin.to_path_buf(), e))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml(&text, path)
    }

    /// Resolve and read the config file, then apply environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let chosen = explicit
            .map(Path::to_path_buf)
            .or_else(|| non_empty(env::var("PQ_CONFIG").ok()).map(PathBuf::from));

        let config = match chosen {
            Some(path) => Self::from_file(&path)?,
            None => {
                let fallback = default_config_path();
                if fallback.is_file() {
                    Self::from_file(&fallback)?
                } else {
                    tracing::debug!("no config file, using defaults");
                    Self::default()
                }
            }
        };

        Ok(config.with_overrides(
            env::var("PQ_ENDPOINT").ok(),
            env::var("PQ_REPOSITORY").ok(),
        ))
    }

    /// Replace endpoint fields with any non-blank override.
    pub fn with_overrides(mut self, url: Option<String>, repository: Option<String>) -> Self {
        if let Some(url) = non_empty(url) {
            self.endpoint.url = url;
        }
        if let Some(repository) = non_empty(repository) {
            self.endpoint.repository = repository;
        }
        self
    }

    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            unknown: if self.compile.strict {
                UnknownPolicy::Reject
            } else {
                UnknownPolicy::Ignore
            },
        }
    }
}
