//! Configuration Management
//!
//! Handles persistent configuration storage for tidc.

use crate::idc::auth::{self, DEFAULT_REALM};
use crate::idc::http::RetryStrategy;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Tenant base URL including the deployment path
    #[serde(default)]
    pub host: Option<String>,
    /// Last used realm
    #[serde(default)]
    pub realm: Option<String>,
    /// Transport retry strategy
    #[serde(default)]
    pub retry: Option<String>,
    #[serde(default)]
    pub output: Option<OutputFormat>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tidc").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                tracing::warn!("Failed to read {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    fn parse(content: &str) -> Self {
        serde_json::from_str(content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed config file: {}", e);
            Self::default()
        })
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Get effective host (CLI > env > config)
    pub fn effective_host(&self, cli: Option<&str>) -> Option<String> {
        cli.map(str::to_string)
            .or_else(auth::get_default_host)
            .or_else(|| self.host.clone())
    }

    /// Get effective realm (CLI > env > config > alpha)
    pub fn effective_realm(&self, cli: Option<&str>) -> String {
        cli.map(str::to_string)
            .or_else(auth::get_default_realm)
            .or_else(|| self.realm.clone())
            .unwrap_or_else(|| DEFAULT_REALM.to_string())
    }

    /// Get effective retry strategy (CLI > env > config > nothing)
    pub fn effective_retry(&self, cli: Option<&str>) -> Result<RetryStrategy> {
        let env = std::env::var("TIDC_RETRY").ok();
        let Some(raw) = cli.map(str::to_string).or(env).or_else(|| self.retry.clone()) else {
            return Ok(RetryStrategy::default());
        };
        match RetryStrategy::parse(&raw) {
            Some(strategy) => Ok(strategy),
            None => bail!(
                "Unknown retry strategy '{}', expected nothing, network or everything",
                raw
            ),
        }
    }

    /// Get effective output format (CLI > config > json)
    pub fn effective_output(&self, cli: Option<OutputFormat>) -> OutputFormat {
        cli.or(self.output).unwrap_or_default()
    }

    /// Set a key by name and save
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "host" => self.host = Some(value.to_string()),
            "realm" => self.realm = Some(value.to_string()),
            "retry" => {
                if RetryStrategy::parse(value).is_none() {
                    bail!("Unknown retry strategy '{}'", value);
                }
                self.retry = Some(value.to_lowercase());
            }
            "output" => {
                self.output = Some(match value.to_lowercase().as_str() {
                    "json" => OutputFormat::Json,
                    "yaml" => OutputFormat::Yaml,
                    other => bail!("Unknown output format '{}'", other),
                })
            }
            other => bail!("Unknown config key '{}'", other),
        }
        self.save()
    }
}
