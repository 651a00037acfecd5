//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use mediscript_llm::gemini::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name
    #[serde(default = "default_profile")]
    pub active_profile: String,

    /// Available profiles
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,

    /// File this configuration was loaded from
    #[serde(skip)]
    pub location: Option<PathBuf>,
}

/// Model access profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    /// Gemini API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            endpoint: default_endpoint(),
        }
    }
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Command history size
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

/// Output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Data card and prompt
    Table,
    /// JSON format
    Json,
    /// Prompt text only
    Prompt,
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".mediscript").join("config.toml"))
    }

    /// Load configuration from the default file or create default.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load configuration from `path`, falling back to defaults if it is absent.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = fs::read_to_string(path)?;
            toml::from_str::<Config>(&contents)?
        } else {
            Self::default()
        };
        config.location = Some(path.to_path_buf());
        Ok(config)
    }

    /// Save configuration to the file it was loaded from.
    pub fn save(&self) -> Result<()> {
        let path = match &self.location {
            Some(path) => path.clone(),
            None => Self::path()?,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(&path, contents)?;
        Ok(())
    }

    /// Get the active profile.
    pub fn get_active_profile(&self) -> Result<&Profile> {
        self.profiles
            .get(&self.active_profile)
            .ok_or_else(|| CliError::Config(format!("Profile '{}' not found", self.active_profile)))
    }

    /// Add or update a profile.
    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Switch to a different profile.
    pub fn switch_profile(&mut self, name: String) -> Result<()> {
        if !self.profiles.contains_key(&name) {
            return Err(CliError::Config(format!("Profile '{}' does not exist", name)));
        }
        self.active_profile = name;
        Ok(())
    }

    /// Pick the API key: explicit flag or environment first, then the active profile.
    ///
    /// Blank keys count as missing.
    pub fn resolve_api_key(&self, explicit: Option<&str>) -> Option<String> {
        let from_profile = self
            .profiles
            .get(&self.active_profile)
            .and_then(|p| p.api_key.as_deref());

        explicit
            .into_iter()
            .chain(from_profile)
            .map(str::trim)
            .find(|key| !key.is_empty())
            .map(str::to_string)
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut profiles = HashMap::new();
        profiles.insert("default".to_string(), Profile::default());

        Self {
            active_profile: "default".to_string(),
            profiles,
            settings: Settings::default(),
            location: None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
            history_size: 1000,
        }
    }
}

fn default_profile() -> String {
    "default".to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_history_size() -> usize {
    1000
}
