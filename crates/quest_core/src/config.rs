//! Configuration for a quest working root.

use crate::error::{QuestError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration file name inside `.quest`.
pub const CONFIG_FILE: &str = "config.toml";

/// Comprehensive configuration for a quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// External feedback generator.
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Template catalog.
    #[serde(default)]
    pub templates: TemplateConfig,

    /// Annotation placement.
    #[serde(default)]
    pub annotate: AnnotateConfig,
}

impl Config {
    /// Load configuration from `<quest_dir>/config.toml`, or defaults if absent.
    pub fn load(quest_dir: &Path) -> Result<Self> {
        let path = quest_dir.join(CONFIG_FILE);
        if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| QuestError::Config(format!("failed to read config: {}", e)))?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| QuestError::Config(format!("failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Rejects values the patcher cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.annotate.marker.trim().is_empty() {
            return Err(QuestError::Config(
                "[annotate] marker must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Save configuration to `<quest_dir>/config.toml`.
    pub fn save(&self, quest_dir: &Path) -> Result<()> {
        let path = quest_dir.join(CONFIG_FILE);
        let content = toml::to_string_pretty(self)
            .map_err(|e| QuestError::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(&path, content)
            .map_err(|e| QuestError::Config(format!("failed to write config: {}", e)))?;
        Ok(())
    }
}

/// External feedback generator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Program that reads a prompt on stdin and writes feedback lines to stdout
    /// (default: "copilot").
    pub command: String,

    /// Extra arguments passed to the program.
    pub args: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            command: "copilot".to_string(),
            args: Vec::new(),
        }
    }
}

/// Template catalog configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Directory of `<name>.json` templates consulted before the built-ins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,

    /// Template used by `quest begin` without `--template`.
    pub default: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            directory: None,
            default: "rust-cli-basics".to_string(),
        }
    }
}

/// Annotation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotateConfig {
    /// Marker written after the comment token on every inserted line
    /// (default: "quest:").
    pub marker: String,
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self {
            marker: "quest:".to_string(),
        }
    }
}
