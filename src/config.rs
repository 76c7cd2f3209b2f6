use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::error::{ArchflowError, Result};

/// Environment variable consulted when no API key is configured
pub const API_KEY_ENV: &str = "ARCHFLOW_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentationConfig {
    /// Whether to ask the generative service for an alternative diagram
    pub enabled: bool,

    /// Request timeout in milliseconds
    pub timeout_ms: u64,

    /// Provider identifier (openai, deepseek, openai-compatible)
    pub provider: String,

    /// Model name (e.g., "gpt-4o-mini", "deepseek-chat")
    pub model: String,

    /// API key; falls back to ARCHFLOW_API_KEY
    pub api_key: Option<String>,

    /// Base URL for OpenAI-compatible endpoints
    pub base_url: Option<String>,

    /// Maximum tokens for the response
    pub max_tokens: Option<u32>,

    /// Temperature for the response (0.0 to 1.0)
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Source tree scanning
    pub scan: ScanConfig,

    /// Function selection for the diagram
    pub selection: SelectionConfig,

    /// Generative augmentation settings
    pub augmentation: AugmentationConfig,

    /// Diagram output settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory names skipped on exact match
    pub ignored_directory_names: BTreeSet<String>,

    /// Skip every entry whose name starts with a dot
    pub ignore_dot_prefixed: bool,

    /// Deepest directory level that is still listed (root is 0)
    pub max_depth: usize,

    /// Maximum file size to extract (in bytes)
    pub max_file_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Hard upper bound on functions shown in the diagram
    pub selection_cap: usize,

    /// Functions taken purely by score before layer backfill
    pub top_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Flowchart direction (TD, LR, BT, RL)
    pub direction: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        let ignored_directory_names = [
            "node_modules",
            "dist",
            "build",
            "out",
            "target",
            "vendor",
            "coverage",
            "__pycache__",
            "venv",
            "env",
            "bin",
            "obj",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        Self {
            ignored_directory_names,
            ignore_dot_prefixed: true,
            max_depth: 5,
            max_file_size: 1024 * 1024, // 1MB
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            selection_cap: 12,
            top_k: 8,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            direction: "TD".to_string(),
        }
    }
}

impl Default for AugmentationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_ms: 30_000,
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            base_url: None,
            max_tokens: Some(2000),
            temperature: Some(0.2),
        }
    }
}

impl AugmentationConfig {
    /// Configured key, or the one from the environment
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()))
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| ArchflowError::Toml(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ArchflowError::Toml(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => {
                if p.as_ref().exists() {
                    Self::load(p)
                } else {
                    Ok(Self::default())
                }
            }
            None => {
                let candidates = ["Archflow.toml", "archflow.toml", ".archflow.toml"];

                for candidate in &candidates {
                    if Path::new(candidate).exists() {
                        return Self::load(candidate);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    /// Reject settings the selector cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.selection.selection_cap == 0 {
            return Err(ArchflowError::Config(
                "selection.selection_cap must be at least 1".to_string(),
            ));
        }
        if self.selection.top_k > self.selection.selection_cap {
            return Err(ArchflowError::Config(format!(
                "selection.top_k ({}) exceeds selection.selection_cap ({})",
                self.selection.top_k, self.selection.selection_cap
            )));
        }
        if !matches!(self.output.direction.as_str(), "TD" | "TB" | "LR" | "BT" | "RL") {
            return Err(ArchflowError::Config(format!(
                "unsupported flowchart direction: {}",
                self.output.direction
            )));
        }
        Ok(())
    }
}
