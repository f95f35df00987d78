use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::language_utils::{is_auto, validate_language_code, AUTO_LANGUAGE};
use crate::translation::grouping::GroupLimits;
use crate::translation::orchestrator::RunSettings;
use crate::translation::tuning::TuningParams;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and resolving it against auto-tuned parameters.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Source language code (ISO), or `auto`
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translate with combined group requests
    #[serde(default = "default_true")]
    pub deep_grouping: bool,

    /// Character budget per group; auto-tuned when absent
    #[serde(default)]
    pub max_chars: Option<usize>,

    /// Maximum cues per group; auto-tuned when absent
    #[serde(default)]
    pub max_blocks: Option<usize>,

    /// Largest gap (ms) inside a group; auto-tuned when absent
    #[serde(default)]
    pub max_gap_ms: Option<u64>,

    /// Maximum provider calls in flight; auto-tuned when absent
    #[serde(default)]
    pub concurrency: Option<usize>,

    /// Keep translations in the persistent cache across runs
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Location of the persistent cache; platform data dir when absent
    #[serde(default)]
    pub cache_path: Option<PathBuf>,

    /// Translate groups from the file's dominant language when the source is `auto`
    #[serde(default = "default_true")]
    pub use_dominant_for_group: bool,

    /// Allow combined requests with an `auto` source
    #[serde(default = "default_true")]
    pub allow_group_auto: bool,

    /// Cached fraction of a group at or above which it is translated cue by cue
    #[serde(default = "default_cache_group_threshold")]
    pub cache_group_threshold: f64,

    /// Larger groups and moderate concurrency
    #[serde(default)]
    pub fast_mode: bool,

    /// Provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Provider configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProviderConfig {
    // @field: Service URL
    #[serde(default = "default_ollama_endpoint")]
    pub endpoint: String,

    // @field: Model name
    #[serde(default = "default_ollama_model")]
    pub model: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_ollama_endpoint(),
            model: default_ollama_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

/// Fast mode floors and cap
const FAST_MIN_CHARS: usize = 2200;
const FAST_MIN_BLOCKS: usize = 12;
const FAST_MIN_GAP_MS: u64 = 2500;
const FAST_MAX_CONCURRENCY: usize = 6;

fn default_source_language() -> String {
    AUTO_LANGUAGE.to_string()
}

fn default_target_language() -> String {
    "fr".to_string()
}

fn default_true() -> bool {
    true
}

fn default_cache_group_threshold() -> f64 {
    0.6
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:3b".to_string()
}

impl Config {
    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .context(format!("Failed to open config file: {}", path.display()))?;

        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;

        std::fs::write(path, config_json)
            .context(format!("Failed to write config to file: {}", path.display()))?;

        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        validate_language_code(&self.source_language)?;
        if is_auto(&self.target_language) {
            return Err(anyhow!("Target language cannot be auto"));
        }
        validate_language_code(&self.target_language)?;

        if !(0.0..=1.0).contains(&self.cache_group_threshold) {
            return Err(anyhow!(
                "cache_group_threshold must be between 0 and 1, got {}",
                self.cache_group_threshold
            ));
        }

        if self.max_chars == Some(0) {
            return Err(anyhow!("max_chars must be greater than 0"));
        }
        if self.max_blocks == Some(0) {
            return Err(anyhow!("max_blocks must be greater than 0"));
        }
        if self.max_gap_ms == Some(0) {
            return Err(anyhow!("max_gap_ms must be greater than 0"));
        }
        if self.concurrency == Some(0) {
            return Err(anyhow!("concurrency must be greater than 0"));
        }

        if self.provider.endpoint.trim().is_empty() {
            return Err(anyhow!("Provider endpoint is required"));
        }
        if self.provider.timeout_secs == 0 {
            return Err(anyhow!("Provider timeout must be greater than 0"));
        }

        Ok(())
    }

    /// Merge explicit settings over tuned parameters, then apply fast mode
    pub fn resolve(&self, params: &TuningParams) -> RunSettings {
        let mut max_chars = self.max_chars.unwrap_or(params.max_chars);
        let mut max_blocks = self.max_blocks.unwrap_or(params.max_blocks);
        let mut max_gap_ms = self.max_gap_ms.unwrap_or(params.max_gap_ms);
        let mut concurrency = self.concurrency.unwrap_or(if self.deep_grouping {
            params.group_concurrency
        } else {
            params.block_concurrency
        });

        if self.fast_mode {
            max_chars = max_chars.max(FAST_MIN_CHARS);
            max_blocks = max_blocks.max(FAST_MIN_BLOCKS);
            max_gap_ms = max_gap_ms.max(FAST_MIN_GAP_MS);
            concurrency = concurrency.min(FAST_MAX_CONCURRENCY);
        }

        RunSettings {
            deep_grouping: self.deep_grouping,
            limits: GroupLimits {
                max_chars,
                max_blocks,
                max_gap_ms,
            },
            concurrency,
            use_dominant_for_group: self.use_dominant_for_group,
            allow_group_auto: self.allow_group_auto,
            cache_group_threshold: self.cache_group_threshold,
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            deep_grouping: true,
            max_chars: None,
            max_blocks: None,
            max_gap_ms: None,
            concurrency: None,
            cache_enabled: true,
            cache_path: None,
            use_dominant_for_group: true,
            allow_group_auto: true,
            cache_group_threshold: default_cache_group_threshold(),
            fast_mode: false,
            provider: ProviderConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
