//! Configuration management
//!
//! This module handles loading, validation, and management of the engine
//! configuration. Configuration is stored in TOML format at
//! ~/.shield/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Transcript archive directory, log level
//! - **llm**: Completion and embedding model endpoints
//! - **billing**: Billing platform base URL
//! - **telephony**: Call agent identity, polling, simulation settings
//! - **knowledge**: Vector-index endpoint and retrieval depth
//! - **evidence**: Submission mode and field length cap
//! - **dispatch**: Worker-pool sizing
//!
//! API keys are never stored in the config file; collaborator clients read
//! them from environment variables (`ANTHROPIC_API_KEY`, `OPENAI_API_KEY`,
//! `STRIPE_SECRET_KEY`, `ELEVENLABS_API_KEY`, `PINECONE_API_KEY`).
//!
//! # Path Expansion
//!
//! The configuration system expands ~ to the user's home directory and
//! creates the transcript directory if it doesn't exist.

use sdk::errors::DisputeError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
///
/// Represents the complete engine configuration loaded from
/// ~/.shield/config.toml. Every section has sensible defaults so a missing
/// file yields a working test-mode setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Language-model endpoints
    #[serde(default)]
    pub llm: LlmConfig,

    /// Billing platform settings
    #[serde(default)]
    pub billing: BillingConfig,

    /// Telephony platform settings
    #[serde(default)]
    pub telephony: TelephonyConfig,

    /// Knowledge retrieval settings
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Evidence submission settings
    #[serde(default)]
    pub evidence: EvidenceConfig,

    /// Worker-pool settings
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Directory for archived transcripts (supports ~ expansion)
    #[serde(default = "default_transcript_dir")]
    pub transcript_dir: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            transcript_dir: default_transcript_dir(),
            log_level: default_log_level(),
        }
    }
}

/// Language-model endpoints
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmConfig {
    /// Completion model settings
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// Embedding model settings
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
}

/// Completion model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// Base URL for the messages API
    #[serde(default = "default_anthropic_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_anthropic_model")]
    pub model: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: default_anthropic_base_url(),
            model: default_anthropic_model(),
        }
    }
}

/// Embedding model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    /// Base URL for the embeddings API
    #[serde(default = "default_embeddings_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_embeddings_model")]
    pub model: String,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            base_url: default_embeddings_base_url(),
            model: default_embeddings_model(),
        }
    }
}

/// Billing platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Base URL for the billing API
    #[serde(default = "default_billing_base_url")]
    pub base_url: String,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            base_url: default_billing_base_url(),
        }
    }
}

/// Telephony platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelephonyConfig {
    /// Base URL for the voice-agent API
    #[serde(default = "default_telephony_base_url")]
    pub base_url: String,

    /// Voice agent id used for outbound calls
    #[serde(default)]
    pub agent_id: String,

    /// Outbound phone number id registered with the platform
    #[serde(default)]
    pub phone_number_id: String,

    /// Seconds between call-status polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Maximum seconds to wait for a call to reach a terminal state
    #[serde(default = "default_completion_timeout")]
    pub completion_timeout_secs: u64,

    /// Dial this number instead of the one on the billing record
    #[serde(default)]
    pub phone_override: Option<String>,

    /// Run a deterministic scripted call instead of dialing out
    #[serde(default)]
    pub simulate: bool,

    /// Settle delay before the scripted transcript is produced
    #[serde(default = "default_simulate_settle")]
    pub simulate_settle_secs: u64,
}

impl Default for TelephonyConfig {
    fn default() -> Self {
        Self {
            base_url: default_telephony_base_url(),
            agent_id: String::new(),
            phone_number_id: String::new(),
            poll_interval_secs: default_poll_interval(),
            completion_timeout_secs: default_completion_timeout(),
            phone_override: None,
            simulate: false,
            simulate_settle_secs: default_simulate_settle(),
        }
    }
}

/// Knowledge retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Vector-index query endpoint (empty disables retrieval)
    #[serde(default)]
    pub index_url: String,

    /// Number of matches to retrieve per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            index_url: String::new(),
            top_k: default_top_k(),
        }
    }
}

/// Evidence submission configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceConfig {
    /// Submit evidence to the bank immediately instead of staging it
    #[serde(default)]
    pub submit_immediately: bool,

    /// Maximum characters per generated evidence field
    #[serde(default = "default_max_field_chars")]
    pub max_field_chars: usize,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            submit_immediately: false,
            max_field_chars: default_max_field_chars(),
        }
    }
}

/// Worker-pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Number of pipeline workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Bounded queue capacity; submissions beyond this are rejected
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

// Default value functions
fn default_transcript_dir() -> PathBuf {
    PathBuf::from("~/.shield/transcripts")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_anthropic_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_embeddings_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_embeddings_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_billing_base_url() -> String {
    "https://api.stripe.com".to_string()
}

fn default_telephony_base_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_poll_interval() -> u64 {
    2
}

fn default_completion_timeout() -> u64 {
    600
}

fn default_simulate_settle() -> u64 {
    5
}

fn default_top_k() -> usize {
    10
}

fn default_max_field_chars() -> usize {
    20_000
}

fn default_workers() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    32
}

impl Default for Config {
    fn default() -> Self {
        Self {
            core: CoreConfig::default(),
            llm: LlmConfig::default(),
            billing: BillingConfig::default(),
            telephony: TelephonyConfig::default(),
            knowledge: KnowledgeConfig::default(),
            evidence: EvidenceConfig::default(),
            dispatch: DispatchConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.shield/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default one.
    /// Validates the configuration after loading.
    pub fn load_or_create() -> Result<Self, DisputeError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, DisputeError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| DisputeError::Config(format!("failed to read config file: {e}")))?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| DisputeError::Config(format!("failed to parse config: {e}")))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save it to `path`
    fn create_default(path: &Path) -> Result<Self, DisputeError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                DisputeError::Config(format!("failed to create config directory: {e}"))
            })?;
        }

        let mut config = Self::default();
        config.validate_and_process()?;

        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| DisputeError::Config(format!("failed to serialize config: {e}")))?;

        fs::write(path, toml_string)
            .map_err(|e| DisputeError::Config(format!("failed to write config file: {e}")))?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.shield/config.toml)
    fn default_config_path() -> Result<PathBuf, DisputeError> {
        let home = dirs::home_dir()
            .ok_or_else(|| DisputeError::Config("could not determine home directory".into()))?;

        Ok(home.join(".shield").join("config.toml"))
    }

    /// Validate fields, expand ~ in the transcript path, and create the
    /// transcript directory if it doesn't exist.
    fn validate_and_process(&mut self) -> Result<(), DisputeError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(DisputeError::Config(format!(
                "invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if self.telephony.poll_interval_secs == 0 {
            return Err(DisputeError::Config(
                "poll_interval_secs must be at least 1".into(),
            ));
        }

        if self.telephony.completion_timeout_secs < self.telephony.poll_interval_secs {
            return Err(DisputeError::Config(
                "completion_timeout_secs must not be smaller than poll_interval_secs".into(),
            ));
        }

        if self.knowledge.top_k == 0 {
            return Err(DisputeError::Config("top_k must be at least 1".into()));
        }

        if self.dispatch.workers == 0 || self.dispatch.queue_capacity == 0 {
            return Err(DisputeError::Config(
                "dispatch workers and queue_capacity must be at least 1".into(),
            ));
        }

        self.core.transcript_dir = expand_tilde(&self.core.transcript_dir)?;
        fs::create_dir_all(&self.core.transcript_dir).map_err(|e| {
            DisputeError::Config(format!("failed to create transcript directory: {e}"))
        })?;

        Ok(())
    }
}

/// Expand a leading ~ to the user's home directory
fn expand_tilde(path: &Path) -> Result<PathBuf, DisputeError> {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| DisputeError::Config("could not determine home directory".into()))?;
        Ok(home.join(rest))
    } else {
        Ok(path.to_path_buf())
    }
}
