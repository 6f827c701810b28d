//! Configuration for the registry client
//!
//! Loaded from a TOML file, then overridden by environment variables
//! (a `.env` file is honored). Every field has a default, so an empty file
//! or no file at all yields a devnet-ready configuration.

use crate::constants::DEFAULT_PROGRAM_ID;
use crate::rpc::ConfirmationPolicy;
use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const ENV_RPC_URL: &str = "AGENT_REGISTRY_RPC_URL";
pub const ENV_PROGRAM_ID: &str = "AGENT_REGISTRY_PROGRAM_ID";
pub const ENV_KEYPAIR: &str = "AGENT_REGISTRY_KEYPAIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid program id {0}")]
    InvalidProgramId(String),

    #[error("Invalid commitment level {0} (expected processed, confirmed or finalized)")]
    InvalidCommitment(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub rpc: RpcConfig,

    #[serde(default)]
    pub program: ProgramConfig,

    #[serde(default)]
    pub wallet: WalletConfig,

    #[serde(default)]
    pub confirmation: ConfirmationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_url")]
    pub url: String,

    /// processed | confirmed | finalized
    #[serde(default = "default_commitment")]
    pub commitment: String,

    /// Request timeout in seconds
    #[serde(default = "default_rpc_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgramConfig {
    #[serde(default = "default_program_id")]
    pub program_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WalletConfig {
    /// Path to keypair file
    #[serde(default = "default_keypair_path")]
    pub keypair_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfirmationConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,

    /// Hard limit on confirmation polling
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
}

// Default value functions
fn default_rpc_url() -> String { "https://api.devnet.solana.com".to_string() }
fn default_commitment() -> String { "confirmed".to_string() }
fn default_rpc_timeout() -> u64 { 30 }
fn default_program_id() -> String { DEFAULT_PROGRAM_ID.to_string() }
fn default_keypair_path() -> String { "~/.config/solana/id.json".to_string() }
fn default_max_attempts() -> u32 { 30 }
fn default_base_delay_ms() -> u64 { 500 }
fn default_max_delay_ms() -> u64 { 4_000 }
fn default_multiplier() -> f64 { 1.5 }
fn default_jitter_factor() -> f64 { 0.1 }
fn default_deadline_secs() -> u64 { 60 }

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: default_rpc_url(),
            commitment: default_commitment(),
            timeout_secs: default_rpc_timeout(),
        }
    }
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            program_id: default_program_id(),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            keypair_path: default_keypair_path(),
        }
    }
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
            jitter_factor: default_jitter_factor(),
            deadline_secs: default_deadline_secs(),
        }
    }
}

impl Config {
    /// Parse TOML without touching the environment
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// File (if given) plus `.env` and process environment overrides, validated
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (normally the process environment)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_RPC_URL) {
            self.rpc.url = url;
        }
        if let Some(program_id) = lookup(ENV_PROGRAM_ID) {
            self.program.program_id = program_id;
        }
        if let Some(path) = lookup(ENV_KEYPAIR) {
            self.wallet.keypair_path = path;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.rpc.url.starts_with("http://") || self.rpc.url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "rpc.url",
                reason: format!("{} is not an http(s) URL", self.rpc.url),
            });
        }
        if self.rpc.timeout_secs == 0 {
            return Err(invalid("rpc.timeout_secs", "must be greater than 0"));
        }
        self.commitment()?;
        self.program_id()?;

        let c = &self.confirmation;
        if c.max_attempts == 0 {
            return Err(invalid("confirmation.max_attempts", "must be greater than 0"));
        }
        if c.base_delay_ms > c.max_delay_ms {
            return Err(invalid("confirmation.base_delay_ms", "must not exceed max_delay_ms"));
        }
        if !(c.multiplier.is_finite() && c.multiplier >= 1.0) {
            return Err(invalid("confirmation.multiplier", "must be at least 1.0"));
        }
        if !(0.0..=1.0).contains(&c.jitter_factor) {
            return Err(invalid("confirmation.jitter_factor", "must be within 0.0..=1.0"));
        }
        if c.deadline_secs == 0 {
            return Err(invalid("confirmation.deadline_secs", "must be greater than 0"));
        }
        Ok(())
    }

    pub fn program_id(&self) -> Result<Pubkey, ConfigError> {
        Pubkey::from_str(&self.program.program_id)
            .map_err(|_| ConfigError::InvalidProgramId(self.program.program_id.clone()))
    }

    pub fn commitment(&self) -> Result<CommitmentConfig, ConfigError> {
        match self.rpc.commitment.to_ascii_lowercase().as_str() {
            "processed" => Ok(CommitmentConfig::processed()),
            "confirmed" => Ok(CommitmentConfig::confirmed()),
            "finalized" => Ok(CommitmentConfig::finalized()),
            other => Err(ConfigError::InvalidCommitment(other.to_string())),
        }
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc.timeout_secs)
    }

    pub fn confirmation_policy(&self) -> ConfirmationPolicy {
        let c = &self.confirmation;
        ConfirmationPolicy {
            max_attempts: c.max_attempts,
            base_delay_ms: c.base_delay_ms,
            max_delay_ms: c.max_delay_ms,
            multiplier: c.multiplier,
            jitter_factor: c.jitter_factor,
            deadline: Duration::from_secs(c.deadline_secs),
        }
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}
