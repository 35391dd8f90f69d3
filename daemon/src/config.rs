//! Daemon configuration with TOML file support.

use serde::{Deserialize, Serialize};
use stakepool_engine::PoolTerms;
use stakepool_types::amount::decimal_string;
use stakepool_types::{AccountId, TokenId};
use stakepool_utils::LogFormat;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Opening balance in the in-process token ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintConfig {
    pub token: TokenId,
    pub account: AccountId,
    #[serde(with = "decimal_string")]
    pub amount: u128,
    /// Also let the escrow pull the minted amount.
    #[serde(default = "default_true")]
    pub approve: bool,
}

/// Reward funds moved into escrow at startup; `from` must be an admin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingConfig {
    pub from: AccountId,
    pub token: TokenId,
    #[serde(with = "decimal_string")]
    pub amount: u128,
}

/// Configuration for the stakepool daemon.
///
/// Loaded from a TOML file via [`DaemonConfig::from_toml_file`]; every field
/// has a default so an empty file is valid.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Interface the RPC server binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Account holding staked principal and reward funds.
    #[serde(default = "default_escrow_account")]
    pub escrow_account: AccountId,

    /// Accounts allowed to create and close pools. The first one creates the
    /// pools listed below. Required once pools or reward funding are listed.
    #[serde(default)]
    pub admins: Vec<AccountId>,

    #[serde(default)]
    pub mint: Vec<MintConfig>,

    #[serde(default)]
    pub reward_funding: Vec<FundingConfig>,

    /// Pools created at startup, in order. Ids follow list position.
    #[serde(default)]
    pub pools: Vec<PoolTerms>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_true() -> bool {
    true
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_rpc_port() -> u16 {
    7080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_escrow_account() -> AccountId {
    AccountId::new("escrow")
}

// ── Impl ───────────────────────────────────────────────────────────────

impl DaemonConfig {
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Check what serde cannot: identifier syntax, and an explicit admin set
    /// whenever pools or reward funding are configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |e: stakepool_types::TypesError| ConfigError::Invalid(e.to_string());
        if self.admins.is_empty() && !(self.pools.is_empty() && self.reward_funding.is_empty()) {
            return Err(ConfigError::Invalid(
                "admins must be set when pools or reward funding are configured".into(),
            ));
        }
        AccountId::parse(self.escrow_account.as_str()).map_err(invalid)?;
        for admin in &self.admins {
            AccountId::parse(admin.as_str()).map_err(invalid)?;
        }
        for m in &self.mint {
            TokenId::parse(m.token.as_str()).map_err(invalid)?;
            AccountId::parse(m.account.as_str()).map_err(invalid)?;
        }
        for f in &self.reward_funding {
            TokenId::parse(f.token.as_str()).map_err(invalid)?;
            AccountId::parse(f.from.as_str()).map_err(invalid)?;
        }
        for (i, pool) in self.pools.iter().enumerate() {
            for token in [&pool.stake_token, &pool.reward_token] {
                TokenId::parse(token.as_str())
                    .map_err(|e| ConfigError::Invalid(format!("pool #{i}: {e}")))?;
            }
        }
        Ok(())
    }

    /// The account that creates the configured pools.
    pub fn pool_creator(&self) -> Result<&AccountId, ConfigError> {
        self.admins
            .first()
            .ok_or_else(|| ConfigError::Invalid("at least one admin is required".into()))
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            rpc_port: default_rpc_port(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            escrow_account: default_escrow_account(),
            admins: Vec::new(),
            mint: Vec::new(),
            reward_funding: Vec::new(),
            pools: Vec::new(),
        }
    }
}
