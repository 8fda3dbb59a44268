use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::types::AeadAlgorithm;

/// Default container chunk size: 4 MiB
pub const DEFAULT_CHUNK_SIZE: u32 = 4 * 1024 * 1024;

/// Largest chunk size a container may declare: 64 MiB
pub const MAX_CHUNK_SIZE: u32 = 64 * 1024 * 1024;

/// Longest session TTL or expiry check interval accepted: 365 days
pub const MAX_SESSION_SECS: u64 = 365 * 24 * 60 * 60;

/// Top-level engine configuration (loaded from ocz.toml)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OczConfig {
    pub container: ContainerConfig,
    pub session: SessionConfig,
}

/// Container encoding settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Plaintext bytes per chunk (default: 4 MiB)
    pub chunk_size: u32,
    /// Chunk cipher (default: AES-256-GCM)
    pub algorithm: AeadAlgorithm,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            algorithm: AeadAlgorithm::default(),
        }
    }
}

/// Session key cache settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Idle timeout in seconds; activity slides it forward (default: 1800)
    pub ttl_secs: u64,
    /// How often the background watcher looks for an expired session (default: 30)
    pub expiry_check_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 30 * 60,
            expiry_check_interval_secs: 30,
        }
    }
}

impl SessionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn expiry_check_interval(&self) -> Duration {
        Duration::from_secs(self.expiry_check_interval_secs)
    }
}

impl OczConfig {
    /// Load configuration from a TOML file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!("config file not found: {}  (using defaults)", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("loading config {}", path.display()))
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: OczConfig = toml::from_str(content).context("parsing TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.container.chunk_size == 0 || self.container.chunk_size > MAX_CHUNK_SIZE {
            anyhow::bail!(
                "container.chunk_size must be between 1 and {MAX_CHUNK_SIZE}, got {}",
                self.container.chunk_size
            );
        }
        if self.session.ttl_secs == 0 || self.session.ttl_secs > MAX_SESSION_SECS {
            anyhow::bail!(
                "session.ttl_secs must be between 1 and {MAX_SESSION_SECS}, got {}",
                self.session.ttl_secs
            );
        }
        if self.session.expiry_check_interval_secs == 0
            || self.session.expiry_check_interval_secs > MAX_SESSION_SECS
        {
            anyhow::bail!(
                "session.expiry_check_interval_secs must be between 1 and {MAX_SESSION_SECS}, got {}",
                self.session.expiry_check_interval_secs
            );
        }
        Ok(())
    }
}
