//! Configuration file support for the signaling system.
//!
//! Every section and field is optional in the TOML file; missing values fall
//! back to the defaults below.

use crate::{CIRCUIT_K, MIN_CIRCUIT_K, TREE_DEPTH};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_MAX_PROOF_FILE_SIZE: u64 = 1024 * 1024;
const DEFAULT_MAX_ZK_PROOF_SIZE: usize = 512 * 1024;
const DEFAULT_TIMESTAMP_TOLERANCE_SECS: u64 = 300;
const DEFAULT_TIMESTAMP_MAX_AGE_SECS: u64 = 86400;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tree: TreeConfig,
    #[serde(default)]
    pub circuit: CircuitConfig,
    #[serde(default)]
    pub proof: ProofConfig,
    #[serde(default)]
    pub nullifiers: NullifierConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    #[serde(default = "default_tree_depth")]
    pub depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitConfig {
    #[serde(default = "default_circuit_k")]
    pub k: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofConfig {
    #[serde(default = "default_max_proof_file_size")]
    pub max_file_size: u64,
    #[serde(default = "default_max_zk_proof_size")]
    pub max_zk_proof_size: usize,
    #[serde(default = "default_proof_output_file")]
    pub output_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NullifierConfig {
    #[serde(default = "default_nullifier_log_file")]
    pub log_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "default_timestamp_tolerance_secs")]
    pub timestamp_tolerance_secs: u64,
    #[serde(default = "default_timestamp_max_age_secs")]
    pub timestamp_max_age_secs: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            depth: TREE_DEPTH,
        }
    }
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self { k: CIRCUIT_K }
    }
}

impl Default for ProofConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_PROOF_FILE_SIZE,
            max_zk_proof_size: DEFAULT_MAX_ZK_PROOF_SIZE,
            output_file: default_proof_output_file(),
        }
    }
}

impl Default for NullifierConfig {
    fn default() -> Self {
        Self {
            log_file: default_nullifier_log_file(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            timestamp_tolerance_secs: DEFAULT_TIMESTAMP_TOLERANCE_SECS,
            timestamp_max_age_secs: DEFAULT_TIMESTAMP_MAX_AGE_SECS,
        }
    }
}

fn default_tree_depth() -> usize {
    TREE_DEPTH
}

fn default_circuit_k() -> u32 {
    CIRCUIT_K
}

fn default_max_proof_file_size() -> u64 {
    DEFAULT_MAX_PROOF_FILE_SIZE
}

fn default_max_zk_proof_size() -> usize {
    DEFAULT_MAX_ZK_PROOF_SIZE
}

fn default_proof_output_file() -> PathBuf {
    PathBuf::from("signal_proof.json")
}

fn default_nullifier_log_file() -> PathBuf {
    PathBuf::from("nullifiers.txt")
}

fn default_timestamp_tolerance_secs() -> u64 {
    DEFAULT_TIMESTAMP_TOLERANCE_SECS
}

fn default_timestamp_max_age_secs() -> u64 {
    DEFAULT_TIMESTAMP_MAX_AGE_SECS
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn load_from_file_or_default(path: &PathBuf) -> Self {
        Self::load_from_file(path).unwrap_or_default()
    }

    pub fn save_to_file(&self, path: &PathBuf) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Rejects settings the compiled circuit cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.tree.depth != TREE_DEPTH {
            anyhow::bail!(
                "Tree depth {} is not supported, the circuit is compiled for depth {}",
                self.tree.depth,
                TREE_DEPTH
            );
        }

        if self.circuit.k < MIN_CIRCUIT_K {
            anyhow::bail!(
                "Circuit k={} is too small, at least {} is required",
                self.circuit.k,
                MIN_CIRCUIT_K
            );
        }

        if self.security.timestamp_max_age_secs == 0 {
            anyhow::bail!("timestamp_max_age_secs must be greater than zero");
        }

        Ok(())
    }
}
