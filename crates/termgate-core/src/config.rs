//! TermGate configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, TermGateError};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TermGateConfig {
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
}

impl TermGateConfig {
    /// Load config from the default path (~/.termgate/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TermGateError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| TermGateError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".termgate")
            .join("config.toml")
    }
}

/// Allowlist policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Absolute directories under which all path operations are permitted.
    #[serde(default)]
    pub allowed_roots: Vec<String>,
    /// Literal command prefixes permitted for execution, in match order.
    #[serde(default)]
    pub allowed_commands: Vec<String>,
    /// Explicit opt-in for an empty command list ("allow nothing").
    #[serde(default)]
    pub deny_all_commands: bool,
    /// File extensions (without dot) permitted for writeFile.
    #[serde(default = "default_write_extensions")]
    pub allowed_write_extensions: Vec<String>,
    /// Wall-clock budget for a single command, in milliseconds.
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
    /// Per-stream stdout/stderr capture cap, in bytes.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

fn default_write_extensions() -> Vec<String> {
    ["txt", "md", "json", "js", "html", "css"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_command_timeout_ms() -> u64 {
    30_000
}
fn default_max_output_bytes() -> usize {
    64 * 1024
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            allowed_roots: Vec::new(),
            allowed_commands: Vec::new(),
            deny_all_commands: false,
            allowed_write_extensions: default_write_extensions(),
            command_timeout_ms: default_command_timeout_ms(),
            max_output_bytes: default_max_output_bytes(),
        }
    }
}

/// Gateway (HTTP server) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8787
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Chat proxy configuration (forwarding to a remote LLM API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub system_prompt: String,
}

fn default_endpoint() -> String {
    "https://api.anthropic.com/v1/messages".into()
}
fn default_model() -> String {
    "claude-3-5-sonnet-latest".into()
}
fn default_max_tokens() -> u32 {
    2048
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            system_prompt: String::new(),
        }
    }
}
