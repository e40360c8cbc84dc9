//! The immutable allowlist policy.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use termgate_core::config::PolicyConfig;
use termgate_core::error::{Result, TermGateError};

/// Validated, immutable allowlist policy.
///
/// Constructed once at process start from [`PolicyConfig`] and shared by
/// reference. Roots are canonicalized here so authorization checks only
/// ever compare canonical paths. No component may extend the allowlists
/// at runtime.
#[derive(Debug)]
pub struct Policy {
    allowed_roots: Vec<PathBuf>,
    allowed_command_prefixes: Vec<String>,
    allowed_write_extensions: HashSet<String>,
    command_timeout: Duration,
    max_output_bytes: usize,
}

impl Policy {
    /// Validate config and build the policy.
    ///
    /// Fails with a `Config` error if a root is not absolute or does not
    /// resolve, if a command prefix is blank, or if the command list is
    /// empty without the explicit `deny_all_commands` opt-in.
    pub fn from_config(config: &PolicyConfig) -> Result<Self> {
        let mut allowed_roots = Vec::with_capacity(config.allowed_roots.len());
        for raw in &config.allowed_roots {
            let expanded = shellexpand::tilde(raw).to_string();
            let path = PathBuf::from(&expanded);
            if !path.is_absolute() {
                return Err(TermGateError::Config(format!(
                    "allowed root is not an absolute path: {raw}"
                )));
            }
            let canonical = path.canonicalize().map_err(|e| {
                TermGateError::Config(format!("allowed root does not resolve: {raw}: {e}"))
            })?;
            allowed_roots.push(canonical);
        }

        if config.allowed_commands.is_empty() && !config.deny_all_commands {
            return Err(TermGateError::Config(
                "allowed_commands is empty; set deny_all_commands = true to allow no commands"
                    .into(),
            ));
        }
        if config.deny_all_commands && !config.allowed_commands.is_empty() {
            return Err(TermGateError::Config(
                "deny_all_commands is set but allowed_commands is non-empty".into(),
            ));
        }
        for prefix in &config.allowed_commands {
            if prefix.trim().is_empty() {
                return Err(TermGateError::Config(
                    "allowed_commands contains a blank entry".into(),
                ));
            }
        }

        if config.command_timeout_ms == 0 {
            return Err(TermGateError::Config(
                "command_timeout_ms must be greater than zero".into(),
            ));
        }
        if config.max_output_bytes == 0 {
            return Err(TermGateError::Config(
                "max_output_bytes must be greater than zero".into(),
            ));
        }

        let allowed_write_extensions = config
            .allowed_write_extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect();

        Ok(Self {
            allowed_roots,
            allowed_command_prefixes: config.allowed_commands.clone(),
            allowed_write_extensions,
            command_timeout: Duration::from_millis(config.command_timeout_ms),
            max_output_bytes: config.max_output_bytes,
        })
    }

    /// Canonical allowed root directories.
    pub fn allowed_roots(&self) -> &[PathBuf] {
        &self.allowed_roots
    }

    /// Command prefixes in match order.
    pub fn command_prefixes(&self) -> &[String] {
        &self.allowed_command_prefixes
    }

    /// Whether `ext` (without dot, any case) is writable.
    pub fn write_extension_allowed(&self, ext: &str) -> bool {
        self.allowed_write_extensions
            .contains(&ext.to_ascii_lowercase())
    }

    /// Wall-clock budget for a single command.
    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    /// Per-stream capture cap for command output.
    pub fn max_output_bytes(&self) -> usize {
        self.max_output_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config(root: &std::path::Path) -> PolicyConfig {
        PolicyConfig {
            allowed_roots: vec![root.to_string_lossy().into_owned()],
            allowed_commands: vec!["ls".into(), "git status".into()],
            ..PolicyConfig::default()
        }
    }

    #[test]
    fn test_valid_config_builds() {
        let dir = tempfile::tempdir().unwrap();
        let policy = Policy::from_config(&base_config(dir.path())).unwrap();
        assert_eq!(policy.allowed_roots().len(), 1);
        assert!(policy.allowed_roots()[0].is_absolute());
        assert_eq!(policy.command_prefixes().len(), 2);
        assert!(policy.write_extension_allowed("md"));
        assert!(policy.write_extension_allowed("MD"));
        assert!(!policy.write_extension_allowed("sh"));
    }

    #[test]
    fn test_relative_root_rejected() {
        let cfg = PolicyConfig {
            allowed_roots: vec!["relative/dir".into()],
            allowed_commands: vec!["ls".into()],
            ..PolicyConfig::default()
        };
        assert!(matches!(
            Policy::from_config(&cfg),
            Err(TermGateError::Config(_))
        ));
    }

    #[test]
    fn test_empty_commands_needs_explicit_optin() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = base_config(dir.path());
        cfg.allowed_commands.clear();
        assert!(matches!(
            Policy::from_config(&cfg),
            Err(TermGateError::Config(_))
        ));

        cfg.deny_all_commands = true;
        let policy = Policy::from_config(&cfg).unwrap();
        assert!(policy.command_prefixes().is_empty());
    }

    #[test]
    fn test_deny_all_with_commands_is_contradiction() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = base_config(dir.path());
        cfg.deny_all_commands = true;
        assert!(matches!(
            Policy::from_config(&cfg),
            Err(TermGateError::Config(_))
        ));
    }

    #[test]
    fn test_zero_execution_limits_rejected() {
        let dir = tempfile::tempdir().unwrap();

        let mut cfg = base_config(dir.path());
        cfg.command_timeout_ms = 0;
        assert!(matches!(
            Policy::from_config(&cfg),
            Err(TermGateError::Config(_))
        ));

        let mut cfg = base_config(dir.path());
        cfg.max_output_bytes = 0;
        assert!(matches!(
            Policy::from_config(&cfg),
            Err(TermGateError::Config(_))
        ));
    }

    #[test]
    fn test_extensions_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = base_config(dir.path());
        cfg.allowed_write_extensions = vec![".TOML".into()];
        let policy = Policy::from_config(&cfg).unwrap();
        assert!(policy.write_extension_allowed("toml"));
    }
}
