//! Path and command allowlist authorization.
//!
//! Decides, for every requested file path and shell command, whether the
//! operation is permitted — before any I/O or process execution occurs.
//! The `Policy` value is immutable after construction and safe to share
//! across requests.

pub mod commands;
pub mod paths;
pub mod policy;

pub use commands::{CommandDecision, CommandDenyReason, authorize_command};
pub use paths::{AccessMode, PathDecision, PathDenyReason, authorize_path};
pub use policy::Policy;
