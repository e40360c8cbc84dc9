//! Execution gateway — performs the effect after authorization.
//!
//! Nothing in this crate makes an authorization decision. Callers hand
//! in paths and command strings that already passed the policy checks;
//! this crate bounds and shapes the results.

pub mod fsops;
pub mod runner;

pub use fsops::{DirEntryInfo, EntryKind, SearchMatch};
pub use runner::{CommandOutcome, run_command};
