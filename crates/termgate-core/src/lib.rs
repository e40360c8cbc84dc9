//! TermGate core — configuration and error taxonomy shared by all crates.

pub mod config;
pub mod error;

pub use config::TermGateConfig;
pub use error::{Result, TermGateError};
