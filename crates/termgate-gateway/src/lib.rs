//! HTTP gateway for TermGate.
//!
//! A single dispatcher endpoint routes action-tagged JSON requests
//! through three gates — method, shape/auth, authorization — before any
//! file or command effect runs. The chat proxy collaborator hangs off
//! the same router but stays outside the authorization core.

pub mod proxy;
pub mod routes;
pub mod server;

pub use server::{AppState, build_router, start};
