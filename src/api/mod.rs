//! API Module
//!
//! This module handles the HTTP API for submitting batches and reading
//! results: submit, progress, cancel, fetch by id, and token search.

mod server;
pub use server::{AppState, Server, router};
