//! # MedGraph Application Library
//!
//! The HTTP service, CLI and configuration layers of the `medgraph` binary,
//! exposed as a library so integration tests can drive them directly.

pub mod api;
pub mod cli;
pub mod config;
