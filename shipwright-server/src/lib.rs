//! Shipwright Server
//!
//! HTTP API over the build pipeline. The binary in `main.rs` wires the
//! environment configuration, the GitHub Actions client and the router
//! together; the library half exists so the router can be driven in tests.

pub mod api;
pub mod config;
