//! Core domain types
//!
//! These types are shared between the build pipeline (which produces them),
//! the HTTP server (which exposes them) and the client (which consumes them).

pub mod bundle;
pub mod pack;
pub mod result;
pub mod run;
