//! Shipwright Core
//!
//! Core types shared by the Shipwright build service.
//!
//! This crate contains:
//! - Domain types: app bundles, remote CI runs, artifacts and build results
//! - DTOs: request/response bodies for the HTTP API

pub mod domain;
pub mod dto;
