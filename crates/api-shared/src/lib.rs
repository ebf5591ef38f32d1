//! # API Shared
//!
//! Shared utilities and definitions for the MedChat APIs.
//!
//! Contains:
//! - JSON wire types for the HTTP API (`wire` module)
//! - Shared services like `HealthService`
//! - Startup configuration loading (usable by every binary)
//!
//! Used by `api-rest`, `api-telegram` and the `medchat-run` binary.

pub mod health;
pub mod startup;
pub mod wire;

pub use health::HealthService;
pub use startup::{load_core_config, rest_addr_from_env_value, DEFAULT_REST_ADDR};
pub use wire::*;
