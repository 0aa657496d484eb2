//! batchsign core - configuration and input resolution
//!
//! This crate provides the tool-level configuration (SDK location, tool
//! names, retry limits) and the key-value input resolver the signing run
//! reads its per-invocation values from.

pub mod config;
pub mod error;
pub mod inputs;

pub use config::Config;
pub use error::{ConfigError, CoreError, InputError, Result};
pub use inputs::{EnvInputs, InputResolver, LayeredInputs, MapInputs};
