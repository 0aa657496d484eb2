//! Key-value inputs for a signing run
//!
//! Per-invocation values (folder, certificate, password, signing identity)
//! are read through an [`InputResolver`]. Values are trimmed and an unset key
//! reads as the empty string, which is how CI action inputs behave.

use std::collections::HashMap;

use crate::error::{InputError, Result};

/// Base64-encoded certificate bytes
pub const CERTIFICATE: &str = "certificate";
/// Certificate store import password
pub const PASSWORD: &str = "password";
/// Root directory to scan for signable files
pub const FOLDER: &str = "folder";
/// `"true"` to recurse into subdirectories
pub const RECURSIVE: &str = "recursive";
/// Timestamp authority URL
pub const TIMESTAMP_URL: &str = "timestampUrl";
/// SHA-1 thumbprint selector
pub const CERTIFICATE_SHA1: &str = "certificatesha1";
/// Certificate common-name selector
pub const CERTIFICATE_NAME: &str = "certificatename";
/// Signed description string
pub const DESCRIPTION: &str = "description";

/// Source of key-value inputs
pub trait InputResolver: Send + Sync {
    /// Raw value for a key, if set
    fn get(&self, key: &str) -> Option<String>;

    /// Trimmed value, empty when unset
    fn input(&self, key: &str) -> String {
        self.get(key)
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    /// Trimmed value that must not be empty
    fn required_input(&self, key: &str) -> Result<String> {
        let value = self.input(key);
        if value.is_empty() {
            return Err(InputError::Required(key.to_string()).into());
        }
        Ok(value)
    }

    /// `true` only for the literal `"true"`
    fn bool_input(&self, key: &str) -> bool {
        self.input(key) == "true"
    }
}

/// In-memory inputs
#[derive(Debug, Clone, Default)]
pub struct MapInputs {
    values: HashMap<String, String>,
}

impl MapInputs {
    /// Create an empty set of inputs
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Set a value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }
}

impl InputResolver for MapInputs {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Inputs read from `INPUT_<KEY>` environment variables
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvInputs;

impl EnvInputs {
    /// Create an environment-backed resolver
    pub fn new() -> Self {
        Self
    }

    /// Environment variable name for an input key
    pub fn variable_name(key: &str) -> String {
        format!("INPUT_{}", key.replace(' ', "_").to_uppercase())
    }
}

impl InputResolver for EnvInputs {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(Self::variable_name(key)).ok()
    }
}

/// First non-empty value across several resolvers
#[derive(Default)]
pub struct LayeredInputs {
    layers: Vec<Box<dyn InputResolver>>,
}

impl LayeredInputs {
    /// Create an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a lower-priority layer
    pub fn layer<R: InputResolver + 'static>(mut self, resolver: R) -> Self {
        self.layers.push(Box::new(resolver));
        self
    }
}

impl InputResolver for LayeredInputs {
    fn get(&self, key: &str) -> Option<String> {
        self.layers
            .iter()
            .filter_map(|layer| layer.get(key))
            .find(|v| !v.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_trims_and_defaults_to_empty() {
        let inputs = MapInputs::new().with(FOLDER, "  ./dist \n");
        assert_eq!(inputs.input(FOLDER), "./dist");
        assert_eq!(inputs.input(PASSWORD), "");
    }

    #[test]
    fn test_required_input() {
        let inputs = MapInputs::new().with(FOLDER, "   ");
        let err = inputs.required_input(FOLDER).unwrap_err();
        assert_eq!(err.to_string(), "Input required and not supplied: folder");

        let inputs = MapInputs::new().with(FOLDER, "out");
        assert_eq!(inputs.required_input(FOLDER).unwrap(), "out");
    }

    #[test]
    fn test_bool_input_is_literal_true() {
        assert!(MapInputs::new().with(RECURSIVE, "true").bool_input(RECURSIVE));
        assert!(!MapInputs::new().with(RECURSIVE, "TRUE").bool_input(RECURSIVE));
        assert!(!MapInputs::new().with(RECURSIVE, "yes").bool_input(RECURSIVE));
        assert!(!MapInputs::new().bool_input(RECURSIVE));
    }

    #[test]
    fn test_env_variable_name() {
        assert_eq!(EnvInputs::variable_name("timestampUrl"), "INPUT_TIMESTAMPURL");
        assert_eq!(EnvInputs::variable_name("some key"), "INPUT_SOME_KEY");
    }

    #[test]
    fn test_env_inputs() {
        std::env::set_var("INPUT_BATCHSIGN_ENV_PROBE", "value");
        assert_eq!(EnvInputs::new().input("batchsign env probe"), "value");
        assert_eq!(EnvInputs::new().get("batchsign env missing"), None);
    }

    #[test]
    fn test_layered_inputs_skip_empty() {
        let inputs = LayeredInputs::new()
            .layer(MapInputs::new().with(FOLDER, "").with(PASSWORD, "first"))
            .layer(MapInputs::new().with(FOLDER, "second").with(PASSWORD, "ignored"));

        assert_eq!(inputs.input(FOLDER), "second");
        assert_eq!(inputs.input(PASSWORD), "first");
        assert_eq!(inputs.input(DESCRIPTION), "");
    }
}
