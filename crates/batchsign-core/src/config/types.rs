//! Configuration types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::defaults;

/// Main configuration for batchsign
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where to find the signing tool
    pub tool: ToolConfig,

    /// Certificate provisioning
    pub certificate: CertificateConfig,

    /// Sign command and retry behaviour
    pub signing: SigningConfig,
}

/// Signing tool discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Root directory holding one subdirectory per installed SDK version
    pub sdk_root: PathBuf,

    /// Architecture subdirectory below each SDK version
    pub arch: String,

    /// File name of the signing tool binary
    pub name: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            sdk_root: PathBuf::from(defaults::DEFAULT_SDK_ROOT),
            arch: defaults::DEFAULT_TOOL_ARCH.to_string(),
            name: defaults::DEFAULT_TOOL_NAME.to_string(),
        }
    }
}

/// Certificate provisioning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateConfig {
    /// Where the decoded certificate is written before import
    pub path: PathBuf,

    /// Store-import utility
    pub import_tool: String,
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            path: defaults::default_certificate_path(),
            import_tool: defaults::DEFAULT_IMPORT_TOOL.to_string(),
        }
    }
}

/// Sign command configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Timestamp authority used when no `timestampUrl` input is given
    pub default_timestamp_url: String,

    /// Sign attempts per file before the run is aborted
    pub max_attempts: u32,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            default_timestamp_url: defaults::DEFAULT_TIMESTAMP_URL.to_string(),
            max_attempts: defaults::DEFAULT_MAX_ATTEMPTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tool.name, "signtool.exe");
        assert_eq!(config.tool.arch, "x86");
        assert_eq!(config.certificate.import_tool, "certutil");
        assert_eq!(config.signing.max_attempts, 10);
        assert_eq!(
            config.signing.default_timestamp_url,
            "http://timestamp.digicert.com"
        );
        assert!(config.certificate.path.ends_with("certificate.pfx"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str("[signing]\nmax_attempts = 3").unwrap();
        assert_eq!(config.signing.max_attempts, 3);
        assert_eq!(config.tool.name, "signtool.exe");
    }
}
