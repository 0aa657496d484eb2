//! Default configuration values

use std::path::PathBuf;

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "batchsign.toml";

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "batchsign.yaml";

/// Installed Windows 10 SDK binaries
pub const DEFAULT_SDK_ROOT: &str = "C:/Program Files (x86)/Windows Kits/10/bin/";

/// Architecture subdirectory holding the signing tool
pub const DEFAULT_TOOL_ARCH: &str = "x86";

/// Signing tool binary
pub const DEFAULT_TOOL_NAME: &str = "signtool.exe";

/// Certificate store import utility
pub const DEFAULT_IMPORT_TOOL: &str = "certutil";

/// File name of the materialized certificate inside the temp directory
pub const CERTIFICATE_FILE_NAME: &str = "certificate.pfx";

/// Timestamp authority
pub const DEFAULT_TIMESTAMP_URL: &str = "http://timestamp.digicert.com";

/// Sign attempts per file
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        DEFAULT_CONFIG_YAML,
        ".batchsign.toml",
        ".batchsign.yaml",
    ]
}

/// Certificate path inside the host temp directory
pub fn default_certificate_path() -> PathBuf {
    std::env::temp_dir().join(CERTIFICATE_FILE_NAME)
}
