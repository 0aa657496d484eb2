//! Configuration validation

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::types::Config;

/// Upper bound on sign attempts; backoff grows linearly so this caps a
/// single file at roughly half an hour of waiting.
pub const MAX_ATTEMPTS_LIMIT: u32 = 60;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_tool(config)?;
    validate_certificate(config)?;
    validate_signing(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn validate_tool(config: &Config) -> Result<()> {
    if config.tool.name.is_empty() {
        return Err(invalid("tool.name", "tool name cannot be empty"));
    }

    if config.tool.arch.is_empty() {
        return Err(invalid("tool.arch", "architecture cannot be empty"));
    }

    Ok(())
}

fn validate_certificate(config: &Config) -> Result<()> {
    if config.certificate.import_tool.is_empty() {
        return Err(invalid(
            "certificate.import_tool",
            "import tool cannot be empty",
        ));
    }

    Ok(())
}

fn validate_signing(config: &Config) -> Result<()> {
    let attempts = config.signing.max_attempts;
    if attempts == 0 || attempts > MAX_ATTEMPTS_LIMIT {
        return Err(invalid(
            "signing.max_attempts",
            &format!("must be between 1 and {}", MAX_ATTEMPTS_LIMIT),
        ));
    }

    let url = &config.signing.default_timestamp_url;
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(invalid(
            "signing.default_timestamp_url",
            "must be an http:// or https:// URL",
        ));
    }

    Ok(())
}

fn invalid(field: &str, message: &str) -> crate::error::CoreError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_empty_tool_name() {
        let mut config = Config::default();
        config.tool.name = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_attempt_bounds() {
        let mut config = Config::default();
        config.signing.max_attempts = 0;
        assert!(validate_config(&config).is_err());

        config.signing.max_attempts = MAX_ATTEMPTS_LIMIT + 1;
        assert!(validate_config(&config).is_err());

        config.signing.max_attempts = MAX_ATTEMPTS_LIMIT;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_timestamp_url_scheme() {
        let mut config = Config::default();
        config.signing.default_timestamp_url = "timestamp.digicert.com".to_string();
        assert!(validate_config(&config).is_err());
    }
}
