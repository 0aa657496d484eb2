//! Certificate provisioning
//!
//! The certificate arrives base64-encoded through the inputs. It is written
//! to a fixed file and imported into the certificate store, after which the
//! signing tool can select it by thumbprint or subject name. Both steps
//! report failure as `false` plus a log line; neither returns an error.

use std::path::PathBuf;
use std::sync::Arc;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use batchsign_core::inputs::{self, InputResolver};
use batchsign_core::Config;
use tracing::{error, info, warn};

use crate::command::{CommandRunner, ShellCommand};

/// Standard alphabet, padding optional
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Writes the configured certificate to disk and imports it into the store
pub struct CertificateProvisioner {
    inputs: Arc<dyn InputResolver>,
    runner: Arc<dyn CommandRunner>,
    certificate_path: PathBuf,
    import_tool: String,
}

impl CertificateProvisioner {
    /// Create a provisioner writing to `certificate_path`
    pub fn new(
        inputs: Arc<dyn InputResolver>,
        runner: Arc<dyn CommandRunner>,
        certificate_path: impl Into<PathBuf>,
        import_tool: impl Into<String>,
    ) -> Self {
        Self {
            inputs,
            runner,
            certificate_path: certificate_path.into(),
            import_tool: import_tool.into(),
        }
    }

    /// Create a provisioner using the certificate settings from `config`
    pub fn from_config(
        config: &Config,
        inputs: Arc<dyn InputResolver>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self::new(
            inputs,
            runner,
            config.certificate.path.clone(),
            config.certificate.import_tool.clone(),
        )
    }

    /// Decode the certificate input and write it to the certificate file.
    ///
    /// Returns `false` without writing anything when the input is empty.
    pub async fn materialize(&self) -> bool {
        let certificate = match decode_certificate(&self.inputs.input(inputs::CERTIFICATE)) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("The value for \"certificate\" is not valid base64: {}", e);
                return false;
            }
        };

        if certificate.is_empty() {
            info!("The value for \"certificate\" is not set.");
            return false;
        }

        info!(
            "Writing {} bytes to {}.",
            certificate.len(),
            self.certificate_path.display()
        );
        if let Err(e) = tokio::fs::write(&self.certificate_path, &certificate).await {
            error!(
                path = %self.certificate_path.display(),
                "Failed to write certificate: {}", e
            );
            return false;
        }

        true
    }

    /// Import the certificate file into the store with the configured password
    pub async fn import_to_store(&self) -> bool {
        let password = self.inputs.input(inputs::PASSWORD);
        if password.is_empty() {
            info!("Password is required to add pfx certificate to store");
            return false;
        }

        let command = self.import_command(&password);
        match self.runner.run(&command).await {
            Ok(output) => {
                info!("{}", output.stdout.trim_end());
                true
            }
            Err(failure) => {
                failure.log();
                false
            }
        }
    }

    fn import_command(&self, password: &str) -> ShellCommand {
        ShellCommand::new(format!(
            "{} -f -p {} -importpfx {}",
            self.import_tool,
            password,
            self.certificate_path.display()
        ))
        .secret(password)
    }
}

/// Decode base64 text, ignoring embedded whitespace such as line wraps
fn decode_certificate(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    LENIENT_BASE64.decode(compact)
}
