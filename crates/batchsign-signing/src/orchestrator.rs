//! Per-file signing with retries
//!
//! Each file moves through [`SignState`]: up to `max_attempts` attempts,
//! each preceded by a delay equal to its zero-based index in seconds. The
//! first successful attempt ends in `Signed`; running out of attempts ends
//! in `Exhausted`, which aborts the whole run.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use batchsign_core::inputs::{self, InputResolver};
use batchsign_core::Config;
use tracing::{debug, info, instrument, warn};

use crate::command::{CommandRunner, ShellCommand};
use crate::enumerate::CandidateFile;
use crate::error::{Result, SigningError};
use crate::locator::SigningTool;

/// Retry state of one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignState {
    /// About to run the attempt with this zero-based index
    Attempting(u32),
    /// An attempt succeeded
    Signed,
    /// Every attempt failed or was skipped
    Exhausted,
}

impl SignState {
    /// Whether no further attempts will be made
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Attempting(_))
    }
}

/// Attempt limit and linear backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl RetryPolicy {
    /// Allow `max_attempts` attempts per file
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// Attempts allowed per file
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Initial state for a file
    pub fn start(&self) -> SignState {
        if self.max_attempts == 0 {
            SignState::Exhausted
        } else {
            SignState::Attempting(0)
        }
    }

    /// Delay before the attempt with index `attempt`
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_secs(u64::from(attempt))
    }

    /// State after an attempt finished
    pub fn advance(&self, state: SignState, signed: bool) -> SignState {
        match state {
            SignState::Attempting(_) if signed => SignState::Signed,
            SignState::Attempting(attempt) if attempt + 1 < self.max_attempts => {
                SignState::Attempting(attempt + 1)
            }
            SignState::Attempting(_) => SignState::Exhausted,
            terminal => terminal,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(batchsign_core::config::DEFAULT_MAX_ATTEMPTS)
    }
}

/// Certificate selection and signature metadata for the sign command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SigningIdentity {
    /// SHA-1 thumbprint of the certificate
    pub sha1_thumbprint: Option<String>,
    /// Certificate subject name
    pub common_name: Option<String>,
    /// Description embedded in the signature
    pub description: Option<String>,
    /// RFC 3161 timestamp authority
    pub timestamp_url: String,
}

impl SigningIdentity {
    /// Read the identity inputs, falling back to `default_timestamp_url`
    pub fn from_inputs(inputs: &dyn InputResolver, default_timestamp_url: &str) -> Self {
        let non_empty = |key: &str| Some(inputs.input(key)).filter(|v| !v.is_empty());

        Self {
            sha1_thumbprint: non_empty(inputs::CERTIFICATE_SHA1),
            common_name: non_empty(inputs::CERTIFICATE_NAME),
            description: non_empty(inputs::DESCRIPTION),
            timestamp_url: non_empty(inputs::TIMESTAMP_URL)
                .unwrap_or_else(|| default_timestamp_url.to_string()),
        }
    }

    /// Whether a thumbprint or subject name selects the certificate
    pub fn has_certificate_selector(&self) -> bool {
        self.sha1_thumbprint.is_some() || self.common_name.is_some()
    }

    /// Build the sign command for `file`
    pub fn sign_command(&self, tool: &SigningTool, file: &Path) -> ShellCommand {
        let mut line = format!(
            "\"{}\" sign /sm /tr {} /td SHA256 /fd SHA256",
            tool, self.timestamp_url
        );
        if let Some(sha1) = &self.sha1_thumbprint {
            line.push_str(&format!(" /sha1 \"{}\"", sha1));
        }
        if let Some(name) = &self.common_name {
            line.push_str(&format!(" /n \"{}\"", name));
        }
        if let Some(description) = &self.description {
            line.push_str(&format!(" /d \"{}\"", description));
        }
        line.push_str(&format!(" \"{}\"", file.display()));
        ShellCommand::new(line)
    }
}

/// Signs files one at a time with the discovered tool
pub struct SignOrchestrator {
    runner: Arc<dyn CommandRunner>,
    tool: SigningTool,
    identity: SigningIdentity,
    policy: RetryPolicy,
}

impl SignOrchestrator {
    /// Create an orchestrator
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        tool: SigningTool,
        identity: SigningIdentity,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            runner,
            tool,
            identity,
            policy,
        }
    }

    /// Create an orchestrator reading the identity from `inputs`
    pub fn from_config(
        config: &Config,
        inputs: &dyn InputResolver,
        runner: Arc<dyn CommandRunner>,
        tool: SigningTool,
    ) -> Self {
        Self::new(
            runner,
            tool,
            SigningIdentity::from_inputs(inputs, &config.signing.default_timestamp_url),
            RetryPolicy::new(config.signing.max_attempts),
        )
    }

    /// Sign every file in order, stopping at the first file that cannot be
    /// signed. Returns the number of files signed.
    pub async fn sign_all<I>(&self, files: I) -> Result<usize>
    where
        I: IntoIterator<Item = Result<CandidateFile>>,
    {
        let mut signed = 0;
        for file in files {
            self.try_sign(&file?).await?;
            signed += 1;
        }
        Ok(signed)
    }

    /// Drive one file to `Signed`, or fail once attempts are exhausted
    #[instrument(skip_all, fields(file = %file))]
    pub async fn try_sign(&self, file: &CandidateFile) -> Result<()> {
        info!("Signing {}.", file);
        debug!(max_attempts = self.policy.max_attempts(), "starting sign attempts");

        let mut state = self.policy.start();
        while let SignState::Attempting(attempt) = state {
            let delay = self.policy.backoff(attempt);
            if !delay.is_zero() {
                info!("Waiting for {} seconds.", delay.as_secs());
                tokio::time::sleep(delay).await;
            }

            let signed = file.is_signable() && self.sign_once(file.path()).await;
            state = self.policy.advance(state, signed);
        }

        match state {
            SignState::Signed => Ok(()),
            _ => Err(SigningError::RetriesExhausted {
                path: file.path().to_path_buf(),
            }),
        }
    }

    async fn sign_once(&self, path: &Path) -> bool {
        if !self.identity.has_certificate_selector() {
            warn!("You need to include a NAME or a SHA1 Hash for the certificate to sign with.");
        }

        let command = self.identity.sign_command(&self.tool, path);
        info!("Signing command: {}", command);

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
}
