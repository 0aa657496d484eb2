//! Top-level signing run
//!
//! Provision the certificate, import it, locate the signing tool, then sign
//! every discovered file. Provisioning problems end the run quietly; any
//! error after that is reported once through the [`FailureSink`].

use std::sync::Arc;

use batchsign_core::inputs::{self, InputResolver};
use batchsign_core::Config;
use serde::Serialize;
use tracing::{info, warn};

use crate::certificate::CertificateProvisioner;
use crate::command::CommandRunner;
use crate::enumerate::FileEnumerator;
use crate::error::Result;
use crate::locator::SigningToolLocator;
use crate::orchestrator::SignOrchestrator;
use crate::report::FailureSink;

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// No certificate input; nothing was done
    NoCertificate,
    /// The certificate could not be imported; nothing was signed
    StoreImportFailed,
    /// Every discovered file was signed
    Completed { signed: usize },
    /// The run was aborted and reported as failed
    Failed { message: String },
}

impl RunOutcome {
    /// Whether the run should be treated as failed
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// One batch signing job
pub struct SigningRun {
    config: Config,
    inputs: Arc<dyn InputResolver>,
    runner: Arc<dyn CommandRunner>,
    sink: Arc<dyn FailureSink>,
}

impl SigningRun {
    /// Create a run
    pub fn new(
        config: Config,
        inputs: Arc<dyn InputResolver>,
        runner: Arc<dyn CommandRunner>,
        sink: Arc<dyn FailureSink>,
    ) -> Self {
        Self {
            config,
            inputs,
            runner,
            sink,
        }
    }

    /// Run to completion, reporting a fatal error through the sink
    pub async fn execute(&self) -> RunOutcome {
        match self.try_execute().await {
            Ok(outcome) => outcome,
            Err(e) => {
                let message = format!("Action failed with error: {}", e);
                self.sink.set_failed(&message);
                RunOutcome::Failed { message }
            }
        }
    }

    async fn try_execute(&self) -> Result<RunOutcome> {
        let provisioner = CertificateProvisioner::from_config(
            &self.config,
            self.inputs.clone(),
            self.runner.clone(),
        );

        if !provisioner.materialize().await {
            return Ok(RunOutcome::NoCertificate);
        }
        if !provisioner.import_to_store().await {
            return Ok(RunOutcome::StoreImportFailed);
        }

        let signed = self.sign_files().await?;
        info!("Signed {} file(s).", signed);
        Ok(RunOutcome::Completed { signed })
    }

    async fn sign_files(&self) -> Result<usize> {
        let folder = self.inputs.required_input(inputs::FOLDER)?;
        let recursive = self.inputs.bool_input(inputs::RECURSIVE);

        let tool = SigningToolLocator::from_config(&self.config).locate().await;
        if !tool.is_found() {
            warn!(
                sdk_root = %self.config.tool.sdk_root.display(),
                "No signing tool found, sign attempts will fail"
            );
        }
        let orchestrator = SignOrchestrator::from_config(
            &self.config,
            self.inputs.as_ref(),
            self.runner.clone(),
            tool,
        );

        orchestrator
            .sign_all(FileEnumerator::new(folder, recursive).files())
            .await
    }
}
