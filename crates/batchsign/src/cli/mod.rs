//! CLI definition and command handling

pub mod output;
mod sink;

use std::path::PathBuf;
use std::sync::Arc;

use batchsign_core::config::{load_config, load_config_or_default};
use batchsign_core::inputs;
use batchsign_core::{Config, EnvInputs, LayeredInputs, MapInputs};
use batchsign_signing::{RunOutcome, ShellRunner, SigningRun};
use clap::{Args, Parser};
use console::style;
use tracing::info;

use crate::exit_codes;
use sink::CiFailureSink;

/// batchsign - sign every build artifact in a folder
///
/// Inputs not given on the command line are read from `INPUT_<NAME>`
/// environment variables, e.g. `INPUT_CERTIFICATE` or `INPUT_TIMESTAMPURL`.
#[derive(Debug, Parser)]
#[command(name = "batchsign")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Configuration file (default: search from the working directory)
    #[arg(short, long, env = "BATCHSIGN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the SDK root scanned for the signing tool
    #[arg(long, env = "BATCHSIGN_SDK_ROOT")]
    pub sdk_root: Option<PathBuf>,

    #[command(flatten)]
    pub inputs: InputArgs,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Signing run inputs
#[derive(Debug, Default, Args)]
pub struct InputArgs {
    /// Folder to scan for files to sign
    #[arg(short, long)]
    pub folder: Option<String>,

    /// Descend into subdirectories ("true" to enable)
    #[arg(short, long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub recursive: Option<String>,

    /// Base64-encoded PFX certificate
    #[arg(long)]
    pub certificate: Option<String>,

    /// Password used to import the certificate
    #[arg(long)]
    pub password: Option<String>,

    /// Timestamp authority URL
    #[arg(long)]
    pub timestamp_url: Option<String>,

    /// SHA-1 thumbprint of the certificate to sign with
    #[arg(long = "certificate-sha1")]
    pub certificate_sha1: Option<String>,

    /// Subject name of the certificate to sign with
    #[arg(long)]
    pub certificate_name: Option<String>,

    /// Description embedded in the signature
    #[arg(short, long)]
    pub description: Option<String>,
}

impl InputArgs {
    /// Command line values layered over `INPUT_*` environment variables
    pub fn resolver(&self) -> LayeredInputs {
        let mut args = MapInputs::new();
        let values = [
            (inputs::FOLDER, &self.folder),
            (inputs::RECURSIVE, &self.recursive),
            (inputs::CERTIFICATE, &self.certificate),
            (inputs::PASSWORD, &self.password),
            (inputs::TIMESTAMP_URL, &self.timestamp_url),
            (inputs::CERTIFICATE_SHA1, &self.certificate_sha1),
            (inputs::CERTIFICATE_NAME, &self.certificate_name),
            (inputs::DESCRIPTION, &self.description),
        ];
        for (key, value) in values {
            if let Some(value) = value {
                args.set(key, value.clone());
            }
        }

        LayeredInputs::new().layer(args).layer(EnvInputs::new())
    }
}

impl Cli {
    /// Console log level implied by the verbosity flags
    pub fn default_log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        }
    }

    /// Execute the signing run, returning the process exit code
    pub fn execute(self) -> anyhow::Result<i32> {
        let config = match self.load_config() {
            Ok(config) => config,
            Err(e) => {
                output::error(&format!("{:#}", e));
                return Ok(exit_codes::CONFIG_ERROR);
            }
        };
        info!(sdk_root = %config.tool.sdk_root.display(), "starting signing run");
        if self.format == OutputFormat::Text && !self.quiet {
            output::info(&format!(
                "Signing tool search root: {}",
                config.tool.sdk_root.display()
            ));
        }

        let run = SigningRun::new(
            config,
            Arc::new(self.inputs.resolver()),
            Arc::new(ShellRunner::new()),
            Arc::new(CiFailureSink::detect()),
        );

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let outcome = rt.block_on(run.execute());

        self.print_outcome(&outcome)?;

        Ok(if outcome.is_failure() {
            exit_codes::FAILURE
        } else {
            exit_codes::SUCCESS
        })
    }

    fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => load_config_or_default(&std::env::current_dir()?).0,
        };

        if let Some(root) = &self.sdk_root {
            config.tool.sdk_root = root.clone();
        }

        Ok(config)
    }

    fn print_outcome(&self, outcome: &RunOutcome) -> anyhow::Result<()> {
        if self.format == OutputFormat::Json {
            println!("{}", serde_json::to_string_pretty(outcome)?);
            return Ok(());
        }
        if self.quiet {
            return Ok(());
        }

        match outcome {
            RunOutcome::Completed { signed } => {
                output::success(&format!("Signed {} file(s)", style(signed).bold()));
            }
            RunOutcome::NoCertificate => {
                output::warning("No certificate provided, nothing was signed");
                println!("{}", output::key_value("input", inputs::CERTIFICATE));
            }
            RunOutcome::StoreImportFailed => {
                output::warning("Certificate was not imported, nothing was signed");
                println!("{}", output::key_value("input", inputs::PASSWORD));
            }
            // Already reported by the failure sink.
            RunOutcome::Failed { .. } => {}
        }

        Ok(())
    }
}
