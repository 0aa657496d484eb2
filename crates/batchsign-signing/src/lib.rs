//! batchsign signing - batch code signing engine
//!
//! Signs every eligible file below a folder with an externally installed
//! signing tool:
//! - certificate provisioning: decode, write, import into the store
//! - signing tool discovery: highest installed SDK version wins
//! - lazy enumeration of signable files
//! - per-file sign attempts with linear backoff

pub mod certificate;
pub mod command;
pub mod enumerate;
pub mod error;
pub mod locator;
pub mod orchestrator;
pub mod report;
pub mod run;

#[cfg(test)]
mod testing;

pub use certificate::CertificateProvisioner;
pub use command::{CommandFailure, CommandOutput, CommandRunner, ShellCommand, ShellRunner};
pub use enumerate::{CandidateFile, CandidateFiles, FileEnumerator};
pub use error::{Result, SigningError};
pub use locator::{SigningTool, SigningToolLocator};
pub use orchestrator::{RetryPolicy, SignOrchestrator, SignState, SigningIdentity};
pub use report::{FailureSink, RecordingFailureSink, TracingFailureSink};
pub use run::{RunOutcome, SigningRun};
