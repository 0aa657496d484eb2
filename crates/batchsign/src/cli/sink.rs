//! Failure reporting for CI hosts

use batchsign_signing::FailureSink;
use tracing::error;

use super::output;

/// Reports the fatal failure as a GitHub Actions error annotation when
/// running there, otherwise as a console error.
#[derive(Debug, Clone, Copy)]
pub struct CiFailureSink {
    github_actions: bool,
}

impl CiFailureSink {
    /// Detect the host from the environment
    pub fn detect() -> Self {
        Self {
            github_actions: std::env::var("GITHUB_ACTIONS").is_ok(),
        }
    }

    /// Workflow command marking the job as failed
    fn annotation(message: &str) -> String {
        let escaped = message
            .replace('%', "%25")
            .replace('\r', "%0D")
            .replace('\n', "%0A");
        format!("::error::{}", escaped)
    }
}

impl FailureSink for CiFailureSink {
    fn set_failed(&self, message: &str) {
        error!("{}", message);
        if self.github_actions {
            println!("{}", Self::annotation(message));
        } else {
            output::error(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_escapes_message() {
        assert_eq!(
            CiFailureSink::annotation("Failed to sign 'a.exe'.\n100% broken"),
            "::error::Failed to sign 'a.exe'.%0A100%25 broken"
        );
    }
}
