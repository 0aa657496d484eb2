//! Signing tool discovery
//!
//! Each installed SDK puts its tools in `<sdk_root>/<version>/<arch>/`. The
//! locator picks the highest version that actually contains the tool.

use std::fmt;
use std::path::PathBuf;

use batchsign_core::Config;
use tracing::{debug, info, warn};

/// Result of signing tool discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningTool {
    /// The tool exists at this path
    Found(PathBuf),
    /// No installed SDK contains the tool
    NotFound { tool_name: String },
}

impl SigningTool {
    /// Whether discovery succeeded
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

impl fmt::Display for SigningTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(path) => write!(f, "{}", path.display()),
            Self::NotFound { tool_name } => write!(f, "unable to find {}", tool_name),
        }
    }
}

/// Scans an SDK root for the newest signing tool
#[derive(Debug, Clone)]
pub struct SigningToolLocator {
    sdk_root: PathBuf,
    arch: String,
    tool_name: String,
}

impl SigningToolLocator {
    /// Create a locator for `<sdk_root>/<version>/<arch>/<tool_name>`
    pub fn new(
        sdk_root: impl Into<PathBuf>,
        arch: impl Into<String>,
        tool_name: impl Into<String>,
    ) -> Self {
        Self {
            sdk_root: sdk_root.into(),
            arch: arch.into(),
            tool_name: tool_name.into(),
        }
    }

    /// Create a locator from the tool settings in `config`
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.tool.sdk_root.clone(),
            config.tool.arch.clone(),
            config.tool.name.clone(),
        )
    }

    /// Find the tool under the highest-versioned SDK directory that has it.
    ///
    /// Never fails: an unreadable root or missing binaries yield
    /// [`SigningTool::NotFound`], and signing will fail later instead.
    pub async fn locate(&self) -> SigningTool {
        let tool = match self.scan().await {
            Some(path) => SigningTool::Found(path),
            None => SigningTool::NotFound {
                tool_name: self.tool_name.clone(),
            },
        };

        info!("Signtool location is {}.", tool);
        tool
    }

    async fn scan(&self) -> Option<PathBuf> {
        let mut entries = match tokio::fs::read_dir(&self.sdk_root).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(root = %self.sdk_root.display(), "Cannot list SDK directory: {}", e);
                return None;
            }
        };

        let mut best: Option<(u64, PathBuf)> = None;

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!(root = %self.sdk_root.display(), "Stopped listing SDK directory: {}", e);
                    break;
                }
            };

            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            let Some(version) = parse_sdk_version(name) else {
                continue;
            };
            // Equal versions keep the first one listed.
            if version <= best.as_ref().map_or(0, |(v, _)| *v) {
                continue;
            }

            let candidate = self.sdk_root.join(name).join(&self.arch).join(&self.tool_name);
            match tokio::fs::metadata(&candidate).await {
                Ok(meta) if meta.is_file() => {
                    debug!(version, path = %candidate.display(), "found signing tool candidate");
                    best = Some((version, candidate));
                }
                Ok(_) => debug!(path = %candidate.display(), "not a file"),
                Err(e) => debug!(path = %candidate.display(), "skipping: {}", e),
            }
        }

        best.map(|(_, path)| path)
    }
}

/// Numeric version of an SDK directory name.
///
/// Only names ending in `.0` qualify; the version is the name with every
/// `.` removed, read as an integer (`10.0.19041.0` becomes `100190410`).
pub fn parse_sdk_version(name: &str) -> Option<u64> {
    if !name.ends_with(".0") {
        return None;
    }
    name.replace('.', "").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn install_tool(root: &Path, version: &str) -> PathBuf {
        let dir = root.join(version).join("x86");
        std::fs::create_dir_all(&dir).unwrap();
        let tool = dir.join("signtool.exe");
        std::fs::write(&tool, b"MZ").unwrap();
        tool
    }

    fn locator(root: &Path) -> SigningToolLocator {
        SigningToolLocator::new(root, "x86", "signtool.exe")
    }

    #[test]
    fn test_parse_sdk_version() {
        assert_eq!(parse_sdk_version("10.0.19041.0"), Some(100190410));
        assert_eq!(parse_sdk_version("10.0.10240.0"), Some(100102400));
        assert_eq!(parse_sdk_version("8.0"), Some(80));
        assert_eq!(parse_sdk_version("10.0.19041.1"), None);
        assert_eq!(parse_sdk_version("arm64"), None);
        assert_eq!(parse_sdk_version("preview.0"), None);
    }

    #[tokio::test]
    async fn test_locate_skips_versions_without_binary() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("8.0")).unwrap();
        std::fs::create_dir_all(temp.path().join("10.0.10240.0").join("x86")).unwrap();
        let expected = install_tool(temp.path(), "10.0.19041.0");

        assert_eq!(locator(temp.path()).locate().await, SigningTool::Found(expected));
    }

    #[tokio::test]
    async fn test_locate_prefers_highest_version() {
        let temp = TempDir::new().unwrap();
        install_tool(temp.path(), "10.0.17763.0");
        let newest = install_tool(temp.path(), "10.0.22621.0");
        install_tool(temp.path(), "10.0.19041.0");

        assert_eq!(locator(temp.path()).locate().await, SigningTool::Found(newest));
    }

    #[tokio::test]
    async fn test_locate_equal_versions_keep_first_listed() {
        let temp = TempDir::new().unwrap();
        install_tool(temp.path(), "10.0.0");
        install_tool(temp.path(), "1.00.0");
        assert_eq!(parse_sdk_version("10.0.0"), parse_sdk_version("1.00.0"));

        let first_listed = std::fs::read_dir(temp.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .next()
            .unwrap();
        let expected = temp.path().join(first_listed).join("x86").join("signtool.exe");

        assert_eq!(locator(temp.path()).locate().await, SigningTool::Found(expected));
    }

    #[tokio::test]
    async fn test_locate_ignores_names_not_ending_in_zero() {
        let temp = TempDir::new().unwrap();
        install_tool(temp.path(), "10.0.99999.1");
        let expected = install_tool(temp.path(), "10.0.17763.0");

        assert_eq!(locator(temp.path()).locate().await, SigningTool::Found(expected));
    }

    #[tokio::test]
    async fn test_locate_requires_a_file() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("10.0.19041.0/x86/signtool.exe")).unwrap();

        let tool = locator(temp.path()).locate().await;
        assert!(!tool.is_found());
    }

    #[tokio::test]
    async fn test_locate_missing_root_returns_sentinel() {
        let temp = TempDir::new().unwrap();
        let tool = locator(&temp.path().join("missing")).locate().await;

        assert_eq!(
            tool,
            SigningTool::NotFound {
                tool_name: "signtool.exe".to_string()
            }
        );
        assert_eq!(tool.to_string(), "unable to find signtool.exe");
    }
}
