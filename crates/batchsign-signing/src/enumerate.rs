//! Signable file enumeration
//!
//! Files are discovered lazily, depth first, in the order the filesystem
//! lists them. Nothing is collected up front: each path is produced only
//! when the signer asks for the next one.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::error::Result;

/// Extensions the signing tool accepts
pub const SIGNABLE_EXTENSIONS: &[&str] = &[
    ".dll",
    ".exe",
    ".sys",
    ".vxd",
    ".msix",
    ".msixbundle",
    ".appx",
    ".appxbundle",
    ".msi",
    ".msp",
    ".msm",
    ".cab",
    ".ps1",
    ".psm1",
];

/// Package archives are discovered but never pass the sign check
pub const PACKAGE_EXTENSION: &str = ".nupkg";

/// A discovered file and its extension (including the leading dot)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    path: PathBuf,
    extension: Option<String>,
}

impl CandidateFile {
    /// Wrap a path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e));
        Self { path, extension }
    }

    /// Path of the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Extension including the leading dot, if any
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// Whether a sign attempt may run for this file
    pub fn is_signable(&self) -> bool {
        self.extension()
            .is_some_and(|ext| SIGNABLE_EXTENSIONS.contains(&ext))
    }

    /// Whether enumeration yields this file
    pub fn is_discoverable(&self) -> bool {
        self.is_signable() || self.extension() == Some(PACKAGE_EXTENSION)
    }
}

impl fmt::Display for CandidateFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Enumerates discoverable files below a folder
#[derive(Debug, Clone)]
pub struct FileEnumerator {
    root: PathBuf,
    recursive: bool,
}

impl FileEnumerator {
    /// Enumerate `root`, descending into subdirectories only if `recursive`
    pub fn new(root: impl Into<PathBuf>, recursive: bool) -> Self {
        Self {
            root: root.into(),
            recursive,
        }
    }

    /// Start a fresh traversal
    pub fn files(&self) -> CandidateFiles {
        let mut walker = WalkDir::new(&self.root).min_depth(1).follow_links(true);
        if !self.recursive {
            walker = walker.max_depth(1);
        }
        CandidateFiles {
            inner: walker.into_iter(),
        }
    }
}

/// Lazy iterator over discoverable files
pub struct CandidateFiles {
    inner: walkdir::IntoIter,
}

impl Iterator for CandidateFiles {
    type Item = Result<CandidateFile>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    let candidate = CandidateFile::new(entry.into_path());
                    if candidate.is_discoverable() {
                        return Some(Ok(candidate));
                    }
                }
                Err(err) => {
                    if let Some(ancestor) = err.loop_ancestor() {
                        warn!(
                            path = ?err.path(),
                            ancestor = %ancestor.display(),
                            "Skipping symlink loop"
                        );
                        continue;
                    }
                    return Some(Err(err.into()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    /// a.exe, b.txt, c/d.dll
    fn fixture() -> TempDir {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.exe"), b"").unwrap();
        std::fs::write(temp.path().join("b.txt"), b"").unwrap();
        std::fs::create_dir(temp.path().join("c")).unwrap();
        std::fs::write(temp.path().join("c").join("d.dll"), b"").unwrap();
        temp
    }

    fn collect(enumerator: &FileEnumerator, root: &Path) -> HashSet<PathBuf> {
        enumerator
            .files()
            .map(|f| f.unwrap().path().strip_prefix(root).unwrap().to_path_buf())
            .collect()
    }

    #[test]
    fn test_candidate_extension() {
        let file = CandidateFile::new("out/setup.msi");
        assert_eq!(file.extension(), Some(".msi"));
        assert!(file.is_signable());

        let file = CandidateFile::new("out/README");
        assert_eq!(file.extension(), None);
        assert!(!file.is_discoverable());
    }

    #[test]
    fn test_package_is_discoverable_but_not_signable() {
        let file = CandidateFile::new("pkg/lib.1.0.0.nupkg");
        assert!(file.is_discoverable());
        assert!(!file.is_signable());
    }

    #[test]
    fn test_extension_match_is_case_sensitive() {
        assert!(!CandidateFile::new("APP.EXE").is_signable());
        assert!(CandidateFile::new("module.psm1").is_signable());
    }

    #[test]
    fn test_non_recursive_ignores_subdirectories() {
        let temp = fixture();
        let found = collect(&FileEnumerator::new(temp.path(), false), temp.path());

        assert_eq!(found, HashSet::from([PathBuf::from("a.exe")]));
    }

    #[test]
    fn test_recursive_descends() {
        let temp = fixture();
        let found = collect(&FileEnumerator::new(temp.path(), true), temp.path());

        assert_eq!(
            found,
            HashSet::from([PathBuf::from("a.exe"), Path::new("c").join("d.dll")])
        );
    }

    #[test]
    fn test_each_call_starts_a_new_traversal() {
        let temp = fixture();
        let enumerator = FileEnumerator::new(temp.path(), true);

        assert_eq!(enumerator.files().count(), 2);
        assert_eq!(enumerator.files().count(), 2);
    }

    #[test]
    fn test_nupkg_is_enumerated() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("lib.nupkg"), b"").unwrap();
        std::fs::write(temp.path().join("lib.snupkg"), b"").unwrap();

        let found = collect(&FileEnumerator::new(temp.path(), false), temp.path());
        assert_eq!(found, HashSet::from([PathBuf::from("lib.nupkg")]));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let temp = TempDir::new().unwrap();
        let mut files = FileEnumerator::new(temp.path().join("missing"), true).files();

        assert!(matches!(files.next(), Some(Err(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_is_skipped() {
        let temp = fixture();
        std::os::unix::fs::symlink(temp.path(), temp.path().join("c").join("loop")).unwrap();

        let found = collect(&FileEnumerator::new(temp.path(), true), temp.path());
        assert_eq!(
            found,
            HashSet::from([PathBuf::from("a.exe"), Path::new("c").join("d.dll")])
        );
    }
}
