//! File-content store used to place input files into the build context.
//!
//! Planners only see the [`FileContentStore`] trait. [`LocalContentStore`]
//! resolves globs against a source root on disk and snapshots the matches
//! into a content-addressable store.

pub mod cas;

use crate::error::{PlanError, Result};
use cas::{CasStore, FileEntry, SnapshotManifest};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

/// Opaque reference to a snapshot of files held by a content store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DigestHandle {
    /// SHA256 over the snapshot's sorted entries
    pub fingerprint: String,
    /// Paths captured, relative to the source root
    pub files: Vec<String>,
    /// Sum of file sizes in bytes
    pub total_size: u64,
}

impl DigestHandle {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl From<&SnapshotManifest> for DigestHandle {
    fn from(manifest: &SnapshotManifest) -> Self {
        Self {
            fingerprint: manifest.fingerprint.clone(),
            files: manifest.entries.iter().map(|e| e.path.clone()).collect(),
            total_size: manifest.total_size(),
        }
    }
}

/// What to do when a pattern matches no files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobMatchErrorBehavior {
    #[default]
    Ignore,
    Warn,
    Error,
}

/// A fetch request: patterns plus how to treat patterns that match nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathGlobs {
    pub patterns: Vec<String>,
    pub on_missing: GlobMatchErrorBehavior,
    /// Names the configuration that asked for these files, for error messages
    pub description_of_origin: String,
}

impl PathGlobs {
    pub fn new(patterns: Vec<String>) -> Self {
        Self {
            patterns,
            on_missing: GlobMatchErrorBehavior::Ignore,
            description_of_origin: String::new(),
        }
    }

    /// Fail the fetch when a pattern matches nothing, blaming `origin`.
    pub fn error_on_missing(mut self, origin: impl Into<String>) -> Self {
        self.on_missing = GlobMatchErrorBehavior::Error;
        self.description_of_origin = origin.into();
        self
    }

    pub fn warn_on_missing(mut self, origin: impl Into<String>) -> Self {
        self.on_missing = GlobMatchErrorBehavior::Warn;
        self.description_of_origin = origin.into();
        self
    }
}

/// Content store trait.
///
/// Turns file patterns into a digest handle that the image build can later
/// materialize. Implementations must not retry internally.
#[async_trait::async_trait]
pub trait FileContentStore: Send + Sync {
    /// Snapshot every file matched by `globs`.
    ///
    /// # Returns
    /// * `Ok(DigestHandle)` - Snapshot of the matched files
    /// * `Err(PlanError::MissingInputFile)` - A pattern matched nothing under
    ///   [`GlobMatchErrorBehavior::Error`]
    async fn fetch(&self, globs: &PathGlobs) -> Result<DigestHandle>;
}

/// Content store over a directory on the local filesystem.
pub struct LocalContentStore {
    /// Directory patterns are resolved against
    root: PathBuf,
    cas: Mutex<CasStore>,
}

impl LocalContentStore {
    /// Create a store resolving patterns under `root` and keeping blobs in
    /// `store_dir`.
    ///
    /// `root` must exist; it is canonicalized so relative roots (including
    /// `.` and the empty path) resolve against the working directory.
    pub fn new(root: impl Into<PathBuf>, store_dir: &Path) -> Result<Self> {
        let mut root = root.into();
        if root.as_os_str().is_empty() {
            root = PathBuf::from(".");
        }
        let root = std::fs::canonicalize(&root).map_err(|e| PlanError::io(&root, e))?;
        let cas = CasStore::new(store_dir).map_err(|e| PlanError::io(store_dir, e))?;
        Ok(Self { root, cas: Mutex::new(cas) })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write the files behind `handle` under `dest`, keeping relative paths.
    #[instrument(skip(self, handle), fields(fingerprint = %handle.fingerprint))]
    pub async fn materialize(&self, handle: &DigestHandle, dest: &Path) -> Result<()> {
        let cas = self.cas.lock().await;
        if !cas.manifest_exists(&handle.fingerprint) {
            return Err(PlanError::DigestNotFound { fingerprint: handle.fingerprint.clone() });
        }
        let manifest =
            cas.get_manifest(&handle.fingerprint).map_err(|e| PlanError::io(dest, e))?;

        for entry in &manifest.entries {
            let target = dest.join(&entry.path);
            let data = cas.get_blob(&entry.blob_digest).map_err(|e| PlanError::io(&target, e))?;
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| PlanError::io(parent, e))?;
            }
            tokio::fs::write(&target, data).await.map_err(|e| PlanError::io(&target, e))?;
            debug!(path = %entry.path, "Materialized file");
        }
        Ok(())
    }

    /// Expand one pattern to root-relative file paths.
    fn expand(&self, pattern: &str) -> Result<Vec<String>> {
        let root = self.root.to_string_lossy();
        let full = format!("{}/{}", glob::Pattern::escape(&root), pattern.trim_start_matches('/'));

        let paths = glob::glob(&full).map_err(|e| PlanError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        let mut matched = Vec::new();
        for path in paths {
            let path = path.map_err(|e| {
                let at = e.path().to_path_buf();
                PlanError::io(at, e.into_error())
            })?;
            if !path.is_file() {
                continue;
            }
            matched.push(self.relative_path(&path)?);
        }
        Ok(matched)
    }

    /// Root-relative, `/`-separated form of a matched path.
    ///
    /// Paths that cannot be expressed without leaving the root are errors.
    fn relative_path(&self, path: &Path) -> Result<String> {
        let outside =
            || PlanError::PathOutsideRoot { path: path.to_path_buf(), root: self.root.clone() };

        let relative = path.strip_prefix(&self.root).map_err(|_| outside())?;
        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy()),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(outside())
                }
            }
        }
        if parts.is_empty() {
            return Err(outside());
        }
        Ok(parts.join("/"))
    }
}

#[async_trait::async_trait]
impl FileContentStore for LocalContentStore {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn fetch(&self, globs: &PathGlobs) -> Result<DigestHandle> {
        let mut files = Vec::new();
        for pattern in &globs.patterns {
            let matched = self.expand(pattern)?;
            if matched.is_empty() {
                match globs.on_missing {
                    GlobMatchErrorBehavior::Error => {
                        return Err(PlanError::MissingInputFile {
                            pattern: pattern.clone(),
                            origin: globs.description_of_origin.clone(),
                        });
                    }
                    GlobMatchErrorBehavior::Warn => {
                        warn!(
                            pattern = %pattern,
                            origin = %globs.description_of_origin,
                            "Pattern matched no files"
                        );
                    }
                    GlobMatchErrorBehavior::Ignore => {}
                }
            }
            files.extend(matched);
        }

        let mut contents = Vec::with_capacity(files.len());
        for file in &files {
            let path = self.root.join(file);
            let data = tokio::fs::read(&path).await.map_err(|e| PlanError::io(&path, e))?;
            contents.push((file.clone(), data));
        }

        let mut cas = self.cas.lock().await;
        let mut entries = Vec::with_capacity(contents.len());
        for (path, data) in contents {
            let blob_digest = cas.store_blob(&data).map_err(|e| PlanError::io(&path, e))?;
            entries.push(FileEntry { path, blob_digest, size: data.len() as u64 });
        }

        let manifest = SnapshotManifest::new(entries);
        if !cas.manifest_exists(&manifest.fingerprint) {
            cas.store_manifest(&manifest).map_err(|e| PlanError::io(&self.root, e))?;
        }

        debug!(
            fingerprint = %manifest.fingerprint,
            files = manifest.entries.len(),
            patterns = ?globs.patterns,
            "Fetched snapshot"
        );
        Ok(DigestHandle::from(&manifest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, TempDir, LocalContentStore) {
        let root = TempDir::new().unwrap();
        let store_dir = TempDir::new().unwrap();
        let store = LocalContentStore::new(root.path(), store_dir.path()).unwrap();
        (root, store_dir, store)
    }

    #[tokio::test]
    async fn test_fetch_literal_path() {
        let (root, _store_dir, store) = setup();
        std::fs::write(root.path().join("constraints.txt"), "flask==2.0\n").unwrap();

        let globs = PathGlobs::new(vec!["constraints.txt".to_string()])
            .error_on_missing("the option `requirement_constraints`");
        let handle = store.fetch(&globs).await.unwrap();

        assert_eq!(handle.files, vec!["constraints.txt"]);
        assert_eq!(handle.total_size, 11);
        assert_eq!(handle.fingerprint.len(), 64);
    }

    #[tokio::test]
    async fn test_fetch_is_deterministic() {
        let (root, _store_dir, store) = setup();
        std::fs::create_dir_all(root.path().join("reqs")).unwrap();
        std::fs::write(root.path().join("reqs/a.txt"), "a").unwrap();
        std::fs::write(root.path().join("reqs/b.txt"), "b").unwrap();

        let globs = PathGlobs::new(vec!["reqs/*.txt".to_string()]);
        let first = store.fetch(&globs).await.unwrap();
        let second = store.fetch(&globs).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.files, vec!["reqs/a.txt", "reqs/b.txt"]);
    }

    #[tokio::test]
    async fn test_missing_file_errors_with_origin() {
        let (_root, _store_dir, store) = setup();

        let globs = PathGlobs::new(vec!["constraints.txt".to_string()])
            .error_on_missing("the option `requirement_constraints`");
        let err = store.fetch(&globs).await.unwrap_err();

        match &err {
            PlanError::MissingInputFile { pattern, origin } => {
                assert_eq!(pattern, "constraints.txt");
                assert_eq!(origin, "the option `requirement_constraints`");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("requirement_constraints"));
    }

    #[tokio::test]
    async fn test_missing_file_ignored_or_warned() {
        let (_root, _store_dir, store) = setup();

        let ignore = PathGlobs::new(vec!["nope.txt".to_string()]);
        assert!(store.fetch(&ignore).await.unwrap().is_empty());

        let warn = PathGlobs::new(vec!["nope.txt".to_string()]).warn_on_missing("a test");
        assert!(store.fetch(&warn).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_pattern() {
        let (_root, _store_dir, store) = setup();

        let globs = PathGlobs::new(vec!["[".to_string()]);
        let err = store.fetch(&globs).await.unwrap_err();
        assert!(matches!(err, PlanError::InvalidPattern { .. }));
    }

    #[tokio::test]
    async fn test_materialize_round_trip() {
        let (root, _store_dir, store) = setup();
        std::fs::create_dir_all(root.path().join("deps")).unwrap();
        std::fs::write(root.path().join("deps/constraints.txt"), "gunicorn<21\n").unwrap();

        let handle = store.fetch(&PathGlobs::new(vec!["deps/*".to_string()])).await.unwrap();

        let dest = TempDir::new().unwrap();
        store.materialize(&handle, dest.path()).await.unwrap();
        let written = std::fs::read_to_string(dest.path().join("deps/constraints.txt")).unwrap();
        assert_eq!(written, "gunicorn<21\n");
    }

    #[tokio::test]
    async fn test_relative_root() {
        let root = tempfile::Builder::new().prefix("layerplan-root").tempdir_in(".").unwrap();
        assert!(root.path().is_relative());
        std::fs::write(root.path().join("constraints.txt"), "flask<3\n").unwrap();
        let store_dir = TempDir::new().unwrap();
        let store = LocalContentStore::new(root.path(), store_dir.path()).unwrap();

        let globs = PathGlobs::new(vec!["constraints.txt".to_string()])
            .error_on_missing("the option `requirement_constraints`");
        let handle = store.fetch(&globs).await.unwrap();
        assert_eq!(handle.files, vec!["constraints.txt"]);

        let dotted = PathGlobs::new(vec!["./constraints.txt".to_string()])
            .error_on_missing("the option `requirement_constraints`");
        assert_eq!(store.fetch(&dotted).await.unwrap().files, vec!["constraints.txt"]);
    }

    #[test]
    fn test_empty_root_is_working_directory() {
        let store_dir = TempDir::new().unwrap();
        let store = LocalContentStore::new("", store_dir.path()).unwrap();
        assert_eq!(store.root(), std::fs::canonicalize(".").unwrap());
    }

    #[tokio::test]
    async fn test_parent_dir_pattern_rejected() {
        let outer = TempDir::new().unwrap();
        std::fs::write(outer.path().join("c.txt"), "flask<3\n").unwrap();
        std::fs::create_dir(outer.path().join("root")).unwrap();
        let store_dir = TempDir::new().unwrap();
        let store = LocalContentStore::new(outer.path().join("root"), store_dir.path()).unwrap();

        let globs = PathGlobs::new(vec!["../c.txt".to_string()])
            .error_on_missing("the option `requirement_constraints`");
        let err = store.fetch(&globs).await.unwrap_err();
        assert!(matches!(err, PlanError::PathOutsideRoot { .. }), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn test_materialize_unknown_digest() {
        let (_root, _store_dir, store) = setup();
        let handle =
            DigestHandle { fingerprint: "deadbeef".to_string(), files: vec![], total_size: 0 };

        let dest = TempDir::new().unwrap();
        let err = store.materialize(&handle, dest.path()).await.unwrap_err();
        assert!(matches!(err, PlanError::DigestNotFound { .. }));
    }
}
