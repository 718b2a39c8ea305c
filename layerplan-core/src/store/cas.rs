//! Content-Addressable Storage (CAS) backing the local content store.
//!
//! File contents are stored by their SHA256 digest, so the same constraint
//! file fetched by several plans is written once.
//!
//! # Layout
//!
//! ```text
//! blobs/
//! └── sha256/
//!     └── a1/
//!         └── a1b2c3...  # File content (named by digest)
//! manifests/
//! └── <fingerprint>.json  # Snapshot manifest (list of files -> blobs)
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One file captured in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path relative to the store's source root, `/`-separated
    pub path: String,
    /// SHA256 digest of the file content
    pub blob_digest: String,
    /// File size in bytes
    pub size: u64,
}

/// Manifest describing the files behind one digest handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotManifest {
    /// Fingerprint over the sorted entries
    pub fingerprint: String,
    /// Entries sorted by path
    pub entries: Vec<FileEntry>,
}

impl SnapshotManifest {
    /// Build a manifest, sorting entries and computing the fingerprint.
    pub fn new(mut entries: Vec<FileEntry>) -> Self {
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries.dedup_by(|a, b| a.path == b.path);

        let mut hasher = Sha256::new();
        for entry in &entries {
            hasher.update(entry.path.as_bytes());
            hasher.update([0u8]);
            hasher.update(entry.blob_digest.as_bytes());
            hasher.update(b"\n");
        }
        let fingerprint = format!("{:x}", hasher.finalize());

        Self { fingerprint, entries }
    }

    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }
}

/// Content-Addressable Storage manager.
pub struct CasStore {
    /// Root directory for blob storage
    blobs_dir: PathBuf,
    /// Directory for snapshot manifests
    manifests_dir: PathBuf,
    /// In-memory cache of blob existence (digest -> exists)
    blob_cache: HashMap<String, bool>,
}

impl CasStore {
    /// Create a new CAS store under `base_dir`.
    pub fn new(base_dir: &Path) -> io::Result<Self> {
        let blobs_dir = base_dir.join("blobs").join("sha256");
        let manifests_dir = base_dir.join("manifests");

        fs::create_dir_all(&blobs_dir)?;
        fs::create_dir_all(&manifests_dir)?;

        Ok(Self { blobs_dir, manifests_dir, blob_cache: HashMap::new() })
    }

    /// Store a blob and return its digest.
    ///
    /// If the blob already exists, this is a no-op and just returns the digest.
    pub fn store_blob(&mut self, data: &[u8]) -> io::Result<String> {
        let digest = sha256_hex(data);

        if self.blob_cache.get(&digest).copied().unwrap_or(false) {
            debug!(digest = %digest, "Blob already exists (cached)");
            return Ok(digest);
        }

        let blob_path = self.blob_path(&digest);
        if blob_path.exists() {
            self.blob_cache.insert(digest.clone(), true);
            debug!(digest = %digest, "Blob already exists (on disk)");
            return Ok(digest);
        }

        if let Some(parent) = blob_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(&blob_path)?;
        file.write_all(data)?;

        self.blob_cache.insert(digest.clone(), true);
        debug!(digest = %digest, size = data.len(), "Stored new blob");

        Ok(digest)
    }

    /// Retrieve a blob by digest.
    pub fn get_blob(&self, digest: &str) -> io::Result<Vec<u8>> {
        fs::read(self.blob_path(digest))
    }

    /// Store a snapshot manifest.
    pub fn store_manifest(&self, manifest: &SnapshotManifest) -> io::Result<()> {
        let path = self.manifest_path(&manifest.fingerprint);
        let json = serde_json::to_string_pretty(manifest)?;
        fs::write(path, json)?;
        info!(
            fingerprint = %manifest.fingerprint,
            entries = manifest.entries.len(),
            "Stored snapshot manifest"
        );
        Ok(())
    }

    /// Load a snapshot manifest by fingerprint.
    pub fn get_manifest(&self, fingerprint: &str) -> io::Result<SnapshotManifest> {
        let json = fs::read_to_string(self.manifest_path(fingerprint))?;
        let manifest: SnapshotManifest = serde_json::from_str(&json)?;
        Ok(manifest)
    }

    /// Check if a manifest exists.
    pub fn manifest_exists(&self, fingerprint: &str) -> bool {
        self.manifest_path(fingerprint).exists()
    }

    fn blob_path(&self, digest: &str) -> PathBuf {
        // First 2 chars as subdirectory
        let subdir = &digest[..2.min(digest.len())];
        self.blobs_dir.join(subdir).join(digest)
    }

    fn manifest_path(&self, fingerprint: &str) -> PathBuf {
        self.manifests_dir.join(format!("{}.json", fingerprint))
    }
}

/// Compute the SHA256 digest of data as lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
