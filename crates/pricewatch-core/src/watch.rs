//! Content fingerprints and watch state.
//!
//! File-system notifications fire for metadata-only touches and for rewrites
//! with identical bytes. The monitor tells those apart from real edits by
//! comparing a SHA-256 [`Fingerprint`] of the file content with the one
//! recorded after the last successful pass.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Hex-encoded SHA-256 of a file's bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Fingerprint(format!("{:x}", hasher.finalize()))
    }

    /// Fingerprint of a file that does not exist.
    pub fn missing() -> Self {
        Fingerprint(String::new())
    }

    pub fn is_missing(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_missing() {
            f.write_str("<missing>")
        } else {
            f.write_str(&self.0[..12.min(self.0.len())])
        }
    }
}

/// Last committed fingerprint per watched file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchState {
    fingerprints: HashMap<PathBuf, Fingerprint>,
}

impl WatchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<&Fingerprint> {
        self.fingerprints.get(path)
    }

    /// True when `current` differs from the committed fingerprint for `path`,
    /// or when nothing has been committed for it yet.
    pub fn is_changed(&self, path: &Path, current: &Fingerprint) -> bool {
        self.fingerprints.get(path) != Some(current)
    }

    /// Record `fingerprint` as the content last processed for `path`.
    pub fn commit(&mut self, path: impl Into<PathBuf>, fingerprint: Fingerprint) {
        self.fingerprints.insert(path.into(), fingerprint);
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }
}
