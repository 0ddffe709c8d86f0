// src/conffile.rs

//! Configuration-file tracking
//!
//! Packages declare their configuration files together with the digest they
//! shipped with. A conffile counts as modified when the on-disk content no
//! longer hashes to the recorded digest, or when there is nothing to compare
//! against.

use crate::digest::DigestProvider;
use std::path::Path;
use tracing::{info, warn};

/// A declared configuration file and the digest it was installed with
///
/// The recorded digest is MD5 when it is 32 hex characters and SHA-256 when
/// it is 64.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conffile {
    pub path: String,
    pub digest: Option<String>,
}

/// The digest algorithm a recorded digest string belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestKind {
    Md5,
    Sha256,
}

impl Conffile {
    pub fn new(path: impl Into<String>, digest: Option<String>) -> Self {
        Self {
            path: path.into(),
            digest,
        }
    }

    /// Recognize the recorded digest's algorithm by its length
    pub fn digest_kind(&self) -> Option<DigestKind> {
        match self.digest.as_deref().map(str::len) {
            Some(32) => Some(DigestKind::Md5),
            Some(64) => Some(DigestKind::Sha256),
            _ => None,
        }
    }

    /// Check whether the file has been modified since installation
    ///
    /// A missing recorded digest or an unreadable file counts as modified.
    pub fn is_modified(&self, digests: &dyn DigestProvider) -> bool {
        let recorded = match &self.digest {
            Some(d) => d,
            None => {
                warn!("conffile {} has no recorded digest", self.path);
                return true;
            }
        };

        let path = Path::new(&self.path);
        let computed = if recorded.len() > 33 {
            digests.sha256(path)
        } else {
            digests.md5(path)
        };

        match computed {
            None => true,
            Some(fresh) => {
                if fresh != *recorded {
                    info!(
                        "conffile {}: recorded digest {} differs from {}",
                        self.path, recorded, fresh
                    );
                    true
                } else {
                    false
                }
            }
        }
    }
}
