// src/digest.rs

//! Digest computation behind a collaborator interface
//!
//! The core never hashes files directly; it asks a [`DigestProvider`].
//! [`FsDigest`] is the default provider backed by the local filesystem.

use std::fs;
use std::path::Path;

/// Computes content digests for files on behalf of the core
///
/// Both methods return None when the file cannot be read.
pub trait DigestProvider {
    fn md5(&self, path: &Path) -> Option<String>;
    fn sha256(&self, path: &Path) -> Option<String>;
}

/// Default provider reading from the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FsDigest;

impl DigestProvider for FsDigest {
    fn md5(&self, path: &Path) -> Option<String> {
        use md5::{Digest, Md5};
        let data = fs::read(path).ok()?;
        Some(format!("{:x}", Md5::digest(&data)))
    }

    fn sha256(&self, path: &Path) -> Option<String> {
        use sha2::{Digest, Sha256};
        let data = fs::read(path).ok()?;
        Some(format!("{:x}", Sha256::digest(&data)))
    }
}
