// src/transport.rs

//! Collaborator interfaces for retrieval and archive access
//!
//! The core decides *what* to fetch and extract; these traits are how it
//! asks the outside world to do it. Implementations live with the caller
//! (curl-based downloader, ar/tar extractor, test fakes).

use crate::error::Result;
use std::io::Write;
use std::path::Path;

/// Retrieves a URL (http, https, ftp, or file) to a local path
pub trait Downloader {
    fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Reads members out of a package archive
pub trait Archive {
    /// Write the archive's control data to the given sink
    fn extract_control(&self, path: &Path, out: &mut dyn Write) -> Result<()>;

    /// Write the archive's data-member file list to the given sink, one
    /// path per line
    fn extract_file_list(&self, path: &Path, out: &mut dyn Write) -> Result<()>;
}
