// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Core error types for picopkg
#[derive(Error, Debug)]
pub enum Error {
    /// A control stanza could not be parsed into a valid record
    #[error("malformed control stanza: {0}")]
    Malformed(String),

    /// A name was looked up that has no abstract entry and no provider
    #[error("unknown package: {0}")]
    UnknownPackage(String),

    /// A required dependency could not be satisfied
    #[error("cannot satisfy dependency: {0}")]
    Unsatisfied(String),

    /// A package conflicts with an installed package it does not replace
    #[error("package {0} conflicts with installed package {1}")]
    Conflict(String, String),

    /// An integrity check found a different version than expected
    #[error("version mismatch for {package}: expected {expected}, found {actual}")]
    VersionMismatch {
        package: String,
        expected: String,
        actual: String,
    },

    /// Collaborator I/O failure
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using picopkg's Error type
pub type Result<T> = std::result::Result<T, Error>;
