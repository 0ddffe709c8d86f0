// src/control/mod.rs

//! Control-file parsing
//!
//! Reads stanza streams (feed lists, extracted control files, the installed
//! status database) into [`Package`](crate::pkg::Package) records. A stanza
//! is a contiguous run of non-blank lines; a blank line ends it. Lines
//! beginning with a space continue the preceding `Description` or
//! `Conffiles` field.

mod parser;

pub use parser::{parse_stanza, ControlParser};

use serde::{Deserialize, Serialize};

/// Selects which control fields the parser materializes
///
/// Masked-out fields are recognized and skipped without being stored, which
/// keeps bulk feed parsing cheap on small devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMask(u32);

impl FieldMask {
    pub const NONE: FieldMask = FieldMask(0);

    pub const PACKAGE: FieldMask = FieldMask(1 << 0);
    pub const VERSION: FieldMask = FieldMask(1 << 1);
    pub const ARCHITECTURE: FieldMask = FieldMask(1 << 2);
    pub const MAINTAINER: FieldMask = FieldMask(1 << 3);
    pub const SECTION: FieldMask = FieldMask(1 << 4);
    pub const PRIORITY: FieldMask = FieldMask(1 << 5);
    pub const SOURCE: FieldMask = FieldMask(1 << 6);
    pub const FILENAME: FieldMask = FieldMask(1 << 7);
    pub const SIZE: FieldMask = FieldMask(1 << 8);
    pub const INSTALLED_SIZE: FieldMask = FieldMask(1 << 9);
    pub const INSTALLED_TIME: FieldMask = FieldMask(1 << 10);
    pub const MD5SUM: FieldMask = FieldMask(1 << 11);
    pub const SHA256SUM: FieldMask = FieldMask(1 << 12);
    pub const DESCRIPTION: FieldMask = FieldMask(1 << 13);
    pub const TAGS: FieldMask = FieldMask(1 << 14);
    pub const DEPENDS: FieldMask = FieldMask(1 << 15);
    pub const PRE_DEPENDS: FieldMask = FieldMask(1 << 16);
    pub const RECOMMENDS: FieldMask = FieldMask(1 << 17);
    pub const SUGGESTS: FieldMask = FieldMask(1 << 18);
    pub const CONFLICTS: FieldMask = FieldMask(1 << 19);
    pub const PROVIDES: FieldMask = FieldMask(1 << 20);
    pub const REPLACES: FieldMask = FieldMask(1 << 21);
    pub const CONFFILES: FieldMask = FieldMask(1 << 22);
    pub const STATUS: FieldMask = FieldMask(1 << 23);
    pub const ESSENTIAL: FieldMask = FieldMask(1 << 24);
    pub const AUTO_INSTALLED: FieldMask = FieldMask(1 << 25);

    pub const ALL: FieldMask = FieldMask((1 << 26) - 1);

    pub fn contains(&self, other: FieldMask) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub fn with(self, other: FieldMask) -> FieldMask {
        FieldMask(self.0 | other.0)
    }

    #[must_use]
    pub fn without(self, other: FieldMask) -> FieldMask {
        FieldMask(self.0 & !other.0)
    }
}

impl Default for FieldMask {
    fn default() -> Self {
        FieldMask::ALL
    }
}

/// Options controlling a parse run
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Fields to materialize
    pub mask: FieldMask,
    /// Join description continuations with newlines (terminal display)
    /// instead of raw concatenation
    pub terminal_output: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            mask: FieldMask::ALL,
            terminal_output: false,
        }
    }
}

impl ParseOptions {
    /// Options honoring the globally configured parse-field mask
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            mask: config.parse_mask,
            terminal_output: config.terminal_output,
        }
    }
}
