// src/pkg/mod.rs

//! The concrete package record
//!
//! A `Package` is one specific (name, version, architecture) tuple as read
//! from a feed list, a control file, or the installed-status database. Two
//! records with the same identity are merged rather than duplicated; merging
//! keeps existing fields and adopts only what the old record was missing.

mod format;
mod state;

pub use format::{depend_string, stanza_string, write_stanza};
pub use state::{StateFlags, StateStatus, StateWant};

use crate::conffile::Conffile;
use crate::depend::{CompoundDepend, DependKind};
use crate::version::PkgVersion;

/// A concrete package record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Package {
    pub name: String,
    pub version: PkgVersion,
    pub architecture: Option<String>,
    /// Rank of the architecture in the configured priority list; higher wins
    pub arch_priority: u32,
    /// Name of the feed source this record came from
    pub src: Option<String>,
    /// Name of the install destination this record is bound to
    pub dest: Option<String>,
    /// Path of the archive on the remote feed
    pub filename: Option<String>,
    /// Path of the downloaded archive on disk
    pub local_filename: Option<String>,
    pub size: u64,
    pub installed_size: u64,
    pub installed_time: u64,
    pub md5sum: Option<String>,
    pub sha256sum: Option<String>,
    pub section: Option<String>,
    pub maintainer: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub source: Option<String>,
    pub tags: Option<String>,
    pub conffiles: Vec<Conffile>,
    pub auto_installed: bool,
    pub essential: bool,
    pub provided_by_hand: bool,
    pub state_want: StateWant,
    pub state_flags: StateFlags,
    pub state_status: StateStatus,
    /// All dependency groups: pre-depends, depends, recommends, suggests,
    /// and greedy groups, in source order
    pub depends: Vec<CompoundDepend>,
    pub conflicts: Vec<CompoundDepend>,
    /// Names this package provides; its own name is always present
    pub provides: Vec<String>,
    pub replaces: Vec<String>,
}

impl Package {
    pub fn new(name: impl Into<String>, version: &str) -> Self {
        Self {
            name: name.into(),
            version: PkgVersion::parse(version),
            ..Default::default()
        }
    }

    /// Whether this record names the same package as another
    /// (same name, version, and architecture)
    pub fn same_identity(&self, other: &Package) -> bool {
        self.name == other.name
            && self.version.compare(&other.version) == std::cmp::Ordering::Equal
            && self.architecture == other.architecture
    }

    /// Dependency groups of one kind, in source order
    pub fn depends_of_kind(&self, kind: DependKind) -> impl Iterator<Item = &CompoundDepend> {
        self.depends.iter().filter(move |d| d.kind == kind)
    }

    /// Whether any conflict group names the given abstract package
    pub fn conflicts_with_name(&self, name: &str) -> bool {
        self.conflicts
            .iter()
            .any(|c| c.possibilities.iter().any(|d| d.name == name))
    }

    /// Make sure the package's own name is element 0 of its provides list
    pub fn ensure_self_provided(&mut self) {
        if self.provides.first().map(String::as_str) != Some(self.name.as_str()) {
            let name = self.name.clone();
            self.provides.retain(|p| *p != name);
            self.provides.insert(0, name);
        }
    }

    /// Merge any new information from `newpkg` into this record
    ///
    /// Field-wise: a value is adopted only when this record does not already
    /// have one.
    pub fn merge(&mut self, newpkg: Package) {
        if !self.auto_installed {
            self.auto_installed = newpkg.auto_installed;
        }
        if self.src.is_none() {
            self.src = newpkg.src;
        }
        if self.dest.is_none() {
            self.dest = newpkg.dest;
        }
        if self.architecture.is_none() {
            self.architecture = newpkg.architecture;
        }
        if self.arch_priority == 0 {
            self.arch_priority = newpkg.arch_priority;
        }
        if self.section.is_none() {
            self.section = newpkg.section;
        }
        if self.maintainer.is_none() {
            self.maintainer = newpkg.maintainer;
        }
        if self.description.is_none() {
            self.description = newpkg.description;
        }
        if self.depends.is_empty() {
            self.depends = newpkg.depends;
        }
        // a provides list holding only the self-entry carries no information
        if self.provides.len() <= 1 {
            self.provides = newpkg.provides;
        }
        if self.conflicts.is_empty() {
            self.conflicts = newpkg.conflicts;
        }
        if self.replaces.is_empty() {
            self.replaces = newpkg.replaces;
        }
        if self.filename.is_none() {
            self.filename = newpkg.filename;
        }
        if self.local_filename.is_none() {
            self.local_filename = newpkg.local_filename;
        }
        if self.md5sum.is_none() {
            self.md5sum = newpkg.md5sum;
        }
        if self.sha256sum.is_none() {
            self.sha256sum = newpkg.sha256sum;
        }
        if self.size == 0 {
            self.size = newpkg.size;
        }
        if self.installed_size == 0 {
            self.installed_size = newpkg.installed_size;
        }
        if self.installed_time == 0 {
            self.installed_time = newpkg.installed_time;
        }
        if self.priority.is_none() {
            self.priority = newpkg.priority;
        }
        if self.source.is_none() {
            self.source = newpkg.source;
        }
        if self.tags.is_none() {
            self.tags = newpkg.tags;
        }
        if self.conffiles.is_empty() {
            self.conffiles = newpkg.conffiles;
        }
        if !self.essential {
            self.essential = newpkg.essential;
        }
        self.ensure_self_provided();
    }
}
