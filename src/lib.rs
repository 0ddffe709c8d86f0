// src/lib.rs

//! Picopkg Package-Manager Core
//!
//! The dependency resolver, package database, and control-file parser of a
//! package manager for resource-constrained Linux devices. Speaks the
//! classic control-file dialect: stanzas of `Field: value` lines with
//! `Depends`, `Conflicts`, `Provides`, `Replaces`, version epochs, and
//! `Conffiles`.
//!
//! # Architecture
//!
//! - Arena-backed database: abstract packages (names) and concrete records
//!   are addressed by stable IDs; the provides graph is cyclic by nature
//! - Parser economy: a field mask lets bulk feed parsing skip fields that
//!   small devices never look at
//! - Resolution never throws: unsatisfiable groups surface as printable
//!   entries for the caller to render
//! - Retrieval, extraction, and hashing stay behind collaborator traits
//!
//! Out of scope here, by design: network transfer, archive unpacking,
//! filesystem installation, and the command line driving it all.

pub mod conffile;
pub mod config;
pub mod control;
pub mod db;
pub mod depend;
pub mod digest;
mod error;
pub mod pkg;
pub mod resolver;
pub mod transport;
pub mod version;

pub use conffile::{Conffile, DigestKind};
pub use config::{ArchPriority, Config};
pub use control::{ControlParser, FieldMask, ParseOptions};
pub use db::{AbstractId, AbstractPackage, PackageDb, PkgId};
pub use depend::{CompoundDepend, Depend, DependKind};
pub use digest::{DigestProvider, FsDigest};
pub use error::{Error, Result};
pub use pkg::{
    stanza_string, write_stanza, Package, StateFlags, StateStatus, StateWant,
};
pub use resolver::Resolver;
pub use transport::{Archive, Downloader};
pub use version::{PkgVersion, VersionRelation};
