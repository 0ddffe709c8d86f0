// src/db/mod.rs

//! The package database
//!
//! Holds every known package record and the abstract-package graph that
//! relates names, providers, and replacements. Records live in arenas and
//! are addressed by stable IDs; all cross-references are IDs, never owning
//! pointers, because the abstract/concrete/provider graph is cyclic.
//!
//! Lifecycle: create with a [`Config`], populate from feeds and the status
//! database, query during resolution, mutate as installs proceed.

use crate::config::Config;
use crate::control::{ControlParser, FieldMask, ParseOptions};
use crate::depend::DependKind;
use crate::error::{Error, Result};
use crate::pkg::{write_stanza, Package, StateFlags};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use tracing::{debug, info};

/// Stable handle for an abstract package (a name)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AbstractId(u32);

impl AbstractId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Stable handle for a concrete package record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PkgId(u32);

impl PkgId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// The identity of a name that packages can provide or depend upon
///
/// Every concrete record is reachable through the abstract entry for its
/// own name; `provided_by` always contains the abstract itself.
#[derive(Debug)]
pub struct AbstractPackage {
    pub name: String,
    /// Concrete records carrying exactly this name
    pub pkgs: Vec<PkgId>,
    /// Abstracts whose packages declare this name in their Provides
    pub provided_by: Vec<AbstractId>,
    /// Abstracts whose packages both replace and conflict with this name
    pub replaced_by: Vec<AbstractId>,
    /// Abstracts whose packages depend on this name; rebuilt on demand
    pub depended_upon_by: Vec<AbstractId>,
    /// Sticky flags propagated to concrete records at insert
    pub flags: StateFlags,
}

impl AbstractPackage {
    fn new(name: String) -> Self {
        Self {
            name,
            pkgs: Vec::new(),
            provided_by: Vec::new(),
            replaced_by: Vec::new(),
            depended_upon_by: Vec::new(),
            flags: StateFlags::OK,
        }
    }
}

/// In-memory package database
pub struct PackageDb {
    config: Config,
    abstracts: Vec<AbstractPackage>,
    packages: Vec<Package>,
    by_name: HashMap<String, AbstractId>,
}

impl PackageDb {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            abstracts: Vec::new(),
            packages: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of concrete records
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Iterate all concrete records
    pub fn iter(&self) -> impl Iterator<Item = (PkgId, &Package)> {
        self.packages
            .iter()
            .enumerate()
            .map(|(i, p)| (PkgId(i as u32), p))
    }

    /// Iterate all abstract entries
    pub fn abstracts(&self) -> impl Iterator<Item = (AbstractId, &AbstractPackage)> {
        self.abstracts
            .iter()
            .enumerate()
            .map(|(i, a)| (AbstractId(i as u32), a))
    }

    pub fn package(&self, id: PkgId) -> &Package {
        &self.packages[id.index()]
    }

    pub fn package_mut(&mut self, id: PkgId) -> &mut Package {
        &mut self.packages[id.index()]
    }

    pub fn abstract_pkg(&self, id: AbstractId) -> &AbstractPackage {
        &self.abstracts[id.index()]
    }

    pub fn abstract_pkg_mut(&mut self, id: AbstractId) -> &mut AbstractPackage {
        &mut self.abstracts[id.index()]
    }

    pub fn abstract_by_name(&self, name: &str) -> Option<AbstractId> {
        self.by_name.get(name).copied()
    }

    /// Get or create the abstract entry for a name
    pub fn intern_abstract(&mut self, name: &str) -> AbstractId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = AbstractId(self.abstracts.len() as u32);
        self.abstracts.push(AbstractPackage::new(name.to_string()));
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Insert a concrete record, wiring it into the provides graph
    ///
    /// A record with the same identity (name, version, architecture) as an
    /// existing one is merged into it instead: existing fields win, missing
    /// fields are adopted.
    pub fn insert(&mut self, mut pkg: Package) -> PkgId {
        pkg.ensure_self_provided();

        if pkg.arch_priority == 0 {
            if let Some(arch) = &pkg.architecture {
                if let Some(priority) = self.config.arch_priority(arch) {
                    pkg.arch_priority = priority;
                }
            }
        }

        let ab = self.intern_abstract(&pkg.name);

        if self.abstracts[ab.index()].flags.has(StateFlags::NEED_DETAIL)
            && !pkg.state_flags.has(StateFlags::NEED_DETAIL)
        {
            debug!("propagating detail request to {}", pkg.name);
            pkg.state_flags.insert(StateFlags::NEED_DETAIL);
        }

        let existing = self.abstracts[ab.index()]
            .pkgs
            .iter()
            .copied()
            .find(|&id| self.packages[id.index()].same_identity(&pkg));

        let id = match existing {
            Some(id) => {
                debug!("merging duplicate record for {} {}", pkg.name, pkg.version);
                self.packages[id.index()].merge(pkg);
                id
            }
            None => {
                let id = PkgId(self.packages.len() as u32);
                self.packages.push(pkg);
                self.abstracts[ab.index()].pkgs.push(id);
                id
            }
        };

        let record = &self.packages[id.index()];
        let provides = record.provides.clone();
        let replaces: Vec<(String, bool)> = record
            .replaces
            .iter()
            .map(|name| (name.clone(), record.conflicts_with_name(name)))
            .collect();

        for name in provides {
            let provided = self.intern_abstract(&name);
            let entry = &mut self.abstracts[provided.index()];
            if !entry.provided_by.contains(&ab) {
                entry.provided_by.push(ab);
            }
        }

        for (name, also_conflicts) in replaces {
            let replaced = self.intern_abstract(&name);
            // a replacement only carries upgrade intent when the package
            // also conflicts with what it replaces
            if also_conflicts {
                let entry = &mut self.abstracts[replaced.index()];
                if !entry.replaced_by.contains(&ab) {
                    entry.replaced_by.push(ab);
                }
            }
        }

        id
    }

    /// The currently installed record for a name, if any
    pub fn fetch_installed(&self, name: &str) -> Option<PkgId> {
        let ab = self.abstract_by_name(name)?;
        self.abstracts[ab.index()]
            .pkgs
            .iter()
            .copied()
            .find(|&id| self.packages[id.index()].state_status.is_installed())
    }

    /// Snapshot of every installed or unpacked record
    pub fn fetch_all_installed(&self) -> Vec<PkgId> {
        self.iter()
            .filter(|(_, p)| p.state_status.is_installed())
            .map(|(id, _)| id)
            .collect()
    }

    /// Whether a record's architecture is allowed by the configuration
    pub fn arch_supported(&self, pkg: &Package) -> bool {
        match &pkg.architecture {
            None => true,
            Some(arch) => self.config.arch_priority(arch).is_some(),
        }
    }

    /// The best record in the provider closure of an abstract that matches
    /// the predicate
    ///
    /// Candidates are ranked by (architecture priority, version), both
    /// descending. With `honor_arch`, records whose architecture is not
    /// configured are not candidates.
    pub fn best_candidate<F>(&self, ab: AbstractId, predicate: F, honor_arch: bool) -> Option<PkgId>
    where
        F: Fn(&Package) -> bool,
    {
        let mut best: Option<PkgId> = None;

        for &provider in &self.abstracts[ab.index()].provided_by {
            for &id in &self.abstracts[provider.index()].pkgs {
                let pkg = &self.packages[id.index()];
                if honor_arch && !self.arch_supported(pkg) {
                    continue;
                }
                if !predicate(pkg) {
                    continue;
                }
                best = match best {
                    None => Some(id),
                    Some(current) => {
                        let cur = &self.packages[current.index()];
                        let better = pkg.arch_priority > cur.arch_priority
                            || (pkg.arch_priority == cur.arch_priority
                                && pkg.version.compare(&cur.version)
                                    == std::cmp::Ordering::Greater);
                        if better {
                            Some(id)
                        } else {
                            Some(current)
                        }
                    }
                };
            }
        }

        best
    }

    /// The best installable record for a name
    ///
    /// Errors with [`Error::UnknownPackage`] when the name has no abstract
    /// entry or no candidate at all.
    pub fn fetch_best_installation_candidate(&self, name: &str) -> Result<PkgId> {
        let ab = self
            .abstract_by_name(name)
            .ok_or_else(|| Error::UnknownPackage(name.to_string()))?;
        self.best_candidate(ab, |_| true, true)
            .ok_or_else(|| Error::UnknownPackage(name.to_string()))
    }

    /// Rebuild the reverse-dependency index on every abstract entry
    ///
    /// Pre-depends, depends, and recommends count; suggests do not.
    pub fn rebuild_depended_upon_by(&mut self) {
        for entry in &mut self.abstracts {
            entry.depended_upon_by.clear();
        }

        for ab_index in 0..self.abstracts.len() {
            let ab = AbstractId(ab_index as u32);
            let mut targets: Vec<String> = Vec::new();
            for &id in &self.abstracts[ab_index].pkgs {
                for compound in &self.packages[id.index()].depends {
                    if !matches!(
                        compound.kind,
                        DependKind::PreDepend | DependKind::Depend | DependKind::Recommend
                    ) {
                        continue;
                    }
                    for atom in &compound.possibilities {
                        targets.push(atom.name.clone());
                    }
                }
            }
            for name in targets {
                let target = self.intern_abstract(&name);
                let entry = &mut self.abstracts[target.index()];
                if !entry.depended_upon_by.contains(&ab) {
                    entry.depended_upon_by.push(ab);
                }
            }
        }
    }

    /// Populate from a Packages feed, tagging records with their source
    pub fn load_feed<R: BufRead>(&mut self, reader: R, src: Option<&str>) -> usize {
        let opts = ParseOptions::from_config(&self.config);
        let mut count = 0;
        let mut parser = ControlParser::with_options(reader, opts);
        while let Some(mut pkg) = parser.next_package() {
            if let Some(src) = src {
                pkg.src = Some(src.to_string());
            }
            self.insert(pkg);
            count += 1;
        }
        info!("loaded {} records from feed {}", count, src.unwrap_or("-"));
        count
    }

    /// Populate from the installed-status database
    ///
    /// Status stanzas are always parsed with the full field mask.
    pub fn load_status<R: BufRead>(&mut self, reader: R) -> usize {
        let opts = ParseOptions {
            mask: FieldMask::ALL,
            terminal_output: self.config.terminal_output,
        };
        let mut count = 0;
        let mut parser = ControlParser::with_options(reader, opts);
        while let Some(pkg) = parser.next_package() {
            self.insert(pkg);
            count += 1;
        }
        info!("loaded {} records from status database", count);
        count
    }

    /// Write the installed-status database: one stanza per package that has
    /// left the not-installed state, each terminated by a blank line
    pub fn write_status<W: Write>(&self, w: &mut W) -> io::Result<()> {
        for pkg in &self.packages {
            if pkg.state_status == crate::pkg::StateStatus::NotInstalled {
                continue;
            }
            write_stanza(w, pkg)?;
            writeln!(w)?;
        }
        Ok(())
    }
}

impl Default for PackageDb {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
