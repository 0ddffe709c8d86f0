// src/resolver/mod.rs

//! Dependency resolution
//!
//! Walks a package's dependency groups against the database and reports
//! what else must be installed and what cannot be satisfied. Resolution
//! never fails hard: every unsatisfiable required group becomes an entry in
//! the unresolved list and the caller decides what to do with it.
//!
//! Traversals are guarded against cycles by a visited set of abstract
//! packages created fresh for each top-level call, so repeated calls give
//! identical answers and cyclic graphs terminate.

use crate::db::{AbstractId, PackageDb, PkgId};
use crate::depend::{CompoundDepend, Depend, DependKind};
use crate::error::{Error, Result};
use crate::pkg::{Package, StateStatus, StateWant};
use std::collections::HashSet;
use tracing::{debug, info};

/// Dependency resolver over a populated database
pub struct Resolver<'db> {
    db: &'db PackageDb,
}

impl<'db> Resolver<'db> {
    pub fn new(db: &'db PackageDb) -> Self {
        Self { db }
    }

    /// Compute what must be installed to satisfy a package's dependencies
    ///
    /// Returns the records to install (dependencies first discovered, in
    /// visit order) and the printable forms of required groups that no
    /// candidate can satisfy. Groups already satisfied by an installed
    /// package contribute nothing.
    pub fn unsatisfied(&self, pkg: PkgId) -> (Vec<PkgId>, Vec<String>) {
        let mut visited = HashSet::new();
        let mut to_install = Vec::new();
        let mut unresolved = Vec::new();
        self.unsatisfied_inner(pkg, &mut visited, &mut to_install, &mut unresolved);
        (to_install, unresolved)
    }

    fn unsatisfied_inner(
        &self,
        id: PkgId,
        visited: &mut HashSet<AbstractId>,
        to_install: &mut Vec<PkgId>,
        unresolved: &mut Vec<String>,
    ) {
        let pkg = self.db.package(id);
        let Some(ab) = self.db.abstract_by_name(&pkg.name) else {
            return;
        };
        if !visited.insert(ab) {
            return;
        }

        for compound in &pkg.depends {
            if compound.kind == DependKind::Greedy {
                self.greedy_satisfiers(compound, visited, to_install);
                continue;
            }

            // first pass: an installed provider already satisfies the group
            let mut found = false;
            for atom in &compound.possibilities {
                if let Some(target) = self.db.abstract_by_name(&atom.name) {
                    let installed_match = self.db.best_candidate(
                        target,
                        |p| p.state_status.is_installed() && atom.satisfied_by(&p.version),
                        true,
                    );
                    if installed_match.is_some() {
                        found = true;
                        break;
                    }
                }
            }
            if found {
                continue;
            }

            // second pass: any provider at all
            let mut satisfier: Option<PkgId> = None;
            for atom in &compound.possibilities {
                let Some(target) = self.db.abstract_by_name(&atom.name) else {
                    continue;
                };
                let Some(best) =
                    self.db
                        .best_candidate(target, |p| atom.satisfied_by(&p.version), true)
                else {
                    continue;
                };

                let best_pkg = self.db.package(best);
                if matches!(compound.kind, DependKind::Recommend | DependKind::Suggest)
                    && matches!(
                        best_pkg.state_want,
                        StateWant::Deinstall | StateWant::Purge
                    )
                {
                    info!(
                        "{}: ignoring recommendation for {} at user request",
                        pkg.name, best_pkg.name
                    );
                    continue;
                }

                satisfier = Some(best);
                break;
            }

            match satisfier {
                Some(best) => {
                    if compound.kind == DependKind::Suggest {
                        info!(
                            "package {} suggests installing {}",
                            pkg.name,
                            self.db.package(best).name
                        );
                        continue;
                    }
                    if best != id && !to_install.contains(&best) {
                        to_install.push(best);
                        self.unsatisfied_inner(best, visited, to_install, unresolved);
                    }
                }
                None => {
                    if matches!(compound.kind, DependKind::Recommend | DependKind::Suggest) {
                        info!(
                            "{}: unsatisfied recommendation for {}",
                            pkg.name, compound.possibilities[0].name
                        );
                    } else {
                        unresolved.push(compound.to_string());
                    }
                }
            }
        }
    }

    /// Opportunistically pick up satisfiers for a greedy group
    ///
    /// A candidate is added only when its own dependency closure is clean
    /// and everything it drags in is already marked for install.
    fn greedy_satisfiers(
        &self,
        compound: &CompoundDepend,
        visited: &mut HashSet<AbstractId>,
        to_install: &mut Vec<PkgId>,
    ) {
        for atom in &compound.possibilities {
            let Some(target) = self.db.abstract_by_name(&atom.name) else {
                continue;
            };
            for &provider in &self.db.abstract_pkg(target).provided_by {
                for &candidate in &self.db.abstract_pkg(provider).pkgs {
                    let scout = self.db.package(candidate);
                    if scout.state_want == StateWant::Install {
                        continue;
                    }
                    let Some(scout_ab) = self.db.abstract_by_name(&scout.name) else {
                        continue;
                    };
                    if visited.contains(&scout_ab) || to_install.contains(&candidate) {
                        continue;
                    }

                    let mut discovered = Vec::new();
                    let mut missing = Vec::new();
                    self.unsatisfied_inner(candidate, visited, &mut discovered, &mut missing);

                    if !missing.is_empty() {
                        debug!("not installing {} due to broken depends", scout.name);
                        continue;
                    }

                    let blocker = discovered
                        .iter()
                        .find(|&&d| self.db.package(d).state_want != StateWant::Install);
                    match blocker {
                        Some(&d) => debug!(
                            "not installing {} due to requirement for {}",
                            scout.name,
                            self.db.package(d).name
                        ),
                        None => {
                            info!("adding satisfier for greedy dependence {}", scout.name);
                            to_install.push(candidate);
                        }
                    }
                }
            }
        }
    }

    /// Installed (or install-wanted) packages this one genuinely conflicts
    /// with
    ///
    /// A match that the package also replaces is an upgrade, not a conflict.
    pub fn conflicts(&self, id: PkgId) -> Vec<PkgId> {
        let pkg = self.db.package(id);
        let mut result = Vec::new();

        for compound in &pkg.conflicts {
            for atom in &compound.possibilities {
                let Some(target) = self.db.abstract_by_name(&atom.name) else {
                    continue;
                };
                for &candidate in &self.db.abstract_pkg(target).pkgs {
                    if candidate == id {
                        continue;
                    }
                    let scout = self.db.package(candidate);
                    if scout.state_status != StateStatus::Installed
                        && scout.state_want != StateWant::Install
                    {
                        continue;
                    }
                    if !atom.satisfied_by(&scout.version) {
                        continue;
                    }
                    if self.replaces_record(pkg, scout) {
                        debug!("{} replaces {}, not a conflict", pkg.name, scout.name);
                        continue;
                    }
                    if !result.contains(&candidate) {
                        result.push(candidate);
                    }
                }
            }
        }

        result
    }

    /// Error out on the first real conflict, for callers that treat
    /// conflicts as fatal
    pub fn check_conflicts(&self, id: PkgId) -> Result<()> {
        match self.conflicts(id).first() {
            Some(&other) => Err(Error::Conflict(
                self.db.package(id).name.clone(),
                self.db.package(other).name.clone(),
            )),
            None => Ok(()),
        }
    }

    /// Whether `pkg` replaces `other`: their Replaces and Provides lists
    /// intersect
    pub fn replaces(&self, pkg: PkgId, other: PkgId) -> bool {
        self.replaces_record(self.db.package(pkg), self.db.package(other))
    }

    fn replaces_record(&self, pkg: &Package, other: &Package) -> bool {
        pkg.replaces
            .iter()
            .any(|r| other.provides.iter().any(|p| p == r))
    }

    /// Whether any known record could satisfy the atom
    pub fn dependence_satisfiable(&self, atom: &Depend) -> bool {
        self.any_satisfier(atom, false)
    }

    /// Whether an installed record satisfies the atom
    pub fn dependence_satisfied(&self, atom: &Depend) -> bool {
        self.any_satisfier(atom, true)
    }

    fn any_satisfier(&self, atom: &Depend, installed_only: bool) -> bool {
        let Some(target) = self.db.abstract_by_name(&atom.name) else {
            return false;
        };
        for &provider in &self.db.abstract_pkg(target).provided_by {
            for &id in &self.db.abstract_pkg(provider).pkgs {
                let pkg = self.db.package(id);
                if installed_only && !pkg.state_status.is_installed() {
                    continue;
                }
                if atom.satisfied_by(&pkg.version) {
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::depend::parse_deplist;

    fn test_db() -> PackageDb {
        let mut config = Config::default();
        config.add_arch("armv7", 10);
        PackageDb::new(config)
    }

    fn installed(name: &str, version: &str) -> Package {
        let mut pkg = Package::new(name, version);
        pkg.architecture = Some("armv7".to_string());
        pkg.state_want = StateWant::Install;
        pkg.state_status = StateStatus::Installed;
        pkg
    }

    fn available(name: &str, version: &str) -> Package {
        let mut pkg = Package::new(name, version);
        pkg.architecture = Some("armv7".to_string());
        pkg
    }

    fn with_depends(mut pkg: Package, deps: &str) -> Package {
        pkg.depends = parse_deplist(deps, DependKind::Depend);
        pkg
    }

    #[test]
    fn test_satisfied_by_installed_dep() {
        let mut db = test_db();
        db.insert(installed("liba", "1.0"));
        let b = db.insert(with_depends(available("b", "2.0"), "liba (>= 1.0)"));

        let (to_install, unresolved) = Resolver::new(&db).unsatisfied(b);
        assert!(to_install.is_empty());
        assert!(unresolved.is_empty());
    }

    #[test]
    fn test_missing_versioned_dep_reported() {
        let mut db = test_db();
        db.insert(installed("liba", "1.0"));
        let b = db.insert(with_depends(available("b", "2.0"), "liba (>= 2.0)"));

        let (to_install, unresolved) = Resolver::new(&db).unsatisfied(b);
        assert!(to_install.is_empty());
        assert_eq!(unresolved, ["liba (>= 2.0)"]);
    }

    #[test]
    fn test_alternative_satisfied_by_second_atom() {
        let mut db = test_db();
        db.insert(installed("y", "1.0"));
        let c = db.insert(with_depends(available("c", "1.0"), "x | y"));

        let (to_install, unresolved) = Resolver::new(&db).unsatisfied(c);
        assert!(to_install.is_empty());
        assert!(unresolved.is_empty());
    }

    #[test]
    fn test_provides_satisfies_dep() {
        let mut db = test_db();
        let mut postfix = installed("postfix", "3.0");
        postfix.provides = vec!["mail-transport-agent".to_string()];
        db.insert(postfix);
        let c = db.insert(with_depends(available("c", "1.0"), "mail-transport-agent"));

        let (to_install, unresolved) = Resolver::new(&db).unsatisfied(c);
        assert!(to_install.is_empty());
        assert!(unresolved.is_empty());
    }

    #[test]
    fn test_uninstalled_satisfier_queued() {
        let mut db = test_db();
        let lib = db.insert(available("lib", "1.0"));
        let app = db.insert(with_depends(available("app", "1.0"), "lib"));

        let (to_install, unresolved) = Resolver::new(&db).unsatisfied(app);
        assert_eq!(to_install, [lib]);
        assert!(unresolved.is_empty());
    }

    #[test]
    fn test_transitive_deps_queued() {
        let mut db = test_db();
        let base = db.insert(available("base", "1.0"));
        let mid = db.insert(with_depends(available("mid", "1.0"), "base"));
        let top = db.insert(with_depends(available("top", "1.0"), "mid"));

        let (to_install, unresolved) = Resolver::new(&db).unsatisfied(top);
        assert_eq!(to_install, [mid, base]);
        assert!(unresolved.is_empty());
    }

    #[test]
    fn test_no_deps_yields_empty() {
        let mut db = test_db();
        let solo = db.insert(available("solo", "1.0"));
        let (to_install, unresolved) = Resolver::new(&db).unsatisfied(solo);
        assert!(to_install.is_empty());
        assert!(unresolved.is_empty());
    }

    #[test]
    fn test_repeated_calls_identical() {
        let mut db = test_db();
        db.insert(available("lib", "1.0"));
        let app = db.insert(with_depends(available("app", "1.0"), "lib, ghost (>= 9.0)"));

        let resolver = Resolver::new(&db);
        let first = resolver.unsatisfied(app);
        let second = resolver.unsatisfied(app);
        assert_eq!(first, second);
    }

    #[test]
    fn test_cycle_terminates() {
        let mut db = test_db();
        let a = db.insert(with_depends(available("a", "1.0"), "b"));
        db.insert(with_depends(available("b", "1.0"), "c"));
        db.insert(with_depends(available("c", "1.0"), "a"));

        let (to_install, unresolved) = Resolver::new(&db).unsatisfied(a);
        assert_eq!(to_install.len(), 3, "each member queued exactly once");
        assert!(unresolved.is_empty());
    }

    #[test]
    fn test_self_cycle_terminates() {
        let mut db = test_db();
        let a = db.insert(with_depends(available("narcissist", "1.0"), "narcissist"));
        let (to_install, unresolved) = Resolver::new(&db).unsatisfied(a);
        assert!(to_install.is_empty());
        assert!(unresolved.is_empty());
    }

    #[test]
    fn test_unknown_name_unresolved() {
        let mut db = test_db();
        let app = db.insert(with_depends(available("app", "1.0"), "no-such-thing"));
        let (_, unresolved) = Resolver::new(&db).unsatisfied(app);
        assert_eq!(unresolved, ["no-such-thing"]);
    }

    #[test]
    fn test_recommend_missing_is_not_an_error() {
        let mut db = test_db();
        let mut app = available("app", "1.0");
        app.depends = parse_deplist("nice-to-have", DependKind::Recommend);
        let app = db.insert(app);

        let (to_install, unresolved) = Resolver::new(&db).unsatisfied(app);
        assert!(to_install.is_empty());
        assert!(unresolved.is_empty());
    }

    #[test]
    fn test_recommend_satisfier_queued() {
        let mut db = test_db();
        let docs = db.insert(available("docs", "1.0"));
        let mut app = available("app", "1.0");
        app.depends = parse_deplist("docs", DependKind::Recommend);
        let app = db.insert(app);

        let (to_install, _) = Resolver::new(&db).unsatisfied(app);
        assert_eq!(to_install, [docs]);
    }

    #[test]
    fn test_recommend_vetoed_by_user() {
        let mut db = test_db();
        let mut docs = available("docs", "1.0");
        docs.state_want = StateWant::Deinstall;
        db.insert(docs);
        let mut app = available("app", "1.0");
        app.depends = parse_deplist("docs", DependKind::Recommend);
        let app = db.insert(app);

        let (to_install, unresolved) = Resolver::new(&db).unsatisfied(app);
        assert!(to_install.is_empty());
        assert!(unresolved.is_empty());
    }

    #[test]
    fn test_suggest_never_queued() {
        let mut db = test_db();
        db.insert(available("examples", "1.0"));
        let mut app = available("app", "1.0");
        app.depends = parse_deplist("examples", DependKind::Suggest);
        let app = db.insert(app);

        let (to_install, unresolved) = Resolver::new(&db).unsatisfied(app);
        assert!(to_install.is_empty());
        assert!(unresolved.is_empty());
    }

    #[test]
    fn test_greedy_adds_clean_satisfier() {
        let mut db = test_db();
        let plugin = db.insert(available("fancy-plugin", "1.0"));
        let mut core = available("core", "1.0");
        core.depends = parse_deplist("fancy-plugin *", DependKind::Depend);
        let core = db.insert(core);

        let (to_install, unresolved) = Resolver::new(&db).unsatisfied(core);
        assert_eq!(to_install, [plugin]);
        assert!(unresolved.is_empty());
    }

    #[test]
    fn test_greedy_skips_broken_satisfier() {
        let mut db = test_db();
        db.insert(with_depends(available("fancy-plugin", "1.0"), "ghost"));
        let mut core = available("core", "1.0");
        core.depends = parse_deplist("fancy-plugin *", DependKind::Depend);
        let core = db.insert(core);

        let (to_install, unresolved) = Resolver::new(&db).unsatisfied(core);
        assert!(to_install.is_empty(), "satisfier with broken deps is skipped");
        assert!(unresolved.is_empty(), "greedy failures are silent");
    }

    #[test]
    fn test_greedy_skips_satisfier_needing_unwanted_pkg() {
        let mut db = test_db();
        // helper exists but is not marked for install
        db.insert(available("helper", "1.0"));
        db.insert(with_depends(available("fancy-plugin", "1.0"), "helper"));
        let mut core = available("core", "1.0");
        core.depends = parse_deplist("fancy-plugin *", DependKind::Depend);
        let core = db.insert(core);

        let (to_install, unresolved) = Resolver::new(&db).unsatisfied(core);
        assert!(to_install.is_empty());
        assert!(unresolved.is_empty());
    }

    #[test]
    fn test_greedy_skips_already_wanted() {
        let mut db = test_db();
        let mut plugin = available("fancy-plugin", "1.0");
        plugin.state_want = StateWant::Install;
        db.insert(plugin);
        let mut core = available("core", "1.0");
        core.depends = parse_deplist("fancy-plugin *", DependKind::Depend);
        let core = db.insert(core);

        let (to_install, _) = Resolver::new(&db).unsatisfied(core);
        assert!(to_install.is_empty());
    }

    #[test]
    fn test_conflict_with_installed() {
        let mut db = test_db();
        let old = db.insert(installed("old-foo", "1.0"));
        let mut new_foo = available("new-foo", "2.0");
        new_foo.conflicts = parse_deplist("old-foo", DependKind::Conflict);
        let new_foo = db.insert(new_foo);

        let resolver = Resolver::new(&db);
        assert_eq!(resolver.conflicts(new_foo), [old]);
        assert!(matches!(
            resolver.check_conflicts(new_foo),
            Err(Error::Conflict(_, _))
        ));
    }

    #[test]
    fn test_conflict_suppressed_by_replaces() {
        let mut db = test_db();
        db.insert(installed("old-foo", "1.0"));
        let mut new_foo = available("new-foo", "2.0");
        new_foo.conflicts = parse_deplist("old-foo", DependKind::Conflict);
        new_foo.replaces = vec!["old-foo".to_string()];
        let new_foo = db.insert(new_foo);

        let resolver = Resolver::new(&db);
        assert!(resolver.conflicts(new_foo).is_empty());
        assert!(resolver.check_conflicts(new_foo).is_ok());
    }

    #[test]
    fn test_conflict_version_constraint() {
        let mut db = test_db();
        db.insert(installed("lib", "2.5"));
        let mut app = available("app", "1.0");
        app.conflicts = parse_deplist("lib (<< 2.0)", DependKind::Conflict);
        let app = db.insert(app);

        assert!(Resolver::new(&db).conflicts(app).is_empty());
    }

    #[test]
    fn test_conflict_with_install_wanted() {
        let mut db = test_db();
        let mut rival = available("rival", "1.0");
        rival.state_want = StateWant::Install;
        let rival = db.insert(rival);
        let mut app = available("app", "1.0");
        app.conflicts = parse_deplist("rival", DependKind::Conflict);
        let app = db.insert(app);

        assert_eq!(Resolver::new(&db).conflicts(app), [rival]);
    }

    #[test]
    fn test_replaces_via_provides() {
        let mut db = test_db();
        let mut legacy = installed("legacy-mta", "1.0");
        legacy.provides = vec!["mail-transport-agent".to_string()];
        let legacy = db.insert(legacy);
        let mut modern = available("modern-mta", "2.0");
        modern.replaces = vec!["mail-transport-agent".to_string()];
        let modern = db.insert(modern);

        let resolver = Resolver::new(&db);
        assert!(resolver.replaces(modern, legacy));
        assert!(!resolver.replaces(legacy, modern));
    }

    #[test]
    fn test_dependence_satisfiable() {
        let mut db = test_db();
        db.insert(available("lib", "1.5"));
        let db = db;

        let resolver = Resolver::new(&db);
        let atom = crate::depend::Depend::versioned(
            "lib",
            crate::version::VersionRelation::GreaterOrEqual,
            "1.0",
        );
        assert!(resolver.dependence_satisfiable(&atom));
        assert!(!resolver.dependence_satisfied(&atom), "nothing installed yet");

        let strict = crate::depend::Depend::versioned(
            "lib",
            crate::version::VersionRelation::Greater,
            "2.0",
        );
        assert!(!resolver.dependence_satisfiable(&strict));
    }
}
