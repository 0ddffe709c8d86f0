// src/depend.rs

//! Dependency expressions: atoms, OR-groups, and the dependency mini-language
//!
//! The grammar accepted here is the classic control-file dialect:
//!
//! ```text
//! deplist  := compound ("," compound)*
//! compound := atom ("|" atom)*  ["*"]
//! atom     := NAME [ "(" op VERSION ")" ]
//! op       := "<<" | "<=" | "=" | ">=" | ">>" | "<" | ">"
//! ```
//!
//! The deprecated `<` and `>` operators map to `<=` and `>=`. A trailing `*`
//! outside parentheses marks the whole OR-group as greedy.

use crate::version::{PkgVersion, VersionRelation};
use std::fmt;

/// The role a compound dependency plays for its owning package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependKind {
    PreDepend,
    Depend,
    Recommend,
    Suggest,
    /// Satisfiers are pulled in opportunistically rather than required
    Greedy,
    Conflict,
}

/// A single dependency alternative: a target name with an optional
/// version constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Depend {
    pub name: String,
    pub relation: VersionRelation,
    pub version: Option<PkgVersion>,
}

impl Depend {
    /// An unconstrained dependency on a name
    pub fn any(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            relation: VersionRelation::Any,
            version: None,
        }
    }

    /// A version-constrained dependency on a name
    pub fn versioned(name: impl Into<String>, relation: VersionRelation, version: &str) -> Self {
        Self {
            name: name.into(),
            relation,
            version: Some(PkgVersion::parse(version)),
        }
    }

    /// Check whether a candidate version satisfies this atom's constraint
    pub fn satisfied_by(&self, version: &PkgVersion) -> bool {
        match &self.version {
            None => true,
            Some(bound) => self.relation.matches(version.compare(bound)),
        }
    }
}

impl fmt::Display for Depend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            None => write!(f, "{}", self.name),
            Some(v) => write!(f, "{} ({} {})", self.name, self.relation, v),
        }
    }
}

/// An ordered OR-group of dependency alternatives
///
/// The group is satisfied when any one alternative is; the first satisfiable
/// alternative wins during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundDepend {
    pub kind: DependKind,
    pub possibilities: Vec<Depend>,
}

impl fmt::Display for CompoundDepend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, dep) in self.possibilities.iter().enumerate() {
            if i != 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", dep)?;
        }
        Ok(())
    }
}

/// Parse a comma-separated dependency list
///
/// Empty elements are skipped; `kind` applies to every compound unless the
/// greedy marker overrides it.
pub fn parse_deplist(value: &str, kind: DependKind) -> Vec<CompoundDepend> {
    value
        .split(',')
        .filter_map(|item| parse_compound(item, kind))
        .collect()
}

/// Parse one OR-group
///
/// Returns None for an empty element. A trailing `*` (outside parentheses)
/// switches the kind to `Greedy` for non-conflict dependencies.
pub fn parse_compound(s: &str, kind: DependKind) -> Option<CompoundDepend> {
    let mut s = s.trim();
    let mut kind = kind;

    if let Some(stripped) = s.strip_suffix('*') {
        s = stripped.trim_end();
        if kind != DependKind::Conflict {
            kind = DependKind::Greedy;
        }
    }

    let possibilities: Vec<Depend> = s.split('|').filter_map(parse_atom).collect();

    if possibilities.is_empty() {
        return None;
    }

    Some(CompoundDepend {
        kind,
        possibilities,
    })
}

/// Parse a single atom: `NAME [ "(" op VERSION ")" ]`
fn parse_atom(s: &str) -> Option<Depend> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (name, rest) = match s.find(|c: char| c == '(' || c.is_whitespace()) {
        Some(pos) => (&s[..pos], s[pos..].trim_start()),
        None => (s, ""),
    };

    if name.is_empty() {
        return None;
    }

    let mut atom = Depend::any(name);

    if let Some(inner) = rest.strip_prefix('(') {
        let inner = match inner.find(')') {
            Some(pos) => &inner[..pos],
            None => inner,
        };
        let inner = inner.trim();

        let (relation, version_str) = if let Some(v) = inner.strip_prefix("<<") {
            (VersionRelation::Less, v)
        } else if let Some(v) = inner.strip_prefix("<=") {
            (VersionRelation::LessOrEqual, v)
        } else if let Some(v) = inner.strip_prefix(">=") {
            (VersionRelation::GreaterOrEqual, v)
        } else if let Some(v) = inner.strip_prefix(">>") {
            (VersionRelation::Greater, v)
        } else if let Some(v) = inner.strip_prefix('=') {
            (VersionRelation::Equal, v)
        } else if let Some(v) = inner.strip_prefix('<') {
            // deprecated spelling, kept for old feeds
            (VersionRelation::LessOrEqual, v)
        } else if let Some(v) = inner.strip_prefix('>') {
            (VersionRelation::GreaterOrEqual, v)
        } else {
            (VersionRelation::Equal, inner)
        };

        atom.relation = relation;
        atom.version = Some(PkgVersion::parse(version_str.trim()));
    }

    Some(atom)
}
