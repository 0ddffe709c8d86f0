// src/version/mod.rs

//! Version handling and constraint satisfaction for package dependencies
//!
//! This module provides parsing and comparison for Debian-style versions in
//! `[epoch:]upstream[-revision]` form, and the relation predicates used by
//! dependency constraints.

use std::cmp::Ordering;
use std::fmt;
use tracing::warn;

/// A parsed package version with epoch, upstream, and revision components
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PkgVersion {
    pub epoch: u32,
    pub upstream: String,
    pub revision: Option<String>,
}

impl PkgVersion {
    /// Parse a version string
    ///
    /// Format: [epoch:]upstream[-revision]
    /// Examples:
    /// - "1.2.3" → epoch=0, upstream="1.2.3", revision=None
    /// - "2:1.2.3" → epoch=2, upstream="1.2.3", revision=None
    /// - "1.2.3-r4" → epoch=0, upstream="1.2.3", revision=Some("r4")
    ///
    /// A malformed epoch is logged and treated as 0; the version string
    /// itself is never rejected.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();

        let (epoch, rest) = match s.find(':') {
            Some(pos) => {
                let epoch_str = &s[..pos];
                let epoch = if epoch_str.is_empty() {
                    0
                } else {
                    epoch_str.parse::<u32>().unwrap_or_else(|_| {
                        warn!("invalid epoch in version '{}', assuming 0", s);
                        0
                    })
                };
                (epoch, &s[pos + 1..])
            }
            None => (0, s),
        };

        let (upstream, revision) = match rest.rfind('-') {
            Some(pos) => (rest[..pos].to_string(), Some(rest[pos + 1..].to_string())),
            None => (rest.to_string(), None),
        };

        Self {
            epoch,
            upstream,
            revision,
        }
    }

    /// Compare two versions
    ///
    /// Epochs compare first, then upstreams, then revisions. A missing
    /// revision compares less than any non-empty revision.
    pub fn compare(&self, other: &PkgVersion) -> Ordering {
        match self.epoch.cmp(&other.epoch) {
            Ordering::Equal => {}
            ord => return ord,
        }

        match verrevcmp(&self.upstream, &other.upstream) {
            Ordering::Equal => {}
            ord => return ord,
        }

        match (&self.revision, &other.revision) {
            (None, None) => Ordering::Equal,
            (None, Some(r)) if r.is_empty() => Ordering::Equal,
            (Some(r), None) if r.is_empty() => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => verrevcmp(a, b),
        }
    }
}

impl fmt::Display for PkgVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch > 0 {
            write!(f, "{}:", self.epoch)?;
        }
        write!(f, "{}", self.upstream)?;
        if let Some(ref revision) = self.revision {
            write!(f, "-{}", revision)?;
        }
        Ok(())
    }
}

impl Ord for PkgVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialOrd for PkgVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordering weight of a character within a non-digit run
///
/// Tilde sorts before end-of-string, which sorts with digits, then letters,
/// then everything else (assumes ASCII).
fn char_order(c: Option<u8>) -> i32 {
    match c {
        Some(b'~') => -1,
        None => 0,
        Some(c) if c.is_ascii_digit() => 0,
        Some(c) if c.is_ascii_alphabetic() => c as i32,
        Some(c) => c as i32 + 256,
    }
}

/// Compare two version fragments by alternating non-digit and digit runs
///
/// Non-digit runs compare character-wise by `char_order`; digit runs compare
/// as integers with leading zeros ignored, ties broken by the first
/// character difference.
fn verrevcmp(a: &str, b: &str) -> Ordering {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let (mut i, mut j) = (0, 0);

    while i < a.len() || j < b.len() {
        let mut first_diff = 0i32;

        while (i < a.len() && !a[i].is_ascii_digit())
            || (j < b.len() && !b[j].is_ascii_digit())
        {
            let ac = char_order(a.get(i).copied());
            let bc = char_order(b.get(j).copied());
            if ac != bc {
                return ac.cmp(&bc);
            }
            i += 1;
            j += 1;
        }

        while i < a.len() && a[i] == b'0' {
            i += 1;
        }
        while j < b.len() && b[j] == b'0' {
            j += 1;
        }

        while i < a.len() && j < b.len() && a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            if first_diff == 0 {
                first_diff = a[i] as i32 - b[j] as i32;
            }
            i += 1;
            j += 1;
        }

        if i < a.len() && a[i].is_ascii_digit() {
            return Ordering::Greater;
        }
        if j < b.len() && b[j].is_ascii_digit() {
            return Ordering::Less;
        }
        if first_diff != 0 {
            return first_diff.cmp(&0);
        }
    }

    Ordering::Equal
}

/// Version relation operators for dependency constraints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum VersionRelation {
    /// Any version is acceptable
    #[default]
    Any,
    /// Strictly earlier (`<<`)
    Less,
    /// Earlier or equal (`<=`)
    LessOrEqual,
    /// Exact match (`=`)
    Equal,
    /// Later or equal (`>=`)
    GreaterOrEqual,
    /// Strictly later (`>>`)
    Greater,
}

impl VersionRelation {
    /// Check whether a comparison outcome satisfies this relation
    pub fn matches(&self, ord: Ordering) -> bool {
        match self {
            VersionRelation::Any => true,
            VersionRelation::Less => ord == Ordering::Less,
            VersionRelation::LessOrEqual => ord != Ordering::Greater,
            VersionRelation::Equal => ord == Ordering::Equal,
            VersionRelation::GreaterOrEqual => ord != Ordering::Less,
            VersionRelation::Greater => ord == Ordering::Greater,
        }
    }

    /// The canonical operator spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionRelation::Any => "",
            VersionRelation::Less => "<<",
            VersionRelation::LessOrEqual => "<=",
            VersionRelation::Equal => "=",
            VersionRelation::GreaterOrEqual => ">=",
            VersionRelation::Greater => ">>",
        }
    }
}

impl fmt::Display for VersionRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmp(a: &str, b: &str) -> Ordering {
        PkgVersion::parse(a).compare(&PkgVersion::parse(b))
    }

    #[test]
    fn test_parse_simple() {
        let v = PkgVersion::parse("1.2.3");
        assert_eq!(v.epoch, 0);
        assert_eq!(v.upstream, "1.2.3");
        assert_eq!(v.revision, None);
    }

    #[test]
    fn test_parse_with_epoch() {
        let v = PkgVersion::parse("2:1.2.3");
        assert_eq!(v.epoch, 2);
        assert_eq!(v.upstream, "1.2.3");
        assert_eq!(v.revision, None);
    }

    #[test]
    fn test_parse_with_revision() {
        let v = PkgVersion::parse("1.2.3-r4");
        assert_eq!(v.epoch, 0);
        assert_eq!(v.upstream, "1.2.3");
        assert_eq!(v.revision, Some("r4".to_string()));
    }

    #[test]
    fn test_parse_revision_splits_on_last_dash() {
        let v = PkgVersion::parse("1.2-rc1-3");
        assert_eq!(v.upstream, "1.2-rc1");
        assert_eq!(v.revision, Some("3".to_string()));
    }

    #[test]
    fn test_parse_malformed_epoch_is_zero() {
        let v = PkgVersion::parse("abc:1.0");
        assert_eq!(v.epoch, 0);
        assert_eq!(v.upstream, "1.0");
    }

    #[test]
    fn test_parse_empty_epoch_is_zero() {
        let v = PkgVersion::parse(":1.0-2");
        assert_eq!(v.epoch, 0);
        assert_eq!(v.upstream, "1.0");
        assert_eq!(v.revision, Some("2".to_string()));
    }

    #[test]
    fn test_epoch_wins() {
        assert_eq!(cmp("1:2.0-1", "2.0-1"), Ordering::Greater);
        assert_eq!(cmp("1:0.1", "2:0.0"), Ordering::Less);
    }

    #[test]
    fn test_tilde_sorts_first() {
        assert_eq!(cmp("1.0~rc1", "1.0"), Ordering::Less);
        assert_eq!(cmp("1.0~~", "1.0~"), Ordering::Less);
        assert_eq!(cmp("1.0~rc1", "1.0~rc2"), Ordering::Less);
    }

    #[test]
    fn test_leading_zeros_ignored() {
        assert_eq!(cmp("1.00", "1.0"), Ordering::Equal);
        assert_eq!(cmp("1.007", "1.7"), Ordering::Equal);
    }

    #[test]
    fn test_digit_runs_compare_as_integers() {
        assert_eq!(cmp("1.10", "1.9"), Ordering::Greater);
        assert_eq!(cmp("1.2", "1.12"), Ordering::Less);
    }

    #[test]
    fn test_letters_before_other_characters() {
        assert_eq!(cmp("1.0a", "1.0+"), Ordering::Less);
        assert_eq!(cmp("1.0", "1.0a"), Ordering::Less);
    }

    #[test]
    fn test_revision_ordering() {
        assert_eq!(cmp("1.2.3-1", "1.2.3-2"), Ordering::Less);
        assert_eq!(cmp("1.2.3-r10", "1.2.3-r9"), Ordering::Greater);
    }

    #[test]
    fn test_null_revision_less_than_zero_revision() {
        assert_eq!(cmp("1.0", "1.0-0"), Ordering::Less);
        assert_eq!(cmp("1.0-0", "1.0"), Ordering::Greater);
        assert_eq!(cmp("1.0", "1.0"), Ordering::Equal);
    }

    #[test]
    fn test_total_order_transitivity() {
        let versions = ["0.9", "1.0~rc1", "1.0", "1.0-0", "1.0-1", "1.0a", "1.1", "2:0.1"];
        let parsed: Vec<_> = versions.iter().map(|s| PkgVersion::parse(s)).collect();
        let mut sorted = parsed.clone();
        sorted.sort();
        assert_eq!(parsed, sorted, "versions should already be in ascending order");
    }

    #[test]
    fn test_display_round_trip() {
        for s in ["1.2.3", "2:1.2.3-r4", "1.0-0", "1.0~rc1"] {
            assert_eq!(PkgVersion::parse(s).to_string(), *s);
        }
    }

    #[test]
    fn test_relation_any_always_satisfied() {
        for ord in [Ordering::Less, Ordering::Equal, Ordering::Greater] {
            assert!(VersionRelation::Any.matches(ord));
        }
    }

    #[test]
    fn test_relation_matches() {
        assert!(VersionRelation::Less.matches(Ordering::Less));
        assert!(!VersionRelation::Less.matches(Ordering::Equal));
        assert!(VersionRelation::LessOrEqual.matches(Ordering::Equal));
        assert!(VersionRelation::Equal.matches(Ordering::Equal));
        assert!(!VersionRelation::Equal.matches(Ordering::Greater));
        assert!(VersionRelation::GreaterOrEqual.matches(Ordering::Greater));
        assert!(VersionRelation::Greater.matches(Ordering::Greater));
        assert!(!VersionRelation::Greater.matches(Ordering::Equal));
    }
}
