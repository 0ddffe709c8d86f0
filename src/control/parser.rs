// src/control/parser.rs

//! Stanza stream parser
//!
//! `ControlParser` pulls records out of any `BufRead`: a Packages feed, an
//! extracted control file, or the status database. Malformed stanzas are
//! logged and skipped; the stream keeps going.

use super::{FieldMask, ParseOptions};
use crate::conffile::Conffile;
use crate::depend::{parse_deplist, DependKind};
use crate::error::{Error, Result};
use crate::pkg::{Package, StateFlags, StateStatus, StateWant};
use crate::version::PkgVersion;
use std::io::BufRead;
use tracing::warn;

/// Reads control stanzas from a byte stream
pub struct ControlParser<R> {
    reader: R,
    opts: ParseOptions,
}

impl<R: BufRead> ControlParser<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, ParseOptions::default())
    }

    pub fn with_options(reader: R, opts: ParseOptions) -> Self {
        Self { reader, opts }
    }

    /// Produce the next well-formed package record, skipping over stanzas
    /// that fail to parse. Returns None at end of stream.
    pub fn next_package(&mut self) -> Option<Package> {
        loop {
            let stanza = self.read_stanza()?;
            match parse_stanza(&stanza, &self.opts) {
                Ok(pkg) => return Some(pkg),
                Err(e) => {
                    warn!("skipping stanza: {}", e);
                    continue;
                }
            }
        }
    }

    /// Collect the next contiguous run of non-blank lines
    fn read_stanza(&mut self) -> Option<Vec<String>> {
        let mut lines = Vec::new();
        let mut buf = String::new();

        loop {
            buf.clear();
            match self.reader.read_line(&mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("read error in control stream: {}", e);
                    break;
                }
            }

            let line = buf.trim_end_matches(['\n', '\r']);
            if line.trim().is_empty() {
                if lines.is_empty() {
                    continue;
                }
                break;
            }
            lines.push(line.to_string());
        }

        if lines.is_empty() {
            None
        } else {
            Some(lines)
        }
    }
}

impl<R: BufRead> Iterator for ControlParser<R> {
    type Item = Package;

    fn next(&mut self) -> Option<Package> {
        self.next_package()
    }
}

/// Parse one stanza's lines into a package record
///
/// Fields outside the mask are recognized but not stored. A stanza without
/// a `Package` field, or with an invalid `Status` line, is malformed.
pub fn parse_stanza(lines: &[String], opts: &ParseOptions) -> Result<Package> {
    let mask = opts.mask;
    let mut pkg = Package::default();
    let mut description: Vec<&str> = Vec::new();
    let mut reading_description = false;
    let mut reading_conffiles = false;

    for line in lines {
        if line.starts_with(' ') || line.starts_with('\t') {
            if reading_description {
                description.push(line);
            } else if reading_conffiles {
                parse_conffile_line(&mut pkg, line);
            }
            // continuations of other fields carry nothing we keep
            continue;
        }
        reading_description = false;
        reading_conffiles = false;

        let Some((name, value)) = split_field(line) else {
            warn!("ignoring unparseable control line '{}'", line);
            continue;
        };

        let key = name.to_ascii_lowercase();
        match key.as_str() {
            "package" if mask.contains(FieldMask::PACKAGE) => {
                pkg.name = value.to_string();
            }
            "version" if mask.contains(FieldMask::VERSION) => {
                pkg.version = PkgVersion::parse(value);
            }
            "architecture" if mask.contains(FieldMask::ARCHITECTURE) => {
                pkg.architecture = Some(value.to_string());
            }
            "maintainer" if mask.contains(FieldMask::MAINTAINER) => {
                pkg.maintainer = Some(value.to_string());
            }
            "section" if mask.contains(FieldMask::SECTION) => {
                pkg.section = Some(value.to_string());
            }
            "priority" if mask.contains(FieldMask::PRIORITY) => {
                pkg.priority = Some(value.to_string());
            }
            "source" if mask.contains(FieldMask::SOURCE) => {
                pkg.source = Some(value.to_string());
            }
            "filename" if mask.contains(FieldMask::FILENAME) => {
                pkg.filename = Some(value.to_string());
            }
            "size" if mask.contains(FieldMask::SIZE) => {
                pkg.size = parse_number(value, "Size");
            }
            "installed-size" if mask.contains(FieldMask::INSTALLED_SIZE) => {
                pkg.installed_size = parse_number(value, "Installed-Size");
            }
            "installed-time" if mask.contains(FieldMask::INSTALLED_TIME) => {
                pkg.installed_time = parse_number(value, "Installed-Time");
            }
            "md5sum" if mask.contains(FieldMask::MD5SUM) => {
                pkg.md5sum = Some(value.to_string());
            }
            "sha256sum" if mask.contains(FieldMask::SHA256SUM) => {
                pkg.sha256sum = Some(value.to_string());
            }
            "description" if mask.contains(FieldMask::DESCRIPTION) => {
                description.push(value);
                reading_description = true;
            }
            "tags" if mask.contains(FieldMask::TAGS) => {
                pkg.tags = Some(value.to_string());
            }
            "depends" if mask.contains(FieldMask::DEPENDS) => {
                pkg.depends.extend(parse_deplist(value, DependKind::Depend));
            }
            "pre-depends" if mask.contains(FieldMask::PRE_DEPENDS) => {
                pkg.depends
                    .extend(parse_deplist(value, DependKind::PreDepend));
            }
            "recommends" if mask.contains(FieldMask::RECOMMENDS) => {
                pkg.depends
                    .extend(parse_deplist(value, DependKind::Recommend));
            }
            "suggests" if mask.contains(FieldMask::SUGGESTS) => {
                pkg.depends
                    .extend(parse_deplist(value, DependKind::Suggest));
            }
            "conflicts" if mask.contains(FieldMask::CONFLICTS) => {
                pkg.conflicts
                    .extend(parse_deplist(value, DependKind::Conflict));
            }
            "provides" if mask.contains(FieldMask::PROVIDES) => {
                pkg.provides.extend(parse_name_list(value));
            }
            "replaces" if mask.contains(FieldMask::REPLACES) => {
                pkg.replaces.extend(parse_name_list(value));
            }
            "conffiles" if mask.contains(FieldMask::CONFFILES) => {
                reading_conffiles = true;
                if !value.is_empty() {
                    parse_conffile_line(&mut pkg, value);
                }
            }
            "status" if mask.contains(FieldMask::STATUS) => {
                parse_status_line(&mut pkg, value)?;
            }
            "essential" if mask.contains(FieldMask::ESSENTIAL) => {
                if value == "yes" {
                    pkg.essential = true;
                }
            }
            "auto-installed" if mask.contains(FieldMask::AUTO_INSTALLED) => {
                if value == "yes" {
                    pkg.auto_installed = true;
                }
            }
            // unrecognized or masked-out field: parse past it
            _ => {}
        }
    }

    if pkg.name.is_empty() {
        return Err(Error::Malformed("stanza has no Package field".to_string()));
    }

    if !description.is_empty() {
        let mut text = description[0].to_string();
        for continuation in &description[1..] {
            if opts.terminal_output {
                text.push('\n');
            }
            text.push_str(continuation);
        }
        pkg.description = Some(text);
    }

    Ok(pkg)
}

/// Split a `Name: value` field line
///
/// The name must start with a letter and contain only letters, digits, and
/// dashes; the value has surrounding whitespace stripped.
fn split_field(line: &str) -> Option<(&str, &str)> {
    let pos = line.find(':')?;
    let name = &line[..pos];

    let mut chars = name.chars();
    if !chars.next()?.is_ascii_alphabetic() {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return None;
    }

    Some((name, line[pos + 1..].trim()))
}

/// Parse the three-token `Status` line: want, flags, status
fn parse_status_line(pkg: &mut Package, value: &str) -> Result<()> {
    let tokens: Vec<&str> = value.split_whitespace().collect();
    if tokens.len() != 3 {
        return Err(Error::Malformed(format!(
            "Status line has {} tokens, expected 3",
            tokens.len()
        )));
    }

    pkg.state_want = StateWant::from_str(tokens[0]);
    pkg.state_flags.insert(StateFlags::from_status_str(tokens[1]));
    pkg.state_status = StateStatus::from_str(tokens[2]);
    Ok(())
}

/// Parse a `Conffiles` continuation line: `<path> <digest>`
fn parse_conffile_line(pkg: &mut Package, line: &str) {
    let mut tokens = line.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(path), Some(digest)) => {
            pkg.conffiles
                .push(Conffile::new(path, Some(digest.to_string())));
        }
        _ => warn!("ignoring conffile line '{}'", line.trim()),
    }
}

/// Tokenize a Provides/Replaces list by commas and whitespace
fn parse_name_list(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c.is_ascii_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_number(value: &str, field: &str) -> u64 {
    value.parse().unwrap_or_else(|_| {
        warn!("invalid {} value '{}', assuming 0", field, value);
        0
    })
}
