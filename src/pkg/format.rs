// src/pkg/format.rs

//! Stanza serialization for package records
//!
//! Writes a record back out in control-file form, as stored in the
//! installed-status database. Field order is fixed; empty fields are
//! omitted. Feeding the output back through the parser yields an equal
//! record on every serialized field.

use super::Package;
use crate::depend::DependKind;
use std::io::{self, Write};

/// Write one package as a control stanza (without the trailing blank line)
pub fn write_stanza<W: Write>(w: &mut W, pkg: &Package) -> io::Result<()> {
    writeln!(w, "Package: {}", pkg.name)?;
    if !pkg.version.upstream.is_empty() {
        writeln!(w, "Version: {}", pkg.version)?;
    }

    write_depend_field(w, pkg, "Depends", DependKind::Depend)?;
    write_depend_field(w, pkg, "Recommends", DependKind::Recommend)?;
    write_depend_field(w, pkg, "Suggests", DependKind::Suggest)?;

    // the implicit self-entry is not listed
    let provides: Vec<&str> = pkg
        .provides
        .iter()
        .filter(|p| p.as_str() != pkg.name)
        .map(String::as_str)
        .collect();
    if !provides.is_empty() {
        writeln!(w, "Provides: {}", provides.join(", "))?;
    }

    if !pkg.replaces.is_empty() {
        writeln!(w, "Replaces: {}", pkg.replaces.join(", "))?;
    }

    if !pkg.conflicts.is_empty() {
        let rendered: Vec<String> = pkg.conflicts.iter().map(|c| c.to_string()).collect();
        writeln!(w, "Conflicts: {}", rendered.join(", "))?;
    }

    writeln!(
        w,
        "Status: {} {} {}",
        pkg.state_want,
        pkg.state_flags.to_status_str(),
        pkg.state_status
    )?;

    if let Some(section) = &pkg.section {
        writeln!(w, "Section: {}", section)?;
    }
    if pkg.essential {
        writeln!(w, "Essential: yes")?;
    }
    if let Some(architecture) = &pkg.architecture {
        writeln!(w, "Architecture: {}", architecture)?;
    }
    if let Some(maintainer) = &pkg.maintainer {
        writeln!(w, "Maintainer: {}", maintainer)?;
    }
    if let Some(md5sum) = &pkg.md5sum {
        writeln!(w, "MD5sum: {}", md5sum)?;
    }
    if pkg.size != 0 {
        writeln!(w, "Size: {}", pkg.size)?;
    }
    if let Some(sha256sum) = &pkg.sha256sum {
        writeln!(w, "SHA256sum: {}", sha256sum)?;
    }
    if pkg.installed_size != 0 {
        writeln!(w, "Installed-Size: {}", pkg.installed_size)?;
    }
    if let Some(filename) = &pkg.filename {
        writeln!(w, "Filename: {}", filename)?;
    }

    let conffiles: Vec<(&str, &str)> = pkg
        .conffiles
        .iter()
        .filter_map(|c| c.digest.as_deref().map(|d| (c.path.as_str(), d)))
        .collect();
    if !conffiles.is_empty() {
        writeln!(w, "Conffiles:")?;
        for (path, digest) in conffiles {
            writeln!(w, " {} {}", path, digest)?;
        }
    }

    if let Some(source) = &pkg.source {
        writeln!(w, "Source: {}", source)?;
    }

    if let Some(description) = &pkg.description {
        let mut lines = description.lines();
        if let Some(first) = lines.next() {
            writeln!(w, "Description: {}", first)?;
            for line in lines {
                if line.starts_with(' ') || line.starts_with('\t') {
                    writeln!(w, "{}", line)?;
                } else {
                    writeln!(w, " {}", line)?;
                }
            }
        }
    }

    if pkg.installed_time != 0 {
        writeln!(w, "Installed-Time: {}", pkg.installed_time)?;
    }
    if let Some(tags) = &pkg.tags {
        writeln!(w, "Tags: {}", tags)?;
    }
    if pkg.auto_installed {
        writeln!(w, "Auto-Installed: yes")?;
    }

    Ok(())
}

fn write_depend_field<W: Write>(
    w: &mut W,
    pkg: &Package,
    field: &str,
    kind: DependKind,
) -> io::Result<()> {
    let rendered: Vec<String> = pkg
        .depends_of_kind(kind)
        .map(|c| c.to_string())
        .collect();
    if !rendered.is_empty() {
        writeln!(w, "{}: {}", field, rendered.join(", "))?;
    }
    Ok(())
}

/// Render one package as a stanza string
pub fn stanza_string(pkg: &Package) -> String {
    let mut buf = Vec::new();
    // writing into a Vec cannot fail
    let _ = write_stanza(&mut buf, pkg);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Render the first dependency group of the given index in printable form
///
/// This is the text the resolver reports for an unsatisfiable group.
pub fn depend_string(pkg: &Package, index: usize) -> Option<String> {
    pkg.depends.get(index).map(|c| c.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conffile::Conffile;
    use crate::depend::parse_deplist;
    use crate::pkg::{StateFlags, StateStatus, StateWant};

    fn sample_package() -> Package {
        let mut pkg = Package::new("webserver", "1.4-2");
        pkg.architecture = Some("armv7".to_string());
        pkg.section = Some("net".to_string());
        pkg.maintainer = Some("Build Daemon <builds@example.org>".to_string());
        pkg.size = 4096;
        pkg.md5sum = Some("6f5902ac237024bdd0c176cb93063dc4".to_string());
        pkg.filename = Some("./webserver_1.4-2_armv7.ipk".to_string());
        pkg.description = Some("small http server".to_string());
        pkg.depends = parse_deplist("libc (>= 1.0), ssl-lib | tls-lib", DependKind::Depend);
        pkg.provides = vec!["webserver".to_string(), "httpd".to_string()];
        pkg.state_want = StateWant::Install;
        pkg.state_status = StateStatus::Installed;
        pkg
    }

    #[test]
    fn test_field_order() {
        let out = stanza_string(&sample_package());
        let fields: Vec<&str> = out
            .lines()
            .filter(|l| !l.starts_with(' '))
            .map(|l| l.split(':').next().unwrap())
            .collect();
        assert_eq!(
            fields,
            [
                "Package",
                "Version",
                "Depends",
                "Provides",
                "Status",
                "Section",
                "Architecture",
                "Maintainer",
                "MD5sum",
                "Size",
                "Filename",
                "Description"
            ]
        );
    }

    #[test]
    fn test_empty_fields_omitted() {
        let pkg = Package::new("tiny", "1.0");
        let out = stanza_string(&pkg);
        assert!(out.contains("Package: tiny\n"));
        assert!(out.contains("Version: 1.0\n"));
        assert!(!out.contains("Depends:"));
        assert!(!out.contains("Section:"));
        assert!(!out.contains("Size:"));
        assert!(!out.contains("Conffiles:"));
    }

    #[test]
    fn test_status_line() {
        let mut pkg = Package::new("held", "2.0");
        pkg.state_want = StateWant::Install;
        pkg.state_flags.insert(StateFlags::HOLD);
        pkg.state_status = StateStatus::Installed;
        let out = stanza_string(&pkg);
        assert!(out.contains("Status: install hold installed\n"));
    }

    #[test]
    fn test_status_flags_default_ok() {
        let out = stanza_string(&Package::new("plain", "1.0"));
        assert!(out.contains("Status: unknown ok not-installed\n"));
    }

    #[test]
    fn test_provides_skips_self() {
        let mut pkg = Package::new("postfix", "3.0");
        pkg.provides = vec!["postfix".to_string(), "mail-transport-agent".to_string()];
        let out = stanza_string(&pkg);
        assert!(out.contains("Provides: mail-transport-agent\n"));

        pkg.provides = vec!["postfix".to_string()];
        let out = stanza_string(&pkg);
        assert!(!out.contains("Provides:"));
    }

    #[test]
    fn test_conffiles_continuation_lines() {
        let mut pkg = Package::new("configured", "1.0");
        pkg.conffiles = vec![
            Conffile::new("/etc/app.conf", Some("d41d8cd98f00b204e9800998ecf8427e".into())),
            Conffile::new("/etc/app.d/extra", None),
        ];
        let out = stanza_string(&pkg);
        assert!(out.contains("Conffiles:\n /etc/app.conf d41d8cd98f00b204e9800998ecf8427e\n"));
        assert!(!out.contains("extra"), "entries without digests are skipped");
    }

    #[test]
    fn test_multiline_description_indented() {
        let mut pkg = Package::new("longdesc", "1.0");
        pkg.description = Some("first line\n second line\n third".to_string());
        let out = stanza_string(&pkg);
        assert!(out.contains("Description: first line\n second line\n third\n"));
    }

    #[test]
    fn test_greedy_and_predepends_not_serialized() {
        let mut pkg = Package::new("boot", "1.0");
        pkg.depends = parse_deplist("addons *", DependKind::Depend);
        pkg.depends
            .extend(parse_deplist("loader", DependKind::PreDepend));
        let out = stanza_string(&pkg);
        assert!(!out.contains("Depends:"));
        assert!(!out.contains("addons"));
        assert!(!out.contains("loader"));
    }

    #[test]
    fn test_auto_installed_emitted_last() {
        let mut pkg = Package::new("dep", "1.0");
        pkg.auto_installed = true;
        let out = stanza_string(&pkg);
        assert!(out.ends_with("Auto-Installed: yes\n"));
    }

    #[test]
    fn test_depend_string() {
        let mut pkg = Package::new("app", "1.0");
        pkg.depends = parse_deplist("a (>= 2.0), b | c", DependKind::Depend);
        assert_eq!(depend_string(&pkg, 0).unwrap(), "a (>= 2.0)");
        assert_eq!(depend_string(&pkg, 1).unwrap(), "b | c");
        assert!(depend_string(&pkg, 2).is_none());
    }
}
