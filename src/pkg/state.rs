// src/pkg/state.rs

//! Package state: user intent, sticky flags, and lifecycle stage
//!
//! The three state axes are orthogonal. The want axis records what the user
//! asked for, the flag axis is a bitset of sticky markers, and the status
//! axis tracks how far installation actually got.

use std::fmt;
use tracing::warn;

/// What the user wants to happen to a package
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StateWant {
    #[default]
    Unknown,
    Install,
    Deinstall,
    Purge,
}

impl StateWant {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateWant::Unknown => "unknown",
            StateWant::Install => "install",
            StateWant::Deinstall => "deinstall",
            StateWant::Purge => "purge",
        }
    }

    /// Parse a status-line token; unknown tokens log and map to `Unknown`
    pub fn from_str(s: &str) -> Self {
        match s {
            "unknown" => StateWant::Unknown,
            "install" => StateWant::Install,
            "deinstall" => StateWant::Deinstall,
            "purge" => StateWant::Purge,
            other => {
                warn!("unrecognized state want '{}'", other);
                StateWant::Unknown
            }
        }
    }
}

impl fmt::Display for StateWant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How far a package actually got through its lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StateStatus {
    #[default]
    NotInstalled,
    Unpacked,
    HalfConfigured,
    Installed,
    HalfInstalled,
    ConfigFiles,
    PostInstFailed,
    RemovalFailed,
}

impl StateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateStatus::NotInstalled => "not-installed",
            StateStatus::Unpacked => "unpacked",
            StateStatus::HalfConfigured => "half-configured",
            StateStatus::Installed => "installed",
            StateStatus::HalfInstalled => "half-installed",
            StateStatus::ConfigFiles => "config-files",
            StateStatus::PostInstFailed => "post-inst-failed",
            StateStatus::RemovalFailed => "removal-failed",
        }
    }

    /// Parse a status-line token; unknown tokens log and map to
    /// `NotInstalled`
    pub fn from_str(s: &str) -> Self {
        match s {
            "not-installed" => StateStatus::NotInstalled,
            "unpacked" => StateStatus::Unpacked,
            "half-configured" => StateStatus::HalfConfigured,
            "installed" => StateStatus::Installed,
            "half-installed" => StateStatus::HalfInstalled,
            "config-files" => StateStatus::ConfigFiles,
            "post-inst-failed" => StateStatus::PostInstFailed,
            "removal-failed" => StateStatus::RemovalFailed,
            other => {
                warn!("unrecognized state status '{}'", other);
                StateStatus::NotInstalled
            }
        }
    }

    /// Whether this status counts as present on the system
    pub fn is_installed(&self) -> bool {
        matches!(self, StateStatus::Installed | StateStatus::Unpacked)
    }
}

impl fmt::Display for StateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sticky per-package flag bits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StateFlags(u16);

impl StateFlags {
    pub const OK: StateFlags = StateFlags(0);
    pub const REINST_REQ: StateFlags = StateFlags(1 << 0);
    pub const HOLD: StateFlags = StateFlags(1 << 1);
    pub const REPLACE: StateFlags = StateFlags(1 << 2);
    pub const NO_PRUNE: StateFlags = StateFlags(1 << 3);
    pub const PREFER: StateFlags = StateFlags(1 << 4);
    pub const OBSOLETE: StateFlags = StateFlags(1 << 5);
    pub const USER: StateFlags = StateFlags(1 << 6);
    pub const FILELIST_CHANGED: StateFlags = StateFlags(1 << 7);
    pub const NEED_DETAIL: StateFlags = StateFlags(1 << 8);

    /// The flags that survive serialization to the status database
    pub const NONVOLATILE: StateFlags = StateFlags(
        Self::HOLD.0 | Self::NO_PRUNE.0 | Self::PREFER.0 | Self::OBSOLETE.0 | Self::USER.0,
    );

    const NAMES: [(StateFlags, &'static str); 7] = [
        (Self::REINST_REQ, "reinstreq"),
        (Self::HOLD, "hold"),
        (Self::REPLACE, "replace"),
        (Self::NO_PRUNE, "noprune"),
        (Self::PREFER, "prefer"),
        (Self::OBSOLETE, "obsolete"),
        (Self::USER, "user"),
    ];

    pub fn has(&self, other: StateFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: StateFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: StateFlags) {
        self.0 &= !other.0;
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Render for a status line: comma-joined non-volatile flag names, or
    /// `ok` when none are set
    pub fn to_status_str(&self) -> String {
        let sf = StateFlags(self.0 & Self::NONVOLATILE.0);
        if sf.is_empty() {
            return "ok".to_string();
        }

        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(flag, _)| sf.has(*flag))
            .map(|(_, name)| *name)
            .collect();
        names.join(",")
    }

    /// Parse a comma-joined flag list from a status line
    ///
    /// Unknown names are logged and skipped; `ok` means no flags.
    pub fn from_status_str(s: &str) -> Self {
        let mut flags = StateFlags::OK;
        if s == "ok" {
            return flags;
        }
        for name in s.split(',') {
            match Self::NAMES.iter().find(|(_, n)| *n == name) {
                Some((flag, _)) => flags.insert(*flag),
                None => warn!("unrecognized state flag '{}'", name),
            }
        }
        flags
    }
}
