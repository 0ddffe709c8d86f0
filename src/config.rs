// src/config.rs

//! Runtime configuration for the core
//!
//! The core never reads configuration files itself; an external loader
//! builds a `Config` and hands it over. What matters here is the ordered
//! architecture list (which decides candidate eligibility and preference)
//! and the global parse-field mask.

use crate::control::FieldMask;
use serde::{Deserialize, Serialize};

/// An architecture name with its preference rank; higher wins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchPriority {
    pub name: String,
    pub priority: u32,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Supported architectures in preference order
    pub arch_list: Vec<ArchPriority>,
    /// Fields the parser materializes; everything else is parsed past
    #[serde(default)]
    pub parse_mask: FieldMask,
    /// Join multi-line descriptions with newlines for terminal display
    #[serde(default)]
    pub terminal_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            arch_list: vec![ArchPriority {
                name: "all".to_string(),
                priority: 1,
            }],
            parse_mask: FieldMask::ALL,
            terminal_output: false,
        }
    }
}

impl Config {
    /// Register a supported architecture with the given priority
    pub fn add_arch(&mut self, name: impl Into<String>, priority: u32) {
        let name = name.into();
        if let Some(existing) = self.arch_list.iter_mut().find(|a| a.name == name) {
            existing.priority = priority;
        } else {
            self.arch_list.push(ArchPriority { name, priority });
        }
    }

    /// Priority of an architecture, or None when it is unsupported
    pub fn arch_priority(&self, arch: &str) -> Option<u32> {
        self.arch_list
            .iter()
            .find(|a| a.name == arch)
            .map(|a| a.priority)
    }
}
