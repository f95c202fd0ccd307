//! Statute ID mapping
//!
//! Both extraction paths resolve statute names through the same mapper so
//! that a provision found by the pattern rules and by the model lands on one
//! [`StatuteId`].

use crate::citation::ABBREVIATIONS;
use lexlink_domain::statute::normalize_name;
use lexlink_domain::StatuteId;
use std::collections::HashMap;
use tracing::debug;

/// Common alternative names → canonical statute name
const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("misrepresentation act", "Misrepresentation Act"),
    ("contract law act", "Contract Law Act"),
    ("companies act", "Companies Act"),
    ("evidence act", "Evidence Act"),
    ("rules of court", "Rules of Court"),
    ("rules of court 2021", "Rules of Court"),
    ("supreme court of judicature act", "Supreme Court of Judicature Act"),
    ("soga", "Sale of Goods Act"),
    ("sale of goods act", "Sale of Goods Act"),
    ("penal code", "Penal Code"),
];

/// Maps free-form statute names and sections to canonical identifiers
#[derive(Debug, Clone)]
pub struct StatuteIdMapper {
    aliases: HashMap<String, String>,
}

impl Default for StatuteIdMapper {
    fn default() -> Self {
        let mut mapper = Self {
            aliases: HashMap::new(),
        };
        for (alias, canonical) in DEFAULT_ALIASES {
            mapper.add_alias(alias, canonical);
        }
        for (abbr, canonical) in ABBREVIATIONS {
            mapper.add_alias(abbr, canonical);
        }
        mapper
    }
}

impl StatuteIdMapper {
    /// Mapper with the built-in alias table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an alternative name for a statute
    pub fn add_alias(&mut self, alias: &str, canonical: &str) {
        self.aliases.insert(alias_key(alias), canonical.to_string());
    }

    /// Canonical statute name for a free-form name
    ///
    /// Unknown names fall back to the generic normalization.
    pub fn canonical_name(&self, name: &str) -> String {
        let key = alias_key(name);
        if let Some(canonical) = self.aliases.get(&key) {
            return canonical.clone();
        }
        if let Some(normalized) = normalize_name(name) {
            if let Some(canonical) = self.aliases.get(&alias_key(&normalized)) {
                return canonical.clone();
            }
            return normalized;
        }
        name.trim().to_string()
    }

    /// Resolve a name and section into a canonical identifier
    ///
    /// Returns `None` when the name is empty or the section is not a
    /// section number.
    pub fn resolve(&self, name: &str, section: &str) -> Option<StatuteId> {
        let canonical = self.canonical_name(name);
        match StatuteId::new(&canonical, section) {
            Ok(id) => Some(id),
            Err(e) => {
                debug!(statute = name, section, error = %e, "Unresolvable statute reference");
                None
            }
        }
    }
}

fn alias_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| matches!(c, '.' | ',' | ';' | ':'))
        .to_lowercase()
}
