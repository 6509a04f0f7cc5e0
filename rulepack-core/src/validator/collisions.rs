//! Cross-document advisories
//!
//! A glob claimed by many rules usually means routing is ambiguous: the
//! editor cannot tell which guidance applies to a file.

use std::collections::{BTreeMap, BTreeSet};

use super::{Advisory, RuleDocument};
use crate::engine::config::LintSettings;
use crate::rule::WORKSPACE_PREFIX;

/// A glob shared by more rules than the collision threshold
#[derive(Debug, Clone, PartialEq)]
pub struct GlobCollision {
    pub glob: String,
    /// Distinct rule names claiming the glob, sorted
    pub names: Vec<String>,
}

impl GlobCollision {
    pub fn message(&self) -> String {
        format!("Glob '{}' used by many rules: {:?}", self.glob, self.names)
    }

    pub fn to_advisory(&self) -> Advisory {
        Advisory {
            rule_id: "glob-collision",
            message: self.message(),
        }
    }
}

/// Globs (other than the catch-all) claimed by more than
/// `settings.collision_threshold` distinct rule names, sorted by glob.
///
/// Documents without a usable name or matches list are skipped; the schema
/// checks report those.
pub fn detect_collisions(documents: &[RuleDocument], settings: &LintSettings) -> Vec<GlobCollision> {
    let mut claims: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

    for document in documents {
        let (Some(name), Some(matches)) = (document.name(), document.matches()) else {
            continue;
        };
        for glob in matches {
            claims.entry(glob).or_default().insert(name);
        }
    }

    claims
        .into_iter()
        .filter(|(glob, names)| {
            names.len() > settings.collision_threshold && *glob != settings.catch_all
        })
        .map(|(glob, names)| GlobCollision {
            glob: glob.to_string(),
            names: names.into_iter().map(String::from).collect(),
        })
        .collect()
}

/// Flags a pack with no workspace contract, or more than one
pub fn workspace_contract_advisory(documents: &[RuleDocument]) -> Option<Advisory> {
    // assembler order, so the first listed is the one the build picks
    let mut contracts: Vec<&str> = documents
        .iter()
        .filter_map(RuleDocument::name)
        .filter(|name| name.starts_with(WORKSPACE_PREFIX))
        .collect();
    contracts.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then(a.cmp(b)));
    contracts.dedup();

    let message = match contracts.len() {
        1 => return None,
        0 => format!(
            "No rule name starts with '{WORKSPACE_PREFIX}'; builds will fail without a workspace contract"
        ),
        _ => format!(
            "Multiple workspace contracts {contracts:?}; only the first in case-insensitive name order is emitted first"
        ),
    };

    Some(Advisory {
        rule_id: "workspace-contract",
        message,
    })
}
