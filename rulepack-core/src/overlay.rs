//! Overlay engine - org and project patches applied on top of the rule pack
//!
//! An overlay is a list of overrides, each naming an existing rule. Overlays
//! only ever patch rules already in [`RuleSlots`]; unknown targets are
//! skipped without error.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use tracing::debug;

use crate::error::BuildError;
use crate::rule::Rule;
use crate::store::RuleSlots;

/// File suffix for overlay documents under `profiles/<scope>/`
pub const OVERLAY_SUFFIX: &str = ".overlay.json";

/// Where an overlay comes from. Org overlays always apply before project ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OverlayScope {
    Org,
    Project,
}

impl OverlayScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlayScope::Org => "org",
            OverlayScope::Project => "project",
        }
    }
}

impl fmt::Display for OverlayScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A patch document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    #[serde(default)]
    pub overrides: Vec<Override>,
}

/// One patch operation against a named rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Override {
    /// Exact name of the rule to patch
    pub target: String,

    /// Text appended to the rule content after a newline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub append_content: Option<String>,

    /// Globs unioned into the rule's match set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_matches: Option<Vec<String>>,
}

/// What an overlay pass did, for diagnostics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayReport {
    /// Targets that were found and patched, in override order
    pub applied: Vec<String>,
    /// Targets with no matching rule
    pub skipped: Vec<String>,
}

impl Overlay {
    /// Load an overlay document. A missing file is a configuration error.
    pub fn load(path: &Path, scope: OverlayScope, id: &str) -> Result<Self> {
        if !path.is_file() {
            return Err(BuildError::OverlayNotFound {
                scope: scope.as_str(),
                id: id.to_string(),
                path: path.to_path_buf(),
            }
            .into());
        }

        let content = std::fs::read_to_string(path).map_err(|source| BuildError::DocumentRead {
            path: path.to_path_buf(),
            source,
        })?;

        let overlay: Overlay =
            serde_json::from_str(&content).map_err(|source| BuildError::OverlayParse {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(
            "Loaded {} overlay '{}' with {} overrides",
            scope,
            id,
            overlay.overrides.len()
        );
        Ok(overlay)
    }
}

/// Apply `overlay` to `slots` in place, override by override.
///
/// Appending content is not idempotent: applying the same overlay twice
/// appends the text twice. Adding matches is idempotent.
pub fn apply(slots: &mut RuleSlots, overlay: &Overlay) -> OverlayReport {
    let mut report = OverlayReport::default();

    for ov in &overlay.overrides {
        let Some(rule) = slots.get_mut(&ov.target) else {
            debug!("Overlay target '{}' not found, skipping", ov.target);
            report.skipped.push(ov.target.clone());
            continue;
        };

        if let Some(extra) = &ov.append_content {
            append_content(rule, extra);
        }
        if let Some(globs) = &ov.add_matches {
            union_matches(rule, globs);
        }
        report.applied.push(ov.target.clone());
    }

    report
}

fn append_content(rule: &mut Rule, extra: &str) {
    let joined = format!("{}\n{}", rule.content, extra);
    rule.content = joined.trim().to_string();
}

fn union_matches(rule: &mut Rule, globs: &[String]) {
    let merged: BTreeSet<String> = rule.matches.drain(..).chain(globs.iter().cloned()).collect();
    rule.matches = merged.into_iter().collect();
}
