//! Per-rule emitter: one JSON file per rule for folder-scanning editors

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{EmittedArtifact, Emitter};
use crate::error::BuildError;
use crate::rule::Rule;

#[derive(Debug, Clone)]
pub struct PerRuleEmitter {
    subdir: &'static str,
}

impl PerRuleEmitter {
    pub fn new(subdir: &'static str) -> Self {
        Self { subdir }
    }
}

/// File name for a rule: lowercase, spaces and path separators become `-`
pub fn rule_file_name(name: &str) -> String {
    let stem: String = name
        .to_lowercase()
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '-',
            other => other,
        })
        .collect();
    format!("{stem}.json")
}

/// Full rule record with sorted keys and two-space indentation
fn render_rule(rule: &Rule) -> Result<String> {
    let mut value: Value = serde_json::to_value(rule)
        .with_context(|| format!("Failed to serialize rule '{}'", rule.name))?;
    // sorts nested objects in opaque extras too
    value.sort_all_objects();
    Ok(serde_json::to_string_pretty(&value)?)
}

impl Emitter for PerRuleEmitter {
    /// Every rule needs its own file: names that differ only in case,
    /// spaces or separators would overwrite each other.
    fn check(&self, rules: &[Rule]) -> Result<()> {
        let mut claimed: HashMap<String, &str> = HashMap::with_capacity(rules.len());
        for rule in rules {
            let file = rule_file_name(&rule.name);
            if let Some(first) = claimed.get(&file) {
                return Err(BuildError::ArtifactNameClash {
                    file,
                    first: first.to_string(),
                    second: rule.name.clone(),
                }
                .into());
            }
            claimed.insert(file, &rule.name);
        }
        Ok(())
    }

    fn emit(&self, out_root: &Path, rules: &[Rule]) -> Result<EmittedArtifact> {
        self.check(rules)?;

        let rules_dir = self.artifact_root(out_root);
        fs::create_dir_all(&rules_dir)
            .with_context(|| format!("Failed to create rules directory {rules_dir:?}"))?;

        let mut files = Vec::with_capacity(rules.len());
        for rule in rules {
            let path = rules_dir.join(rule_file_name(&rule.name));
            fs::write(&path, render_rule(rule)?)
                .with_context(|| format!("Failed to write rule file {path:?}"))?;
            debug!("Wrote rule '{}' to {:?}", rule.name, path);
            files.push(path);
        }

        Ok(EmittedArtifact {
            root: rules_dir,
            files,
        })
    }

    fn artifact_root(&self, out_root: &Path) -> PathBuf {
        out_root.join(self.subdir)
    }
}
