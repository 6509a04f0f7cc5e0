//! Rule store - loads rule documents and indexes them by name
//!
//! Two collections are loaded independently (core, then adapters) and merged
//! with [`RuleIndex::merge_later_wins`], so an adapter rule shadows a core
//! rule of the same name. The merged index is then frozen into
//! [`RuleSlots`], a fixed set of slots that can be patched but never grown.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::BuildError;
use crate::rule::Rule;

/// List the `*.json` files directly inside `dir`, sorted by file name.
///
/// A missing directory yields an empty list.
pub fn list_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        debug!("No rule directory at {:?}", dir);
        return Ok(Vec::new());
    }

    let pattern = format!("{}/*.json", glob::Pattern::escape(&dir.to_string_lossy()));

    let mut files = Vec::new();
    for entry in glob::glob(&pattern).context("Invalid rule directory pattern")? {
        let path = entry.context("Failed to read rule directory entry")?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load every rule document in `dir`, in sorted file-name order.
///
/// Each rule remembers the file it came from in [`Rule::source`].
pub fn load_rule_documents(dir: &Path) -> Result<Vec<Rule>> {
    let mut rules = Vec::new();

    for path in list_json_files(dir)? {
        rules.push(load_rule_file(&path)?);
    }

    info!("Loaded {} rule documents from {:?}", rules.len(), dir);
    Ok(rules)
}

/// Parse a single rule document
pub fn load_rule_file(path: &Path) -> Result<Rule> {
    let content = std::fs::read_to_string(path).map_err(|source| BuildError::DocumentRead {
        path: path.to_path_buf(),
        source,
    })?;

    let rule: Rule = serde_json::from_str(&content).map_err(|source| BuildError::RuleParse {
        path: path.to_path_buf(),
        source,
    })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(rule.with_source(file_name))
}

/// Growable name → rule index used while loading.
///
/// Replacing a rule keeps the slot (and so the insertion position) of the
/// rule it replaces.
#[derive(Debug, Clone, Default)]
pub struct RuleIndex {
    rules: Vec<Rule>,
    positions: HashMap<String, usize>,
}

impl RuleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index one collection; within it a later document wins a name clash
    pub fn from_documents(documents: impl IntoIterator<Item = Rule>) -> Self {
        let mut index = Self::new();
        for rule in documents {
            if let Some(replaced) = index.upsert(rule) {
                debug!(
                    "Rule '{}' from {} replaced by a later document",
                    replaced.name, replaced.source
                );
            }
        }
        index
    }

    /// Merge `later` on top of `self`. Rules in `later` shadow rules of the
    /// same name in `self`; new names are appended in `later`'s order.
    pub fn merge_later_wins(mut self, later: RuleIndex) -> Self {
        for rule in later.rules {
            let winner = rule.source.clone();
            if let Some(shadowed) = self.upsert(rule) {
                debug!(
                    "Rule '{}' from {} shadowed by {}",
                    shadowed.name, shadowed.source, winner
                );
            }
        }
        self
    }

    /// Insert or replace by name, returning the replaced rule
    fn upsert(&mut self, rule: Rule) -> Option<Rule> {
        match self.positions.get(&rule.name) {
            Some(&slot) => Some(std::mem::replace(&mut self.rules[slot], rule)),
            None => {
                self.positions.insert(rule.name.clone(), self.rules.len());
                self.rules.push(rule);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.positions.get(name).map(|&slot| &self.rules[slot])
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Freeze the index into fixed slots; no rule can be added afterwards
    pub fn freeze(self) -> RuleSlots {
        RuleSlots {
            slots: self.rules.into_boxed_slice(),
            positions: self.positions,
        }
    }
}

/// Fixed set of named rule slots.
///
/// Backed by a boxed slice: rules can be looked up and patched in place, but
/// there is no way to insert one.
#[derive(Debug, Clone)]
pub struct RuleSlots {
    slots: Box<[Rule]>,
    positions: HashMap<String, usize>,
}

impl RuleSlots {
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.positions.get(name).map(|&slot| &self.slots[slot])
    }

    /// Mutable access for overlay patches. Callers must not rename the rule.
    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Rule> {
        match self.positions.get(name) {
            Some(&slot) => Some(&mut self.slots[slot]),
            None => None,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Rules in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.slots.iter()
    }

    pub fn into_rules(self) -> Vec<Rule> {
        self.slots.into_vec()
    }
}
