//! Concatenated-prompt emitter: the whole rule set as one system prompt
//!
//! Layout: the workspace contract under a fixed heading, then every other
//! rule under a heading carrying its name, in assembler order.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{EmittedArtifact, Emitter};
use crate::error::BuildError;
use crate::rule::{find_workspace_contract, Rule};

const WORKSPACE_HEADING: &str = "# Workspace Contract";

#[derive(Debug, Clone)]
pub struct PromptEmitter {
    file_name: &'static str,
}

impl PromptEmitter {
    pub fn new(file_name: &'static str) -> Self {
        Self { file_name }
    }
}

/// Render the prompt document. Fails if there is no workspace contract.
pub fn render_prompt(rules: &[Rule]) -> Result<String> {
    let workspace = find_workspace_contract(rules).ok_or(BuildError::MissingWorkspaceContract)?;

    let mut parts: Vec<String> = vec![
        WORKSPACE_HEADING.to_string(),
        String::new(),
        workspace.content.trim().to_string(),
    ];

    for rule in rules {
        if std::ptr::eq(rule, workspace) {
            continue;
        }
        parts.push(format!("\n\n# {}\n", rule.name));
        parts.push(rule.content.trim().to_string());
    }

    let mut text = parts.join("\n");
    let body_len = text.trim_end_matches('\n').len();
    text.truncate(body_len);
    text.push('\n');
    Ok(text)
}

impl Emitter for PromptEmitter {
    fn emit(&self, out_root: &Path, rules: &[Rule]) -> Result<EmittedArtifact> {
        let text = render_prompt(rules)?;

        fs::create_dir_all(out_root)
            .with_context(|| format!("Failed to create output directory {out_root:?}"))?;
        let path = self.artifact_root(out_root);
        fs::write(&path, text).with_context(|| format!("Failed to write prompt {path:?}"))?;
        debug!("Wrote system prompt with {} rules to {:?}", rules.len(), path);

        Ok(EmittedArtifact {
            root: path.clone(),
            files: vec![path],
        })
    }

    fn artifact_root(&self, out_root: &Path) -> PathBuf {
        out_root.join(self.file_name)
    }
}
