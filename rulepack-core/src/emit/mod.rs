//! Artifact emitters
//!
//! Every editor target maps to one of two [`Emitter`] implementations. Both
//! consume rules in assembler order and never re-sort them.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::editor::{ArtifactShape, EditorTarget};
use crate::rule::Rule;

pub mod per_rule;
pub mod prompt;

pub use per_rule::{rule_file_name, PerRuleEmitter};
pub use prompt::{render_prompt, PromptEmitter};

/// What an emitter wrote
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedArtifact {
    /// Directory or single file that scopes the integrity hash
    pub root: PathBuf,
    /// Every file written, in write order
    pub files: Vec<PathBuf>,
}

/// Strategy for writing the assembled rule set under an output root
pub trait Emitter {
    /// Reject rule sets this emitter cannot write faithfully. Runs before
    /// the output directory is touched.
    fn check(&self, _rules: &[Rule]) -> Result<()> {
        Ok(())
    }

    /// Write artifacts for `rules` under `out_root`
    fn emit(&self, out_root: &Path, rules: &[Rule]) -> Result<EmittedArtifact>;

    /// Where this emitter's artifact lives under `out_root`
    fn artifact_root(&self, out_root: &Path) -> PathBuf;
}

/// Emitter for an editor target
pub fn emitter_for(editor: EditorTarget) -> Box<dyn Emitter> {
    match editor.shape() {
        ArtifactShape::PerRule { subdir } => Box::new(PerRuleEmitter::new(subdir)),
        ArtifactShape::Prompt { file_name } => Box::new(PromptEmitter::new(file_name)),
    }
}
