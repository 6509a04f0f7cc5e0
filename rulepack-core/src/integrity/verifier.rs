//! Re-checks a built output directory against its manifest

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::hasher::hash_tree;
use super::manifest::BuildManifest;
use crate::emit::emitter_for;

/// Outcome of verifying an output directory
#[derive(Debug, Clone, PartialEq)]
pub struct VerifyReport {
    pub manifest: BuildManifest,
    /// Artifact root the digest was recomputed over
    pub artifact_root: PathBuf,
    /// Freshly computed digest
    pub actual: String,
}

impl VerifyReport {
    pub fn is_intact(&self) -> bool {
        self.manifest.sha256 == self.actual
    }
}

/// Recompute the artifact digest recorded in `out_dir/manifest.json`.
///
/// The hashed scope is derived from the recorded editor, exactly as the
/// build scoped it.
pub fn verify_output(out_dir: &Path) -> Result<VerifyReport> {
    let manifest = BuildManifest::load(out_dir)?;
    let artifact_root = emitter_for(manifest.editor).artifact_root(out_dir);
    let actual = hash_tree(&artifact_root)?;

    let report = VerifyReport {
        manifest,
        artifact_root,
        actual,
    };

    if report.is_intact() {
        info!("Artifacts in {:?} match manifest digest", out_dir);
    } else {
        warn!(
            "Artifact digest mismatch in {:?}: manifest {}, actual {}",
            out_dir, report.manifest.sha256, report.actual
        );
    }

    Ok(report)
}
