//! Build pipeline
//!
//! Rule store → overlays (org, then project) → assembler → emitter →
//! integrity manifest. Every configuration error is raised before the
//! output directory is touched; after that the output directory is wiped
//! and rebuilt from scratch.

use anyhow::{Context, Result};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::emit::{emitter_for, EmittedArtifact};
use crate::error::BuildError;
use crate::integrity::{hash_tree, BuildManifest};
use crate::overlay::{self, Overlay, OverlayReport, OverlayScope};
use crate::rule::{find_workspace_contract, Rule};
use crate::store::{load_rule_documents, RuleIndex};

pub mod assembler;
pub mod config;

pub use assembler::assemble;
pub use config::{select_overlays, BuildConfig, LintSettings, PackConfig, PackPaths};

/// The final, ordered rule set plus what each overlay pass did
#[derive(Debug, Clone)]
pub struct CompiledRules {
    /// Rules in assembler order
    pub rules: Vec<Rule>,
    /// One report per applied overlay, in application order
    pub overlays: Vec<(OverlayScope, String, OverlayReport)>,
}

/// Result of a successful build
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub manifest: BuildManifest,
    pub manifest_path: PathBuf,
    pub artifact: EmittedArtifact,
}

/// Load, merge, patch and order the rule set without writing anything.
///
/// Overlay files are all read before any is applied, so a missing overlay
/// fails the whole call.
pub fn compile_rules(
    paths: &PackPaths,
    selected: &[(OverlayScope, &str)],
) -> Result<CompiledRules> {
    let [core_dir, adapters_dir] = paths.rule_dirs();
    let core = RuleIndex::from_documents(load_rule_documents(core_dir)?);
    let adapters = RuleIndex::from_documents(load_rule_documents(adapters_dir)?);
    let mut slots = core.merge_later_wins(adapters).freeze();
    debug!("Indexed {} rules", slots.len());

    let mut overlays = Vec::with_capacity(selected.len());
    for &(scope, id) in selected {
        let path = paths.overlay_path(scope, id)?;
        overlays.push((scope, id, Overlay::load(&path, scope, id)?));
    }

    let mut reports = Vec::with_capacity(overlays.len());
    for (scope, id, patch) in &overlays {
        let report = overlay::apply(&mut slots, patch);
        info!(
            "Applied {} overlay '{}': {} patched, {} unknown targets",
            scope,
            id,
            report.applied.len(),
            report.skipped.len()
        );
        reports.push((*scope, id.to_string(), report));
    }

    Ok(CompiledRules {
        rules: assemble(slots),
        overlays: reports,
    })
}

/// Run a full build as described by `config`
pub fn build(config: &BuildConfig) -> Result<BuildOutcome> {
    let paths = PackPaths::resolve(&config.root)?;
    let compiled = compile_rules(&paths, &config.overlays())?;
    let rules = compiled.rules;

    if find_workspace_contract(&rules).is_none() {
        return Err(BuildError::MissingWorkspaceContract.into());
    }
    let emitter = emitter_for(config.editor);
    emitter.check(&rules)?;
    check_output_dir(&config.out, &paths)?;

    reset_output_dir(&config.out)?;

    let artifact = emitter.emit(&config.out, &rules)?;

    // Digest first, manifest second: the manifest is never part of its own hash
    let digest = hash_tree(&artifact.root)?;
    let manifest = BuildManifest::new(
        config.editor,
        config.org.clone(),
        config.project.clone(),
        rules.len(),
        digest,
        Utc::now(),
    );
    let manifest_path = manifest.write(&config.out)?;

    info!(
        "Built {} rules for {} into {:?} (sha256 {})",
        manifest.rule_count, config.editor, config.out, manifest.sha256
    );

    Ok(BuildOutcome {
        manifest,
        manifest_path,
        artifact,
    })
}

/// Refuse output directories that would delete the pack or any part of it:
/// `out` may not contain the root, and may not overlap a rule or profile
/// directory in either direction.
fn check_output_dir(out: &Path, paths: &PackPaths) -> Result<()> {
    let out_abs = absolute(out)?;
    let root_abs = absolute(&paths.root)?;

    let pack_dirs = [
        absolute(&paths.core)?,
        absolute(&paths.adapters)?,
        absolute(&paths.profiles)?,
    ];

    let overlaps = root_abs.starts_with(&out_abs)
        || pack_dirs
            .iter()
            .any(|dir| dir.starts_with(&out_abs) || out_abs.starts_with(dir));

    if overlaps {
        return Err(BuildError::UnsafeOutputDir {
            out: out.to_path_buf(),
            root: paths.root.clone(),
        }
        .into());
    }
    Ok(())
}

/// Absolute form of `path` with symlinks resolved as far as the path
/// exists; components that do not exist yet are appended as given.
fn absolute(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("Failed to read current directory")?
            .join(path)
    };

    let mut missing = Vec::new();
    let mut cursor = joined.as_path();
    loop {
        if let Ok(real) = cursor.canonicalize() {
            let mut resolved = real;
            for component in missing.iter().rev() {
                resolved.push(component);
            }
            return Ok(resolved);
        }
        match (cursor.parent(), cursor.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                cursor = parent;
            }
            _ => return Ok(joined),
        }
    }
}

/// Delete `out` if it exists and recreate it empty
fn reset_output_dir(out: &Path) -> Result<()> {
    if out.exists() {
        debug!("Removing previous output at {:?}", out);
        fs::remove_dir_all(out)
            .with_context(|| format!("Failed to clear output directory {out:?}"))?;
    }
    fs::create_dir_all(out).with_context(|| format!("Failed to create output directory {out:?}"))?;
    Ok(())
}
