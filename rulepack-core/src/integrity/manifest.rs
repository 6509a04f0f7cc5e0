//! Build manifest written next to the emitted artifacts
//!
//! The manifest records what was built and the digest of the artifact tree.
//! It lives outside the hashed scope, so rewriting it never changes the
//! digest.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::editor::EditorTarget;
use crate::error::BuildError;

/// Manifest file name at the top of the output directory
pub const MANIFEST_FILE: &str = "manifest.json";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildManifest {
    /// ISO-8601 UTC, second precision
    pub generated_at: String,
    pub editor: EditorTarget,
    /// Org overlay id, `null` when none was selected
    pub org: Option<String>,
    /// Project overlay id, `null` when none was selected
    pub project: Option<String>,
    pub rule_count: usize,
    /// Hex SHA-256 of the emitted artifact
    pub sha256: String,
}

impl BuildManifest {
    pub fn new(
        editor: EditorTarget,
        org: Option<String>,
        project: Option<String>,
        rule_count: usize,
        sha256: String,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            generated_at: generated_at.format(TIMESTAMP_FORMAT).to_string(),
            editor,
            org,
            project,
            rule_count,
            sha256,
        }
    }

    pub fn path_in(out_dir: &Path) -> PathBuf {
        out_dir.join(MANIFEST_FILE)
    }

    /// Write `manifest.json` into `out_dir`
    pub fn write(&self, out_dir: &Path) -> Result<PathBuf> {
        let path = Self::path_in(out_dir);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write build manifest to {}", path.display()))?;
        debug!("Wrote build manifest to {:?}", path);
        Ok(path)
    }

    /// Read `manifest.json` from `out_dir`
    pub fn load(out_dir: &Path) -> Result<Self> {
        let path = Self::path_in(out_dir);
        if !path.is_file() {
            return Err(BuildError::ManifestMissing { path }.into());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| BuildError::DocumentRead {
            path: path.clone(),
            source,
        })?;
        let manifest = serde_json::from_str(&content)
            .map_err(|source| BuildError::ManifestParse { path, source })?;
        Ok(manifest)
    }
}
