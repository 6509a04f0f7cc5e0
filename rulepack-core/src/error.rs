//! Build error types with clear, actionable messages

use std::path::PathBuf;
use thiserror::Error;

use crate::rule::WORKSPACE_PREFIX;

/// Errors raised by the build pipeline and by output verification.
///
/// Every build variant is a configuration error: it is detected before the
/// output directory is touched. The manifest variants come from `verify`.
#[derive(Error, Debug)]
pub enum BuildError {
    /// A selected org or project overlay has no file on disk
    #[error("No {scope} overlay named '{id}'.\n\nExpected overlay file: {path}")]
    OverlayNotFound {
        scope: &'static str,
        id: String,
        path: PathBuf,
    },

    /// The loaded rule set has no workspace contract
    #[error(
        "No rule found with name starting '{}'.\n\nAdd a workspace contract rule (e.g., 'Workspace Contract (Universal)').",
        WORKSPACE_PREFIX
    )]
    MissingWorkspaceContract,

    /// An overlay id that would resolve outside its profiles directory
    #[error("Invalid {scope} overlay id '{id}': ids are plain file stems without path separators or '..'")]
    InvalidOverlayId { scope: &'static str, id: String },

    /// Two rule names map to the same per-rule file name
    #[error("Rules '{first}' and '{second}' would both be written to {file}; rename one of them")]
    ArtifactNameClash {
        file: String,
        first: String,
        second: String,
    },

    /// Failed to read a rule or overlay document
    #[error("Failed to read {path}")]
    DocumentRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A rule document is not a valid rule record
    #[error("Invalid rule document {path} (run `rulepack validate` for details)")]
    RuleParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An overlay document is not a valid overlay
    #[error("Invalid overlay document {path}")]
    OverlayParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// rulepack.yml exists but cannot be parsed
    #[error("Invalid pack configuration {path}")]
    PackConfig {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    /// The output directory would wipe the pack itself
    #[error("Refusing to use {out} as output directory: it contains the rule pack at {root}")]
    UnsafeOutputDir { out: PathBuf, root: PathBuf },

    /// No manifest.json in a directory being verified
    #[error("No build manifest found at {path}")]
    ManifestMissing { path: PathBuf },

    /// manifest.json exists but cannot be parsed
    #[error("Failed to parse build manifest {path} (corrupted or invalid format)")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl BuildError {
    /// True for errors that abort a build before anything is written
    pub fn is_configuration_error(&self) -> bool {
        !matches!(
            self,
            BuildError::ManifestMissing { .. } | BuildError::ManifestParse { .. }
        )
    }
}
