//! Pack configuration and path resolution.
//!
//! Everything is resolved from an explicit pack root. The layout follows
//! convention (`core/`, `adapters/`, `profiles/`) and can be adjusted with
//! an optional `rulepack.yml` at the root.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::editor::EditorTarget;
use crate::error::BuildError;
use crate::overlay::{OverlayScope, OVERLAY_SUFFIX};

/// Optional configuration file at the pack root
pub const CONFIG_FILE: &str = "rulepack.yml";

/// Contents of `rulepack.yml`; every field has a default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// Core rules directory, relative to the root
    pub core_dir: PathBuf,
    /// Adapter rules directory, relative to the root
    pub adapters_dir: PathBuf,
    /// Overlay profiles directory, relative to the root
    pub profiles_dir: PathBuf,
    pub lint: LintSettings,
}

/// Linter tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LintSettings {
    /// Glob exempt from collision warnings
    pub catch_all: String,
    /// A glob claimed by more than this many rules is flagged
    pub collision_threshold: usize,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            core_dir: PathBuf::from("core"),
            adapters_dir: PathBuf::from("adapters"),
            profiles_dir: PathBuf::from("profiles"),
            lint: LintSettings::default(),
        }
    }
}

impl Default for LintSettings {
    fn default() -> Self {
        Self {
            catch_all: "**/*".to_string(),
            collision_threshold: 3,
        }
    }
}

impl PackConfig {
    /// Load `rulepack.yml` from `root`, or defaults when it does not exist
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.is_file() {
            debug!("No {} at {:?}, using defaults", CONFIG_FILE, root);
            return Ok(Self::default());
        }

        info!("Loading pack configuration from: {:?}", path);
        let content = std::fs::read_to_string(&path).map_err(|source| BuildError::DocumentRead {
            path: path.clone(),
            source,
        })?;

        // An empty file parses as null; treat it as "all defaults"
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config = serde_yaml_ng::from_str(&content)
            .map_err(|source| BuildError::PackConfig { path, source })?;
        Ok(config)
    }
}

/// Resolved locations of everything in a rule pack
#[derive(Debug, Clone)]
pub struct PackPaths {
    /// Pack root directory
    pub root: PathBuf,
    /// Core rules (`core/`)
    pub core: PathBuf,
    /// Adapter rules (`adapters/`)
    pub adapters: PathBuf,
    /// Overlay profiles (`profiles/`)
    pub profiles: PathBuf,
    /// Linter tuning from `rulepack.yml`
    pub lint: LintSettings,
}

impl PackPaths {
    /// Resolve pack paths under `root`, honoring `rulepack.yml` if present
    pub fn resolve(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let config = PackConfig::load(&root)?;
        Ok(Self::from_config(root, config))
    }

    pub fn from_config(root: PathBuf, config: PackConfig) -> Self {
        Self {
            core: root.join(&config.core_dir),
            adapters: root.join(&config.adapters_dir),
            profiles: root.join(&config.profiles_dir),
            lint: config.lint,
            root,
        }
    }

    /// Rule directories in load order: core first, adapters second
    pub fn rule_dirs(&self) -> [&Path; 2] {
        [self.core.as_path(), self.adapters.as_path()]
    }

    /// `profiles/<scope>/<id>.overlay.json`. The id must be a plain file
    /// stem so the path stays under `profiles/<scope>/`.
    pub fn overlay_path(&self, scope: OverlayScope, id: &str) -> Result<PathBuf> {
        let plain = !id.is_empty()
            && !id.contains(['/', '\\'])
            && !id.contains("..")
            && !Path::new(id).is_absolute();
        if !plain {
            return Err(BuildError::InvalidOverlayId {
                scope: scope.as_str(),
                id: id.to_string(),
            }
            .into());
        }

        Ok(self
            .profiles
            .join(scope.as_str())
            .join(format!("{id}{OVERLAY_SUFFIX}")))
    }
}

/// Everything one build needs, passed explicitly by the caller
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Pack root (contains `core/`, `adapters/`, `profiles/`)
    pub root: PathBuf,
    pub editor: EditorTarget,
    /// Org overlay id
    pub org: Option<String>,
    /// Project overlay id
    pub project: Option<String>,
    /// Output directory; wiped and recreated on every build
    pub out: PathBuf,
}

impl BuildConfig {
    pub fn new(root: impl Into<PathBuf>, editor: EditorTarget, out: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            editor,
            org: None,
            project: None,
            out: out.into(),
        }
    }

    pub fn with_org(mut self, org: Option<String>) -> Self {
        self.org = org;
        self
    }

    pub fn with_project(mut self, project: Option<String>) -> Self {
        self.project = project;
        self
    }

    /// Selected overlays in application order
    pub fn overlays(&self) -> Vec<(OverlayScope, &str)> {
        select_overlays(self.org.as_deref(), self.project.as_deref())
    }
}

/// Overlay selection in application order: org first, then project
pub fn select_overlays<'a>(
    org: Option<&'a str>,
    project: Option<&'a str>,
) -> Vec<(OverlayScope, &'a str)> {
    let mut selected = Vec::new();
    if let Some(org) = org {
        selected.push((OverlayScope::Org, org));
    }
    if let Some(project) = project {
        selected.push((OverlayScope::Project, project));
    }
    selected
}
