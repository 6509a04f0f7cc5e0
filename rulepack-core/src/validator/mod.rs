//! Rule linter - schema checks and routing-ambiguity heuristics
//!
//! Runs independently of the build. Documents are checked as raw JSON so a
//! malformed file is reported rather than aborting the run, and every file
//! is checked before anything is reported.
//!
//! Schema problems are errors and fail validation. Cross-document findings
//! (glob collisions, workspace contract count) are advisories only.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub mod collisions;
pub mod rules;


use crate::engine::config::{LintSettings, PackPaths};
use crate::store::list_json_files;
pub use collisions::{detect_collisions, workspace_contract_advisory, GlobCollision};
use rules::*;

/// Severity levels for validation issues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,   // Document is unusable by the build
    Warning, // Suspicious but buildable
}

/// A problem found in a single rule document
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub severity: Severity,
    /// Unique identifier for the check that raised it
    pub rule_id: &'static str,
    pub message: String,
}

/// A finding across the whole pack; never affects exit status
#[derive(Debug, Clone, PartialEq)]
pub struct Advisory {
    pub rule_id: &'static str,
    pub message: String,
}

/// A rule document as raw JSON
#[derive(Debug, Clone)]
pub struct RuleDocument {
    pub path: PathBuf,
    /// Parsed JSON, or the parse error message
    pub data: std::result::Result<Value, String>,
}

impl RuleDocument {
    /// Read a document from disk. Only I/O failures are errors here; bad
    /// JSON is kept for the checks to report.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read rule document {path:?}"))?;
        Ok(Self::from_content(path, &content))
    }

    pub fn from_content(path: PathBuf, content: &str) -> Self {
        let data = serde_json::from_str::<Value>(content).map_err(|e| e.to_string());
        Self { path, data }
    }

    /// File name used in messages
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Top-level field, if the document is a JSON object that has it
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data.as_ref().ok()?.as_object()?.get(key)
    }

    /// `name` when it is a non-empty string
    pub fn name(&self) -> Option<&str> {
        self.field("name")?.as_str().filter(|s| !s.is_empty())
    }

    /// `matches` when it is an array of strings
    pub fn matches(&self) -> Option<Vec<&str>> {
        self.field("matches")?
            .as_array()?
            .iter()
            .map(Value::as_str)
            .collect()
    }
}

/// Trait for per-document checks
pub trait ValidationRule: Send + Sync {
    /// Check a document for issues
    fn check(&self, document: &RuleDocument) -> Vec<ValidationIssue>;

    /// Rule identifier
    fn rule_id(&self) -> &'static str;

    /// Rule description
    fn description(&self) -> &'static str;
}

/// Main rule-document validator
pub struct RuleValidator {
    rules: Vec<Box<dyn ValidationRule>>,
}

/// Validation results for a single document
#[derive(Debug)]
pub struct DocumentValidationResult {
    pub path: PathBuf,
    pub issues: Vec<ValidationIssue>,
    pub error_count: usize,
    pub warning_count: usize,
}

/// Validation results for a whole pack
#[derive(Debug)]
pub struct ValidationResult {
    pub documents: Vec<DocumentValidationResult>,
    pub advisories: Vec<Advisory>,
    pub total_errors: usize,
    pub total_warnings: usize,
}

impl ValidationResult {
    /// True when no document has a schema error
    pub fn passed(&self) -> bool {
        self.total_errors == 0
    }
}

impl RuleValidator {
    /// Create validator with the default checks
    pub fn new() -> Self {
        let rules: Vec<Box<dyn ValidationRule>> = vec![
            Box::new(JsonObjectRule),
            Box::new(RequiredKeysRule),
            Box::new(MatchesListRule),
            Box::new(NonEmptyFieldsRule),
            Box::new(GlobSyntaxRule),
        ];

        Self { rules }
    }

    /// Validate a single document
    pub fn validate_document(&self, document: &RuleDocument) -> DocumentValidationResult {
        debug!("Validating rule document: {:?}", document.path);

        let mut issues = Vec::new();
        for rule in &self.rules {
            issues.extend(rule.check(document));
        }

        let error_count = issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count();
        let warning_count = issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count();

        DocumentValidationResult {
            path: document.path.clone(),
            issues,
            error_count,
            warning_count,
        }
    }

    /// Validate every document, then run the cross-document advisories
    pub fn validate_documents(
        &self,
        documents: &[RuleDocument],
        settings: &LintSettings,
    ) -> ValidationResult {
        info!("Validating {} rule documents", documents.len());

        let mut results = Vec::new();
        let mut total_errors = 0;
        let mut total_warnings = 0;

        for document in documents {
            let result = self.validate_document(document);
            total_errors += result.error_count;
            total_warnings += result.warning_count;
            results.push(result);
        }

        let mut advisories: Vec<Advisory> = detect_collisions(documents, settings)
            .iter()
            .map(GlobCollision::to_advisory)
            .collect();
        advisories.extend(workspace_contract_advisory(documents));

        ValidationResult {
            documents: results,
            advisories,
            total_errors,
            total_warnings,
        }
    }
}

impl Default for RuleValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// All rule documents of a pack: core first, then adapters, each sorted
pub fn discover_rule_documents(paths: &PackPaths) -> Result<Vec<RuleDocument>> {
    let mut documents = Vec::new();
    for dir in paths.rule_dirs() {
        for path in list_json_files(dir)? {
            documents.push(RuleDocument::from_file(&path)?);
        }
    }
    Ok(documents)
}
