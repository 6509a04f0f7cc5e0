//! Per-document validation checks

use super::{RuleDocument, Severity, ValidationIssue, ValidationRule};
use serde_json::Value;

/// Keys every rule document must carry
pub const REQUIRED_KEYS: [&str; 4] = ["content", "description", "matches", "name"];

fn error(rule_id: &'static str, message: impl Into<String>) -> ValidationIssue {
    ValidationIssue {
        severity: Severity::Error,
        rule_id,
        message: message.into(),
    }
}

/// Rule: document must be a JSON object
pub struct JsonObjectRule;

impl ValidationRule for JsonObjectRule {
    fn rule_id(&self) -> &'static str {
        "invalid-json"
    }

    fn description(&self) -> &'static str {
        "Rule document must be a JSON object"
    }

    fn check(&self, document: &RuleDocument) -> Vec<ValidationIssue> {
        match &document.data {
            Err(e) => vec![error(self.rule_id(), format!("invalid JSON: {e}"))],
            Ok(value) if !value.is_object() => {
                vec![error(self.rule_id(), "top level must be a JSON object")]
            }
            Ok(_) => Vec::new(),
        }
    }
}

/// Rule: name, description, matches and content must all be present
pub struct RequiredKeysRule;

impl ValidationRule for RequiredKeysRule {
    fn rule_id(&self) -> &'static str {
        "required-keys"
    }

    fn description(&self) -> &'static str {
        "Rule document must define name, description, matches and content"
    }

    fn check(&self, document: &RuleDocument) -> Vec<ValidationIssue> {
        let Some(object) = document.data.as_ref().ok().and_then(Value::as_object) else {
            return Vec::new();
        };

        let missing: Vec<&str> = REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| !object.contains_key(*key))
            .collect();

        if missing.is_empty() {
            Vec::new()
        } else {
            vec![error(self.rule_id(), format!("missing keys {missing:?}"))]
        }
    }
}

/// Rule: matches must be a homogeneous list of strings
pub struct MatchesListRule;

impl ValidationRule for MatchesListRule {
    fn rule_id(&self) -> &'static str {
        "matches-list"
    }

    fn description(&self) -> &'static str {
        "'matches' must be a list of strings"
    }

    fn check(&self, document: &RuleDocument) -> Vec<ValidationIssue> {
        match document.field("matches") {
            Some(_) if document.matches().is_none() => {
                vec![error(self.rule_id(), "'matches' must be a list of strings")]
            }
            _ => Vec::new(),
        }
    }
}

/// Rule: name and content must be non-empty strings
pub struct NonEmptyFieldsRule;

impl ValidationRule for NonEmptyFieldsRule {
    fn rule_id(&self) -> &'static str {
        "non-empty"
    }

    fn description(&self) -> &'static str {
        "'name' and 'content' must be non-empty strings"
    }

    fn check(&self, document: &RuleDocument) -> Vec<ValidationIssue> {
        let blank = |key: &str| match document.field(key) {
            // absent keys are reported by required-keys
            None => false,
            Some(value) => value.as_str().map_or(true, str::is_empty),
        };

        if blank("name") || blank("content") {
            vec![error(self.rule_id(), "'name' and 'content' must be non-empty")]
        } else {
            Vec::new()
        }
    }
}

/// Rule: each match should compile as a glob pattern
pub struct GlobSyntaxRule;

impl ValidationRule for GlobSyntaxRule {
    fn rule_id(&self) -> &'static str {
        "glob-syntax"
    }

    fn description(&self) -> &'static str {
        "Each entry in 'matches' should be a valid glob pattern"
    }

    fn check(&self, document: &RuleDocument) -> Vec<ValidationIssue> {
        let Some(matches) = document.matches() else {
            return Vec::new();
        };

        matches
            .into_iter()
            .filter_map(|pattern| {
                glob::Pattern::new(pattern).err().map(|e| ValidationIssue {
                    severity: Severity::Warning,
                    rule_id: self.rule_id(),
                    message: format!("'{pattern}' is not a valid glob: {}", e.msg),
                })
            })
            .collect()
    }
}
