//! The rule record shared by every stage of the pipeline

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Names starting with this prefix mark the workspace contract rule
pub const WORKSPACE_PREFIX: &str = "Workspace";

/// A single unit of guidance loaded from a rule document.
///
/// Only `name`, `matches` and `content` are ever inspected by the pipeline.
/// Keys other than the four known ones are kept in `extra` and written back
/// out unchanged by the per-rule emitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub description: String,
    pub matches: Vec<String>,
    pub content: String,

    /// Unknown keys, passed through opaquely
    #[serde(flatten)]
    pub extra: Map<String, Value>,

    /// File the rule was loaded from (diagnostics only, never serialized)
    #[serde(skip)]
    pub source: String,
}

impl Rule {
    /// Build a rule in code; mostly useful for tests and tooling
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            matches: Vec::new(),
            content: content.into(),
            extra: Map::new(),
            source: String::new(),
        }
    }

    pub fn with_matches<I, S>(mut self, matches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.matches = matches.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Whether this rule is the workspace contract
    pub fn is_workspace_contract(&self) -> bool {
        self.name.starts_with(WORKSPACE_PREFIX)
    }

    /// Case-insensitive sort key used by the assembler
    pub fn sort_key(&self) -> String {
        self.name.to_lowercase()
    }
}

/// First workspace contract in `rules`, if any
pub fn find_workspace_contract(rules: &[Rule]) -> Option<&Rule> {
    rules.iter().find(|r| r.is_workspace_contract())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_keys_are_preserved() {
        let json = r#"{
            "name": "Python Adapter",
            "description": "py",
            "matches": ["*.py"],
            "content": "Use type hints.",
            "priority": 3,
            "tags": ["lang"]
        }"#;

        let rule: Rule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.name, "Python Adapter");
        assert_eq!(rule.extra.get("priority"), Some(&Value::from(3)));

        let back = serde_json::to_value(&rule).unwrap();
        assert_eq!(back["tags"], serde_json::json!(["lang"]));
        assert!(back.get("source").is_none());
    }

    #[test]
    fn test_missing_required_key_is_rejected() {
        let json = r#"{"name": "X", "description": "", "matches": []}"#;
        assert!(serde_json::from_str::<Rule>(json).is_err());
    }

    #[test]
    fn test_workspace_detection() {
        assert!(Rule::new("Workspace Contract (Universal)", "x").is_workspace_contract());
        assert!(!Rule::new("workspace lowercase", "x").is_workspace_contract());
        assert!(!Rule::new("My Workspace", "x").is_workspace_contract());
    }

    #[test]
    fn test_find_workspace_contract_takes_first() {
        let rules = vec![
            Rule::new("Alpha", "a"),
            Rule::new("Workspace A", "first"),
            Rule::new("Workspace B", "second"),
        ];
        assert_eq!(find_workspace_contract(&rules).unwrap().content, "first");
        assert!(find_workspace_contract(&rules[..1]).is_none());
    }
}
