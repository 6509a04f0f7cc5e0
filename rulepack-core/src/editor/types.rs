//! Editor target definitions
//!
//! Each editor consumes rules in one of two artifact shapes: a folder of
//! per-rule JSON files, or one concatenated system prompt.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported editor targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorTarget {
    /// Cursor - scans a rules folder
    Cursor,

    /// Claude - single system prompt
    Claude,

    /// Gemini - single system prompt
    Gemini,
}

/// The two artifact layouts an editor can consume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactShape {
    /// One JSON file per rule under `subdir` of the output root
    PerRule { subdir: &'static str },

    /// One text file at `file_name` in the output root
    Prompt { file_name: &'static str },
}

impl EditorTarget {
    pub const ALL: [EditorTarget; 3] = [
        EditorTarget::Cursor,
        EditorTarget::Claude,
        EditorTarget::Gemini,
    ];

    /// Get the editor name as a string (lowercase)
    pub fn as_str(&self) -> &'static str {
        match self {
            EditorTarget::Cursor => "cursor",
            EditorTarget::Claude => "claude",
            EditorTarget::Gemini => "gemini",
        }
    }

    /// Get the display name (proper casing)
    pub fn display_name(&self) -> &'static str {
        match self {
            EditorTarget::Cursor => "Cursor",
            EditorTarget::Claude => "Claude",
            EditorTarget::Gemini => "Gemini",
        }
    }

    /// Artifact layout this editor reads
    pub fn shape(&self) -> ArtifactShape {
        match self {
            EditorTarget::Cursor => ArtifactShape::PerRule {
                subdir: ".cursor/rules",
            },
            EditorTarget::Claude | EditorTarget::Gemini => ArtifactShape::Prompt {
                file_name: "system-prompt.txt",
            },
        }
    }
}

impl fmt::Display for EditorTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EditorTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cursor" => Ok(EditorTarget::Cursor),
            "claude" => Ok(EditorTarget::Claude),
            "gemini" => Ok(EditorTarget::Gemini),
            _ => Err(format!(
                "Unknown editor: '{s}'. Valid options: cursor, claude, gemini"
            )),
        }
    }
}
