//! Editor targets and the artifact layout each one consumes

pub mod types;

pub use types::{ArtifactShape, EditorTarget};
