//! rulepack library exports
//!
//! Compiles a pack of rule documents (core + adapters, patched by optional
//! org/project overlays) into editor-specific artifacts with an integrity
//! manifest. The linter in [`validator`] runs independently of the build.

pub mod editor;
pub mod emit;
pub mod engine;
pub mod error;
pub mod integrity;
pub mod overlay;
pub mod rule;
pub mod store;
pub mod validator;

pub use error::BuildError;
pub use rule::Rule;
