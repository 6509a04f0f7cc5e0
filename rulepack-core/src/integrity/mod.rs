//! Integrity manifest - content digest of the emitted artifacts
//!
//! The digest is computed strictly after every artifact is written and
//! strictly before `manifest.json` is written, over exactly the tree the
//! selected emitter produced.

pub mod hasher;
pub mod manifest;
pub mod verifier;

pub use hasher::hash_tree;
pub use manifest::{BuildManifest, MANIFEST_FILE};
pub use verifier::{verify_output, VerifyReport};
