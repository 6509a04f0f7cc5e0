//! Test helper functions for integration tests
//!
//! Shared across test files using the tests/common/ pattern.

#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::Path;
use std::sync::Once;
use tempfile::TempDir;

/// Initialize logging for tests (only once per test run)
static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Write a rule document into `<root>/<collection>/<file>`
pub fn write_rule(
    root: &Path,
    collection: &str,
    file: &str,
    name: &str,
    matches: &[&str],
    content: &str,
) -> Result<()> {
    let dir = root.join(collection);
    fs::create_dir_all(&dir)?;
    let doc = serde_json::json!({
        "name": name,
        "description": format!("{name} guidance"),
        "matches": matches,
        "content": content,
    });
    fs::write(dir.join(file), serde_json::to_string_pretty(&doc)?)?;
    Ok(())
}

/// Write an overlay into `<root>/profiles/<scope>/<id>.overlay.json`
pub fn write_overlay(root: &Path, scope: &str, id: &str, json: &str) -> Result<()> {
    let dir = root.join("profiles").join(scope);
    fs::create_dir_all(&dir)?;
    fs::write(dir.join(format!("{id}.overlay.json")), json)?;
    Ok(())
}

/// A small pack: a workspace contract in core plus two adapters
pub fn create_test_pack() -> Result<TempDir> {
    init_test_logging();

    let dir = TempDir::new()?;
    let root = dir.path();

    write_rule(
        root,
        "core",
        "workspace.json",
        "Workspace Contract (Universal)",
        &["**/*"],
        "Be concise.",
    )?;
    write_rule(
        root,
        "adapters",
        "testing.json",
        "Testing Adapter",
        &[],
        "Write tests.",
    )?;
    write_rule(
        root,
        "adapters",
        "python.json",
        "Python Adapter",
        &["*.py"],
        "Use type hints.",
    )?;

    Ok(dir)
}
