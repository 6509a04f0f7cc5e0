//! End-to-end tests for the build pipeline

mod common;

use anyhow::Result;
use common::{create_test_pack, init_test_logging, write_overlay, write_rule};
use pretty_assertions::assert_eq;
use rulepack_core::editor::EditorTarget;
use rulepack_core::engine::{build, BuildConfig};
use rulepack_core::integrity::{hash_tree, verify_output, BuildManifest, MANIFEST_FILE};
use rulepack_core::{BuildError, Rule};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

fn config(root: &Path, editor: EditorTarget, out: &Path) -> BuildConfig {
    BuildConfig::new(root, editor, out)
}

fn read_rule(out: &Path, file: &str) -> Result<Rule> {
    let text = fs::read_to_string(out.join(".cursor/rules").join(file))?;
    Ok(serde_json::from_str(&text)?)
}

/// Every file under `dir` except the manifest, with contents
fn snapshot(dir: &Path) -> Result<Vec<(PathBuf, Vec<u8>)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || entry.file_name() == MANIFEST_FILE {
            continue;
        }
        let bytes = fs::read(entry.path())?;
        files.push((entry.path().strip_prefix(dir)?.to_path_buf(), bytes));
    }
    Ok(files)
}

#[test]
fn test_concatenated_prompt_end_to_end() -> Result<()> {
    init_test_logging();
    let pack = TempDir::new()?;
    let out = TempDir::new()?;
    write_rule(
        pack.path(),
        "core",
        "workspace.json",
        "Workspace Contract (Universal)",
        &[],
        "Be concise.",
    )?;
    write_rule(
        pack.path(),
        "adapters",
        "testing.json",
        "Testing Adapter",
        &[],
        "Write tests.",
    )?;

    let outcome = build(&config(pack.path(), EditorTarget::Claude, out.path()))?;

    let prompt = fs::read_to_string(out.path().join("system-prompt.txt"))?;
    assert_eq!(
        prompt,
        "# Workspace Contract\n\nBe concise.\n\n\n# Testing Adapter\n\nWrite tests.\n"
    );
    assert_eq!(outcome.manifest.rule_count, 2);
    assert_eq!(outcome.artifact.root, out.path().join("system-prompt.txt"));
    Ok(())
}

#[test]
fn test_workspace_first_even_when_not_alphabetically_first() -> Result<()> {
    let pack = create_test_pack()?;
    let out = TempDir::new()?;

    build(&config(pack.path(), EditorTarget::Gemini, out.path()))?;

    let prompt = fs::read_to_string(out.path().join("system-prompt.txt"))?;
    let ws = prompt.find("Be concise.").unwrap();
    assert!(prompt.starts_with("# Workspace Contract\n"));
    assert!(ws < prompt.find("# Python Adapter").unwrap());
    assert!(prompt.find("# Python Adapter").unwrap() < prompt.find("# Testing Adapter").unwrap());
    assert!(prompt.ends_with("Write tests.\n"));
    Ok(())
}

#[test]
fn test_add_matches_overlay_end_to_end() -> Result<()> {
    let pack = create_test_pack()?;
    let out = TempDir::new()?;
    write_overlay(
        pack.path(),
        "project",
        "py",
        r#"{"overrides":[{"target":"Testing Adapter","add_matches":["*.py","*.py"]}]}"#,
    )?;

    let cfg = config(pack.path(), EditorTarget::Cursor, out.path())
        .with_project(Some("py".to_string()));
    let outcome = build(&cfg)?;

    let rule = read_rule(out.path(), "testing-adapter.json")?;
    assert_eq!(rule.matches, vec!["*.py"]);
    assert_eq!(outcome.manifest.project.as_deref(), Some("py"));
    assert_eq!(outcome.manifest.org, None);
    Ok(())
}

#[test]
fn test_per_rule_layout_and_order() -> Result<()> {
    let pack = create_test_pack()?;
    let out = TempDir::new()?;

    let outcome = build(&config(pack.path(), EditorTarget::Cursor, out.path()))?;

    let names: Vec<_> = outcome
        .artifact
        .files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "python-adapter.json",
            "testing-adapter.json",
            "workspace-contract-(universal).json"
        ]
    );
    assert!(out.path().join(MANIFEST_FILE).is_file());
    assert!(!out.path().join("system-prompt.txt").exists());
    Ok(())
}

#[test]
fn test_builds_are_deterministic() -> Result<()> {
    let pack = create_test_pack()?;
    write_overlay(
        pack.path(),
        "org",
        "acme",
        r#"{"overrides":[{"target":"Python Adapter","append_content":"Prefer ruff.","add_matches":["*.pyi"]}]}"#,
    )?;

    for editor in EditorTarget::ALL {
        let first = TempDir::new()?;
        let second = TempDir::new()?;
        let cfg = |out: &Path| {
            config(pack.path(), editor, out).with_org(Some("acme".to_string()))
        };

        let a = build(&cfg(first.path()))?;
        let b = build(&cfg(second.path()))?;

        assert_eq!(a.manifest.sha256, b.manifest.sha256, "{editor}");
        assert_eq!(snapshot(first.path())?, snapshot(second.path())?, "{editor}");
    }
    Ok(())
}

#[test]
fn test_adapter_shadows_core_rule() -> Result<()> {
    let pack = create_test_pack()?;
    let out = TempDir::new()?;
    write_rule(
        pack.path(),
        "core",
        "python.json",
        "Python Adapter",
        &["*.py"],
        "CORE PYTHON BODY",
    )?;

    let outcome = build(&config(pack.path(), EditorTarget::Claude, out.path()))?;

    let prompt = fs::read_to_string(out.path().join("system-prompt.txt"))?;
    assert!(prompt.contains("Use type hints."));
    assert!(!prompt.contains("CORE PYTHON BODY"));
    assert_eq!(outcome.manifest.rule_count, 3);
    Ok(())
}

#[test]
fn test_unknown_overlay_target_changes_nothing() -> Result<()> {
    let pack = create_test_pack()?;
    write_overlay(
        pack.path(),
        "org",
        "ghost",
        r#"{"overrides":[{"target":"No Such Rule","append_content":"boo","add_matches":["*"]}]}"#,
    )?;

    for editor in EditorTarget::ALL {
        let plain = TempDir::new()?;
        let patched = TempDir::new()?;

        let a = build(&config(pack.path(), editor, plain.path()))?;
        let b = build(
            &config(pack.path(), editor, patched.path()).with_org(Some("ghost".to_string())),
        )?;

        assert_eq!(a.manifest.sha256, b.manifest.sha256);
        assert_eq!(snapshot(plain.path())?, snapshot(patched.path())?);
    }
    Ok(())
}

#[test]
fn test_project_overlay_sees_org_overlay() -> Result<()> {
    let pack = create_test_pack()?;
    let out = TempDir::new()?;
    write_overlay(
        pack.path(),
        "org",
        "acme",
        r#"{"overrides":[{"target":"Testing Adapter","append_content":"Org rule."}]}"#,
    )?;
    write_overlay(
        pack.path(),
        "project",
        "web",
        r#"{"overrides":[{"target":"Testing Adapter","append_content":"Project rule."}]}"#,
    )?;

    let cfg = config(pack.path(), EditorTarget::Cursor, out.path())
        .with_org(Some("acme".to_string()))
        .with_project(Some("web".to_string()));
    build(&cfg)?;

    let rule = read_rule(out.path(), "testing-adapter.json")?;
    assert_eq!(rule.content, "Write tests.\nOrg rule.\nProject rule.");
    Ok(())
}

#[test]
fn test_manifest_is_outside_hash_scope() -> Result<()> {
    let pack = create_test_pack()?;

    for editor in EditorTarget::ALL {
        let out = TempDir::new()?;
        let outcome = build(&config(pack.path(), editor, out.path()))?;

        assert_eq!(hash_tree(&outcome.artifact.root)?, outcome.manifest.sha256);

        // regenerate the manifest alone
        let mut manifest = BuildManifest::load(out.path())?;
        manifest.generated_at = "1999-01-01T00:00:00Z".to_string();
        manifest.write(out.path())?;

        assert_eq!(hash_tree(&outcome.artifact.root)?, outcome.manifest.sha256);
        assert!(verify_output(out.path())?.is_intact());
    }
    Ok(())
}

#[test]
fn test_verify_detects_modified_artifact() -> Result<()> {
    let pack = create_test_pack()?;
    let out = TempDir::new()?;
    build(&config(pack.path(), EditorTarget::Cursor, out.path()))?;

    fs::write(
        out.path().join(".cursor/rules/python-adapter.json"),
        r#"{"tampered": true}"#,
    )?;

    let report = verify_output(out.path())?;
    assert!(!report.is_intact());
    assert_eq!(report.artifact_root, out.path().join(".cursor/rules"));
    Ok(())
}

#[test]
fn test_output_dir_is_rebuilt_from_scratch() -> Result<()> {
    let pack = create_test_pack()?;
    let out = TempDir::new()?;
    fs::create_dir_all(out.path().join(".cursor/rules"))?;
    fs::write(out.path().join(".cursor/rules/stale.json"), "{}")?;
    fs::write(out.path().join("leftover.txt"), "old")?;

    build(&config(pack.path(), EditorTarget::Cursor, out.path()))?;

    assert!(!out.path().join(".cursor/rules/stale.json").exists());
    assert!(!out.path().join("leftover.txt").exists());
    Ok(())
}

#[test]
fn test_missing_overlay_fails_before_touching_output() -> Result<()> {
    let pack = create_test_pack()?;
    let out = TempDir::new()?;
    fs::write(out.path().join("keep.txt"), "previous build")?;

    let cfg = config(pack.path(), EditorTarget::Cursor, out.path())
        .with_org(Some("missing".to_string()));
    let err = build(&cfg).unwrap_err();

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::OverlayNotFound { scope, id, path }) => {
            assert_eq!(*scope, "org");
            assert_eq!(id, "missing");
            assert!(path.ends_with("profiles/org/missing.overlay.json"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(out.path().join("keep.txt").is_file());
    assert!(!out.path().join(MANIFEST_FILE).exists());
    Ok(())
}

#[test]
fn test_missing_workspace_contract_fails_before_touching_output() -> Result<()> {
    init_test_logging();
    let pack = TempDir::new()?;
    let out = TempDir::new()?;
    write_rule(pack.path(), "adapters", "a.json", "Alpha", &[], "a")?;
    fs::write(out.path().join("keep.txt"), "previous build")?;

    for editor in EditorTarget::ALL {
        let err = build(&config(pack.path(), editor, out.path())).unwrap_err();
        let build_err = err.downcast_ref::<BuildError>().unwrap();
        assert!(matches!(build_err, BuildError::MissingWorkspaceContract));
        assert!(build_err.is_configuration_error());
    }
    assert!(out.path().join("keep.txt").is_file());
    Ok(())
}

#[test]
fn test_extra_keys_pass_through_to_rule_files() -> Result<()> {
    let pack = create_test_pack()?;
    let out = TempDir::new()?;
    fs::write(
        pack.path().join("adapters/go.json"),
        r#"{"name":"Go Adapter","description":"go","matches":["*.go"],"content":"gofmt.","owner":{"team":"infra"}}"#,
    )?;

    build(&config(pack.path(), EditorTarget::Cursor, out.path()))?;

    let text = fs::read_to_string(out.path().join(".cursor/rules/go-adapter.json"))?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    assert_eq!(value["owner"]["team"], "infra");
    // keys are written sorted
    let content_at = text.find("\"content\"").unwrap();
    let owner_at = text.find("\"owner\"").unwrap();
    assert!(content_at < owner_at);
    Ok(())
}

#[test]
fn test_rulepack_yml_relocates_directories() -> Result<()> {
    init_test_logging();
    let pack = TempDir::new()?;
    let out = TempDir::new()?;
    fs::write(
        pack.path().join("rulepack.yml"),
        "core_dir: rules/core\nadapters_dir: rules/adapters\n",
    )?;
    write_rule(pack.path(), "rules/core", "w.json", "Workspace", &[], "w")?;
    write_rule(pack.path(), "rules/adapters", "a.json", "Alpha", &[], "a")?;
    // ignored: default location no longer used
    write_rule(pack.path(), "core", "x.json", "Ignored", &[], "x")?;

    let outcome = build(&config(pack.path(), EditorTarget::Claude, out.path()))?;
    assert_eq!(outcome.manifest.rule_count, 2);
    Ok(())
}

#[test]
fn test_clashing_rule_file_names_fail_before_touching_output() -> Result<()> {
    let pack = create_test_pack()?;
    let out = TempDir::new()?;
    write_rule(pack.path(), "adapters", "cicd-slash.json", "CI/CD Adapter", &[], "slash body")?;
    write_rule(pack.path(), "adapters", "cicd-space.json", "CI CD Adapter", &[], "space body")?;
    fs::write(out.path().join("keep.txt"), "previous build")?;

    let err = build(&config(pack.path(), EditorTarget::Cursor, out.path())).unwrap_err();
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::ArtifactNameClash { file, .. }) => {
            assert_eq!(file, "ci-cd-adapter.json");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(out.path().join("keep.txt").is_file());

    // the prompt shape has one file, so both rules still build there
    let prompt_out = TempDir::new()?;
    let outcome = build(&config(pack.path(), EditorTarget::Claude, prompt_out.path()))?;
    assert_eq!(outcome.manifest.rule_count, 5);
    Ok(())
}

#[test]
fn test_output_inside_rule_directory_is_refused() -> Result<()> {
    let pack = create_test_pack()?;

    for out in [pack.path().join("core"), pack.path().join("profiles/build")] {
        let err = build(&config(pack.path(), EditorTarget::Claude, &out)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::UnsafeOutputDir { .. })
        ));
    }
    assert!(pack.path().join("core/workspace.json").is_file());

    // the pack still builds afterwards
    let out = TempDir::new()?;
    build(&config(pack.path(), EditorTarget::Claude, out.path()))?;
    Ok(())
}

#[test]
fn test_overlay_id_cannot_escape_profiles() -> Result<()> {
    let pack = create_test_pack()?;
    let out = TempDir::new()?;
    // a valid overlay document outside profiles/
    fs::write(
        pack.path().join("outside.overlay.json"),
        r#"{"overrides":[]}"#,
    )?;

    let cfg = config(pack.path(), EditorTarget::Cursor, out.path())
        .with_project(Some("../../outside".to_string()));
    let err = build(&cfg).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidOverlayId { scope: "project", .. })
    ));
    Ok(())
}
