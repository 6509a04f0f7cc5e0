//! rulepack - compiles AI-editor rule packs into editor artifacts
//!
//! Every command resolves the pack from an explicit `--root`; nothing is
//! inferred from the binary's own location.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rulepack_core::editor::EditorTarget;
use rulepack_core::engine::{self, BuildConfig, PackPaths};
use rulepack_core::integrity::verify_output;
use rulepack_core::validator;
use rulepack_core::BuildError;

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "rulepack",
    about = "Compile AI-editor rule packs into per-editor artifacts",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Set log level
    #[clap(long, default_value = "info", global = true)]
    log_level: LogLevel,
}

#[derive(Parser, Debug)]
enum Command {
    /// Build editor artifacts and an integrity manifest
    Build {
        /// Target editor (cursor, claude, gemini)
        #[clap(long, default_value = "cursor")]
        editor: EditorTarget,

        /// Org overlay id (profiles/org/<ID>.overlay.json)
        #[clap(long)]
        org: Option<String>,

        /// Project overlay id (profiles/project/<ID>.overlay.json)
        #[clap(long)]
        project: Option<String>,

        /// Output directory; replaced on every build
        #[clap(long, default_value = "out/default")]
        out: PathBuf,

        /// Rule pack root
        #[clap(long, default_value = ".")]
        root: PathBuf,
    },

    /// Lint rule documents for schema errors and routing ambiguity
    Validate {
        /// Rule pack root
        #[clap(long, default_value = ".")]
        root: PathBuf,

        /// Output results as JSON
        #[clap(long)]
        json: bool,
    },

    /// Check a build output against its manifest
    Verify {
        /// Output directory of a previous build
        #[clap(long, default_value = "out/default")]
        out: PathBuf,
    },

    /// Show the assembled rule set without writing anything
    Inspect {
        /// Rule pack root
        #[clap(long, default_value = ".")]
        root: PathBuf,

        /// Org overlay id
        #[clap(long)]
        org: Option<String>,

        /// Project overlay id
        #[clap(long)]
        project: Option<String>,

        /// Output results as JSON
        #[clap(long, conflicts_with = "table")]
        json: bool,

        /// Display results in a compact table format
        #[clap(short, long)]
        table: bool,
    },
}

/// Initialize tracing from --log-level (RUST_LOG is ignored)
fn initialize_tracing(log_level: &LogLevel) {
    let filter = EnvFilter::new(log_level.to_filter_directive());

    // stdout carries command output; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level);

    match cli.command {
        Command::Build {
            editor,
            org,
            project,
            out,
            root,
        } => build_command(root, editor, org, project, out),
        Command::Validate { root, json } => validate_command(root, json),
        Command::Verify { out } => verify_command(out),
        Command::Inspect {
            root,
            org,
            project,
            json,
            table,
        } => inspect_command(root, org, project, json, table),
    }
}

fn build_command(
    root: PathBuf,
    editor: EditorTarget,
    org: Option<String>,
    project: Option<String>,
    out: PathBuf,
) -> Result<()> {
    let config = BuildConfig::new(root, editor, out)
        .with_org(org)
        .with_project(project);

    let outcome = match engine::build(&config) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Build failed: {:#}", e);
            // exit 2: rejected before the output directory was touched
            let configuration = e
                .downcast_ref::<BuildError>()
                .is_some_and(BuildError::is_configuration_error);
            if configuration {
                eprintln!("Configuration error: {e:#}");
                std::process::exit(2);
            }
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    };

    println!(
        "Built {} rules for {} → {} (sha256 {})",
        outcome.manifest.rule_count,
        editor.display_name(),
        config.out.display(),
        outcome.manifest.sha256
    );
    Ok(())
}

fn validate_command(root: PathBuf, json: bool) -> Result<()> {
    info!("Validating rule pack at: {:?}", root);

    let paths = PackPaths::resolve(&root)?;
    let documents = validator::discover_rule_documents(&paths)?;
    let result = validator::RuleValidator::new().validate_documents(&documents, &paths.lint);

    if json {
        let json_output = serde_json::json!({
            "total_files": documents.len(),
            "total_errors": result.total_errors,
            "total_warnings": result.total_warnings,
            "documents": result.documents.iter().map(|d| {
                serde_json::json!({
                    "path": d.path,
                    "error_count": d.error_count,
                    "warning_count": d.warning_count,
                    "issues": d.issues.iter().map(|i| {
                        serde_json::json!({
                            "severity": format!("{:?}", i.severity),
                            "rule_id": i.rule_id,
                            "message": i.message,
                        })
                    }).collect::<Vec<_>>()
                })
            }).collect::<Vec<_>>(),
            "advisories": result.advisories.iter().map(|a| {
                serde_json::json!({
                    "rule_id": a.rule_id,
                    "message": a.message,
                })
            }).collect::<Vec<_>>()
        });
        println!("{}", serde_json::to_string_pretty(&json_output)?);
    } else {
        print_validation_results(&result);
    }

    if !result.passed() {
        std::process::exit(1);
    }

    Ok(())
}

fn print_validation_results(result: &validator::ValidationResult) {
    use validator::Severity;

    for document in &result.documents {
        let file = document
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| document.path.display().to_string());

        for issue in &document.issues {
            match issue.severity {
                Severity::Error => eprintln!("{file}: {}", issue.message),
                Severity::Warning => eprintln!("{file}: warning: {}", issue.message),
            }
        }
    }

    for advisory in &result.advisories {
        eprintln!("[routing] {}", advisory.message);
    }

    if result.passed() {
        println!("Validation OK");
    } else {
        eprintln!(
            "{} errors, {} warnings in {} files",
            result.total_errors,
            result.total_warnings,
            result.documents.len()
        );
    }
}

fn verify_command(out: PathBuf) -> Result<()> {
    info!("Verifying build output at: {:?}", out);

    let report = verify_output(&out)?;

    if report.is_intact() {
        println!(
            "✅ {} matches manifest (sha256 {})",
            report.artifact_root.display(),
            report.actual
        );
        Ok(())
    } else {
        eprintln!("❌ {} does not match manifest", report.artifact_root.display());
        eprintln!("   expected: {}", report.manifest.sha256);
        eprintln!("   actual:   {}", report.actual);
        std::process::exit(1);
    }
}

// Table row structure for rule display
#[derive(Tabled)]
struct RuleTableRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Matches")]
    matches: usize,
    #[tabled(rename = "Content")]
    content_len: usize,
}

fn inspect_command(
    root: PathBuf,
    org: Option<String>,
    project: Option<String>,
    json: bool,
    table: bool,
) -> Result<()> {
    info!("Inspecting rule pack at: {:?}", root);

    let paths = PackPaths::resolve(&root)?;
    let selected = engine::select_overlays(org.as_deref(), project.as_deref());

    let compiled = engine::compile_rules(&paths, &selected)?;

    if json {
        let output = serde_json::json!({
            "total_rules": compiled.rules.len(),
            "rules": compiled.rules.iter().map(|rule| {
                serde_json::json!({
                    "name": rule.name,
                    "source": rule.source,
                    "matches": rule.matches,
                    "content_length": rule.content.chars().count(),
                    "workspace_contract": rule.is_workspace_contract(),
                })
            }).collect::<Vec<_>>(),
            "overlays": compiled.overlays.iter().map(|(scope, id, report)| {
                serde_json::json!({
                    "scope": scope.as_str(),
                    "id": id,
                    "applied": report.applied,
                    "skipped": report.skipped,
                })
            }).collect::<Vec<_>>()
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if table {
        let rows: Vec<RuleTableRow> = compiled
            .rules
            .iter()
            .enumerate()
            .map(|(i, rule)| RuleTableRow {
                position: i + 1,
                name: rule.name.clone(),
                source: rule.source.clone(),
                matches: rule.matches.len(),
                content_len: rule.content.chars().count(),
            })
            .collect();

        let mut table = Table::new(&rows);
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        println!("{table}");
        println!("\nTotal: {} rules", rows.len());
    } else {
        for rule in &compiled.rules {
            println!("\n{}", rule.name);
            println!("  Source: {}", rule.source);
            if rule.matches.is_empty() {
                println!("  Matches: -");
            } else {
                println!("  Matches: {}", rule.matches.join(", "));
            }
            println!("  Content: {} chars", rule.content.chars().count());
        }

        for (scope, id, report) in &compiled.overlays {
            println!(
                "\nOverlay {scope}/{id}: {} patched, {} unknown targets",
                report.applied.len(),
                report.skipped.len()
            );
        }
        println!("\nTotal: {} rules", compiled.rules.len());
    }

    Ok(())
}
