//! `pinv validate` command - Schema and hierarchy checks
//!
//! Two passes: every record file against its JSON Schema, then the loaded
//! snapshot for structural problems the engine tolerates but a user will
//! want fixed (parent cycles, unreachable locations, dangling references,
//! duplicate IDs).

use console::style;
use miette::{IntoDiagnostic, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use walkdir::WalkDir;

use crate::analytics::IntegrityReport;
use crate::cli::{GlobalOpts, OutputFormat, Workspace};
use crate::core::identity::EntityPrefix;
use crate::core::project::RECORD_SUFFIX;
use crate::entities::Location;
use crate::schema::Validator;

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Files or directories to schema-check (default: entire project)
    #[arg()]
    pub paths: Vec<PathBuf>,

    /// Strict mode - warnings become errors
    #[arg(long)]
    pub strict: bool,

    /// Show summary only, don't show individual files
    #[arg(long)]
    pub summary: bool,
}

/// Validation statistics
#[derive(Debug, Default)]
struct ValidationStats {
    files_checked: usize,
    files_passed: usize,
    files_failed: usize,
    total_errors: usize,
    total_warnings: usize,
}

pub fn run(args: ValidateArgs, workspace: &Workspace, global: &GlobalOpts) -> Result<()> {
    let validator = Validator::default();
    let mut stats = ValidationStats::default();
    let human = !matches!(global.format, OutputFormat::Json | OutputFormat::Yaml);
    let verbose = human && !args.summary && !global.quiet;

    let files = if args.paths.is_empty() {
        EntityPrefix::all()
            .iter()
            .flat_map(|prefix| workspace.project.iter_entity_files(*prefix))
            .collect()
    } else {
        expand_paths(&args.paths)
    };

    if verbose {
        println!("{} Validating {} file(s)...\n", style("→").blue(), files.len());
    }

    for path in &files {
        stats.files_checked += 1;
        let shown = workspace.project.relative(path).display();

        match validator.validate_file(path) {
            Err(e) => {
                stats.files_failed += 1;
                stats.total_errors += 1;
                if verbose {
                    println!("{} {} - {}", style("✗").red(), shown, e);
                }
            }
            Ok(Ok(())) => {
                stats.files_passed += 1;
                if verbose {
                    println!("{} {}", style("✓").green(), shown);
                }
            }
            Ok(Err(e)) => {
                stats.files_failed += 1;
                stats.total_errors += e.violation_count();
                if verbose {
                    println!(
                        "{} {} - {} error(s)",
                        style("✗").red(),
                        shown,
                        e.violation_count()
                    );
                    println!("{:?}", miette::Report::new(e));
                }
            }
        }
    }

    // Structure is checked over everything that loads, whatever paths were named
    let snapshot = workspace.snapshot(true)?;
    let integrity = IntegrityReport::check(&snapshot);
    stats.total_errors += integrity.error_count();
    stats.total_warnings += integrity.warning_count();
    tracing::debug!(
        errors = integrity.error_count(),
        warnings = integrity.warning_count(),
        "hierarchy checked"
    );

    let failed = stats.files_failed > 0
        || integrity.error_count() > 0
        || (args.strict && integrity.warning_count() > 0);

    if !human {
        let report = serde_json::json!({
            "files_checked": stats.files_checked,
            "files_failed": stats.files_failed,
            "errors": stats.total_errors,
            "warnings": stats.total_warnings,
            "hierarchy": &integrity,
        });
        if global.format == OutputFormat::Json {
            println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
        } else {
            print!("{}", serde_yml::to_string(&report).into_diagnostic()?);
        }
    } else {
        if !args.summary && !integrity.is_clean() {
            let names: HashMap<&str, &Location> = snapshot
                .locations
                .iter()
                .map(|l| (l.id.as_str(), l))
                .collect();
            print_integrity(&integrity, &names, &snapshot.items);
        }
        print_summary(&stats);
    }

    if failed {
        return Err(miette::miette!(
            "Validation failed: {} error(s){}",
            stats.total_errors,
            if args.strict && integrity.warning_count() > 0 {
                format!(", {} warning(s) in strict mode", integrity.warning_count())
            } else {
                String::new()
            }
        ));
    }

    if human {
        println!("{} All records passed validation!", style("✓").green().bold());
    }
    Ok(())
}

fn print_integrity(
    report: &IntegrityReport,
    locations: &HashMap<&str, &Location>,
    items: &[crate::entities::Item],
) {
    let name = |id: &str| {
        locations
            .get(id)
            .map(|l| format!("{} ({})", l.name, id))
            .unwrap_or_else(|| id.to_string())
    };

    println!();
    println!("{}", style("Hierarchy").bold());

    if !report.cycle_members.is_empty() {
        let members: Vec<String> = report.cycle_members.iter().map(|id| name(id)).collect();
        println!(
            "{} Parent cycle between {} location(s): {}",
            style("✗").red(),
            report.cycle_members.len(),
            members.join(", ")
        );
    }
    for id in &report.duplicate_ids {
        println!("{} Duplicate ID {} used by more than one record", style("✗").red(), id);
    }
    for (id, parent) in &report.dangling_parents {
        println!(
            "{} {} has missing parent {}",
            style("!").yellow(),
            name(id),
            style(parent).dim()
        );
    }
    for id in &report.unreachable {
        println!(
            "{} {} is not under any top-level location",
            style("!").yellow(),
            name(id)
        );
    }
    for (item_id, location) in &report.missing_item_locations {
        let item_name = items
            .iter()
            .find(|i| i.id.as_str() == item_id)
            .map(|i| i.name.as_str())
            .unwrap_or(item_id.as_str());
        println!(
            "{} Item {} refers to missing location {}",
            style("!").yellow(),
            item_name,
            style(location).dim()
        );
    }
}

fn print_summary(stats: &ValidationStats) {
    println!();
    println!("{}", style("─".repeat(60)).dim());
    println!("{}", style("Validation Summary").bold());
    println!("{}", style("─".repeat(60)).dim());
    println!("  Files checked:  {}", style(stats.files_checked).cyan());
    println!("  Files passed:   {}", style(stats.files_passed).green());
    println!("  Files failed:   {}", style(stats.files_failed).red());
    println!("  Total errors:   {}", style(stats.total_errors).red());
    if stats.total_warnings > 0 {
        println!("  Total warnings: {}", style(stats.total_warnings).yellow());
    }
    println!();
}

/// Record files named directly or found under named directories
fn expand_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(
                WalkDir::new(path)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_file())
                    .filter(|e| e.path().to_string_lossy().ends_with(RECORD_SUFFIX))
                    .map(|e| e.path().to_path_buf()),
            );
        } else {
            files.push(path.clone());
        }
    }
    files
}
