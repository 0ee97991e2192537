//! `pinv status` command - Inventory status dashboard

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::analytics::{DepreciationPolicy, IntegrityReport, Valuation, WarrantyStatus};
use crate::cli::helpers::{as_of, format_money};
use crate::cli::{GlobalOpts, OutputFormat, Workspace};
use crate::core::Snapshot;
use crate::engine::{ancestors_of, LocationTree};

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Also break values down by category
    #[arg(long)]
    pub detailed: bool,
}

#[derive(Serialize, Default)]
struct InventoryMetrics {
    locations: usize,
    top_level: usize,
    max_depth: usize,
    items: usize,
    unassigned: usize,
}

#[derive(Serialize, Default)]
struct ValueMetrics {
    purchase_value: f64,
    current_value: f64,
    depreciation: f64,
    items_without_value: usize,
    /// Category -> (count, purchase value)
    by_category: BTreeMap<String, (usize, f64)>,
}

#[derive(Serialize, Default)]
struct WarrantyMetrics {
    active: usize,
    expiring: usize,
    expired: usize,
    none: usize,
}

#[derive(Serialize)]
struct QualityMetrics {
    unreadable_files: usize,
    cycle_members: usize,
    unreachable: usize,
    dangling_parents: usize,
    duplicate_ids: usize,
    missing_item_locations: usize,
}

pub fn run(args: StatusArgs, workspace: &Workspace, global: &GlobalOpts) -> Result<()> {
    let snapshot = workspace.snapshot(true)?;
    let today = as_of(None);
    let policy = DepreciationPolicy::from_config(&workspace.config);
    let valuation = Valuation::compute(&snapshot, &policy, today);
    let integrity = IntegrityReport::check(&snapshot);
    let currency = workspace.config.currency();

    let inventory = collect_inventory_metrics(&snapshot, &valuation);
    let value = collect_value_metrics(&snapshot, &valuation);
    let warranty =
        collect_warranty_metrics(&snapshot, today, workspace.config.warranty_warning_days());
    let quality = QualityMetrics {
        unreadable_files: snapshot.issues.len(),
        cycle_members: integrity.cycle_members.len(),
        unreachable: integrity.unreachable.len(),
        dangling_parents: integrity.dangling_parents.len(),
        duplicate_ids: integrity.duplicate_ids.len(),
        missing_item_locations: integrity.missing_item_locations.len(),
    };
    let health = calculate_health(&quality, &warranty);

    match global.format {
        OutputFormat::Json => {
            let status = serde_json::json!({
                "as_of": today.to_string(),
                "inventory": inventory,
                "value": value,
                "warranty": warranty,
                "quality": quality,
                "health": health,
            });
            println!("{}", serde_json::to_string_pretty(&status).into_diagnostic()?);
        }
        _ => {
            let width = 68;

            println!("{}", style("Inventory Status").bold().underlined());
            println!("{}", "═".repeat(width));
            println!();

            print_two_columns(
                "INVENTORY",
                &[
                    format!("Locations:   {}", style(inventory.locations).cyan()),
                    format!("Top-level:   {}", inventory.top_level),
                    format!("Max depth:   {}", inventory.max_depth),
                    format!("Items:       {}", style(inventory.items).cyan()),
                    format!("Unassigned:  {}", inventory.unassigned),
                ],
                "VALUE",
                &[
                    format!(
                        "Purchase:  {}",
                        style(format_money(currency, value.purchase_value)).green()
                    ),
                    format!(
                        "Current:   {}",
                        style(format_money(currency, value.current_value)).green()
                    ),
                    format!("Lost:      {}", format_money(currency, value.depreciation)),
                    format!("No value:  {} item(s)", value.items_without_value),
                ],
            );

            println!();

            let expiring = if warranty.expiring > 0 {
                style(warranty.expiring).yellow().bold()
            } else {
                style(warranty.expiring)
            };
            let errors = quality.cycle_members + quality.duplicate_ids + quality.unreadable_files;
            print_two_columns(
                "WARRANTY",
                &[
                    format!("Active:    {}", style(warranty.active).green()),
                    format!("Expiring:  {}", expiring),
                    format!("Expired:   {}", warranty.expired),
                    format!("None:      {}", style(warranty.none).dim()),
                ],
                "DATA QUALITY",
                &[
                    format!("Unreadable files:   {}", quality.unreadable_files),
                    format!("In parent cycles:   {}", quality.cycle_members),
                    format!("Unreachable:        {}", quality.unreachable),
                    format!("Missing parents:    {}", quality.dangling_parents),
                    format!("Duplicate IDs:      {}", quality.duplicate_ids),
                    format!("Lost item links:    {}", quality.missing_item_locations),
                ],
            );

            if args.detailed && !value.by_category.is_empty() {
                println!();
                let lines: Vec<String> = value
                    .by_category
                    .iter()
                    .map(|(category, (count, total))| {
                        format!(
                            "{:<24} {:>4}  {:>14}",
                            category,
                            count,
                            format_money(currency, *total)
                        )
                    })
                    .collect();
                print_section("BY CATEGORY", &lines);
            }

            println!();
            println!("{}", "═".repeat(width));

            let health_style = match health {
                "Healthy" => style(health).green().bold(),
                "Warning" => style(health).yellow().bold(),
                _ => style(health).red().bold(),
            };
            println!("Inventory Health: {}", health_style);
            if errors > 0 || warranty.expiring > 0 {
                println!(
                    "{}",
                    style("Run `pinv validate` and `pinv report warranty` for details.").dim()
                );
            }
        }
    }

    Ok(())
}

fn collect_inventory_metrics(snapshot: &Snapshot, valuation: &Valuation) -> InventoryMetrics {
    let tree = LocationTree::build(&snapshot.locations);
    let max_depth = tree
        .iter()
        .map(|l| ancestors_of(&tree, l.id.as_str()).len().saturating_sub(1))
        .max()
        .unwrap_or(0);

    InventoryMetrics {
        locations: tree.len(),
        top_level: tree.roots().len(),
        max_depth,
        items: snapshot.items.len(),
        unassigned: valuation.unassigned_items.len(),
    }
}

fn collect_value_metrics(snapshot: &Snapshot, valuation: &Valuation) -> ValueMetrics {
    let total = valuation.grand_total();
    let mut metrics = ValueMetrics {
        purchase_value: total.value,
        current_value: total.depreciated_value,
        depreciation: total.value - total.depreciated_value,
        ..Default::default()
    };

    for item in &snapshot.items {
        if item.value.is_none() {
            metrics.items_without_value += 1;
        }
        let category = item
            .category
            .as_deref()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "(none)".to_string());
        let entry = metrics.by_category.entry(category).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += item.value_or_zero();
    }

    metrics
}

fn collect_warranty_metrics(
    snapshot: &Snapshot,
    today: chrono::NaiveDate,
    warning_days: i64,
) -> WarrantyMetrics {
    let mut metrics = WarrantyMetrics::default();
    for item in &snapshot.items {
        match WarrantyStatus::classify(item.warranty_expires, today, warning_days) {
            WarrantyStatus::None => metrics.none += 1,
            WarrantyStatus::Active { .. } => metrics.active += 1,
            WarrantyStatus::ExpiringSoon { .. } => metrics.expiring += 1,
            WarrantyStatus::Expired { .. } => metrics.expired += 1,
        }
    }
    metrics
}

fn print_two_columns(title1: &str, lines1: &[String], title2: &str, lines2: &[String]) {
    let col_width = 32;

    println!("{:<col_width$} {}", style(title1).bold(), style(title2).bold());
    println!("{:-<col_width$} {:-<col_width$}", "", "");

    let max_lines = lines1.len().max(lines2.len());
    for i in 0..max_lines {
        let l1 = lines1.get(i).map(String::as_str).unwrap_or("");
        let l2 = lines2.get(i).map(String::as_str).unwrap_or("");
        let pad = 30usize.saturating_sub(console::measure_text_width(l1));
        println!("  {}{} {}", l1, " ".repeat(pad), l2);
    }
}

fn print_section(title: &str, lines: &[String]) {
    println!("{}", style(title).bold());
    println!("{:-<64}", "");
    for line in lines {
        println!("  {}", line);
    }
}

/// Errors make the inventory critical; warnings or expiring warranties a warning
fn calculate_health(quality: &QualityMetrics, warranty: &WarrantyMetrics) -> &'static str {
    if quality.cycle_members > 0 || quality.duplicate_ids > 0 || quality.unreadable_files > 0 {
        "Critical"
    } else if quality.unreachable > 0
        || quality.dangling_parents > 0
        || quality.missing_item_locations > 0
        || warranty.expiring > 0
    {
        "Warning"
    } else {
        "Healthy"
    }
}
