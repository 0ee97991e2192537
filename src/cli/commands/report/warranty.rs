//! Warranty report

use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::analytics::WarrantyStatus;
use crate::cli::helpers::{as_of, location_path, write_output};
use crate::cli::{GlobalOpts, OutputFormat, Workspace};
use crate::engine::LocationTree;
use crate::entities::Item;

use super::parse_date_arg;

#[derive(clap::Args, Debug)]
pub struct WarrantyArgs {
    /// Warning window in days (default: warranty_warning_days from config)
    #[arg(long, short = 'w')]
    pub within: Option<i64>,

    /// Reference date (YYYY-MM-DD, default today)
    #[arg(long, value_parser = parse_date_arg)]
    pub as_of: Option<chrono::NaiveDate>,

    /// Also list active and expired warranties
    #[arg(long)]
    pub all: bool,

    /// Output to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: WarrantyArgs, workspace: &Workspace, global: &GlobalOpts) -> Result<()> {
    let snapshot = workspace.snapshot(global.quiet)?;
    let tree = LocationTree::build(&snapshot.locations);
    let today = as_of(args.as_of);
    let window = args
        .within
        .unwrap_or_else(|| workspace.config.warranty_warning_days());

    let mut rows: Vec<(&Item, WarrantyStatus)> = snapshot
        .items
        .iter()
        .map(|item| (item, WarrantyStatus::classify(item.warranty_expires, today, window)))
        .filter(|(_, status)| match status {
            WarrantyStatus::None => false,
            WarrantyStatus::ExpiringSoon { .. } => true,
            _ => args.all,
        })
        .collect();
    // Soonest expiry first
    rows.sort_by_key(|(item, _)| item.warranty_expires);

    if global.format == OutputFormat::Json {
        let entries: Vec<serde_json::Value> = rows
            .iter()
            .map(|(item, status)| {
                serde_json::json!({
                    "id": item.id,
                    "name": item.name,
                    "location": location_path(&tree, item.location_id()),
                    "warranty_expires": item.warranty_expires,
                    "warranty": status,
                })
            })
            .collect();
        let content = serde_json::to_string_pretty(&entries).into_diagnostic()? + "\n";
        return write_output(&content, args.output.as_deref());
    }

    let mut output = String::new();
    output.push_str("# Warranty Report\n\n");
    output.push_str(&format!("As of: {} (window: {} days)\n\n", today, window));

    if rows.is_empty() {
        output.push_str("No warranties need attention.\n");
        return write_output(&output, args.output.as_deref());
    }

    let mut builder = Builder::default();
    builder.push_record(["Item", "Location", "Expires", "Status"]);
    for (item, status) in &rows {
        builder.push_record([
            item.name.clone(),
            location_path(&tree, item.location_id()),
            item.warranty_expires.map(|d| d.to_string()).unwrap_or_default(),
            status.to_string(),
        ]);
    }
    output.push_str(&builder.build().with(Style::markdown()).to_string());

    let expiring = rows.iter().filter(|(_, s)| s.needs_attention()).count();
    let expired = rows
        .iter()
        .filter(|(_, s)| matches!(s, WarrantyStatus::Expired { .. }))
        .count();
    output.push_str("\n\n## Summary\n\n");
    output.push_str(&format!("- **Expiring within {} days:** {}\n", window, expiring));
    if args.all {
        output.push_str(&format!("- **Expired:** {}\n", expired));
        output.push_str(&format!("- **Active:** {}\n", rows.len() - expiring - expired));
    }

    write_output(&output, args.output.as_deref())
}
