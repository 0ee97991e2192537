//! Valuation report

use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::analytics::{DepreciationPolicy, Valuation};
use crate::cli::helpers::{as_of, format_money, write_output};
use crate::cli::{GlobalOpts, OutputFormat, Workspace};
use crate::engine::{flatten, FlattenOptions, LocationTree};

use super::parse_date_arg;

#[derive(clap::Args, Debug)]
pub struct ValuationArgs {
    /// Value items as of this date (YYYY-MM-DD, default today)
    #[arg(long, value_parser = parse_date_arg)]
    pub as_of: Option<chrono::NaiveDate>,

    /// Only top-level locations
    #[arg(long)]
    pub roots: bool,

    /// Output to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: ValuationArgs, workspace: &Workspace, global: &GlobalOpts) -> Result<()> {
    let snapshot = workspace.snapshot(global.quiet)?;
    let tree = LocationTree::build(&snapshot.locations);
    let policy = DepreciationPolicy::from_config(&workspace.config);
    let valuation = Valuation::compute(&snapshot, &policy, as_of(args.as_of));
    let currency = workspace.config.currency();

    let flattened = flatten(&tree, &FlattenOptions::all());
    let rows: Vec<_> = flattened
        .rows
        .iter()
        .filter(|r| !args.roots || r.depth == 0)
        .collect();

    if global.format == OutputFormat::Json {
        let locations: Vec<serde_json::Value> = rows
            .iter()
            .map(|r| {
                let id = r.node.id.as_str();
                serde_json::json!({
                    "id": id,
                    "name": r.node.name,
                    "depth": r.depth,
                    "unreachable": r.unreachable,
                    "cycle": valuation.is_cycle_member(id),
                    "direct": valuation.direct(id),
                    "total": valuation.aggregate(id),
                })
            })
            .collect();
        let report = serde_json::json!({
            "as_of": valuation.as_of.to_string(),
            "currency": currency,
            "locations": locations,
            "unassigned": valuation.unassigned,
            "grand_total": valuation.grand_total(),
        });
        let content = serde_json::to_string_pretty(&report).into_diagnostic()? + "\n";
        return write_output(&content, args.output.as_deref());
    }

    let mut output = String::new();
    output.push_str("# Inventory Valuation\n\n");
    output.push_str(&format!("As of: {}\n\n", valuation.as_of));

    let mut builder = Builder::default();
    builder.push_record(["Location", "Here", "Items", "Value", "Current"]);
    for row in &rows {
        let id = row.node.id.as_str();
        let direct = valuation.direct(id);
        let total = valuation.aggregate(id);
        let mut label = format!("{}{}", "  ".repeat(row.depth), row.node.name);
        if valuation.is_cycle_member(id) {
            label.push_str(" (cycle)");
        } else if row.unreachable {
            label.push_str(" (unreachable)");
        }
        builder.push_record([
            label,
            direct.item_count.to_string(),
            total.item_count.to_string(),
            format_money(currency, total.value),
            format_money(currency, total.depreciated_value),
        ]);
    }
    if valuation.unassigned.item_count > 0 {
        builder.push_record([
            "(unassigned)".to_string(),
            valuation.unassigned.item_count.to_string(),
            valuation.unassigned.item_count.to_string(),
            format_money(currency, valuation.unassigned.value),
            format_money(currency, valuation.unassigned.depreciated_value),
        ]);
    }
    output.push_str(&builder.build().with(Style::markdown()).to_string());

    let total = valuation.grand_total();
    output.push_str("\n\n## Summary\n\n");
    output.push_str(&format!("- **Locations:** {}\n", tree.len()));
    output.push_str(&format!("- **Items:** {}\n", total.item_count));
    output.push_str(&format!(
        "- **Purchase value:** {}\n",
        format_money(currency, total.value)
    ));
    output.push_str(&format!(
        "- **Current value:** {}\n",
        format_money(currency, total.depreciated_value)
    ));
    output.push_str(&format!(
        "- **Depreciation:** {}\n",
        format_money(currency, total.value - total.depreciated_value)
    ));
    if !valuation.cycle_members().is_empty() {
        output.push_str(&format!(
            "\n**Warning:** {} location(s) form parent cycles; items stored in them are counted only in their own loop.\n",
            valuation.cycle_members().len()
        ));
    }

    write_output(&output, args.output.as_deref())
}
