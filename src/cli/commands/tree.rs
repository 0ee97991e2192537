//! `pinv tree` command - Location hierarchy with rolled-up totals

use clap::ValueEnum;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::analytics::{DepreciationPolicy, Valuation};
use crate::cli::helpers::{as_of, format_money, parse_date, resolve_location};
use crate::cli::{GlobalOpts, OutputFormat, Workspace};
use crate::engine::{
    ancestors_of, flatten, FlattenOptions, LocationTotals, LocationTree, VisibleNode,
};
use crate::entities::Location;

#[derive(clap::Args, Debug)]
pub struct TreeArgs {
    /// Expand only these locations (default: expand everything)
    #[arg(long, short = 'x')]
    pub expand: Vec<String>,

    /// Expand every location down to this depth (0 = top level only)
    #[arg(long, short = 'd', conflicts_with = "expand")]
    pub depth: Option<usize>,

    /// Show only locations whose name contains this text, with their ancestors
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Which rolled-up total to show next to each location
    #[arg(long, short = 'm', value_enum, default_value = "count")]
    pub metric: TreeMetric,

    /// Value depreciation as of this date (YYYY-MM-DD, default today)
    #[arg(long, value_parser = parse_date_arg)]
    pub as_of: Option<chrono::NaiveDate>,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TreeMetric {
    /// Number of items
    #[default]
    Count,
    /// Purchase value
    Value,
    /// Current (depreciated) value
    Depreciated,
}

fn parse_date_arg(text: &str) -> Result<chrono::NaiveDate, String> {
    parse_date(text).map_err(|e| e.to_string())
}

#[derive(Debug, Serialize)]
struct TreeEntry<'a> {
    id: &'a str,
    name: &'a str,
    depth: usize,
    expanded: bool,
    has_children: bool,
    matched: bool,
    unreachable: bool,
    cycle: bool,
    direct: LocationTotals,
    total: LocationTotals,
}

pub fn run(args: TreeArgs, workspace: &Workspace, global: &GlobalOpts) -> Result<()> {
    let snapshot = workspace.snapshot(global.quiet)?;
    let tree = LocationTree::build(&snapshot.locations);
    let policy = DepreciationPolicy::from_config(&workspace.config);
    let valuation = Valuation::compute(&snapshot, &policy, as_of(args.as_of));

    let mut options = if let Some(max_depth) = args.depth {
        let mut options = FlattenOptions::default();
        options.expanded = tree
            .iter()
            .filter(|l| ancestors_of(&tree, l.id.as_str()).len() <= max_depth)
            .map(|l| l.id.to_string())
            .collect();
        options
    } else if args.expand.is_empty() {
        FlattenOptions::all()
    } else {
        let short_ids = workspace.short_ids();
        let mut options = FlattenOptions::default();
        for reference in &args.expand {
            let location = resolve_location(&snapshot, &short_ids, reference)?;
            // Open the path down to it so the expanded node is visible
            for ancestor in ancestors_of(&tree, location.id.as_str()) {
                options.expanded.insert(ancestor.id.to_string());
            }
        }
        options
    };
    if let Some(search) = &args.search {
        options = options.with_filter(search.clone());
    }

    let flattened = flatten(&tree, &options);
    tracing::debug!(
        rows = flattened.rows.len(),
        unreachable = flattened.unreachable,
        "flattened location tree"
    );

    let format = global.format.resolve(None, OutputFormat::Auto);
    if matches!(format, OutputFormat::Json | OutputFormat::Yaml) {
        let entries: Vec<TreeEntry> = flattened
            .rows
            .iter()
            .map(|row| {
                let id = row.node.id.as_str();
                TreeEntry {
                    id,
                    name: &row.node.name,
                    depth: row.depth,
                    expanded: row.expanded,
                    has_children: row.has_children,
                    matched: row.matched,
                    unreachable: row.unreachable,
                    cycle: valuation.is_cycle_member(id),
                    direct: valuation.direct(id),
                    total: valuation.aggregate(id),
                }
            })
            .collect();
        if format == OutputFormat::Json {
            println!("{}", serde_json::to_string_pretty(&entries).into_diagnostic()?);
        } else {
            print!("{}", serde_yml::to_string(&entries).into_diagnostic()?);
        }
        return Ok(());
    }

    if snapshot.locations.is_empty() {
        println!(
            "No locations yet. Create one with {}",
            style("pinv loc new --name House").yellow()
        );
        return Ok(());
    }

    let currency = workspace.config.currency();
    let badge = |totals: LocationTotals| match args.metric {
        TreeMetric::Count => {
            let plural = if totals.item_count == 1 { "" } else { "s" };
            format!("{} item{}", totals.item_count, plural)
        }
        TreeMetric::Value => format_money(currency, totals.value),
        TreeMetric::Depreciated => format_money(currency, totals.depreciated_value),
    };

    let tree_rows = flattened.tree_rows();
    let guides = tree_guides(tree_rows);
    for (row, guide) in tree_rows.iter().zip(guides) {
        println!("{}{}", guide, describe(row, &badge, &valuation));
    }

    let unreachable_rows = flattened.unreachable_rows();
    if !unreachable_rows.is_empty() {
        println!();
        println!(
            "{} {}",
            style("Unreachable").yellow().bold(),
            style(format!("({} not under any top-level location)", unreachable_rows.len())).dim()
        );
        for row in unreachable_rows {
            let parent_note = match row.node.parent.as_deref() {
                Some(parent) if !tree.contains(parent) => {
                    format!(" {}", style(format!("[missing parent {}]", parent)).red())
                }
                _ => String::new(),
            };
            println!("  {}{}", describe(row, &badge, &valuation), parent_note);
        }
    }

    if args.search.is_none() && valuation.unassigned.item_count > 0 {
        println!();
        println!(
            "{} {}",
            style("(unassigned)").dim(),
            style(badge(valuation.unassigned)).cyan()
        );
    }

    if !global.quiet {
        let total = valuation.grand_total();
        println!();
        println!(
            "{} location(s), {} item(s), {} total, {} current",
            style(tree.len()).cyan(),
            style(total.item_count).cyan(),
            style(format_money(currency, total.value)).green(),
            style(format_money(currency, total.depreciated_value)).green()
        );
    }

    Ok(())
}

/// One row's label, badge and markers
fn describe<F>(row: &VisibleNode<'_, Location>, badge: &F, valuation: &Valuation) -> String
where
    F: Fn(LocationTotals) -> String,
{
    let id = row.node.id.as_str();
    let name = if row.matched {
        style(&row.node.name).bold().underlined().to_string()
    } else {
        style(&row.node.name).bold().to_string()
    };

    let totals = style(format!("({})", badge(valuation.aggregate(id)))).cyan();
    let mut text = format!("{} {}", name, totals);
    if row.has_children && !row.expanded {
        text.push_str(&format!(" {}", style("[+]").dim()));
    }
    if valuation.is_cycle_member(id) {
        text.push_str(&format!(" {}", style("↻ cycle").red()));
    }
    text
}

/// Box-drawing prefix for each row of a depth-annotated, depth-first list
fn tree_guides<N>(rows: &[VisibleNode<'_, N>]) -> Vec<String> {
    // A row is the last of its siblings when no later row at the same depth
    // appears before the list climbs above that depth.
    let last: Vec<bool> = (0..rows.len())
        .map(|i| {
            let depth = rows[i].depth;
            rows[i + 1..]
                .iter()
                .take_while(|r| r.depth >= depth)
                .all(|r| r.depth != depth)
        })
        .collect();

    let mut open: Vec<bool> = Vec::new();
    let mut guides = Vec::with_capacity(rows.len());
    for (row, &is_last) in rows.iter().zip(&last) {
        open.truncate(row.depth);
        let mut guide = String::new();
        if row.depth > 0 {
            for &continues in &open[1..] {
                guide.push_str(if continues { "│  " } else { "   " });
            }
            guide.push_str(if is_last { "└─ " } else { "├─ " });
        }
        open.push(!is_last);
        guides.push(guide);
    }
    guides
}
