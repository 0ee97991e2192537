//! `pinv search` command - Search locations and items together
//!
//! Every hit is shown with the breadcrumb path of where it lives, so a
//! match deep in the hierarchy can be found without browsing the tree.

use clap::ValueEnum;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{location_path, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat, Workspace};
use crate::core::identity::EntityId;
use crate::engine::LocationTree;

#[derive(clap::Args, Debug)]
pub struct SearchArgs {
    /// Search term (matches location names and descriptions, item fields and tags)
    pub query: String,

    /// Restrict to locations or items
    #[arg(long, short = 't', value_delimiter = ',')]
    pub entity_type: Option<Vec<SearchKind>>,

    /// Filter by tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Limit number of results
    #[arg(long, short = 'n', default_value = "50")]
    pub limit: usize,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum SearchKind {
    Loc,
    Item,
}

struct Hit<'a> {
    id: &'a EntityId,
    kind: SearchKind,
    name: &'a str,
    /// Where the hit lives: a location's own path, an item's location path
    path: String,
}

pub fn run(args: SearchArgs, workspace: &Workspace, global: &GlobalOpts) -> Result<()> {
    let snapshot = workspace.snapshot(global.quiet)?;
    let tree = LocationTree::build(&snapshot.locations);
    let needle = args.query.to_lowercase();
    let wanted = |kind: SearchKind| {
        args.entity_type
            .as_ref()
            .map_or(true, |kinds| kinds.contains(&kind))
    };
    let tagged = |tags: &[String]| {
        args.tag
            .as_ref()
            .map_or(true, |tag| tags.iter().any(|t| t.eq_ignore_ascii_case(tag)))
    };

    let mut hits: Vec<Hit> = Vec::new();
    if wanted(SearchKind::Loc) {
        hits.extend(
            snapshot
                .locations
                .iter()
                .filter(|l| tagged(&l.tags))
                .filter(|l| {
                    l.name.to_lowercase().contains(&needle)
                        || l.description
                            .as_ref()
                            .is_some_and(|d| d.to_lowercase().contains(&needle))
                        || l.tags.iter().any(|t| t.to_lowercase().contains(&needle))
                })
                .map(|l| Hit {
                    id: &l.id,
                    kind: SearchKind::Loc,
                    name: &l.name,
                    path: location_path(&tree, Some(l.id.as_str())),
                }),
        );
    }
    if wanted(SearchKind::Item) {
        hits.extend(
            snapshot
                .items
                .iter()
                .filter(|i| tagged(&i.tags) && i.matches(&args.query))
                .map(|i| Hit {
                    id: &i.id,
                    kind: SearchKind::Item,
                    name: &i.name,
                    path: location_path(&tree, i.location_id()),
                }),
        );
    }
    hits.truncate(args.limit);

    if args.count {
        println!("{}", hits.len());
        return Ok(());
    }

    if hits.is_empty() {
        println!("No results found for '{}'.", style(&args.query).yellow());
        return Ok(());
    }

    let mut short_ids = workspace.short_ids();
    for hit in &hits {
        short_ids.add(hit.id);
    }
    workspace.save_short_ids(&short_ids);

    let format = global.format.resolve(None, OutputFormat::Tsv);
    let kind_label = |kind: SearchKind| match kind {
        SearchKind::Loc => "LOC",
        SearchKind::Item => "ITEM",
    };

    match format {
        OutputFormat::Json | OutputFormat::Yaml => {
            let values: Vec<serde_json::Value> = hits
                .iter()
                .map(|h| {
                    serde_json::json!({
                        "id": h.id,
                        "type": kind_label(h.kind),
                        "name": h.name,
                        "path": h.path,
                    })
                })
                .collect();
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&values).into_diagnostic()?);
            } else {
                print!("{}", serde_yml::to_string(&values).into_diagnostic()?);
            }
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            writer
                .write_record(["short_id", "id", "type", "name", "path"])
                .into_diagnostic()?;
            for hit in &hits {
                writer
                    .write_record([
                        short_ids.format(hit.id).as_str(),
                        hit.id.as_str(),
                        kind_label(hit.kind),
                        hit.name,
                        hit.path.as_str(),
                    ])
                    .into_diagnostic()?;
            }
            writer.flush().into_diagnostic()?;
        }
        OutputFormat::Id => {
            for hit in &hits {
                println!("{}", hit.id);
            }
        }
        OutputFormat::Md => {
            println!("| Short | Type | Name | Path |");
            println!("|---|---|---|---|");
            for hit in &hits {
                println!(
                    "| {} | {} | {} | {} |",
                    short_ids.format(hit.id),
                    kind_label(hit.kind),
                    hit.name.replace('|', "\\|"),
                    hit.path.replace('|', "\\|")
                );
            }
        }
        OutputFormat::Tsv | OutputFormat::Auto => {
            println!(
                "{} results for '{}':",
                style(hits.len()).cyan(),
                style(&args.query).yellow()
            );
            println!();
            println!(
                "{:<10} {:<5} {:<30} {}",
                style("SHORT").bold().dim(),
                style("TYPE").bold(),
                style("NAME").bold(),
                style("PATH").bold()
            );
            println!("{}", "-".repeat(85));

            for hit in &hits {
                let kind = match hit.kind {
                    SearchKind::Loc => style(kind_label(hit.kind)).blue(),
                    SearchKind::Item => style(kind_label(hit.kind)).green(),
                };
                println!(
                    "{:<10} {:<5} {:<30} {}",
                    style(short_ids.format(hit.id)).cyan(),
                    kind,
                    truncate_str(hit.name, 28),
                    style(&hit.path).dim()
                );
            }
        }
    }

    Ok(())
}
