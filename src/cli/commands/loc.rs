//! `pinv loc` command - Location management

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::analytics::{DepreciationPolicy, Valuation};
use crate::cli::helpers::{
    as_of, format_money, location_path, resolve_location, split_list, PATH_SEPARATOR,
};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat, Workspace};
use crate::core::identity::EntityPrefix;
use crate::core::mutation;
use crate::engine::{flatten, FlattenOptions, LocationTotals, LocationTree};
use crate::entities::Location;

#[derive(Subcommand, Debug)]
pub enum LocCommands {
    /// Create a new location
    New(NewArgs),

    /// List locations in hierarchy order
    List(ListArgs),

    /// Show a location's details, contents and totals
    Show(ShowArgs),

    /// Edit a location in your editor
    Edit(RefArgs),

    /// Rename a location
    Rename(RenameArgs),

    /// Move a location under another one, or to the top level
    Mv(MoveArgs),

    /// Delete a location
    Rm(RemoveArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Location name (prompted for when missing)
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Parent location (ID, short ID, name or path like "House/Kitchen")
    #[arg(long, short = 'p')]
    pub parent: Option<String>,

    /// Position among siblings, lower first
    #[arg(long, allow_hyphen_values = true)]
    pub order: Option<i64>,

    /// Description
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Comma-separated tags
    #[arg(long)]
    pub tags: Option<String>,

    /// Interactive mode (prompt for fields)
    #[arg(long, short = 'i')]
    pub interactive: bool,

    /// Open in editor after creation
    #[arg(long, short = 'e')]
    pub edit: bool,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only locations whose name or description contains this text
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Only top-level locations
    #[arg(long)]
    pub roots: bool,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Location ID, short ID (LOC@N), name or path
    pub reference: String,
}

#[derive(clap::Args, Debug)]
pub struct RefArgs {
    /// Location ID, short ID (LOC@N), name or path
    pub reference: String,
}

#[derive(clap::Args, Debug)]
pub struct RenameArgs {
    /// Location ID, short ID (LOC@N), name or path
    pub reference: String,

    /// New name
    pub name: String,
}

#[derive(clap::Args, Debug)]
pub struct MoveArgs {
    /// Location to move
    pub reference: String,

    /// New parent location
    #[arg(long, short = 'p', conflicts_with = "root", required_unless_present = "root")]
    pub parent: Option<String>,

    /// Make it a top-level location
    #[arg(long)]
    pub root: bool,
}

#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Location to delete
    pub reference: String,

    /// Also delete every location below it (their items become unassigned)
    #[arg(long, short = 'r')]
    pub recursive: bool,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Location columns for tabular output
const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("name", "NAME", 32),
    ColumnDef::new("path", "PATH", 48),
    ColumnDef::new("items", "ITEMS", 7),
    ColumnDef::new("value", "VALUE", 14),
    ColumnDef::new("flags", "FLAGS", 12),
];

/// One location as listed, with rolled-up totals
#[derive(Debug, Serialize)]
struct LocationEntry<'a> {
    id: &'a str,
    name: &'a str,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<&'a str>,
    depth: usize,
    direct: LocationTotals,
    total: LocationTotals,
    cycle: bool,
    unreachable: bool,
}

/// A location record with its place in the hierarchy and its totals
#[derive(Debug, Serialize)]
struct LocationDetail<'a> {
    #[serde(flatten)]
    location: &'a Location,
    path: String,
    direct: LocationTotals,
    total: LocationTotals,
    cycle: bool,
}

/// Run a location subcommand
pub fn run(cmd: LocCommands, workspace: &Workspace, global: &GlobalOpts) -> Result<()> {
    match cmd {
        LocCommands::New(args) => run_new(args, workspace, global),
        LocCommands::List(args) => run_list(args, workspace, global),
        LocCommands::Show(args) => run_show(args, workspace, global),
        LocCommands::Edit(args) => run_edit(args, workspace),
        LocCommands::Rename(args) => run_rename(args, workspace, global),
        LocCommands::Mv(args) => run_move(args, workspace, global),
        LocCommands::Rm(args) => run_remove(args, workspace, global),
    }
}

fn run_new(args: NewArgs, workspace: &Workspace, global: &GlobalOpts) -> Result<()> {
    let snapshot = workspace.snapshot(global.quiet)?;
    let short_ids = workspace.short_ids();

    let name: String;
    let parent: Option<&Location>;
    let mut description = args.description.clone();

    if args.interactive || args.name.is_none() {
        use dialoguer::theme::ColorfulTheme;
        use dialoguer::{Input, Select};

        let theme = ColorfulTheme::default();
        name = Input::with_theme(&theme)
            .with_prompt("Location name")
            .interact_text()
            .into_diagnostic()?;

        let tree = LocationTree::build(&snapshot.locations);
        let rows = flatten(&tree, &FlattenOptions::all());
        let mut choices = vec!["(top level)".to_string()];
        choices.extend(rows.rows.iter().map(|r| {
            format!("{}{}", "  ".repeat(r.depth), r.node.name)
        }));

        let picked = Select::with_theme(&theme)
            .with_prompt("Parent location")
            .items(&choices)
            .default(0)
            .interact()
            .into_diagnostic()?;
        parent = picked.checked_sub(1).map(|i| rows.rows[i].node);

        let text: String = Input::with_theme(&theme)
            .with_prompt("Description (optional)")
            .allow_empty(true)
            .interact_text()
            .into_diagnostic()?;
        if !text.trim().is_empty() {
            description = Some(text);
        }
    } else {
        name = args
            .name
            .clone()
            .ok_or_else(|| miette::miette!("Name is required (use --name or -n)"))?;
        parent = match &args.parent {
            Some(reference) => Some(resolve_location(&snapshot, &short_ids, reference)?),
            None => None,
        };
    }

    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(miette::miette!("Location name must not be empty"));
    }

    let mut location = Location::new(
        name,
        parent.map(|p| p.id.to_string()),
        workspace.config.author(),
    );
    location.sort_order = args.order;
    location.description = description.filter(|d| !d.trim().is_empty());
    location.tags = args.tags.as_deref().map(split_list).unwrap_or_default();

    let file_path = workspace
        .store
        .create_location(&location)
        .map_err(|e| miette::miette!("{}", e))?;

    let mut short_ids = short_ids;
    let number = short_ids.add(&location.id);
    workspace.save_short_ids(&short_ids);

    if global.format == OutputFormat::Id {
        println!("{}", location.id);
    } else {
        println!(
            "{} Created location {}",
            style("✓").green(),
            style(format!("{}@{}", EntityPrefix::Loc, number)).cyan()
        );
        if !global.quiet {
            println!("   {}", style(workspace.project.relative(&file_path).display()).dim());
            let path = match parent {
                Some(p) => {
                    let tree = LocationTree::build(&snapshot.locations);
                    format!(
                        "{}{}{}",
                        location_path(&tree, Some(p.id.as_str())),
                        PATH_SEPARATOR,
                        location.name
                    )
                }
                None => location.name.clone(),
            };
            println!("   {}", style(path).white());
        }
    }

    if args.edit {
        println!("Opening in {}...", style(workspace.config.editor()).yellow());
        workspace.config.run_editor(&file_path).into_diagnostic()?;
    }

    Ok(())
}

fn run_list(args: ListArgs, workspace: &Workspace, global: &GlobalOpts) -> Result<()> {
    let snapshot = workspace.snapshot(global.quiet)?;
    let tree = LocationTree::build(&snapshot.locations);
    let policy = DepreciationPolicy::from_config(&workspace.config);
    let valuation = Valuation::compute(&snapshot, &policy, as_of(None));

    let needle = args.search.as_ref().map(|s| s.to_lowercase());
    let flattened = flatten(&tree, &FlattenOptions::all());

    let listed: Vec<_> = flattened
        .rows
        .iter()
        .filter(|row| !args.roots || (row.depth == 0 && !row.unreachable))
        .filter(|row| match &needle {
            Some(n) => {
                row.node.name.to_lowercase().contains(n)
                    || row
                        .node
                        .description
                        .as_ref()
                        .is_some_and(|d| d.to_lowercase().contains(n))
            }
            None => true,
        })
        .collect();

    let entries: Vec<LocationEntry> = listed
        .iter()
        .map(|row| {
            let id = row.node.id.as_str();
            LocationEntry {
                id,
                name: &row.node.name,
                path: location_path(&tree, Some(id)),
                parent: row.node.parent.as_deref(),
                depth: row.depth,
                direct: valuation.direct(id),
                total: valuation.aggregate(id),
                cycle: valuation.is_cycle_member(id),
                unreachable: row.unreachable,
            }
        })
        .collect();

    if args.count {
        println!("{}", entries.len());
        return Ok(());
    }

    let mut short_ids = workspace.short_ids();
    short_ids.rebuild(EntityPrefix::Loc, entries.iter().map(|e| e.id.to_string()));
    workspace.save_short_ids(&short_ids);

    let format = global
        .format
        .resolve(workspace.config.default_format.as_deref(), OutputFormat::Tsv);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&entries).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&entries).into_diagnostic()?);
        }
        _ => {
            if entries.is_empty() && format == OutputFormat::Tsv {
                println!("No locations found.");
                return Ok(());
            }
            let rows: Vec<TableRow> = entries
                .iter()
                .zip(listed.iter())
                .map(|(entry, row)| {
                    let mut flags = Vec::new();
                    if entry.cycle {
                        flags.push("cycle");
                    }
                    if entry.unreachable {
                        flags.push("unreachable");
                    }
                    let name = if format == OutputFormat::Tsv {
                        format!("{}{}", "  ".repeat(entry.depth), entry.name)
                    } else {
                        entry.name.to_string()
                    };
                    TableRow::new(&row.node.id, &short_ids)
                        .cell("name", CellValue::Text(name))
                        .cell("path", CellValue::Path(entry.path.clone()))
                        .cell("items", CellValue::Count(entry.total.item_count))
                        .cell("value", CellValue::Money(entry.total.value))
                        .cell("flags", CellValue::Text(flags.join(",")))
                })
                .collect();

            let formatter = TableFormatter::new(COLUMNS, "location", "LOC");
            let formatter = if global.quiet { formatter.without_summary() } else { formatter };
            formatter.output(&rows, format);
        }
    }

    Ok(())
}

fn run_show(args: ShowArgs, workspace: &Workspace, global: &GlobalOpts) -> Result<()> {
    let snapshot = workspace.snapshot(global.quiet)?;
    let short_ids = workspace.short_ids();
    let location = resolve_location(&snapshot, &short_ids, &args.reference)?;

    let tree = LocationTree::build(&snapshot.locations);
    let policy = DepreciationPolicy::from_config(&workspace.config);
    let valuation = Valuation::compute(&snapshot, &policy, as_of(None));
    let id = location.id.as_str();

    let format = global.format.resolve(None, OutputFormat::Auto);
    if matches!(format, OutputFormat::Yaml | OutputFormat::Json) {
        let detail = LocationDetail {
            location,
            path: location_path(&tree, Some(id)),
            direct: valuation.direct(id),
            total: valuation.aggregate(id),
            cycle: valuation.is_cycle_member(id),
        };
        if format == OutputFormat::Json {
            println!("{}", serde_json::to_string_pretty(&detail).into_diagnostic()?);
        } else {
            print!("{}", serde_yml::to_string(&detail).into_diagnostic()?);
        }
        return Ok(());
    }
    if format == OutputFormat::Id {
        println!("{}", location.id);
        return Ok(());
    }

    let currency = workspace.config.currency();

    println!("{}", style(&location.name).bold());
    println!("  {:<12} {}", style("ID").dim(), style(&location.id).cyan());
    println!("  {:<12} {}", style("Short").dim(), short_ids.format(&location.id));
    println!("  {:<12} {}", style("Path").dim(), location_path(&tree, Some(id)));
    if let Some(parent) = &location.parent {
        let label = tree
            .by_id(parent)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| format!("{} (missing)", parent));
        println!("  {:<12} {}", style("Parent").dim(), label);
    }
    if let Some(order) = location.sort_order {
        println!("  {:<12} {}", style("Order").dim(), order);
    }
    if let Some(description) = &location.description {
        println!("  {:<12} {}", style("Description").dim(), description);
    }
    if !location.tags.is_empty() {
        println!("  {:<12} {}", style("Tags").dim(), location.tags.join(", "));
    }
    if valuation.is_cycle_member(id) {
        println!(
            "  {} {}",
            style("⚠").yellow(),
            style("this location is part of a parent cycle; totals exclude the loop").yellow()
        );
    }

    let direct = valuation.direct(id);
    let total = valuation.aggregate(id);
    println!();
    println!("{}", style("Totals").bold());
    println!(
        "  {:<12} {} item(s), {} (now {})",
        style("Here").dim(),
        direct.item_count,
        format_money(currency, direct.value),
        format_money(currency, direct.depreciated_value)
    );
    println!(
        "  {:<12} {} item(s), {} (now {})",
        style("Including").dim(),
        total.item_count,
        format_money(currency, total.value),
        format_money(currency, total.depreciated_value)
    );

    let children: Vec<&Location> = tree
        .children_of(Some(id))
        .iter()
        .copied()
        .filter(|c| c.id != location.id)
        .collect();
    if !children.is_empty() {
        println!();
        println!("{}", style("Sub-locations").bold());
        for child in children {
            let child_total = valuation.aggregate(child.id.as_str());
            println!(
                "  {:<10} {:<28} {:>4} item(s)  {}",
                style(short_ids.format(&child.id)).cyan(),
                child.name,
                child_total.item_count,
                format_money(currency, child_total.value)
            );
        }
    }

    let items: Vec<_> = snapshot
        .items
        .iter()
        .filter(|i| i.location_id() == Some(id))
        .collect();
    if !items.is_empty() {
        println!();
        println!("{}", style("Items here").bold());
        for item in items {
            println!(
                "  {:<10} {:<28} {}",
                style(short_ids.format(&item.id)).cyan(),
                item.name,
                format_money(currency, valuation.item_value(item))
            );
        }
    }

    Ok(())
}

fn run_edit(args: RefArgs, workspace: &Workspace) -> Result<()> {
    let snapshot = workspace.snapshot(false)?;
    let short_ids = workspace.short_ids();
    let location = resolve_location(&snapshot, &short_ids, &args.reference)?;

    let (path, _) = workspace
        .store
        .find_location(&location.id)
        .map_err(|e| miette::miette!("{}", e))?
        .ok_or_else(|| miette::miette!("No file found for location '{}'", location.id))?;

    println!(
        "Opening {} in {}...",
        style(workspace.project.relative(&path).display()).cyan(),
        style(workspace.config.editor()).yellow()
    );
    workspace.config.run_editor(&path).into_diagnostic()?;
    Ok(())
}

fn run_rename(args: RenameArgs, workspace: &Workspace, global: &GlobalOpts) -> Result<()> {
    let snapshot = workspace.snapshot(global.quiet)?;
    let short_ids = workspace.short_ids();
    let location = resolve_location(&snapshot, &short_ids, &args.reference)?;

    let old_name = location.name.clone();
    let updated = mutation::rename_location(workspace.store.as_ref(), location, &args.name)
        .map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        println!(
            "{} Renamed {} {} {}",
            style("✓").green(),
            style(old_name).dim(),
            style("→").dim(),
            style(&updated.name).cyan()
        );
    }
    Ok(())
}

fn run_move(args: MoveArgs, workspace: &Workspace, global: &GlobalOpts) -> Result<()> {
    let snapshot = workspace.snapshot(global.quiet)?;
    let short_ids = workspace.short_ids();
    let location = resolve_location(&snapshot, &short_ids, &args.reference)?;

    let target = match (&args.parent, args.root) {
        (_, true) => None,
        (Some(reference), false) => Some(resolve_location(&snapshot, &short_ids, reference)?),
        (None, false) => return Err(miette::miette!("Use --parent <LOCATION> or --root")),
    };

    let updated = mutation::reparent_location(workspace.store.as_ref(), &snapshot, location, target)
        .map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        let destination = match target {
            Some(parent) => {
                let tree = LocationTree::build(&snapshot.locations);
                location_path(&tree, Some(parent.id.as_str()))
            }
            None => "(top level)".to_string(),
        };
        println!(
            "{} Moved {} {} {}",
            style("✓").green(),
            style(&updated.name).cyan(),
            style("→").dim(),
            style(destination).yellow()
        );
    }
    Ok(())
}

fn run_remove(args: RemoveArgs, workspace: &Workspace, global: &GlobalOpts) -> Result<()> {
    let snapshot = workspace.snapshot(global.quiet)?;
    let short_ids = workspace.short_ids();
    let location = resolve_location(&snapshot, &short_ids, &args.reference)?;

    if !args.yes {
        let prompt = if args.recursive {
            format!("Delete '{}' and everything below it?", location.name)
        } else {
            format!("Delete '{}'?", location.name)
        };
        let confirmed = dialoguer::Confirm::with_theme(&dialoguer::theme::ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let report =
        mutation::delete_location(workspace.store.as_ref(), &snapshot, location, args.recursive)
        .map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        println!(
            "{} Deleted {} location(s)",
            style("✓").green(),
            style(report.locations.len()).cyan()
        );
        if !report.unassigned_items.is_empty() {
            println!(
                "   {} item(s) are now unassigned",
                style(report.unassigned_items.len()).yellow()
            );
        }
    }
    Ok(())
}
