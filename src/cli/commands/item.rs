//! `pinv item` command - Item management

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::analytics::{DepreciationPolicy, Valuation, WarrantyStatus};
use crate::cli::commands::import;
use crate::cli::helpers::{
    as_of, format_money, location_path, parse_date, resolve_item, resolve_location, split_list,
};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat, Workspace};
use crate::core::identity::EntityPrefix;
use crate::core::mutation;
use crate::core::Snapshot;
use crate::engine::{flatten, FlattenOptions, LocationTree, Selection};
use crate::entities::{Item, Location};

#[derive(Subcommand, Debug)]
pub enum ItemCommands {
    /// Record a new item
    New(NewArgs),

    /// List items with optional filtering
    List(ListArgs),

    /// Show an item's details
    Show(RefArgs),

    /// Edit an item in your editor
    Edit(RefArgs),

    /// Move an item to another location, or unassign it
    Mv(MoveArgs),

    /// Delete an item
    Rm(RemoveArgs),

    /// Import items from a CSV file
    Import(import::ImportArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Item name (prompted for when missing)
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Location (ID, short ID, name or path)
    #[arg(long, short = 'l')]
    pub location: Option<String>,

    /// Purchase value
    #[arg(long)]
    pub value: Option<f64>,

    /// Category, e.g. electronics or furniture
    #[arg(long, short = 'c')]
    pub category: Option<String>,

    #[arg(long)]
    pub brand: Option<String>,

    #[arg(long)]
    pub model: Option<String>,

    /// Serial number
    #[arg(long)]
    pub serial: Option<String>,

    /// Purchase date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    pub purchased: Option<chrono::NaiveDate>,

    /// Warranty expiry date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    pub warranty: Option<chrono::NaiveDate>,

    /// Useful life in years for depreciation
    #[arg(long)]
    pub life: Option<f64>,

    /// Value at the end of the useful life
    #[arg(long)]
    pub salvage: Option<f64>,

    /// Comma-separated tags
    #[arg(long)]
    pub tags: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,

    /// Interactive mode (prompt for fields)
    #[arg(long, short = 'i')]
    pub interactive: bool,

    /// Open in editor after creation
    #[arg(long, short = 'e')]
    pub edit: bool,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only items stored in these locations or anywhere below them
    #[arg(long, short = 'l')]
    pub location: Vec<String>,

    /// Text matched against name, brand, model, serial, category, notes and tags
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Only items in this category (case-insensitive)
    #[arg(long, short = 'c')]
    pub category: Option<String>,

    /// Only items without a (valid) location
    #[arg(long, conflicts_with = "location")]
    pub unassigned: bool,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct RefArgs {
    /// Item ID, short ID (ITEM@N) or name
    pub reference: String,
}

#[derive(clap::Args, Debug)]
pub struct MoveArgs {
    /// Item to move
    pub reference: String,

    /// Destination location
    #[arg(long, short = 'l', conflicts_with = "unassign", required_unless_present = "unassign")]
    pub location: Option<String>,

    /// Remove the item from its location
    #[arg(long)]
    pub unassign: bool,
}

#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Item to delete
    pub reference: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

fn parse_date_arg(text: &str) -> Result<chrono::NaiveDate, String> {
    parse_date(text).map_err(|e| e.to_string())
}

/// Item columns for tabular output
const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("name", "NAME", 30),
    ColumnDef::new("location", "LOCATION", 40),
    ColumnDef::new("category", "CATEGORY", 14),
    ColumnDef::new("value", "VALUE", 12),
    ColumnDef::new("current", "CURRENT", 12),
    ColumnDef::new("warranty", "WARRANTY", 18),
];

#[derive(Debug, Serialize)]
struct ItemEntry<'a> {
    #[serde(flatten)]
    item: &'a Item,
    path: String,
    current_value: f64,
    warranty: WarrantyStatus,
}

/// Run an item subcommand
pub fn run(cmd: ItemCommands, workspace: &Workspace, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ItemCommands::New(args) => run_new(args, workspace, global),
        ItemCommands::List(args) => run_list(args, workspace, global),
        ItemCommands::Show(args) => run_show(args, workspace, global),
        ItemCommands::Edit(args) => run_edit(args, workspace),
        ItemCommands::Mv(args) => run_move(args, workspace, global),
        ItemCommands::Rm(args) => run_remove(args, workspace, global),
        ItemCommands::Import(args) => import::run(args, workspace, global),
    }
}

fn run_new(args: NewArgs, workspace: &Workspace, global: &GlobalOpts) -> Result<()> {
    let snapshot = workspace.snapshot(global.quiet)?;
    let short_ids = workspace.short_ids();

    let mut value = args.value;
    let mut category = args.category.clone();
    let name: String;
    let location: Option<&Location>;

    if args.interactive || args.name.is_none() {
        use dialoguer::theme::ColorfulTheme;
        use dialoguer::{Input, Select};

        let theme = ColorfulTheme::default();
        name = Input::with_theme(&theme)
            .with_prompt("Item name")
            .interact_text()
            .into_diagnostic()?;

        let tree = LocationTree::build(&snapshot.locations);
        let flattened = flatten(&tree, &FlattenOptions::all());
        let mut choices = vec!["(unassigned)".to_string()];
        choices.extend(
            flattened
                .rows
                .iter()
                .map(|r| location_path(&tree, Some(r.node.id.as_str()))),
        );
        let picked = Select::with_theme(&theme)
            .with_prompt("Location")
            .items(&choices)
            .default(0)
            .interact()
            .into_diagnostic()?;
        location = picked.checked_sub(1).map(|i| flattened.rows[i].node);

        let entered: String = Input::with_theme(&theme)
            .with_prompt("Value (optional)")
            .allow_empty(true)
            .validate_with(|input: &String| -> Result<(), String> {
                if input.trim().is_empty() || input.trim().parse::<f64>().is_ok() {
                    Ok(())
                } else {
                    Err("Enter a number".to_string())
                }
            })
            .interact_text()
            .into_diagnostic()?;
        if let Ok(v) = entered.trim().parse::<f64>() {
            value = Some(v);
        }

        let entered: String = Input::with_theme(&theme)
            .with_prompt("Category (optional)")
            .allow_empty(true)
            .interact_text()
            .into_diagnostic()?;
        if !entered.trim().is_empty() {
            category = Some(entered.trim().to_string());
        }
    } else {
        name = args
            .name
            .clone()
            .ok_or_else(|| miette::miette!("Name is required (use --name or -n)"))?;
        location = match &args.location {
            Some(reference) => Some(resolve_location(&snapshot, &short_ids, reference)?),
            None => None,
        };
    }

    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(miette::miette!("Item name must not be empty"));
    }
    if let Some(v) = value {
        if !v.is_finite() || v < 0.0 {
            return Err(miette::miette!("Value must be a non-negative number, got {}", v));
        }
    }

    let mut item = Item::new(
        name,
        location.map(|l| l.id.to_string()),
        workspace.config.author(),
    );
    item.value = value;
    item.category = category;
    item.brand = args.brand.clone();
    item.model = args.model.clone();
    item.serial_number = args.serial.clone();
    item.purchase_date = args.purchased;
    item.warranty_expires = args.warranty;
    item.useful_life_years = args.life;
    item.salvage_value = args.salvage;
    item.notes = args.notes.clone();
    item.tags = args.tags.as_deref().map(split_list).unwrap_or_default();

    let file_path = workspace
        .store
        .create_item(&item)
        .map_err(|e| miette::miette!("{}", e))?;

    let mut short_ids = short_ids;
    let number = short_ids.add(&item.id);
    workspace.save_short_ids(&short_ids);

    if global.format == OutputFormat::Id {
        println!("{}", item.id);
    } else {
        println!(
            "{} Created item {}",
            style("✓").green(),
            style(format!("{}@{}", EntityPrefix::Item, number)).cyan()
        );
        if !global.quiet {
            let tree = LocationTree::build(&snapshot.locations);
            println!("   {}", style(workspace.project.relative(&file_path).display()).dim());
            println!(
                "   {} {} {}",
                style(&item.name).white(),
                style("@").dim(),
                style(location_path(&tree, item.location_id())).yellow()
            );
        }
    }

    if args.edit {
        println!("Opening in {}...", style(workspace.config.editor()).yellow());
        workspace.config.run_editor(&file_path).into_diagnostic()?;
    }

    Ok(())
}

/// Items matching the list filters, in snapshot order
fn filter_items<'s>(
    args: &ListArgs,
    snapshot: &'s Snapshot,
    workspace: &Workspace,
) -> Result<Vec<&'s Item>> {
    let tree = LocationTree::build(&snapshot.locations);

    let mut items: Vec<&Item> = if args.location.is_empty() {
        snapshot.items.iter().collect()
    } else {
        let short_ids = workspace.short_ids();
        let mut selection = Selection::new();
        for reference in &args.location {
            let location = resolve_location(snapshot, &short_ids, reference)?;
            selection.toggle_branch(&tree, location.id.as_str(), true);
        }
        selection.filter_items(&snapshot.items, |i| i.location_id())
    };

    if args.unassigned {
        items.retain(|i| !i.location_id().is_some_and(|loc| tree.contains(loc)));
    }
    if let Some(category) = &args.category {
        items.retain(|i| {
            i.category
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(category))
        });
    }
    if let Some(needle) = &args.search {
        items.retain(|i| i.matches(needle));
    }

    Ok(items)
}

fn run_list(args: ListArgs, workspace: &Workspace, global: &GlobalOpts) -> Result<()> {
    let snapshot = workspace.snapshot(global.quiet)?;
    let items = filter_items(&args, &snapshot, workspace)?;

    if args.count {
        println!("{}", items.len());
        return Ok(());
    }

    let mut short_ids = workspace.short_ids();
    short_ids.rebuild(EntityPrefix::Item, items.iter().map(|i| i.id.to_string()));
    workspace.save_short_ids(&short_ids);

    let tree = LocationTree::build(&snapshot.locations);
    let policy = DepreciationPolicy::from_config(&workspace.config);
    let today = as_of(None);
    let valuation = Valuation::compute(&snapshot, &policy, today);
    let warning_days = workspace.config.warranty_warning_days();

    let format = global
        .format
        .resolve(workspace.config.default_format.as_deref(), OutputFormat::Tsv);

    match format {
        OutputFormat::Json | OutputFormat::Yaml => {
            let entries: Vec<ItemEntry> = items
                .iter()
                .map(|item| ItemEntry {
                    item,
                    path: location_path(&tree, item.location_id()),
                    current_value: valuation.item_value(item),
                    warranty: WarrantyStatus::classify(item.warranty_expires, today, warning_days),
                })
                .collect();
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&entries).into_diagnostic()?);
            } else {
                print!("{}", serde_yml::to_string(&entries).into_diagnostic()?);
            }
        }
        _ => {
            if items.is_empty() && format == OutputFormat::Tsv {
                println!("No items found.");
                return Ok(());
            }
            let rows: Vec<TableRow> = items
                .iter()
                .map(|item| {
                    TableRow::new(&item.id, &short_ids)
                        .cell("name", CellValue::Text(item.name.clone()))
                        .cell("location", CellValue::Path(location_path(&tree, item.location_id())))
                        .cell(
                            "category",
                            item.category
                                .clone()
                                .map(CellValue::Text)
                                .unwrap_or(CellValue::Empty),
                        )
                        .cell("value", CellValue::Money(item.value_or_zero()))
                        .cell("current", CellValue::Money(valuation.item_value(item)))
                        .cell(
                            "warranty",
                            CellValue::Warranty(WarrantyStatus::classify(
                                item.warranty_expires,
                                today,
                                warning_days,
                            )),
                        )
                })
                .collect();

            let formatter = TableFormatter::new(COLUMNS, "item", "ITEM");
            let formatter = if global.quiet { formatter.without_summary() } else { formatter };
            formatter.output(&rows, format);
        }
    }

    Ok(())
}

fn run_show(args: RefArgs, workspace: &Workspace, global: &GlobalOpts) -> Result<()> {
    let snapshot = workspace.snapshot(global.quiet)?;
    let short_ids = workspace.short_ids();
    let item = resolve_item(&snapshot, &short_ids, &args.reference)?;

    match global.format.resolve(None, OutputFormat::Auto) {
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(item).into_diagnostic()?);
            return Ok(());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(item).into_diagnostic()?);
            return Ok(());
        }
        OutputFormat::Id => {
            println!("{}", item.id);
            return Ok(());
        }
        _ => {}
    }

    let tree = LocationTree::build(&snapshot.locations);
    let policy = DepreciationPolicy::from_config(&workspace.config);
    let today = as_of(None);
    let currency = workspace.config.currency();
    let warranty = WarrantyStatus::classify(
        item.warranty_expires,
        today,
        workspace.config.warranty_warning_days(),
    );

    let field = |label: &str, value: Option<String>| {
        if let Some(value) = value {
            println!("  {:<14} {}", style(label).dim(), value);
        }
    };

    println!("{}", style(&item.name).bold());
    field("ID", Some(style(&item.id).cyan().to_string()));
    field("Short", Some(short_ids.format(&item.id)));
    field("Location", Some(location_path(&tree, item.location_id())));
    field("Category", item.category.clone());
    field("Brand", item.brand.clone());
    field("Model", item.model.clone());
    field("Serial", item.serial_number.clone());
    field("Value", item.value.map(|v| format_money(currency, v)));
    field(
        "Current value",
        item.value
            .map(|_| format_money(currency, policy.current_value(item, today))),
    );
    field("Purchased", item.purchase_date.map(|d| d.to_string()));
    field(
        "Useful life",
        item.value.map(|_| format!("{} years", policy.life_for(item))),
    );
    field(
        "Warranty",
        item.warranty_expires
            .map(|d| format!("{} ({})", d, warranty)),
    );
    if !item.tags.is_empty() {
        field("Tags", Some(item.tags.join(", ")));
    }
    for photo in &item.photos {
        field("Photo", Some(photo.clone()));
    }
    for (key, value) in &item.metadata {
        field(key, Some(value.clone()));
    }
    if let Some(notes) = &item.notes {
        println!();
        println!("{}", notes.trim_end());
    }

    Ok(())
}

fn run_edit(args: RefArgs, workspace: &Workspace) -> Result<()> {
    let snapshot = workspace.snapshot(false)?;
    let short_ids = workspace.short_ids();
    let item = resolve_item(&snapshot, &short_ids, &args.reference)?;

    let (path, _) = workspace
        .store
        .find_item(&item.id)
        .map_err(|e| miette::miette!("{}", e))?
        .ok_or_else(|| miette::miette!("No file found for item '{}'", item.id))?;

    println!(
        "Opening {} in {}...",
        style(workspace.project.relative(&path).display()).cyan(),
        style(workspace.config.editor()).yellow()
    );
    workspace.config.run_editor(&path).into_diagnostic()?;
    Ok(())
}

fn run_move(args: MoveArgs, workspace: &Workspace, global: &GlobalOpts) -> Result<()> {
    let snapshot = workspace.snapshot(global.quiet)?;
    let short_ids = workspace.short_ids();
    let item = resolve_item(&snapshot, &short_ids, &args.reference)?;

    let target = match (&args.location, args.unassign) {
        (_, true) => None,
        (Some(reference), false) => Some(resolve_location(&snapshot, &short_ids, reference)?),
        (None, false) => return Err(miette::miette!("Use --location <LOCATION> or --unassign")),
    };

    let updated = mutation::move_item(workspace.store.as_ref(), item, target)
        .map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        let tree = LocationTree::build(&snapshot.locations);
        println!(
            "{} Moved {} {} {}",
            style("✓").green(),
            style(&updated.name).cyan(),
            style("→").dim(),
            style(location_path(&tree, updated.location_id())).yellow()
        );
    }
    Ok(())
}

fn run_remove(args: RemoveArgs, workspace: &Workspace, global: &GlobalOpts) -> Result<()> {
    let snapshot = workspace.snapshot(global.quiet)?;
    let short_ids = workspace.short_ids();
    let item = resolve_item(&snapshot, &short_ids, &args.reference)?;

    if !args.yes {
        let confirmed = dialoguer::Confirm::with_theme(&dialoguer::theme::ColorfulTheme::default())
            .with_prompt(format!("Delete '{}'?", item.name))
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    workspace
        .store
        .delete_item(&item.id)
        .map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        println!("{} Deleted item {}", style("✓").green(), style(&item.name).cyan());
    }
    Ok(())
}
