//! `pinv item import` - Import items from CSV files

use console::style;
use csv::{ReaderBuilder, StringRecord};
use miette::{IntoDiagnostic, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use crate::cli::helpers::{parse_date, resolve_location, split_list, truncate_str};
use crate::cli::{GlobalOpts, Workspace};
use crate::core::identity::EntityPrefix;
use crate::core::shortid::ShortIdIndex;
use crate::core::Snapshot;
use crate::entities::Item;

/// Recognised CSV columns; `name` is the only required one
pub const CSV_HEADERS: &[&str] = &[
    "name",
    "location",
    "category",
    "brand",
    "model",
    "serial_number",
    "value",
    "depreciated_value",
    "purchase_date",
    "useful_life_years",
    "salvage_value",
    "warranty_expires",
    "notes",
    "tags",
];

const CSV_EXAMPLE: &[&str] = &[
    "Sofa",
    "House/Living Room",
    "furniture",
    "Ikea",
    "Kivik",
    "",
    "899.00",
    "",
    "2022-03-14",
    "10",
    "50",
    "",
    "Grey cover",
    "\"living,large\"",
];

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// CSV file to import
    #[arg(required_unless_present = "template")]
    pub file: Option<PathBuf>,

    /// Print a CSV template with every recognised column and exit
    #[arg(long)]
    pub template: bool,

    /// Validate CSV without creating files
    #[arg(long)]
    pub dry_run: bool,

    /// Continue importing after errors (default: stop on first error)
    #[arg(long)]
    pub skip_errors: bool,

    /// Location used for rows without a location column value
    #[arg(long, short = 'l')]
    pub location: Option<String>,
}

/// Import statistics
#[derive(Debug, Default)]
pub struct ImportStats {
    pub rows_processed: usize,
    pub created: usize,
    pub errors: usize,
}

/// Header name (lowercase, trimmed) -> column index
fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_lowercase(), i))
        .collect()
}

/// Trimmed, non-empty field value
fn get_field(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    field: &str,
) -> Option<String> {
    header_map
        .get(field)
        .and_then(|&idx| record.get(idx))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_number(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    field: &str,
) -> Result<Option<f64>> {
    match get_field(record, header_map, field) {
        None => Ok(None),
        Some(text) => {
            let cleaned: String = text
                .chars()
                .filter(|c| !matches!(c, ',' | '$' | '€' | '£'))
                .collect();
            let number = cleaned
                .trim()
                .parse::<f64>()
                .map_err(|_| miette::miette!("'{}' is not a number in column '{}'", text, field))?;
            if !number.is_finite() || number < 0.0 {
                return Err(miette::miette!(
                    "'{}' must be a non-negative number in column '{}'",
                    text,
                    field
                ));
            }
            Ok(Some(number))
        }
    }
}

fn parse_date_field(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    field: &str,
) -> Result<Option<chrono::NaiveDate>> {
    get_field(record, header_map, field)
        .map(|text| parse_date(&text))
        .transpose()
}

/// Build an item from one CSV row
fn item_from_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    snapshot: &Snapshot,
    short_ids: &ShortIdIndex,
    default_location: Option<&str>,
    author: &str,
) -> Result<Item> {
    let name = get_field(record, header_map, "name")
        .ok_or_else(|| miette::miette!("Missing required field 'name'"))?;

    let reference =
        get_field(record, header_map, "location").or(default_location.map(String::from));
    let location = match reference {
        Some(reference) => Some(resolve_location(snapshot, short_ids, &reference)?.id.to_string()),
        None => None,
    };

    let mut item = Item::new(name, location, author.to_string());
    item.category = get_field(record, header_map, "category");
    item.brand = get_field(record, header_map, "brand");
    item.model = get_field(record, header_map, "model");
    item.serial_number = get_field(record, header_map, "serial_number");
    item.value = parse_number(record, header_map, "value")?;
    item.depreciated_value = parse_number(record, header_map, "depreciated_value")?;
    item.purchase_date = parse_date_field(record, header_map, "purchase_date")?;
    item.useful_life_years = parse_number(record, header_map, "useful_life_years")?;
    item.salvage_value = parse_number(record, header_map, "salvage_value")?;
    item.warranty_expires = parse_date_field(record, header_map, "warranty_expires")?;
    item.notes = get_field(record, header_map, "notes");
    item.tags = get_field(record, header_map, "tags")
        .as_deref()
        .map(split_list)
        .unwrap_or_default();

    // Columns we do not model are kept rather than dropped
    for (header, &idx) in header_map {
        if CSV_HEADERS.contains(&header.as_str()) || header.is_empty() {
            continue;
        }
        if let Some(value) = record.get(idx).map(str::trim).filter(|v| !v.is_empty()) {
            item.metadata.insert(header.clone(), value.to_string());
        }
    }

    Ok(item)
}

/// Print the CSV template to stdout
fn print_template() {
    println!("{}", CSV_HEADERS.join(","));
    println!("{}", CSV_EXAMPLE.join(","));

    eprintln!();
    eprintln!(
        "{} Template generated. Redirect to file: pinv item import --template > items.csv",
        style("→").blue()
    );
}

pub fn run(args: ImportArgs, workspace: &Workspace, global: &GlobalOpts) -> Result<()> {
    if args.template {
        print_template();
        return Ok(());
    }

    let file_path = args
        .file
        .clone()
        .ok_or_else(|| miette::miette!("CSV file required. Usage: pinv item import items.csv"))?;
    if !file_path.exists() {
        return Err(miette::miette!("File not found: {}", file_path.display()));
    }

    if !global.quiet {
        println!(
            "{} Importing items from {}{}",
            style("→").blue(),
            style(file_path.display()).yellow(),
            if args.dry_run {
                style(" (dry run)").dim().to_string()
            } else {
                String::new()
            }
        );
        println!();
    }

    let stats = import_items(&args, &file_path, workspace)?;

    if !global.quiet {
        println!();
        println!("{}", style("─".repeat(50)).dim());
        println!("{}", style("Import Summary").bold());
        println!("{}", style("─".repeat(50)).dim());
        println!("  Rows processed: {}", style(stats.rows_processed).cyan());
        println!("  Items created:  {}", style(stats.created).green());
        if stats.errors > 0 {
            println!("  Errors:         {}", style(stats.errors).red());
        }
        if args.dry_run {
            println!();
            println!("{}", style("Dry run complete. No files were created.").yellow());
        }
    }

    if stats.errors > 0 && !args.skip_errors {
        return Err(miette::miette!("Import completed with {} error(s)", stats.errors));
    }
    Ok(())
}

fn import_items(
    args: &ImportArgs,
    file_path: &PathBuf,
    workspace: &Workspace,
) -> Result<ImportStats> {
    let mut stats = ImportStats::default();
    let snapshot = workspace.snapshot(true)?;
    let mut short_ids = workspace.short_ids();
    let author = workspace.config.author();

    let file = File::open(file_path).into_diagnostic()?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let headers = rdr.headers().into_diagnostic()?.clone();
    let header_map = build_header_map(&headers);
    if !header_map.contains_key("name") {
        return Err(miette::miette!(
            "CSV has no 'name' column. Run `pinv item import --template` for the expected layout."
        ));
    }

    for (row_idx, result) in rdr.records().enumerate() {
        // Row 1 is the header
        let row_num = row_idx + 2;
        stats.rows_processed += 1;

        let built = result
            .map_err(|e| miette::miette!("CSV parse error: {}", e))
            .and_then(|record| {
                item_from_row(
                    &record,
                    &header_map,
                    &snapshot,
                    &short_ids,
                    args.location.as_deref(),
                    &author,
                )
            });

        let item = match built {
            Ok(item) => item,
            Err(e) => {
                eprintln!("{} Row {}: {}", style("✗").red(), row_num, e);
                stats.errors += 1;
                if !args.skip_errors {
                    return Err(miette::miette!("Import stopped at row {}: {}", row_num, e));
                }
                continue;
            }
        };

        if args.dry_run {
            println!(
                "{} Row {}: Would create {}",
                style("○").dim(),
                row_num,
                truncate_str(&item.name, 40)
            );
            stats.created += 1;
            continue;
        }

        workspace
            .store
            .create_item(&item)
            .map_err(|e| miette::miette!("Row {}: {}", row_num, e))?;
        let number = short_ids.add(&item.id);
        tracing::debug!(id = %item.id, row = row_num, "imported item");
        println!(
            "{} Row {}: Created {} - {}",
            style("✓").green(),
            row_num,
            style(format!("{}@{}", EntityPrefix::Item, number)).cyan(),
            truncate_str(&item.name, 40)
        );
        stats.created += 1;
    }

    if !args.dry_run {
        workspace.save_short_ids(&short_ids);
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Location;

    fn record(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    #[test]
    fn test_row_with_path_location_and_extra_column() {
        let house = Location::new("House".into(), None, "t".into());
        let attic = Location::new("Attic".into(), Some(house.id.to_string()), "t".into());
        let snapshot = Snapshot {
            locations: vec![house, attic.clone()],
            ..Default::default()
        };
        let headers = build_header_map(&record(&["Name", "Location", "Value", "Tags", "Color"]));
        let row = record(&["Trunk", "House / Attic", "$1,200.50", "old, wood", "brown"]);

        let item =
            item_from_row(&row, &headers, &snapshot, &ShortIdIndex::new(), None, "me").unwrap();
        assert_eq!(item.name, "Trunk");
        assert_eq!(item.location.as_deref(), Some(attic.id.as_str()));
        assert_eq!(item.value, Some(1200.5));
        assert_eq!(item.tags, vec!["old", "wood"]);
        assert_eq!(item.metadata.get("color").map(String::as_str), Some("brown"));
    }

    #[test]
    fn test_row_errors() {
        let snapshot = Snapshot::default();
        let headers = build_header_map(&record(&["name", "location", "value", "purchase_date"]));
        let short_ids = ShortIdIndex::new();

        let missing_name = record(&["", "", "", ""]);
        assert!(item_from_row(&missing_name, &headers, &snapshot, &short_ids, None, "me").is_err());

        let bad_value = record(&["Lamp", "", "cheap", ""]);
        assert!(item_from_row(&bad_value, &headers, &snapshot, &short_ids, None, "me").is_err());

        let bad_date = record(&["Lamp", "", "", "last week"]);
        assert!(item_from_row(&bad_date, &headers, &snapshot, &short_ids, None, "me").is_err());

        let unknown_location = record(&["Lamp", "Nowhere", "", ""]);
        let result = item_from_row(&unknown_location, &headers, &snapshot, &short_ids, None, "me");
        assert!(result.is_err());

        let unassigned = record(&["Lamp", "", "", ""]);
        let item = item_from_row(&unassigned, &headers, &snapshot, &short_ids, None, "me").unwrap();
        assert!(item.is_unassigned());
    }
}
