//! `pinv export` command - CSV export of items or locations
//!
//! Item rows carry the breadcrumb path of their location, location rows
//! carry their rolled-up totals, so the export is usable without the tree.

use clap::ValueEnum;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::analytics::{DepreciationPolicy, Valuation, WarrantyStatus};
use crate::cli::helpers::{as_of, location_path, parse_date, write_output};
use crate::cli::{GlobalOpts, Workspace};
use crate::core::Snapshot;
use crate::engine::{flatten, FlattenOptions, LocationTree};

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// What to export
    #[arg(value_enum)]
    pub what: ExportKind,

    /// Output to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Current values and warranty status as of this date (YYYY-MM-DD, default today)
    #[arg(long, value_parser = parse_date_arg)]
    pub as_of: Option<chrono::NaiveDate>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportKind {
    Items,
    Locations,
}

fn parse_date_arg(text: &str) -> Result<chrono::NaiveDate, String> {
    parse_date(text).map_err(|e| e.to_string())
}

pub fn run(args: ExportArgs, workspace: &Workspace, global: &GlobalOpts) -> Result<()> {
    let snapshot = workspace.snapshot(global.quiet)?;
    let policy = DepreciationPolicy::from_config(&workspace.config);
    let valuation = Valuation::compute(&snapshot, &policy, as_of(args.as_of));

    let bytes = match args.what {
        ExportKind::Items => {
            items_csv(&snapshot, &valuation, workspace.config.warranty_warning_days())?
        }
        ExportKind::Locations => locations_csv(&snapshot, &valuation)?,
    };
    let content = String::from_utf8(bytes).into_diagnostic()?;
    tracing::debug!(kind = ?args.what, bytes = content.len(), "exported csv");

    write_output(&content, args.output.as_deref())
}

fn money(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_default()
}

fn date(value: Option<chrono::NaiveDate>) -> String {
    value.map(|d| d.to_string()).unwrap_or_default()
}

/// One row per item, in snapshot order
fn items_csv(snapshot: &Snapshot, valuation: &Valuation, warning_days: i64) -> Result<Vec<u8>> {
    let tree = LocationTree::build(&snapshot.locations);
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "id",
            "name",
            "location_id",
            "location_path",
            "category",
            "brand",
            "model",
            "serial_number",
            "value",
            "current_value",
            "purchase_date",
            "warranty_expires",
            "warranty_status",
            "tags",
        ])
        .into_diagnostic()?;

    for item in &snapshot.items {
        let status = WarrantyStatus::classify(item.warranty_expires, valuation.as_of, warning_days);
        writer
            .write_record([
                item.id.to_string(),
                item.name.clone(),
                item.location.clone().unwrap_or_default(),
                location_path(&tree, item.location_id()),
                item.category.clone().unwrap_or_default(),
                item.brand.clone().unwrap_or_default(),
                item.model.clone().unwrap_or_default(),
                item.serial_number.clone().unwrap_or_default(),
                money(item.value),
                money(Some(valuation.item_value(item))),
                date(item.purchase_date),
                date(item.warranty_expires),
                status.label().to_string(),
                item.tags.join(","),
            ])
            .into_diagnostic()?;
    }

    writer.into_inner().map_err(|e| miette::miette!("{}", e))
}

/// One row per location in hierarchy order, unreachable ones last
fn locations_csv(snapshot: &Snapshot, valuation: &Valuation) -> Result<Vec<u8>> {
    let tree = LocationTree::build(&snapshot.locations);
    let flattened = flatten(&tree, &FlattenOptions::all());

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "id",
            "name",
            "parent_id",
            "path",
            "depth",
            "direct_items",
            "total_items",
            "total_value",
            "total_current_value",
            "cycle",
            "unreachable",
        ])
        .into_diagnostic()?;

    for row in &flattened.rows {
        let id = row.node.id.as_str();
        let direct = valuation.direct(id);
        let total = valuation.aggregate(id);
        writer
            .write_record([
                id.to_string(),
                row.node.name.clone(),
                row.node.parent.clone().unwrap_or_default(),
                location_path(&tree, Some(id)),
                row.depth.to_string(),
                direct.item_count.to_string(),
                total.item_count.to_string(),
                format!("{:.2}", total.value),
                format!("{:.2}", total.depreciated_value),
                valuation.is_cycle_member(id).to_string(),
                row.unreachable.to_string(),
            ])
            .into_diagnostic()?;
    }

    writer.into_inner().map_err(|e| miette::miette!("{}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Item, Location};
    use chrono::NaiveDate;

    fn fixture() -> Snapshot {
        let house = Location::new("House".into(), None, "t".into());
        let kitchen = Location::new("Kitchen".into(), Some(house.id.to_string()), "t".into());
        let mut kettle =
            Item::new("Kettle, electric".into(), Some(kitchen.id.to_string()), "t".into());
        kettle.value = Some(40.0);
        kettle.depreciated_value = Some(25.0);
        let mut rug = Item::new("Rug".into(), None, "t".into());
        rug.value = Some(100.0);
        rug.depreciated_value = Some(100.0);

        Snapshot {
            locations: vec![house, kitchen],
            items: vec![kettle, rug],
            issues: Vec::new(),
        }
    }

    fn read(bytes: Vec<u8>) -> Vec<csv::StringRecord> {
        csv::Reader::from_reader(bytes.as_slice())
            .records()
            .map(|r| r.unwrap())
            .collect()
    }

    #[test]
    fn test_items_csv_has_paths_and_quotes_commas() {
        let snapshot = fixture();
        let as_of = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let valuation = Valuation::compute(&snapshot, &DepreciationPolicy::default(), as_of);

        let rows = read(items_csv(&snapshot, &valuation, 30).unwrap());
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "Kettle, electric");
        assert_eq!(&rows[0][3], "House / Kitchen");
        assert_eq!(&rows[0][8], "40.00");
        assert_eq!(&rows[0][9], "25.00");
        assert_eq!(&rows[1][3], "(unassigned)");
        assert_eq!(&rows[1][12], "none");
    }

    #[test]
    fn test_locations_csv_rolls_up() {
        let snapshot = fixture();
        let as_of = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let valuation = Valuation::compute(&snapshot, &DepreciationPolicy::default(), as_of);

        let rows = read(locations_csv(&snapshot, &valuation).unwrap());
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "House");
        assert_eq!(&rows[0][5], "0");
        assert_eq!(&rows[0][6], "1");
        assert_eq!(&rows[0][7], "40.00");
        assert_eq!(&rows[1][3], "House / Kitchen");
        assert_eq!(&rows[1][4], "1");
    }
}
