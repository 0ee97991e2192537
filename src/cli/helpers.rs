//! Shared helper functions for CLI commands
//!
//! Reference resolution, formatting and output plumbing used by more than
//! one command module.

use chrono::NaiveDate;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::shortid::ShortIdIndex;
use crate::core::store::Snapshot;
use crate::engine::{breadcrumb, LocationTree};
use crate::entities::{Item, Location};

/// Separator between names in a location path
pub const PATH_SEPARATOR: &str = " / ";

/// Format an EntityId for display, truncating if too long
///
/// IDs longer than 16 characters are truncated to 13 chars with "..." suffix.
pub fn format_short_id(id: &EntityId) -> String {
    let s = id.to_string();
    if s.len() > 16 {
        format!("{}...", &s[..13])
    } else {
        s
    }
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Money with two decimals and thousands separators
pub fn format_money(currency: &str, amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!(
        "{}{}{}.{:02}",
        if negative { "-" } else { "" },
        currency,
        grouped,
        cents % 100
    )
}

/// Parse a `YYYY-MM-DD` date argument
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|e| miette::miette!("Invalid date '{}' (expected YYYY-MM-DD): {}", text, e))
}

/// The reference date for valuations: `--as-of` or today
pub fn as_of(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| chrono::Local::now().date_naive())
}

/// Resolve a location reference: `LOC@N`, `@N`, full or partial ID, name or name path
pub fn resolve_location<'s>(
    snapshot: &'s Snapshot,
    short_ids: &ShortIdIndex,
    reference: &str,
) -> Result<&'s Location> {
    let resolved = short_ids
        .resolve(reference, EntityPrefix::Loc)
        .ok_or_else(|| unknown_short_id(reference, EntityPrefix::Loc))?;
    snapshot
        .resolve_location(&resolved)
        .map_err(|e| miette::miette!("{}", e))
}

/// Resolve an item reference: `ITEM@N`, `@N`, full or partial ID or name
pub fn resolve_item<'s>(
    snapshot: &'s Snapshot,
    short_ids: &ShortIdIndex,
    reference: &str,
) -> Result<&'s Item> {
    let resolved = short_ids
        .resolve(reference, EntityPrefix::Item)
        .ok_or_else(|| unknown_short_id(reference, EntityPrefix::Item))?;
    snapshot
        .resolve_item(&resolved)
        .map_err(|e| miette::miette!("{}", e))
}

fn unknown_short_id(reference: &str, prefix: EntityPrefix) -> miette::Report {
    miette::miette!(
        "Unknown short ID '{}'. Run `pinv {} list` to refresh short IDs.",
        reference,
        match prefix {
            EntityPrefix::Loc => "loc",
            EntityPrefix::Item => "item",
        }
    )
}

/// Full name path of a location, or a placeholder for unknown IDs
pub fn location_path(tree: &LocationTree<'_, Location>, id: Option<&str>) -> String {
    match id {
        None => "(unassigned)".to_string(),
        Some(id) if !tree.contains(id) => format!("(missing {})", id),
        Some(id) => breadcrumb(tree, id, PATH_SEPARATOR),
    }
}

/// Write report text to a file, or to stdout
pub fn write_output(content: &str, output_path: Option<&Path>) -> Result<()> {
    match output_path {
        Some(path) => {
            let file = File::create(path).into_diagnostic()?;
            let mut writer = BufWriter::new(file);
            writer.write_all(content.as_bytes()).into_diagnostic()?;
            writer.flush().into_diagnostic()?;
            eprintln!("Written to: {}", path.display());
        }
        None => {
            print!("{}", content);
            std::io::stdout().flush().into_diagnostic()?;
        }
    }
    Ok(())
}

/// Split a comma-separated argument into trimmed, non-empty parts
pub fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_short_id() {
        let id = EntityId::new(EntityPrefix::Loc);
        let formatted = format_short_id(&id);
        assert!(formatted.len() <= 16);
        assert!(formatted.ends_with("..."));
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("crème brûlée", 8), "crème...");
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money("$", 0.0), "$0.00");
        assert_eq!(format_money("$", 1234.5), "$1,234.50");
        assert_eq!(format_money("€", 1_000_000.0), "€1,000,000.00");
        assert_eq!(format_money("$", -12.5), "-$12.50");
        assert_eq!(format_money("", 999.999), "1,000.00");
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_date("29/02/2024").is_err());
    }

    #[test]
    fn test_short_id_then_name_resolution() {
        let house = Location::new("House".into(), None, "t".into());
        let kitchen = Location::new("Kitchen".into(), Some(house.id.to_string()), "t".into());
        let snapshot = Snapshot {
            locations: vec![house.clone(), kitchen.clone()],
            ..Default::default()
        };

        let mut short_ids = ShortIdIndex::new();
        short_ids.rebuild(
            EntityPrefix::Loc,
            vec![house.id.to_string(), kitchen.id.to_string()],
        );

        assert_eq!(resolve_location(&snapshot, &short_ids, "@2").unwrap().id, kitchen.id);
        assert_eq!(resolve_location(&snapshot, &short_ids, "LOC@1").unwrap().id, house.id);
        assert_eq!(resolve_location(&snapshot, &short_ids, "kitchen").unwrap().id, kitchen.id);
        assert!(resolve_location(&snapshot, &short_ids, "@9").is_err());
    }

    #[test]
    fn test_location_path_placeholders() {
        let house = Location::new("House".into(), None, "t".into());
        let locations = vec![house.clone()];
        let tree = LocationTree::build(&locations);

        assert_eq!(location_path(&tree, Some(house.id.as_str())), "House");
        assert_eq!(location_path(&tree, None), "(unassigned)");
        assert!(location_path(&tree, Some("LOC-GONE")).starts_with("(missing"));
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(" a, b ,,c "), vec!["a", "b", "c"]);
        assert!(split_list("").is_empty());
    }
}
