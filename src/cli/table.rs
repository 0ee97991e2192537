//! Table formatting for list commands
//!
//! Every listing builds [`TableRow`]s of typed [`CellValue`]s and hands them
//! to a [`TableFormatter`], which renders aligned TSV, CSV or Markdown.

use chrono::NaiveDate;
use console::style;

use crate::analytics::WarrantyStatus;
use crate::cli::helpers::truncate_str;
use crate::cli::OutputFormat;
use crate::core::identity::EntityId;
use crate::core::shortid::ShortIdIndex;

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Plain text, truncated to the column width
    Text(String),
    /// Location name path
    Path(String),
    /// Whole number, right-aligned
    Count(u64),
    /// Money amount, right-aligned with two decimals
    Money(f64),
    /// Optional calendar date
    Date(Option<NaiveDate>),
    /// Warranty status with color coding
    Warranty(WarrantyStatus),
    /// Tags as comma-separated text
    Tags(Vec<String>),
    /// Placeholder
    Empty,
}

impl CellValue {
    /// Format for TSV output (with colors if terminal)
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Text(s) | CellValue::Path(s) => {
                let truncated = truncate_str(s, width);
                let styled = match self {
                    CellValue::Path(_) => style(truncated).dim(),
                    _ => style(truncated),
                };
                pad(styled.to_string(), width)
            }
            CellValue::Count(n) => format!("{:>width$}", n, width = width),
            CellValue::Money(v) => format!("{:>width$.2}", v, width = width),
            CellValue::Date(Some(d)) => format!("{:<width$}", d.format("%Y-%m-%d"), width = width),
            CellValue::Date(None) => format!("{:<width$}", "-", width = width),
            CellValue::Warranty(status) => {
                let text = truncate_str(&status.to_string(), width);
                let styled = match status {
                    WarrantyStatus::Expired { .. } => style(text).red(),
                    WarrantyStatus::ExpiringSoon { .. } => style(text).yellow().bold(),
                    WarrantyStatus::Active { .. } => style(text).green(),
                    WarrantyStatus::None => style(text).dim(),
                };
                pad(styled.to_string(), width)
            }
            CellValue::Tags(tags) => pad(truncate_str(&tags.join(", "), width), width),
            CellValue::Empty => format!("{:<width$}", "-", width = width),
        }
    }

    /// Raw text without styling, as used for CSV and Markdown
    pub fn raw(&self) -> String {
        match self {
            CellValue::Text(s) | CellValue::Path(s) => s.clone(),
            CellValue::Count(n) => n.to_string(),
            CellValue::Money(v) => format!("{:.2}", v),
            CellValue::Date(d) => d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
            CellValue::Warranty(WarrantyStatus::None) => String::new(),
            CellValue::Warranty(status) => status.to_string(),
            CellValue::Tags(tags) => tags.join(", "),
            CellValue::Empty => String::new(),
        }
    }

    /// Format for Markdown output (escaped pipes, "-" for empty)
    pub fn format_md(&self) -> String {
        let raw = self.raw();
        if raw.is_empty() {
            "-".to_string()
        } else {
            raw.replace('|', "\\|")
        }
    }

    /// Display width of the content, for column sizing
    pub fn display_width(&self) -> usize {
        match self {
            CellValue::Date(_) => 10,
            CellValue::Empty => 1,
            other => other.raw().chars().count().max(1),
        }
    }
}

/// Pad styled text to a visible width; ANSI codes take no columns
fn pad(text: String, width: usize) -> String {
    let visible = console::measure_text_width(&text);
    if visible >= width {
        text
    } else {
        format!("{}{}", text, " ".repeat(width - visible))
    }
}

/// Column definition with header label and maximum width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// A row of cell values for table output
pub struct TableRow {
    pub short_id: String,
    pub full_id: String,
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new(id: &EntityId, short_ids: &ShortIdIndex) -> Self {
        let short_id = short_ids
            .get_short_id(id.as_str())
            .map(|n| format!("{}@{}", id.prefix(), n))
            .unwrap_or_default();
        Self {
            short_id,
            full_id: id.to_string(),
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Renders rows in the requested format
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    entity_name: &'static str,
    entity_prefix: &'static str,
    show_summary: bool,
}

impl<'a> TableFormatter<'a> {
    pub fn new(
        columns: &'a [ColumnDef],
        entity_name: &'static str,
        entity_prefix: &'static str,
    ) -> Self {
        Self {
            columns,
            entity_name,
            entity_prefix,
            show_summary: true,
        }
    }

    /// Leave out the trailing "N found" line
    pub fn without_summary(mut self) -> Self {
        self.show_summary = false;
        self
    }

    /// Render rows; YAML and JSON are the caller's concern and fall back to TSV
    pub fn render(&self, rows: &[TableRow], format: OutputFormat) -> String {
        match format {
            OutputFormat::Csv => self.render_csv(rows),
            OutputFormat::Md => self.render_md(rows),
            OutputFormat::Id => rows.iter().map(|r| format!("{}\n", r.full_id)).collect(),
            _ => self.render_tsv(rows),
        }
    }

    pub fn output(&self, rows: &[TableRow], format: OutputFormat) {
        print!("{}", self.render(rows, format));
    }

    /// Column widths sized to content, capped at each column's maximum
    fn widths(&self, rows: &[TableRow]) -> Vec<usize> {
        let short_width = rows
            .iter()
            .map(|r| r.short_id.len())
            .max()
            .unwrap_or(0)
            .max("SHORT".len());

        std::iter::once(short_width)
            .chain(self.columns.iter().map(|col| {
                let content = rows
                    .iter()
                    .filter_map(|r| r.get(col.key))
                    .map(CellValue::display_width)
                    .max()
                    .unwrap_or(1);
                col.header.len().max(content).min(col.width.max(col.header.len()))
            }))
            .collect()
    }

    fn render_tsv(&self, rows: &[TableRow]) -> String {
        let widths = self.widths(rows);
        let mut out = String::new();

        let mut header = vec![pad(style("SHORT").bold().dim().to_string(), widths[0])];
        for (col, width) in self.columns.iter().zip(&widths[1..]) {
            header.push(pad(style(col.header).bold().to_string(), *width));
        }
        out.push_str(header.join(" ").trim_end());
        out.push('\n');

        let total: usize = widths.iter().sum::<usize>() + widths.len() - 1;
        out.push_str(&"-".repeat(total));
        out.push('\n');

        for row in rows {
            let mut parts = vec![pad(style(&row.short_id).cyan().to_string(), widths[0])];
            for (col, width) in self.columns.iter().zip(&widths[1..]) {
                parts.push(match row.get(col.key) {
                    Some(value) => value.format_tsv(*width),
                    None => CellValue::Empty.format_tsv(*width),
                });
            }
            out.push_str(parts.join(" ").trim_end());
            out.push('\n');
        }

        if self.show_summary {
            out.push('\n');
            out.push_str(&format!(
                "{} {}(s) found. Use {} to reference by short ID.\n",
                style(rows.len()).cyan(),
                self.entity_name,
                style(format!("{}@N", self.entity_prefix)).cyan()
            ));
        }
        out
    }

    fn render_csv(&self, rows: &[TableRow]) -> String {
        let mut writer = csv::Writer::from_writer(Vec::new());

        let mut headers = vec!["short_id", "id"];
        headers.extend(self.columns.iter().map(|c| c.key));
        let mut records = vec![headers.iter().map(|h| h.to_string()).collect::<Vec<_>>()];

        for row in rows {
            let mut values = vec![row.short_id.clone(), row.full_id.clone()];
            values.extend(
                self.columns
                    .iter()
                    .map(|col| row.get(col.key).map(CellValue::raw).unwrap_or_default()),
            );
            records.push(values);
        }

        for record in records {
            if let Err(e) = writer.write_record(&record) {
                tracing::warn!(error = %e, "failed to write CSV row");
            }
        }
        writer
            .into_inner()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    }

    fn render_md(&self, rows: &[TableRow]) -> String {
        let mut headers = vec!["Short", "ID"];
        headers.extend(self.columns.iter().map(|c| c.header));

        let mut out = format!("| {} |\n", headers.join(" | "));
        out.push_str(&format!("|{}|\n", vec!["---"; headers.len()].join("|")));

        for row in rows {
            let mut values = vec![
                if row.short_id.is_empty() { "-".to_string() } else { row.short_id.clone() },
                row.full_id.clone(),
            ];
            values.extend(
                self.columns
                    .iter()
                    .map(|col| {
                        row.get(col.key)
                            .map(CellValue::format_md)
                            .unwrap_or_else(|| "-".into())
                    }),
            );
            out.push_str(&format!("| {} |\n", values.join(" | ")));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::EntityPrefix;

    const COLUMNS: &[ColumnDef] = &[
        ColumnDef::new("name", "NAME", 20),
        ColumnDef::new("value", "VALUE", 12),
    ];

    fn row(short_ids: &ShortIdIndex, id: &EntityId, name: &str, value: f64) -> TableRow {
        TableRow::new(id, short_ids)
            .cell("name", CellValue::Text(name.to_string()))
            .cell("value", CellValue::Money(value))
    }

    #[test]
    fn test_cell_raw_and_md() {
        assert_eq!(CellValue::Money(3.5).raw(), "3.50");
        assert_eq!(CellValue::Count(7).raw(), "7");
        assert_eq!(CellValue::Date(None).format_md(), "-");
        assert_eq!(CellValue::Text("a|b".into()).format_md(), "a\\|b");
        assert_eq!(CellValue::Warranty(WarrantyStatus::None).raw(), "");
        assert_eq!(
            CellValue::Tags(vec!["x".into(), "y".into()]).raw(),
            "x, y"
        );
    }

    #[test]
    fn test_row_uses_short_id_when_assigned() {
        let id = EntityId::new(EntityPrefix::Item);
        let mut short_ids = ShortIdIndex::new();
        short_ids.rebuild(EntityPrefix::Item, vec![id.to_string()]);

        let r = row(&short_ids, &id, "Drill", 1.0);
        assert_eq!(r.short_id, "ITEM@1");
        assert!(r.get("name").is_some());
        assert!(r.get("missing").is_none());
    }

    #[test]
    fn test_csv_quotes_commas() {
        let id = EntityId::new(EntityPrefix::Item);
        let rows = vec![row(&ShortIdIndex::new(), &id, "Table, oak", 250.0)];
        let csv = TableFormatter::new(COLUMNS, "item", "ITEM").render(&rows, OutputFormat::Csv);

        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("short_id,id,name,value"));
        assert_eq!(
            lines.next().map(String::from),
            Some(format!(",{},\"Table, oak\",250.00", id))
        );
    }

    #[test]
    fn test_md_and_id_output() {
        let id = EntityId::new(EntityPrefix::Item);
        let rows = vec![row(&ShortIdIndex::new(), &id, "Lamp", 20.0)];
        let formatter = TableFormatter::new(COLUMNS, "item", "ITEM");

        let md = formatter.render(&rows, OutputFormat::Md);
        assert!(md.starts_with("| Short | ID | NAME | VALUE |"));
        assert!(md.contains("| - |"));

        let ids = formatter.render(&rows, OutputFormat::Id);
        assert_eq!(ids, format!("{}\n", id));
    }

    #[test]
    fn test_tsv_truncates_long_text() {
        let id = EntityId::new(EntityPrefix::Item);
        let rows = vec![row(
            &ShortIdIndex::new(),
            &id,
            "An extremely long item name that will not fit",
            1.0,
        )];
        let tsv = TableFormatter::new(COLUMNS, "item", "ITEM")
            .without_summary()
            .render(&rows, OutputFormat::Tsv);
        assert!(tsv.contains("An extremely long..."));
        assert!(!tsv.contains("will not fit"));
    }
}
