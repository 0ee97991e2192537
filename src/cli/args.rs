//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs,
    config::ConfigCommands,
    export::ExportArgs,
    init::InitArgs,
    item::ItemCommands,
    loc::LocCommands,
    report::ReportCommands,
    search::SearchArgs,
    status::StatusArgs,
    tree::TreeArgs,
    validate::ValidateArgs,
};

#[derive(Parser)]
#[command(name = "pinv")]
#[command(author, version, about = "Plain-text property inventory")]
#[command(long_about = "Track the locations of a property and the items stored in them as plain YAML files under version control.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose (debug) logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .pinv/)
    #[arg(long, global = true, env = "PINV_PROJECT")]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new inventory project
    Init(InitArgs),

    /// Location management (buildings, rooms, shelves, ...)
    #[command(subcommand)]
    Loc(LocCommands),

    /// Item management
    #[command(subcommand)]
    Item(ItemCommands),

    /// Show the location hierarchy with rolled-up totals
    Tree(TreeArgs),

    /// Search locations and items
    Search(SearchArgs),

    /// Generate valuation and warranty reports
    #[command(subcommand)]
    Report(ReportCommands),

    /// Export items or locations as CSV
    Export(ExportArgs),

    /// Validate record files and the hierarchy
    Validate(ValidateArgs),

    /// Show inventory status dashboard
    Status(StatusArgs),

    /// View and modify configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (yaml for show, tsv for list)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}

impl OutputFormat {
    /// Replace `Auto` with the configured default, then with `fallback`
    pub fn resolve(self, configured: Option<&str>, fallback: OutputFormat) -> OutputFormat {
        if self != OutputFormat::Auto {
            return self;
        }
        configured
            .and_then(|name| OutputFormat::from_str(name, true).ok())
            .filter(|f| *f != OutputFormat::Auto)
            .unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_format_resolution() {
        assert_eq!(
            OutputFormat::Json.resolve(Some("yaml"), OutputFormat::Tsv),
            OutputFormat::Json
        );
        assert_eq!(
            OutputFormat::Auto.resolve(Some("csv"), OutputFormat::Tsv),
            OutputFormat::Csv
        );
        assert_eq!(
            OutputFormat::Auto.resolve(Some("nonsense"), OutputFormat::Tsv),
            OutputFormat::Tsv
        );
        assert_eq!(OutputFormat::Auto.resolve(None, OutputFormat::Yaml), OutputFormat::Yaml);
    }
}
