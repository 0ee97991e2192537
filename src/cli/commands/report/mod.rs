//! `pinv report` command - Valuation and warranty reports

mod valuation;
mod warranty;

use clap::Subcommand;
use miette::Result;

use crate::cli::{GlobalOpts, Workspace};

pub use valuation::ValuationArgs;
pub use warranty::WarrantyArgs;

#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Per-location item counts, purchase values and current values
    #[clap(alias = "value")]
    Valuation(ValuationArgs),

    /// Items whose warranty has expired or expires soon
    Warranty(WarrantyArgs),
}

pub fn run(cmd: ReportCommands, workspace: &Workspace, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ReportCommands::Valuation(args) => valuation::run(args, workspace, global),
        ReportCommands::Warranty(args) => warranty::run(args, workspace, global),
    }
}

fn parse_date_arg(text: &str) -> Result<chrono::NaiveDate, String> {
    crate::cli::helpers::parse_date(text).map_err(|e| e.to_string())
}
