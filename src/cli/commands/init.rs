//! `pinv init` command - Initialize a new inventory project

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::cli::GlobalOpts;
use crate::core::project::{Project, ProjectError};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Reinitialize even if .pinv/ already exists; records are kept, the
    /// project config is rewritten
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        if !global.quiet {
            println!(
                "{} Created directory {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
        }
    }

    let project = if args.force {
        Project::init_force(&path)
    } else {
        Project::init(&path)
    };

    match project {
        Ok(project) => {
            println!(
                "{} Initialized inventory at {}",
                style("✓").green(),
                style(project.root().display()).cyan()
            );
            if global.quiet {
                return Ok(());
            }
            println!();
            println!("Created project structure:");
            print_structure(project.root());
            println!();
            println!("Next steps:");
            println!(
                "  {} Create a top-level location",
                style("pinv loc new --name House").yellow()
            );
            println!(
                "  {} Add an item to it",
                style("pinv item new --name Sofa --location House").yellow()
            );
            println!(
                "  {} Show the hierarchy",
                style("pinv tree").yellow()
            );
            Ok(())
        }
        Err(ProjectError::AlreadyExists(path)) => Err(miette::miette!(
            help = "use `pinv init --force` to reinitialize",
            "Inventory already exists at {}",
            path.display()
        )),
        Err(e) => Err(miette::miette!("{}", e)),
    }
}

fn print_structure(root: &Path) {
    let entries = [".pinv/", ".pinv/config.yaml", "locations/", "items/"];

    for entry in entries {
        if root.join(entry).exists() {
            let marker = if entry.ends_with('/') { "dir " } else { "file" };
            println!("  {} {}", style(marker).dim(), style(entry).dim());
        }
    }
}
