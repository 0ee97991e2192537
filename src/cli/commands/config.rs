//! `pinv config` command - Configuration management

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::GlobalOpts;
use crate::core::config::{set_value, unset_value, CONFIG_KEYS};
use crate::core::project::Project;
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration values
    Show(ShowArgs),

    /// Set a configuration value
    Set(SetArgs),

    /// Unset (remove) a configuration value
    Unset(UnsetArgs),

    /// Show paths to configuration files
    Path,

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Configuration key (e.g., currency, category_life_years.tools)
    pub key: String,

    /// Value to set
    pub value: String,

    /// Set in global (user) config instead of project config
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct UnsetArgs {
    /// Configuration key to remove
    pub key: String,

    /// Remove from global (user) config instead of project config
    #[arg(long, short = 'g')]
    pub global: bool,
}

pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    // Config works outside a project too; only the project layer needs one
    let project = match &global.project {
        Some(path) => Project::at(path).ok(),
        None => Project::discover().ok(),
    };

    match cmd {
        ConfigCommands::Show(args) => run_show(args, project.as_ref()),
        ConfigCommands::Set(args) => run_set(args, project.as_ref()),
        ConfigCommands::Unset(args) => run_unset(args, project.as_ref()),
        ConfigCommands::Path => run_path(project.as_ref()),
        ConfigCommands::Keys => run_keys(),
    }
}

fn run_show(args: ShowArgs, project: Option<&Project>) -> Result<()> {
    let config = Config::load(project);

    if let Some(key) = &args.key {
        if !Config::is_known_key(key) {
            return Err(miette::miette!(
                "Unknown config key '{}'. Run 'pinv config keys' to list them.",
                key
            ));
        }
        return match config.get(key) {
            Some(value) => {
                println!("{}", value);
                Ok(())
            }
            None => Err(miette::miette!("Key '{}' is not set", key)),
        };
    }

    println!("{}", style("Effective Configuration").bold().underlined());
    println!();
    for (key, _) in CONFIG_KEYS.iter().filter(|(k, _)| !k.contains('<')) {
        match config.get(key) {
            Some(value) => println!("  {}: {}", style(key).cyan(), style(value).yellow()),
            None => println!("  {}: {}", style(key).cyan(), style("(not set)").dim()),
        }
    }
    for (category, years) in &config.category_life_years {
        println!(
            "  {}: {}",
            style(format!("category_life_years.{}", category)).cyan(),
            style(years).yellow()
        );
    }

    println!();
    println!("{}", style("Config Sources (in priority order):").dim());
    println!("  1. Environment variables (PINV_AUTHOR, PINV_EDITOR)");
    println!("  2. Project config (.pinv/config.yaml)");
    println!("  3. Global config (~/.config/pinv/config.yaml)");

    Ok(())
}

fn target_path(global: bool, project: Option<&Project>) -> Result<PathBuf> {
    if global {
        Config::global_config_path()
            .ok_or_else(|| miette::miette!("Could not determine global config directory"))
    } else {
        project
            .map(Config::project_config_path)
            .ok_or_else(|| miette::miette!("Not in a pinv project (use --global for user config)"))
    }
}

fn read_document(path: &Path) -> Result<serde_yml::Value> {
    if !path.exists() {
        return Ok(serde_yml::Value::Mapping(Default::default()));
    }
    let content = fs::read_to_string(path).into_diagnostic()?;
    let parsed: serde_yml::Value = serde_yml::from_str(&content).into_diagnostic()?;
    Ok(if parsed.is_null() {
        serde_yml::Value::Mapping(Default::default())
    } else {
        parsed
    })
}

fn write_document(path: &Path, document: &serde_yml::Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    let yaml = serde_yml::to_string(document).into_diagnostic()?;
    fs::write(path, yaml).into_diagnostic()
}

fn run_set(args: SetArgs, project: Option<&Project>) -> Result<()> {
    if !Config::is_known_key(&args.key) {
        return Err(miette::miette!(
            "Unknown config key '{}'. Run 'pinv config keys' to list them.",
            args.key
        ));
    }

    let path = target_path(args.global, project)?;
    let mut document = read_document(&path)?;
    set_value(&mut document, &args.key, &args.value);
    write_document(&path, &document)?;
    tracing::debug!(path = %path.display(), key = %args.key, "config updated");

    let scope = if args.global { "global" } else { "project" };
    println!(
        "{} Set {} {} {} in {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        style("→").dim(),
        style(&args.value).yellow(),
        scope
    );

    Ok(())
}

fn run_unset(args: UnsetArgs, project: Option<&Project>) -> Result<()> {
    let path = target_path(args.global, project)?;
    if !path.exists() {
        return Err(miette::miette!("Config file does not exist: {}", path.display()));
    }

    let mut document = read_document(&path)?;
    if !unset_value(&mut document, &args.key) {
        return Err(miette::miette!("Key '{}' not found in config", args.key));
    }
    write_document(&path, &document)?;

    let scope = if args.global { "global" } else { "project" };
    println!(
        "{} Removed {} from {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        scope
    );

    Ok(())
}

fn run_path(project: Option<&Project>) -> Result<()> {
    let exists = |path: &Path| {
        if path.exists() {
            style("(exists)").green()
        } else {
            style("(not created)").dim()
        }
    };

    println!("{}", style("Configuration file paths:").bold());
    println!();
    match Config::global_config_path() {
        Some(path) => println!(
            "  {} {} {}",
            style("Global:").cyan(),
            path.display(),
            exists(&path)
        ),
        None => println!("  {} {}", style("Global:").cyan(), style("(unavailable)").dim()),
    }
    match project {
        Some(project) => {
            let path = Config::project_config_path(project);
            println!("  {} {} {}", style("Project:").cyan(), path.display(), exists(&path));
        }
        None => println!(
            "  {} {}",
            style("Project:").cyan(),
            style("(not in a pinv project)").dim()
        ),
    }

    Ok(())
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();
    for (key, description) in CONFIG_KEYS {
        println!("  {:<32} {}", style(key).cyan(), style(description).dim());
    }
    println!();
    println!(
        "{}",
        style("Use 'pinv config set <key> <value>' to set a value.").dim()
    );
    Ok(())
}
