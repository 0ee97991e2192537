use clap::Parser;
use miette::Result;
use pinv::cli::commands::{
    completions, config, export, init, item, loc, report, search, status, tree, validate,
};
use pinv::cli::{Cli, Commands, GlobalOpts, Workspace};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Reset SIGPIPE so piping into `head` exits quietly instead of panicking
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_logging(&cli.global);
    let global = cli.global;

    let open = || Workspace::open(&global);

    match cli.command {
        Commands::Init(args) => init::run(args, &global),
        Commands::Config(cmd) => config::run(cmd, &global),
        Commands::Completions(args) => completions::run(args),
        Commands::Loc(cmd) => loc::run(cmd, &open()?, &global),
        Commands::Item(cmd) => item::run(cmd, &open()?, &global),
        Commands::Tree(args) => tree::run(args, &open()?, &global),
        Commands::Search(args) => search::run(args, &open()?, &global),
        Commands::Report(cmd) => report::run(cmd, &open()?, &global),
        Commands::Export(args) => export::run(args, &open()?, &global),
        Commands::Validate(args) => validate::run(args, &open()?, &global),
        Commands::Status(args) => status::run(args, &open()?, &global),
    }
}

/// Diagnostics go to stderr; `PINV_LOG` (or `RUST_LOG`) overrides the level
fn init_logging(global: &GlobalOpts) {
    let default_level = if global.verbose { "debug" } else { "warn" };
    let filter = std::env::var("PINV_LOG")
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
