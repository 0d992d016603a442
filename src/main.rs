// src/main.rs — designloop entry point

use clap::Parser;

use designloop::cli::{Cli, Commands};
use designloop::infra::config::Config;
use designloop::infra::logger;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Respects DESIGNLOOP_LOG / RUST_LOG
    logger::init_logging(if cli.verbose { "info" } else { "warn" });

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Subcommands that need neither config nor provider
    match &cli.command {
        Some(Commands::Brief { output }) => {
            return designloop::cli::run::run_brief(output.as_deref());
        }
        Some(Commands::Render { state }) => {
            return designloop::cli::export::run_render(state);
        }
        None => {}
    }

    // Load config (falls back to defaults if no config.toml)
    let config = if let Some(ref path) = cli.config {
        Config::load_from(std::path::Path::new(path))?
    } else {
        Config::load()?
    };

    designloop::cli::run::run_exploration(&cli, &config).await
}
