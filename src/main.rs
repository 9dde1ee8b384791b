//! studybuddy - CLI entry point

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use studybuddy::cli::{commands, Args, Commands, Verbosity};
use studybuddy::repl::ChatSession;
use studybuddy::Config;

fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn run(args: Args) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;

    match args.command() {
        Commands::Build { lessons } => {
            commands::run_build(&config, lessons, args.verbosity()).await
        }
        Commands::Chat => {
            let tutor = commands::load_tutor(&config)?;
            ChatSession::new(tutor)?.run().await
        }
        Commands::Ask { question } => commands::run_ask(&config, &question.join(" ")).await,
        Commands::Config => commands::run_config(&config),
    }
}

#[tokio::main]
async fn main() {
    // .env may hold the API key; a missing file is fine
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_tracing(args.verbosity());

    if let Err(e) = run(args).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
