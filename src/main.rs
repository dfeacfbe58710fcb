use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tagscore::commands::{help, score};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tagscore")]
#[command(about = "Take scores for tags, give scores to files", long_about = None)]
#[command(version)]
struct Cli {
    /// Settings file (default: tagscore.toml in the working directory, if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Compute and print scores without changing any tags
    #[arg(long)]
    dry_run: bool,

    /// Explain how to set up the data file and tag scores, then exit
    #[arg(long)]
    scoring_help: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "tagscore=debug" } else { "tagscore=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.scoring_help {
        help::print_scoring_help();
        return ExitCode::SUCCESS;
    }

    match score::execute(cli.config, cli.dry_run) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
