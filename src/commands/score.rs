use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;

use super::help::print_scoring_help;
use crate::api::{open_session, SetupError};
use crate::config::Settings;
use crate::scoring::data_file::DataFileState;
use crate::scoring::{run, EmptyState, FatalReason, RunOptions, RunOutcome, ScoreReport};

/// Score every marked file in the client.
/// Usage: tagscore [--config <path>] [--dry-run]
pub fn execute(config_path: Option<PathBuf>, dry_run: bool) -> Result<ExitCode> {
    let settings = Settings::load(config_path.as_deref()).context("Failed to load settings")?;
    let data_file_path = settings.absolute_data_file_path()?;

    let client = match open_session(&settings) {
        Ok(client) => client,
        Err(e) => {
            print_setup_error(&e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let outcome = run(
        &client,
        &RunOptions {
            data_file_path,
            dry_run,
        },
    )?;
    Ok(report(&outcome))
}

/// Process exit status for a finished run: 1 only for fatal outcomes.
pub fn exit_status(outcome: &RunOutcome) -> u8 {
    match outcome {
        RunOutcome::Scored(_) | RunOutcome::Empty(_) => 0,
        RunOutcome::Fatal(_) => 1,
    }
}

/// Print what happened and pick the exit code.
pub fn report(outcome: &RunOutcome) -> ExitCode {
    match outcome {
        RunOutcome::Scored(report) => print_score_report(report),
        RunOutcome::Empty(state) => print_empty_state(state),
        RunOutcome::Fatal(FatalReason::DataFileImport(failure)) => {
            eprintln!("{}", failure.to_string().red());
        }
    }
    ExitCode::from(exit_status(outcome))
}

fn print_setup_error(error: &SetupError) {
    eprintln!("{} {error}", "Error:".red().bold());
    eprintln!("{}", error.remediation());
}

fn print_empty_state(state: &EmptyState) {
    match state {
        EmptyState::NoCandidates => {
            println!(
                "{}",
                "Detected no files to be scored. Please tag some files to be scored and try again."
                    .yellow()
            );
            print_scoring_help();
        }
        EmptyState::MalformedDefinitions(malformed) => {
            // Each tag was already logged with its reason while loading
            println!(
                "{} {}",
                format!("Found {} malformed score tags on the data file.", malformed.len())
                    .yellow()
                    .bold(),
                "Try removing or fixing these tags.".yellow()
            );
            for error in malformed {
                println!("  {}", error.tag().dimmed());
            }
        }
        EmptyState::NoWeights => {
            println!(
                "{}",
                "Did not find any tag scores. Please set up some tag scores and try again.".yellow()
            );
            print_scoring_help();
        }
    }
}

fn print_score_report(report: &ScoreReport) {
    if report.data_file == DataFileState::Imported {
        println!("{}", "Imported the tagscore data file.".dimmed());
    }

    if report.applied {
        println!("{}", "Scored files successfully!".green().bold());
    } else {
        println!("\n{}", "Dry run, no tags changed".bold().underline());
        println!();
        for file in &report.files {
            let old = file.old_score_tag.as_deref().unwrap_or("-");
            println!(
                "  {} {} -> {}",
                file.hash.cyan(),
                old.dimmed(),
                file.new_score_tag().green()
            );
        }
        println!();
    }

    println!("  {} {}", "Files:".bold(), report.files.len());
    if let (Some(lowest), Some(highest)) = (report.lowest(), report.highest()) {
        println!("  {} {lowest}", "Lowest score:".bold());
        println!("  {} {highest}", "Highest score:".bold());
    }
}
