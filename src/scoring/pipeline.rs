//! One scoring run, from the data file check to the applied score tags.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use super::data_file::{
    ensure_data_file_present, load_weight_mapping, DataFileState, ImportFailure, LoadError,
};
use super::engine::{apply_scores, fetch_metadata, find_candidate_files, score_all, ScoredFile};
use crate::api::TagService;
use crate::models::Score;
use crate::validation::ScoreTagError;

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Absolute path of the local data file copy
    pub data_file_path: PathBuf,
    /// Compute scores without touching any tags
    pub dry_run: bool,
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    Scored(ScoreReport),
    /// Nothing to score; not an error.
    Empty(EmptyState),
    /// A precondition the user has to fix by hand.
    Fatal(FatalReason),
}

#[derive(Debug, PartialEq, Eq)]
pub enum EmptyState {
    NoCandidates,
    MalformedDefinitions(Vec<ScoreTagError>),
    NoWeights,
}

#[derive(Debug, PartialEq, Eq)]
pub enum FatalReason {
    DataFileImport(ImportFailure),
}

#[derive(Debug)]
pub struct ScoreReport {
    pub data_file: DataFileState,
    pub files: Vec<ScoredFile>,
    /// False for dry runs
    pub applied: bool,
}

impl ScoreReport {
    pub fn lowest(&self) -> Option<Score> {
        self.files.iter().map(|f| f.score).reduce(|a, b| if b < a { b } else { a })
    }

    pub fn highest(&self) -> Option<Score> {
        self.files.iter().map(|f| f.score).reduce(|a, b| if b > a { b } else { a })
    }
}

/// Run the scoring steps in order, stopping at the first unmet precondition.
pub fn run(service: &dyn TagService, options: &RunOptions) -> Result<RunOutcome> {
    let data_file = match ensure_data_file_present(service, &options.data_file_path)
        .context("Failed to check for the data file")?
    {
        Ok(state) => state,
        Err(failure) => return Ok(RunOutcome::Fatal(FatalReason::DataFileImport(failure))),
    };

    let candidates =
        find_candidate_files(service).context("Failed to search for files to score")?;
    if candidates.is_empty() {
        return Ok(RunOutcome::Empty(EmptyState::NoCandidates));
    }

    let weights = match load_weight_mapping(service) {
        Ok(weights) => weights,
        Err(LoadError::Malformed(malformed)) => {
            return Ok(RunOutcome::Empty(EmptyState::MalformedDefinitions(malformed)))
        }
        Err(e) => return Err(e).context("Failed to load tag scores from the data file"),
    };
    if weights.is_empty() {
        return Ok(RunOutcome::Empty(EmptyState::NoWeights));
    }

    let metadata =
        fetch_metadata(service, &candidates).context("Failed to fetch file metadata")?;
    let files = score_all(&metadata, &weights);

    if options.dry_run {
        info!(count = files.len(), "dry run, leaving tags untouched");
    } else {
        apply_scores(service, &files).context("Failed to apply score tags")?;
    }

    Ok(RunOutcome::Scored(ScoreReport {
        data_file,
        files,
        applied: !options.dry_run,
    }))
}
