//! Score computation and score tag reconciliation.

use tracing::{debug, info};

use super::weights::WeightMapping;
use crate::api::{ApiError, MetadataQuery, TagService};
use crate::models::constants::{
    METADATA_BATCH_SIZE, TAG_REPO_NAME, TAG_SCORE_NAMESPACE, TAG_THIS_FILE_TAG,
};
use crate::models::{FileId, FileMetadata, Score, TagAction};

/// A candidate file with its new score and the score tag it carries now.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredFile {
    pub hash: String,
    pub old_score_tag: Option<String>,
    pub score: Score,
}

impl ScoredFile {
    pub fn new_score_tag(&self) -> String {
        self.score.to_tag()
    }
}

/// Ids of every file marked for scoring.
pub fn find_candidate_files(service: &dyn TagService) -> Result<Vec<FileId>, ApiError> {
    let ids = service.search_files_by_tag(TAG_THIS_FILE_TAG)?;
    debug!(count = ids.len(), "found files to score");
    Ok(ids)
}

/// Metadata for the given ids, requested in batches.
pub fn fetch_metadata(
    service: &dyn TagService,
    ids: &[FileId],
) -> Result<Vec<FileMetadata>, ApiError> {
    let mut metadata = Vec::with_capacity(ids.len());
    for batch in ids.chunks(METADATA_BATCH_SIZE) {
        metadata.extend(service.file_metadata(MetadataQuery::FileIds(batch))?);
    }
    Ok(metadata)
}

/// Mean weight of the tags that have one, or zero if none do.
pub fn score_one_file<S: AsRef<str>>(tags: &[S], weights: &WeightMapping) -> Score {
    let (sum, matched) = tags
        .iter()
        .filter_map(|tag| weights.get(tag.as_ref()))
        .fold((0i128, 0u32), |(sum, matched), weight| {
            (sum + i128::from(weight), matched + 1)
        });

    if matched == 0 {
        return Score::ZERO;
    }
    Score::new(sum as f64 / f64::from(matched))
}

/// First tag in the score namespace, i.e. the score applied by an earlier run.
pub fn extract_current_score_tag<S: AsRef<str>>(tags: &[S]) -> Option<&str> {
    tags.iter()
        .map(AsRef::<str>::as_ref)
        .find(|tag| {
            tag.strip_prefix(TAG_SCORE_NAMESPACE)
                .is_some_and(|rest| rest.starts_with(':'))
        })
}

/// Score every file and shift the batch so the lowest score is not negative.
///
/// Scores are only comparable within one batch.
pub fn score_all(files: &[FileMetadata], weights: &WeightMapping) -> Vec<ScoredFile> {
    let mut scored: Vec<ScoredFile> = files
        .iter()
        .map(|file| {
            let tags = file.all_known_tags();
            ScoredFile {
                hash: file.hash.clone(),
                old_score_tag: extract_current_score_tag(tags).map(str::to_string),
                score: score_one_file(tags, weights),
            }
        })
        .collect();

    normalize(&mut scored);
    scored
}

/// Add `abs(min)` to every score if the minimum is negative.
pub fn normalize(scored: &mut [ScoredFile]) {
    let lowest = scored
        .iter()
        .map(|file| file.score.value())
        .fold(f64::INFINITY, f64::min);

    if lowest < 0.0 {
        let offset = lowest.abs();
        debug!(offset, "shifting scores out of the negative");
        for file in scored.iter_mut() {
            file.score = file.score.shifted(offset);
        }
    }
}

/// Replace the old score tag of every file with its new one.
///
/// The delete is skipped for files that had no score tag. Mutations already
/// made stay in place if a later call fails.
pub fn apply_scores(service: &dyn TagService, scored: &[ScoredFile]) -> Result<(), ApiError> {
    for file in scored {
        if let Some(old) = &file.old_score_tag {
            service.mutate_tags(
                &file.hash,
                TAG_REPO_NAME,
                TagAction::Delete,
                std::slice::from_ref(old),
            )?;
        }
        let new_tag = file.new_score_tag();
        service.mutate_tags(
            &file.hash,
            TAG_REPO_NAME,
            TagAction::Add,
            std::slice::from_ref(&new_tag),
        )?;
        debug!(hash = %file.hash, tag = %new_tag, "applied score");
    }
    info!(count = scored.len(), "applied scores");
    Ok(())
}
