//! Tag weights, file scores, and the run that ties them together.

pub mod data_file;
pub mod engine;
pub mod pipeline;
pub mod weights;


pub use data_file::{ensure_data_file_present, load_weight_mapping, locate_data_file};
pub use engine::{
    apply_scores, extract_current_score_tag, find_candidate_files, score_all, score_one_file,
    ScoredFile,
};
pub use pipeline::{run, EmptyState, FatalReason, RunOptions, RunOutcome, ScoreReport};
pub use weights::WeightMapping;
