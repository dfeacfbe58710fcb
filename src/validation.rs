//! Grammar of score definition tags.
//!
//! A score definition is a tag on the data file of the form
//! `tagscore tag score:<key>:<weight>`. The key may itself contain colons,
//! so `tagscore tag score:character:queen elsa of arendelle:200` gives the
//! tag `character:queen elsa of arendelle` a weight of 200.

use std::num::IntErrorKind;

use thiserror::Error;

use crate::models::constants::TAG_SCORE_NAMESPACE;

/// Minimum number of colon-separated segments: namespace, key, weight.
pub const MIN_SEGMENTS: usize = 3;

/// Reason a score definition tag was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreTagError {
    #[error("Not enough data (did you forget the tag or the score?): '{0}'")]
    TooFewSegments(String),
    #[error("Wrong namespace: '{0}'")]
    WrongNamespace(String),
    #[error("Score is not an integer: '{0}'")]
    NotAnInteger(String),
    #[error("Score is out of range (must fit in a 64-bit integer): '{0}'")]
    OutOfRange(String),
}

impl ScoreTagError {
    /// The offending tag.
    pub fn tag(&self) -> &str {
        match self {
            ScoreTagError::TooFewSegments(tag)
            | ScoreTagError::WrongNamespace(tag)
            | ScoreTagError::NotAnInteger(tag)
            | ScoreTagError::OutOfRange(tag) => tag,
        }
    }
}

/// A parsed score definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreDefinition {
    /// The tag being weighted, bare or `namespace:tag`.
    pub key: String,
    pub weight: i64,
}

/// Parses a score definition tag into its key and weight.
///
/// # Arguments
///
/// * `tag` - The tag as stored on the data file
///
/// # Returns
///
/// * `Ok(ScoreDefinition)` if the tag follows the grammar
/// * `Err(ScoreTagError)` naming the first rule the tag breaks
///
/// # Examples
///
/// ```
/// use tagscore::validation::parse_score_definition;
///
/// let definition = parse_score_definition("tagscore tag score:series:frozen:-3").unwrap();
/// assert_eq!(definition.key, "series:frozen");
/// assert_eq!(definition.weight, -3);
/// assert!(parse_score_definition("tagscore tag score:frozen").is_err());
/// ```
pub fn parse_score_definition(tag: &str) -> Result<ScoreDefinition, ScoreTagError> {
    let segments: Vec<&str> = tag.split(':').collect();
    if segments.len() < MIN_SEGMENTS {
        return Err(ScoreTagError::TooFewSegments(tag.to_string()));
    }

    if segments[0] != TAG_SCORE_NAMESPACE {
        return Err(ScoreTagError::WrongNamespace(tag.to_string()));
    }

    let last = segments.len() - 1;
    let weight = parse_weight(segments[last], tag)?;

    Ok(ScoreDefinition {
        key: segments[1..last].join(":"),
        weight,
    })
}

/// Weight segment as a signed integer; surrounding whitespace is ignored.
fn parse_weight(segment: &str, tag: &str) -> Result<i64, ScoreTagError> {
    let segment = segment.trim();
    match segment.parse::<i64>() {
        Ok(weight) => Ok(weight),
        Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
            Err(ScoreTagError::OutOfRange(tag.to_string()))
        }
        Err(_) => Err(ScoreTagError::NotAnInteger(tag.to_string())),
    }
}

/// Validates a score definition tag without keeping the parsed value.
pub fn validate_score_definition(tag: &str) -> Result<(), ScoreTagError> {
    parse_score_definition(tag).map(|_| ())
}

pub fn is_valid_score_definition(tag: &str) -> bool {
    validate_score_definition(tag).is_ok()
}
