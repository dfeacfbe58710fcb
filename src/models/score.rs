use std::fmt;

use super::constants::TAG_SCORE_NAMESPACE;

/// Largest magnitude for which an integral score is printed through `i64`.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Score of a file: the mean weight of its matched tags, possibly shifted.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Score(f64);

impl Score {
    pub const ZERO: Score = Score(0.0);

    pub fn new(value: f64) -> Self {
        Score(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Shift by `offset`, used to lift a batch out of negative territory.
    pub fn shifted(self, offset: f64) -> Self {
        Score(self.0 + offset)
    }

    /// The score tag applied to a scored file, e.g. `tagscore tag score:3`.
    pub fn to_tag(self) -> String {
        format!("{TAG_SCORE_NAMESPACE}:{self}")
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.0;
        if value.fract() == 0.0 && value.abs() <= MAX_EXACT_INTEGER {
            // Also folds -0.0 into 0
            write!(f, "{}", value as i64)
        } else {
            write!(f, "{value}")
        }
    }
}
