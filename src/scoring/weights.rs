use std::collections::HashMap;
use tracing::warn;

use crate::models::constants::DATA_FILE_UNIQUE_TAG;
use crate::validation::{parse_score_definition, ScoreTagError};

/// Weight per tag, read from the score definition tags of the data file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeightMapping {
    weights: HashMap<String, i64>,
}

impl WeightMapping {
    /// Parse the data file's tags into a mapping.
    ///
    /// The data file marker is skipped. Every other tag must be a valid score
    /// definition; all malformed tags are returned together, in input order.
    /// When a key is defined twice the later definition wins.
    pub fn from_data_file_tags<S: AsRef<str>>(tags: &[S]) -> Result<Self, Vec<ScoreTagError>> {
        let mut weights = HashMap::new();
        let mut malformed = Vec::new();

        for tag in tags {
            let tag: &str = tag.as_ref();
            if tag == DATA_FILE_UNIQUE_TAG {
                continue;
            }
            match parse_score_definition(tag) {
                Ok(definition) => {
                    let previous = weights.insert(definition.key.clone(), definition.weight);
                    if let Some(previous) = previous {
                        warn!(
                            key = %definition.key,
                            previous,
                            weight = definition.weight,
                            "tag is scored more than once, using the last definition"
                        );
                    }
                }
                Err(e) => {
                    warn!("Found invalid tag score tag with reason: {e}");
                    malformed.push(e);
                }
            }
        }

        if malformed.is_empty() {
            Ok(Self { weights })
        } else {
            Err(malformed)
        }
    }

    pub fn get(&self, tag: &str) -> Option<i64> {
        self.weights.get(tag).copied()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, i64)> for WeightMapping {
    fn from_iter<I: IntoIterator<Item = (K, i64)>>(iter: I) -> Self {
        Self {
            weights: iter.into_iter().map(|(k, w)| (k.into(), w)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_tag_is_not_a_definition() {
        let weights = WeightMapping::from_data_file_tags(&[
            "tagscore meta:data file",
            "tagscore tag score:test:10",
            "tagscore tag score:rare:-4",
        ])
        .unwrap();

        assert_eq!(weights.len(), 2);
        assert_eq!(weights.get("test"), Some(10));
        assert_eq!(weights.get("rare"), Some(-4));
        assert_eq!(weights.get("tagscore meta:data file"), None);
    }

    #[test]
    fn test_only_marker_gives_empty_mapping() {
        let weights = WeightMapping::from_data_file_tags(&["tagscore meta:data file"]).unwrap();
        assert!(weights.is_empty());
    }

    #[test]
    fn test_every_malformed_tag_is_reported() {
        let malformed = WeightMapping::from_data_file_tags(&[
            "tagscore tag score:test:10",
            "tagscore tag score:test",
            "wrong:test:10",
            "tagscore tag score:test:ten",
        ])
        .unwrap_err();

        assert_eq!(
            malformed,
            vec![
                ScoreTagError::TooFewSegments("tagscore tag score:test".to_string()),
                ScoreTagError::WrongNamespace("wrong:test:10".to_string()),
                ScoreTagError::NotAnInteger("tagscore tag score:test:ten".to_string()),
            ]
        );
    }

    #[test]
    fn test_repeated_key_last_wins() {
        let weights = WeightMapping::from_data_file_tags(&[
            "tagscore tag score:test:10",
            "tagscore tag score:test:-2",
        ])
        .unwrap();

        assert_eq!(weights.len(), 1);
        assert_eq!(weights.get("test"), Some(-2));
    }

    #[test]
    fn test_namespaced_keys() {
        let weights = WeightMapping::from_data_file_tags(&[
            "tagscore tag score:character:queen elsa of arendelle:200",
        ])
        .unwrap();
        assert_eq!(weights.get("character:queen elsa of arendelle"), Some(200));
        assert_eq!(weights.get("queen elsa of arendelle"), None);
    }
}
