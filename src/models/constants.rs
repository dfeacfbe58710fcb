//! Fixed strings and identifiers shared with the hydrus client.
//!
//! These form the on-service protocol: changing any of them orphans the tags
//! written by earlier runs.

/// Marker tag that opts a file into scoring.
pub const TAG_THIS_FILE_TAG: &str = "tagscore meta:score me";

/// Marker tag carried by the data file.
pub const DATA_FILE_UNIQUE_TAG: &str = "tagscore meta:data file";

/// Namespace of both score definition tags and applied score tags.
pub const TAG_SCORE_NAMESPACE: &str = "tagscore tag score";

/// Local tag service that holds the data file tags and receives score tags.
pub const TAG_REPO_NAME: &str = "my tags";

/// Combined tag service the client exposes over every tag repository.
pub const ALL_KNOWN_TAGS_SERVICE: &str = "all known tags";

/// Tag status key for tags that are currently applied.
pub const CURRENT_TAG_STATUS: &str = "0";

/// SHA-256 of the bundled data file.
pub const DATA_FILE_HASH: &str = "90fe21b9b91523620ed32feeb6608087f3190393a613774c22b3f381b21431b2";

/// Name under which the client API permission request is registered.
pub const API_CLIENT_NAME: &str = "tagscore";

/// Number of file ids per metadata request.
pub const METADATA_BATCH_SIZE: usize = 256;
