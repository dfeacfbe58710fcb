pub mod constants;
pub mod file;
pub mod score;

pub use file::{FileId, FileMetadata, ImportResult, ImportStatus, Permission, TagAction};
pub use score::Score;
