//! Search result records and their file classification

mod classify;
mod types;

pub use classify::{classify, Classification, FileKind};
pub use types::SearchResult;
