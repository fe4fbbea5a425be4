use std::time::Duration;

use crate::jobs::types::DedupKey;

/// Failures that abort a scrape run. Malformed dates and incomplete cards are
/// absorbed by the normalizer and never show up here.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("page count must be at least 1")]
    InvalidPageCount,

    #[error("could not start scrape session: {0}")]
    SessionLaunch(String),

    #[error("could not close scrape session: {0}")]
    SessionClose(String),

    #[error("page {page}: `{selector}` not present after {waited:?}")]
    ExtractionTimeout { page: u32, selector: String, waited: Duration },

    #[error("page {page}: navigation to {url} failed: {reason}")]
    NavigationFailure { page: u32, url: String, reason: String },

    #[error("page {page}: response has no `{selector}` element")]
    ContentMissing { page: u32, selector: String },

    #[error("store write failed for {key} after {processed} upsert(s): {source}")]
    StoreWriteFailure {
        processed: usize,
        key: DedupKey,
        #[source]
        source: sqlx::Error,
    },
}

impl ScrapeError {
    /// Upserts committed before the run failed.
    pub fn processed(&self) -> usize {
        match self {
            ScrapeError::StoreWriteFailure { processed, .. } => *processed,
            _ => 0,
        }
    }
}
