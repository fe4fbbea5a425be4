use serde::Serialize;

use crate::jobs::types::JobPosting;

/// Unprocessed card text as pulled from one listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawCard {
    pub title: String,
    pub company: String,
    pub location: String,
    pub meta: String,
    pub tags: Vec<String>,
}

// Plan envelope: scraped + normalized, nothing written
#[derive(Serialize)]
pub struct ScrapePlan {
    pub pages: u32,
    pub engine: &'static str,
    pub site: String,
    pub postings: Vec<JobPosting>,
}

// Apply/result envelope
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// inserted + replaced
    pub count: usize,
    pub inserted: usize,
    pub replaced: usize,
    /// replaced with identical fields
    pub unchanged: usize,
}
