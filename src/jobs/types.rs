use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MAX_TAGS: usize = 10;
/// Largest page number a list request may ask for.
pub const MAX_PAGE: i64 = 1_000_000;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
pub enum JobType {
    #[default]
    #[serde(rename = "Full-time")]
    #[value(name = "Full-time", alias = "full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    #[value(name = "Part-time", alias = "part-time")]
    PartTime,
    #[value(name = "Contract", alias = "contract")]
    Contract,
    #[value(name = "Internship", alias = "internship")]
    Internship,
}

impl JobType {
    pub const ALL: [JobType; 4] = [JobType::FullTime, JobType::PartTime, JobType::Contract, JobType::Internship];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "Full-time",
            JobType::PartTime => "Part-time",
            JobType::Contract => "Contract",
            JobType::Internship => "Internship",
        }
    }

    pub fn allowed_list() -> String {
        Self::ALL.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, thiserror::Error)]
#[error("job type must be one of: {}", JobType::allowed_list())]
pub struct UnknownJobType(pub String);

/// Exact match on the stored spelling.
impl FromStr for JobType {
    type Err = UnknownJobType;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownJobType(s.to_string()))
    }
}

/// Natural identity of a posting across repeated scrapes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DedupKey {
    pub title: String,
    pub company: String,
    pub posting_date: NaiveDate,
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {} ({})", self.title, self.company, self.posting_date)
    }
}

/// Canonical posting as produced by the normalizer and written by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobPosting {
    pub title: String,
    pub company: String,
    pub location: String,
    pub posting_date: NaiveDate,
    pub job_type: JobType,
    pub tags: Vec<String>,
}

impl JobPosting {
    pub fn key(&self) -> DedupKey {
        DedupKey {
            title: self.title.clone(),
            company: self.company.clone(),
            posting_date: self.posting_date,
        }
    }
}

/// Persisted row, addressed by surrogate id in the CRUD surface.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub id: i64,
    #[serde(flatten)]
    pub posting: JobPosting,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    PostingDateDesc,
    PostingDateAsc,
    TitleAsc,
    TitleDesc,
}

impl SortKey {
    /// Unknown values fall back to the default ordering.
    pub fn parse_lenient(s: &str) -> Self {
        match s {
            "posting_date_asc" => SortKey::PostingDateAsc,
            "title_asc" => SortKey::TitleAsc,
            "title_desc" => SortKey::TitleDesc,
            _ => SortKey::PostingDateDesc,
        }
    }

    // id breaks ties so pages are stable
    pub fn order_by(&self) -> &'static str {
        match self {
            SortKey::PostingDateDesc => "posting_date DESC, id DESC",
            SortKey::PostingDateAsc => "posting_date ASC, id ASC",
            SortKey::TitleAsc => "title ASC, id ASC",
            SortKey::TitleDesc => "title DESC, id DESC",
        }
    }
}

/// Validated list filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub job_type: Option<JobType>,
    pub location: Option<String>,
    pub tags: Vec<String>,
    pub q: Option<String>,
    pub sort: SortKey,
    pub page: i64,
    pub limit: i64,
}

impl Default for ListQuery {
    fn default() -> Self {
        ListQuery { job_type: None, location: None, tags: Vec::new(), q: None, sort: SortKey::default(), page: 1, limit: 10 }
    }
}

impl ListQuery {
    pub fn offset(&self) -> i64 { (self.page - 1).saturating_mul(self.limit) }
}

#[derive(Debug, Serialize)]
pub struct JobPage {
    pub data: Vec<JobRecord>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

impl JobPage {
    pub fn new(data: Vec<JobRecord>, q: &ListQuery, total: i64) -> Self {
        let total_pages = if q.limit > 0 { ((total + q.limit - 1) / q.limit).max(1) } else { 1 };
        JobPage { data, page: q.page, limit: q.limit, total, total_pages }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: &str, message: impl Into<String>) -> Self {
        FieldError { path: path.to_string(), message: message.into() }
    }
}
