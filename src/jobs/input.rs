use serde::Deserialize;

use crate::scrape::normalize::{clean_text, normalize_tags};
use crate::util::time::parse_iso8601_date;

use super::types::{FieldError, JobPosting, JobType, ListQuery, SortKey, MAX_LIMIT, MAX_PAGE};

/// Raw list parameters as they arrive on the query string.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub job_type: Option<String>,
    pub location: Option<String>,
    pub tag: Option<String>,
    pub tags: Option<String>,
    pub q: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

// empty strings behave as if the parameter was absent
fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',').map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect()
}

impl ListParams {
    pub fn validate(&self) -> Result<ListQuery, Vec<FieldError>> {
        let mut errors = Vec::new();
        let mut q = ListQuery::default();

        if let Some(jt) = present(&self.job_type) {
            match jt.parse::<JobType>() {
                Ok(t) => q.job_type = Some(t),
                Err(_) => errors.push(FieldError::new("job_type", "Invalid job_type")),
            }
        }
        q.location = present(&self.location).map(str::to_string);
        q.q = present(&self.q).map(str::to_string);

        // `tags` (all required) wins over a single `tag`
        let many = present(&self.tags).map(split_csv).unwrap_or_default();
        q.tags = if !many.is_empty() {
            many
        } else {
            present(&self.tag).map(|t| vec![t.to_string()]).unwrap_or_default()
        };

        if let Some(s) = present(&self.sort) {
            q.sort = SortKey::parse_lenient(s);
        }
        if let Some(p) = present(&self.page) {
            match p.parse::<i64>() {
                Ok(n) if (1..=MAX_PAGE).contains(&n) => q.page = n,
                _ => errors.push(FieldError::new("page", format!("page must be 1-{}", MAX_PAGE))),
            }
        }
        if let Some(l) = present(&self.limit) {
            match l.parse::<i64>() {
                Ok(n) if (1..=MAX_LIMIT).contains(&n) => q.limit = n,
                _ => errors.push(FieldError::new("limit", format!("limit must be 1-{}", MAX_LIMIT))),
            }
        }

        if errors.is_empty() { Ok(q) } else { Err(errors) }
    }
}

/// Tags may be sent as a JSON array or a comma-separated string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    Csv(String),
}

impl TagsInput {
    fn into_tags(self) -> Vec<String> {
        match self {
            TagsInput::List(v) => normalize_tags(v.iter().map(String::as_str)),
            TagsInput::Csv(s) => normalize_tags(split_csv(&s).iter().map(String::as_str)),
        }
    }
}

/// Body of create and update requests. For create every field but `tags` is required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobInput {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub posting_date: Option<String>,
    pub job_type: Option<String>,
    pub tags: Option<TagsInput>,
}

/// Validated partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobPatch {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub posting_date: Option<chrono::NaiveDate>,
    pub job_type: Option<JobType>,
    pub tags: Option<Vec<String>>,
}

impl JobPatch {
    pub fn apply_to(self, p: &mut JobPosting) {
        if let Some(v) = self.title { p.title = v; }
        if let Some(v) = self.company { p.company = v; }
        if let Some(v) = self.location { p.location = v; }
        if let Some(v) = self.posting_date { p.posting_date = v; }
        if let Some(v) = self.job_type { p.job_type = v; }
        if let Some(v) = self.tags { p.tags = v; }
    }
}

impl JobInput {
    pub fn validate_create(self) -> Result<JobPosting, Vec<FieldError>> {
        let mut errors = Vec::new();
        let required = [
            ("title", self.title.is_none(), "Title is required"),
            ("company", self.company.is_none(), "Company is required"),
            ("location", self.location.is_none(), "Location is required"),
            ("posting_date", self.posting_date.is_none(), "Posting date is required"),
            ("job_type", self.job_type.is_none(), "Job type is required"),
        ];
        for (path, missing, msg) in required {
            if missing { errors.push(FieldError::new(path, msg)); }
        }
        let patch = match self.validate_update() {
            Ok(p) => Some(p),
            Err(mut e) => {
                errors.append(&mut e);
                None
            }
        };
        match patch {
            Some(JobPatch {
                title: Some(title),
                company: Some(company),
                location: Some(location),
                posting_date: Some(posting_date),
                job_type: Some(job_type),
                tags,
            }) if errors.is_empty() => Ok(JobPosting { title, company, location, posting_date, job_type, tags: tags.unwrap_or_default() }),
            _ => Err(errors),
        }
    }

    pub fn validate_update(self) -> Result<JobPatch, Vec<FieldError>> {
        let mut errors = Vec::new();
        let mut patch = JobPatch::default();

        let mut text = |path: &str, v: Option<String>, label: &str| -> Option<String> {
            let cleaned = clean_text(&v?);
            if cleaned.is_empty() {
                errors.push(FieldError::new(path, format!("{} cannot be empty", label)));
                None
            } else {
                Some(cleaned)
            }
        };
        patch.title = text("title", self.title, "Title");
        patch.company = text("company", self.company, "Company");
        patch.location = text("location", self.location, "Location");

        if let Some(raw) = self.posting_date {
            match parse_iso8601_date(&raw) {
                Some(d) => patch.posting_date = Some(d),
                None => errors.push(FieldError::new("posting_date", "Posting date must be a valid date")),
            }
        }
        if let Some(raw) = self.job_type {
            match raw.parse::<JobType>() {
                Ok(t) => patch.job_type = Some(t),
                Err(e) => errors.push(FieldError::new("job_type", e.to_string())),
            }
        }
        patch.tags = self.tags.map(TagsInput::into_tags);

        if errors.is_empty() { Ok(patch) } else { Err(errors) }
    }
}
