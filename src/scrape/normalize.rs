use chrono::NaiveDate;
use clap::ValueEnum;
use regex::Regex;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::jobs::types::{JobPosting, JobType, MAX_TAGS};
use crate::util::time::parse_date_text;

use super::types::RawCard;

static POSTED_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*posted\s*:?").expect("static regex"));

/// What to do with a card whose posted date cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DatePolicy {
    /// Use the processing date.
    #[default]
    FallbackToday,
    /// Drop the card, same as a blank title.
    Reject,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown date policy `{0}` (expected fallback-today or reject)")]
pub struct UnknownDatePolicy(String);

impl FromStr for DatePolicy {
    type Err = UnknownDatePolicy;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <DatePolicy as ValueEnum>::from_str(s, true).map_err(|_| UnknownDatePolicy(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NormalizeOptions {
    pub date_policy: DatePolicy,
    /// Processing date, used for relative dates and the fallback.
    pub today: NaiveDate,
}

/// Collapse whitespace runs to single spaces and trim.
pub fn clean_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Clean, drop empties, exact-string dedup (case kept), first-seen order, capped.
pub fn normalize_tags<'a, I>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(clean_text)
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .take(MAX_TAGS)
        .collect()
}

pub fn strip_posted_label(meta: &str) -> &str {
    match POSTED_LABEL.find(meta) {
        Some(m) => meta[m.end()..].trim(),
        None => meta.trim(),
    }
}

/// First match wins: intern, then part-time, then contract; otherwise full-time.
pub fn infer_job_type(text: &str) -> JobType {
    let t = clean_text(text).to_lowercase();
    if t.contains("intern") {
        JobType::Internship
    } else if t.contains("part-time") || t.contains("part time") {
        JobType::PartTime
    } else if t.contains("contract") {
        JobType::Contract
    } else {
        JobType::FullTime
    }
}

/// Map one raw card to a canonical posting. `None` means the card is dropped.
pub fn normalize(card: &RawCard, opts: &NormalizeOptions) -> Option<JobPosting> {
    let title = clean_text(&card.title);
    let company = clean_text(&card.company);
    if title.is_empty() || company.is_empty() {
        return None;
    }

    let posting_date = match parse_date_text(strip_posted_label(&card.meta), opts.today) {
        Some(d) => d,
        None => match opts.date_policy {
            DatePolicy::FallbackToday => opts.today,
            DatePolicy::Reject => return None,
        },
    };

    let mut type_text = card.meta.clone();
    for t in &card.tags {
        type_text.push(' ');
        type_text.push_str(t);
    }

    Some(JobPosting {
        title,
        company,
        location: clean_text(&card.location),
        posting_date,
        job_type: infer_job_type(&type_text),
        tags: normalize_tags(card.tags.iter().map(String::as_str)),
    })
}

/// Normalize a batch, keeping input order. Returns postings and the drop count.
pub fn normalize_all(cards: &[RawCard], opts: &NormalizeOptions) -> (Vec<JobPosting>, usize) {
    let kept: Vec<JobPosting> = cards.iter().filter_map(|c| normalize(c, opts)).collect();
    let dropped = cards.len() - kept.len();
    (kept, dropped)
}
