use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use sqlx::PgPool;

use crate::telemetry::{self};
use crate::telemetry::ops::jobs::Phase as JobsPhase;

pub mod db;
pub mod input;
pub mod store;
pub mod types;

use types::{JobType, ListQuery, SortKey, MAX_PAGE};

/// jobs ls/show/rm
#[derive(Args)]
pub struct JobsCmd {
    #[command(subcommand)]
    pub cmd: JobsSub,
}

#[derive(Subcommand)]
pub enum JobsSub {
    /// List postings with optional filters
    Ls {
        #[arg(long, value_enum)]
        job_type: Option<JobType>,
        /// Case-insensitive substring
        #[arg(long)]
        location: Option<String>,
        /// Single tag; ignored when --tags is given
        #[arg(long)]
        tag: Option<String>,
        /// Comma-separated; every tag must be present
        #[arg(long)]
        tags: Option<String>,
        /// Matches title or company
        #[arg(long)]
        q: Option<String>,
        #[arg(long, value_enum, default_value_t = SortKey::PostingDateDesc)]
        sort: SortKey,
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(i64).range(1..=MAX_PAGE))]
        page: i64,
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(i64).range(1..=100))]
        limit: i64,
    },
    /// Show one posting
    Show { id: i64 },
    /// Delete one posting (plan-only by default; use --apply to delete)
    Rm {
        id: i64,
        #[arg(long, default_value_t = false)]
        apply: bool,
    },
}

#[derive(Serialize)]
struct DeletePlan { action: &'static str, id: i64, title: String, company: String }

#[derive(Serialize)]
struct DeleteResult { deleted: bool, id: i64 }

pub async fn run(pool: &PgPool, args: JobsCmd) -> Result<()> {
    match args.cmd {
        JobsSub::Ls { job_type, location, tag, tags, q, sort, page, limit } => {
            let mut tags = tags.as_deref().map(input::split_csv).unwrap_or_default();
            if tags.is_empty() {
                tags.extend(tag);
            }
            let query = ListQuery {
                job_type,
                location,
                tags,
                q,
                sort,
                page,
                limit,
            };
            ls_jobs(pool, query).await?
        }
        JobsSub::Show { id } => show_job(pool, id).await?,
        JobsSub::Rm { id, apply } => rm_job(pool, id, apply).await?,
    }
    Ok(())
}

async fn ls_jobs(pool: &PgPool, query: ListQuery) -> Result<()> {
    let log = telemetry::jobs();
    let _g = log.root_span_kv([
        ("job_type", format!("{:?}", query.job_type)),
        ("location", format!("{:?}", query.location)),
        ("tags", query.tags.join(",")),
        ("q", format!("{:?}", query.q)),
        ("page", query.page.to_string()),
        ("limit", query.limit.to_string()),
    ]).entered();
    let _s = log.span(&JobsPhase::List).entered();

    let page = db::list_jobs(pool, &query).await?;
    log.info(format!("💼 Jobs — page {}/{} total={}", page.page, page.total_pages, page.total));
    for r in &page.data {
        let p = &r.posting;
        log.info(format!(
            "[{}] {} | {} | {} | {} | {} | tags={:?}",
            r.id, p.posting_date, p.title, p.company, p.location, p.job_type, p.tags
        ));
    }
    if telemetry::config::json_mode() {
        log.result(&page)?;
    }
    Ok(())
}

async fn show_job(pool: &PgPool, id: i64) -> Result<()> {
    let log = telemetry::jobs();
    let _g = log.root_span_kv([("id", id.to_string())]).entered();
    let _s = log.span(&JobsPhase::Show).entered();

    let Some(rec) = db::get_job(pool, id).await? else { bail!("Job not found: {}", id) };
    let p = &rec.posting;
    log.info(format!("💼 Job {}", rec.id));
    log.info(format!("  Title:    {}", p.title));
    log.info(format!("  Company:  {}", p.company));
    log.info(format!("  Location: {}", p.location));
    log.info(format!("  Posted:   {}", p.posting_date));
    log.info(format!("  Type:     {}", p.job_type));
    log.info(format!("  Tags:     {}", p.tags.join(", ")));
    log.info(format!("  Updated:  {}", rec.updated_at));
    if telemetry::config::json_mode() {
        log.result(&rec)?;
    }
    Ok(())
}

async fn rm_job(pool: &PgPool, id: i64, apply: bool) -> Result<()> {
    let log = telemetry::jobs();
    let _g = log.root_span_kv([
        ("mode", if apply { "apply".to_string() } else { "plan".to_string() }),
        ("id", id.to_string()),
    ]).entered();

    let Some(rec) = db::get_job(pool, id).await? else { bail!("Job not found: {}", id) };

    if !apply {
        let _s = log.span(&JobsPhase::Plan).entered();
        log.info(format!("📝 Delete plan — [{}] {} @ {}", rec.id, rec.posting.title, rec.posting.company));
        log.info("   Use --apply to execute.");
        if telemetry::config::json_mode() {
            let plan = DeletePlan { action: "delete", id, title: rec.posting.title, company: rec.posting.company };
            log.plan(&plan)?;
        }
        return Ok(());
    }

    let _s = log.span(&JobsPhase::Delete).entered();
    let deleted = db::delete_job(pool, id).await?;
    if deleted { log.info("🗑️ Job deleted"); } else { log.warn("Job already gone"); }
    if telemetry::config::json_mode() {
        log.result(&DeleteResult { deleted, id })?;
    }
    Ok(())
}
