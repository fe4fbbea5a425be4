use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use sqlx::PgPool;
use std::time::Duration;
use tracing::Instrument;

use crate::config::AppConfig;
use crate::jobs::store::{PgStore, PostingStore};
use crate::jobs::types::JobPosting;
use crate::telemetry::{self};
use crate::telemetry::ops::scrape::Phase as ScrapePhase;

pub mod error;
pub mod normalize;
pub mod reconcile;
pub mod site;
pub mod source;
pub mod types;

#[cfg(test)]
pub mod testing;

use error::ScrapeError;
use normalize::{DatePolicy, NormalizeOptions};
use site::{ActuaryList, ListingSite};
use source::{Engine, PageRequest, PageSession, SessionLauncher};
use types::{RawCard, ReconcileReport, ScrapePlan};

#[derive(Args)]
pub struct ScrapeCmd {
    /// Listing pages to visit, starting at 1
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: u32,
    /// Defaults to JOBS_ENGINE, then browser
    #[arg(long, value_enum)]
    pub engine: Option<Engine>,
    /// Defaults to JOBS_DATE_POLICY, then fallback-today
    #[arg(long, value_enum)]
    pub date_policy: Option<DatePolicy>,
    /// Per-page wait for the card container, in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
    /// Write to the store; without it postings are only scraped and reported
    #[arg(long, default_value_t = false)]
    pub apply: bool,
}

/// Everything one run needs besides the store.
pub struct ScrapeOptions {
    pub pages: u32,
    pub page_timeout: Duration,
    pub date_policy: DatePolicy,
    /// Processing date for relative and fallback posting dates.
    pub today: NaiveDate,
}

impl ScrapeOptions {
    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions { date_policy: self.date_policy, today: self.today }
    }
}

/// Visit pages 1..=N in order inside one session and collect their cards.
/// The session is closed on every exit path; any page failure aborts the run.
pub async fn extract(
    site: &dyn ListingSite,
    launcher: &dyn SessionLauncher,
    pages: u32,
    page_timeout: Duration,
) -> Result<Vec<RawCard>, ScrapeError> {
    if pages == 0 {
        return Err(ScrapeError::InvalidPageCount);
    }
    let log = telemetry::scrape();
    let mut session = launcher
        .launch()
        .instrument(log.span_kv(&ScrapePhase::Launch, [("engine", launcher.engine().as_str().to_string())]))
        .await?;

    let result = extract_pages(site, session.as_mut(), pages, page_timeout).await;

    if let Err(e) = session.close().instrument(log.span(&ScrapePhase::Close)).await {
        log.warn_kv("session close failed", [("error", e.to_string())]);
    }
    result
}

async fn extract_pages(
    site: &dyn ListingSite,
    session: &mut dyn PageSession,
    pages: u32,
    page_timeout: Duration,
) -> Result<Vec<RawCard>, ScrapeError> {
    let log = telemetry::scrape();
    let mut cards = Vec::new();
    for page in 1..=pages {
        let url = site.page_url(page);
        let req = PageRequest { page, url: &url, ready_selector: site.ready_selector(), timeout: page_timeout };
        let span = log.span_kv(&ScrapePhase::Page, [("page", page.to_string()), ("url", url.clone())]);
        let html = session.load(&req).instrument(span).await?;
        let page_cards = site.parse_cards(&html);
        log.page_summary(page, page_cards.len());
        cards.extend(page_cards);
    }
    Ok(cards)
}

/// Scrape and normalize without persisting.
pub async fn run_scrape(
    site: &dyn ListingSite,
    launcher: &dyn SessionLauncher,
    opts: &ScrapeOptions,
) -> Result<Vec<JobPosting>, ScrapeError> {
    let log = telemetry::scrape();
    let raw = extract(site, launcher, opts.pages, opts.page_timeout).await?;

    let _s = log.span(&ScrapePhase::Normalize).entered();
    let (postings, dropped) = normalize::normalize_all(&raw, &opts.normalize_options());
    log.normalize_summary(raw.len(), postings.len(), dropped);
    Ok(postings)
}

/// The trigger operation: scrape, normalize, then upsert every posting.
pub async fn scrape_and_merge<S>(
    site: &dyn ListingSite,
    launcher: &dyn SessionLauncher,
    store: &S,
    opts: &ScrapeOptions,
) -> Result<ReconcileReport, ScrapeError>
where
    S: PostingStore + ?Sized,
{
    let log = telemetry::scrape();
    let postings = run_scrape(site, launcher, opts).await?;
    let report = reconcile::reconcile(store, &postings)
        .instrument(log.span_kv(&ScrapePhase::Reconcile, [("postings", postings.len().to_string())]))
        .await?;
    log.totals(report.count, report.inserted, report.replaced, report.unchanged);
    Ok(report)
}

pub async fn run(pool: &PgPool, cfg: &AppConfig, args: ScrapeCmd) -> Result<()> {
    let log = telemetry::scrape();
    let engine = args.engine.unwrap_or(cfg.engine);
    let opts = ScrapeOptions {
        pages: args.pages,
        page_timeout: args.timeout_secs.map(Duration::from_secs).unwrap_or(cfg.page_timeout),
        date_policy: args.date_policy.unwrap_or(cfg.date_policy),
        today: chrono::Utc::now().date_naive(),
    };
    let _g = log.root_span_kv([
        ("apply", args.apply.to_string()),
        ("pages", opts.pages.to_string()),
        ("engine", engine.as_str().to_string()),
        ("date_policy", format!("{:?}", opts.date_policy)),
        ("site", cfg.site_url.clone()),
    ]).entered();

    let site = ActuaryList::new(cfg.site_url.clone());
    let launcher = source::launcher_for(engine, cfg.chrome_path.clone());

    if !args.apply {
        let postings = run_scrape(&site, launcher.as_ref(), &opts).await?;
        log.info(format!("📝 Scrape plan — postings={} (nothing written)", postings.len()));
        for p in &postings {
            log.info(format!("  {} | {} | {} | {} | {:?}", p.posting_date, p.title, p.company, p.job_type, p.tags));
        }
        log.info("   Use --apply to write.");
        if telemetry::config::json_mode() {
            let plan = ScrapePlan { pages: opts.pages, engine: engine.as_str(), site: site.name().to_string(), postings };
            log.plan(&plan)?;
        }
        return Ok(());
    }

    let store = PgStore::new(pool.clone());
    let report = scrape_and_merge(&site, launcher.as_ref(), &store, &opts).await?;
    log.info(format!("✅ Upserted {} job(s)", report.count));
    if telemetry::config::json_mode() {
        log.result(&report)?;
    }
    Ok(())
}
