use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use clap::Args;
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::jobs::store::{PgStore, PostingStore};
use crate::scrape::site::{ActuaryList, ListingSite};
use crate::scrape::source::{self, SessionLauncher};
use crate::telemetry::{self};
use crate::telemetry::ops::serve::Phase as ServePhase;

pub mod auth;
pub mod error;
mod handlers;

/// Serve the HTTP API
#[derive(Args)]
pub struct ServeCmd {
    /// Defaults to PORT, then 5000
    #[arg(long)]
    pub port: Option<u16>,
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,
}

/// Shared handler state. The scrape path only sees the store trait.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub cfg: Arc<AppConfig>,
    pub store: Arc<dyn PostingStore>,
    pub site: Arc<dyn ListingSite>,
    pub launcher: Arc<dyn SessionLauncher>,
}

impl AppState {
    pub fn new(pool: PgPool, cfg: AppConfig) -> Self {
        let site = ActuaryList::new(cfg.site_url.clone());
        let launcher: Arc<dyn SessionLauncher> = Arc::from(source::launcher_for(cfg.engine, cfg.chrome_path.clone()));
        AppState {
            store: Arc::new(PgStore::new(pool.clone())),
            pool,
            cfg: Arc::new(cfg),
            site: Arc::new(site),
            launcher,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let jobs = Router::new()
        .route("/", get(handlers::list_jobs).post(handlers::create_job))
        .route("/scrape", post(handlers::trigger_scrape))
        .route(
            "/:id",
            get(handlers::get_job)
                .put(handlers::update_job)
                .patch(handlers::update_job)
                .delete(handlers::delete_job),
        );

    Router::new()
        .route("/api/health", get(handlers::health))
        .nest("/api/jobs", jobs)
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(pool: &PgPool, cfg: &AppConfig, args: ServeCmd) -> Result<()> {
    let log = telemetry::serve();
    let port = args.port.unwrap_or(cfg.port);
    let addr: SocketAddr = format!("{}:{}", args.host, port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", args.host, port))?;

    if cfg.scrape_secret.is_none() {
        log.warn("SCRAPE_SECRET is not set; the scrape trigger will reject every request");
    }

    let app = router(AppState::new(pool.clone(), cfg.clone()));
    let listener = {
        let _s = log.span(&ServePhase::Bind).entered();
        std::net::TcpListener::bind(addr).with_context(|| format!("bind {}", addr))?
    };
    listener.set_nonblocking(true)?;
    let listener = tokio::net::TcpListener::from_std(listener)?;
    log.info_kv("🚀 listening", [("addr", addr.to_string())]);
    axum::serve(listener, app).await?;
    Ok(())
}
