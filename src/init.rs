use anyhow::Result;
use clap::Args;
use serde::Serialize;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::telemetry::{self};
use crate::telemetry::ops::init::Phase as InitPhase;

/// Apply pending migrations (plan-only by default).
#[derive(Args)]
pub struct InitCmd {
    #[arg(long, default_value_t = false)]
    pub apply: bool,
}

#[derive(Serialize)]
struct InitPlan { migrations: Vec<String> }

#[derive(Serialize)]
struct InitResult { applied: usize }

pub async fn connect(dsn: &str) -> Result<PgPool> {
    let log = telemetry::init();
    let _s = log.span(&InitPhase::Connect).entered();
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(dsn)
        .await?;
    Ok(pool)
}

pub async fn run(pool: &PgPool, args: InitCmd) -> Result<()> {
    let log = telemetry::init();
    let _g = log.root_span_kv([("apply", args.apply.to_string())]).entered();

    let migrator = sqlx::migrate!();
    let names: Vec<String> = migrator
        .iter()
        .map(|m| format!("{}_{}", m.version, m.description))
        .collect();

    if !args.apply {
        let _s = log.span(&InitPhase::Plan).entered();
        log.info(format!("📝 Init plan — {} migration(s)", names.len()));
        for n in &names { log.info(format!("  {}", n)); }
        log.info("   Use --apply to execute.");
        if telemetry::config::json_mode() {
            log.plan(&InitPlan { migrations: names })?;
        }
        return Ok(());
    }

    let _s = log.span(&InitPhase::Migrate).entered();
    // idempotent: already-applied versions are skipped
    migrator.run(pool).await?;
    log.info("✅ Database initialized");
    if telemetry::config::json_mode() {
        log.result(&InitResult { applied: names.len() })?;
    }
    Ok(())
}
