use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

mod config;
mod init;
mod jobs;
mod scrape;
mod server;
mod telemetry;
mod util;

#[derive(Parser)]
#[command(name = "jobs", about = "Job board scraper and API")]
struct Cli {
    #[arg(global = true, short, long)]
    dsn: Option<String>,
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Init(init::InitCmd),
    Scrape(scrape::ScrapeCmd),
    Jobs(jobs::JobsCmd),
    Serve(server::ServeCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // logs go to stderr; respect RUST_LOG and JOBS_LOG_FORMAT
    telemetry::config::init_tracing();
    let cfg = config::AppConfig::from_env()?;
    let dsn = cli
        .dsn
        .or_else(|| cfg.database_url.clone())
        .context("Please provide --dsn or set DATABASE_URL in .env")?;

    let pool = init::connect(&dsn).await?;

    match cli.command {
        Commands::Init(args) => init::run(&pool, args).await?,
        Commands::Scrape(args) => scrape::run(&pool, &cfg, args).await?,
        Commands::Jobs(args) => jobs::run(&pool, args).await?,
        Commands::Serve(args) => server::run(&pool, &cfg, args).await?,
    }

    Ok(())
}
