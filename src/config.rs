use anyhow::{Context, Result};
use std::env;
use std::time::Duration;
use url::Url;

use crate::scrape::normalize::DatePolicy;
use crate::scrape::source::Engine;

pub const DEFAULT_SITE_URL: &str = "https://www.actuarylist.com/";
pub const DEFAULT_PAGE_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_PORT: u16 = 5000;

/// Application configuration loaded from environment variables.
/// `.env` is loaded by `main` before this runs; CLI flags override individual fields.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub scrape_secret: Option<String>,
    pub port: u16,
    pub site_url: String,
    pub page_timeout: Duration,
    pub date_policy: DatePolicy,
    pub engine: Engine,
    pub chrome_path: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| env::var(k).ok())
    }

    pub(crate) fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match non_empty("PORT") {
            Some(v) => v.parse().context("PORT must be a valid number")?,
            None => DEFAULT_PORT,
        };
        let timeout_secs = match non_empty("JOBS_PAGE_TIMEOUT_SECS") {
            Some(v) => v.parse().context("JOBS_PAGE_TIMEOUT_SECS must be a whole number of seconds")?,
            None => DEFAULT_PAGE_TIMEOUT_SECS,
        };
        let date_policy = match non_empty("JOBS_DATE_POLICY") {
            Some(v) => v.parse().context("JOBS_DATE_POLICY")?,
            None => DatePolicy::default(),
        };
        let engine = match non_empty("JOBS_ENGINE") {
            Some(v) => v.parse().context("JOBS_ENGINE")?,
            None => Engine::default(),
        };

        let site_url = non_empty("JOBS_SITE_URL").unwrap_or_else(|| DEFAULT_SITE_URL.to_string());
        let parsed = Url::parse(&site_url).with_context(|| format!("JOBS_SITE_URL is not a valid URL: {}", site_url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("JOBS_SITE_URL must be http or https: {}", site_url);
        }

        Ok(Self {
            database_url: non_empty("DATABASE_URL"),
            scrape_secret: non_empty("SCRAPE_SECRET"),
            port,
            site_url,
            page_timeout: Duration::from_secs(timeout_secs),
            date_policy,
            engine,
            chrome_path: non_empty("CHROME_PATH"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.site_url, DEFAULT_SITE_URL);
        assert_eq!(cfg.page_timeout, Duration::from_secs(15));
        assert_eq!(cfg.date_policy, DatePolicy::FallbackToday);
        assert_eq!(cfg.engine, Engine::Browser);
        assert!(cfg.scrape_secret.is_none());
        assert!(cfg.database_url.is_none());
    }

    #[test]
    fn blank_secret_counts_as_unset() {
        let cfg = AppConfig::from_lookup(lookup(&[("SCRAPE_SECRET", "   ")])).unwrap();
        assert!(cfg.scrape_secret.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("PORT", "8081"),
            ("JOBS_PAGE_TIMEOUT_SECS", "30"),
            ("JOBS_DATE_POLICY", "reject"),
            ("JOBS_ENGINE", "http"),
            ("SCRAPE_SECRET", " s3cret "),
        ]))
        .unwrap();
        assert_eq!(cfg.port, 8081);
        assert_eq!(cfg.page_timeout, Duration::from_secs(30));
        assert_eq!(cfg.date_policy, DatePolicy::Reject);
        assert_eq!(cfg.engine, Engine::Http);
        assert_eq!(cfg.scrape_secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn site_url_must_be_http() {
        assert!(AppConfig::from_lookup(lookup(&[("JOBS_SITE_URL", "not a url")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("JOBS_SITE_URL", "ftp://jobs.test/")])).is_err());
        let cfg = AppConfig::from_lookup(lookup(&[("JOBS_SITE_URL", "https://jobs.test/list")])).unwrap();
        assert_eq!(cfg.site_url, "https://jobs.test/list");
    }

    #[test]
    fn bad_port_is_an_error() {
        assert!(AppConfig::from_lookup(lookup(&[("PORT", "eighty")])).is_err());
    }
}
