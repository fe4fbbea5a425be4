use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use clap::ValueEnum;
use futures::StreamExt;
use scraper::{Html, Selector};
use std::str::FromStr;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::error::ScrapeError;

pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124 Safari/537.36";

const READY_POLL: Duration = Duration::from_millis(250);

/// How listing pages are loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Engine {
    /// Headless Chrome; needed when cards are rendered client-side.
    #[default]
    Browser,
    /// Plain GET; for server-rendered listings.
    Http,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Browser => "browser",
            Engine::Http => "http",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown engine `{0}` (expected browser or http)")]
pub struct UnknownEngine(String);

impl FromStr for Engine {
    type Err = UnknownEngine;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Engine as ValueEnum>::from_str(s, true).map_err(|_| UnknownEngine(s.to_string()))
    }
}

/// Page request handed to a session.
#[derive(Debug, Clone)]
pub struct PageRequest<'a> {
    pub page: u32,
    pub url: &'a str,
    pub ready_selector: &'a str,
    pub timeout: Duration,
}

/// One open browsing session, owned by a single run.
#[async_trait]
pub trait PageSession: Send {
    /// Navigate, wait for `ready_selector`, and return the rendered HTML.
    async fn load(&mut self, req: &PageRequest<'_>) -> Result<String, ScrapeError>;
    async fn close(self: Box<Self>) -> Result<(), ScrapeError>;
}

#[async_trait]
pub trait SessionLauncher: Send + Sync {
    fn engine(&self) -> Engine;
    async fn launch(&self) -> Result<Box<dyn PageSession>, ScrapeError>;
}

pub fn launcher_for(engine: Engine, chrome_path: Option<String>) -> Box<dyn SessionLauncher> {
    match engine {
        Engine::Browser => Box::new(BrowserLauncher { chrome_path }),
        Engine::Http => Box::new(HttpLauncher),
    }
}

// ---------- headless Chrome ----------

pub struct BrowserLauncher {
    pub chrome_path: Option<String>,
}

#[async_trait]
impl SessionLauncher for BrowserLauncher {
    fn engine(&self) -> Engine { Engine::Browser }

    async fn launch(&self) -> Result<Box<dyn PageSession>, ScrapeError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-setuid-sandbox");
        if let Some(path) = &self.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(ScrapeError::SessionLaunch)?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::SessionLaunch(e.to_string()))?;

        // CDP events must be drained for the browser to make progress
        let handler_task = tokio::spawn(async move {
            while let Some(ev) = handler.next().await {
                if ev.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(p) => p,
            Err(e) => {
                let session = BrowserSession { browser, handler_task, page: None };
                let _ = Box::new(session).close().await;
                return Err(ScrapeError::SessionLaunch(e.to_string()));
            }
        };
        if let Err(e) = page.set_user_agent(USER_AGENT).await {
            warn!(error = %e, "could not set user agent");
        }
        Ok(Box::new(BrowserSession { browser, handler_task, page: Some(page) }))
    }
}

/// Dropping `Browser` kills the Chrome child, so a panicking run still cleans up.
struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: Option<chromiumoxide::Page>,
}

#[async_trait]
impl PageSession for BrowserSession {
    async fn load(&mut self, req: &PageRequest<'_>) -> Result<String, ScrapeError> {
        let page = self.page.as_ref().ok_or_else(|| ScrapeError::SessionLaunch("no open page".into()))?;
        let nav = |e: chromiumoxide::error::CdpError| ScrapeError::NavigationFailure {
            page: req.page,
            url: req.url.to_string(),
            reason: e.to_string(),
        };

        page.goto(req.url).await.map_err(nav)?;

        let started = Instant::now();
        let waited = tokio::time::timeout(req.timeout, async {
            loop {
                if page.find_element(req.ready_selector).await.is_ok() {
                    return;
                }
                tokio::time::sleep(READY_POLL).await;
            }
        })
        .await;
        if waited.is_err() {
            return Err(ScrapeError::ExtractionTimeout {
                page: req.page,
                selector: req.ready_selector.to_string(),
                waited: started.elapsed(),
            });
        }
        page.content().await.map_err(nav)
    }

    async fn close(self: Box<Self>) -> Result<(), ScrapeError> {
        let BrowserSession { mut browser, handler_task, page } = *self;
        drop(page);
        let closed = browser.close().await;
        let _ = browser.wait().await;
        handler_task.abort();
        closed.map(|_| ()).map_err(|e| ScrapeError::SessionClose(e.to_string()))
    }
}

// ---------- plain HTTP ----------

pub struct HttpLauncher;

#[async_trait]
impl SessionLauncher for HttpLauncher {
    fn engine(&self) -> Engine { Engine::Http }

    async fn launch(&self) -> Result<Box<dyn PageSession>, ScrapeError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ScrapeError::SessionLaunch(e.to_string()))?;
        Ok(Box::new(HttpSession { client }))
    }
}

struct HttpSession {
    client: reqwest::Client,
}

#[async_trait]
impl PageSession for HttpSession {
    async fn load(&mut self, req: &PageRequest<'_>) -> Result<String, ScrapeError> {
        let started = Instant::now();
        let fail = |e: reqwest::Error| {
            if e.is_timeout() {
                ScrapeError::ExtractionTimeout {
                    page: req.page,
                    selector: req.ready_selector.to_string(),
                    waited: started.elapsed(),
                }
            } else {
                ScrapeError::NavigationFailure { page: req.page, url: req.url.to_string(), reason: e.to_string() }
            }
        };
        let html = self
            .client
            .get(req.url)
            .timeout(req.timeout)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(fail)?
            .text()
            .await
            .map_err(fail)?;

        if !has_element(&html, req.ready_selector) {
            return Err(ScrapeError::ContentMissing { page: req.page, selector: req.ready_selector.to_string() });
        }
        Ok(html)
    }

    async fn close(self: Box<Self>) -> Result<(), ScrapeError> {
        debug!("http session closed");
        Ok(())
    }
}

fn has_element(html: &str, selector: &str) -> bool {
    match Selector::parse(selector) {
        Ok(sel) => Html::parse_document(html).select(&sel).next().is_some(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_parses_case_insensitively() {
        assert_eq!("HTTP".parse::<Engine>().unwrap(), Engine::Http);
        assert_eq!("browser".parse::<Engine>().unwrap(), Engine::Browser);
        assert!("curl".parse::<Engine>().is_err());
    }

    #[test]
    fn element_presence_check() {
        let html = r#"<div class="Job_job-card__YgDAV">x</div>"#;
        assert!(has_element(html, "div.Job_job-card__YgDAV"));
        assert!(!has_element("<div></div>", "div.Job_job-card__YgDAV"));
    }
}
