//! Scripted site and session doubles shared by pipeline and API tests.
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::error::ScrapeError;
use super::site::ListingSite;
use super::source::{Engine, PageRequest, PageSession, SessionLauncher};
use super::types::RawCard;

pub struct FakeSite;

impl ListingSite for FakeSite {
    fn name(&self) -> &str { "fake" }
    fn page_url(&self, page: u32) -> String { format!("https://jobs.test/?page={page}") }
    fn ready_selector(&self) -> &str { "ul.cards" }
    // one card per <li>, fields separated by '|'
    fn parse_cards(&self, html: &str) -> Vec<RawCard> {
        html.lines()
            .filter_map(|l| l.trim().strip_prefix("<li>")?.strip_suffix("</li>").map(str::to_string))
            .map(|l| {
                let f: Vec<&str> = l.split('|').collect();
                RawCard {
                    title: f[0].into(),
                    company: f[1].into(),
                    location: f[2].into(),
                    meta: f[3].into(),
                    tags: f[4].split(',').filter(|t| !t.is_empty()).map(str::to_string).collect(),
                }
            })
            .collect()
    }
}

#[derive(Default)]
pub struct Trace {
    pub launched: usize,
    pub visited: Vec<String>,
    pub closed: bool,
}

pub struct FakeLauncher {
    pub pages: Vec<Option<&'static str>>,
    pub trace: Arc<Mutex<Trace>>,
    pub fail_close: bool,
}

struct FakeSession {
    pages: Vec<Option<&'static str>>,
    trace: Arc<Mutex<Trace>>,
    fail_close: bool,
}

#[async_trait]
impl SessionLauncher for FakeLauncher {
    fn engine(&self) -> Engine { Engine::Http }
    async fn launch(&self) -> Result<Box<dyn PageSession>, ScrapeError> {
        self.trace.lock().unwrap().launched += 1;
        Ok(Box::new(FakeSession { pages: self.pages.clone(), trace: self.trace.clone(), fail_close: self.fail_close }))
    }
}

#[async_trait]
impl PageSession for FakeSession {
    async fn load(&mut self, req: &PageRequest<'_>) -> Result<String, ScrapeError> {
        self.trace.lock().unwrap().visited.push(req.url.to_string());
        match self.pages.get(req.page as usize - 1).copied().flatten() {
            Some(html) => Ok(html.to_string()),
            None => Err(ScrapeError::ExtractionTimeout {
                page: req.page,
                selector: req.ready_selector.to_string(),
                waited: req.timeout,
            }),
        }
    }
    async fn close(self: Box<Self>) -> Result<(), ScrapeError> {
        self.trace.lock().unwrap().closed = true;
        if self.fail_close {
            return Err(ScrapeError::SessionClose("browser already gone".into()));
        }
        Ok(())
    }
}

pub const PAGE1: &str = "<ul class=cards>\n<li>Pricing Actuary|Acme|London|Posted: 2024-01-05|Pricing,Contract</li>\n<li>  |Acme|Paris|Posted: 2024-01-05|</li>\n</ul>";
pub const PAGE2: &str = "<ul class=cards>\n<li>Intern|Beta|Remote|N/A|Internship</li>\n</ul>";

pub fn launcher(pages: Vec<Option<&'static str>>) -> (FakeLauncher, Arc<Mutex<Trace>>) {
    let trace = Arc::new(Mutex::new(Trace::default()));
    (FakeLauncher { pages, trace: trace.clone(), fail_close: false }, trace)
}
