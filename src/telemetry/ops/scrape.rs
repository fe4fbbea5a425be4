use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Scrape;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Launch, Page, Normalize, Reconcile, Close }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Launch => "launch",
        Phase::Page => "page",
        Phase::Normalize => "normalize",
        Phase::Reconcile => "reconcile",
        Phase::Close => "close",
    }}
    fn span(&self) -> Span { match self {
        Phase::Launch => info_span!("launch"),
        Phase::Page => info_span!("page"),
        Phase::Normalize => info_span!("normalize"),
        Phase::Reconcile => info_span!("reconcile"),
        Phase::Close => info_span!("close"),
    }}
}

impl OpMarker for Scrape {
    const NAME: &'static str = "scrape";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("scrape") }
}
