use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Jobs;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Plan, List, Show, Delete }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self { Phase::Plan => "plan", Phase::List => "list", Phase::Show => "show", Phase::Delete => "delete" } }
    fn span(&self) -> Span { match self { Phase::Plan => info_span!("plan"), Phase::List => info_span!("list"), Phase::Show => info_span!("show"), Phase::Delete => info_span!("delete") } }
}

impl OpMarker for Jobs {
    const NAME: &'static str = "jobs";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("jobs") }
}
