use super::types::RawCard;

mod actuarylist;

pub use actuarylist::ActuaryList;

/// One listing site: where its pages live, when a page is ready, and how cards are read.
/// Swapping sites leaves normalization and reconciliation untouched.
pub trait ListingSite: Send + Sync {
    fn name(&self) -> &str;
    /// 1-based page number.
    fn page_url(&self, page: u32) -> String;
    /// Selector whose presence means the page has rendered its cards.
    fn ready_selector(&self) -> &str;
    /// Cards in on-page order.
    fn parse_cards(&self, html: &str) -> Vec<RawCard>;
}
