use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

use super::ListingSite;
use crate::scrape::types::RawCard;

const CARD: &str = "div.Job_job-card__YgDAV";

struct CardSelectors {
    card: Selector,
    company: Selector,
    title: Selector,
    locations: Selector,
    tags: Selector,
    posted: Selector,
}

static SELECTORS: LazyLock<CardSelectors> = LazyLock::new(|| CardSelectors {
    card: Selector::parse(CARD).expect("static selector"),
    company: Selector::parse("p.Job_job-card__company__7T9qY").expect("static selector"),
    title: Selector::parse("p.Job_job-card__position__ic1rc").expect("static selector"),
    locations: Selector::parse("div.Job_job-card__locations__x1exr a").expect("static selector"),
    tags: Selector::parse("div.Job_job-card__tags__zfriA a").expect("static selector"),
    posted: Selector::parse("p.Job_job-card__posted-on__NCZaJ").expect("static selector"),
});

/// actuarylist.com job board.
pub struct ActuaryList {
    base_url: String,
}

impl ActuaryList {
    pub fn new(base_url: impl Into<String>) -> Self {
        ActuaryList { base_url: base_url.into() }
    }
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn first_text(card: ElementRef<'_>, sel: &Selector) -> String {
    card.select(sel).next().map(text_of).unwrap_or_default()
}

impl ListingSite for ActuaryList {
    fn name(&self) -> &str { "actuarylist" }

    fn page_url(&self, page: u32) -> String {
        if page <= 1 {
            self.base_url.clone()
        } else {
            format!("{}?page={}", self.base_url, page)
        }
    }

    fn ready_selector(&self) -> &str { CARD }

    fn parse_cards(&self, html: &str) -> Vec<RawCard> {
        let doc = Html::parse_document(html);
        let s = &*SELECTORS;
        doc.select(&s.card)
            .map(|card| {
                let location = card
                    .select(&s.locations)
                    .map(text_of)
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join(", ");
                RawCard {
                    title: first_text(card, &s.title),
                    company: first_text(card, &s.company),
                    location,
                    meta: first_text(card, &s.posted),
                    tags: card.select(&s.tags).map(text_of).collect(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
    <html><body><main>
      <div class="Job_job-card__YgDAV">
        <p class="Job_job-card__company__7T9qY"> Acme Re </p>
        <p class="Job_job-card__position__ic1rc">
            Pricing   Actuary
        </p>
        <div class="Job_job-card__locations__x1exr">
          <a href="/l/london">London</a><a href="/l/uk"> UK </a><a href="/l/x"> </a>
        </div>
        <div class="Job_job-card__tags__zfriA">
          <a>Pricing</a><a>Contract</a>
        </div>
        <p class="Job_job-card__posted-on__NCZaJ">Posted: 2024-01-05</p>
      </div>
      <div class="Job_job-card__YgDAV">
        <p class="Job_job-card__position__ic1rc">Orphan role</p>
      </div>
    </main></body></html>
    "#;

    #[test]
    fn page_urls() {
        let site = ActuaryList::new("https://www.actuarylist.com/");
        assert_eq!(site.page_url(1), "https://www.actuarylist.com/");
        assert_eq!(site.page_url(3), "https://www.actuarylist.com/?page=3");
    }

    #[test]
    fn parses_cards_in_page_order() {
        let site = ActuaryList::new("https://www.actuarylist.com/");
        let cards = site.parse_cards(PAGE);
        assert_eq!(cards.len(), 2);

        let c = &cards[0];
        assert_eq!(c.company, "Acme Re");
        // inner whitespace is left for the normalizer
        assert!(c.title.starts_with("Pricing") && c.title.ends_with("Actuary"));
        assert_eq!(c.location, "London, UK");
        assert_eq!(c.tags, vec!["Pricing", "Contract"]);
        assert_eq!(c.meta, "Posted: 2024-01-05");

        assert_eq!(cards[1].title, "Orphan role");
        assert_eq!(cards[1].company, "");
        assert!(cards[1].tags.is_empty());
    }

    #[test]
    fn no_cards_on_unrelated_markup() {
        let site = ActuaryList::new("https://www.actuarylist.com/");
        assert!(site.parse_cards("<html><body><p>maintenance</p></body></html>").is_empty());
    }
}
