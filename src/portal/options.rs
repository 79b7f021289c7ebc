//! Department and course-type code tables scraped from the landing page.
//!
//! The portal embeds its search filters as tagged spans:
//! `<span class="yuanxi" data="CODE">LABEL</span>` for departments and
//! `<span class="coursetype" data="CODE">LABEL</span>` for course types.

use html_scraper::{Html, Selector};
use indexmap::IndexMap;

use crate::portal::{PortalClient, PortalError};

/// code → label, in page order. Page order matters when the codes are
/// enumerated in a validation error.
pub type CodeMap = IndexMap<String, String>;

/// The two option tables the portal exposes for search filtering.
#[derive(Debug, Default)]
pub struct SearchOptions {
    pub departments: CodeMap,
    pub course_types: CodeMap,
}

impl SearchOptions {
    /// Fetch the landing page and scrape both option tables.
    pub async fn fetch(client: &PortalClient, retries: u32) -> Result<Self, PortalError> {
        let html = client.landing_page(retries).await?;
        Ok(Self::parse(&html))
    }

    /// Extract the tagged spans from landing-page HTML.
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        Self {
            departments: collect_spans(&document, "span.yuanxi"),
            course_types: collect_spans(&document, "span.coursetype"),
        }
    }
}

fn collect_spans(document: &Html, selector: &str) -> CodeMap {
    let sel = Selector::parse(selector).unwrap();
    document
        .select(&sel)
        .filter_map(|span| {
            let code = span.attr("data")?;
            let label = span.text().collect::<String>();
            Some((code.to_owned(), label.trim().to_owned()))
        })
        .collect()
}
