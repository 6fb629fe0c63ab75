// Presidential proclamation discovery (HTML index + detail pages).
//
// The listing page is scanned for headings that look flag-related; each
// candidate's detail page is fetched in listing order and searched for a
// half-staff directive. One broken candidate never aborts the scan.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use flagstatus_common::{mentions_half_staff, Candidate, FlagStatus};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::adapters::scrape::collapse_whitespace;
use crate::error::{Result, SourceError};
use crate::fetcher::Fetcher;
use crate::source::{settle, StatusSource};

pub const PROCLAMATION_SOURCE: &str = "Presidential Proclamation";
pub const INDEX_SOURCE: &str = "White House Proclamations";
pub const NO_HALF_STAFF_NOTICES: &str = "no active half-staff notices found.";

/// Title words that make a listing worth opening.
pub const TITLE_KEYWORDS: &[&str] = &["flag", "honor", "respect", "memory", "proclamation", "death"];

/// Upper bound on detail pages fetched per run.
const MAX_CANDIDATES: usize = 20;

/// Containers tried, in order, for a detail page's body text.
const BODY_SELECTORS: &[&str] = &["div.body-content", "article", "main#main-content"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub title: String,
    pub url: String,
}

pub struct ProclamationSource {
    fetcher: Arc<dyn Fetcher>,
    index_url: String,
}

impl ProclamationSource {
    pub fn new(fetcher: Arc<dyn Fetcher>, index_url: &str) -> Self {
        Self {
            fetcher,
            index_url: index_url.to_string(),
        }
    }

    async fn check(&self) -> Result<Option<Candidate>> {
        let base = Url::parse(&self.index_url)
            .map_err(|e| SourceError::parse(&self.index_url, format!("invalid index URL: {e}")))?;

        let index = self.fetcher.get(&self.index_url).await?;
        let listings = extract_listings(&index, &base);
        info!(
            url = %self.index_url,
            candidates = listings.len(),
            "Scanning proclamation listings"
        );

        for listing in listings {
            let detail = match self.fetcher.get(&listing.url).await {
                Ok(body) => body,
                Err(e) => {
                    warn!(
                        url = %listing.url,
                        title = %listing.title,
                        error = %e,
                        "Could not fetch proclamation, skipping"
                    );
                    continue;
                }
            };

            let Some(text) = body_text(&detail) else {
                warn!(url = %listing.url, "Proclamation page has no body container, skipping");
                continue;
            };

            if mentions_half_staff(&text) {
                info!(url = %listing.url, title = %listing.title, "Found half-staff proclamation");
                return Ok(Some(
                    Candidate::observed(FlagStatus::HalfStaff, PROCLAMATION_SOURCE, listing.title)
                        .with_proclamation_url(listing.url),
                ));
            }
            debug!(url = %listing.url, "No half-staff directive in proclamation");
        }

        Ok(Some(Candidate::observed(
            FlagStatus::FullStaff,
            INDEX_SOURCE,
            NO_HALF_STAFF_NOTICES,
        )))
    }
}

#[async_trait]
impl StatusSource for ProclamationSource {
    fn name(&self) -> &str {
        INDEX_SOURCE
    }

    async fn fetch(&self) -> Option<Candidate> {
        settle(INDEX_SOURCE, self.check().await)
    }
}

/// Flag-related headings from a listing page, with absolute links, in page order.
pub fn extract_listings(html: &str, base: &Url) -> Vec<Listing> {
    let document = Html::parse_document(html);
    let main_sel = Selector::parse("main#main-content").expect("valid selector");
    let heading_sel = Selector::parse("h2, h3").expect("valid selector");
    let anchor_sel = Selector::parse("a").expect("valid selector");

    let root = document
        .select(&main_sel)
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut seen = HashSet::new();
    let mut listings = Vec::new();

    for heading in root.select(&heading_sel) {
        if heading
            .value()
            .attr("class")
            .is_some_and(|c| c.contains("screen-reader"))
        {
            continue;
        }

        let title = collapse_whitespace(&heading.text().collect::<Vec<_>>().join(" "));
        let lower = title.to_lowercase();
        if !TITLE_KEYWORDS.iter().any(|k| lower.contains(k)) {
            continue;
        }

        let Some(href) = find_link(&heading, &anchor_sel) else {
            warn!(title = %title, "Could not find link for proclamation");
            continue;
        };

        let url = match base.join(href) {
            Ok(u) if u.scheme() == "http" || u.scheme() == "https" => u.to_string(),
            _ => {
                warn!(title = %title, href, "Unusable proclamation link");
                continue;
            }
        };

        if seen.insert(url.clone()) {
            listings.push(Listing { title, url });
            if listings.len() >= MAX_CANDIDATES {
                break;
            }
        }
    }

    listings
}

/// Enclosing anchor, then a nested one. Failing both: the next sibling anchor,
/// the next anchor anywhere after the heading, and last the first anchor in
/// the heading's parent.
fn find_link<'a>(heading: &ElementRef<'a>, anchor_sel: &Selector) -> Option<&'a str> {
    let enclosing = heading.ancestors().filter_map(ElementRef::wrap).find(is_anchor);

    let anchor = enclosing
        .or_else(|| heading.select(anchor_sel).next())
        .or_else(|| heading.next_siblings().filter_map(ElementRef::wrap).find(is_anchor))
        .or_else(|| next_anchor(heading, anchor_sel))
        .or_else(|| {
            heading
                .parent()
                .and_then(ElementRef::wrap)
                .and_then(|parent| parent.select(anchor_sel).next())
        })?;

    anchor
        .value()
        .attr("href")
        .map(str::trim)
        .filter(|h| !h.is_empty())
}

fn is_anchor(el: &ElementRef<'_>) -> bool {
    el.value().name() == "a"
}

/// First anchor following `heading` in document order, outside the heading.
fn next_anchor<'a>(heading: &ElementRef<'a>, anchor_sel: &Selector) -> Option<ElementRef<'a>> {
    let start = **heading;
    std::iter::once(start)
        .chain(start.ancestors())
        .flat_map(|node| node.next_siblings())
        .filter_map(ElementRef::wrap)
        .find_map(|el| {
            if is_anchor(&el) {
                Some(el)
            } else {
                el.select(anchor_sel).next()
            }
        })
}

/// Lowercased text of the first body container on a detail page.
pub fn body_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    BODY_SELECTORS.iter().find_map(|sel| {
        let selector = Selector::parse(sel).ok()?;
        document.select(&selector).next().map(|el| {
            collapse_whitespace(&el.text().collect::<Vec<_>>().join(" ")).to_lowercase()
        })
    })
}
