// Status page scrape (HTML).
//
// The page marks its status region with a known class; we only look inside
// that region. A page without the region says nothing about the flag.

use std::sync::Arc;

use async_trait::async_trait;
use flagstatus_common::{mentions_half_staff, Candidate, FlagStatus};
use scraper::{Html, Selector};
use tracing::info;

use crate::error::{Result, SourceError};
use crate::fetcher::Fetcher;
use crate::source::{settle, StatusSource};

/// Longest region text carried into `reason`.
const MAX_REASON_CHARS: usize = 280;

pub struct ScrapeSource {
    fetcher: Arc<dyn Fetcher>,
    url: String,
    selector: String,
    name: String,
}

impl ScrapeSource {
    pub fn new(fetcher: Arc<dyn Fetcher>, url: &str, selector: &str) -> Self {
        let name = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
            .unwrap_or_else(|| url.to_string());
        Self {
            fetcher,
            url: url.to_string(),
            selector: selector.to_string(),
            name,
        }
    }

    async fn check(&self) -> Result<Option<Candidate>> {
        let html = self.fetcher.get(&self.url).await?;
        let found = classify_region(&html, &self.selector, &self.name, &self.url)?;
        if found.is_none() {
            info!(url = %self.url, selector = %self.selector, "Status region not found on page");
        }
        Ok(found)
    }
}

#[async_trait]
impl StatusSource for ScrapeSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Option<Candidate> {
        settle(&self.name, self.check().await)
    }
}

/// Find the first element matching `selector` and classify its text.
/// `Ok(None)` when the page has no such element.
pub fn classify_region(
    html: &str,
    selector: &str,
    source: &str,
    url: &str,
) -> Result<Option<Candidate>> {
    let selector = Selector::parse(selector)
        .map_err(|e| SourceError::parse(url, format!("invalid selector {selector:?}: {e}")))?;
    let document = Html::parse_document(html);

    let Some(region) = document.select(&selector).next() else {
        return Ok(None);
    };

    let text = collapse_whitespace(&region.text().collect::<Vec<_>>().join(" "));
    let status = if mentions_half_staff(&text) {
        FlagStatus::HalfStaff
    } else {
        FlagStatus::FullStaff
    };

    Ok(Some(Candidate::observed(
        status,
        source,
        truncate_chars(&text, MAX_REASON_CHARS),
    )))
}

pub(crate) fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}
