// RSS/Atom notice feed (XML).
//
// Entries are scanned in feed order; the first whose title or summary
// mentions half-staff decides the status.

use std::sync::Arc;

use async_trait::async_trait;
use flagstatus_common::{mentions_half_staff, Candidate, FlagStatus, NO_ACTIVE_NOTICES};

use crate::error::{Result, SourceError};
use crate::fetcher::Fetcher;
use crate::source::{settle, StatusSource};

pub const FEED_SOURCE: &str = "Notice Feed";

pub struct FeedSource {
    fetcher: Arc<dyn Fetcher>,
    url: String,
}

impl FeedSource {
    pub fn new(fetcher: Arc<dyn Fetcher>, url: &str) -> Self {
        Self {
            fetcher,
            url: url.to_string(),
        }
    }

    async fn check(&self) -> Result<Option<Candidate>> {
        let body = self.fetcher.get(&self.url).await?;
        parse_feed(&body, &self.url).map(Some)
    }
}

#[async_trait]
impl StatusSource for FeedSource {
    fn name(&self) -> &str {
        FEED_SOURCE
    }

    async fn fetch(&self) -> Option<Candidate> {
        settle(FEED_SOURCE, self.check().await)
    }
}

pub fn parse_feed(body: &str, url: &str) -> Result<Candidate> {
    let feed = feed_rs::parser::parse(body.as_bytes())
        .map_err(|e| SourceError::parse(url, format!("Failed to parse RSS/Atom feed: {e}")))?;

    for entry in feed.entries {
        let title = entry
            .title
            .map(|t| t.content.trim().to_string())
            .unwrap_or_default();
        let summary = entry.summary.map(|s| s.content).unwrap_or_default();

        if mentions_half_staff(&title) || mentions_half_staff(&summary) {
            let candidate = Candidate::observed(FlagStatus::HalfStaff, FEED_SOURCE, title);
            return Ok(match entry.links.first() {
                Some(link) => candidate.with_proclamation_url(link.href.clone()),
                None => candidate,
            });
        }
    }

    Ok(Candidate::observed(
        FlagStatus::FullStaff,
        FEED_SOURCE,
        NO_ACTIVE_NOTICES,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://example.gov/notices.xml";

    fn rss(items: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <rss version="2.0"><channel>
              <title>Flag Notices</title>
              <link>https://example.gov</link>
              <description>Notices</description>
              {items}
            </channel></rss>"#
        )
    }

    #[test]
    fn first_half_staff_entry_wins() {
        let body = rss(
            r#"<item><title>Budget hearing scheduled</title><link>https://example.gov/1</link></item>
               <item><title>Flags to half-staff honoring Senator Doe</title><link>https://example.gov/2</link></item>
               <item><title>Half staff for Peace Officers Memorial Day</title><link>https://example.gov/3</link></item>"#,
        );
        let c = parse_feed(&body, URL).unwrap();
        assert_eq!(c.status.as_deref(), Some("half-staff"));
        assert_eq!(c.reason.as_deref(), Some("Flags to half-staff honoring Senator Doe"));
        assert_eq!(c.proclamation_url.as_deref(), Some("https://example.gov/2"));
    }

    #[test]
    fn summary_mention_counts() {
        let body = rss(
            r#"<item><title>Governor's order</title><description>All flags shall be flown at half staff.</description></item>"#,
        );
        let c = parse_feed(&body, URL).unwrap();
        assert_eq!(c.status.as_deref(), Some("half-staff"));
        assert_eq!(c.reason.as_deref(), Some("Governor's order"));
    }

    #[test]
    fn no_matching_entries_is_full_staff() {
        let body = rss(r#"<item><title>Road closure</title></item>"#);
        let c = parse_feed(&body, URL).unwrap();
        assert_eq!(c.status.as_deref(), Some("full-staff"));
        assert_eq!(c.reason.as_deref(), Some(NO_ACTIVE_NOTICES));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(
            parse_feed("definitely not xml", URL),
            Err(SourceError::Parse { .. })
        ));
    }
}
