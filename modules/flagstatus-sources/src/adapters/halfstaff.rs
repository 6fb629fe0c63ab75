// HalfStaff.org widget endpoint (JSON).
//
// The widget reports the active notice, if any, in a `type` field; "none"
// means no notice is in effect.

use std::sync::Arc;

use async_trait::async_trait;
use flagstatus_common::{Candidate, FlagStatus, NO_ACTIVE_NOTICES};
use serde::Deserialize;

use crate::error::{Result, SourceError};
use crate::fetcher::Fetcher;
use crate::source::{settle, StatusSource};

pub const HALFSTAFF_SOURCE: &str = "HalfStaff.org";

#[derive(Debug, Deserialize)]
struct WidgetResponse {
    #[serde(rename = "type")]
    kind: Option<String>,
    title: Option<String>,
    reason: Option<String>,
}

pub struct HalfStaffApiSource {
    fetcher: Arc<dyn Fetcher>,
    url: String,
}

impl HalfStaffApiSource {
    pub fn new(fetcher: Arc<dyn Fetcher>, base_url: &str, state: Option<&str>) -> Self {
        Self {
            fetcher,
            url: widget_url(base_url, state),
        }
    }

    async fn check(&self) -> Result<Option<Candidate>> {
        let body = self.fetcher.get(&self.url).await?;
        parse_widget(&body, &self.url).map(Some)
    }
}

#[async_trait]
impl StatusSource for HalfStaffApiSource {
    fn name(&self) -> &str {
        HALFSTAFF_SOURCE
    }

    async fn fetch(&self) -> Option<Candidate> {
        settle(HALFSTAFF_SOURCE, self.check().await)
    }
}

/// National notices when `state` is unset or "US".
fn widget_url(base_url: &str, state: Option<&str>) -> String {
    match state.map(str::trim).filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("US")) {
        Some(st) => {
            let sep = if base_url.contains('?') { '&' } else { '?' };
            format!("{base_url}{sep}state={}", st.to_uppercase())
        }
        None => base_url.to_string(),
    }
}

/// Map a widget document to a candidate record.
pub fn parse_widget(body: &str, url: &str) -> Result<Candidate> {
    let widget: WidgetResponse =
        serde_json::from_str(body).map_err(|e| SourceError::parse(url, e.to_string()))?;

    let kind = widget.kind.as_deref().map(str::trim).unwrap_or("");
    if kind.is_empty() || kind.eq_ignore_ascii_case("none") {
        return Ok(Candidate::observed(
            FlagStatus::FullStaff,
            HALFSTAFF_SOURCE,
            NO_ACTIVE_NOTICES,
        ));
    }

    let reason = widget
        .title
        .filter(|t| !t.trim().is_empty())
        .or(widget.reason)
        .map(|r| r.trim().to_string())
        .unwrap_or_default();

    Ok(Candidate::observed(
        FlagStatus::HalfStaff,
        HALFSTAFF_SOURCE,
        reason,
    ))
}
