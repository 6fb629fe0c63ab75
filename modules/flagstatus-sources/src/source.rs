use async_trait::async_trait;
use flagstatus_common::Candidate;
use tracing::{info, warn};

use crate::error::{Result, SourceError};

/// One external representation of the flag status.
///
/// `fetch` never fails: transport and parse problems are logged here and
/// reported as `None` so the resolver can move on to the next source.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Stable label used in logs and resolution reports.
    fn name(&self) -> &str;

    async fn fetch(&self) -> Option<Candidate>;
}

/// Collapse an adapter's internal result into the `fetch` contract.
pub(crate) fn settle(source: &str, result: Result<Option<Candidate>>) -> Option<Candidate> {
    match result {
        Ok(Some(candidate)) => {
            info!(
                source,
                status = candidate.status.as_deref().unwrap_or("<none>"),
                "Source produced a status"
            );
            Some(candidate)
        }
        Ok(None) => {
            info!(source, "Source had no result");
            None
        }
        Err(e) => {
            log_source_error(source, &e);
            None
        }
    }
}

fn log_source_error(source: &str, e: &SourceError) {
    match (e.status_code(), e.body()) {
        (Some(status), Some(body)) => warn!(
            source,
            url = e.url(),
            status,
            body,
            transient = e.is_transient(),
            error = %e,
            "Source request failed"
        ),
        _ => warn!(
            source,
            url = e.url(),
            transient = e.is_transient(),
            error = %e,
            "Source request failed"
        ),
    }
}
