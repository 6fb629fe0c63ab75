use flagstatus_common::{validate_record, BadgeSummary, StatusRecord, Validation, DEFAULT_REASON};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::sink::{Sink, SinkError};

#[derive(Debug, Error)]
#[error("{} of {attempted} sinks failed: {}", .failures.len(), summarize(.failures))]
pub struct PublishError {
    pub attempted: usize,
    pub failures: Vec<SinkError>,
}

fn summarize(failures: &[SinkError]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Writes one record (and its badge) to every configured sink.
pub struct Publisher {
    sinks: Vec<Sink>,
}

impl Publisher {
    pub fn new(sinks: Vec<Sink>) -> Self {
        Self { sinks }
    }

    /// The sink whose contents serve as the next run's last known status.
    pub fn primary(&self) -> Option<&Sink> {
        self.sinks.first()
    }

    /// Best effort across sinks: a failing sink is logged and the rest are
    /// still written. Any failure is reported back.
    pub fn publish(&self, record: &StatusRecord, badge: &BadgeSummary) -> Result<(), PublishError> {
        let replacement;
        let (record, badge) = match validate_record(record) {
            Validation::Valid(_) => (record, badge),
            Validation::Invalid(reason) => {
                warn!(reason = %reason, "Refusing to publish invalid record, writing default");
                replacement = (
                    StatusRecord::default_status(DEFAULT_REASON),
                    BadgeSummary::unknown(),
                );
                (&replacement.0, &replacement.1)
            }
        };

        let mut failures = Vec::new();
        for sink in &self.sinks {
            if let Err(e) = sink.write(record, badge) {
                error!(path = %sink.status_path().display(), error = %e, "Sink write failed");
                failures.push(e);
            }
        }

        if failures.is_empty() {
            info!(
                sinks = self.sinks.len(),
                status = %record.status,
                badge = %badge.message,
                "Published flag status"
            );
            Ok(())
        } else {
            Err(PublishError {
                attempted: self.sinks.len(),
                failures,
            })
        }
    }
}
