// One full run: resolve, derive the badge, publish.
//
// If publishing the resolved record fails anywhere, every sink is rewritten
// with a failure record and an unknown badge, so no sink is left holding the
// output of a run that reported failure.

use flagstatus_common::{BadgeSummary, FlagStatusError, StatusRecord};
use tracing::{error, info, warn};

use crate::publisher::Publisher;
use crate::resolver::{Resolution, ResolutionKind, Resolver};

/// Badge for a resolution. A hardcoded default means nothing was actually
/// observed, so it badges as unknown rather than full-staff.
pub fn badge_for(resolution: &Resolution) -> BadgeSummary {
    match resolution.kind {
        ResolutionKind::Live { .. } | ResolutionKind::LastKnown => {
            BadgeSummary::for_status(resolution.record.status)
        }
        ResolutionKind::Default => BadgeSummary::unknown(),
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub resolution: Resolution,
    pub badge: BadgeSummary,
}

pub struct StatusRun {
    resolver: Resolver,
    publisher: Publisher,
}

impl StatusRun {
    pub fn new(resolver: Resolver, publisher: Publisher) -> Self {
        Self {
            resolver,
            publisher,
        }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub async fn run(&self) -> Result<RunReport, FlagStatusError> {
        let resolution = self.resolver.resolve().await;
        let badge = badge_for(&resolution);

        info!(
            status = %resolution.record.status,
            source = %resolution.record.source,
            resolution = %resolution.kind,
            badge = %badge.message,
            "Flag status resolved"
        );

        match self.publisher.publish(&resolution.record, &badge) {
            Ok(()) => Ok(RunReport { resolution, badge }),
            Err(publish_err) => {
                error!(error = %publish_err, "Publishing failed, writing failure record");
                let failure = StatusRecord::failure(
                    resolution.record.status,
                    format!("Publishing failed: {publish_err}"),
                );
                if let Err(e) = self.publisher.publish(&failure, &BadgeSummary::unknown()) {
                    warn!(error = %e, "Failure record could not be written to every sink");
                }
                Err(FlagStatusError::Publish(publish_err.to_string()))
            }
        }
    }
}
