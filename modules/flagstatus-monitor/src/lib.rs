pub mod pipeline;
pub mod publisher;
pub mod resolver;
pub mod sink;

use std::sync::Arc;

use flagstatus_common::{Config, FlagStatusError};
use flagstatus_sources::{build_sources, Fetcher, HttpFetcher, RetryPolicy, Retrying};

pub use pipeline::{badge_for, RunReport, StatusRun};
pub use publisher::{PublishError, Publisher};
pub use resolver::{Attempt, AttemptOutcome, Resolution, ResolutionKind, Resolver};
pub use sink::{Sink, SinkError};

/// Wire the production pipeline from configuration: HTTP fetcher behind the
/// retry policy, sources in configured order, primary sink as last known.
pub fn build_run(config: &Config) -> Result<StatusRun, FlagStatusError> {
    let http = HttpFetcher::new(config.http_timeout)
        .map_err(|e| FlagStatusError::Config(e.to_string()))?;
    let fetcher: Arc<dyn Fetcher> = Arc::new(Retrying::new(
        http,
        RetryPolicy::from(config.retry.clone()),
    ));

    let sources = build_sources(&config.sources, fetcher);
    let publisher = Publisher::new(config.sinks.iter().map(Sink::new).collect());

    let mut resolver = Resolver::new(sources);
    if let Some(primary) = publisher.primary() {
        resolver = resolver.with_last_known(primary.clone());
    }

    Ok(StatusRun::new(resolver, publisher))
}
