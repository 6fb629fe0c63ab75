pub mod adapters;
pub mod error;
pub mod fetcher;
pub mod retry;
pub mod source;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

use std::sync::Arc;

pub use adapters::{FeedSource, HalfStaffApiSource, ProclamationSource, ScrapeSource};
pub use error::{Result, SourceError};
pub use fetcher::{Fetcher, HttpFetcher};
pub use retry::{RetryPolicy, Retrying};
pub use source::StatusSource;

use flagstatus_common::SourceConfig;

/// Instantiate the configured sources, in priority order, over one fetcher.
pub fn build_sources(
    configs: &[SourceConfig],
    fetcher: Arc<dyn Fetcher>,
) -> Vec<Box<dyn StatusSource>> {
    configs
        .iter()
        .map(|config| -> Box<dyn StatusSource> {
            match config {
                SourceConfig::HalfStaffApi { url, state } => Box::new(HalfStaffApiSource::new(
                    fetcher.clone(),
                    url,
                    state.as_deref(),
                )),
                SourceConfig::Feed { url } => Box::new(FeedSource::new(fetcher.clone(), url)),
                SourceConfig::Scrape { url, selector } => {
                    Box::new(ScrapeSource::new(fetcher.clone(), url, selector))
                }
                SourceConfig::Proclamations { index_url } => {
                    Box::new(ProclamationSource::new(fetcher.clone(), index_url))
                }
            }
        })
        .collect()
}
