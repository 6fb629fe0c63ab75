// Test mocks for the source layer.
//
// - MockFetcher (Fetcher): URL→scripted responses, counts requests
// - MockSource (StatusSource): fixed outcome, counts invocations
//
// No network: every test runs against these.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use flagstatus_common::{Candidate, FlagStatus};

use crate::error::{Result, SourceError};
use crate::fetcher::Fetcher;
use crate::source::StatusSource;

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Scripted fetcher. Each URL has a queue of responses; the last response
/// repeats once the queue is drained. Unregistered URLs return 404.
#[derive(Default)]
pub struct MockFetcher {
    responses: Mutex<HashMap<String, VecDeque<Result<String>>>>,
    requests: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_page(self, url: &str, body: &str) -> Self {
        self.on_sequence(url, vec![Ok(body.to_string())])
    }

    pub fn on_error(self, url: &str, err: SourceError) -> Self {
        self.on_sequence(url, vec![Err(err)])
    }

    pub fn on_sequence(self, url: &str, responses: Vec<Result<String>>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), responses.into());
        self
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn get(&self, url: &str) -> Result<String> {
        self.requests.lock().unwrap().push(url.to_string());

        let mut responses = self.responses.lock().unwrap();
        let Some(queue) = responses.get_mut(url) else {
            return Err(SourceError::http(url, 404, "not registered with MockFetcher"));
        };
        if queue.len() > 1 {
            queue.pop_front().expect("queue is non-empty")
        } else {
            queue
                .front()
                .cloned()
                .unwrap_or_else(|| Err(SourceError::http(url, 404, "empty script")))
        }
    }
}

/// Transient timeout for `url`.
pub fn timeout(url: &str) -> SourceError {
    SourceError::Timeout {
        url: url.to_string(),
    }
}

// ---------------------------------------------------------------------------
// MockSource
// ---------------------------------------------------------------------------

/// A source with a fixed answer. Clones share the invocation counter.
#[derive(Clone)]
pub struct MockSource {
    name: String,
    outcome: Option<Candidate>,
    calls: Arc<AtomicUsize>,
}

impl MockSource {
    pub fn returning(name: &str, candidate: Candidate) -> Self {
        Self {
            name: name.to_string(),
            outcome: Some(candidate),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A well-formed, freshly stamped record from this source.
    pub fn status(name: &str, status: FlagStatus, reason: &str) -> Self {
        Self::returning(name, Candidate::observed(status, name, reason))
    }

    pub fn no_result(name: &str) -> Self {
        Self {
            name: name.to_string(),
            outcome: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn boxed(&self) -> Box<dyn StatusSource> {
        Box::new(self.clone())
    }
}

#[async_trait]
impl StatusSource for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Option<Candidate> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}
