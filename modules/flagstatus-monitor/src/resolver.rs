// Priority-ordered resolution.
//
// Sources are tried one at a time. The first one whose output validates wins
// and nothing after it is invoked. When every source comes up empty, the
// previous run's record is reused, and failing that a hardcoded default.

use std::fmt;

use flagstatus_common::{validate, StatusRecord, Validation, DEFAULT_REASON};
use flagstatus_sources::StatusSource;
use tracing::{info, warn};

use crate::sink::Sink;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Valid,
    Invalid(String),
    NoResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub source: String,
    pub outcome: AttemptOutcome,
}

/// How the final record was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionKind {
    /// A live source answered; `source_index` is its position in priority order.
    Live { source_index: usize },
    /// Every source failed; the previous run's record was reused.
    LastKnown,
    /// Every source failed and there was no usable previous record.
    Default,
}

impl fmt::Display for ResolutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionKind::Live { source_index } => write!(f, "live (source #{})", source_index + 1),
            ResolutionKind::LastKnown => f.write_str("last known"),
            ResolutionKind::Default => f.write_str("default"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub record: StatusRecord,
    pub kind: ResolutionKind,
    pub attempts: Vec<Attempt>,
}

pub struct Resolver {
    sources: Vec<Box<dyn StatusSource>>,
    last_known: Option<Sink>,
}

impl Resolver {
    pub fn new(sources: Vec<Box<dyn StatusSource>>) -> Self {
        Self {
            sources,
            last_known: None,
        }
    }

    /// Read the previous run's record from `sink` when all sources fail.
    pub fn with_last_known(mut self, sink: Sink) -> Self {
        self.last_known = Some(sink);
        self
    }

    pub async fn resolve(&self) -> Resolution {
        let mut attempts = Vec::with_capacity(self.sources.len());

        for (index, source) in self.sources.iter().enumerate() {
            let name = source.name().to_string();
            info!(source = %name, priority = index + 1, "Trying source");

            let outcome = match source.fetch().await {
                None => AttemptOutcome::NoResult,
                Some(candidate) => match validate(&candidate) {
                    Validation::Valid(record) => {
                        info!(
                            source = %name,
                            status = %record.status,
                            reason = %record.reason,
                            "Resolved flag status"
                        );
                        attempts.push(Attempt {
                            source: name,
                            outcome: AttemptOutcome::Valid,
                        });
                        return Resolution {
                            record,
                            kind: ResolutionKind::Live {
                                source_index: index,
                            },
                            attempts,
                        };
                    }
                    Validation::Invalid(reason) => {
                        warn!(source = %name, reason = %reason, "Source produced an invalid record");
                        AttemptOutcome::Invalid(reason)
                    }
                },
            };

            attempts.push(Attempt {
                source: name,
                outcome,
            });
        }

        warn!(
            tried = attempts.len(),
            "No source produced a valid status, falling back"
        );

        if let Some(previous) = self.last_known.as_ref().and_then(Sink::read_last_known) {
            info!(
                source = %previous.source,
                status = %previous.status,
                "Using last known status"
            );
            return Resolution {
                record: previous.into_last_known(),
                kind: ResolutionKind::LastKnown,
                attempts,
            };
        }

        info!("No last known status, using default");
        Resolution {
            record: StatusRecord::default_status(DEFAULT_REASON),
            kind: ResolutionKind::Default,
            attempts,
        }
    }
}
