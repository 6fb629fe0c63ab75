use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Source label for the hardcoded fallback record.
pub const DEFAULT_SOURCE: &str = "Default";
/// Source label for the record written when a run itself fails.
pub const FAILURE_SOURCE: &str = "Error";
/// Reason attached to the hardcoded fallback record.
pub const DEFAULT_REASON: &str = "Unable to fetch current status";
/// Reason for a full-staff answer from a source that lists active notices.
pub const NO_ACTIVE_NOTICES: &str = "no active notices";
/// Appended to the reason of a record carried over from the previous run.
pub const LAST_KNOWN_SUFFIX: &str = " (last known status)";

/// Case-insensitive markers that classify text as a half-staff notice.
pub const HALF_STAFF_MARKERS: &[&str] = &["half-staff", "half staff"];

/// True if `text` mentions half-staff in either spelling.
pub fn mentions_half_staff(text: &str) -> bool {
    let lower = text.to_lowercase();
    HALF_STAFF_MARKERS.iter().any(|m| lower.contains(m))
}

// ---------------------------------------------------------------------------
// FlagStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum FlagStatus {
    FullStaff,
    HalfStaff,
}

impl FlagStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagStatus::FullStaff => "full-staff",
            FlagStatus::HalfStaff => "half-staff",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "full-staff" => Some(FlagStatus::FullStaff),
            "half-staff" => Some(FlagStatus::HalfStaff),
            _ => None,
        }
    }
}

impl fmt::Display for FlagStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// StatusRecord
// ---------------------------------------------------------------------------

/// The authoritative flag status document written to every sink.
///
/// Field order here is the field order on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StatusRecord {
    pub status: FlagStatus,
    pub last_updated: DateTime<Utc>,
    pub source: String,
    pub reason: String,
    pub expires: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proclamation_url: Option<String>,
}

impl StatusRecord {
    /// The hardcoded full-staff record used when nothing else is available.
    pub fn default_status(reason: &str) -> Self {
        Self {
            status: FlagStatus::FullStaff,
            last_updated: Utc::now(),
            source: DEFAULT_SOURCE.to_string(),
            reason: reason.to_string(),
            expires: None,
            proclamation_url: None,
        }
    }

    /// Record written in place of the resolved one when the run fails late.
    /// Keeps the status that was resolved; the source names the failure.
    pub fn failure(status: FlagStatus, reason: impl Into<String>) -> Self {
        Self {
            status,
            last_updated: Utc::now(),
            source: FAILURE_SOURCE.to_string(),
            reason: reason.into(),
            expires: None,
            proclamation_url: None,
        }
    }

    pub fn is_default(&self) -> bool {
        self.source == DEFAULT_SOURCE
    }

    pub fn is_failure(&self) -> bool {
        self.source == FAILURE_SOURCE
    }

    /// Re-stamp a previously persisted record for reuse as the last known status.
    pub fn into_last_known(mut self) -> Self {
        self.last_updated = Utc::now();
        if !self.reason.ends_with(LAST_KNOWN_SUFFIX) {
            self.reason.push_str(LAST_KNOWN_SUFFIX);
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// An unvalidated status record, as emitted by a source adapter or read back
/// from disk. Only `validate()` turns one into a `StatusRecord`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub expires: Option<String>,
    #[serde(default)]
    pub proclamation_url: Option<String>,
}

impl Candidate {
    /// A freshly observed status, stamped with the current time.
    pub fn observed(status: FlagStatus, source: &str, reason: impl Into<String>) -> Self {
        Self {
            status: Some(status.as_str().to_string()),
            last_updated: Some(Utc::now().to_rfc3339()),
            source: Some(source.to_string()),
            reason: Some(reason.into()),
            expires: None,
            proclamation_url: None,
        }
    }

    pub fn with_proclamation_url(mut self, url: impl Into<String>) -> Self {
        self.proclamation_url = Some(url.into());
        self
    }
}

impl From<&StatusRecord> for Candidate {
    fn from(record: &StatusRecord) -> Self {
        Self {
            status: Some(record.status.as_str().to_string()),
            last_updated: Some(record.last_updated.to_rfc3339()),
            source: Some(record.source.clone()),
            reason: Some(record.reason.clone()),
            expires: record.expires.map(|e| e.to_rfc3339()),
            proclamation_url: record.proclamation_url.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// BadgeSummary
// ---------------------------------------------------------------------------

pub const BADGE_SCHEMA_VERSION: u32 = 1;
pub const BADGE_LABEL: &str = "flag status";

/// Shields-style endpoint badge derived from a status record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BadgeSummary {
    pub schema_version: u32,
    pub label: String,
    pub message: String,
    pub color: String,
}

impl BadgeSummary {
    pub fn for_status(status: FlagStatus) -> Self {
        let color = match status {
            FlagStatus::FullStaff => "brightgreen",
            FlagStatus::HalfStaff => "orange",
        };
        Self::new(status.as_str(), color)
    }

    pub fn unknown() -> Self {
        Self::new("unknown", "lightgrey")
    }

    fn new(message: &str, color: &str) -> Self {
        Self {
            schema_version: BADGE_SCHEMA_VERSION,
            label: BADGE_LABEL.to_string(),
            message: message.to_string(),
            color: color.to_string(),
        }
    }
}
