// Schema validation for status records.
//
// Everything that ends up in a sink passes through here: adapter output,
// records read back from a previous run, and typed records right before a
// write. Invalid input is a value, not an error.

use chrono::{DateTime, Utc};

use crate::types::{Candidate, FlagStatus, StatusRecord};

#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Valid(StatusRecord),
    Invalid(String),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid(_))
    }

    pub fn into_record(self) -> Option<StatusRecord> {
        match self {
            Validation::Valid(record) => Some(record),
            Validation::Invalid(_) => None,
        }
    }
}

/// Check a candidate against the canonical record shape.
pub fn validate(candidate: &Candidate) -> Validation {
    let status = match candidate.status.as_deref() {
        None => return invalid("missing status"),
        Some(raw) => match FlagStatus::parse(raw) {
            Some(s) => s,
            None => return invalid(format!("status {raw:?} is not full-staff or half-staff")),
        },
    };

    let last_updated = match candidate.last_updated.as_deref() {
        None => return invalid("missing last_updated"),
        Some(raw) => match parse_timestamp(raw) {
            Some(ts) => ts,
            None => return invalid(format!("last_updated {raw:?} is not an ISO 8601 timestamp")),
        },
    };

    let source = match candidate.source.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => return invalid("source must be a non-empty string"),
    };

    let expires = match candidate.expires.as_deref() {
        None => None,
        Some(raw) => match parse_timestamp(raw) {
            Some(ts) => Some(ts),
            None => return invalid(format!("expires {raw:?} is not an ISO 8601 timestamp")),
        },
    };

    Validation::Valid(StatusRecord {
        status,
        last_updated,
        source,
        reason: candidate.reason.clone().unwrap_or_default(),
        expires,
        proclamation_url: candidate.proclamation_url.clone(),
    })
}

/// Re-check a record that is already typed. Only `source` can be wrong here.
pub fn validate_record(record: &StatusRecord) -> Validation {
    validate(&Candidate::from(record))
}

/// Parse a JSON document (e.g. a sink file) into a validated record.
pub fn validate_json(raw: &str) -> Validation {
    match serde_json::from_str::<Candidate>(raw) {
        Ok(candidate) => validate(&candidate),
        Err(e) => invalid(format!("not a status document: {e}")),
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn invalid(reason: impl Into<String>) -> Validation {
    Validation::Invalid(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> Candidate {
        Candidate {
            status: Some("half-staff".into()),
            last_updated: Some("2025-01-09T12:00:00+00:00".into()),
            source: Some("HalfStaff.org".into()),
            reason: Some("National Day of Mourning".into()),
            expires: None,
            proclamation_url: None,
        }
    }

    #[test]
    fn well_formed_candidate_is_valid() {
        let record = validate(&candidate()).into_record().unwrap();
        assert_eq!(record.status, FlagStatus::HalfStaff);
        assert_eq!(record.source, "HalfStaff.org");
        assert_eq!(record.reason, "National Day of Mourning");
    }

    #[test]
    fn missing_last_updated_is_invalid() {
        let c = Candidate {
            last_updated: None,
            ..candidate()
        };
        assert_eq!(validate(&c), Validation::Invalid("missing last_updated".into()));
    }

    #[test]
    fn unknown_status_is_invalid() {
        let c = Candidate {
            status: Some("quarter-staff".into()),
            ..candidate()
        };
        assert!(!validate(&c).is_valid());
    }

    #[test]
    fn blank_source_is_invalid() {
        let c = Candidate {
            source: Some("   ".into()),
            ..candidate()
        };
        assert!(!validate(&c).is_valid());
    }

    #[test]
    fn malformed_timestamps_are_invalid() {
        let c = Candidate {
            last_updated: Some("yesterday".into()),
            ..candidate()
        };
        assert!(!validate(&c).is_valid());

        let c = Candidate {
            expires: Some("at sunset".into()),
            ..candidate()
        };
        assert!(!validate(&c).is_valid());
    }

    #[test]
    fn missing_reason_becomes_empty_string() {
        let c = Candidate {
            reason: None,
            ..candidate()
        };
        assert_eq!(validate(&c).into_record().unwrap().reason, "");
    }

    #[test]
    fn json_with_null_expires_is_valid() {
        let raw = r#"{
            "status": "full-staff",
            "last_updated": "2025-03-01T08:30:00.123456+00:00",
            "source": "Default",
            "reason": "Unable to fetch current status",
            "expires": null
        }"#;
        assert!(validate_json(raw).is_valid());
    }

    #[test]
    fn json_with_wrong_types_is_invalid() {
        assert!(!validate_json(r#"{"status": true}"#).is_valid());
        assert!(!validate_json("not json").is_valid());
    }
}
