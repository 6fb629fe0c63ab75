use thiserror::Error;

pub type Result<T> = std::result::Result<T, SourceError>;

/// Longest slice of a response body kept for diagnostics.
pub const MAX_LOGGED_BODY: usize = 500;

#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("Timed out fetching {url}")]
    Timeout { url: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP error (status {status}) for {url}")]
    Http {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Parse error for {url}: {message}")]
    Parse { url: String, message: String },
}

impl SourceError {
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout {
                url: url.to_string(),
            }
        } else {
            SourceError::Network {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }

    pub fn http(url: &str, status: u16, body: &str) -> Self {
        SourceError::Http {
            url: url.to_string(),
            status,
            body: truncate(body, MAX_LOGGED_BODY),
        }
    }

    pub fn parse(url: &str, message: impl Into<String>) -> Self {
        SourceError::Parse {
            url: url.to_string(),
            message: message.into(),
        }
    }

    /// Timeouts, connection failures, 5xx and 429 are worth another attempt.
    /// Any other status and all parse failures are final.
    pub fn is_transient(&self) -> bool {
        match self {
            SourceError::Timeout { .. } | SourceError::Network { .. } => true,
            SourceError::Http { status, .. } => *status >= 500 || *status == 429,
            SourceError::Parse { .. } => false,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            SourceError::Timeout { url }
            | SourceError::Network { url, .. }
            | SourceError::Http { url, .. }
            | SourceError::Parse { url, .. } => url,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            SourceError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            SourceError::Http { body, .. } => Some(body),
            _ => None,
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
