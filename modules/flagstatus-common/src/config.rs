use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::info;

use crate::error::FlagStatusError;

pub const DEFAULT_HALFSTAFF_API_URL: &str = "https://halfstaff.org/wp-json/halfstaff/v1/widget";
pub const DEFAULT_WHITEHOUSE_ACTIONS_URL: &str =
    "https://www.whitehouse.gov/briefing-room/presidential-actions/";
pub const DEFAULT_SCRAPE_SELECTOR: &str = ".flag-status";
pub const DEFAULT_SINKS: &str = "flag_status.json,docs/flag_status.json";
pub const DEFAULT_SOURCES: &str = "halfstaff,whitehouse";

/// One entry in the ordered source list. Earlier entries are trusted more.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    HalfStaffApi { url: String, state: Option<String> },
    Feed { url: String },
    Scrape { url: String, selector: String },
    Proclamations { index_url: String },
}

impl SourceConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            SourceConfig::HalfStaffApi { .. } => "halfstaff",
            SourceConfig::Feed { .. } => "feed",
            SourceConfig::Scrape { .. } => "scrape",
            SourceConfig::Proclamations { .. } => "whitehouse",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base: Duration,
    pub min_wait: Duration,
    pub max_wait: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base: Duration::from_secs(1),
            min_wait: Duration::from_secs(4),
            max_wait: Duration::from_secs(10),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub sources: Vec<SourceConfig>,
    pub sinks: Vec<PathBuf>,
    pub http_timeout: Duration,
    pub retry: RetryConfig,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, FlagStatusError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FlagStatusError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let order = get("FLAG_SOURCES").unwrap_or_else(|| DEFAULT_SOURCES.to_string());
        let mut sources = Vec::new();
        for kind in split_list(&order) {
            let kind = kind.to_lowercase();
            let source = match kind.as_str() {
                "halfstaff" => SourceConfig::HalfStaffApi {
                    url: get("HALFSTAFF_API_URL")
                        .unwrap_or_else(|| DEFAULT_HALFSTAFF_API_URL.to_string()),
                    state: get("HALFSTAFF_STATE"),
                },
                "feed" => SourceConfig::Feed {
                    url: required(&get, "FLAG_FEED_URL", &kind)?,
                },
                "scrape" => SourceConfig::Scrape {
                    url: required(&get, "FLAG_SCRAPE_URL", &kind)?,
                    selector: get("FLAG_SCRAPE_SELECTOR")
                        .unwrap_or_else(|| DEFAULT_SCRAPE_SELECTOR.to_string()),
                },
                "whitehouse" => SourceConfig::Proclamations {
                    index_url: get("WHITEHOUSE_ACTIONS_URL")
                        .unwrap_or_else(|| DEFAULT_WHITEHOUSE_ACTIONS_URL.to_string()),
                },
                other => {
                    return Err(FlagStatusError::Config(format!(
                        "unknown source {other:?} in FLAG_SOURCES"
                    )))
                }
            };
            sources.push(source);
        }

        let sinks: Vec<PathBuf> =
            split_list(&get("FLAG_STATUS_SINKS").unwrap_or_else(|| DEFAULT_SINKS.to_string()))
                .into_iter()
                .map(PathBuf::from)
                .collect();
        if sinks.is_empty() {
            return Err(FlagStatusError::Config(
                "FLAG_STATUS_SINKS must name at least one file".into(),
            ));
        }

        let defaults = RetryConfig::default();
        let retry = RetryConfig {
            max_attempts: parse_or(&get, "RETRY_MAX_ATTEMPTS", defaults.max_attempts)?.max(1),
            base: secs_or(&get, "RETRY_BASE_SECS", defaults.base)?,
            min_wait: secs_or(&get, "RETRY_MIN_WAIT_SECS", defaults.min_wait)?,
            max_wait: secs_or(&get, "RETRY_MAX_WAIT_SECS", defaults.max_wait)?,
        };
        if retry.min_wait > retry.max_wait {
            return Err(FlagStatusError::Config(
                "RETRY_MIN_WAIT_SECS must not exceed RETRY_MAX_WAIT_SECS".into(),
            ));
        }

        Ok(Self {
            sources,
            sinks,
            http_timeout: secs_or(&get, "HTTP_TIMEOUT_SECS", Duration::from_secs(10))?,
            retry,
        })
    }

    /// Log the effective configuration. Nothing here is secret, but URLs are
    /// logged without query strings.
    pub fn log_redacted(&self) {
        let sources: Vec<String> = self
            .sources
            .iter()
            .map(|s| match s {
                SourceConfig::HalfStaffApi { url, state } => format!(
                    "halfstaff({}{})",
                    strip_query(url),
                    state.as_deref().map(|st| format!(", state={st}")).unwrap_or_default()
                ),
                SourceConfig::Feed { url } => format!("feed({})", strip_query(url)),
                SourceConfig::Scrape { url, selector } => {
                    format!("scrape({}, {selector})", strip_query(url))
                }
                SourceConfig::Proclamations { index_url } => {
                    format!("whitehouse({})", strip_query(index_url))
                }
            })
            .collect();
        let sinks: Vec<String> = self.sinks.iter().map(|p| p.display().to_string()).collect();

        info!(
            sources = %sources.join(" > "),
            sinks = %sinks.join(", "),
            timeout_secs = self.http_timeout.as_secs(),
            retry_attempts = self.retry.max_attempts,
            "Loaded configuration"
        );
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn required<F>(get: &F, key: &str, kind: &str) -> Result<String, FlagStatusError>
where
    F: Fn(&str) -> Option<String>,
{
    get(key).ok_or_else(|| {
        FlagStatusError::Config(format!("{key} is required when source {kind:?} is enabled"))
    })
}

fn parse_or<F, T>(get: &F, key: &str, default: T) -> Result<T, FlagStatusError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| FlagStatusError::Config(format!("{key} must be a number, got {raw:?}"))),
    }
}

fn secs_or<F>(get: &F, key: &str, default: Duration) -> Result<Duration, FlagStatusError>
where
    F: Fn(&str) -> Option<String>,
{
    parse_or(get, key, default.as_secs()).map(Duration::from_secs)
}

fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
