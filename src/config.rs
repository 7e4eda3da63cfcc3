use std::env;
use tracing::warn;

/// 24 hours, the window used when RUN_FREQUENCY is missing or unusable.
pub const DEFAULT_RUN_FREQUENCY_SECS: i64 = 86_400;

/// Per-run settings, resolved once at run start and threaded as a parameter
/// from there on. Nothing re-reads the environment mid-run.
#[derive(Debug, Clone, Copy)]
pub struct RunConfig {
    /// Width of the recency window in seconds: an item is "new" iff it was
    /// published less than this long ago.
    pub run_frequency_secs: i64,
}

impl RunConfig {
    pub fn from_env() -> Self {
        let raw = env::var("RUN_FREQUENCY").ok();
        Self::from_raw(raw.as_deref())
    }

    /// Resolves the run frequency from a raw environment value. Missing,
    /// non-numeric, non-finite, or non-positive values fall back to the
    /// default with a warning rather than failing the run.
    pub fn from_raw(raw: Option<&str>) -> Self {
        let parsed = raw.and_then(|s| s.trim().parse::<f64>().ok());
        match parsed {
            Some(secs) if secs.is_finite() && secs > 0.0 => Self {
                run_frequency_secs: secs as i64,
            },
            _ => {
                warn!(
                    value = raw.unwrap_or("<unset>"),
                    "invalid or missing RUN_FREQUENCY, falling back to {} seconds",
                    DEFAULT_RUN_FREQUENCY_SECS
                );
                Self {
                    run_frequency_secs: DEFAULT_RUN_FREQUENCY_SECS,
                }
            }
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            run_frequency_secs: DEFAULT_RUN_FREQUENCY_SECS,
        }
    }
}

/// HTTP settings for the feed fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "feed-courier/0.1".to_string(),
            timeout_seconds: 30,
        }
    }
}
