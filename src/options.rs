use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Result, RetryError};

const DEFAULT_RETRY_WAIT_MIN: Duration = Duration::from_millis(50);
const DEFAULT_RETRY_WAIT_MAX: Duration = Duration::from_millis(200);
const DEFAULT_RETRIES_MAX: u32 = 5;
const DEFAULT_DRAIN_LIMIT: u64 = 1 << 20;

/// Configures retry budget, backoff bounds and body draining.
///
/// Durations are (de)serialized as whole milliseconds under `*_ms` keys;
/// missing keys fall back to [`RetryOptions::default`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryOptions {
    /// Lower bound handed to the backoff strategy.
    #[serde(rename = "retry_wait_min_ms", with = "millis")]
    pub retry_wait_min: Duration,
    /// Upper bound handed to the backoff strategy.
    #[serde(rename = "retry_wait_max_ms", with = "millis")]
    pub retry_wait_max: Duration,
    /// Maximum number of retries after the initial attempt.
    pub retries_max: u32,
    /// Maximum bytes read from a discarded response body before it is closed.
    pub drain_limit: u64,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            retry_wait_min: DEFAULT_RETRY_WAIT_MIN,
            retry_wait_max: DEFAULT_RETRY_WAIT_MAX,
            retries_max: DEFAULT_RETRIES_MAX,
            drain_limit: DEFAULT_DRAIN_LIMIT,
        }
    }
}

impl RetryOptions {
    /// Reads options from environment variables.
    ///
    /// Reads:
    /// - `RETRY_WAIT_MIN_MS`
    /// - `RETRY_WAIT_MAX_MS`
    /// - `RETRIES_MAX`
    /// - `RETRY_DRAIN_LIMIT`
    ///
    /// Unset variables keep their default. Values that do not parse, or a
    /// minimum wait above the maximum, are reported as
    /// [`RetryError::InvalidOptions`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut opts = Self::default();
        if let Some(ms) = parse_var::<u64>(&lookup, "RETRY_WAIT_MIN_MS")? {
            opts.retry_wait_min = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "RETRY_WAIT_MAX_MS")? {
            opts.retry_wait_max = Duration::from_millis(ms);
        }
        if let Some(retries) = parse_var(&lookup, "RETRIES_MAX")? {
            opts.retries_max = retries;
        }
        if let Some(limit) = parse_var(&lookup, "RETRY_DRAIN_LIMIT")? {
            opts.drain_limit = limit;
        }
        opts.validate()?;
        Ok(opts)
    }

    /// Checks that the minimum wait does not exceed the maximum wait.
    pub fn validate(&self) -> Result<()> {
        if self.retry_wait_min > self.retry_wait_max {
            return Err(RetryError::InvalidOptions(format!(
                "retry_wait_min ({:?}) exceeds retry_wait_max ({:?})",
                self.retry_wait_min, self.retry_wait_max
            )));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse()
        .map(Some)
        .map_err(|_| RetryError::InvalidOptions(format!("{key} is not a valid number: {raw}")))
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
