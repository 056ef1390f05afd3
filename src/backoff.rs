use std::time::Duration;

use reqwest::{
    header::{HeaderMap, RETRY_AFTER},
    StatusCode,
};

/// Status and headers of a discarded response, kept for the backoff after
/// its body has been drained.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LastResponse {
    /// `None` when the transport returned a response without a status.
    pub status: Option<StatusCode>,
    pub headers: HeaderMap,
}

impl LastResponse {
    /// Parses a `Retry-After` header given in delta-seconds.
    ///
    /// HTTP-date values are not interpreted and yield `None`.
    pub fn retry_after(&self) -> Option<Duration> {
        self.headers
            .get(RETRY_AFTER)?
            .to_str()
            .ok()?
            .trim()
            .parse()
            .ok()
            .map(Duration::from_secs)
    }
}

/// Computes the wait inserted between a failed attempt and the next one.
///
/// `attempt` is 0 for the wait that follows the first failed attempt.
/// `last` describes the discarded response; it is `None` when the attempt
/// failed with a transport error.
///
/// Implemented for any `Fn(Duration, Duration, u32, Option<&LastResponse>) -> Duration`.
pub trait Backoff {
    fn wait(
        &self,
        min: Duration,
        max: Duration,
        attempt: u32,
        last: Option<&LastResponse>,
    ) -> Duration;
}

impl<F> Backoff for F
where
    F: Fn(Duration, Duration, u32, Option<&LastResponse>) -> Duration,
{
    fn wait(
        &self,
        min: Duration,
        max: Duration,
        attempt: u32,
        last: Option<&LastResponse>,
    ) -> Duration {
        self(min, max, attempt, last)
    }
}

/// `min * 2^attempt`, capped at `max`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExponentialBackoff;

impl Backoff for ExponentialBackoff {
    fn wait(
        &self,
        min: Duration,
        max: Duration,
        attempt: u32,
        _last: Option<&LastResponse>,
    ) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| min.checked_mul(factor))
            .map_or(max, |wait| wait.min(max))
    }
}
