use std::io;

use reqwest::{Method, Url};

/// Boxed error produced by transports and retry policies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum RetryError {
    /// Round-trip failure reported by the transport on the final attempt.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),
    /// Request body could not be rewound, so the request cannot be resent.
    #[error("request body could not be rewound: {0}")]
    Replay(#[source] io::Error),
    /// Error supplied by a retry policy alongside a stop decision.
    #[error("retry policy error: {0}")]
    Policy(#[source] BoxError),
    /// Every attempt produced a retryable outcome.
    #[error("{method} {url} giving up after {attempts} attempts")]
    Exhausted {
        /// HTTP method of the abandoned request.
        method: Method,
        /// Target URL of the abandoned request.
        url: Url,
        /// Total number of attempts performed.
        attempts: u32,
    },
    /// The cancellation token fired during a round trip or a backoff wait.
    #[error("request cancelled")]
    Cancelled,
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    #[error("invalid retry options: {0}")]
    InvalidOptions(String),
}

impl RetryError {
    /// Returns the attempt count if the retry budget was exhausted.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::Exhausted { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}
