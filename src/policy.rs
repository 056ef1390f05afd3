use std::error::Error;

use reqwest::StatusCode;

use crate::error::BoxError;

/// Result of a single attempt, as seen by a [`RetryPolicy`].
///
/// The policy never gets the response itself, only its status, so it
/// cannot consume or close the body.
#[derive(Clone, Copy, Debug)]
pub enum Outcome<'a> {
    /// A response was produced. `None` means the transport returned a
    /// response without a status, which counts as no response.
    Status(Option<StatusCode>),
    /// The round trip failed.
    Error(&'a (dyn Error + Send + Sync + 'static)),
}

/// What the executor does after an attempt.
#[derive(Debug)]
pub enum RetryDecision {
    /// Discard the outcome and try again if the budget allows.
    Retry,
    /// Hand the outcome to the caller as is.
    Stop,
    /// Stop and return this error instead of the outcome.
    Abort(BoxError),
}

/// Decides whether an attempt warrants another one.
///
/// Implemented for any `Fn(Outcome<'_>) -> RetryDecision`.
pub trait RetryPolicy {
    fn check(&self, outcome: Outcome<'_>) -> RetryDecision;
}

impl<F> RetryPolicy for F
where
    F: Fn(Outcome<'_>) -> RetryDecision,
{
    fn check(&self, outcome: Outcome<'_>) -> RetryDecision {
        self(outcome)
    }
}

/// Retries transport errors, missing statuses and 5xx responses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DefaultRetryPolicy;

impl RetryPolicy for DefaultRetryPolicy {
    fn check(&self, outcome: Outcome<'_>) -> RetryDecision {
        match outcome {
            Outcome::Error(_) => RetryDecision::Retry,
            Outcome::Status(None) => RetryDecision::Retry,
            // Not `is_server_error`: 600..=999 are valid codes and still retried.
            Outcome::Status(Some(status)) if status.as_u16() >= 500 => RetryDecision::Retry,
            Outcome::Status(Some(_)) => RetryDecision::Stop,
        }
    }
}
