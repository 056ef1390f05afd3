//! `retryable-http` wraps an HTTP transport with automatic retry and backoff.
//!
//! Requests are built as [`ReplayableRequest`]s whose bodies can be rewound,
//! then sent through [`RetryClient::execute`], which:
//! - rewinds the body before every attempt,
//! - asks a [`RetryPolicy`] whether the outcome warrants another attempt,
//! - drains the body of every discarded response,
//! - waits for the interval computed by a [`Backoff`] strategy.
//!
//! The transport defaults to [`reqwest::Client`]; any [`Transport`] works.

mod backoff;
mod client;
mod error;
mod options;
mod policy;
mod request;
mod transport;

pub use backoff::{Backoff, ExponentialBackoff, LastResponse};
pub use client::RetryClient;
pub use error::{BoxError, RetryError};
pub use options::RetryOptions;
pub use policy::{DefaultRetryPolicy, Outcome, RetryDecision, RetryPolicy};
pub use request::{ReplayBody, ReplayableRequest, RequestParts};
pub use tokio_util::sync::CancellationToken;
pub use transport::{Transport, TransportResponse};

pub type Result<T> = std::result::Result<T, RetryError>;
