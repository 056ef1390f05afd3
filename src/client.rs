use std::{
    fmt,
    future::Future,
    io::{Read, Seek},
};

use reqwest::Method;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::{
    error::BoxError,
    policy::{Outcome, RetryDecision},
    Backoff, DefaultRetryPolicy, LastResponse, ExponentialBackoff, ReplayBody, ReplayableRequest, Result,
    RetryError, RetryOptions, RetryPolicy, Transport, TransportResponse,
};

#[derive(Clone)]
/// HTTP client that replays failed requests with backoff.
///
/// The transport, retry policy and backoff strategy are injected at
/// construction. The client keeps no per-call state, so one instance can
/// serve concurrent calls when its parts allow it.
pub struct RetryClient<T = reqwest::Client, P = DefaultRetryPolicy, B = ExponentialBackoff> {
    transport: T,
    policy: P,
    backoff: B,
    options: RetryOptions,
}

impl<T, P, B> fmt::Debug for RetryClient<T, P, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryClient")
            .field("transport", &std::any::type_name::<T>())
            .field("policy", &std::any::type_name::<P>())
            .field("backoff", &std::any::type_name::<B>())
            .field("options", &self.options)
            .finish()
    }
}

impl RetryClient {
    /// Creates a client over a default `reqwest::Client`.
    pub fn new() -> Self {
        Self::with_transport(reqwest::Client::new())
    }
}

impl Default for RetryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> RetryClient<T> {
    /// Creates a client over any [`Transport`] with the default policy,
    /// backoff and options.
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            policy: DefaultRetryPolicy,
            backoff: ExponentialBackoff,
            options: RetryOptions::default(),
        }
    }
}

impl<T, P, B> RetryClient<T, P, B> {
    /// Applies retry budget and backoff bounds.
    pub fn with_options(mut self, opts: RetryOptions) -> Self {
        self.options = opts;
        self
    }

    /// Replaces the retry policy.
    pub fn with_policy<Q: RetryPolicy>(self, policy: Q) -> RetryClient<T, Q, B> {
        RetryClient {
            transport: self.transport,
            policy,
            backoff: self.backoff,
            options: self.options,
        }
    }

    /// Replaces the backoff strategy.
    pub fn with_backoff<C: Backoff>(self, backoff: C) -> RetryClient<T, P, C> {
        RetryClient {
            transport: self.transport,
            policy: self.policy,
            backoff,
            options: self.options,
        }
    }

    pub fn options(&self) -> &RetryOptions {
        &self.options
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T, P, B> RetryClient<T, P, B>
where
    T: Transport,
    P: RetryPolicy,
    B: Backoff,
{
    /// Sends a bodyless `GET` request.
    pub async fn get(&self, url: &str) -> Result<T::Response> {
        let request = ReplayableRequest::new(Method::GET, url)?;
        self.execute(request).await
    }

    /// Sends a `POST` request with a seekable body and `Content-Type` header.
    pub async fn post<R>(&self, url: &str, content_type: &str, body: R) -> Result<T::Response>
    where
        R: Read + Seek + Send + 'static,
    {
        let request = ReplayableRequest::new(Method::POST, url)?
            .content_type(content_type)?
            .with_body(body);
        self.execute(request).await
    }

    /// Sends the request, retrying as long as the policy asks for it and the
    /// budget allows.
    ///
    /// The body is rewound before every attempt; a rewind failure returns
    /// [`RetryError::Replay`] without consulting the policy. Bodies of
    /// discarded responses are drained and closed before the next attempt.
    /// Once `retries_max + 1` attempts have all asked for a retry,
    /// [`RetryError::Exhausted`] is returned.
    pub async fn execute(&self, request: ReplayableRequest) -> Result<T::Response> {
        self.run(request, None).await
    }

    /// Like [`RetryClient::execute`], but returns [`RetryError::Cancelled`] as
    /// soon as `cancel` fires, whether a round trip or a backoff wait is in
    /// progress.
    pub async fn execute_with_cancel(
        &self,
        request: ReplayableRequest,
        cancel: &CancellationToken,
    ) -> Result<T::Response> {
        self.run(request, Some(cancel)).await
    }

    async fn run(
        &self,
        mut request: ReplayableRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<T::Response> {
        self.options.validate()?;

        let mut attempt = 0u32;
        loop {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                return Err(RetryError::Cancelled);
            }

            let body: Option<&mut dyn ReplayBody> = match request.body.as_mut() {
                Some(body) => {
                    body.rewind().map_err(RetryError::Replay)?;
                    Some(&mut **body)
                }
                None => None,
            };

            let result =
                cancellable(cancel, self.transport.round_trip(&request.parts, body)).await?;

            let outcome = match &result {
                Ok(response) => Outcome::Status(response.status()),
                Err(err) => Outcome::Error(&**err),
            };
            let last = match self.policy.check(outcome) {
                RetryDecision::Stop => return result.map_err(RetryError::Transport),
                RetryDecision::Abort(err) => return Err(RetryError::Policy(err)),
                RetryDecision::Retry => self.discard(result).await,
            };

            if attempt >= self.options.retries_max {
                let attempts = self.options.retries_max.saturating_add(1);

                #[cfg(feature = "tracing")]
                tracing::debug!(
                    method = %request.parts.method,
                    url = %request.parts.url,
                    attempts,
                    "giving up on request"
                );

                return Err(RetryError::Exhausted {
                    method: request.parts.method.clone(),
                    url: request.parts.url.clone(),
                    attempts,
                });
            }

            let wait = self.backoff.wait(
                self.options.retry_wait_min,
                self.options.retry_wait_max,
                attempt,
                last.as_ref(),
            );

            #[cfg(feature = "tracing")]
            tracing::debug!(
                attempt,
                status = ?last.as_ref().and_then(|last| last.status),
                "retrying request after {} ms",
                wait.as_millis()
            );

            cancellable(cancel, sleep(wait)).await?;
            attempt += 1;
        }
    }

    /// Releases a retried outcome and keeps what the backoff may inspect.
    async fn discard(
        &self,
        result: std::result::Result<T::Response, BoxError>,
    ) -> Option<LastResponse> {
        match result {
            Ok(response) => {
                let last = LastResponse {
                    status: response.status(),
                    headers: response.headers().cloned().unwrap_or_default(),
                };
                // Drain errors cannot change the retry outcome.
                let _ = response.drain(self.options.drain_limit).await;
                Some(last)
            }
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %_err, "discarding transport error");
                None
            }
        }
    }
}

async fn cancellable<F: Future>(cancel: Option<&CancellationToken>, fut: F) -> Result<F::Output> {
    match cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(RetryError::Cancelled),
            output = fut => Ok(output),
        },
        None => Ok(fut.await),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::RetryClient;
    use crate::RetryOptions;

    #[test]
    fn new_uses_default_options() {
        let client = RetryClient::new();
        assert_eq!(client.options(), &RetryOptions::default());
    }

    #[test]
    fn with_options_replaces_options() {
        let opts = RetryOptions {
            retries_max: 0,
            retry_wait_min: Duration::ZERO,
            ..RetryOptions::default()
        };
        let client = RetryClient::new().with_options(opts.clone());
        assert_eq!(client.options(), &opts);
    }

    #[test]
    fn debug_names_strategies() {
        let debug = format!("{:?}", RetryClient::new());
        assert!(debug.contains("DefaultRetryPolicy"));
        assert!(debug.contains("ExponentialBackoff"));
        assert!(debug.contains("retries_max: 5"));
    }
}
