use std::future::Future;

use reqwest::{header::HeaderMap, StatusCode};

use crate::{error::BoxError, request::RequestParts, ReplayBody};

/// Performs a single request/response round trip.
///
/// The body, when present, has already been rewound to its origin.
/// Implemented for [`reqwest::Client`].
pub trait Transport {
    type Response: TransportResponse;

    fn round_trip(
        &self,
        parts: &RequestParts,
        body: Option<&mut dyn ReplayBody>,
    ) -> impl Future<Output = Result<Self::Response, BoxError>> + Send;
}

/// Response handle produced by a [`Transport`].
pub trait TransportResponse: Send {
    /// Status of the response; `None` means no response was obtained.
    fn status(&self) -> Option<StatusCode>;

    /// Response headers, handed to the backoff once the body is drained.
    fn headers(&self) -> Option<&HeaderMap> {
        None
    }

    /// Reads and discards up to `limit` bytes of the body, then closes it.
    fn drain(self, limit: u64) -> impl Future<Output = Result<(), BoxError>> + Send;
}

impl Transport for reqwest::Client {
    type Response = reqwest::Response;

    fn round_trip(
        &self,
        parts: &RequestParts,
        body: Option<&mut dyn ReplayBody>,
    ) -> impl Future<Output = Result<Self::Response, BoxError>> + Send {
        let builder = self
            .request(parts.method.clone(), parts.url.clone())
            .headers(parts.headers.clone());
        let payload = body
            .map(|body| {
                let mut buf = Vec::new();
                body.read_to_end(&mut buf).map(|_| buf)
            })
            .transpose();

        async move {
            let builder = match payload {
                Ok(Some(bytes)) => builder.body(bytes),
                Ok(None) => builder,
                Err(err) => return Err(BoxError::from(err)),
            };
            builder.send().await.map_err(BoxError::from)
        }
    }
}

impl TransportResponse for reqwest::Response {
    fn status(&self) -> Option<StatusCode> {
        Some(reqwest::Response::status(self))
    }

    fn headers(&self) -> Option<&HeaderMap> {
        Some(reqwest::Response::headers(self))
    }

    fn drain(mut self, limit: u64) -> impl Future<Output = Result<(), BoxError>> + Send {
        async move {
            let mut read = 0u64;
            while read < limit {
                match self.chunk().await {
                    Ok(Some(chunk)) => read = read.saturating_add(chunk.len() as u64),
                    Ok(None) => break,
                    Err(err) => return Err(BoxError::from(err)),
                }
            }
            Ok(())
        }
    }
}
