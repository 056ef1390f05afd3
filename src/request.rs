use std::{
    fmt,
    io::{self, Cursor, Read, Seek},
};

use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE},
    Method, Url,
};

use crate::{Result, RetryError};

/// Request body that can be rewound to its origin and read again.
///
/// Blanket-implemented for every `Read + Seek + Send` type, so a
/// `Cursor<Vec<u8>>` or a `std::fs::File` can be used directly.
pub trait ReplayBody: Read + Send {
    /// Moves the read position back to the start of the body.
    fn rewind(&mut self) -> io::Result<()>;
}

impl<T: Read + Seek + Send> ReplayBody for T {
    fn rewind(&mut self) -> io::Result<()> {
        Seek::rewind(self)
    }
}

/// Method, target and headers of an outbound request.
#[derive(Clone, Debug)]
pub struct RequestParts {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
}

/// Outbound request whose body is rewound before every attempt.
pub struct ReplayableRequest {
    pub(crate) parts: RequestParts,
    pub(crate) body: Option<Box<dyn ReplayBody>>,
}

impl fmt::Debug for ReplayableRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplayableRequest")
            .field("method", &self.parts.method)
            .field("url", &self.parts.url.as_str())
            .field("headers", &self.parts.headers)
            .field("body", &self.body.as_ref().map(|_| "<body>"))
            .finish()
    }
}

impl ReplayableRequest {
    /// Creates a bodyless request.
    ///
    /// The URL is parsed here, so a malformed target fails before any
    /// attempt is made.
    pub fn new(method: Method, url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|err| RetryError::InvalidUrl(format!("{url}: {err}")))?;
        Ok(Self {
            parts: RequestParts {
                method,
                url,
                headers: HeaderMap::new(),
            },
            body: None,
        })
    }

    /// Attaches a seekable body, replacing any previous one.
    pub fn with_body<B>(mut self, body: B) -> Self
    where
        B: Read + Seek + Send + 'static,
    {
        self.body = Some(Box::new(body));
        self
    }

    /// Attaches an in-memory body.
    pub fn with_bytes(self, bytes: impl Into<Vec<u8>>) -> Self {
        self.with_body(Cursor::new(bytes.into()))
    }

    /// Sets a header, replacing existing values for the same name.
    pub fn header(mut self, name: HeaderName, value: &str) -> Result<Self> {
        let value = HeaderValue::from_str(value)
            .map_err(|err| RetryError::InvalidHeader(format!("{name}: {err}")))?;
        self.parts.headers.insert(name, value);
        Ok(self)
    }

    /// Sets the `Content-Type` header.
    pub fn content_type(self, value: &str) -> Result<Self> {
        self.header(CONTENT_TYPE, value)
    }

    pub fn parts(&self) -> &RequestParts {
        &self.parts
    }

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn url(&self) -> &Url {
        &self.parts.url
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }
}
