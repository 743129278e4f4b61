//! The seam between the client operations and the HTTP stack.
//! `Client` only ever sees `Request`/`Response` values,
//! so tests can swap the real transport for an in-memory one.

use async_trait::async_trait;
use bytes::Bytes;
use elasticsearch::http::headers::HeaderMap;
use elasticsearch::http::{Method as LibMethod, StatusCode};
use elasticsearch::{Elasticsearch, Error as LibError};
use std::fmt;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
    Head,
}

impl From<Method> for LibMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::Get,
            Method::Put => Self::Put,
            Method::Post => Self::Post,
            Method::Delete => Self::Delete,
            Method::Head => Self::Head,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
        };
        f.write_str(name)
    }
}

/// A single request against the node.
/// `path` is relative to the configured base URL and is used verbatim.
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<Bytes>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn query(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// The path with the query string appended, as it appears in the request line
    pub fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }

        let query = self
            .query
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.path, query)
    }
}

/// A fully-read response
#[derive(Clone, Debug)]
pub struct Response {
    pub status: StatusCode,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Lossily decodes the body as UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("sending request to elasticsearch failed")]
    Failed(#[source] LibError),
    #[error("failed to read response body from elasticsearch")]
    BodyReadFailure(#[source] LibError),
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs one HTTP exchange.
    /// Any status code the server answers with is a successful exchange;
    /// only failures to talk to the server are errors.
    async fn send(&self, request: Request) -> Result<Response, TransportError>;
}

/// Transport backed by the official `elasticsearch` crate,
/// which pools connections internally
pub struct ElasticsearchTransport {
    inner: Elasticsearch,
}

impl ElasticsearchTransport {
    pub fn new(inner: Elasticsearch) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Transport for ElasticsearchTransport {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        let Request {
            method,
            path,
            query,
            body,
        } = request;

        let query = if query.is_empty() {
            None
        } else {
            Some(query.as_slice())
        };

        // Use the untyped send API so that the raw bytes are passed through unchanged.
        // The transport adds `Content-Type: application/json` to every request itself.
        let response = self
            .inner
            .send(method.into(), &path, HeaderMap::new(), query, body, None)
            .await
            .map_err(TransportError::Failed)?;

        let status = response.status_code();
        let body = response
            .bytes()
            .await
            .map_err(TransportError::BodyReadFailure)?;
        Ok(Response::new(status, body))
    }
}
