//! Convenience wrappers around the Elasticsearch REST API

use crate::elasticsearch_api;
use crate::transport::{Method, Request, Response, Transport, TransportError};
use bytes::Bytes;
use elasticsearch::http::StatusCode;
use serde_json::Value;
use slog::Logger;
use thiserror::Error;

/// Wrapped Elasticsearch client struct.
/// Holds no mutable state, so a single instance
/// can be shared between tasks for the lifetime of the process.
pub struct Client<T> {
    transport: T,
    logger: Logger,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("sending request to elasticsearch failed")]
    Transport(#[from] TransportError),
    /// The server answered with an error status;
    /// the message is the raw response body
    #[error("{body}")]
    Application { status: StatusCode, body: String },
    #[error("failed to decode response body from elasticsearch")]
    Decode(#[source] serde_json::Error),
}

impl Error {
    /// The status code of an application error
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Application { status, .. } => Some(*status),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }
}

/// Anything above `201 Created` is treated as a failed operation
fn is_application_error(status: StatusCode) -> bool {
    status.as_u16() > StatusCode::CREATED.as_u16()
}

#[derive(Clone, Debug)]
pub struct BulkStatus {
    pub took: i64,
    pub errors: bool,
    pub items: Vec<BulkItem>,
}

#[derive(Clone, Debug)]
pub enum BulkItem {
    Create(elasticsearch_api::bulk::ResultItemAction),
    Delete(elasticsearch_api::bulk::ResultItemAction),
    Index(elasticsearch_api::bulk::ResultItemAction),
    Update(elasticsearch_api::bulk::ResultItemAction),
}

impl BulkItem {
    pub const fn action(&self) -> &elasticsearch_api::bulk::ResultItemAction {
        match self {
            Self::Create(action) | Self::Delete(action) | Self::Index(action) | Self::Update(action) => {
                action
            }
        }
    }

    pub fn is_failure(&self) -> bool {
        let action = self.action();
        action.error.is_some() || is_application_error(action.status)
    }
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T, logger: Logger) -> Self {
        Self { transport, logger }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends the request, turning error statuses into `Error::Application`
    async fn send(&self, request: Request) -> Result<Response, Error> {
        let method = request.method;
        let path = request.path_and_query();
        slog::debug!(self.logger, "sending request to Elasticsearch"; "method" => %method, "path" => &path);

        let response = self.transport.send(request).await?;
        let status = response.status;
        slog::debug!(self.logger, "received response from Elasticsearch"; "path" => &path, "status" => status.as_u16());

        if is_application_error(status) {
            let body = response.text();
            slog::warn!(
                self.logger,
                "elasticsearch returned an error status";
                "method" => %method,
                "path" => &path,
                "status" => status.as_u16(),
                "body" => &body,
            );
            return Err(Error::Application { status, body });
        }

        Ok(response)
    }

    /// Pings the remote Elasticsearch,
    /// returning `Ok(())` if the ping was successful.
    pub async fn ping(&self) -> Result<(), Error> {
        self.send(Request::new(Method::Get, "/")).await?;
        Ok(())
    }

    /// Creates the index, using `mapping` as the settings/mappings body.
    /// An empty mapping creates the index with the server defaults.
    pub async fn create_index(&self, name: &str, mapping: impl Into<Bytes>) -> Result<(), Error> {
        let mapping = mapping.into();
        let mut request = Request::new(Method::Put, format!("/{}", name));
        if !mapping.is_empty() {
            request = request.body(mapping);
        }

        self.send(request).await?;
        slog::info!(self.logger, "created index"; "index" => name);
        Ok(())
    }

    pub async fn delete_index(&self, name: &str) -> Result<(), Error> {
        self.send(Request::new(Method::Delete, format!("/{}", name)))
            .await?;
        slog::info!(self.logger, "deleted index"; "index" => name);
        Ok(())
    }

    /// Checks whether the index exists.
    /// Only a `200 OK` counts as existing;
    /// every other status (including error statuses) is `Ok(false)`.
    pub async fn index_exists(&self, name: &str) -> Result<bool, Error> {
        let request = Request::new(Method::Head, format!("/{}", name));
        let response = self.transport.send(request).await?;
        slog::debug!(self.logger, "checked index existence"; "index" => name, "status" => response.status.as_u16());
        Ok(response.status == StatusCode::OK)
    }

    /// Adds a JSON document to the index under the given type.
    /// Without an ID the server generates one (`POST`);
    /// with an ID the document is created or replaced (`PUT`).
    pub async fn insert_document(
        &self,
        index: &str,
        doc_type: &str,
        id: Option<&str>,
        data: impl Into<Bytes>,
    ) -> Result<(), Error> {
        let request = match id {
            Some(id) => Request::new(Method::Put, format!("/{}/{}/{}", index, doc_type, id)),
            None => Request::new(Method::Post, format!("/{}/{}", index, doc_type)),
        };

        self.send(request.body(data)).await?;
        Ok(())
    }

    /// Sends a caller-assembled bulk payload
    /// (see `crate::bulk` for an optional way of building one).
    /// Failures of individual items are reported in the returned status
    /// rather than as an error.
    pub async fn bulk_insert_documents(&self, data: impl Into<Bytes>) -> Result<BulkStatus, Error> {
        let request = Request::new(Method::Post, "/_bulk").body(data);
        let response = self.send(request).await?;

        // Try to decode the response body using the hand-made bindings
        let response_struct =
            serde_json::from_slice::<elasticsearch_api::bulk::Response>(&response.body)
                .map_err(Error::Decode)?;
        let status = self.convert_to_status(response_struct);

        if status.errors {
            let failed = status.items.iter().filter(|item| item.is_failure()).count();
            slog::warn!(
                self.logger,
                "bulk request contained failed items";
                "failed" => failed,
                "total" => status.items.len(),
            );
        }

        Ok(status)
    }

    fn convert_to_status(&self, response: elasticsearch_api::bulk::Response) -> BulkStatus {
        let elasticsearch_api::bulk::Response {
            took,
            errors,
            items: raw_items,
        } = response;

        let mut items = Vec::<BulkItem>::with_capacity(raw_items.len());
        for raw_item in raw_items {
            let actions = vec![
                raw_item.create.map(BulkItem::Create),
                raw_item.delete.map(BulkItem::Delete),
                raw_item.index.map(BulkItem::Index),
                raw_item.update.map(BulkItem::Update),
            ];
            let mut actions = actions.into_iter().flatten();

            match actions.next() {
                Some(item) => items.push(item),
                None => {
                    slog::warn!(self.logger, "bulk response from elasticsearch contained an item without an action";);
                    continue;
                }
            }

            for extra in actions {
                slog::warn!(
                    self.logger,
                    "bulk response from elasticsearch contained more than one action in an item";
                    "last_action" => ?items.last(),
                    "this_action" => ?extra,
                );
                items.push(extra);
            }
        }

        BulkStatus {
            took,
            errors,
            items,
        }
    }

    /// Returns the `_source` of up to `max_results` documents of the given type.
    /// A negative `max_results` leaves the page size up to the server.
    pub async fn find_documents(
        &self,
        index: &str,
        doc_type: &str,
        max_results: i64,
    ) -> Result<Vec<Value>, Error> {
        let mut request = Request::new(Method::Get, format!("/{}/{}/_search", index, doc_type));
        if max_results >= 0 {
            request = request.query("size", max_results);
        }

        let response = self.search_request(request).await?;
        Ok(response.into_sources())
    }

    /// Runs a query DSL search against the index,
    /// returning the `_source` of each hit in order
    pub async fn search(&self, index: &str, query: &Value) -> Result<Vec<Value>, Error> {
        Ok(self.search_response(index, query).await?.into_sources())
    }

    /// Like `search`, but keeps the entire response envelope
    pub async fn search_response(
        &self,
        index: &str,
        query: &Value,
    ) -> Result<elasticsearch_api::search::Response, Error> {
        let request =
            Request::new(Method::Post, format!("/{}/_search", index)).body(query.to_string());
        self.search_request(request).await
    }

    async fn search_request(
        &self,
        request: Request,
    ) -> Result<elasticsearch_api::search::Response, Error> {
        let response = self.send(request).await?;
        let response_struct =
            serde_json::from_slice::<elasticsearch_api::search::Response>(&response.body)
                .map_err(Error::Decode)?;

        slog::debug!(
            self.logger,
            "decoded search response";
            "hits" => response_struct.hits.hits.len(),
            "took" => ?response_struct.took,
        );
        Ok(response_struct)
    }
}
