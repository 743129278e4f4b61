//! Optional helpers for assembling the newline-delimited payload
//! accepted by `Client::bulk_insert_documents`.
//! The client itself never inspects the payload,
//! so callers are free to build it by hand instead.

use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;
use thiserror::Error;

/// Metadata identifying which document an action applies to.
/// Fields left unset are omitted from the action line
/// and fall back to the server's defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BulkTarget {
    #[serde(rename = "_index", skip_serializing_if = "Option::is_none")]
    index: Option<String>,
    #[serde(rename = "_type", skip_serializing_if = "Option::is_none")]
    doc_type: Option<String>,
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<String>,
}

impl BulkTarget {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    #[must_use]
    pub fn doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

#[derive(Clone, Debug)]
pub struct BulkOperation {
    action: Bytes,
    source: Option<Bytes>,
}

#[derive(Error, Debug)]
pub enum MakeBulkOperationError {
    #[error("failed to serialize action JSON object")]
    ActionSerializationFailure(#[source] serde_json::Error),
    #[error("failed to serialize source JSON object")]
    SourceSerializationFailure(#[source] serde_json::Error),
}

impl BulkOperation {
    /// Indexes the document, replacing any existing document with the same ID
    pub fn index(
        target: BulkTarget,
        document: impl Serialize,
    ) -> Result<Self, MakeBulkOperationError> {
        Self::with_source("index", &target, &document)
    }

    /// Indexes the document, failing (per item) if the ID already exists
    pub fn create(
        target: BulkTarget,
        document: impl Serialize,
    ) -> Result<Self, MakeBulkOperationError> {
        Self::with_source("create", &target, &document)
    }

    pub fn delete(target: BulkTarget) -> Result<Self, MakeBulkOperationError> {
        Ok(Self {
            action: action_line("delete", &target)?,
            source: None,
        })
    }

    fn with_source(
        action: &str,
        target: &BulkTarget,
        document: &impl Serialize,
    ) -> Result<Self, MakeBulkOperationError> {
        let action = action_line(action, target)?;
        let source = serde_json::to_vec(document)
            .map(Bytes::from)
            .map_err(MakeBulkOperationError::SourceSerializationFailure)?;

        Ok(Self {
            action,
            source: Some(source),
        })
    }
}

fn action_line(action: &str, target: &BulkTarget) -> Result<Bytes, MakeBulkOperationError> {
    let operation_json_value = serde_json::json!({ action: target });
    serde_json::to_vec(&operation_json_value)
        .map(Bytes::from)
        .map_err(MakeBulkOperationError::ActionSerializationFailure)
}

/// Joins the operations into a bulk payload.
/// Every line, including the last, is terminated by a newline
/// as the bulk endpoint requires.
pub fn to_payload<'a>(operations: impl IntoIterator<Item = &'a BulkOperation>) -> Bytes {
    let mut payload = BytesMut::new();
    for operation in operations {
        payload.put_slice(&operation.action);
        payload.put_u8(b'\n');
        if let Some(source) = &operation.source {
            payload.put_slice(source);
            payload.put_u8(b'\n');
        }
    }
    payload.freeze()
}
