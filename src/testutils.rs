use crate::transport::{Method, Request, Response, Transport, TransportError};
use async_trait::async_trait;
use elasticsearch::http::StatusCode;
use serde_json::{json, Value};
use sloggers::terminal::{Destination, TerminalLoggerBuilder};
use sloggers::types::{Format, Severity};
use sloggers::Build;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

lazy_static::lazy_static! {
    static ref LOGGER: slog::Logger = {
        let mut builder = TerminalLoggerBuilder::new();
        builder.level(Severity::Info);
        builder.destination(Destination::Stderr);
        builder.format(Format::Full);
        builder.build().unwrap()
    };
}

pub fn logger(test_name: &'static str) -> slog::Logger {
    LOGGER.new(slog::o!("test_name" => test_name))
}

/// Replays canned responses in order and records every request it sees
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Response>>,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Response>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted response left for {:?}", request));
        self.requests.lock().unwrap().push(request);
        Ok(response)
    }
}

struct StoredDocument {
    doc_type: String,
    id: String,
    source: Value,
}

/// Just enough of the Elasticsearch REST API to round-trip
/// index management, inserts, bulk inserts and searches in memory
#[derive(Default)]
pub struct InMemoryCluster {
    indices: Mutex<BTreeMap<String, Vec<StoredDocument>>>,
    next_id: Mutex<u64>,
}

fn reply(status: StatusCode, body: &Value) -> Response {
    Response::new(status, body.to_string())
}

fn index_not_found(index: &str) -> Response {
    reply(
        StatusCode::NOT_FOUND,
        &json!({
            "error": { "type": "index_not_found_exception", "index": index },
            "status": 404
        }),
    )
}

impl InMemoryCluster {
    fn generate_id(&self) -> String {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        format!("generated-{}", *next_id)
    }

    /// Stores the document, returning whether it replaced an existing one
    fn upsert(&self, index: &str, doc_type: &str, id: Option<&str>, source: Value) -> (String, bool) {
        let id = id.map_or_else(|| self.generate_id(), str::to_owned);
        let mut indices = self.indices.lock().unwrap();
        let documents = indices.entry(index.to_owned()).or_default();

        match documents
            .iter_mut()
            .find(|document| document.doc_type == doc_type && document.id == id)
        {
            Some(existing) => {
                existing.source = source;
                (id, true)
            }
            None => {
                documents.push(StoredDocument {
                    doc_type: doc_type.to_owned(),
                    id: id.clone(),
                    source,
                });
                (id, false)
            }
        }
    }

    fn handle(&self, request: &Request) -> Response {
        let segments = request
            .path
            .trim_start_matches('/')
            .split('/')
            .collect::<Vec<_>>();

        match (request.method, segments.as_slice()) {
            (Method::Post, ["_bulk"]) => self.bulk(request),
            (Method::Head, [index]) => {
                if self.indices.lock().unwrap().contains_key(*index) {
                    Response::new(StatusCode::OK, "")
                } else {
                    Response::new(StatusCode::NOT_FOUND, "")
                }
            }
            (Method::Put, [index]) => {
                let mut indices = self.indices.lock().unwrap();
                if indices.contains_key(*index) {
                    return reply(
                        StatusCode::BAD_REQUEST,
                        &json!({
                            "error": { "type": "resource_already_exists_exception", "index": index },
                            "status": 400
                        }),
                    );
                }
                indices.insert((*index).to_owned(), Vec::new());
                reply(StatusCode::OK, &json!({ "acknowledged": true, "index": index }))
            }
            (Method::Delete, [index]) => match self.indices.lock().unwrap().remove(*index) {
                Some(_) => reply(StatusCode::OK, &json!({ "acknowledged": true })),
                None => index_not_found(index),
            },
            (Method::Post, [index, doc_type]) | (Method::Put, [index, doc_type, _]) => {
                let source = match request
                    .body
                    .as_ref()
                    .map(|body| serde_json::from_slice::<Value>(body))
                {
                    Some(Ok(source)) => source,
                    _ => {
                        return reply(
                            StatusCode::BAD_REQUEST,
                            &json!({ "error": { "type": "mapper_parsing_exception" }, "status": 400 }),
                        )
                    }
                };
                let id = segments.get(2).copied();
                let (id, replaced) = self.upsert(index, doc_type, id, source);
                let (status, result) = if replaced {
                    (StatusCode::OK, "updated")
                } else {
                    (StatusCode::CREATED, "created")
                };
                reply(
                    status,
                    &json!({ "_index": index, "_type": doc_type, "_id": id, "result": result }),
                )
            }
            (Method::Get, [index, doc_type, "_search"]) => {
                let size = request
                    .query
                    .iter()
                    .find(|(key, _)| *key == "size")
                    .map_or(10, |(_, value)| value.parse::<usize>().unwrap_or(10));
                let indices = self.indices.lock().unwrap();
                let documents = match indices.get(*index) {
                    Some(documents) => documents,
                    None => return index_not_found(index),
                };

                let matching = documents
                    .iter()
                    .filter(|document| document.doc_type == *doc_type)
                    .collect::<Vec<_>>();
                let hits = matching
                    .iter()
                    .take(size)
                    .map(|document| {
                        json!({
                            "_index": index,
                            "_type": document.doc_type,
                            "_id": document.id,
                            "_score": 1.0,
                            "_source": document.source,
                        })
                    })
                    .collect::<Vec<_>>();
                let max_score = if hits.is_empty() { Value::Null } else { json!(1.0) };

                reply(
                    StatusCode::OK,
                    &json!({
                        "took": 1,
                        "timed_out": false,
                        "_shards": { "total": 1, "successful": 1, "skipped": 0, "failed": 0 },
                        "hits": {
                            "total": { "value": matching.len(), "relation": "eq" },
                            "max_score": max_score,
                            "hits": hits,
                        }
                    }),
                )
            }
            _ => reply(
                StatusCode::BAD_REQUEST,
                &json!({ "error": { "type": "unsupported_in_memory_request" }, "status": 400 }),
            ),
        }
    }

    fn bulk(&self, request: &Request) -> Response {
        let body = request.body.clone().unwrap_or_default();
        let mut lines = body
            .split(|byte| *byte == b'\n')
            .filter(|line| !line.is_empty())
            .map(serde_json::from_slice::<Value>);

        let mut items = Vec::new();
        let mut errors = false;
        while let Some(Ok(action_line)) = lines.next() {
            let (action, meta) = match action_line.as_object().and_then(|object| object.iter().next()) {
                Some((action, meta)) => (action.clone(), meta.clone()),
                None => break,
            };
            let index = meta["_index"].as_str().unwrap_or_default().to_owned();
            let doc_type = meta["_type"].as_str().unwrap_or("_doc").to_owned();
            let id = meta["_id"].as_str().map(str::to_owned);

            let item = if action == "delete" {
                let mut indices = self.indices.lock().unwrap();
                let documents = indices.entry(index.clone()).or_default();
                let before = documents.len();
                documents.retain(|document| Some(&document.id) != id.as_ref());
                let status = if documents.len() < before { 200 } else { 404 };
                json!({ "_index": index, "_id": id, "status": status })
            } else {
                let source = match lines.next() {
                    Some(Ok(source)) => source,
                    _ => break,
                };
                let (id, replaced) = self.upsert(&index, &doc_type, id.as_deref(), source);
                let status = if replaced { 200 } else { 201 };
                json!({ "_index": index, "_type": doc_type, "_id": id, "status": status })
            };
            if item["status"].as_u64().map_or(true, |status| status > 201) {
                errors = true;
            }
            items.push(json!({ action: item }));
        }

        reply(
            StatusCode::OK,
            &json!({ "took": 1, "errors": errors, "items": items }),
        )
    }
}

#[async_trait]
impl Transport for InMemoryCluster {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        Ok(self.handle(&request))
    }
}
