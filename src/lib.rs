#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::future_not_send, clippy::module_name_repetitions)]

//! A thin client for a subset of the Elasticsearch REST API:
//! creating, deleting and checking indices,
//! inserting documents one at a time or in bulk,
//! and searching with a cap on the number of results.
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! let config = elastic_wrapper::Configuration::from_env()?;
//! let logger = config.build_logger()?;
//! let client = elastic_wrapper::connect::connect(&config, logger).await?;
//!
//! if !client.index_exists("payments").await? {
//!     client.create_index("payments", "").await?;
//! }
//! client
//!     .insert_document("payments", "txn", Some("22"), r#"{"tid":"22"}"#)
//!     .await?;
//! let _documents = client.find_documents("payments", "txn", 50).await?;
//! # Ok(())
//! # }
//! ```

pub mod bulk;
pub mod client;
pub mod config;
pub mod connect;
pub mod elasticsearch_api;
pub mod transport;

#[cfg(test)]
mod testutils;

pub use crate::client::{BulkItem, BulkStatus, Client, Error};
pub use crate::config::Configuration;
pub use crate::transport::{ElasticsearchTransport, Transport};
