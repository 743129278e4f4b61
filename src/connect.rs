//! Contains utility functions that build a client from the configuration

use crate::client::Client;
use crate::config::Configuration;
use crate::transport::ElasticsearchTransport;
use anyhow::Context;
use elasticsearch::auth::Credentials;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use elasticsearch::Elasticsearch;
use slog::Logger;

/// Instantiates a new client.
/// Note: returning Ok(client) from this function
/// does not guarantee that the server is reachable;
/// client.ping() should be called to ensure this is the case.
pub fn new_client(config: &Configuration, logger: Logger) -> anyhow::Result<Client<ElasticsearchTransport>> {
    config.validate()?;
    let url = config.base_url()?;
    let connection_pool = SingleNodeConnectionPool::new(url.clone());
    let mut builder = TransportBuilder::new(connection_pool);

    // Add in user authentication if configured
    if let Some(auth) = config.basic_auth() {
        builder = builder.auth(Credentials::Basic(auth.username, auth.password));
    }

    let transport = builder
        .build()
        .context("could not build Elasticsearch transport")?;
    let elasticsearch = Elasticsearch::new(transport);

    slog::debug!(logger, "built Elasticsearch client"; "url" => url.as_str());
    Ok(Client::new(ElasticsearchTransport::new(elasticsearch), logger))
}

/// Creates a new client
/// and pings it once to ensure that the connection is live.
pub async fn connect(config: &Configuration, logger: Logger) -> anyhow::Result<Client<ElasticsearchTransport>> {
    let client = new_client(config, logger.clone())?;
    client
        .ping()
        .await
        .context("could not ping elasticsearch to verify reachability")?;

    slog::info!(logger, "connected to Elasticsearch"; "host" => &config.host, "port" => config.port);
    Ok(client)
}

/// Builds a client from the `ELASTICSEARCH_` environment variables
/// (and the `.env` file, if present)
pub fn from_env(logger: Logger) -> anyhow::Result<Client<ElasticsearchTransport>> {
    let config = Configuration::from_env()?;
    new_client(&config, logger)
}
