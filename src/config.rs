//! Contains the connection options for the Elasticsearch node the client talks to

use anyhow::{Context, Result};
use elasticsearch::http::Url;
use serde::Deserialize;
use slog::Logger;
use sloggers::terminal::TerminalLoggerConfig;
use sloggers::Config as _;
use thiserror::Error;

/// Prefix of the environment variables merged into the configuration.
/// Eg.. `ELASTICSEARCH_HOST=localhost` sets the `host` key,
/// and `ELASTICSEARCH_LOGGING__LEVEL=debug` sets `logging.level`
pub const ENV_PREFIX: &str = "ELASTICSEARCH";

/// Connection configuration, loaded once and never mutated afterwards
#[derive(Debug, Deserialize, Clone)]
pub struct Configuration {
    /// URL scheme of the node (`http` or `https`)
    pub scheme: String,
    /// Hostname or IP address of the node
    pub host: String,
    /// Port the node's REST API listens on
    pub port: u16,
    /// Basic auth username
    #[serde(default)]
    pub username: Option<String>,
    /// Basic auth password
    #[serde(default)]
    pub password: Option<String>,
    /// Logging configuration for the client's diagnostic logs
    #[serde(default)]
    pub logging: TerminalLoggerConfig,
}

/// Basic auth credentials derived from the configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("the `{0}` connection parameter is required but was empty")]
    MissingParameter(&'static str),
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX).separator("__")
}

impl Configuration {
    /// Attempts to load the config from the file,
    /// merging in any `ELASTICSEARCH_` environment variables on top
    pub fn try_load(path: impl AsRef<str>) -> Result<Self> {
        let path = path.as_ref();
        let mut settings = config::Config::default();
        settings
            .merge(config::File::with_name(path))
            .context(format!("could not read in config file from {}", path))?
            .merge(environment())
            .context("could not merge in values from the environment")?;
        Self::from_settings(settings)
    }

    /// Loads the config purely from `ELASTICSEARCH_` environment variables.
    /// A `.env` file in the working directory is read first if one exists.
    pub fn from_env() -> Result<Self> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                return Err(err).context("could not read in the .env file");
            }
        }

        let mut settings = config::Config::default();
        settings
            .merge(environment())
            .context("could not merge in values from the environment")?;
        Self::from_settings(settings)
    }

    pub(crate) fn from_settings(settings: config::Config) -> Result<Self> {
        let config: Self = settings
            .try_into()
            .context("loading the Configuration struct from the merged config failed")?;
        config.validate()?;
        Ok(config)
    }

    /// Ensures that the required connection parameters are non-empty
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.scheme.trim().is_empty() {
            return Err(ValidationError::MissingParameter("scheme"));
        }
        if self.host.trim().is_empty() {
            return Err(ValidationError::MissingParameter("host"));
        }
        Ok(())
    }

    /// The base URL every request path is appended to
    pub fn base_url(&self) -> Result<Url> {
        let raw = format!("{}://{}:{}", self.scheme, self.host, self.port);
        Url::parse(&raw).with_context(|| format!("could not parse Elasticsearch URL {}", raw))
    }

    /// Credentials are only sent when at least one half of the pair is non-empty;
    /// a missing half is sent as the empty string
    pub fn basic_auth(&self) -> Option<BasicAuth> {
        let username = self.username.clone().unwrap_or_default();
        let password = self.password.clone().unwrap_or_default();
        if username.is_empty() && password.is_empty() {
            None
        } else {
            Some(BasicAuth { username, password })
        }
    }

    pub fn build_logger(&self) -> Result<Logger> {
        self.logging
            .build_logger()
            .context("could not build logger from config values")
    }
}
