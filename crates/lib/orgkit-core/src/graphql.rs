//! GraphQL client for the remote organization API.
//!
//! Executes query/mutation documents against one configured endpoint and
//! normalizes transport, protocol, and application failures into a single
//! error taxonomy. Application error messages matching the schema-validation
//! template are rewritten for readability; everything else passes through
//! verbatim.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::config::{self, ConfigError, ConfigStore};

/// Header carrying the API key on every outbound GraphQL request.
pub const AUTHORIZATION_HEADER: &str = "Authorization-API";

#[derive(Debug)]
pub enum GraphqlError {
    Config(ConfigError),
    Transport(reqwest::Error),
    Http { status: StatusCode },
    Decode(reqwest::Error),
    Api { message: String },
}

impl fmt::Display for GraphqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Transport(err) => write!(f, "HTTP request failed: {err}"),
            Self::Http { status } => write!(f, "GraphQL endpoint returned HTTP {status}"),
            Self::Decode(err) => write!(f, "invalid JSON response: {err}"),
            Self::Api { message } => write!(f, "GraphQL errors: {message}"),
        }
    }
}

impl std::error::Error for GraphqlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Transport(err) | Self::Decode(err) => Some(err),
            Self::Http { .. } | Self::Api { .. } => None,
        }
    }
}

impl From<ConfigError> for GraphqlError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Client for one GraphQL endpoint, credentials supplied by the config store.
#[derive(Clone)]
pub struct GraphqlClient {
    http: reqwest::Client,
    config: Arc<ConfigStore>,
}

impl GraphqlClient {
    #[must_use]
    pub fn new(http: reqwest::Client, config: Arc<ConfigStore>) -> Self {
        Self { http, config }
    }

    /// Executes a GraphQL document and returns the `data` object, defaulting
    /// to empty when the response carries none.
    ///
    /// Transport failures are retried up to the stored `RETRIES` setting;
    /// every other failure is returned immediately.
    ///
    /// # Errors
    /// Returns a [`GraphqlError`] naming the failing layer: configuration,
    /// transport, HTTP status, body decoding, or application errors.
    pub async fn execute(
        &self,
        document: &str,
        variables: Value,
    ) -> Result<Map<String, Value>, GraphqlError> {
        let endpoint = self.config.require(config::GRAPHQL_ENDPOINT).await?;
        let api_key = self.config.require(config::API_KEY).await?;
        let timeout = self.config.timeout().await;
        let retries = self.config.retries().await;

        let mut attempt = 0;
        loop {
            match self
                .send(&endpoint, &api_key, timeout, document, &variables)
                .await
            {
                Err(GraphqlError::Transport(err)) if attempt < retries => {
                    attempt += 1;
                    warn!("GraphQL transport failure (attempt {attempt} of {retries}): {err}");
                }
                result => return result,
            }
        }
    }

    async fn send(
        &self,
        endpoint: &str,
        api_key: &str,
        timeout: Duration,
        document: &str,
        variables: &Value,
    ) -> Result<Map<String, Value>, GraphqlError> {
        debug!("POST {endpoint}");
        let response = self
            .http
            .post(endpoint)
            .timeout(timeout)
            .header(AUTHORIZATION_HEADER, api_key)
            .json(&json!({ "query": document, "variables": variables }))
            .send()
            .await
            .map_err(GraphqlError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GraphqlError::Http { status });
        }

        let mut body: Value = response.json().await.map_err(GraphqlError::Decode)?;
        if let Some(errors) = body.get("errors").and_then(Value::as_array) {
            return Err(GraphqlError::Api {
                message: render_errors(errors),
            });
        }
        Ok(match body.get_mut("data").map(Value::take) {
            Some(Value::Object(data)) => data,
            _ => Map::new(),
        })
    }
}

fn render_errors(errors: &[Value]) -> String {
    let messages: Vec<String> = errors
        .iter()
        .map(|error| {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error");
            rewrite_unknown_field(message).unwrap_or_else(|| message.to_string())
        })
        .collect();
    messages.join("; ")
}

/// Rewrites `Field "X" is not defined by type "Y"[. Did you mean "Z"?]` into
/// `Invalid field 'X' in Y[. Did you mean 'Z'?]`. Returns `None` when the
/// message does not match the template.
fn rewrite_unknown_field(message: &str) -> Option<String> {
    let rest = message.strip_prefix("Field \"")?;
    let (field, rest) = rest.split_once('"')?;
    let rest = rest.strip_prefix(" is not defined by type \"")?;
    let (type_name, rest) = rest.split_once('"')?;

    let suggestion = rest
        .strip_prefix('.')
        .map(str::trim_start)
        .and_then(|tail| tail.strip_prefix("Did you mean \""))
        .and_then(|tail| tail.split_once("\"?"))
        .map(|(name, _)| name);

    Some(match suggestion {
        Some(name) => format!("Invalid field '{field}' in {type_name}. Did you mean '{name}'?"),
        None => format!("Invalid field '{field}' in {type_name}"),
    })
}
