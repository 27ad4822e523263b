//! HTTP transport: POSTs registered queries to the GraphQL endpoint.
//!
//! ERROR HANDLING
//! ==============
//! Connection failures and timeouts become `QueryError::Network`. A body
//! that parses as a GraphQL envelope is returned even on a non-2xx status
//! when it carries `errors`, so backend validation messages reach the user.
//! Anything else outside 2xx is `QueryError::Status`.

use std::time::Duration;

use tracing::debug;

use super::types::{GraphQlRequest, GraphQlResponse, QueryError, Transport};
use crate::config::{ClientConfig, Timeouts};
use crate::query::QuerySpec;

pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Build a transport for `endpoint` with the given timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn new(endpoint: impl Into<String>, timeouts: Timeouts) -> Result<Self, QueryError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| QueryError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, endpoint: endpoint.into() })
    }

    /// # Errors
    ///
    /// Returns [`QueryError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn from_config(config: &ClientConfig) -> Result<Self, QueryError> {
        Self::new(config.endpoint.clone(), config.timeouts)
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(&self, spec: &QuerySpec) -> Result<GraphQlResponse, QueryError> {
        debug!(endpoint = %self.endpoint, operation = spec.operation_name(), "sending query");
        let response = self
            .http
            .post(&self.endpoint)
            .json(&GraphQlRequest::from(spec))
            .send()
            .await
            .map_err(|e| QueryError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| QueryError::Network(e.to_string()))?;
        parse_response(status, &text)
    }
}

fn parse_response(status: u16, text: &str) -> Result<GraphQlResponse, QueryError> {
    let success = (200..300).contains(&status);
    match serde_json::from_str::<GraphQlResponse>(text) {
        Ok(envelope) if success || envelope.has_errors() => Ok(envelope),
        Err(e) if success => Err(QueryError::Protocol(format!("invalid JSON body: {e}"))),
        _ => Err(QueryError::Status { status, body: text.to_string() }),
    }
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
