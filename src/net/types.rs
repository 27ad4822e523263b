//! GraphQL wire types, query errors, and the transport trait.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::query::QuerySpec;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced while sending a query or reading its response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The endpoint could not be reached or the connection broke.
    #[error("network error: {0}")]
    Network(String),

    /// The response body was not a GraphQL response we understand.
    #[error("malformed response: {0}")]
    Protocol(String),

    /// The endpoint answered with a non-success status and no GraphQL errors.
    #[error("unexpected HTTP status {status}{}", body_excerpt(.body))]
    Status { status: u16, body: String },

    /// The backend returned a well-formed `errors` array.
    #[error("{}", .messages.join("; "))]
    Backend { messages: Vec<String> },

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

const BODY_EXCERPT_CHARS: usize = 200;

/// `": <first line of body>"`, cut to `BODY_EXCERPT_CHARS`, or empty.
fn body_excerpt(body: &str) -> String {
    let line = body.trim().lines().next().unwrap_or_default();
    if line.is_empty() {
        return String::new();
    }
    let mut excerpt: String = line.chars().take(BODY_EXCERPT_CHARS).collect();
    if line.chars().count() > BODY_EXCERPT_CHARS {
        excerpt.push_str("...");
    }
    format!(": {excerpt}")
}

/// Coarse fault class a `QueryError` belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Network,
    Protocol,
    Backend,
}

impl QueryError {
    #[must_use]
    pub fn fault(&self) -> Fault {
        match self {
            Self::Network(_) | Self::HttpClientBuild(_) => Fault::Network,
            Self::Protocol(_) | Self::Status { .. } => Fault::Protocol,
            Self::Backend { .. } => Fault::Backend,
        }
    }
}

/// Grepable error code and retryable flag for log lines.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

impl ErrorCode for QueryError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Network(_) => "E_NETWORK",
            Self::Protocol(_) => "E_PROTOCOL",
            Self::Status { .. } => "E_HTTP_STATUS",
            Self::Backend { .. } => "E_BACKEND",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Status { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

/// Request body POSTed to the GraphQL endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest<'a> {
    pub operation_name: &'a str,
    pub query: &'a str,
    pub variables: &'a Map<String, Value>,
}

impl<'a> From<&'a QuerySpec> for GraphQlRequest<'a> {
    fn from(spec: &'a QuerySpec) -> Self {
        Self { operation_name: spec.operation_name(), query: spec.document(), variables: spec.variables() }
    }
}

/// A single entry of a GraphQL `errors` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlError {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Value>>,
}

/// Response envelope: `data`, `errors`, or both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<GraphQlError>>,
}

impl GraphQlResponse {
    pub fn with_data(data: Value) -> Self {
        Self { data: Some(data), errors: None }
    }

    pub fn with_errors<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let errors = messages
            .into_iter()
            .map(|m| GraphQlError { message: m.into(), path: None })
            .collect();
        Self { data: None, errors: Some(errors) }
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|e| !e.is_empty())
    }

    /// Extract `data`, treating any reported error as a failed query even
    /// when partial data came back alongside it.
    ///
    /// # Errors
    ///
    /// [`QueryError::Backend`] when `errors` is non-empty, and
    /// [`QueryError::Protocol`] when there is no `data` either.
    pub fn into_data(self) -> Result<Value, QueryError> {
        if let Some(errors) = self.errors.filter(|e| !e.is_empty()) {
            let messages = errors.into_iter().map(|e| e.message).collect();
            return Err(QueryError::Backend { messages });
        }
        match self.data {
            Some(Value::Null) | None => Err(QueryError::Protocol("response carried neither data nor errors".into())),
            Some(data) => Ok(data),
        }
    }
}

// =============================================================================
// TRANSPORT TRAIT
// =============================================================================

/// Performs the network exchange for one query. Enables mocking in tests.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send `spec` to the backend and return its decoded response envelope.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] if the endpoint is unreachable or the
    /// response is not a GraphQL envelope.
    async fn send(&self, spec: &QuerySpec) -> Result<GraphQlResponse, QueryError>;
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
