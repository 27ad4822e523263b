//! Registered query documents, query specs, and results.
//!
//! DESIGN
//! ======
//! Every query the client can send is a static document compiled into the
//! binary. A `QuerySpec` pairs that document with its operation name and a
//! variables object; its `Signature` is the cache and dedup key. Nothing in
//! this crate builds query text at runtime.
//!
//! Decoding maps the backend's `customer` list into `CountryRow`s in the
//! order received. Duplicate or empty countries are kept as-is.
//!
//! The backend caps every list at `BACKEND_DEFAULT_LIMIT` rows unless the
//! query passes its own `limit`. The registered document passes none.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::net::types::QueryError;

// =============================================================================
// REGISTERED DOCUMENTS
// =============================================================================

/// Rows the backend returns for a list field queried without `limit`.
pub const BACKEND_DEFAULT_LIMIT: usize = 100;

pub const CUSTOMER_COUNTRIES_OPERATION: &str = "GetCustomerCountries";

/// Distinct customer countries with a distinct-customer count per country.
pub const CUSTOMER_COUNTRIES_QUERY: &str = "query GetCustomerCountries {
  customer {
    Country
    _distinct_ { CustomerId }
  }
}
";

// =============================================================================
// QUERY SPEC
// =============================================================================

/// Immutable description of a query to execute.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    operation_name: &'static str,
    document: &'static str,
    variables: Map<String, Value>,
}

impl QuerySpec {
    /// Wrap a registered static document. Variables start empty.
    #[must_use]
    pub fn new(operation_name: &'static str, document: &'static str) -> Self {
        Self { operation_name, document, variables: Map::new() }
    }

    /// The fixed "customer countries" query.
    #[must_use]
    pub fn customer_countries() -> Self {
        Self::new(CUSTOMER_COUNTRIES_OPERATION, CUSTOMER_COUNTRIES_QUERY)
    }

    /// Attach a variable, replacing any previous value under `name`.
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn operation_name(&self) -> &'static str {
        self.operation_name
    }

    #[must_use]
    pub fn document(&self) -> &'static str {
        self.document
    }

    #[must_use]
    pub fn variables(&self) -> &Map<String, Value> {
        &self.variables
    }

    /// Deterministic cache key: operation name plus canonical variables.
    #[must_use]
    pub fn signature(&self) -> Signature {
        let mut key = String::from(self.operation_name);
        key.push(':');
        write_canonical(&Value::Object(self.variables.clone()), &mut key);
        Signature(key)
    }
}

/// Serialize JSON with object keys sorted at every depth, independent of
/// the map ordering serde_json was built with.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

// =============================================================================
// SIGNATURE
// =============================================================================

/// Cache key derived from a `QuerySpec`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature(String);

impl Signature {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// RESULTS
// =============================================================================

/// One country and the number of distinct customers in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryRow {
    pub country: String,
    pub customer_count: u64,
}

impl CountryRow {
    pub fn new(country: impl Into<String>, customer_count: u64) -> Self {
        Self { country: country.into(), customer_count }
    }
}

/// Outcome of a query. `Loading` is replaced by exactly one of the other
/// two variants, which stay put until a new query is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult {
    Loading,
    Failed { message: String },
    Succeeded { rows: Vec<CountryRow> },
}

impl QueryResult {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Loading)
    }
}

// =============================================================================
// DECODING
// =============================================================================

#[derive(Deserialize)]
struct CustomerRecord {
    #[serde(rename = "Country", default)]
    country: Option<String>,
    #[serde(rename = "_distinct_", default)]
    distinct: Option<DistinctCounts>,
}

#[derive(Deserialize)]
struct DistinctCounts {
    #[serde(rename = "CustomerId", default)]
    customer_id: Option<Number>,
}

/// Counts arrive as JSON numbers of any kind. Negative values become 0 and
/// fractional ones are floored.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn count_from(n: &Number) -> u64 {
    if let Some(count) = n.as_u64() {
        return count;
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f > 0.0 => f.floor() as u64,
        _ => 0,
    }
}

impl From<CustomerRecord> for CountryRow {
    fn from(record: CustomerRecord) -> Self {
        let count = record
            .distinct
            .and_then(|d| d.customer_id)
            .map_or(0, |n| count_from(&n));
        Self { country: record.country.unwrap_or_default(), customer_count: count }
    }
}

/// Map the `data` object of a `GetCustomerCountries` response into rows.
///
/// A missing or null count becomes 0; a null `customer` list is empty.
///
/// # Errors
///
/// Returns [`QueryError::Protocol`] if `customer` is absent or not a list
/// of customer records.
pub fn decode_customer_countries(data: &Value) -> Result<Vec<CountryRow>, QueryError> {
    let Some(customers) = data.get("customer") else {
        return Err(QueryError::Protocol("response data has no `customer` field".into()));
    };
    if customers.is_null() {
        return Ok(Vec::new());
    }
    let records: Vec<CustomerRecord> = serde_json::from_value(customers.clone())
        .map_err(|e| QueryError::Protocol(format!("unexpected `customer` shape: {e}")))?;
    Ok(records.into_iter().map(CountryRow::from).collect())
}

#[cfg(test)]
#[path = "query_test.rs"]
mod tests;
