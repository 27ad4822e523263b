//! Network layer: GraphQL wire types, the HTTP transport, and the caching
//! query client.
//!
//! DESIGN
//! ======
//! `Transport` is the seam between the query client and the network. The
//! production implementation is `HttpTransport`; tests substitute a
//! counting mock so cache and dedup behavior can be checked without I/O.

pub mod client;
pub mod http;
pub mod types;

pub use client::QueryClient;
pub use http::HttpTransport;
pub use types::{ErrorCode, Fault, GraphQlResponse, QueryError, Transport};

// =============================================================================
// TEST HELPERS
// =============================================================================
