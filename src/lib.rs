//! # country-filter
//!
//! Headless client for the customer-countries page: a GraphQL query client
//! with an in-memory result cache, a data-bound country selector that
//! publishes its state to subscribers, and the header/sidebar shell state.
//!
//! Rendering is left to whatever UI layer subscribes to the selector; this
//! crate produces `SelectorView` models for it to draw.

pub mod app;
pub mod cache;
pub mod config;
pub mod net;
pub mod query;
pub mod selector;
pub mod shell;

pub use app::{App, AppError};
pub use cache::{CacheEntry, ResultCache};
pub use config::ClientConfig;
pub use net::{HttpTransport, QueryClient, QueryError, Transport};
pub use query::{CountryRow, QueryResult, QuerySpec, Signature};
pub use selector::{CountrySelector, SelectError, SelectorState, SelectorView};
pub use shell::ShellState;
