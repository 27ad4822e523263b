//! Application lifecycle.
//!
//! DESIGN
//! ======
//! `App` is built once at startup. It creates the single `ResultCache`,
//! wires it into the `QueryClient`, and owns the shell state and the
//! country selector. `shutdown` unmounts the selector and closes the query
//! client, which aborts outstanding fetches and clears the cache.
//! Nothing here is a global; callers hold the `App` for as long as the
//! process runs.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::ResultCache;
use crate::config::{ClientConfig, ConfigError};
use crate::net::{HttpTransport, QueryClient, QueryError, Transport};
use crate::selector::CountrySelector;
use crate::shell::ShellState;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] QueryError),
}

pub struct App {
    config: ClientConfig,
    client: QueryClient,
    shell: ShellState,
    selector: CountrySelector,
}

impl App {
    /// Build the app from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the HTTP client fails.
    pub fn from_env() -> Result<Self, AppError> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Build the app against the configured HTTP endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Transport`] if the HTTP client fails to build.
    pub fn new(config: ClientConfig) -> Result<Self, AppError> {
        let transport = HttpTransport::from_config(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Build the app on an arbitrary transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let cache = match config.cache_ttl {
            Some(ttl) => ResultCache::with_ttl(ttl),
            None => ResultCache::new(),
        };
        let client = QueryClient::new(transport, Arc::new(cache));
        let selector = CountrySelector::new(client.clone());
        Self { config, client, shell: ShellState::default(), selector }
    }

    /// Mount the selector, dispatching its query.
    pub fn start(&self) -> JoinHandle<()> {
        info!(endpoint = %self.config.endpoint, "app starting");
        self.selector.mount()
    }

    /// Unmount the selector, abort outstanding fetches, and drop every cached
    /// result. No fetch started before this call can repopulate the cache.
    pub fn shutdown(&self) {
        self.selector.unmount();
        self.client.shutdown();
        info!("app shut down");
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    #[must_use]
    pub fn shell(&self) -> &ShellState {
        &self.shell
    }

    pub fn shell_mut(&mut self) -> &mut ShellState {
        &mut self.shell
    }

    #[must_use]
    pub fn selector(&self) -> &CountrySelector {
        &self.selector
    }
}

#[cfg(test)]
#[path = "app_test.rs"]
mod tests;
