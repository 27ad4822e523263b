//! Data-bound country selector.
//!
//! DESIGN
//! ======
//! `CountrySelector` owns a small state machine (`Idle → Loading →
//! Failed | Populated`) plus the user's current selection. State lives in a
//! `tokio::sync::watch` channel: every mutation publishes a new snapshot and
//! a rendering layer subscribes and redraws from `view::render`.
//!
//! Each dispatch bumps a generation counter. A result is applied only if
//! its generation is still current and the selector has not been unmounted;
//! both checks run inside the channel's modify closure so they are ordered
//! against `unmount` and `refetch`.
//!
//! The selection remembers the rows it was chosen from. A completed query
//! keeps it only when its rows equal those; any other result set, or a
//! failure, clears it.

pub mod view;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::net::QueryClient;
use crate::query::{CountryRow, QueryResult, QuerySpec};

pub use view::{OptionView, SelectorView};

// =============================================================================
// STATE
// =============================================================================

/// Fetch lifecycle of the selector.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Failed {
        message: String,
    },
    Populated {
        rows: Vec<CountryRow>,
    },
}

impl Phase {
    /// `Failed` and `Populated` end a dispatch.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::Populated { .. })
    }
}

/// Snapshot published to subscribers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectorState {
    pub phase: Phase,
    pub selection: Option<String>,
    /// Rows that were on display when `selection` was made.
    selected_from: Vec<CountryRow>,
}

impl SelectorState {
    #[must_use]
    pub fn rows(&self) -> Option<&[CountryRow]> {
        match &self.phase {
            Phase::Populated { rows } => Some(rows.as_slice()),
            _ => None,
        }
    }

    fn apply(&mut self, result: QueryResult) {
        match result {
            QueryResult::Loading => self.phase = Phase::Loading,
            QueryResult::Failed { message } => {
                self.clear_selection();
                self.phase = Phase::Failed { message };
            }
            QueryResult::Succeeded { rows } => {
                if self.selected_from != rows {
                    self.clear_selection();
                }
                self.phase = Phase::Populated { rows };
            }
        }
    }

    fn clear_selection(&mut self) -> bool {
        self.selected_from.clear();
        self.selection.take().is_some()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SelectError {
    #[error("no country list is loaded")]
    NotPopulated,
    #[error("country '{0}' is not in the current list")]
    UnknownCountry(String),
}

// =============================================================================
// COMPONENT
// =============================================================================

pub struct CountrySelector {
    id: Uuid,
    client: QueryClient,
    spec: QuerySpec,
    state: Arc<watch::Sender<SelectorState>>,
    generation: Arc<AtomicU64>,
    cancel: CancellationToken,
}

impl CountrySelector {
    /// Selector bound to the fixed customer-countries query. Starts `Idle`.
    pub fn new(client: QueryClient) -> Self {
        Self::with_spec(client, QuerySpec::customer_countries())
    }

    pub fn with_spec(client: QueryClient, spec: QuerySpec) -> Self {
        let (state, _) = watch::channel(SelectorState::default());
        Self {
            id: Uuid::new_v4(),
            client,
            spec,
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// First dispatch of the query. Must be called inside a Tokio runtime.
    pub fn mount(&self) -> JoinHandle<()> {
        info!(selector = %self.id, "selector mounted");
        self.dispatch()
    }

    /// Issue the query again. This is the only retry path after `Failed`.
    pub fn refetch(&self) -> JoinHandle<()> {
        self.dispatch()
    }

    /// Stop accepting query results. Later results are dropped silently.
    pub fn unmount(&self) {
        self.state.send_if_modified(|_| {
            self.cancel.cancel();
            false
        });
        debug!(selector = %self.id, "selector unmounted");
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    fn dispatch(&self) -> JoinHandle<()> {
        let mut generation = 0;
        self.state.send_if_modified(|s| {
            if self.cancel.is_cancelled() {
                return false;
            }
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            s.apply(QueryResult::Loading);
            true
        });

        let id = self.id;
        let client = self.client.clone();
        let spec = self.spec.clone();
        let state = Arc::clone(&self.state);
        let current = Arc::clone(&self.generation);
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            if generation == 0 {
                return;
            }
            let Some(result) = client.execute_cancellable(&spec, &cancel).await else {
                debug!(selector = %id, "discarding result for unmounted selector");
                return;
            };
            let applied = state.send_if_modified(|s| {
                if cancel.is_cancelled() || current.load(Ordering::SeqCst) != generation {
                    return false;
                }
                s.apply(result);
                true
            });
            if applied {
                debug!(selector = %id, generation, "selector state updated");
            } else {
                debug!(selector = %id, generation, "discarding stale result");
            }
        })
    }

    /// Set or clear the selection. `None` always clears.
    ///
    /// # Errors
    ///
    /// [`SelectError::NotPopulated`] outside the `Populated` phase and
    /// [`SelectError::UnknownCountry`] for a country not in the list.
    pub fn select(&self, country: Option<&str>) -> Result<(), SelectError> {
        let mut outcome = Ok(());
        self.state.send_if_modified(|s| {
            let Some(country) = country else {
                return s.clear_selection();
            };
            let Some(rows) = s.rows() else {
                outcome = Err(SelectError::NotPopulated);
                return false;
            };
            if !rows.iter().any(|r| r.country == country) {
                outcome = Err(SelectError::UnknownCountry(country.to_string()));
                return false;
            }
            if s.selection.as_deref() == Some(country) {
                return false;
            }
            let basis = rows.to_vec();
            s.selected_from = basis;
            s.selection = Some(country.to_string());
            true
        });
        outcome
    }

    pub fn clear_selection(&self) {
        self.state.send_if_modified(SelectorState::clear_selection);
    }

    #[must_use]
    pub fn selection(&self) -> Option<String> {
        self.state.borrow().selection.clone()
    }

    #[must_use]
    pub fn state(&self) -> SelectorState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn view(&self) -> SelectorView {
        view::render(&self.state.borrow())
    }

    /// Receiver notified on every published change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SelectorState> {
        self.state.subscribe()
    }

    /// Wait until the current dispatch has settled. Hangs while `Idle`.
    pub async fn settled(&self) -> SelectorState {
        let mut rx = self.state.subscribe();
        match rx.wait_for(|s| s.phase.is_settled()).await {
            Ok(state) => (*state).clone(),
            Err(_) => self.state(),
        }
    }
}

impl Drop for CountrySelector {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
#[path = "selector_test.rs"]
mod tests;
