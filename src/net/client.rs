//! Query client: cache first, then one shared transport call per signature.
//!
//! DESIGN
//! ======
//! `execute` answers from the `ResultCache` when it can. On a miss the
//! fetch runs on its own task and is registered in an in-flight map keyed
//! by signature, so concurrent callers for the same signature await the same
//! transport call. The task stores successful rows in the cache and removes
//! its in-flight entry before resolving.
//!
//! ERROR HANDLING
//! ==============
//! Every fault is normalized to `QueryResult::Failed { message }` here.
//! Callers never see a `QueryError` and nothing panics on a bad response.
//!
//! CANCELLATION
//! ============
//! A caller that gives up via its `CancellationToken` only stops waiting.
//! The shared fetch keeps running for other callers and still warms the
//! cache when it succeeds.
//!
//! `shutdown` closes the client: outstanding fetch tasks are aborted, the
//! cache is cleared, and every later `execute` fails without touching the
//! transport. The closed flag is checked under the in-flight lock before a
//! result is stored, so nothing lands in the cache after `shutdown` returns.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::types::{ErrorCode, QueryError, Transport};
use crate::cache::ResultCache;
use crate::query::{BACKEND_DEFAULT_LIMIT, CountryRow, QueryResult, QuerySpec, Signature, decode_customer_countries};

type InFlight = Shared<BoxFuture<'static, QueryResult>>;

const CLOSED_MESSAGE: &str = "query client is shut down";

struct Pending {
    result: InFlight,
    abort: AbortHandle,
}

#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    cache: Arc<ResultCache>,
    in_flight: Mutex<HashMap<Signature, Pending>>,
    closed: AtomicBool,
}

impl QueryClient {
    pub fn new(transport: Arc<dyn Transport>, cache: Arc<ResultCache>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport,
                cache,
                in_flight: Mutex::new(HashMap::new()),
                closed: AtomicBool::new(false),
            }),
        }
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.inner.cache
    }

    /// Number of signatures with a transport call currently outstanding.
    #[must_use]
    pub fn in_flight_len(&self) -> usize {
        self.inner.lock_in_flight().len()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Abort outstanding fetches, clear the cache, and refuse further queries.
    pub fn shutdown(&self) {
        let aborted = {
            let mut in_flight = self.inner.lock_in_flight();
            self.inner.closed.store(true, Ordering::SeqCst);
            let aborted = in_flight.len();
            for (_, pending) in in_flight.drain() {
                pending.abort.abort();
            }
            aborted
        };
        self.inner.cache.clear();
        info!(aborted, "query client shut down");
    }

    /// Run `spec` to completion. Always returns `Failed` or `Succeeded`.
    pub async fn execute(&self, spec: &QuerySpec) -> QueryResult {
        let signature = spec.signature();
        if let Some(entry) = self.inner.cache.lookup(&signature) {
            debug!(%signature, version = entry.version, "cache hit");
            return entry.result();
        }
        self.join_or_start(spec, signature).await
    }

    /// Like [`QueryClient::execute`], but returns `None` once `cancel` fires.
    pub async fn execute_cancellable(&self, spec: &QuerySpec, cancel: &CancellationToken) -> Option<QueryResult> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(signature = %spec.signature(), "query cancelled by caller");
                None
            }
            result = self.execute(spec) => Some(result),
        }
    }

    fn join_or_start(&self, spec: &QuerySpec, signature: Signature) -> InFlight {
        let mut in_flight = self.inner.lock_in_flight();

        if self.inner.closed.load(Ordering::SeqCst) {
            debug!(%signature, "query refused after shutdown");
            return futures::future::ready(QueryResult::Failed { message: CLOSED_MESSAGE.to_string() })
                .boxed()
                .shared();
        }

        if let Some(pending) = in_flight.get(&signature) {
            debug!(%signature, "joining in-flight query");
            return pending.result.clone();
        }

        // A fetch may have finished between the caller's lookup and this lock.
        if let Some(entry) = self.inner.cache.lookup(&signature) {
            debug!(%signature, version = entry.version, "cache hit");
            return futures::future::ready(entry.result()).boxed().shared();
        }

        debug!(%signature, "cache miss; starting fetch");
        let inner = Arc::clone(&self.inner);
        let task_spec = spec.clone();
        let task_signature = signature.clone();
        let handle = tokio::spawn(async move { fetch(&inner, &task_spec, &task_signature).await });
        let abort = handle.abort_handle();

        let result = async move {
            match handle.await {
                Ok(result) => result,
                Err(e) if e.is_cancelled() => QueryResult::Failed { message: CLOSED_MESSAGE.to_string() },
                Err(e) => QueryResult::Failed { message: format!("query task failed: {e}") },
            }
        }
        .boxed()
        .shared();
        in_flight.insert(signature, Pending { result: result.clone(), abort });
        result
    }
}

impl ClientInner {
    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, HashMap<Signature, Pending>> {
        self.in_flight.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

async fn fetch(inner: &ClientInner, spec: &QuerySpec, signature: &Signature) -> QueryResult {
    let outcome = send_and_decode(inner, spec).await;

    // Store and deregister together so `shutdown` sees either both or neither.
    let stored = {
        let mut in_flight = inner.lock_in_flight();
        in_flight.remove(signature);
        match &outcome {
            Ok(rows) if !inner.closed.load(Ordering::SeqCst) => {
                Some(inner.cache.store(signature.clone(), rows.clone()))
            }
            _ => None,
        }
    };

    match outcome {
        Ok(rows) => {
            if rows.len() >= BACKEND_DEFAULT_LIMIT {
                warn!(%signature, rows = rows.len(), "result reached the backend row limit and may be truncated");
            }
            match stored {
                Some(version) => info!(%signature, version, rows = rows.len(), "query succeeded"),
                None => debug!(%signature, "query finished after shutdown; result not cached"),
            }
            QueryResult::Succeeded { rows }
        }
        Err(e) => {
            match &e {
                QueryError::Status { status, body } => warn!(
                    %signature,
                    code = e.error_code(),
                    retryable = e.retryable(),
                    status,
                    body = %body,
                    "query failed"
                ),
                _ => warn!(%signature, code = e.error_code(), retryable = e.retryable(), error = %e, "query failed"),
            }
            QueryResult::Failed { message: e.to_string() }
        }
    }
}

async fn send_and_decode(inner: &ClientInner, spec: &QuerySpec) -> Result<Vec<CountryRow>, QueryError> {
    let data = inner.transport.send(spec).await?.into_data()?;
    decode_customer_countries(&data)
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
