use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::entities::resource::ResourceItem;
use crate::services::resource_client::PaginatedResourceClient;

/// Search box pause before a request goes out
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Emits the last value pushed once input has been quiet for `interval`
pub struct Debouncer<T> {
    input: mpsc::UnboundedSender<T>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Start the timer task; settled values arrive on the returned receiver
    pub fn spawn(interval: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (input, mut raw) = mpsc::unbounded_channel::<T>();
        let (settled_tx, settled) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            let mut pending: Option<T> = None;
            loop {
                match pending.take() {
                    None => match raw.recv().await {
                        Some(value) => pending = Some(value),
                        None => break,
                    },
                    Some(value) => {
                        tokio::select! {
                            next = raw.recv() => match next {
                                Some(newer) => pending = Some(newer),
                                None => {
                                    let _ = settled_tx.send(value);
                                    break;
                                }
                            },
                            _ = sleep(interval) => {
                                if settled_tx.send(value).is_err() {
                                    break;
                                }
                            }
                        }
                    }
                }
            }
        });

        (Self { input, task }, settled)
    }

    /// Push a value, restarting the quiet interval
    ///
    /// Returns false once the timer task has stopped.
    pub fn push(&self, value: T) -> bool {
        self.input.send(value).is_ok()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Search box bound to a resource client
///
/// Settled terms replace the client's search and reset it to page 1. Each
/// settled term lists on its own task, so a later term cancels an earlier
/// request still in flight. Dropping the search aborts those tasks too.
pub struct DebouncedSearch {
    debouncer: Debouncer<String>,
    worker: JoinHandle<()>,
}

impl DebouncedSearch {
    pub fn attach<T: ResourceItem>(client: Arc<PaginatedResourceClient<T>>, interval: Duration) -> Self {
        let (debouncer, mut settled) = Debouncer::spawn(interval);

        let worker = tokio::spawn(async move {
            let mut searches = JoinSet::new();
            loop {
                tokio::select! {
                    next = settled.recv() => {
                        let Some(term) = next else { break };
                        let current = client.query();
                        if current.search == term {
                            continue;
                        }

                        debug!("Searching {} for {:?}", T::RESOURCE.name, term);
                        let client = client.clone();
                        searches.spawn(async move {
                            if let Err(error) = client.set_query(current.with_search(term)).await {
                                if !error.is_cancelled() {
                                    warn!("Search of {} failed: {}", T::RESOURCE.name, error);
                                }
                            }
                        });
                    }
                    // Reap finished searches
                    Some(_) = searches.join_next(), if !searches.is_empty() => {}
                }
            }
        });

        Self { debouncer, worker }
    }

    /// Feed one keystroke's worth of search text
    pub fn input(&self, term: impl Into<String>) {
        self.debouncer.push(term.into());
    }
}

impl Drop for DebouncedSearch {
    fn drop(&mut self) {
        self.worker.abort();
    }
}
