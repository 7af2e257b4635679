// Testing utilities for the domain layer
// This module is only available in tests or when the "mock" feature is enabled

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{oneshot, watch};

use school_admin_data::models::{ItemResponse, ListParams, ListResponse, StatusChangeRequest};
use school_admin_data::repository::{InMemoryResourceStore, RepositoryError, ResourceRepositoryTrait};

// Re-export the generated repository mock from the data layer
#[cfg(feature = "mock")]
pub use school_admin_data::repository::MockResourceRepositoryTrait;

struct PendingList {
    path: String,
    params: ListParams,
    responder: Option<oneshot::Sender<Result<ListResponse<Value>, RepositoryError>>>,
}

/// Repository whose list calls wait until the test releases them
///
/// Every `fetch_page` call parks until [`GatedRepository::release`] or
/// [`GatedRepository::fail`] is called with its index, so tests decide the
/// order in which responses arrive. Other operations go straight to the
/// wrapped store.
pub struct GatedRepository {
    store: InMemoryResourceStore,
    pending: Mutex<Vec<PendingList>>,
    calls: watch::Sender<usize>,
}

impl GatedRepository {
    pub fn new(store: InMemoryResourceStore) -> Self {
        let (calls, _) = watch::channel(0);
        Self {
            store,
            pending: Mutex::new(Vec::new()),
            calls,
        }
    }

    /// Wait until at least `count` list calls have arrived
    pub async fn wait_for_calls(&self, count: usize) {
        let mut calls = self.calls.subscribe();
        // The sender lives in `self`, so the channel cannot close here
        let _ = calls.wait_for(|arrived| *arrived >= count).await;
    }

    /// Number of list calls received so far
    pub fn call_count(&self) -> usize {
        *self.calls.borrow()
    }

    /// Parameters of list call `index`
    pub fn params(&self, index: usize) -> Option<ListParams> {
        let pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.get(index).map(|call| call.params.clone())
    }

    /// Answer list call `index` from the store
    ///
    /// Returns false when the caller stopped waiting, i.e. it was cancelled.
    pub async fn release(&self, index: usize) -> bool {
        let Some((path, params, responder)) = self.take(index) else {
            return false;
        };
        let response = self.store.fetch_page(&path, &params).await;
        responder.send(response).is_ok()
    }

    /// Fail list call `index` with `error`
    pub fn fail(&self, index: usize, error: RepositoryError) -> bool {
        match self.take(index) {
            Some((_, _, responder)) => responder.send(Err(error)).is_ok(),
            None => false,
        }
    }

    #[allow(clippy::type_complexity)]
    fn take(
        &self,
        index: usize,
    ) -> Option<(
        String,
        ListParams,
        oneshot::Sender<Result<ListResponse<Value>, RepositoryError>>,
    )> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let call = pending.get_mut(index)?;
        let responder = call.responder.take()?;
        Some((call.path.clone(), call.params.clone(), responder))
    }
}

#[async_trait]
impl ResourceRepositoryTrait for GatedRepository {
    async fn fetch_page(
        &self,
        path: &str,
        params: &ListParams,
    ) -> Result<ListResponse<Value>, RepositoryError> {
        let (responder, response) = oneshot::channel();
        {
            let mut pending = self.pending.lock()?;
            pending.push(PendingList {
                path: path.to_string(),
                params: params.clone(),
                responder: Some(responder),
            });
            self.calls.send_replace(pending.len());
        }

        response
            .await
            .unwrap_or_else(|_| Err(RepositoryError::Transport("gate closed".to_string())))
    }

    async fn fetch_one(&self, path: &str, id: u64) -> Result<ItemResponse<Value>, RepositoryError> {
        self.store.fetch_one(path, id).await
    }

    async fn create(&self, path: &str, item: Value) -> Result<ItemResponse<Value>, RepositoryError> {
        self.store.create(path, item).await
    }

    async fn update(
        &self,
        path: &str,
        id: u64,
        item: Value,
    ) -> Result<ItemResponse<Value>, RepositoryError> {
        self.store.update(path, id, item).await
    }

    async fn change_status(
        &self,
        path: &str,
        request: StatusChangeRequest,
    ) -> Result<Option<Value>, RepositoryError> {
        self.store.change_status(path, request).await
    }
}

/// Repository that records every call before delegating
#[derive(Clone)]
pub struct RecordingRepository {
    inner: Arc<dyn ResourceRepositoryTrait>,
    lists: Arc<Mutex<Vec<(String, ListParams)>>>,
    status_changes: Arc<Mutex<Vec<u64>>>,
}

impl RecordingRepository {
    pub fn new(inner: Arc<dyn ResourceRepositoryTrait>) -> Self {
        Self {
            inner,
            lists: Arc::new(Mutex::new(Vec::new())),
            status_changes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Path and parameters of every list call, oldest first
    pub fn list_calls(&self) -> Vec<(String, ListParams)> {
        self.lists.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// IDs sent to change-status, oldest first
    pub fn status_calls(&self) -> Vec<u64> {
        self.status_changes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ResourceRepositoryTrait for RecordingRepository {
    async fn fetch_page(
        &self,
        path: &str,
        params: &ListParams,
    ) -> Result<ListResponse<Value>, RepositoryError> {
        self.lists.lock()?.push((path.to_string(), params.clone()));
        self.inner.fetch_page(path, params).await
    }

    async fn fetch_one(&self, path: &str, id: u64) -> Result<ItemResponse<Value>, RepositoryError> {
        self.inner.fetch_one(path, id).await
    }

    async fn create(&self, path: &str, item: Value) -> Result<ItemResponse<Value>, RepositoryError> {
        self.inner.create(path, item).await
    }

    async fn update(
        &self,
        path: &str,
        id: u64,
        item: Value,
    ) -> Result<ItemResponse<Value>, RepositoryError> {
        self.inner.update(path, id, item).await
    }

    async fn change_status(
        &self,
        path: &str,
        request: StatusChangeRequest,
    ) -> Result<Option<Value>, RepositoryError> {
        self.status_changes.lock()?.push(request.id);
        self.inner.change_status(path, request).await
    }
}
