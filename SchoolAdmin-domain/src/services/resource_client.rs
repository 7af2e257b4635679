use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{abortable, AbortHandle, Aborted};
use thiserror::Error;
use tracing::{debug, info, warn};
use validator::ValidationErrors;

use school_admin_data::models::StatusChangeRequest;
use school_admin_data::repository::{RepositoryError, ResourceRepositoryTrait};

use crate::entities::conversions;
use crate::entities::resource::{ResourceDescriptor, ResourceItem};
use crate::services::pagination::{Page, Pagination};
use crate::services::query::Query;

/// Resource client errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// A newer list call (or teardown) superseded this one; not a failure
    #[error("Request superseded")]
    Cancelled,

    /// The owning screen has been torn down
    #[error("Client for {0} has been disposed")]
    Disposed(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Item or response lacks the identity an operation needs
    #[error("Missing identity on {0} item")]
    MissingIdentity(String),

    /// Response did not have the expected shape
    #[error("Unexpected response: {0}")]
    Shape(String),

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network failure or non-2xx response
    #[error("Request failed: {0}")]
    Transport(String),

    /// Client state lock poisoned
    #[error("Lock error: {0}")]
    Lock(String),
}

impl ClientError {
    /// Whether this is a silent supersession rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled)
    }
}

/// Map repository errors to client errors
pub fn map_repo_error(err: RepositoryError) -> ClientError {
    match err {
        RepositoryError::NotFound(msg) => ClientError::NotFound(msg),
        RepositoryError::Validation(msg) => ClientError::Validation(msg),
        RepositoryError::Decode(msg) => ClientError::Shape(msg),
        other => ClientError::Transport(other.to_string()),
    }
}

/// Render validator output as one message, fields in alphabetical order
pub fn describe_validation_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let error_msgs: Vec<String> = errors
                .iter()
                .map(|err| {
                    if let Some(msg) = &err.message {
                        msg.to_string()
                    } else {
                        format!("Invalid {}", field)
                    }
                })
                .collect();
            // Schema-level rules report under "__all__"
            if *field == "__all__" {
                error_msgs.join(", ")
            } else {
                format!("{}: {}", field, error_msgs.join(", "))
            }
        })
        .collect();
    fields.sort();
    fields.join("; ")
}

/// Lifecycle phase of a client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientPhase {
    /// Nothing requested yet
    Idle,
    /// A list request is outstanding
    Loading,
    /// The last list request succeeded
    Ready,
    /// The last list request failed
    Error,
    /// Torn down; every operation is refused
    Disposed,
}

/// What happens to the visible collection when a list request fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListFailurePolicy {
    /// Empty the collection and drop the counters
    #[default]
    Clear,
    /// Keep showing the previous page
    KeepStale,
}

/// How the collection catches up after a status change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MutationPolicy {
    /// Re-list with the current query after every status change, whether it
    /// succeeded or not
    #[default]
    RefetchAfterMutate,
    /// Replace the item in place when the backend echoes it back, re-list
    /// otherwise
    PatchLocally,
}

struct ClientState<T> {
    phase: ClientPhase,
    items: Vec<T>,
    pagination: Option<Pagination>,
    query: Query,
    error: Option<String>,
    mutation_error: Option<String>,
    generation: u64,
    in_flight: Option<AbortHandle>,
    submitting: usize,
}

/// Decrements the outstanding-mutation counter when dropped
struct SubmitGuard<'a, T> {
    state: &'a Mutex<ClientState<T>>,
}

impl<T> Drop for SubmitGuard<'_, T> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.submitting = state.submitting.saturating_sub(1);
    }
}

/// Client for one backend collection
///
/// Lists are query driven and cancellable: starting a list aborts the one
/// still outstanding, and only the latest call may touch the visible state.
/// Mutations are never cancelled or coalesced; `is_submitting` reports
/// whether one is outstanding.
///
/// Each resource is a one-line instantiation:
///
/// ```ignore
/// let subjects = PaginatedResourceClient::<Subject>::new(repository.clone());
/// ```
pub struct PaginatedResourceClient<T: ResourceItem> {
    repository: Arc<dyn ResourceRepositoryTrait>,
    state: Mutex<ClientState<T>>,
    list_failure_policy: ListFailurePolicy,
    mutation_policy: MutationPolicy,
}

impl<T: ResourceItem> PaginatedResourceClient<T> {
    /// Create an idle client with the default query and policies
    pub fn new(repository: Arc<dyn ResourceRepositoryTrait>) -> Self {
        Self {
            repository,
            state: Mutex::new(ClientState {
                phase: ClientPhase::Idle,
                items: Vec::new(),
                pagination: None,
                query: Query::default(),
                error: None,
                mutation_error: None,
                generation: 0,
                in_flight: None,
                submitting: 0,
            }),
            list_failure_policy: ListFailurePolicy::default(),
            mutation_policy: MutationPolicy::default(),
        }
    }

    /// Start from `query` instead of the default one
    pub fn with_query(self, query: Query) -> Self {
        self.lock_state().query = query;
        self
    }

    pub fn with_list_failure_policy(mut self, policy: ListFailurePolicy) -> Self {
        self.list_failure_policy = policy;
        self
    }

    pub fn with_mutation_policy(mut self, policy: MutationPolicy) -> Self {
        self.mutation_policy = policy;
        self
    }

    /// The collection this client talks to
    pub fn resource(&self) -> ResourceDescriptor {
        T::RESOURCE
    }

    pub fn phase(&self) -> ClientPhase {
        self.lock_state().phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase() == ClientPhase::Loading
    }

    /// Whether a create, update or status change is outstanding
    pub fn is_submitting(&self) -> bool {
        self.lock_state().submitting > 0
    }

    /// Message of the last failed list, cleared when the next list starts
    pub fn error(&self) -> Option<String> {
        self.lock_state().error.clone()
    }

    /// Message of the last failed mutation, cleared when the next mutation starts
    pub fn mutation_error(&self) -> Option<String> {
        self.lock_state().mutation_error.clone()
    }

    /// Snapshot of the in-memory collection
    pub fn items(&self) -> Vec<T> {
        self.lock_state().items.clone()
    }

    pub fn pagination(&self) -> Option<Pagination> {
        self.lock_state().pagination.clone()
    }

    /// The query of the latest list call
    pub fn query(&self) -> Query {
        self.lock_state().query.clone()
    }

    /// List with `query`, cancelling any list still outstanding
    ///
    /// Resolves to [`ClientError::Cancelled`] without touching state when a
    /// later call supersedes this one.
    pub async fn list(&self, query: Query) -> Result<Page<T>, ClientError> {
        let (generation, request) = {
            let mut state = self.try_lock_state()?;
            if state.phase == ClientPhase::Disposed {
                return Err(ClientError::Disposed(T::RESOURCE.name.to_string()));
            }

            if let Some(previous) = state.in_flight.take() {
                debug!("Cancelling superseded {} request", T::RESOURCE.name);
                previous.abort();
            }

            state.generation += 1;
            state.phase = ClientPhase::Loading;
            state.error = None;
            state.query = query.clone();

            let (request, handle) = abortable(self.fetch_page(query));
            state.in_flight = Some(handle);
            (state.generation, request)
        };

        match request.await {
            Ok(outcome) => self.settle_list(generation, outcome),
            Err(Aborted) => {
                debug!("{} request {} was cancelled", T::RESOURCE.name, generation);
                Err(ClientError::Cancelled)
            }
        }
    }

    /// List with `query` unless it is already the current, loaded query
    pub async fn set_query(&self, query: Query) -> Result<(), ClientError> {
        let unchanged = {
            let state = self.try_lock_state()?;
            state.query == query && matches!(state.phase, ClientPhase::Loading | ClientPhase::Ready)
        };
        if unchanged {
            debug!("Query for {} unchanged, not re-listing", T::RESOURCE.name);
            return Ok(());
        }

        self.list(query).await.map(|_| ())
    }

    /// List again with the current query
    pub async fn refetch(&self) -> Result<Page<T>, ClientError> {
        let query = self.query();
        self.list(query).await
    }

    /// Read a single item, e.g. to populate an edit form
    pub async fn fetch_one(&self, id: u64) -> Result<T, ClientError> {
        self.ensure_active()?;
        let response = self
            .repository
            .fetch_one(T::RESOURCE.path, id)
            .await
            .map_err(map_repo_error)?;
        conversions::convert_to_domain_item(response.data)
    }

    /// Create `item` and append the server's version to the collection
    pub async fn create(&self, item: T) -> Result<T, ClientError> {
        let _submitting = self.begin_mutation()?;
        let outcome = self.send_create(item).await;
        self.finish_mutation(outcome, |state, created| state.items.push(created.clone()))
    }

    /// Update `item` and replace the matching collection entry by identity
    pub async fn update(&self, item: T) -> Result<T, ClientError> {
        let _submitting = self.begin_mutation()?;
        let outcome = self.send_update(item).await;
        self.finish_mutation(outcome, |state, updated| {
            if let Some(existing) = state
                .items
                .iter_mut()
                .find(|existing| existing.id() == updated.id())
            {
                *existing = updated.clone();
            }
        })
    }

    /// Toggle the status of item `id`, then bring the collection up to date
    ///
    /// Returns the item when the backend echoes it back. Under
    /// [`MutationPolicy::RefetchAfterMutate`] exactly one list with the
    /// current query follows, whatever the outcome of the toggle.
    pub async fn change_status(&self, id: u64) -> Result<Option<T>, ClientError> {
        let outcome = {
            let _submitting = self.begin_mutation()?;
            let outcome = self.send_change_status(id).await;
            if let Err(error) = &outcome {
                warn!("Status change of {} {} failed: {}", T::RESOURCE.name, id, error);
                self.try_lock_state()?.mutation_error = Some(error.to_string());
            }
            outcome
        };

        let patched = match (self.mutation_policy, &outcome) {
            (MutationPolicy::PatchLocally, Ok(Some(item))) => self.replace_local(item),
            _ => false,
        };

        if !patched {
            if let Err(error) = self.refetch().await {
                if !error.is_cancelled() {
                    warn!("Refetch of {} after status change failed: {}", T::RESOURCE.name, error);
                }
            }
        }

        outcome
    }

    /// Tear the client down: cancel the outstanding list and refuse further work
    pub fn dispose(&self) {
        let mut state = self.lock_state();
        if let Some(handle) = state.in_flight.take() {
            handle.abort();
        }
        state.phase = ClientPhase::Disposed;
        state.items.clear();
        state.pagination = None;
        info!("Disposed {} client", T::RESOURCE.name);
    }

    async fn fetch_page(&self, query: Query) -> Result<Page<T>, ClientError> {
        let params = conversions::convert_to_data_params(&query);
        let response = self
            .repository
            .fetch_page(T::RESOURCE.path, &params)
            .await
            .map_err(map_repo_error)?;
        conversions::convert_to_domain_page(response)
    }

    fn settle_list(
        &self,
        generation: u64,
        outcome: Result<Page<T>, ClientError>,
    ) -> Result<Page<T>, ClientError> {
        let mut state = self.try_lock_state()?;

        // A newer list or a teardown owns the state now
        if state.generation != generation || state.phase == ClientPhase::Disposed {
            debug!("Discarding stale {} response {}", T::RESOURCE.name, generation);
            return Err(ClientError::Cancelled);
        }
        state.in_flight = None;

        match outcome {
            Ok(page) => {
                debug!(
                    "Loaded {} {} (page {} of {})",
                    page.items.len(),
                    T::RESOURCE.name,
                    page.pagination.current_page,
                    page.pagination.last_page
                );
                state.items = page.items.clone();
                state.pagination = Some(page.pagination.clone());
                state.phase = ClientPhase::Ready;
                Ok(page)
            }
            Err(error) => {
                warn!("Listing {} failed: {}", T::RESOURCE.name, error);
                state.error = Some(error.to_string());
                state.phase = ClientPhase::Error;
                if self.list_failure_policy == ListFailurePolicy::Clear {
                    state.items.clear();
                    state.pagination = None;
                }
                Err(error)
            }
        }
    }

    async fn send_create(&self, item: T) -> Result<T, ClientError> {
        validate_item(&item)?;
        let body = conversions::convert_to_data_item(&item)?;
        let response = self
            .repository
            .create(T::RESOURCE.path, body)
            .await
            .map_err(map_repo_error)?;

        let created: T = conversions::convert_to_domain_item(response.data)?;
        if created.id().is_none() {
            return Err(ClientError::MissingIdentity(T::RESOURCE.name.to_string()));
        }
        info!("Created {} item {:?}", T::RESOURCE.name, created.id());
        Ok(created)
    }

    async fn send_update(&self, item: T) -> Result<T, ClientError> {
        let id = item
            .id()
            .ok_or_else(|| ClientError::MissingIdentity(T::RESOURCE.name.to_string()))?;
        validate_item(&item)?;
        let body = conversions::convert_to_data_item(&item)?;
        let response = self
            .repository
            .update(T::RESOURCE.path, id, body)
            .await
            .map_err(map_repo_error)?;

        let updated: T = conversions::convert_to_domain_item(response.data)?;
        if updated.id().is_none() {
            return Err(ClientError::MissingIdentity(T::RESOURCE.name.to_string()));
        }
        info!("Updated {} item {}", T::RESOURCE.name, id);
        Ok(updated)
    }

    async fn send_change_status(&self, id: u64) -> Result<Option<T>, ClientError> {
        let echoed = self
            .repository
            .change_status(T::RESOURCE.path, StatusChangeRequest { id })
            .await
            .map_err(map_repo_error)?;

        // The echo is a convenience; an unexpected body does not undo the toggle
        Ok(echoed.and_then(|value| serde_json::from_value(value).ok()))
    }

    fn begin_mutation(&self) -> Result<SubmitGuard<'_, T>, ClientError> {
        let mut state = self.try_lock_state()?;
        if state.phase == ClientPhase::Disposed {
            return Err(ClientError::Disposed(T::RESOURCE.name.to_string()));
        }
        state.submitting += 1;
        state.mutation_error = None;
        Ok(SubmitGuard { state: &self.state })
    }

    fn finish_mutation<F>(&self, outcome: Result<T, ClientError>, apply: F) -> Result<T, ClientError>
    where
        F: FnOnce(&mut ClientState<T>, &T),
    {
        let mut state = self.try_lock_state()?;
        match outcome {
            Ok(item) => {
                if state.phase != ClientPhase::Disposed {
                    apply(&mut state, &item);
                }
                Ok(item)
            }
            Err(error) => {
                warn!("Saving {} item failed: {}", T::RESOURCE.name, error);
                state.mutation_error = Some(error.to_string());
                Err(error)
            }
        }
    }

    /// Replace the collection entry matching `item`; false when absent
    fn replace_local(&self, item: &T) -> bool {
        let mut state = self.lock_state();
        match state.items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(existing) => {
                *existing = item.clone();
                true
            }
            None => false,
        }
    }

    fn ensure_active(&self) -> Result<(), ClientError> {
        if self.try_lock_state()?.phase == ClientPhase::Disposed {
            return Err(ClientError::Disposed(T::RESOURCE.name.to_string()));
        }
        Ok(())
    }

    fn try_lock_state(&self) -> Result<MutexGuard<'_, ClientState<T>>, ClientError> {
        self.state.lock().map_err(|e| ClientError::Lock(e.to_string()))
    }

    /// Lock for read-only snapshots, where a poisoned lock still holds usable data
    fn lock_state(&self) -> MutexGuard<'_, ClientState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: ResourceItem> Drop for PaginatedResourceClient<T> {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = state.in_flight.take() {
            handle.abort();
        }
    }
}

fn validate_item<T: ResourceItem>(item: &T) -> Result<(), ClientError> {
    item.validate()
        .map_err(|errors| ClientError::Validation(describe_validation_errors(&errors)))
}
