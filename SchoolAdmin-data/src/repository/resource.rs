use async_trait::async_trait;
use serde_json::Value;

use crate::models::{ItemResponse, ListParams, ListResponse, StatusChangeRequest};
use super::errors::RepositoryError;

/// Transport for one backend collection, addressed by its base path
///
/// Items travel as raw JSON; typed decoding happens in the domain layer so
/// that a single transport instance can serve every resource.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait ResourceRepositoryTrait: Send + Sync {
    /// Fetch one page (or the whole collection when `per_page` is `None`)
    async fn fetch_page(
        &self,
        path: &str,
        params: &ListParams,
    ) -> Result<ListResponse<Value>, RepositoryError>;

    /// Fetch a single item by ID
    async fn fetch_one(&self, path: &str, id: u64) -> Result<ItemResponse<Value>, RepositoryError>;

    /// Create an item; the response carries the server-assigned identity
    async fn create(&self, path: &str, item: Value) -> Result<ItemResponse<Value>, RepositoryError>;

    /// Replace the item with the given ID
    async fn update(
        &self,
        path: &str,
        id: u64,
        item: Value,
    ) -> Result<ItemResponse<Value>, RepositoryError>;

    /// Toggle the boolean status field of an item
    ///
    /// Returns the item when the backend echoes it back.
    async fn change_status(
        &self,
        path: &str,
        request: StatusChangeRequest,
    ) -> Result<Option<Value>, RepositoryError>;
}
