use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use crate::models::{ItemResponse, ListParams, ListResponse, PageMeta, StatusChangeRequest};
use super::errors::RepositoryError;
use super::resource::ResourceRepositoryTrait;

/// Status field toggled when a collection does not configure its own
pub const DEFAULT_STATUS_FIELD: &str = "status";

#[derive(Debug, Default)]
struct Collection {
    items: Vec<Map<String, Value>>,
    next_id: u64,
    status_field: Option<String>,
}

impl Collection {
    fn status_field(&self) -> &str {
        self.status_field.as_deref().unwrap_or(DEFAULT_STATUS_FIELD)
    }

    fn position(&self, id: u64) -> Option<usize> {
        self.items.iter().position(|item| item_id(item) == Some(id))
    }
}

/// In-memory stand-in for the REST backend
///
/// Keeps one collection per base path and answers with the same envelopes,
/// search semantics and page counters as the real service. Clones share
/// storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryResourceStore {
    collections: Arc<Mutex<HashMap<String, Collection>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryResourceStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection; items without an `id` get one assigned and
    /// items without a status start active
    pub fn with_items(self, path: &str, items: Vec<Value>) -> Self {
        {
            let mut collections = self
                .collections
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let collection = collections.entry(path.to_string()).or_default();
            for item in items {
                if let Value::Object(object) = item {
                    insert_new(collection, object);
                }
            }
        }
        self
    }

    /// Toggle `field` instead of `status` on change-status requests for `path`
    pub fn with_status_field(self, path: &str, field: &str) -> Self {
        {
            let mut collections = self
                .collections
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            collections.entry(path.to_string()).or_default().status_field = Some(field.to_string());
        }
        self
    }

    /// Make every subsequent call fail as if the backend were down
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of items stored under `path`
    pub fn len(&self, path: &str) -> Result<usize, RepositoryError> {
        let collections = self.collections.lock()?;
        Ok(collections.get(path).map_or(0, |c| c.items.len()))
    }

    /// Whether nothing is stored under `path`
    pub fn is_empty(&self, path: &str) -> Result<bool, RepositoryError> {
        Ok(self.len(path)? == 0)
    }

    fn check_available(&self, path: &str) -> Result<(), RepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(path.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceRepositoryTrait for InMemoryResourceStore {
    async fn fetch_page(
        &self,
        path: &str,
        params: &ListParams,
    ) -> Result<ListResponse<Value>, RepositoryError> {
        self.check_available(path)?;
        let collections = self.collections.lock()?;

        let matching: Vec<Value> = collections
            .get(path)
            .map(|collection| {
                collection
                    .items
                    .iter()
                    .filter(|item| matches_search(item, &params.search))
                    .filter(|item| matches_filters(item, &params.filters))
                    .cloned()
                    .map(Value::Object)
                    .collect()
            })
            .unwrap_or_default();

        debug!(
            "In-memory list {}: {} matching items for search '{}'",
            path,
            matching.len(),
            params.search
        );

        let Some(per_page) = params.per_page else {
            return Ok(ListResponse {
                data: matching,
                links: None,
                meta: None,
            });
        };

        let page = params.page.unwrap_or(1).max(1);
        let meta = PageMeta::paginate(path, matching.len() as u64, per_page, page);
        let offset = (page as usize - 1).saturating_mul(meta.per_page as usize);
        let data = matching
            .into_iter()
            .skip(offset)
            .take(meta.per_page as usize)
            .collect();

        Ok(ListResponse {
            data,
            links: Some(meta.edge_links()),
            meta: Some(meta),
        })
    }

    async fn fetch_one(&self, path: &str, id: u64) -> Result<ItemResponse<Value>, RepositoryError> {
        self.check_available(path)?;
        let collections = self.collections.lock()?;

        collections
            .get(path)
            .and_then(|collection| collection.position(id).map(|i| collection.items[i].clone()))
            .map(|item| ItemResponse::new(Value::Object(item)))
            .ok_or_else(|| RepositoryError::NotFound(format!("{}/{}", path, id)))
    }

    async fn create(&self, path: &str, item: Value) -> Result<ItemResponse<Value>, RepositoryError> {
        self.check_available(path)?;
        let Value::Object(mut object) = item else {
            return Err(RepositoryError::Validation("item must be a JSON object".to_string()));
        };
        object.remove("id");

        let mut collections = self.collections.lock()?;
        let collection = collections.entry(path.to_string()).or_default();
        let stored = insert_new(collection, object);
        debug!("In-memory create {}: assigned id {:?}", path, item_id(&stored));

        Ok(ItemResponse::new(Value::Object(stored)))
    }

    async fn update(
        &self,
        path: &str,
        id: u64,
        item: Value,
    ) -> Result<ItemResponse<Value>, RepositoryError> {
        self.check_available(path)?;
        let Value::Object(changes) = item else {
            return Err(RepositoryError::Validation("item must be a JSON object".to_string()));
        };

        let mut collections = self.collections.lock()?;
        let collection = collections
            .get_mut(path)
            .ok_or_else(|| RepositoryError::NotFound(format!("{}/{}", path, id)))?;
        let index = collection
            .position(id)
            .ok_or_else(|| RepositoryError::NotFound(format!("{}/{}", path, id)))?;

        let stored = &mut collection.items[index];
        for (key, value) in changes {
            if key != "id" {
                stored.insert(key, value);
            }
        }

        Ok(ItemResponse::new(Value::Object(stored.clone())))
    }

    async fn change_status(
        &self,
        path: &str,
        request: StatusChangeRequest,
    ) -> Result<Option<Value>, RepositoryError> {
        self.check_available(path)?;

        let mut collections = self.collections.lock()?;
        let collection = collections
            .get_mut(path)
            .ok_or_else(|| RepositoryError::NotFound(format!("{}/{}", path, request.id)))?;
        let field = collection.status_field().to_string();
        let index = collection
            .position(request.id)
            .ok_or_else(|| RepositoryError::NotFound(format!("{}/{}", path, request.id)))?;

        let stored = &mut collection.items[index];
        let current = stored.get(&field).and_then(Value::as_bool).unwrap_or(true);
        stored.insert(field, Value::Bool(!current));

        Ok(Some(Value::Object(stored.clone())))
    }
}

fn item_id(item: &Map<String, Value>) -> Option<u64> {
    item.get("id").and_then(Value::as_u64)
}

fn insert_new(collection: &mut Collection, mut object: Map<String, Value>) -> Map<String, Value> {
    let id = match item_id(&object) {
        Some(id) => id,
        None => collection.next_id.max(1),
    };
    collection.next_id = collection.next_id.max(id + 1);
    object.insert("id".to_string(), Value::from(id));
    object
        .entry(collection.status_field().to_string())
        .or_insert(Value::Bool(true));
    collection.items.push(object.clone());
    object
}

/// Case-insensitive substring match over the item's string fields
fn matches_search(item: &Map<String, Value>, search: &str) -> bool {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }

    item.values().any(|value| match value {
        Value::String(text) => text.to_lowercase().contains(&needle),
        _ => false,
    })
}

fn matches_filters(item: &Map<String, Value>, filters: &[(String, String)]) -> bool {
    filters.iter().all(|(key, expected)| match item.get(key) {
        Some(Value::String(text)) => text == expected,
        Some(Value::Number(number)) => number.to_string() == *expected,
        Some(Value::Bool(flag)) => flag.to_string() == *expected,
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    const SUBJECTS: &str = "/academics/subjects";

    fn subjects(count: usize) -> Vec<Value> {
        (1..=count)
            .map(|n| json!({"name": format!("Subject {}", n), "code": format!("S{:02}", n)}))
            .collect()
    }

    #[tokio::test]
    async fn test_fetch_page_reports_counters() {
        let store = InMemoryResourceStore::new().with_items(SUBJECTS, subjects(25));
        let params = ListParams {
            per_page: Some(10),
            page: Some(3),
            ..Default::default()
        };

        let response = store.fetch_page(SUBJECTS, &params).await.unwrap();
        let meta = response.meta.unwrap();
        assert_eq!(response.data.len(), 5);
        assert_eq!(meta.total, 25);
        assert_eq!(meta.last_page, 3);
        assert_eq!(meta.from, Some(21));
        assert!(response.links.unwrap().next.is_none());
    }

    #[tokio::test]
    async fn test_unpaged_fetch_returns_everything() {
        let store = InMemoryResourceStore::new().with_items(SUBJECTS, subjects(25));
        let params = ListParams {
            per_page: None,
            page: Some(2),
            ..Default::default()
        };

        let response = store.fetch_page(SUBJECTS, &params).await.unwrap();
        assert_eq!(response.data.len(), 25);
        assert!(response.meta.is_none());
    }

    #[tokio::test]
    async fn test_search_and_filters() {
        let store = InMemoryResourceStore::new().with_items(
            "/addresses/provinces",
            vec![
                json!({"name": "Koshi", "country_id": 1}),
                json!({"name": "Madhesh", "country_id": 1}),
                json!({"name": "Sindh", "country_id": 2}),
            ],
        );

        let params = ListParams {
            search: "SH".to_string(),
            per_page: None,
            page: None,
            filters: vec![("country_id".to_string(), "1".to_string())],
        };
        let response = store.fetch_page("/addresses/provinces", &params).await.unwrap();
        assert_eq!(response.data.len(), 2);
        assert!(response.data.iter().all(|item| item["country_id"] == 1));
    }

    #[tokio::test]
    async fn test_create_assigns_next_id() {
        let store = InMemoryResourceStore::new().with_items(SUBJECTS, subjects(2));

        let created = store
            .create(SUBJECTS, json!({"id": 99, "name": "Science", "code": "SCI"}))
            .await
            .unwrap();
        assert_eq!(created.data["id"], 3);
        assert_eq!(created.data["status"], true);
        assert_eq!(store.len(SUBJECTS).unwrap(), 3);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = InMemoryResourceStore::new().with_items(SUBJECTS, subjects(2));

        let updated = store
            .update(SUBJECTS, 2, json!({"name": "Physics"}))
            .await
            .unwrap();
        assert_eq!(updated.data["name"], "Physics");
        assert_eq!(updated.data["code"], "S02");

        assert_err!(store.update(SUBJECTS, 7, json!({"name": "Nope"})).await);
    }

    #[tokio::test]
    async fn test_change_status_toggles_configured_field() {
        let store = InMemoryResourceStore::new()
            .with_status_field("/accounts/masters/fiscal-years", "is_default")
            .with_items(
                "/accounts/masters/fiscal-years",
                vec![json!({"name": "2081/82", "is_default": false})],
            );

        let request = StatusChangeRequest { id: 1 };
        let toggled = store
            .change_status("/accounts/masters/fiscal-years", request)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(toggled["is_default"], true);
    }

    #[tokio::test]
    async fn test_seeded_items_start_active() {
        let store = InMemoryResourceStore::new().with_items(SUBJECTS, subjects(1));
        let seeded = store.fetch_one(SUBJECTS, 1).await.unwrap();
        assert_eq!(seeded.data["status"], true);

        let request = StatusChangeRequest { id: 1 };
        let toggled = store.change_status(SUBJECTS, request).await.unwrap().unwrap();
        assert_eq!(toggled["status"], false);

        let request = StatusChangeRequest { id: 1 };
        let restored = store.change_status(SUBJECTS, request).await.unwrap().unwrap();
        assert_eq!(restored["status"], true);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let store = InMemoryResourceStore::new().with_items(SUBJECTS, subjects(1));
        store.set_unavailable(true);
        assert_err!(store.fetch_one(SUBJECTS, 1).await);

        store.set_unavailable(false);
        assert_ok!(store.fetch_one(SUBJECTS, 1).await);
    }
}
