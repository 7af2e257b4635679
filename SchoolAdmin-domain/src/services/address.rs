//! Country → province → district → municipality hierarchy
//!
//! Each level is a flat map from id to node; nodes point at their parent by
//! id, so "children of X" is a filter and edits replace a single entry.
//! The current selection is a plain value handed to every operation.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use school_admin_data::repository::ResourceRepositoryTrait;

use crate::entities::address::{AddressNode, Country, District, Municipality, Province};
use crate::services::query::Query;
use crate::services::resource_client::{ClientError, PaginatedResourceClient};

/// Address hierarchy errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AddressError {
    /// Node has not been saved yet
    #[error("Missing identity on {0} node")]
    MissingIdentity(&'static str),

    /// Parent is not present in the book
    #[error("Unknown parent {parent_id} for {level} node")]
    UnknownParent { level: &'static str, parent_id: u64 },

    /// Backend failure
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// One level of the hierarchy, keyed by id
#[derive(Debug, Clone)]
pub struct AddressLevel<N> {
    nodes: BTreeMap<u64, N>,
}

impl<N> Default for AddressLevel<N> {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
        }
    }
}

impl<N: AddressNode> AddressLevel<N> {
    pub fn get(&self, id: u64) -> Option<&N> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in id order
    pub fn iter(&self) -> impl Iterator<Item = &N> {
        self.nodes.values()
    }

    /// Nodes whose parent is `parent_id`
    pub fn children_of(&self, parent_id: Option<u64>) -> impl Iterator<Item = &N> {
        self.nodes
            .values()
            .filter(move |node| node.parent_id() == parent_id)
    }

    fn child_ids(&self, parent_id: Option<u64>) -> Vec<u64> {
        self.children_of(parent_id).filter_map(|node| node.id()).collect()
    }
}

/// A node type with a fixed place in the [`AddressBook`]
pub trait StoredNode: AddressNode {
    fn level(book: &AddressBook) -> &AddressLevel<Self>;

    fn level_mut(book: &mut AddressBook) -> &mut AddressLevel<Self>;

    /// Whether `parent_id` exists one level up
    fn has_parent(book: &AddressBook, parent_id: u64) -> bool;

    /// Remove every node below `id`
    fn remove_descendants(book: &mut AddressBook, id: u64);

    fn client(service: &AddressService) -> &PaginatedResourceClient<Self>;
}

/// The whole hierarchy as four flat levels
#[derive(Debug, Clone, Default)]
pub struct AddressBook {
    pub countries: AddressLevel<Country>,
    pub provinces: AddressLevel<Province>,
    pub districts: AddressLevel<District>,
    pub municipalities: AddressLevel<Municipality>,
}

impl AddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a node; returns the node it replaced
    pub fn upsert<N: StoredNode>(&mut self, node: N) -> Result<Option<N>, AddressError> {
        let id = node
            .id()
            .ok_or(AddressError::MissingIdentity(N::RESOURCE.name))?;
        self.check_parent(&node)?;
        Ok(N::level_mut(self).nodes.insert(id, node))
    }

    /// Remove a node together with everything below it
    pub fn remove<N: StoredNode>(&mut self, id: u64) -> Option<N> {
        let removed = N::level_mut(self).nodes.remove(&id)?;
        N::remove_descendants(self, id);
        debug!("Removed {} node {} and its descendants", N::RESOURCE.name, id);
        Some(removed)
    }

    /// Make `nodes` the complete set of children of `parent_id`
    ///
    /// Children missing from `nodes` are removed with their descendants.
    pub fn replace_children<N: StoredNode>(
        &mut self,
        parent_id: Option<u64>,
        nodes: Vec<N>,
    ) -> Result<(), AddressError> {
        let keep: Vec<u64> = nodes.iter().filter_map(|node| node.id()).collect();
        let current = N::level(self).child_ids(parent_id);
        for stale in current {
            if !keep.contains(&stale) {
                self.remove::<N>(stale);
            }
        }

        for node in nodes {
            self.upsert(node)?;
        }
        Ok(())
    }

    pub fn provinces_in(&self, selection: &AddressSelection) -> Vec<&Province> {
        match selection.country {
            Some(country_id) => self.provinces.children_of(Some(country_id)).collect(),
            None => Vec::new(),
        }
    }

    pub fn districts_in(&self, selection: &AddressSelection) -> Vec<&District> {
        match selection.province {
            Some(province_id) => self.districts.children_of(Some(province_id)).collect(),
            None => Vec::new(),
        }
    }

    pub fn municipalities_in(&self, selection: &AddressSelection) -> Vec<&Municipality> {
        match selection.district {
            Some(district_id) => self.municipalities.children_of(Some(district_id)).collect(),
            None => Vec::new(),
        }
    }

    /// Drop selected ids that are gone or no longer nested in the level above
    pub fn prune(&self, selection: AddressSelection) -> AddressSelection {
        let country = selection.country.filter(|id| self.countries.contains(*id));
        let province = selection.province.filter(|id| {
            self.provinces
                .get(*id)
                .is_some_and(|province| country == Some(province.country_id))
        });
        let district = selection.district.filter(|id| {
            self.districts
                .get(*id)
                .is_some_and(|district| province == Some(district.province_id))
        });

        AddressSelection {
            country,
            province,
            district,
        }
    }

    fn check_parent<N: StoredNode>(&self, node: &N) -> Result<(), AddressError> {
        match node.parent_id() {
            Some(parent_id) if !N::has_parent(self, parent_id) => Err(AddressError::UnknownParent {
                level: N::RESOURCE.name,
                parent_id,
            }),
            _ => Ok(()),
        }
    }
}

/// Which country, province and district are currently open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddressSelection {
    pub country: Option<u64>,
    pub province: Option<u64>,
    pub district: Option<u64>,
}

impl AddressSelection {
    /// Select a country; clears the province and district
    pub fn select_country(self, country: Option<u64>) -> Self {
        Self {
            country,
            province: None,
            district: None,
        }
    }

    /// Select a province; clears the district
    pub fn select_province(self, province: Option<u64>) -> Self {
        Self {
            province,
            district: None,
            ..self
        }
    }

    pub fn select_district(self, district: Option<u64>) -> Self {
        Self { district, ..self }
    }
}

impl StoredNode for Country {
    fn level(book: &AddressBook) -> &AddressLevel<Self> {
        &book.countries
    }

    fn level_mut(book: &mut AddressBook) -> &mut AddressLevel<Self> {
        &mut book.countries
    }

    fn has_parent(_book: &AddressBook, _parent_id: u64) -> bool {
        true
    }

    fn remove_descendants(book: &mut AddressBook, id: u64) {
        let children = book.provinces.child_ids(Some(id));
        for child in children {
            book.remove::<Province>(child);
        }
    }

    fn client(service: &AddressService) -> &PaginatedResourceClient<Self> {
        &service.countries
    }
}

impl StoredNode for Province {
    fn level(book: &AddressBook) -> &AddressLevel<Self> {
        &book.provinces
    }

    fn level_mut(book: &mut AddressBook) -> &mut AddressLevel<Self> {
        &mut book.provinces
    }

    fn has_parent(book: &AddressBook, parent_id: u64) -> bool {
        book.countries.contains(parent_id)
    }

    fn remove_descendants(book: &mut AddressBook, id: u64) {
        let children = book.districts.child_ids(Some(id));
        for child in children {
            book.remove::<District>(child);
        }
    }

    fn client(service: &AddressService) -> &PaginatedResourceClient<Self> {
        &service.provinces
    }
}

impl StoredNode for District {
    fn level(book: &AddressBook) -> &AddressLevel<Self> {
        &book.districts
    }

    fn level_mut(book: &mut AddressBook) -> &mut AddressLevel<Self> {
        &mut book.districts
    }

    fn has_parent(book: &AddressBook, parent_id: u64) -> bool {
        book.provinces.contains(parent_id)
    }

    fn remove_descendants(book: &mut AddressBook, id: u64) {
        let children = book.municipalities.child_ids(Some(id));
        for child in children {
            book.remove::<Municipality>(child);
        }
    }

    fn client(service: &AddressService) -> &PaginatedResourceClient<Self> {
        &service.districts
    }
}

impl StoredNode for Municipality {
    fn level(book: &AddressBook) -> &AddressLevel<Self> {
        &book.municipalities
    }

    fn level_mut(book: &mut AddressBook) -> &mut AddressLevel<Self> {
        &mut book.municipalities
    }

    fn has_parent(book: &AddressBook, parent_id: u64) -> bool {
        book.districts.contains(parent_id)
    }

    fn remove_descendants(_book: &mut AddressBook, _id: u64) {}

    fn client(service: &AddressService) -> &PaginatedResourceClient<Self> {
        &service.municipalities
    }
}

/// Loads and saves the hierarchy, one client per level
pub struct AddressService {
    countries: PaginatedResourceClient<Country>,
    provinces: PaginatedResourceClient<Province>,
    districts: PaginatedResourceClient<District>,
    municipalities: PaginatedResourceClient<Municipality>,
}

impl AddressService {
    pub fn new(repository: Arc<dyn ResourceRepositoryTrait>) -> Self {
        Self {
            countries: PaginatedResourceClient::new(repository.clone()),
            provinces: PaginatedResourceClient::new(repository.clone()),
            districts: PaginatedResourceClient::new(repository.clone()),
            municipalities: PaginatedResourceClient::new(repository),
        }
    }

    /// Replace the country level with the backend's full list
    pub async fn load_countries(&self, book: &mut AddressBook) -> Result<(), AddressError> {
        let page = self.countries.list(Query::unpaged()).await?;
        info!("Loaded {} countries", page.items.len());
        book.replace_children(None, page.items)
    }

    /// Load the children of every selected level
    pub async fn load_children(
        &self,
        book: &mut AddressBook,
        selection: &AddressSelection,
    ) -> Result<(), AddressError> {
        if let Some(country_id) = selection.country {
            self.load_level::<Country, Province>(book, country_id).await?;
        }
        if let Some(province_id) = selection.province {
            self.load_level::<Province, District>(book, province_id).await?;
        }
        if let Some(district_id) = selection.district {
            self.load_level::<District, Municipality>(book, district_id).await?;
        }
        Ok(())
    }

    /// Create or update `node`, then place the saved version in the book
    pub async fn save<N: StoredNode>(&self, book: &mut AddressBook, node: N) -> Result<N, AddressError> {
        // Refuse orphans before anything reaches the backend
        book.check_parent(&node)?;

        let client = N::client(self);
        let saved = match node.id() {
            Some(_) => client.update(node).await?,
            None => client.create(node).await?,
        };
        book.upsert(saved.clone())?;
        Ok(saved)
    }

    /// Toggle a node's status and copy the refreshed node into the book
    pub async fn toggle_status<N: StoredNode>(
        &self,
        book: &mut AddressBook,
        id: u64,
    ) -> Result<(), AddressError> {
        let client = N::client(self);
        client.change_status(id).await?;

        if let Some(refreshed) = client.items().into_iter().find(|node| node.id() == Some(id)) {
            book.upsert(refreshed)?;
        }
        Ok(())
    }

    async fn load_level<P: StoredNode, N: StoredNode>(
        &self,
        book: &mut AddressBook,
        parent_id: u64,
    ) -> Result<(), AddressError> {
        let query = Query::unpaged().with_filter(P::CHILD_FILTER, parent_id);
        let page = N::client(self).list(query).await?;
        debug!(
            "Loaded {} {} under {} {}",
            page.items.len(),
            N::RESOURCE.name,
            P::RESOURCE.name,
            parent_id
        );
        book.replace_children(Some(parent_id), page.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use school_admin_data::repository::InMemoryResourceStore;
    use serde_json::json;

    fn country(id: u64, name: &str) -> Country {
        Country {
            id: Some(id),
            name: name.to_string(),
            code: None,
            status: true,
        }
    }

    fn province(id: u64, country_id: u64) -> Province {
        Province {
            id: Some(id),
            country_id,
            name: format!("Province {}", id),
            status: true,
        }
    }

    fn district(id: u64, province_id: u64) -> District {
        District {
            id: Some(id),
            province_id,
            name: format!("District {}", id),
            status: true,
        }
    }

    fn municipality(id: u64, district_id: u64) -> Municipality {
        Municipality {
            id: Some(id),
            district_id,
            name: format!("Municipality {}", id),
            wards: Some(9),
            status: true,
        }
    }

    fn seeded_book() -> AddressBook {
        let mut book = AddressBook::new();
        book.upsert(country(1, "Nepal")).unwrap();
        book.upsert(country(2, "India")).unwrap();
        book.upsert(province(10, 1)).unwrap();
        book.upsert(province(11, 1)).unwrap();
        book.upsert(province(20, 2)).unwrap();
        book.upsert(district(100, 10)).unwrap();
        book.upsert(district(101, 11)).unwrap();
        book.upsert(municipality(1000, 100)).unwrap();
        book.upsert(municipality(1001, 100)).unwrap();
        book
    }

    #[test]
    fn test_children_are_derived_from_parent_ids() {
        let book = seeded_book();
        let selection = AddressSelection::default().select_country(Some(1));

        let provinces: Vec<u64> = book.provinces_in(&selection).iter().filter_map(|p| p.id).collect();
        assert_eq!(provinces, vec![10, 11]);
        assert!(book.districts_in(&selection).is_empty());

        let selection = selection.select_province(Some(10)).select_district(Some(100));
        assert_eq!(book.districts_in(&selection).len(), 1);
        assert_eq!(book.municipalities_in(&selection).len(), 2);
    }

    #[test]
    fn test_upsert_replaces_single_entry() {
        let mut book = seeded_book();
        let mut renamed = province(10, 1);
        renamed.name = "Koshi".to_string();

        let previous = book.upsert(renamed).unwrap();
        assert_eq!(previous.unwrap().name, "Province 10");
        assert_eq!(book.provinces.get(10).unwrap().name, "Koshi");
        assert_eq!(book.provinces.len(), 3);
        assert_eq!(book.districts.len(), 2);
    }

    #[test]
    fn test_upsert_rejects_orphans_and_unsaved_nodes() {
        let mut book = seeded_book();
        assert_eq!(
            book.upsert(district(102, 99)).unwrap_err(),
            AddressError::UnknownParent {
                level: "districts",
                parent_id: 99
            }
        );

        let mut unsaved = country(3, "Bhutan");
        unsaved.id = None;
        assert!(matches!(book.upsert(unsaved), Err(AddressError::MissingIdentity(_))));
    }

    #[test]
    fn test_remove_cascades_to_descendants() {
        let mut book = seeded_book();
        let removed = book.remove::<Country>(1);
        assert_eq!(removed.unwrap().name, "Nepal");

        assert_eq!(book.countries.len(), 1);
        assert_eq!(book.provinces.iter().filter_map(|p| p.id).collect::<Vec<_>>(), vec![20]);
        assert!(book.districts.is_empty());
        assert!(book.municipalities.is_empty());
        assert!(book.remove::<Country>(1).is_none());
    }

    #[test]
    fn test_replace_children_drops_stale_branches() {
        let mut book = seeded_book();
        book.replace_children(Some(1), vec![province(11, 1), province(12, 1)])
            .unwrap();

        assert!(!book.provinces.contains(10));
        assert!(book.provinces.contains(12));
        assert!(book.provinces.contains(20));
        assert!(!book.districts.contains(100));
        assert!(book.municipalities.is_empty());
        assert!(book.districts.contains(101));
    }

    #[test]
    fn test_selecting_a_level_clears_the_ones_below() {
        let selection = AddressSelection::default()
            .select_country(Some(1))
            .select_province(Some(10))
            .select_district(Some(100));

        let changed = selection.select_country(Some(2));
        assert_eq!(changed, AddressSelection { country: Some(2), province: None, district: None });

        let changed = selection.select_province(Some(11));
        assert_eq!(changed.country, Some(1));
        assert_eq!(changed.district, None);
    }

    #[test]
    fn test_prune_after_removal() {
        let mut book = seeded_book();
        let selection = AddressSelection {
            country: Some(1),
            province: Some(10),
            district: Some(100),
        };
        assert_eq!(book.prune(selection), selection);

        book.remove::<Province>(10);
        assert_eq!(
            book.prune(selection),
            AddressSelection { country: Some(1), province: None, district: None }
        );
    }

    fn address_store() -> InMemoryResourceStore {
        InMemoryResourceStore::new()
            .with_items(
                "/addresses/countries",
                vec![json!({"id": 1, "name": "Nepal", "code": "NP"}), json!({"id": 2, "name": "India"})],
            )
            .with_items(
                "/addresses/provinces",
                vec![
                    json!({"id": 10, "country_id": 1, "name": "Koshi"}),
                    json!({"id": 11, "country_id": 1, "name": "Madhesh"}),
                    json!({"id": 20, "country_id": 2, "name": "Bihar"}),
                ],
            )
            .with_items(
                "/addresses/districts",
                vec![json!({"id": 100, "province_id": 10, "name": "Jhapa"})],
            )
    }

    #[tokio::test]
    async fn test_service_loads_levels_by_parent_filter() {
        let service = AddressService::new(Arc::new(address_store()));
        let mut book = AddressBook::new();

        service.load_countries(&mut book).await.unwrap();
        assert_eq!(book.countries.len(), 2);

        let selection = AddressSelection::default().select_country(Some(1)).select_province(Some(10));
        service.load_children(&mut book, &selection).await.unwrap();

        let provinces: Vec<&str> = book.provinces_in(&selection).iter().map(|p| p.name.as_str()).collect();
        assert_eq!(provinces, vec!["Koshi", "Madhesh"]);
        assert!(!book.provinces.contains(20));
        assert_eq!(book.districts_in(&selection).len(), 1);
    }

    #[tokio::test]
    async fn test_service_saves_into_book() {
        let store = address_store();
        let service = AddressService::new(Arc::new(store.clone()));
        let mut book = AddressBook::new();
        service.load_countries(&mut book).await.unwrap();

        let draft = Province {
            id: None,
            country_id: 1,
            name: "Bagmati".to_string(),
            status: true,
        };
        let saved = service.save(&mut book, draft).await.unwrap();
        assert_eq!(saved.id, Some(21));
        assert_eq!(book.provinces.get(21).unwrap().name, "Bagmati");
        assert_eq!(store.len("/addresses/provinces").unwrap(), 4);

        let orphan = Province {
            id: None,
            country_id: 9,
            name: "Nowhere".to_string(),
            status: true,
        };
        let error = service.save(&mut book, orphan).await.unwrap_err();
        assert!(matches!(error, AddressError::UnknownParent { parent_id: 9, .. }));
        assert_eq!(store.len("/addresses/provinces").unwrap(), 4);
    }

    #[tokio::test]
    async fn test_service_toggles_status() {
        let service = AddressService::new(Arc::new(address_store()));
        let mut book = AddressBook::new();
        service.load_countries(&mut book).await.unwrap();

        service.toggle_status::<Country>(&mut book, 2).await.unwrap();
        assert!(!book.countries.get(2).unwrap().status);
        assert!(book.countries.get(1).unwrap().status);
    }
}
