/// Page size selected when a screen opens
pub const DEFAULT_ITEMS_PER_PAGE: u32 = 10;

/// Choices offered by page-size selectors; `None` is the "All" option
pub const PAGE_SIZE_OPTIONS: [Option<u32>; 5] = [Some(10), Some(25), Some(50), Some(100), None];

/// Client-chosen parameters deciding which page is requested
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Free-text search, empty for no filter
    pub search: String,

    /// Page size; `None` requests the whole collection unpaged
    pub items_per_page: Option<u32>,

    /// 1-based page number, ignored while `items_per_page` is `None`
    pub current_page: u32,

    /// Parent/child selector filters such as `country_id`
    pub filters: Vec<(String, String)>,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            search: String::new(),
            items_per_page: Some(DEFAULT_ITEMS_PER_PAGE),
            current_page: 1,
            filters: Vec::new(),
        }
    }
}

impl Query {
    /// A query for the whole collection
    pub fn unpaged() -> Self {
        Self {
            items_per_page: None,
            ..Self::default()
        }
    }

    /// Replace the search term; back to the first page
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self.current_page = 1;
        self
    }

    /// Change the page size (`None` = all); back to the first page
    pub fn with_items_per_page(mut self, items_per_page: Option<u32>) -> Self {
        self.items_per_page = items_per_page.map(|size| size.max(1));
        self.current_page = 1;
        self
    }

    /// Jump to a page
    pub fn with_page(mut self, page: u32) -> Self {
        self.current_page = page.max(1);
        self
    }

    /// Set or replace an equality filter; back to the first page
    pub fn with_filter(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let key = key.into();
        let value = value.to_string();
        match self.filters.iter_mut().find(|(existing, _)| *existing == key) {
            Some(filter) => filter.1 = value,
            None => self.filters.push((key, value)),
        }
        self.current_page = 1;
        self
    }

    /// Whether the query pages through the collection
    pub fn is_paged(&self) -> bool {
        self.items_per_page.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let query = Query::default();
        assert_eq!(query.search, "");
        assert_eq!(query.items_per_page, Some(10));
        assert_eq!(query.current_page, 1);
        assert!(query.is_paged());
    }

    #[test]
    fn test_search_and_size_reset_page() {
        let query = Query::default().with_page(4).with_search("math");
        assert_eq!(query.current_page, 1);

        let query = query.with_page(3).with_items_per_page(Some(25));
        assert_eq!(query.current_page, 1);
        assert_eq!(query.items_per_page, Some(25));

        let query = query.with_page(0);
        assert_eq!(query.current_page, 1);
    }

    #[test]
    fn test_filters_replace_by_key() {
        let query = Query::unpaged()
            .with_filter("country_id", 1)
            .with_filter("country_id", 2);
        assert_eq!(query.filters, vec![("country_id".to_string(), "2".to_string())]);
        assert!(!query.is_paged());
    }
}
