use serde::{Deserialize, Serialize};

/// Parameters of a collection list request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    /// Free-text search term, empty for no filter
    pub search: String,

    /// Page size; `None` requests the whole collection unpaged
    pub per_page: Option<u32>,

    /// Requested page, only sent together with `per_page`
    pub page: Option<u32>,

    /// Extra equality filters such as `country_id`
    pub filters: Vec<(String, String)>,
}

impl ListParams {
    /// Query-string pairs in the order the backend documents them:
    /// `per_page`, `page`, `search`, then any filters.
    ///
    /// `page` is dropped whenever `per_page` is absent.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(3 + self.filters.len());

        if let Some(per_page) = self.per_page {
            pairs.push(("per_page".to_string(), per_page.to_string()));
            if let Some(page) = self.page {
                pairs.push(("page".to_string(), page.to_string()));
            }
        }

        pairs.push(("search".to_string(), self.search.clone()));
        pairs.extend(self.filters.iter().cloned());

        pairs
    }
}

/// Body of a status toggle request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusChangeRequest {
    pub id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paged_pairs() {
        let params = ListParams {
            search: String::new(),
            per_page: Some(10),
            page: Some(1),
            filters: Vec::new(),
        };

        let pairs = params.to_query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("per_page".to_string(), "10".to_string()),
                ("page".to_string(), "1".to_string()),
                ("search".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_unpaged_pairs_omit_page() {
        let params = ListParams {
            search: "math".to_string(),
            per_page: None,
            page: Some(3),
            filters: vec![("country_id".to_string(), "1".to_string())],
        };

        let pairs = params.to_query_pairs();
        assert!(pairs.iter().all(|(key, _)| key != "page" && key != "per_page"));
        assert_eq!(pairs[0], ("search".to_string(), "math".to_string()));
        assert_eq!(pairs[1], ("country_id".to_string(), "1".to_string()));
    }
}
