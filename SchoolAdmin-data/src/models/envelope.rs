use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Label the backend uses for the "previous page" pager entry
pub const PREVIOUS_LABEL: &str = "&laquo; Previous";

/// Label the backend uses for the "next page" pager entry
pub const NEXT_LABEL: &str = "Next &raquo;";

/// Envelope returned by collection list endpoints
///
/// `links` and `meta` are absent when the collection was requested unpaged
/// (no `per_page` parameter), in which case `data` holds every item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListResponse<T> {
    /// Items of the requested page
    pub data: Vec<T>,

    /// First/prev/next/last navigation URLs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<PageLinks>,

    /// Page counters and pager entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

/// Envelope returned by single-item reads and by mutations
///
/// Mutations only guarantee `data`; reads also carry `links`/`meta`, which
/// nothing downstream consumes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemResponse<T> {
    pub data: T,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl<T> ItemResponse<T> {
    /// Wrap a bare item
    pub fn new(data: T) -> Self {
        Self {
            data,
            links: None,
            meta: None,
        }
    }
}

/// Edge links of a page
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageLinks {
    #[serde(default)]
    pub first: Option<String>,
    #[serde(default)]
    pub last: Option<String>,
    #[serde(default)]
    pub prev: Option<String>,
    #[serde(default)]
    pub next: Option<String>,
}

/// A single pager entry as rendered by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetaLink {
    pub url: Option<String>,
    pub label: String,
    #[serde(default)]
    pub active: bool,
}

/// Page counters of a list response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageMeta {
    pub current_page: u32,
    pub last_page: u32,
    pub per_page: u32,
    /// 1-based index of the first item on the page, null when the page is empty
    #[serde(default)]
    pub from: Option<u64>,
    /// 1-based index of the last item on the page, null when the page is empty
    #[serde(default)]
    pub to: Option<u64>,
    pub total: u64,
    #[serde(default)]
    pub links: Vec<MetaLink>,
    #[serde(default)]
    pub path: String,
}

impl PageMeta {
    /// Build the counters for page `current_page` of a collection holding
    /// `total` items split into pages of `per_page`
    ///
    /// Mirrors what the backend reports: `last_page` is at least 1, and a
    /// page past the end keeps its number but has no `from`/`to`.
    pub fn paginate(path: &str, total: u64, per_page: u32, current_page: u32) -> Self {
        let per_page = per_page.max(1);
        let current_page = current_page.max(1);
        let last_page = total.div_ceil(u64::from(per_page)).max(1) as u32;

        let first_index = u64::from(current_page - 1) * u64::from(per_page);
        let (from, to) = if first_index < total {
            let to = (first_index + u64::from(per_page)).min(total);
            (Some(first_index + 1), Some(to))
        } else {
            (None, None)
        };

        let mut links = Vec::with_capacity(last_page as usize + 2);
        links.push(MetaLink {
            url: (current_page > 1).then(|| page_url(path, current_page - 1)),
            label: PREVIOUS_LABEL.to_string(),
            active: false,
        });
        links.extend((1..=last_page).map(|page| MetaLink {
            url: Some(page_url(path, page)),
            label: page.to_string(),
            active: page == current_page,
        }));
        links.push(MetaLink {
            url: (current_page < last_page).then(|| page_url(path, current_page + 1)),
            label: NEXT_LABEL.to_string(),
            active: false,
        });

        Self {
            current_page,
            last_page,
            per_page,
            from,
            to,
            total,
            links,
            path: path.to_string(),
        }
    }

    /// Edge links matching these counters
    pub fn edge_links(&self) -> PageLinks {
        PageLinks {
            first: Some(page_url(&self.path, 1)),
            last: Some(page_url(&self.path, self.last_page)),
            prev: (self.current_page > 1).then(|| page_url(&self.path, self.current_page - 1)),
            next: (self.current_page < self.last_page)
                .then(|| page_url(&self.path, self.current_page + 1)),
        }
    }
}

fn page_url(path: &str, page: u32) -> String {
    format!("{}?page={}", path, page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_paged_envelope() {
        let body = json!({
            "data": [{"id": 1, "name": "Science"}],
            "links": {
                "first": "http://school.test/api/academics/faculties?page=1",
                "last": "http://school.test/api/academics/faculties?page=3",
                "prev": null,
                "next": "http://school.test/api/academics/faculties?page=2"
            },
            "meta": {
                "current_page": 1,
                "from": 1,
                "last_page": 3,
                "links": [
                    {"url": null, "label": "&laquo; Previous", "active": false},
                    {"url": "http://school.test/api/academics/faculties?page=1", "label": "1", "active": true}
                ],
                "path": "http://school.test/api/academics/faculties",
                "per_page": 10,
                "to": 10,
                "total": 25
            }
        });

        let response: ListResponse<Value> = serde_json::from_value(body).unwrap();
        let meta = response.meta.unwrap();
        assert_eq!(meta.total, 25);
        assert_eq!(meta.last_page, 3);
        assert_eq!(meta.links.len(), 2);
        assert!(meta.links[1].active);
        let links = response.links.unwrap();
        assert!(links.prev.is_none());
        assert!(links.next.unwrap().ends_with("page=2"));
    }

    #[test]
    fn test_decode_unpaged_envelope() {
        let response: ListResponse<Value> =
            serde_json::from_value(json!({"data": [{"id": 1}, {"id": 2}]})).unwrap();
        assert_eq!(response.data.len(), 2);
        assert!(response.links.is_none());
        assert!(response.meta.is_none());
    }

    #[test]
    fn test_paginate_middle_page() {
        let meta = PageMeta::paginate("/academics/subjects", 25, 10, 2);
        assert_eq!(meta.last_page, 3);
        assert_eq!(meta.from, Some(11));
        assert_eq!(meta.to, Some(20));

        // previous, three numbered pages, next
        assert_eq!(meta.links.len(), 5);
        assert_eq!(meta.links[0].url.as_deref(), Some("/academics/subjects?page=1"));
        assert!(meta.links[2].active);
        assert_eq!(meta.links[4].url.as_deref(), Some("/academics/subjects?page=3"));
    }

    #[test]
    fn test_paginate_empty_collection() {
        let meta = PageMeta::paginate("/transportation/vehicles", 0, 10, 1);
        assert_eq!(meta.current_page, 1);
        assert_eq!(meta.last_page, 1);
        assert_eq!(meta.from, None);
        assert_eq!(meta.to, None);

        let links = meta.edge_links();
        assert!(links.prev.is_none());
        assert!(links.next.is_none());
    }

    #[test]
    fn test_paginate_past_the_end() {
        let meta = PageMeta::paginate("/academics/subjects", 5, 10, 4);
        assert_eq!(meta.current_page, 4);
        assert_eq!(meta.last_page, 1);
        assert!(meta.from.is_none());
        assert!(meta.edge_links().next.is_none());
    }
}
