//! Pagination state of a fetched page
//!
//! Normalizes the counters sent by the backend so that
//! `1 <= current_page <= last_page` always holds, and derives what pager
//! controls need: edge links, previous/next availability and a compact
//! window of page numbers.

use school_admin_data::models::{MetaLink, PageLinks, PageMeta};

/// One fetched slice of a resource
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// Normalized page counters and navigation links
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub current_page: u32,
    pub last_page: u32,
    pub per_page: u32,
    pub from: Option<u64>,
    pub to: Option<u64>,
    pub total: u64,
    /// First/prev/next/last URLs
    pub links: PageLinks,
    /// Pager entries as rendered by the backend
    pub pager: Vec<MetaLink>,
    pub path: String,
}

impl Pagination {
    /// Build from the envelope's `meta` and `links`
    pub fn from_meta(meta: PageMeta, links: Option<PageLinks>) -> Self {
        let last_page = meta.last_page.max(1);
        let current_page = if meta.total == 0 {
            1
        } else {
            meta.current_page.clamp(1, last_page)
        };

        Self {
            current_page,
            last_page,
            per_page: meta.per_page,
            from: meta.from,
            to: meta.to,
            total: meta.total,
            links: links.unwrap_or_default(),
            pager: meta.links,
            path: meta.path,
        }
    }

    /// Counters for an unpaged response holding `count` items
    pub fn single_page(count: usize) -> Self {
        let count = count as u64;
        Self {
            current_page: 1,
            last_page: 1,
            per_page: count as u32,
            from: (count > 0).then_some(1),
            to: (count > 0).then_some(count),
            total: count,
            links: PageLinks::default(),
            pager: Vec::new(),
            path: String::new(),
        }
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.last_page
    }

    /// Page numbers to show, `None` standing for an ellipsis
    pub fn page_window(&self) -> Vec<Option<u32>> {
        page_window(self.last_page, self.current_page, 2, 2, 4, 2)
    }

    /// "Showing X to Y of Z" line
    pub fn summary(&self) -> String {
        match (self.from, self.to) {
            (Some(from), Some(to)) => format!("Showing {} to {} of {} entries", from, to, self.total),
            _ => format!("Showing 0 of {} entries", self.total),
        }
    }
}

/// Pages to render for a pager: a few at each edge, a few around the current
/// page, gaps marked with `None`
pub fn page_window(
    total_pages: u32,
    current_page: u32,
    left_edge: u32,
    left_current: u32,
    right_current: u32,
    right_edge: u32,
) -> Vec<Option<u32>> {
    let last_page = total_pages;

    if last_page == 0 {
        return vec![];
    }

    let mut pages = Vec::new();

    let left_end = (1 + left_edge).min(last_page + 1);
    pages.extend((1..left_end).map(Some));

    let mid_start = left_end.max(current_page.saturating_sub(left_current));
    let mid_end = (current_page + right_current + 1).min(last_page + 1);

    if mid_start > left_end {
        pages.push(None);
    }
    pages.extend((mid_start..mid_end).map(Some));

    let right_start = mid_end.max(last_page.saturating_sub(right_edge) + 1);

    if right_start > mid_end {
        pages.push(None);
    }
    pages.extend((right_start..=last_page).map(Some));

    pages
}
