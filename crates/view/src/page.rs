//! Pagination.

use serde::{Deserialize, Serialize};

/// One page of a sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Zero-based page index
    pub page: usize,
    /// Requested page size
    pub page_size: usize,
    /// Length of the whole sequence
    pub total_elements: usize,
    /// Number of non-empty pages
    pub total_pages: usize,
    /// A later page has items
    pub has_next: bool,
    /// An earlier page exists
    pub has_previous: bool,
}

/// Slice `page * page_size .. page * page_size + page_size` out of `items`.
///
/// Pages past the end are empty. A page size of 0 yields empty pages.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let total_elements = items.len();
    let total_pages = if page_size == 0 {
        0
    } else {
        total_elements.div_ceil(page_size)
    };

    let start = page.saturating_mul(page_size).min(total_elements);
    let end = start.saturating_add(page_size).min(total_elements);

    Page {
        items: items[start..end].to_vec(),
        page,
        page_size,
        total_elements,
        total_pages,
        has_next: page + 1 < total_pages,
        has_previous: page > 0,
    }
}
