//! Pagination math for list pages. Page numbers start at 1 and page `n`
//! covers items `[(n-1)*per_page, n*per_page)`. Nothing is clamped: the
//! static route generator only ever asks for pages `1..=total_pages`.

use std::ops::{Range, RangeInclusive};

use serde::{Deserialize, Serialize};

/// The position of one list page among its siblings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
}

/// Computes the page count for `total_items`. No items (or a page size of
/// zero) means no pages.
pub fn paginate(total_items: usize, items_per_page: usize, current_page: usize) -> Pagination {
    let total_pages = match items_per_page {
        0 => 0,
        _ => total_items.div_ceil(items_per_page),
    };
    Pagination {
        current_page,
        total_pages,
    }
}

/// The index range page `page` covers, before clipping to the item count.
/// A window that can't be addressed is empty.
pub fn page_window(page: usize, items_per_page: usize) -> Range<usize> {
    match page.saturating_sub(1).checked_mul(items_per_page) {
        Some(start) => start..start.saturating_add(items_per_page),
        None => usize::MAX..usize::MAX,
    }
}

/// The items on page `page`. Pages past the end are empty.
pub fn page_items<T>(items: &[T], page: usize, items_per_page: usize) -> &[T] {
    let window = page_window(page, items_per_page);
    let end = window.end.min(items.len());
    let start = window.start.min(end);
    &items[start..end]
}

/// The page numbers a static route generator should emit: `1..=total_pages`,
/// empty when there are no pages.
pub fn page_routes(total_pages: usize) -> RangeInclusive<usize> {
    1..=total_pages
}

/// Links to the neighboring pages of a section. `None` means the control is
/// disabled.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLinks {
    pub prev: Option<String>,
    pub next: Option<String>,
}

impl Pagination {
    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Builds the navigation links for this page of `section`. The first page
    /// lives at `/{section}/`, later pages at `/{section}/page/{n}`.
    pub fn links(&self, section: &str) -> PageLinks {
        PageLinks {
            prev: match self.has_prev() {
                false => None,
                true => Some(page_path(section, self.current_page - 1)),
            },
            next: match self.has_next() {
                false => None,
                true => Some(page_path(section, self.current_page + 1)),
            },
        }
    }
}

/// The route of page `page` of `section`.
pub fn page_path(section: &str, page: usize) -> String {
    match page {
        0 | 1 => format!("/{}/", section),
        _ => format!("/{}/page/{}", section, page),
    }
}

/// One list page: its slice of items, its position and its navigation.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub pagination: Pagination,
    pub links: PageLinks,
}

/// Splits `items` into pages of `items_per_page` for `section`.
pub fn pages<'a, T>(items: &'a [T], items_per_page: usize, section: &str) -> Vec<Page<'a, T>> {
    if items_per_page == 0 {
        return Vec::new();
    }
    items
        .chunks(items_per_page)
        .enumerate()
        .map(|(i, chunk)| {
            let pagination = paginate(items.len(), items_per_page, i + 1);
            Page {
                items: chunk,
                links: pagination.links(section),
                pagination,
            }
        })
        .collect()
}
