// Pagination - fixed-size slicing of ordered result sets with navigation metadata

use serde::Serialize;

/// Posts shown per feed page.
pub const POSTS_PER_PAGE: u32 = 10;

/// A bounded slice of an ordered result set plus navigation metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub number: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub has_next: bool,
    pub has_previous: bool,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn from_slice(slice: &Slice, items: Vec<T>) -> Self {
        Self {
            number: slice.number,
            total_pages: slice.total_pages,
            total_items: slice.total_items,
            has_next: slice.number < slice.total_pages,
            has_previous: slice.number > 1,
            items,
        }
    }
}

/// A resolved page position: where in the ordered set to read from.
#[derive(Debug, Clone, Copy)]
pub struct Slice {
    pub number: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub limit: u32,
    pub offset: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    page_size: u32,
}

impl Paginator {
    pub fn new(page_size: u32) -> Self {
        // A zero page size would never terminate a feed walk.
        Self {
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of pages needed for `total_items`; an empty set still has one page.
    pub fn page_count(&self, total_items: u64) -> u32 {
        let size = self.page_size as u64;
        (total_items.div_ceil(size)).max(1) as u32
    }

    /// Resolve a requested 1-based page number against the item count.
    ///
    /// Absent or unparsable requests default to page 1; out-of-range requests
    /// clamp to the nearest valid page rather than erroring.
    pub fn slice(&self, total_items: u64, requested: Option<u32>) -> Slice {
        let total_pages = self.page_count(total_items);
        let number = requested.unwrap_or(1).clamp(1, total_pages);
        Slice {
            number,
            total_pages,
            total_items,
            limit: self.page_size,
            offset: (number as u64 - 1) * self.page_size as u64,
        }
    }

    /// In-memory variant of the contract for already-materialized sequences.
    pub fn paginate<T>(&self, items: Vec<T>, requested: Option<u32>) -> Page<T> {
        let slice = self.slice(items.len() as u64, requested);
        let page_items = items
            .into_iter()
            .skip(slice.offset as usize)
            .take(slice.limit as usize)
            .collect();
        Page::from_slice(&slice, page_items)
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(POSTS_PER_PAGE)
    }
}
