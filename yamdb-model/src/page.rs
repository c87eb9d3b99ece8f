use serde::{Deserialize, Serialize};

/// One-based page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    pub fn first(page_size: u32) -> Self {
        Self::new(1, page_size)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }

    /// Applies the window to an already materialized, ordered list.
    pub fn slice<T: Clone>(&self, items: &[T]) -> Page<T> {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let window = items
            .iter()
            .skip(start)
            .take(self.page_size as usize)
            .cloned()
            .collect();
        Page {
            count: items.len() as u64,
            items: window,
        }
    }
}

/// A window of results plus the total number of matching rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            count: 0,
            items: Vec::new(),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            items: self.items.into_iter().map(f).collect(),
        }
    }

    /// Pages past the first must start inside the result set.
    pub fn is_in_range(&self, request: &PageRequest) -> bool {
        request.page == 1 || request.offset() < self.count
    }

    pub fn has_next(&self, request: &PageRequest) -> bool {
        request.offset() + (self.items.len() as u64) < self.count
    }
}
