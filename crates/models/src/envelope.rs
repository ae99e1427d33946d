//! Response envelopes of the content API and the page type built from them.

use serde::{Deserialize, Serialize};
use utils::pagination;

/// `{ "data": ... }` wrapper used for single records and request bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListEnvelope<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub meta: ListMeta,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListMeta {
    #[serde(default)]
    pub pagination: PaginationMeta,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationMeta {
    #[serde(default)]
    pub page: u32,
    #[serde(default, rename = "pageSize")]
    pub page_size: u32,
    #[serde(default, rename = "pageCount")]
    pub page_count: u32,
    #[serde(default)]
    pub total: u64,
}

/// `{ "error": { "status", "name", "message" } }`
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub status: Option<u16>,
    pub name: Option<String>,
    pub message: Option<String>,
}

/// One page of a list query, in server order.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn from_envelope(envelope: ListEnvelope<T>, page: u32, page_size: u32) -> Self {
        Self {
            items: envelope.data,
            total: envelope.meta.pagination.total,
            page,
            page_size,
        }
    }

    pub fn total_pages(&self) -> u32 {
        pagination::total_pages(self.total, self.page_size)
    }

    pub fn has_room(&self) -> bool {
        self.items.len() < self.page_size as usize
    }

    /// Whether the list position `index` (zero-based) falls on this page.
    pub fn covers(&self, index: u64) -> bool {
        let page_size = u64::from(self.page_size);
        let start = u64::from(self.page.saturating_sub(1)) * page_size;
        index >= start && index < start + page_size
    }
}

impl<T: Clone> Page<T> {
    /// Copy of this page with `item` appended when it is the page the old
    /// total lands on and it is not full. Other pages only see the total grow.
    pub fn appended(&self, item: T) -> Self {
        let mut next = self.clone();
        if next.covers(self.total) && next.has_room() {
            next.items.push(item);
        }
        next.total += 1;
        next
    }
}
