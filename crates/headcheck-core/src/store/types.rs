//! Types used by the item database.

use crate::fetch_head::ResponseHeaders;
use crate::item::{ItemId, ItemState};
use crate::objects::ContentId;

/// Full item row.
#[derive(Debug, Clone)]
pub struct ItemRecord {
    pub id: ItemId,
    pub hash: ContentId,
    pub url: String,
    pub state: ItemState,
    pub status: Option<u16>,
    pub etag: Option<String>,
    pub etag_hash: Option<String>,
    pub last_modified: Option<String>,
    pub content_length: Option<i64>,
    pub headers: Option<ResponseHeaders>,
    pub created_at: i64,
    pub checked_at: Option<i64>,
}

/// Number of items per state, used by `status`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateCounts {
    pub unchecked: u64,
    pub found: u64,
    pub not_found: u64,
}

impl StateCounts {
    pub fn total(&self) -> u64 {
        self.unchecked + self.found + self.not_found
    }
}
