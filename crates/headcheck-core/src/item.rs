//! Items tracked in the database and handed to the probe pipeline.

use crate::objects::ContentId;

/// Row identifier of an item.
pub type ItemId = i64;

/// Persisted check state of an item, stored as a string in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemState {
    /// Never successfully probed.
    Unchecked,
    /// Remote resource answered 2xx; headers recorded.
    Found,
    /// Remote resource is definitively gone (404/410).
    NotFound,
}

impl ItemState {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemState::Unchecked => "unchecked",
            ItemState::Found => "found",
            ItemState::NotFound => "not_found",
        }
    }

    /// Unknown strings map to `Unchecked` so the item gets probed again.
    pub fn from_str(s: &str) -> Self {
        match s {
            "found" => ItemState::Found,
            "not_found" => ItemState::NotFound,
            _ => ItemState::Unchecked,
        }
    }
}

/// One unit of work: an item and the URL to probe for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchItem {
    pub id: ItemId,
    pub hash: ContentId,
    pub url: String,
}
