//! Store interface consumed by the pipeline, and the lazy eligible-item stream.

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{self, Stream, TryStreamExt};
use std::sync::Arc;

use super::db::ItemDb;
use crate::config::Filter;
use crate::fetcher::FetchResult;
use crate::item::{FetchItem, ItemId};

/// Which items a run should probe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EligibleQuery {
    /// Also include items previously marked not_found (recheck).
    pub include_not_found: bool,
    pub filter: Filter,
}

impl EligibleQuery {
    pub fn new(include_not_found: bool, filter: Filter) -> Self {
        Self {
            include_not_found,
            filter,
        }
    }
}

/// Persistence used by the fetch pipeline.
#[async_trait]
pub trait ItemStore: Send + Sync + 'static {
    /// Up to `limit` eligible items with id greater than `after`, ascending by id.
    async fn eligible_page(
        &self,
        query: &EligibleQuery,
        after: Option<ItemId>,
        limit: usize,
    ) -> Result<Vec<FetchItem>>;

    /// Durably apply a batch of results, all or nothing.
    async fn commit_batch(&self, batch: &[FetchResult]) -> Result<()>;
}

#[async_trait]
impl ItemStore for ItemDb {
    async fn eligible_page(
        &self,
        query: &EligibleQuery,
        after: Option<ItemId>,
        limit: usize,
    ) -> Result<Vec<FetchItem>> {
        ItemDb::eligible_page(self, query, after, limit).await
    }

    async fn commit_batch(&self, batch: &[FetchResult]) -> Result<()> {
        ItemDb::commit_batch(self, batch).await
    }
}

/// Lazily page through eligible items, `page_size` rows per query.
///
/// Pages are keyed on the last seen id, so items committed while the stream
/// is being read are never revisited within the same run.
pub fn next_eligible<S: ItemStore>(
    store: Arc<S>,
    query: EligibleQuery,
    page_size: usize,
) -> impl Stream<Item = Result<FetchItem>> + Send + 'static {
    let page_size = page_size.max(1);
    stream::try_unfold(
        (store, query, None::<ItemId>, false),
        move |(store, query, after, exhausted)| async move {
            if exhausted {
                return Ok::<_, anyhow::Error>(None);
            }
            let page = store.eligible_page(&query, after, page_size).await?;
            if page.is_empty() {
                return Ok(None);
            }
            let exhausted = page.len() < page_size;
            let after = page.last().map(|item| item.id);
            let items = stream::iter(page.into_iter().map(Ok::<_, anyhow::Error>));
            Ok(Some((items, (store, query, after, exhausted))))
        },
    )
    .try_flatten()
}
