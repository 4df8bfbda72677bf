//! Item read operations: lookup, counts, eligible pages.

use anyhow::{anyhow, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

use super::super::db::ItemDb;
use super::super::query::EligibleQuery;
use super::super::types::{ItemRecord, StateCounts};
use crate::fetch_head::ResponseHeaders;
use crate::item::{FetchItem, ItemId, ItemState};
use crate::objects::ContentId;

fn row_hash(row: &SqliteRow) -> Result<ContentId> {
    let id: i64 = row.get("id");
    let hash: String = row.get("hash");
    ContentId::parse(&hash).ok_or_else(|| anyhow!("item {id} has an invalid hash {hash:?}"))
}

fn row_to_record(row: &SqliteRow) -> Result<ItemRecord> {
    let state: String = row.get("state");
    let status: Option<i64> = row.get("status");
    let headers_json: Option<String> = row.get("headers_json");
    let headers = match headers_json {
        Some(json) => Some(serde_json::from_str::<ResponseHeaders>(&json)?),
        None => None,
    };
    Ok(ItemRecord {
        id: row.get("id"),
        hash: row_hash(row)?,
        url: row.get("url"),
        state: ItemState::from_str(&state),
        status: status.and_then(|s| u16::try_from(s).ok()),
        etag: row.get("etag"),
        etag_hash: row.get("etag_hash"),
        last_modified: row.get("last_modified"),
        content_length: row.get("content_length"),
        headers,
        created_at: row.get("created_at"),
        checked_at: row.get("checked_at"),
    })
}

impl ItemDb {
    /// Fetch a single item by id.
    pub async fn get_item(&self, id: ItemId) -> Result<Option<ItemRecord>> {
        let row = sqlx::query("SELECT * FROM items WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_record).transpose()
    }

    /// Fetch a single item by content hash.
    pub async fn get_item_by_hash(&self, hash: &ContentId) -> Result<Option<ItemRecord>> {
        let row = sqlx::query("SELECT * FROM items WHERE hash = ?1")
            .bind(hash.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_record).transpose()
    }

    /// Count items per state.
    pub async fn state_counts(&self) -> Result<StateCounts> {
        let rows = sqlx::query("SELECT state, COUNT(*) AS n FROM items GROUP BY state")
            .fetch_all(&self.pool)
            .await?;
        let mut counts = StateCounts::default();
        for row in rows {
            let state: String = row.get("state");
            let n: i64 = row.get("n");
            let n = n.max(0) as u64;
            match ItemState::from_str(&state) {
                ItemState::Unchecked => counts.unchecked += n,
                ItemState::Found => counts.found += n,
                ItemState::NotFound => counts.not_found += n,
            }
        }
        Ok(counts)
    }

    /// Hashes of every item in the Found state, in id order.
    pub async fn found_hashes(&self) -> Result<Vec<ContentId>> {
        let rows = sqlx::query("SELECT id, hash FROM items WHERE state = 'found' ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_hash).collect()
    }

    /// Up to `limit` eligible items with id greater than `after`, in id order.
    pub async fn eligible_page(
        &self,
        query: &EligibleQuery,
        after: Option<ItemId>,
        limit: usize,
    ) -> Result<Vec<FetchItem>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT id, hash, url FROM items WHERE ");
        if query.include_not_found {
            qb.push("state IN ('unchecked', 'not_found')");
        } else {
            qb.push("state = 'unchecked'");
        }
        if let Some(after) = after {
            qb.push(" AND id > ").push_bind(after);
        }
        if !query.filter.url_prefixes.is_empty() {
            qb.push(" AND (");
            let mut any = qb.separated(" OR ");
            for prefix in &query.filter.url_prefixes {
                any.push("instr(url, ");
                any.push_bind_unseparated(prefix.clone());
                any.push_unseparated(") = 1");
            }
            qb.push(")");
        }
        if !query.filter.hash_prefixes.is_empty() {
            qb.push(" AND (");
            let mut any = qb.separated(" OR ");
            for prefix in &query.filter.hash_prefixes {
                any.push("instr(hash, ");
                any.push_bind_unseparated(prefix.clone());
                any.push_unseparated(") = 1");
            }
            qb.push(")");
        }
        qb.push(" ORDER BY id LIMIT ").push_bind(limit as i64);

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                Ok(FetchItem {
                    id: row.get("id"),
                    hash: row_hash(row)?,
                    url: row.get("url"),
                })
            })
            .collect()
    }
}
