//! Item write operations: add, bulk import, batch commit.

use anyhow::{Context, Result};

use super::super::db::{unix_timestamp, ItemDb};
use crate::fetcher::{FetchOutcome, FetchResult};
use crate::item::{ItemId, ItemState};
use crate::objects::ContentId;

fn check_url(url: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("invalid URL {url:?}"))?;
    Ok(())
}

impl ItemDb {
    /// Insert a new unchecked item. Fails if the hash is already present.
    pub async fn add_item(&self, hash: &ContentId, url: &str) -> Result<ItemId> {
        check_url(url)?;
        let now = unix_timestamp();
        let row_id = sqlx::query(
            r#"
            INSERT INTO items (hash, url, state, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(hash.as_str())
        .bind(url)
        .bind(ItemState::Unchecked.as_str())
        .bind(now)
        .execute(&self.pool)
        .await
        .with_context(|| format!("insert item {hash}"))?
        .last_insert_rowid();

        Ok(row_id)
    }

    /// Insert many items in one transaction. Hashes already present are
    /// skipped. Returns the number of rows inserted.
    pub async fn add_items(&self, items: &[(ContentId, String)]) -> Result<u64> {
        for (_, url) in items {
            check_url(url)?;
        }
        let now = unix_timestamp();
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;
        for (hash, url) in items {
            let r = sqlx::query(
                r#"
                INSERT OR IGNORE INTO items (hash, url, state, created_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(hash.as_str())
            .bind(url)
            .bind(ItemState::Unchecked.as_str())
            .bind(now)
            .execute(&mut *tx)
            .await?;
            inserted += r.rows_affected();
        }
        tx.commit().await?;
        Ok(inserted)
    }

    /// Apply a batch of probe results in a single transaction.
    ///
    /// Found results record the response headers, NotFound results set the
    /// not_found state, error results leave the item untouched. Either the
    /// whole batch is applied or none of it.
    pub async fn commit_batch(&self, batch: &[FetchResult]) -> Result<()> {
        let now = unix_timestamp();
        let mut tx = self.pool.begin().await?;
        for r in batch {
            match &r.outcome {
                FetchOutcome::Found {
                    status,
                    etag_hash,
                    headers,
                } => {
                    if let Some(h) = etag_hash {
                        if h != &r.item.hash {
                            tracing::debug!(
                                hash = %r.item.hash,
                                etag_hash = %h,
                                "ETag hash differs from item hash"
                            );
                        }
                    }
                    let headers_json =
                        serde_json::to_string(headers).context("serialize headers")?;
                    sqlx::query(
                        r#"
                        UPDATE items
                        SET state = ?1,
                            status = ?2,
                            etag = ?3,
                            etag_hash = ?4,
                            last_modified = ?5,
                            content_length = ?6,
                            headers_json = ?7,
                            checked_at = ?8
                        WHERE id = ?9
                        "#,
                    )
                    .bind(ItemState::Found.as_str())
                    .bind(i64::from(*status))
                    .bind(headers.etag())
                    .bind(etag_hash.as_ref().map(ContentId::as_str))
                    .bind(headers.last_modified())
                    // Lengths beyond i64 are stored as NULL; the raw header stays in headers_json.
                    .bind(headers.content_length().and_then(|n| i64::try_from(n).ok()))
                    .bind(headers_json)
                    .bind(now)
                    .bind(r.item.id)
                    .execute(&mut *tx)
                    .await?;
                }
                FetchOutcome::NotFound { status } => {
                    sqlx::query(
                        r#"
                        UPDATE items
                        SET state = ?1,
                            status = ?2,
                            checked_at = ?3
                        WHERE id = ?4
                        "#,
                    )
                    .bind(ItemState::NotFound.as_str())
                    .bind(i64::from(*status))
                    .bind(now)
                    .bind(r.item.id)
                    .execute(&mut *tx)
                    .await?;
                }
                FetchOutcome::TransientError { .. } | FetchOutcome::PermanentError { .. } => {}
            }
        }
        tx.commit().await?;
        Ok(())
    }
}
