//! SQLite-backed item database.
//!
//! Handles connection, migrations, and timestamp helpers. Item queries and
//! batch commits live in `items`.

use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Percent-encode a path for use in a sqlite:// URI so spaces and special chars don't break parsing.
fn path_to_sqlite_uri(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            c => out.push(c),
        }
    }
    format!("sqlite://{}", out)
}

/// Handle to the item database.
///
/// The default file is `~/.local/state/headcheck/items.db` on Debian.
#[derive(Clone)]
pub struct ItemDb {
    pub(crate) pool: Pool<Sqlite>,
}

impl ItemDb {
    /// Default database path under the XDG state directory.
    pub fn default_path() -> Result<std::path::PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("headcheck")?;
        Ok(xdg_dirs.get_state_home().join("headcheck").join("items.db"))
    }

    /// Open (or create) the default item database and run migrations.
    pub async fn open_default() -> Result<Self> {
        Self::open_at(Self::default_path()?).await
    }

    /// Open (or create) the database at a specific path. Creates parent dirs if needed.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("create dir: {}", parent.display()))?;
            }
        }
        let uri = path_to_sqlite_uri(path) + "?mode=rwc";
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect(&uri)
            .await
            .with_context(|| format!("open database: {}", path.display()))?;
        let db = ItemDb { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        // - `state` is one of unchecked / found / not_found.
        // - `etag_hash` is the identifier recovered from the ETag, if any.
        // - `headers_json` holds every header of the final response.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                hash TEXT NOT NULL UNIQUE,
                url TEXT NOT NULL,
                state TEXT NOT NULL DEFAULT 'unchecked',
                status INTEGER,
                etag TEXT,
                etag_hash TEXT,
                last_modified TEXT,
                content_length INTEGER,
                headers_json TEXT,
                created_at INTEGER NOT NULL,
                checked_at INTEGER
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS items_state_id ON items (state, id);")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Current time as Unix seconds (for DB timestamps).
pub(crate) fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
/// Open an in-memory database for tests (no disk I/O).
pub(crate) async fn open_memory() -> Result<ItemDb> {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    let db = ItemDb { pool };
    db.migrate().await?;
    Ok(db)
}
