//! `headcheck import <path>` – bulk add items from `<hash> <url>` lines.

use anyhow::{Context, Result};
use headcheck_core::objects::ContentId;
use headcheck_core::store::ItemDb;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Rows handed to the database per transaction.
const IMPORT_CHUNK: usize = 4096;

/// Parse one list line. `Ok(None)` for blank lines and `#` comments.
pub(crate) fn parse_line(line: &str) -> Result<Option<(ContentId, String)>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut fields = line.split_whitespace();
    let (Some(hash), Some(url), None) = (fields.next(), fields.next(), fields.next()) else {
        return Err("expected `<hash> <url>`".to_string());
    };
    let hash = ContentId::parse(hash).ok_or_else(|| format!("invalid hash {hash:?}"))?;
    url::Url::parse(url).map_err(|e| format!("invalid URL {url:?}: {e}"))?;
    Ok(Some((hash, url.to_string())))
}

pub async fn run_import(db: &ItemDb, path: &Path) -> Result<()> {
    let reader: Box<dyn BufRead> = if path == Path::new("-") {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = std::fs::File::open(path)
            .with_context(|| format!("open import list: {}", path.display()))?;
        Box::new(BufReader::new(file))
    };

    let mut chunk = Vec::with_capacity(IMPORT_CHUNK);
    let mut inserted = 0u64;
    let mut read = 0u64;
    let mut skipped = 0u64;
    for (n, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("read {}", path.display()))?;
        match parse_line(&line) {
            Ok(Some(item)) => {
                read += 1;
                chunk.push(item);
            }
            Ok(None) => {}
            Err(reason) => {
                skipped += 1;
                tracing::warn!(line = n + 1, %reason, "skipping import line");
                eprintln!("line {}: {reason}", n + 1);
            }
        }
        if chunk.len() >= IMPORT_CHUNK {
            inserted += db.add_items(&chunk).await?;
            chunk.clear();
        }
    }
    if !chunk.is_empty() {
        inserted += db.add_items(&chunk).await?;
    }

    println!(
        "Imported {inserted} new item(s) from {read} line(s); {} already present, {skipped} invalid.",
        read - inserted
    );
    Ok(())
}
