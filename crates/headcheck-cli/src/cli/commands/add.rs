//! `headcheck add <hash> <url>` – add one item.

use anyhow::{anyhow, Result};
use headcheck_core::objects::ContentId;
use headcheck_core::store::ItemDb;

pub async fn run_add(db: &ItemDb, hash: &str, url: &str) -> Result<()> {
    let id = ContentId::parse(hash)
        .ok_or_else(|| anyhow!("{hash:?} is not a 32-character lowercase hex hash"))?;
    let row = db.add_item(&id, url).await?;
    println!("Added item {row} ({id}) for URL: {url}");
    Ok(())
}
