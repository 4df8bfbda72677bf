//! `headcheck status` – item counts per state.

use anyhow::Result;
use headcheck_core::objects::object_exists;
use headcheck_core::store::ItemDb;
use std::path::Path;

pub async fn run_status(db: &ItemDb, objects: Option<&Path>) -> Result<()> {
    let counts = db.state_counts().await?;
    if counts.total() == 0 {
        println!("No items in database.");
        return Ok(());
    }
    println!("{:<10} {}", "STATE", "COUNT");
    println!("{:<10} {}", "unchecked", counts.unchecked);
    println!("{:<10} {}", "found", counts.found);
    println!("{:<10} {}", "not_found", counts.not_found);
    println!("{:<10} {}", "total", counts.total());

    if let Some(root) = objects {
        let found = db.found_hashes().await?;
        let present = found
            .iter()
            .filter(|h| object_exists(root, h.as_str()))
            .count();
        println!(
            "{present} of {} found item(s) present in {}",
            found.len(),
            root.display()
        );
    }
    Ok(())
}
