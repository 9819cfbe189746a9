//! Seasons command handler

use crate::config::Config;
use crate::db::Store;

pub async fn cmd_seasons(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let seasons = store.list_seasons().await?;

    if seasons.is_empty() {
        println!("No seasons stored yet.");
        println!();
        println!("Ingest sheet pages with: anisheet ingest <url>");
        return Ok(());
    }

    println!("Seasons ({} total)", seasons.len());
    println!("{:-<70}", "");
    for season in seasons {
        println!("{:>6}  {}", season.number, season.label);
    }

    println!();
    println!("Filter a season with: anisheet list --season <number>");

    Ok(())
}
