//! Reference listing command handler

use crate::cli::RefKind;
use crate::config::Config;
use crate::db::Store;
use crate::models::title::CategoryKind;

pub async fn cmd_refs(config: &Config, kind: RefKind) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    let (heading, refs) = match kind {
        RefKind::Formats => ("Formats", store.list_formats().await?),
        RefKind::Targets => ("Targets", store.list_targets().await?),
        RefKind::Origins => ("Origins", store.list_origins().await?),
        RefKind::Genres => (
            "Genres",
            store.list_categories(Some(CategoryKind::Genre)).await?,
        ),
        RefKind::Themes => (
            "Themes",
            store.list_categories(Some(CategoryKind::Theme)).await?,
        ),
        RefKind::Categories => ("Categories", store.list_categories(None).await?),
    };

    if refs.is_empty() {
        println!("No {} stored yet.", heading.to_lowercase());
        return Ok(());
    }

    println!("{heading} ({} total)", refs.len());
    println!("{:-<70}", "");
    for item in refs {
        println!("{:>5}  {}", item.id, item.name);
    }

    println!();
    println!("Use these ids as filters: anisheet list --category <id> ...");

    Ok(())
}
