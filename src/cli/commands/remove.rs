use crate::config::Config;
use crate::db::Store;

pub async fn cmd_remove(config: &Config, sheet_id: i64) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    let Some(title) = store.find_title_by_sheet_id(sheet_id).await? else {
        println!("No title with sheet id {sheet_id}.");
        println!("Use 'anisheet list' to browse the catalog.");
        return Ok(());
    };

    println!("Remove '{}' (sheet {sheet_id}) from the catalog?", title.name);
    println!("Enter 'y' to confirm, anything else to cancel:");

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    if input.trim().eq_ignore_ascii_case("y") {
        if store.delete_title(sheet_id).await? {
            println!("✓ Removed: {}", title.name);
        } else {
            println!("Failed to remove title.");
        }
    } else {
        println!("Cancelled.");
    }

    Ok(())
}
