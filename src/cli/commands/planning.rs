//! Planning snapshot command handlers

use super::parse_season_arg;
use crate::config::Config;
use crate::db::Store;
use crate::normalize::PartialDate;

pub async fn cmd_planning_season(config: &Config, label: &[String]) -> anyhow::Result<()> {
    let text = label.join(" ");
    let Some(season) = parse_season_arg(&text) else {
        println!("Invalid season: {text}");
        println!("Use a label like \"automne 2024\" or a packed number like 20244.");
        return Ok(());
    };

    let store = Store::new(&config.general.database_path).await?;
    let rows = store
        .list_seasonal_planning(i64::from(season.number()))
        .await?;

    if rows.is_empty() {
        println!("No planning captured for {}.", season.label());
        return Ok(());
    }

    println!("Seasonal Planning: {} ({} titles)", season.label(), rows.len());
    println!("{:-<70}", "");
    for row in rows {
        let format = row.format_name.as_deref().unwrap_or("?");
        let release = row.release_date.as_deref().unwrap_or("?");
        println!("• {} [{format}]", row.name);
        println!(
            "  Sheet: {} | Starts: {release} | {} eps",
            row.sheet_id, row.episode_count
        );
    }

    Ok(())
}

pub async fn cmd_planning_day(config: &Config, date: &str) -> anyhow::Result<()> {
    let Some(day) = PartialDate::parse(date).filter(|d| d.is_complete()) else {
        println!("Invalid date: {date} (expected a complete YYYY-MM-DD)");
        return Ok(());
    };

    let store = Store::new(&config.general.database_path).await?;
    let rows = store.list_daily_planning(&day.to_string()).await?;

    if rows.is_empty() {
        println!("Nothing captured for {day}.");
        return Ok(());
    }

    println!("Daily Planning: {day} ({} episodes)", rows.len());
    println!("{:-<70}", "");
    for row in rows {
        println!("• {} - Episode {}", row.name, row.episode_number);
        println!("  Sheet: {} | {}", row.sheet_id, row.url);
    }

    Ok(())
}
