//! List titles command handler

use tokio_util::sync::CancellationToken;

use super::{parse_date_arg, parse_season_arg};
use crate::cli::{GroupField, ListArgs};
use crate::config::Config;
use crate::db::Store;
use crate::models::filter::{SortDir, TitleFilter};
use crate::models::title::TitleAggregate;

pub async fn cmd_list(config: &Config, args: &ListArgs) -> anyhow::Result<()> {
    let Some(filter) = build_filter(args) else {
        return Ok(());
    };

    let store = Store::new(&config.general.database_path).await?;
    let cancel = CancellationToken::new();
    let dir = if args.desc { SortDir::Desc } else { SortDir::Asc };

    let page = store
        .search_titles(
            &filter,
            args.sort.into(),
            dir,
            args.group.map(Into::into),
            args.page,
            args.page_size,
            &config.content_policy(),
            &cancel,
        )
        .await?;

    if page.items.is_empty() {
        if page.total_items == 0 {
            println!("No titles matched.");
        } else {
            println!(
                "Page {} is past the end ({} titles over {} pages).",
                page.current_page, page.total_items, page.total_pages
            );
        }
        return Ok(());
    }

    println!(
        "Titles ({} matched, page {} of {})",
        page.total_items, page.current_page, page.total_pages
    );
    println!("{:-<70}", "");

    let mut current_group: Option<String> = None;
    for item in &page.items {
        if let Some(group) = args.group {
            let label = group_label(item, group);
            if current_group.as_deref() != Some(label.as_str()) {
                println!("-- {label} --");
                current_group = Some(label);
            }
        }
        print_row(item);
    }

    println!();
    if page.total_pages > page.current_page {
        println!("Use --page {} for the next page.", page.current_page + 1);
    }
    println!("Run 'anisheet show <sheet id>' for full details.");

    Ok(())
}

/// `None` means an argument did not parse; the problem is already printed.
fn build_filter(args: &ListArgs) -> Option<TitleFilter> {
    let keyword = args.keyword.join(" ");

    let mut filter = TitleFilter {
        keyword: (!keyword.is_empty()).then_some(keyword),
        adult: args.adult,
        explicit: args.explicit,
        include_formats: args.formats.clone(),
        exclude_formats: args.exclude_formats.clone(),
        include_targets: args.targets.clone(),
        exclude_targets: args.exclude_targets.clone(),
        include_origins: args.origins.clone(),
        exclude_origins: args.exclude_origins.clone(),
        include_categories: args.categories.clone(),
        exclude_categories: args.exclude_categories.clone(),
        include_studios: args.studios.clone(),
        exclude_studios: args.exclude_studios.clone(),
        include_distributors: args.distributors.clone(),
        exclude_distributors: args.exclude_distributors.clone(),
        ..Default::default()
    };

    if let Some(text) = &args.released_after {
        filter.release_date_min = Some(parse_date(text)?);
    }
    if let Some(text) = &args.released_before {
        filter.release_date_max = Some(parse_date(text)?);
    }

    if let Some(text) = &args.season {
        let number = parse_season(text)?;
        filter.season_min = Some(number);
        filter.season_max = Some(number);
    }
    if let Some(text) = &args.season_from {
        filter.season_min = Some(parse_season(text)?);
    }
    if let Some(text) = &args.season_to {
        filter.season_max = Some(parse_season(text)?);
    }

    Some(filter)
}

fn parse_date(text: &str) -> Option<crate::normalize::PartialDate> {
    let date = parse_date_arg(text);
    if date.is_none() {
        println!("Invalid date: {text} (expected YYYY, YYYY-MM, or YYYY-MM-DD)");
    }
    date
}

fn parse_season(text: &str) -> Option<i64> {
    let Some(season) = parse_season_arg(text) else {
        println!("Invalid season: {text} (expected a label like \"automne 2024\")");
        return None;
    };
    Some(i64::from(season.number()))
}

fn print_row(item: &TitleAggregate) {
    println!("• {} [{}]", item.name, item.diffusion_state);

    let format = item.format.as_ref().map_or("?", |r| r.name.as_str());
    let season = item
        .season
        .as_ref()
        .map_or("?", |s| s.label.as_str());
    println!(
        "  Sheet: {} | Format: {} | Season: {} | {} eps | {:.2} ({} votes)",
        item.sheet_id, format, season, item.episode_count, item.vote_average, item.vote_count
    );
}

fn group_label(item: &TitleAggregate, group: GroupField) -> String {
    let unnamed = || "(none)".to_string();
    match group {
        GroupField::Format => item.format.as_ref().map_or_else(unnamed, |r| r.name.clone()),
        GroupField::Target => item.target.as_ref().map_or_else(unnamed, |r| r.name.clone()),
        GroupField::Origin => item.origin.as_ref().map_or_else(unnamed, |r| r.name.clone()),
        GroupField::Season => item
            .season
            .as_ref()
            .map_or_else(unnamed, |s| s.label.clone()),
        GroupField::State => item.diffusion_state.to_string(),
    }
}
