//! Show title command handler

use crate::config::Config;
use crate::constants::display::MAX_CHILD_ROWS;
use crate::db::Store;
use crate::models::title::{
    AlternateTitle, Distributor, EpisodeSummary, ExternalLink, NamedRef, StaffCredit,
    TitleAggregate,
};

pub async fn cmd_show(config: &Config, sheet_id: i64, json: bool) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    let Some(title) = store.find_title_by_sheet_id(sheet_id).await? else {
        println!("No title with sheet id {sheet_id}.");
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&title)?);
        return Ok(());
    }

    display_summary(&title);
    display_alternate_titles(&title.alternate_titles);
    display_refs("Genres", &title.genres);
    display_refs("Themes", &title.themes);
    display_refs("Studios", &title.studios);
    display_distributors(&title.distributors);
    display_staff(&title.staff);
    display_episodes(&title.episodes);
    display_links(&title.external_links);

    println!();
    Ok(())
}

fn display_summary(title: &TitleAggregate) {
    println!("Title Sheet");
    println!("{:-<60}", "");
    println!("Name:     {}", title.name);
    println!("Sheet:    {}", title.sheet_id);
    println!("URL:      {}", title.url);
    println!("State:    {}", title.diffusion_state);
    if let Some(format) = &title.format {
        println!("Format:   {}", format.name);
    }
    if let Some(target) = &title.target {
        println!("Target:   {}", target.name);
    }
    if let Some(origin) = &title.origin {
        println!("Origin:   {}", origin.name);
    }
    if let Some(season) = &title.season {
        println!("Season:   {}", season.label);
    }
    println!(
        "Episodes: {} x {} min",
        title.episode_count, title.episode_duration
    );
    println!(
        "Rating:   {:.2} ({} votes)",
        title.vote_average, title.vote_count
    );
    if let Some(date) = &title.release_date {
        println!("Started:  {date}");
    }
    if let Some(date) = &title.end_date {
        println!("Ended:    {date}");
    }

    match (title.is_adult, title.is_explicit) {
        (true, true) => println!("Flags:    adult, explicit"),
        (true, false) => println!("Flags:    adult"),
        (false, true) => println!("Flags:    explicit"),
        (false, false) => {}
    }

    if let Some(description) = &title.description {
        println!();
        println!("{description}");
    }
    if let Some(remark) = &title.remark {
        println!();
        println!("Note: {remark}");
    }
}

fn display_alternate_titles(titles: &[AlternateTitle]) {
    if titles.is_empty() {
        return;
    }
    println!();
    println!("Alternate Titles ({}):", titles.len());
    for alt in titles {
        match &alt.label {
            Some(label) => println!("  [{label}] {}", alt.name),
            None => println!("  {}", alt.name),
        }
    }
}

fn display_refs(heading: &str, refs: &[NamedRef]) {
    if refs.is_empty() {
        return;
    }
    let names: Vec<&str> = refs.iter().map(|r| r.name.as_str()).collect();
    println!();
    println!("{heading}: {}", names.join(", "));
}

fn display_distributors(distributors: &[Distributor]) {
    if distributors.is_empty() {
        return;
    }
    println!();
    println!("Distributors ({}):", distributors.len());
    for d in distributors {
        match &d.license_type {
            Some(license) => println!("  {} ({license})", d.name),
            None => println!("  {}", d.name),
        }
    }
}

fn display_staff(staff: &[StaffCredit]) {
    if staff.is_empty() {
        return;
    }
    println!();
    println!("Staff ({}):", staff.len());
    for credit in staff.iter().take(MAX_CHILD_ROWS) {
        println!("  {}: {}", credit.role, credit.name);
    }
    if staff.len() > MAX_CHILD_ROWS {
        println!("  ... and {} more", staff.len() - MAX_CHILD_ROWS);
    }
}

fn display_episodes(episodes: &[EpisodeSummary]) {
    if episodes.is_empty() {
        return;
    }
    println!();
    println!("Episodes ({}):", episodes.len());
    for episode in episodes.iter().take(MAX_CHILD_ROWS) {
        let date = episode.release_date.as_deref().unwrap_or("?");
        let day = episode.weekday.map_or("", weekday_name);
        let name = episode.name.as_deref().unwrap_or("");
        println!("  Ep {:>3} | {date} {day:<3} | {name}", episode.number);
    }
    if episodes.len() > MAX_CHILD_ROWS {
        println!("  ... and {} more", episodes.len() - MAX_CHILD_ROWS);
    }
}

fn display_links(links: &[ExternalLink]) {
    if links.is_empty() {
        return;
    }
    println!();
    println!("Links ({}):", links.len());
    for link in links {
        match &link.label {
            Some(label) => println!("  {label}: {}", link.url),
            None => println!("  {}", link.url),
        }
    }
}

const fn weekday_name(weekday: i16) -> &'static str {
    match weekday {
        1 => "Mon",
        2 => "Tue",
        3 => "Wed",
        4 => "Thu",
        5 => "Fri",
        6 => "Sat",
        7 => "Sun",
        _ => "?",
    }
}
