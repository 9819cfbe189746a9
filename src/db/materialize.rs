//! Collapses flattened join rows into title aggregates.
//!
//! Rows are grouped explicitly by aggregate id, never by adjacency, so the
//! input may interleave ids and repeat child columns freely. The first row
//! seen for an id supplies the title-scoped columns; every row may
//! contribute child-scoped columns, which are appended once per child key.

use crate::models::title::{
    AlternateTitle, Distributor, EpisodeSummary, ExternalLink, NamedRef, SeasonRef, StaffCredit,
    TitleAggregate,
};
use crate::normalize::DiffusionState;
use indexmap::IndexMap;
use sea_orm::FromQueryResult;

/// One flattened row of the re-fetch queries. Title-scoped columns are
/// always present; at most one child column group is non-null per row.
#[derive(Debug, Clone, FromQueryResult)]
pub struct JoinRow {
    pub id: i64,
    pub sheet_id: i64,
    pub url: String,
    pub name: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub vote_average: f64,
    pub vote_count: i32,
    pub diffusion_state: i16,
    pub episode_count: i32,
    pub episode_duration: i32,
    pub release_date: Option<String>,
    pub end_date: Option<String>,
    pub remark: Option<String>,
    pub is_adult: bool,
    pub is_explicit: bool,
    pub format_id: Option<i64>,
    pub format_name: Option<String>,
    pub target_id: Option<i64>,
    pub target_name: Option<String>,
    pub origin_id: Option<i64>,
    pub origin_name: Option<String>,
    pub season_id: Option<i64>,
    pub season_number: Option<i64>,
    pub season_label: Option<String>,
    pub alt_name: Option<String>,
    pub alt_label: Option<String>,
    pub link_url: Option<String>,
    pub link_label: Option<String>,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub category_kind: Option<i16>,
    pub studio_id: Option<i64>,
    pub studio_name: Option<String>,
    pub distributor_id: Option<i64>,
    pub distributor_name: Option<String>,
    pub license_type_name: Option<String>,
    pub staff_id: Option<i64>,
    pub staff_name: Option<String>,
    pub staff_role: Option<String>,
    pub episode_number: Option<i32>,
    pub episode_name: Option<String>,
    pub episode_date: Option<String>,
    pub episode_weekday: Option<i16>,
}

impl JoinRow {
    /// The aggregate as seen from this row's title-scoped columns alone.
    fn aggregate(&self) -> TitleAggregate {
        TitleAggregate {
            id: self.id,
            sheet_id: self.sheet_id,
            url: self.url.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            thumbnail_url: self.thumbnail_url.clone(),
            vote_average: self.vote_average,
            vote_count: self.vote_count,
            diffusion_state: DiffusionState::from_i16(self.diffusion_state),
            episode_count: self.episode_count,
            episode_duration: self.episode_duration,
            release_date: self.release_date.clone(),
            end_date: self.end_date.clone(),
            remark: self.remark.clone(),
            is_adult: self.is_adult,
            is_explicit: self.is_explicit,
            format: named(self.format_id, self.format_name.clone()),
            target: named(self.target_id, self.target_name.clone()),
            origin: named(self.origin_id, self.origin_name.clone()),
            season: match (self.season_id, self.season_number, self.season_label.clone()) {
                (Some(id), Some(number), Some(label)) => Some(SeasonRef { id, number, label }),
                _ => None,
            },
            alternate_titles: Vec::new(),
            external_links: Vec::new(),
            genres: Vec::new(),
            themes: Vec::new(),
            studios: Vec::new(),
            distributors: Vec::new(),
            staff: Vec::new(),
            episodes: Vec::new(),
        }
    }
}

fn named(id: Option<i64>, name: Option<String>) -> Option<NamedRef> {
    match (id, name) {
        (Some(id), Some(name)) => Some(NamedRef { id, name }),
        _ => None,
    }
}

/// Groups the rows by aggregate id into an order-preserving map and returns
/// the aggregates in first-seen order.
pub fn materialize(rows: Vec<JoinRow>) -> Vec<TitleAggregate> {
    let mut aggregates: IndexMap<i64, TitleAggregate> = IndexMap::new();

    for row in rows {
        let entry = aggregates
            .entry(row.id)
            .or_insert_with(|| row.aggregate());

        if let Some(alt_name) = row.alt_name {
            if !entry
                .alternate_titles
                .iter()
                .any(|alt| alt.name.eq_ignore_ascii_case(&alt_name))
            {
                entry.alternate_titles.push(AlternateTitle {
                    name: alt_name,
                    label: row.alt_label,
                });
            }
        }

        if let Some(link_url) = row.link_url {
            if !entry.external_links.iter().any(|link| link.url == link_url) {
                entry.external_links.push(ExternalLink {
                    url: link_url,
                    label: row.link_label,
                });
            }
        }

        if let (Some(category_id), Some(category_name), Some(kind)) =
            (row.category_id, row.category_name, row.category_kind)
        {
            let bucket = if kind == 2 {
                &mut entry.themes
            } else {
                &mut entry.genres
            };
            if !bucket.iter().any(|c| c.id == category_id) {
                bucket.push(NamedRef {
                    id: category_id,
                    name: category_name,
                });
            }
        }

        if let (Some(studio_id), Some(studio_name)) = (row.studio_id, row.studio_name) {
            if !entry.studios.iter().any(|s| s.id == studio_id) {
                entry.studios.push(NamedRef {
                    id: studio_id,
                    name: studio_name,
                });
            }
        }

        if let (Some(contact_id), Some(name)) = (row.distributor_id, row.distributor_name) {
            if !entry.distributors.iter().any(|d| d.contact_id == contact_id) {
                entry.distributors.push(Distributor {
                    contact_id,
                    name,
                    license_type: row.license_type_name,
                });
            }
        }

        if let (Some(contact_id), Some(name), Some(role)) =
            (row.staff_id, row.staff_name, row.staff_role)
        {
            if !entry
                .staff
                .iter()
                .any(|s| s.contact_id == contact_id && s.role == role)
            {
                entry.staff.push(StaffCredit {
                    contact_id,
                    name,
                    role,
                });
            }
        }

        if let Some(number) = row.episode_number {
            if !entry.episodes.iter().any(|e| e.number == number) {
                entry.episodes.push(EpisodeSummary {
                    number,
                    name: row.episode_name,
                    release_date: row.episode_date,
                    weekday: row.episode_weekday,
                });
            }
        }
    }

    aggregates.into_values().collect()
}
