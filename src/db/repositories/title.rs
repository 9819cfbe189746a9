//! Title aggregate writes: validated, deduplicated upserts that replace
//! child collections by diff, plus natural-key lookups and deletion.

use crate::db::error::StoreError;
use crate::db::repositories::{ensure_live, query, refs};
use crate::entities::{
    alternate_titles, episodes, external_links, prelude::*, title_categories, title_distributors,
    title_staff, title_studios, titles,
};
use crate::models::title::{
    CategoryKind, ContactKind, EpisodeRecord, TitleAggregate, TitleRecord, UpsertOutcome,
};
use crate::normalize::PartialDate;
use indexmap::IndexMap;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

/// Per-sheet write locks. Upserts of the same sheet queue behind each other
/// while different sheets proceed concurrently. Entries live for the process
/// lifetime; the key space is one entry per scraped sheet.
#[derive(Clone, Default)]
pub struct SheetKeys {
    locks: Arc<Mutex<HashMap<i64, Arc<Mutex<()>>>>>,
}

impl SheetKeys {
    async fn acquire(&self, sheet_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.locks.lock().await;
            Arc::clone(map.entry(sheet_id).or_default())
        };
        lock.lock_owned().await
    }
}

pub struct TitleRepository {
    conn: DatabaseConnection,
    sheet_keys: SheetKeys,
}

impl TitleRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection, sheet_keys: SheetKeys) -> Self {
        Self { conn, sheet_keys }
    }

    /// Writes one record, creating or refreshing the aggregate it describes.
    ///
    /// Reference resolution, the aggregate row, and every child mutation run
    /// in a single transaction; cancellation between steps rolls the whole
    /// write back.
    pub async fn upsert(
        &self,
        record: &TitleRecord,
        cancel: &CancellationToken,
    ) -> Result<UpsertOutcome, StoreError> {
        validate(record)?;
        let _key = self.sheet_keys.acquire(record.sheet_id).await;
        ensure_live(cancel)?;

        let txn = self.conn.begin().await?;
        let outcome = write_record(&txn, record, cancel).await?;
        txn.commit().await?;

        if outcome.created {
            info!("stored title {} (sheet {})", outcome.id, record.sheet_id);
        } else {
            debug!("refreshed title {} (sheet {})", outcome.id, record.sheet_id);
        }
        Ok(outcome)
    }

    pub async fn find_by_sheet_id(
        &self,
        sheet_id: i64,
    ) -> Result<Option<TitleAggregate>, StoreError> {
        let row = Titles::find()
            .filter(titles::Column::SheetId.eq(sheet_id))
            .one(&self.conn)
            .await?;
        match row {
            Some(row) => Ok(query::fetch_aggregates(&self.conn, &[row.id]).await?.pop()),
            None => Ok(None),
        }
    }

    pub async fn find_by_url(&self, url: &str) -> Result<Option<TitleAggregate>, StoreError> {
        let row = Titles::find()
            .filter(titles::Column::Url.eq(url))
            .one(&self.conn)
            .await?;
        match row {
            Some(row) => Ok(query::fetch_aggregates(&self.conn, &[row.id]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Removes an aggregate and everything it owns. Reference rows other
    /// titles may share are left alone.
    pub async fn delete_by_sheet_id(&self, sheet_id: i64) -> Result<bool, StoreError> {
        let _key = self.sheet_keys.acquire(sheet_id).await;
        let Some(row) = Titles::find()
            .filter(titles::Column::SheetId.eq(sheet_id))
            .one(&self.conn)
            .await?
        else {
            return Ok(false);
        };

        let txn = self.conn.begin().await?;
        AlternateTitles::delete_many()
            .filter(alternate_titles::Column::TitleId.eq(row.id))
            .exec(&txn)
            .await?;
        ExternalLinks::delete_many()
            .filter(external_links::Column::TitleId.eq(row.id))
            .exec(&txn)
            .await?;
        TitleCategories::delete_many()
            .filter(title_categories::Column::TitleId.eq(row.id))
            .exec(&txn)
            .await?;
        TitleStudios::delete_many()
            .filter(title_studios::Column::TitleId.eq(row.id))
            .exec(&txn)
            .await?;
        TitleDistributors::delete_many()
            .filter(title_distributors::Column::TitleId.eq(row.id))
            .exec(&txn)
            .await?;
        TitleStaff::delete_many()
            .filter(title_staff::Column::TitleId.eq(row.id))
            .exec(&txn)
            .await?;
        Episodes::delete_many()
            .filter(episodes::Column::TitleId.eq(row.id))
            .exec(&txn)
            .await?;
        let result = Titles::delete_by_id(row.id).exec(&txn).await?;
        txn.commit().await?;

        let removed = result.rows_affected > 0;
        if removed {
            info!("deleted title {} (sheet {})", row.id, sheet_id);
        }
        Ok(removed)
    }
}

fn validate(record: &TitleRecord) -> Result<(), StoreError> {
    if record.name.trim().is_empty() {
        return Err(StoreError::Validation("title name is blank".into()));
    }
    if record.sheet_id <= 0 {
        return Err(StoreError::Validation(format!(
            "sheet id {} is not positive",
            record.sheet_id
        )));
    }
    match Url::parse(&record.url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(()),
        _ => Err(StoreError::Validation(format!(
            "url '{}' is not an absolute http(s) url",
            record.url
        ))),
    }
}

/// Looks the record's natural keys up and refuses writes that would repoint
/// an existing row. URL wins when both keys hit the same row.
async fn find_existing<C: ConnectionTrait>(
    conn: &C,
    record: &TitleRecord,
) -> Result<Option<titles::Model>, StoreError> {
    let by_url = Titles::find()
        .filter(titles::Column::Url.eq(&record.url))
        .one(conn)
        .await?;
    let by_sheet = Titles::find()
        .filter(titles::Column::SheetId.eq(record.sheet_id))
        .one(conn)
        .await?;

    let hit = match (by_url, by_sheet) {
        (Some(u), Some(s)) if u.id != s.id => {
            return Err(StoreError::Conflict(format!(
                "url '{}' belongs to title {} but sheet {} belongs to title {}",
                record.url, u.id, record.sheet_id, s.id
            )));
        }
        (Some(u), _) => Some(u),
        (None, s) => s,
    };

    if let Some(row) = &hit {
        if record.id.is_some_and(|explicit| explicit != row.id) {
            return Err(StoreError::Conflict(format!(
                "record carries id {:?} but its natural keys point at title {}",
                record.id, row.id
            )));
        }
    }
    Ok(hit)
}

async fn write_record<C: ConnectionTrait>(
    conn: &C,
    record: &TitleRecord,
    cancel: &CancellationToken,
) -> Result<UpsertOutcome, StoreError> {
    let existing = find_existing(conn, record).await?;
    ensure_live(cancel)?;

    let format_id = match &record.format {
        Some(name) => Some(refs::resolve_format(conn, name, &record.section).await?),
        None => None,
    };
    let target_id = match &record.target {
        Some(name) => Some(refs::resolve_target(conn, name, &record.section).await?),
        None => None,
    };
    let origin_id = match &record.origin {
        Some(name) => Some(refs::resolve_origin(conn, name, &record.section).await?),
        None => None,
    };
    let season_id = match record.season {
        Some(season) => Some(refs::resolve_season(conn, season).await?),
        None => None,
    };
    ensure_live(cancel)?;

    let mut model = titles::ActiveModel {
        sheet_id: Set(record.sheet_id),
        url: Set(record.url.clone()),
        name: Set(record.name.trim().to_owned()),
        description: Set(record.description.clone()),
        thumbnail_url: Set(record.thumbnail_url.clone()),
        vote_average: Set(record.vote_average),
        vote_count: Set(record.vote_count),
        diffusion_state: Set(record.diffusion_state.as_i16()),
        episode_count: Set(record.episode_count),
        episode_duration: Set(i32::try_from(record.episode_duration).unwrap_or(0)),
        release_date: Set(record.release_date.map(|d| d.to_string())),
        end_date: Set(record.end_date.map(|d| d.to_string())),
        remark: Set(record.remark.clone()),
        is_adult: Set(record.is_adult),
        is_explicit: Set(record.is_explicit),
        format_id: Set(format_id),
        target_id: Set(target_id),
        origin_id: Set(origin_id),
        season_id: Set(season_id),
        ..Default::default()
    };

    let (title_id, created) = match existing {
        Some(row) => {
            model.id = Set(row.id);
            model.update(conn).await?;
            (row.id, false)
        }
        None => {
            if let Some(id) = record.id {
                model.id = Set(id);
            }
            let result = Titles::insert(model).exec(conn).await?;
            (result.last_insert_id, true)
        }
    };

    sync_alternate_titles(conn, title_id, record).await?;
    sync_external_links(conn, title_id, record).await?;
    ensure_live(cancel)?;
    sync_categories(conn, title_id, record).await?;
    sync_studios(conn, title_id, record).await?;
    sync_distributors(conn, title_id, record).await?;
    sync_staff(conn, title_id, record).await?;
    ensure_live(cancel)?;
    sync_episodes(conn, title_id, record).await?;

    Ok(UpsertOutcome {
        id: title_id,
        created,
    })
}

async fn sync_alternate_titles<C: ConnectionTrait>(
    conn: &C,
    title_id: i64,
    record: &TitleRecord,
) -> Result<(), StoreError> {
    let mut desired = IndexMap::new();
    for alt in &record.alternate_titles {
        let name = alt.name.trim();
        if name.is_empty() {
            continue;
        }
        desired.entry(name.to_lowercase()).or_insert(alt);
    }

    let current = AlternateTitles::find()
        .filter(alternate_titles::Column::TitleId.eq(title_id))
        .all(conn)
        .await?;

    let mut stale = Vec::new();
    for row in current {
        match desired.shift_remove(&row.name.to_lowercase()) {
            Some(alt) => {
                let name = alt.name.trim();
                if row.name != name || row.label != alt.label {
                    alternate_titles::ActiveModel {
                        id: Set(row.id),
                        name: Set(name.to_owned()),
                        label: Set(alt.label.clone()),
                        ..Default::default()
                    }
                    .update(conn)
                    .await?;
                }
            }
            None => stale.push(row.id),
        }
    }
    if !stale.is_empty() {
        AlternateTitles::delete_many()
            .filter(alternate_titles::Column::Id.is_in(stale))
            .exec(conn)
            .await?;
    }

    let inserts: Vec<_> = desired
        .values()
        .map(|alt| alternate_titles::ActiveModel {
            title_id: Set(title_id),
            name: Set(alt.name.trim().to_owned()),
            label: Set(alt.label.clone()),
            ..Default::default()
        })
        .collect();
    if !inserts.is_empty() {
        AlternateTitles::insert_many(inserts)
            .exec_without_returning(conn)
            .await?;
    }
    Ok(())
}

async fn sync_external_links<C: ConnectionTrait>(
    conn: &C,
    title_id: i64,
    record: &TitleRecord,
) -> Result<(), StoreError> {
    let mut desired = IndexMap::new();
    for link in &record.external_links {
        let url = link.url.trim();
        if url.is_empty() {
            continue;
        }
        desired.entry(url.to_owned()).or_insert(link);
    }

    let current = ExternalLinks::find()
        .filter(external_links::Column::TitleId.eq(title_id))
        .all(conn)
        .await?;

    let mut stale = Vec::new();
    for row in current {
        match desired.shift_remove(&row.url) {
            Some(link) => {
                if row.label != link.label {
                    external_links::ActiveModel {
                        id: Set(row.id),
                        label: Set(link.label.clone()),
                        ..Default::default()
                    }
                    .update(conn)
                    .await?;
                }
            }
            None => stale.push(row.id),
        }
    }
    if !stale.is_empty() {
        ExternalLinks::delete_many()
            .filter(external_links::Column::Id.is_in(stale))
            .exec(conn)
            .await?;
    }

    let inserts: Vec<_> = desired
        .iter()
        .map(|(url, link)| external_links::ActiveModel {
            title_id: Set(title_id),
            url: Set(url.clone()),
            label: Set(link.label.clone()),
            ..Default::default()
        })
        .collect();
    if !inserts.is_empty() {
        ExternalLinks::insert_many(inserts)
            .exec_without_returning(conn)
            .await?;
    }
    Ok(())
}

async fn sync_categories<C: ConnectionTrait>(
    conn: &C,
    title_id: i64,
    record: &TitleRecord,
) -> Result<(), StoreError> {
    let mut wanted: Vec<i64> = Vec::new();
    for name in &record.genres {
        if name.trim().is_empty() {
            continue;
        }
        let id = refs::resolve_category(conn, name, &record.section, CategoryKind::Genre).await?;
        if !wanted.contains(&id) {
            wanted.push(id);
        }
    }
    for name in &record.themes {
        if name.trim().is_empty() {
            continue;
        }
        let id = refs::resolve_category(conn, name, &record.section, CategoryKind::Theme).await?;
        if !wanted.contains(&id) {
            wanted.push(id);
        }
    }

    let current: Vec<i64> = TitleCategories::find()
        .filter(title_categories::Column::TitleId.eq(title_id))
        .all(conn)
        .await?
        .into_iter()
        .map(|row| row.category_id)
        .collect();

    let stale: Vec<i64> = current
        .iter()
        .copied()
        .filter(|id| !wanted.contains(id))
        .collect();
    if !stale.is_empty() {
        TitleCategories::delete_many()
            .filter(title_categories::Column::TitleId.eq(title_id))
            .filter(title_categories::Column::CategoryId.is_in(stale))
            .exec(conn)
            .await?;
    }

    let inserts: Vec<_> = wanted
        .iter()
        .filter(|id| !current.contains(id))
        .map(|&category_id| title_categories::ActiveModel {
            title_id: Set(title_id),
            category_id: Set(category_id),
        })
        .collect();
    if !inserts.is_empty() {
        TitleCategories::insert_many(inserts)
            .exec_without_returning(conn)
            .await?;
    }
    Ok(())
}

async fn sync_studios<C: ConnectionTrait>(
    conn: &C,
    title_id: i64,
    record: &TitleRecord,
) -> Result<(), StoreError> {
    let mut wanted: Vec<i64> = Vec::new();
    for name in &record.studios {
        if name.trim().is_empty() {
            continue;
        }
        let id = refs::resolve_contact(conn, name, ContactKind::Studio).await?;
        if !wanted.contains(&id) {
            wanted.push(id);
        }
    }

    let current: Vec<i64> = TitleStudios::find()
        .filter(title_studios::Column::TitleId.eq(title_id))
        .all(conn)
        .await?
        .into_iter()
        .map(|row| row.contact_id)
        .collect();

    let stale: Vec<i64> = current
        .iter()
        .copied()
        .filter(|id| !wanted.contains(id))
        .collect();
    if !stale.is_empty() {
        TitleStudios::delete_many()
            .filter(title_studios::Column::TitleId.eq(title_id))
            .filter(title_studios::Column::ContactId.is_in(stale))
            .exec(conn)
            .await?;
    }

    let inserts: Vec<_> = wanted
        .iter()
        .filter(|id| !current.contains(id))
        .map(|&contact_id| title_studios::ActiveModel {
            title_id: Set(title_id),
            contact_id: Set(contact_id),
        })
        .collect();
    if !inserts.is_empty() {
        TitleStudios::insert_many(inserts)
            .exec_without_returning(conn)
            .await?;
    }
    Ok(())
}

async fn sync_distributors<C: ConnectionTrait>(
    conn: &C,
    title_id: i64,
    record: &TitleRecord,
) -> Result<(), StoreError> {
    let mut wanted: IndexMap<i64, Option<i64>> = IndexMap::new();
    for dist in &record.distributors {
        if dist.name.trim().is_empty() {
            continue;
        }
        let contact_id = refs::resolve_contact(conn, &dist.name, ContactKind::Distributor).await?;
        let license_type_id = match &dist.license_type {
            Some(name) if !name.trim().is_empty() => {
                Some(refs::resolve_license_type(conn, name, &record.section).await?)
            }
            _ => None,
        };
        wanted.entry(contact_id).or_insert(license_type_id);
    }

    let current = TitleDistributors::find()
        .filter(title_distributors::Column::TitleId.eq(title_id))
        .all(conn)
        .await?;

    let mut stale = Vec::new();
    for row in current {
        match wanted.shift_remove(&row.contact_id) {
            Some(license_type_id) => {
                if row.license_type_id != license_type_id {
                    title_distributors::ActiveModel {
                        title_id: Set(title_id),
                        contact_id: Set(row.contact_id),
                        license_type_id: Set(license_type_id),
                    }
                    .update(conn)
                    .await?;
                }
            }
            None => stale.push(row.contact_id),
        }
    }
    if !stale.is_empty() {
        TitleDistributors::delete_many()
            .filter(title_distributors::Column::TitleId.eq(title_id))
            .filter(title_distributors::Column::ContactId.is_in(stale))
            .exec(conn)
            .await?;
    }

    let inserts: Vec<_> = wanted
        .iter()
        .map(|(&contact_id, &license_type_id)| title_distributors::ActiveModel {
            title_id: Set(title_id),
            contact_id: Set(contact_id),
            license_type_id: Set(license_type_id),
        })
        .collect();
    if !inserts.is_empty() {
        TitleDistributors::insert_many(inserts)
            .exec_without_returning(conn)
            .await?;
    }
    Ok(())
}

async fn sync_staff<C: ConnectionTrait>(
    conn: &C,
    title_id: i64,
    record: &TitleRecord,
) -> Result<(), StoreError> {
    let mut wanted: Vec<(i64, i64)> = Vec::new();
    for credit in &record.staff {
        if credit.name.trim().is_empty() || credit.role.trim().is_empty() {
            continue;
        }
        let contact_id = refs::resolve_contact(conn, &credit.name, ContactKind::Person).await?;
        let role_id = refs::resolve_staff_role(conn, &credit.role, &record.section).await?;
        let pair = (contact_id, role_id);
        if !wanted.contains(&pair) {
            wanted.push(pair);
        }
    }

    let current = TitleStaff::find()
        .filter(title_staff::Column::TitleId.eq(title_id))
        .all(conn)
        .await?;
    let current_pairs: Vec<(i64, i64)> = current
        .iter()
        .map(|row| (row.contact_id, row.role_id))
        .collect();

    for row in &current {
        if !wanted.contains(&(row.contact_id, row.role_id)) {
            TitleStaff::delete_many()
                .filter(title_staff::Column::TitleId.eq(title_id))
                .filter(title_staff::Column::ContactId.eq(row.contact_id))
                .filter(title_staff::Column::RoleId.eq(row.role_id))
                .exec(conn)
                .await?;
        }
    }

    let inserts: Vec<_> = wanted
        .iter()
        .filter(|pair| !current_pairs.contains(pair))
        .map(|&(contact_id, role_id)| title_staff::ActiveModel {
            title_id: Set(title_id),
            contact_id: Set(contact_id),
            role_id: Set(role_id),
        })
        .collect();
    if !inserts.is_empty() {
        TitleStaff::insert_many(inserts)
            .exec_without_returning(conn)
            .await?;
    }
    Ok(())
}

fn episode_date_columns(episode: &EpisodeRecord) -> (Option<String>, Option<i16>) {
    let date = episode.release_date.filter(|d| !d.is_empty());
    (
        date.map(|d| d.to_string()),
        date.and_then(PartialDate::weekday_number).map(i16::from),
    )
}

async fn sync_episodes<C: ConnectionTrait>(
    conn: &C,
    title_id: i64,
    record: &TitleRecord,
) -> Result<(), StoreError> {
    let mut desired: IndexMap<i32, &EpisodeRecord> = IndexMap::new();
    for episode in &record.episodes {
        desired.entry(episode.number).or_insert(episode);
    }

    let current = Episodes::find()
        .filter(episodes::Column::TitleId.eq(title_id))
        .all(conn)
        .await?;

    let mut stale = Vec::new();
    for row in current {
        match desired.shift_remove(&row.number) {
            Some(episode) => {
                let (date, weekday) = episode_date_columns(episode);
                if row.name != episode.name || row.release_date != date || row.weekday != weekday {
                    episodes::ActiveModel {
                        title_id: Set(title_id),
                        number: Set(row.number),
                        name: Set(episode.name.clone()),
                        release_date: Set(date),
                        weekday: Set(weekday),
                    }
                    .update(conn)
                    .await?;
                }
            }
            None => stale.push(row.number),
        }
    }
    if !stale.is_empty() {
        Episodes::delete_many()
            .filter(episodes::Column::TitleId.eq(title_id))
            .filter(episodes::Column::Number.is_in(stale))
            .exec(conn)
            .await?;
    }

    let inserts: Vec<_> = desired
        .values()
        .map(|episode| {
            let (date, weekday) = episode_date_columns(episode);
            episodes::ActiveModel {
                title_id: Set(title_id),
                number: Set(episode.number),
                name: Set(episode.name.clone()),
                release_date: Set(date),
                weekday: Set(weekday),
            }
        })
        .collect();
    if !inserts.is_empty() {
        Episodes::insert_many(inserts)
            .exec_without_returning(conn)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> TitleRecord {
        TitleRecord {
            sheet_id: 10,
            url: "https://example.org/animes/10-show".to_string(),
            name: "Show".to_string(),
            section: "animes".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn validate_rejects_blank_name() {
        let mut r = record();
        r.name = "   ".to_string();
        assert!(matches!(validate(&r), Err(StoreError::Validation(_))));
    }

    #[test]
    fn validate_rejects_nonpositive_sheet_id() {
        let mut r = record();
        r.sheet_id = 0;
        assert!(matches!(validate(&r), Err(StoreError::Validation(_))));
    }

    #[test]
    fn validate_rejects_relative_url() {
        let mut r = record();
        r.url = "/animes/10-show".to_string();
        assert!(matches!(validate(&r), Err(StoreError::Validation(_))));
    }

    #[test]
    fn validate_rejects_non_http_scheme() {
        let mut r = record();
        r.url = "ftp://example.org/animes/10".to_string();
        assert!(matches!(validate(&r), Err(StoreError::Validation(_))));
    }

    #[test]
    fn validate_accepts_complete_record() {
        assert!(validate(&record()).is_ok());
    }

    #[test]
    fn episode_columns_follow_complete_dates() {
        let episode = EpisodeRecord {
            number: 1,
            name: None,
            release_date: Some(PartialDate::new(2024, 10, 17)),
        };
        let (date, weekday) = episode_date_columns(&episode);
        assert_eq!(date.as_deref(), Some("2024-10-17"));
        assert_eq!(weekday, Some(4));
    }

    #[test]
    fn episode_columns_skip_weekday_for_partial_dates() {
        let episode = EpisodeRecord {
            number: 1,
            name: None,
            release_date: Some(PartialDate::from_year_month(2024, 10)),
        };
        let (date, weekday) = episode_date_columns(&episode);
        assert_eq!(date.as_deref(), Some("2024-10-00"));
        assert_eq!(weekday, None);
    }
}
