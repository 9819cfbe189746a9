//! Planning snapshots: denormalized projections of what airs in a season
//! and on a given day, captured at scrape time. Rows reference titles by
//! sheet id only, so they survive aggregate deletion and never own anything.

use crate::db::error::StoreError;
use crate::db::repositories::ensure_live;
use crate::entities::{daily_planning, prelude::*, seasonal_planning};
use crate::models::title::TitleRecord;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct PlanningRepository {
    conn: DatabaseConnection,
}

impl PlanningRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Replaces this sheet's snapshot rows with what the record currently
    /// says: one seasonal row when the title carries a season, one daily row
    /// per fully dated episode. Rows for seasons or dates the record no
    /// longer mentions disappear with the replacement.
    pub async fn capture(
        &self,
        record: &TitleRecord,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        ensure_live(cancel)?;
        let captured_at = chrono::Utc::now().to_rfc3339();
        let txn = self.conn.begin().await?;

        SeasonalPlanning::delete_many()
            .filter(seasonal_planning::Column::SheetId.eq(record.sheet_id))
            .exec(&txn)
            .await?;
        if let Some(season) = record.season {
            SeasonalPlanning::insert(seasonal_planning::ActiveModel {
                season_number: Set(i64::from(season.number())),
                sheet_id: Set(record.sheet_id),
                url: Set(record.url.clone()),
                name: Set(record.name.trim().to_owned()),
                thumbnail_url: Set(record.thumbnail_url.clone()),
                format_name: Set(record.format.clone()),
                is_adult: Set(record.is_adult),
                is_explicit: Set(record.is_explicit),
                release_date: Set(record.release_date.map(|d| d.to_string())),
                episode_count: Set(record.episode_count),
                captured_at: Set(captured_at.clone()),
            })
            .exec_without_returning(&txn)
            .await?;
        }
        ensure_live(cancel)?;

        DailyPlanning::delete_many()
            .filter(daily_planning::Column::SheetId.eq(record.sheet_id))
            .exec(&txn)
            .await?;
        let mut seen = HashSet::new();
        let rows: Vec<_> = record
            .episodes
            .iter()
            .filter_map(|episode| {
                let date = episode.release_date.filter(|d| d.is_complete())?;
                if !seen.insert(episode.number) {
                    return None;
                }
                Some(daily_planning::ActiveModel {
                    air_date: Set(date.to_string()),
                    sheet_id: Set(record.sheet_id),
                    episode_number: Set(episode.number),
                    url: Set(record.url.clone()),
                    name: Set(record.name.trim().to_owned()),
                    is_adult: Set(record.is_adult),
                    is_explicit: Set(record.is_explicit),
                    captured_at: Set(captured_at.clone()),
                })
            })
            .collect();
        let daily_rows = rows.len();
        if !rows.is_empty() {
            DailyPlanning::insert_many(rows)
                .exec_without_returning(&txn)
                .await?;
        }

        txn.commit().await?;
        debug!(
            "captured planning for sheet {}: {} daily rows",
            record.sheet_id, daily_rows
        );
        Ok(())
    }

    pub async fn list_seasonal(
        &self,
        season_number: i64,
    ) -> Result<Vec<seasonal_planning::Model>, StoreError> {
        Ok(SeasonalPlanning::find()
            .filter(seasonal_planning::Column::SeasonNumber.eq(season_number))
            .order_by_asc(seasonal_planning::Column::Name)
            .all(&self.conn)
            .await?)
    }

    pub async fn list_daily(
        &self,
        air_date: &str,
    ) -> Result<Vec<daily_planning::Model>, StoreError> {
        Ok(DailyPlanning::find()
            .filter(daily_planning::Column::AirDate.eq(air_date))
            .order_by_asc(daily_planning::Column::Name)
            .order_by_asc(daily_planning::Column::EpisodeNumber)
            .all(&self.conn)
            .await?)
    }
}
