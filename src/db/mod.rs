use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::models::filter::{ContentPolicy, GroupBy, Paged, SortBy, SortDir, TitleFilter};
use crate::models::title::{
    CategoryKind, NamedRef, SeasonRef, TitleAggregate, TitleRecord, UpsertOutcome,
};

pub mod error;
pub mod materialize;
pub mod migrator;
pub mod repositories;

pub use error::StoreError;
pub use repositories::title::SheetKeys;

use crate::entities::{daily_planning, seasonal_planning};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
    sheet_keys: SheetKeys,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self {
            conn,
            sheet_keys: SheetKeys::default(),
        })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn title_repo(&self) -> repositories::title::TitleRepository {
        repositories::title::TitleRepository::new(self.conn.clone(), self.sheet_keys.clone())
    }

    fn title_query(&self) -> repositories::query::TitleQuery {
        repositories::query::TitleQuery::new(self.conn.clone())
    }

    fn ref_repo(&self) -> repositories::refs::RefRepository {
        repositories::refs::RefRepository::new(self.conn.clone())
    }

    fn planning_repo(&self) -> repositories::planning::PlanningRepository {
        repositories::planning::PlanningRepository::new(self.conn.clone())
    }

    pub async fn upsert_title(
        &self,
        record: &TitleRecord,
        cancel: &CancellationToken,
    ) -> Result<UpsertOutcome, StoreError> {
        self.title_repo().upsert(record, cancel).await
    }

    pub async fn find_title_by_sheet_id(
        &self,
        sheet_id: i64,
    ) -> Result<Option<TitleAggregate>, StoreError> {
        self.title_repo().find_by_sheet_id(sheet_id).await
    }

    pub async fn find_title_by_url(&self, url: &str) -> Result<Option<TitleAggregate>, StoreError> {
        self.title_repo().find_by_url(url).await
    }

    pub async fn delete_title(&self, sheet_id: i64) -> Result<bool, StoreError> {
        self.title_repo().delete_by_sheet_id(sheet_id).await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn search_titles(
        &self,
        filter: &TitleFilter,
        sort: SortBy,
        dir: SortDir,
        group: Option<GroupBy>,
        page: u64,
        page_size: u64,
        policy: &ContentPolicy,
        cancel: &CancellationToken,
    ) -> Result<Paged<TitleAggregate>, StoreError> {
        self.title_query()
            .search(filter, sort, dir, group, page, page_size, policy, cancel)
            .await
    }

    pub async fn matching_title_ids(
        &self,
        filter: &TitleFilter,
        policy: &ContentPolicy,
    ) -> Result<Vec<i64>, StoreError> {
        self.title_query().matching_ids(filter, policy).await
    }

    /// One season's titles, paged: the composer run with season min = max.
    pub async fn titles_in_season(
        &self,
        season_number: i64,
        page: u64,
        page_size: u64,
        policy: &ContentPolicy,
        cancel: &CancellationToken,
    ) -> Result<Paged<TitleAggregate>, StoreError> {
        let filter = TitleFilter {
            season_min: Some(season_number),
            season_max: Some(season_number),
            ..Default::default()
        };
        self.title_query()
            .search(
                &filter,
                SortBy::Name,
                SortDir::Asc,
                None,
                page,
                page_size,
                policy,
                cancel,
            )
            .await
    }

    pub async fn capture_planning(
        &self,
        record: &TitleRecord,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        self.planning_repo().capture(record, cancel).await
    }

    pub async fn list_seasonal_planning(
        &self,
        season_number: i64,
    ) -> Result<Vec<seasonal_planning::Model>, StoreError> {
        self.planning_repo().list_seasonal(season_number).await
    }

    pub async fn list_daily_planning(
        &self,
        air_date: &str,
    ) -> Result<Vec<daily_planning::Model>, StoreError> {
        self.planning_repo().list_daily(air_date).await
    }

    pub async fn list_formats(&self) -> Result<Vec<NamedRef>, StoreError> {
        self.ref_repo().list_formats().await
    }

    pub async fn list_targets(&self) -> Result<Vec<NamedRef>, StoreError> {
        self.ref_repo().list_targets().await
    }

    pub async fn list_origins(&self) -> Result<Vec<NamedRef>, StoreError> {
        self.ref_repo().list_origins().await
    }

    pub async fn list_categories(
        &self,
        kind: Option<CategoryKind>,
    ) -> Result<Vec<NamedRef>, StoreError> {
        self.ref_repo().list_categories(kind).await
    }

    pub async fn list_seasons(&self) -> Result<Vec<SeasonRef>, StoreError> {
        self.ref_repo().list_seasons().await
    }
}
