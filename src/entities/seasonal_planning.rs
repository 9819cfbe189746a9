use sea_orm::entity::prelude::*;

/// Snapshot of a title's seasonal listing as scraped at one point in time.
/// Denormalized on purpose: the aggregate is referenced only through its
/// natural sheet id, so a snapshot survives deletion of the title row.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "seasonal_planning")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub season_number: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub sheet_id: i64,
    pub url: String,
    pub name: String,
    pub thumbnail_url: Option<String>,
    /// Format name at scrape time, used to group the season board.
    pub format_name: Option<String>,
    pub is_adult: bool,
    pub is_explicit: bool,
    pub release_date: Option<String>,
    pub episode_count: i32,
    pub captured_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
