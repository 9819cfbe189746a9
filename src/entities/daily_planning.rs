use sea_orm::entity::prelude::*;

/// Snapshot of one episode airing on one calendar day. Like the seasonal
/// board, rows carry the natural sheet id only.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "daily_planning")]
pub struct Model {
    /// Complete date `YYYY-MM-DD`.
    #[sea_orm(primary_key, auto_increment = false)]
    pub air_date: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub sheet_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub episode_number: i32,
    pub url: String,
    pub name: String,
    pub is_adult: bool,
    pub is_explicit: bool,
    pub captured_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
