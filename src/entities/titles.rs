use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "titles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// External sheet id assigned by the source site.
    #[sea_orm(unique)]
    pub sheet_id: i64,
    /// Canonical absolute URL of the sheet page.
    #[sea_orm(unique)]
    pub url: String,
    pub name: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub vote_average: f64,
    pub vote_count: i32,
    /// Integer form of [`crate::normalize::DiffusionState`].
    pub diffusion_state: i16,
    pub episode_count: i32,
    /// Episode length in minutes, 0 when unknown.
    pub episode_duration: i32,
    /// Partial date text `YYYY-MM-DD`, zeros for unknown components.
    pub release_date: Option<String>,
    pub end_date: Option<String>,
    pub remark: Option<String>,
    pub is_adult: bool,
    pub is_explicit: bool,
    pub format_id: Option<i64>,
    pub target_id: Option<i64>,
    pub origin_id: Option<i64>,
    pub season_id: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::formats::Entity",
        from = "Column::FormatId",
        to = "super::formats::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Formats,
    #[sea_orm(
        belongs_to = "super::targets::Entity",
        from = "Column::TargetId",
        to = "super::targets::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Targets,
    #[sea_orm(
        belongs_to = "super::origins::Entity",
        from = "Column::OriginId",
        to = "super::origins::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Origins,
    #[sea_orm(
        belongs_to = "super::seasons::Entity",
        from = "Column::SeasonId",
        to = "super::seasons::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Seasons,
    #[sea_orm(has_many = "super::alternate_titles::Entity")]
    AlternateTitles,
    #[sea_orm(has_many = "super::external_links::Entity")]
    ExternalLinks,
    #[sea_orm(has_many = "super::title_categories::Entity")]
    TitleCategories,
    #[sea_orm(has_many = "super::title_studios::Entity")]
    TitleStudios,
    #[sea_orm(has_many = "super::title_distributors::Entity")]
    TitleDistributors,
    #[sea_orm(has_many = "super::title_staff::Entity")]
    TitleStaff,
    #[sea_orm(has_many = "super::episodes::Entity")]
    Episodes,
}

impl Related<super::formats::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Formats.def()
    }
}

impl Related<super::targets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Targets.def()
    }
}

impl Related<super::origins::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Origins.def()
    }
}

impl Related<super::seasons::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Seasons.def()
    }
}

impl Related<super::alternate_titles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AlternateTitles.def()
    }
}

impl Related<super::external_links::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExternalLinks.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        super::title_categories::Relation::Categories.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::title_categories::Relation::Titles.def().rev())
    }
}

impl Related<super::title_studios::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TitleStudios.def()
    }
}

impl Related<super::title_distributors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TitleDistributors.def()
    }
}

impl Related<super::title_staff::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TitleStaff.def()
    }
}

impl Related<super::episodes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Episodes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
