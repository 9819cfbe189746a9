use sea_orm::entity::prelude::*;

/// Shared pool of studios, distributors, and people. (display_name, kind) is
/// unique case-insensitively.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "contacts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub display_name: String,
    /// Integer form of [`crate::models::title::ContactKind`].
    pub kind: i16,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::title_studios::Entity")]
    TitleStudios,
    #[sea_orm(has_many = "super::title_distributors::Entity")]
    TitleDistributors,
    #[sea_orm(has_many = "super::title_staff::Entity")]
    TitleStaff,
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

impl ActiveModelBehavior for ActiveModel {}
