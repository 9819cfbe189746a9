use sea_orm::entity::prelude::*;

/// How a distributor licenses a title (simulcast, home video, ...).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "license_types")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub section: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::title_distributors::Entity")]
    TitleDistributors,
}

impl Related<super::title_distributors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TitleDistributors.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
