use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub section: String,
    /// Integer form of [`crate::models::title::CategoryKind`]. The same name
    /// may exist once as a genre and once as a theme.
    pub kind: i16,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::title_categories::Entity")]
    TitleCategories,
}

impl Related<super::title_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TitleCategories.def()
    }
}

impl Related<super::titles::Entity> for Entity {
    fn to() -> RelationDef {
        super::title_categories::Relation::Titles.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::title_categories::Relation::Categories.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
