use sea_orm::entity::prelude::*;

/// Credited role on a production (réalisateur, scénariste, ...).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "staff_roles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub section: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::title_staff::Entity")]
    TitleStaff,
}

impl Related<super::title_staff::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TitleStaff.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
