use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "title_distributors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub title_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub contact_id: i64,
    /// Qualifier, not part of the key: re-licensing under a new type updates
    /// the row in place.
    pub license_type_id: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::titles::Entity",
        from = "Column::TitleId",
        to = "super::titles::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Titles,
    #[sea_orm(
        belongs_to = "super::contacts::Entity",
        from = "Column::ContactId",
        to = "super::contacts::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Contacts,
    #[sea_orm(
        belongs_to = "super::license_types::Entity",
        from = "Column::LicenseTypeId",
        to = "super::license_types::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    LicenseTypes,
}

impl Related<super::titles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Titles.def()
    }
}

impl Related<super::contacts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contacts.def()
    }
}

impl Related<super::license_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LicenseTypes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
