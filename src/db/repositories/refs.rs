//! Resolution of reference rows (formats, targets, origins, categories,
//! license types, staff roles, contacts, seasons) to their surrogate ids.
//!
//! Every resolver follows the same protocol: look the natural key up
//! case-insensitively, and on a miss insert with `ON CONFLICT DO NOTHING`
//! and re-select. A unique violation from a concurrent writer is therefore
//! a retry signal, not an error. The functions are generic over
//! [`ConnectionTrait`] so they run inside the upsert transaction.

use crate::db::error::StoreError;
use crate::entities::{
    categories, contacts, formats, license_types, origins, prelude::*, seasons, staff_roles,
    targets,
};
use crate::models::title::{CategoryKind, ContactKind, NamedRef, SeasonRef};
use crate::normalize::Season;
use sea_orm::sea_query::{Expr, Func, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

fn blank(kind: &str) -> StoreError {
    StoreError::Validation(format!("{kind} name is blank"))
}

fn vanished(kind: &str, name: &str) -> StoreError {
    StoreError::Conflict(format!("{kind} '{name}' vanished during resolve"))
}

async fn find_format<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    section: &str,
) -> Result<Option<i64>, StoreError> {
    let row = Formats::find()
        .filter(Expr::expr(Func::lower(Expr::col(formats::Column::Name))).eq(name.to_lowercase()))
        .filter(formats::Column::Section.eq(section))
        .one(conn)
        .await?;
    Ok(row.map(|m| m.id))
}

pub async fn resolve_format<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    section: &str,
) -> Result<i64, StoreError> {
    let name = name.trim();
    let section = section.trim();
    if name.is_empty() {
        return Err(blank("format"));
    }
    if let Some(id) = find_format(conn, name, section).await? {
        return Ok(id);
    }
    Formats::insert(formats::ActiveModel {
        name: Set(name.to_owned()),
        section: Set(section.to_owned()),
        ..Default::default()
    })
    .on_conflict(OnConflict::new().do_nothing().to_owned())
    .exec_without_returning(conn)
    .await?;
    find_format(conn, name, section)
        .await?
        .ok_or_else(|| vanished("format", name))
}

async fn find_target<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    section: &str,
) -> Result<Option<i64>, StoreError> {
    let row = Targets::find()
        .filter(Expr::expr(Func::lower(Expr::col(targets::Column::Name))).eq(name.to_lowercase()))
        .filter(targets::Column::Section.eq(section))
        .one(conn)
        .await?;
    Ok(row.map(|m| m.id))
}

pub async fn resolve_target<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    section: &str,
) -> Result<i64, StoreError> {
    let name = name.trim();
    let section = section.trim();
    if name.is_empty() {
        return Err(blank("target"));
    }
    if let Some(id) = find_target(conn, name, section).await? {
        return Ok(id);
    }
    Targets::insert(targets::ActiveModel {
        name: Set(name.to_owned()),
        section: Set(section.to_owned()),
        ..Default::default()
    })
    .on_conflict(OnConflict::new().do_nothing().to_owned())
    .exec_without_returning(conn)
    .await?;
    find_target(conn, name, section)
        .await?
        .ok_or_else(|| vanished("target", name))
}

async fn find_origin<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    section: &str,
) -> Result<Option<i64>, StoreError> {
    let row = Origins::find()
        .filter(Expr::expr(Func::lower(Expr::col(origins::Column::Name))).eq(name.to_lowercase()))
        .filter(origins::Column::Section.eq(section))
        .one(conn)
        .await?;
    Ok(row.map(|m| m.id))
}

pub async fn resolve_origin<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    section: &str,
) -> Result<i64, StoreError> {
    let name = name.trim();
    let section = section.trim();
    if name.is_empty() {
        return Err(blank("origin"));
    }
    if let Some(id) = find_origin(conn, name, section).await? {
        return Ok(id);
    }
    Origins::insert(origins::ActiveModel {
        name: Set(name.to_owned()),
        section: Set(section.to_owned()),
        ..Default::default()
    })
    .on_conflict(OnConflict::new().do_nothing().to_owned())
    .exec_without_returning(conn)
    .await?;
    find_origin(conn, name, section)
        .await?
        .ok_or_else(|| vanished("origin", name))
}

async fn find_category<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    section: &str,
    kind: CategoryKind,
) -> Result<Option<i64>, StoreError> {
    let row = Categories::find()
        .filter(
            Expr::expr(Func::lower(Expr::col(categories::Column::Name))).eq(name.to_lowercase()),
        )
        .filter(categories::Column::Section.eq(section))
        .filter(categories::Column::Kind.eq(kind.as_i16()))
        .one(conn)
        .await?;
    Ok(row.map(|m| m.id))
}

/// Categories carry a kind (genre or theme) as part of their natural key,
/// so "Action" the genre and "Action" the theme stay distinct rows.
pub async fn resolve_category<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    section: &str,
    kind: CategoryKind,
) -> Result<i64, StoreError> {
    let name = name.trim();
    let section = section.trim();
    if name.is_empty() {
        return Err(blank("category"));
    }
    if let Some(id) = find_category(conn, name, section, kind).await? {
        return Ok(id);
    }
    Categories::insert(categories::ActiveModel {
        name: Set(name.to_owned()),
        section: Set(section.to_owned()),
        kind: Set(kind.as_i16()),
        ..Default::default()
    })
    .on_conflict(OnConflict::new().do_nothing().to_owned())
    .exec_without_returning(conn)
    .await?;
    find_category(conn, name, section, kind)
        .await?
        .ok_or_else(|| vanished("category", name))
}

async fn find_license_type<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    section: &str,
) -> Result<Option<i64>, StoreError> {
    let row = LicenseTypes::find()
        .filter(
            Expr::expr(Func::lower(Expr::col(license_types::Column::Name)))
                .eq(name.to_lowercase()),
        )
        .filter(license_types::Column::Section.eq(section))
        .one(conn)
        .await?;
    Ok(row.map(|m| m.id))
}

pub async fn resolve_license_type<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    section: &str,
) -> Result<i64, StoreError> {
    let name = name.trim();
    let section = section.trim();
    if name.is_empty() {
        return Err(blank("license type"));
    }
    if let Some(id) = find_license_type(conn, name, section).await? {
        return Ok(id);
    }
    LicenseTypes::insert(license_types::ActiveModel {
        name: Set(name.to_owned()),
        section: Set(section.to_owned()),
        ..Default::default()
    })
    .on_conflict(OnConflict::new().do_nothing().to_owned())
    .exec_without_returning(conn)
    .await?;
    find_license_type(conn, name, section)
        .await?
        .ok_or_else(|| vanished("license type", name))
}

async fn find_staff_role<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    section: &str,
) -> Result<Option<i64>, StoreError> {
    let row = StaffRoles::find()
        .filter(
            Expr::expr(Func::lower(Expr::col(staff_roles::Column::Name))).eq(name.to_lowercase()),
        )
        .filter(staff_roles::Column::Section.eq(section))
        .one(conn)
        .await?;
    Ok(row.map(|m| m.id))
}

pub async fn resolve_staff_role<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    section: &str,
) -> Result<i64, StoreError> {
    let name = name.trim();
    let section = section.trim();
    if name.is_empty() {
        return Err(blank("staff role"));
    }
    if let Some(id) = find_staff_role(conn, name, section).await? {
        return Ok(id);
    }
    StaffRoles::insert(staff_roles::ActiveModel {
        name: Set(name.to_owned()),
        section: Set(section.to_owned()),
        ..Default::default()
    })
    .on_conflict(OnConflict::new().do_nothing().to_owned())
    .exec_without_returning(conn)
    .await?;
    find_staff_role(conn, name, section)
        .await?
        .ok_or_else(|| vanished("staff role", name))
}

async fn find_contact<C: ConnectionTrait>(
    conn: &C,
    display_name: &str,
    kind: ContactKind,
) -> Result<Option<i64>, StoreError> {
    let row = Contacts::find()
        .filter(
            Expr::expr(Func::lower(Expr::col(contacts::Column::DisplayName)))
                .eq(display_name.to_lowercase()),
        )
        .filter(contacts::Column::Kind.eq(kind.as_i16()))
        .one(conn)
        .await?;
    Ok(row.map(|m| m.id))
}

/// Contacts are shared across titles: the same studio row backs every
/// title it produced. The kind keeps a studio and a person with the same
/// name apart.
pub async fn resolve_contact<C: ConnectionTrait>(
    conn: &C,
    display_name: &str,
    kind: ContactKind,
) -> Result<i64, StoreError> {
    let display_name = display_name.trim();
    if display_name.is_empty() {
        return Err(blank("contact"));
    }
    if let Some(id) = find_contact(conn, display_name, kind).await? {
        return Ok(id);
    }
    Contacts::insert(contacts::ActiveModel {
        display_name: Set(display_name.to_owned()),
        kind: Set(kind.as_i16()),
        ..Default::default()
    })
    .on_conflict(OnConflict::new().do_nothing().to_owned())
    .exec_without_returning(conn)
    .await?;
    find_contact(conn, display_name, kind)
        .await?
        .ok_or_else(|| vanished("contact", display_name))
}

async fn find_season<C: ConnectionTrait>(
    conn: &C,
    number: i64,
) -> Result<Option<i64>, StoreError> {
    let row = Seasons::find()
        .filter(seasons::Column::SeasonNumber.eq(number))
        .one(conn)
        .await?;
    Ok(row.map(|m| m.id))
}

/// Seasons key on their numeric code rather than the label, so the label
/// wording can change without minting a second row for the same quarter.
pub async fn resolve_season<C: ConnectionTrait>(
    conn: &C,
    season: Season,
) -> Result<i64, StoreError> {
    let number = i64::from(season.number());
    if let Some(id) = find_season(conn, number).await? {
        return Ok(id);
    }
    Seasons::insert(seasons::ActiveModel {
        season_number: Set(number),
        label: Set(season.label()),
        ..Default::default()
    })
    .on_conflict(OnConflict::new().do_nothing().to_owned())
    .exec_without_returning(conn)
    .await?;
    find_season(conn, number)
        .await?
        .ok_or_else(|| vanished("season", &season.label()))
}

pub struct RefRepository {
    conn: DatabaseConnection,
}

impl RefRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_formats(&self) -> Result<Vec<NamedRef>, StoreError> {
        let rows = Formats::find()
            .order_by_asc(formats::Column::Name)
            .all(&self.conn)
            .await?;
        Ok(rows
            .into_iter()
            .map(|m| NamedRef {
                id: m.id,
                name: m.name,
            })
            .collect())
    }

    pub async fn list_targets(&self) -> Result<Vec<NamedRef>, StoreError> {
        let rows = Targets::find()
            .order_by_asc(targets::Column::Name)
            .all(&self.conn)
            .await?;
        Ok(rows
            .into_iter()
            .map(|m| NamedRef {
                id: m.id,
                name: m.name,
            })
            .collect())
    }

    pub async fn list_origins(&self) -> Result<Vec<NamedRef>, StoreError> {
        let rows = Origins::find()
            .order_by_asc(origins::Column::Name)
            .all(&self.conn)
            .await?;
        Ok(rows
            .into_iter()
            .map(|m| NamedRef {
                id: m.id,
                name: m.name,
            })
            .collect())
    }

    pub async fn list_categories(
        &self,
        kind: Option<CategoryKind>,
    ) -> Result<Vec<NamedRef>, StoreError> {
        let mut query = Categories::find().order_by_asc(categories::Column::Name);
        if let Some(kind) = kind {
            query = query.filter(categories::Column::Kind.eq(kind.as_i16()));
        }
        let rows = query.all(&self.conn).await?;
        Ok(rows
            .into_iter()
            .map(|m| NamedRef {
                id: m.id,
                name: m.name,
            })
            .collect())
    }

    pub async fn list_seasons(&self) -> Result<Vec<SeasonRef>, StoreError> {
        let rows = Seasons::find()
            .order_by_asc(seasons::Column::SeasonNumber)
            .all(&self.conn)
            .await?;
        Ok(rows
            .into_iter()
            .map(|m| SeasonRef {
                id: m.id,
                number: m.season_number,
                label: m.label,
            })
            .collect())
    }
}
