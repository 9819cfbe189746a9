//! Translates filter, sort, group, and page requests into parameterized SQL.
//!
//! Searches run in two passes. The first selects only matching title ids in
//! display order, which keeps totals immune to join inflation; the second
//! re-fetches the requested page's ids with their reference and child rows
//! and hands the flattened rows to the materializer.

use crate::db::error::StoreError;
use crate::db::materialize::{JoinRow, materialize};
use crate::db::repositories::ensure_live;
use crate::entities::{
    alternate_titles, categories, contacts, episodes, external_links, formats, license_types,
    origins, seasons, staff_roles, targets, title_categories, title_distributors, title_staff,
    title_studios, titles,
};
use crate::models::filter::{ContentPolicy, GroupBy, Paged, SortBy, SortDir, TitleFilter};
use crate::models::title::TitleAggregate;
use sea_orm::sea_query::{
    Alias, Condition, Expr, Func, Order, Query, SelectStatement, SimpleExpr,
};
use sea_orm::{ConnectionTrait, DatabaseConnection, FromQueryResult};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct TitleQuery {
    conn: DatabaseConnection,
}

#[derive(FromQueryResult)]
struct IdRow {
    id: i64,
}

impl TitleQuery {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Runs one search and returns the requested page plus totals over the
    /// whole match set. A page past the end returns empty items with the
    /// totals intact; a search that matches nothing returns one empty page.
    #[allow(clippy::too_many_arguments)]
    pub async fn search(
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
        let page = page.max(1);
        let page_size = page_size.max(1);
        ensure_live(cancel)?;

        let stmt = id_select(filter, sort, dir, group, policy);
        let built = self.conn.get_database_backend().build(&stmt);
        let ids: Vec<i64> = IdRow::find_by_statement(built)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|row| row.id)
            .collect();
        ensure_live(cancel)?;

        let total_items = ids.len() as u64;
        if total_items == 0 {
            return Ok(Paged::empty(page_size));
        }
        let total_pages = total_items.div_ceil(page_size);

        let offset = usize::try_from((page - 1).saturating_mul(page_size)).unwrap_or(usize::MAX);
        let take = usize::try_from(page_size).unwrap_or(usize::MAX);
        let page_ids: Vec<i64> = ids.into_iter().skip(offset).take(take).collect();
        debug!(
            "search matched {} titles, returning page {} of {}",
            total_items, page, total_pages
        );

        let items = if page_ids.is_empty() {
            Vec::new()
        } else {
            fetch_aggregates(&self.conn, &page_ids).await?
        };

        Ok(Paged {
            current_page: page,
            total_pages,
            page_size,
            total_items,
            items,
        })
    }

    /// The ids matching a filter, in display order, without paging.
    pub async fn matching_ids(
        &self,
        filter: &TitleFilter,
        policy: &ContentPolicy,
    ) -> Result<Vec<i64>, StoreError> {
        let stmt = id_select(filter, SortBy::Name, SortDir::Asc, None, policy);
        let built = self.conn.get_database_backend().build(&stmt);
        Ok(IdRow::find_by_statement(built)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|row| row.id)
            .collect())
    }
}

fn lower(col: (titles::Entity, titles::Column)) -> SimpleExpr {
    Func::lower(Expr::col(col)).into()
}

/// The ordered predicate list for one filter. Every populated option
/// contributes exactly one entry; entries combine with AND.
fn predicates(filter: &TitleFilter, policy: &ContentPolicy) -> Vec<SimpleExpr> {
    let mut list = Vec::new();

    if let Some(keyword) = &filter.keyword {
        let keyword = keyword.trim();
        if !keyword.is_empty() {
            let pattern = format!("%{}%", keyword.to_lowercase());
            let alt_match = Query::select()
                .column(alternate_titles::Column::TitleId)
                .from(alternate_titles::Entity)
                .and_where(
                    Expr::expr(Func::lower(Expr::col(alternate_titles::Column::Name)))
                        .like(&pattern),
                )
                .to_owned();
            list.push(
                Expr::expr(lower((titles::Entity, titles::Column::Name)))
                    .like(&pattern)
                    .or(Expr::expr(lower((titles::Entity, titles::Column::Description)))
                        .like(&pattern))
                    .or(Expr::col((titles::Entity, titles::Column::Id)).in_subquery(alt_match)),
            );
        }
    }

    if let Some(min) = filter.release_date_min {
        list.push(Expr::col((titles::Entity, titles::Column::ReleaseDate)).gte(min.to_string()));
    }
    if let Some(max) = filter.release_date_max {
        list.push(Expr::col((titles::Entity, titles::Column::ReleaseDate)).lte(max.to_string()));
    }

    if let Some(min) = filter.season_min {
        list.push(
            Expr::col((titles::Entity, titles::Column::SeasonId))
                .in_subquery(season_ids(Expr::col(seasons::Column::SeasonNumber).gte(min))),
        );
    }
    if let Some(max) = filter.season_max {
        list.push(
            Expr::col((titles::Entity, titles::Column::SeasonId))
                .in_subquery(season_ids(Expr::col(seasons::Column::SeasonNumber).lte(max))),
        );
    }

    match filter.adult {
        Some(flag) => list.push(Expr::col((titles::Entity, titles::Column::IsAdult)).eq(flag)),
        None if !policy.allow_adult => {
            list.push(Expr::col((titles::Entity, titles::Column::IsAdult)).eq(false));
        }
        None => {}
    }
    match filter.explicit {
        Some(flag) => list.push(Expr::col((titles::Entity, titles::Column::IsExplicit)).eq(flag)),
        None if !policy.allow_explicit => {
            list.push(Expr::col((titles::Entity, titles::Column::IsExplicit)).eq(false));
        }
        None => {}
    }

    push_ref_column(
        &mut list,
        titles::Column::FormatId,
        &filter.include_formats,
        &filter.exclude_formats,
    );
    push_ref_column(
        &mut list,
        titles::Column::TargetId,
        &filter.include_targets,
        &filter.exclude_targets,
    );
    push_ref_column(
        &mut list,
        titles::Column::OriginId,
        &filter.include_origins,
        &filter.exclude_origins,
    );

    push_membership(
        &mut list,
        MembershipTable::Categories,
        &filter.include_categories,
        &filter.exclude_categories,
    );
    push_membership(
        &mut list,
        MembershipTable::Studios,
        &filter.include_studios,
        &filter.exclude_studios,
    );
    push_membership(
        &mut list,
        MembershipTable::Distributors,
        &filter.include_distributors,
        &filter.exclude_distributors,
    );

    list
}

fn season_ids(bound: SimpleExpr) -> SelectStatement {
    Query::select()
        .column(seasons::Column::Id)
        .from(seasons::Entity)
        .and_where(bound)
        .to_owned()
}

/// Inclusion/exclusion over a reference column carried directly on the
/// title row. Exclusion keeps titles that have no value at all: a title
/// without a format is not "the excluded format".
fn push_ref_column(
    list: &mut Vec<SimpleExpr>,
    column: titles::Column,
    include: &[i64],
    exclude: &[i64],
) {
    if !include.is_empty() {
        list.push(Expr::col((titles::Entity, column)).is_in(include.iter().copied()));
    }
    if !exclude.is_empty() {
        list.push(
            Expr::col((titles::Entity, column))
                .is_null()
                .or(Expr::col((titles::Entity, column)).is_not_in(exclude.iter().copied())),
        );
    }
}

#[derive(Clone, Copy)]
enum MembershipTable {
    Categories,
    Studios,
    Distributors,
}

impl MembershipTable {
    fn members(self, ids: &[i64]) -> SelectStatement {
        let ids = ids.iter().copied();
        match self {
            Self::Categories => Query::select()
                .column(title_categories::Column::TitleId)
                .from(title_categories::Entity)
                .and_where(Expr::col(title_categories::Column::CategoryId).is_in(ids))
                .to_owned(),
            Self::Studios => Query::select()
                .column(title_studios::Column::TitleId)
                .from(title_studios::Entity)
                .and_where(Expr::col(title_studios::Column::ContactId).is_in(ids))
                .to_owned(),
            Self::Distributors => Query::select()
                .column(title_distributors::Column::TitleId)
                .from(title_distributors::Entity)
                .and_where(Expr::col(title_distributors::Column::ContactId).is_in(ids))
                .to_owned(),
        }
    }
}

/// Inclusion/exclusion over a many-to-many dimension, as membership
/// subqueries on the link table. Both given at once AND together, so an id
/// present in both can never match.
fn push_membership(
    list: &mut Vec<SimpleExpr>,
    table: MembershipTable,
    include: &[i64],
    exclude: &[i64],
) {
    if !include.is_empty() {
        list.push(
            Expr::col((titles::Entity, titles::Column::Id)).in_subquery(table.members(include)),
        );
    }
    if !exclude.is_empty() {
        list.push(
            Expr::col((titles::Entity, titles::Column::Id))
                .not_in_subquery(table.members(exclude)),
        );
    }
}

/// Sort keys resolve to fixed column references; only the name sort needs
/// an expression, so comparisons ignore case the way lookups do.
fn apply_sort(stmt: &mut SelectStatement, sort: SortBy, order: Order) {
    match sort {
        SortBy::Name => {
            stmt.order_by_expr(lower((titles::Entity, titles::Column::Name)), order);
        }
        SortBy::SheetId => {
            stmt.order_by((titles::Entity, titles::Column::SheetId), order);
        }
        SortBy::ReleaseDate => {
            stmt.order_by((titles::Entity, titles::Column::ReleaseDate), order);
        }
        SortBy::VoteAverage => {
            stmt.order_by((titles::Entity, titles::Column::VoteAverage), order);
        }
        SortBy::VoteCount => {
            stmt.order_by((titles::Entity, titles::Column::VoteCount), order);
        }
        SortBy::EpisodeCount => {
            stmt.order_by((titles::Entity, titles::Column::EpisodeCount), order);
        }
        SortBy::Season => {
            stmt.order_by((seasons::Entity, seasons::Column::SeasonNumber), order);
        }
    }
}

fn apply_group(stmt: &mut SelectStatement, group: GroupBy) {
    match group {
        GroupBy::Format => {
            stmt.order_by((formats::Entity, formats::Column::Name), Order::Asc);
        }
        GroupBy::Target => {
            stmt.order_by((targets::Entity, targets::Column::Name), Order::Asc);
        }
        GroupBy::Origin => {
            stmt.order_by((origins::Entity, origins::Column::Name), Order::Asc);
        }
        GroupBy::Season => {
            stmt.order_by((seasons::Entity, seasons::Column::SeasonNumber), Order::Asc);
        }
        GroupBy::DiffusionState => {
            stmt.order_by((titles::Entity, titles::Column::DiffusionState), Order::Asc);
        }
    }
}

/// First pass: matching title ids in display order. The four reference
/// joins are one-to-one, so they never inflate the id set.
fn id_select(
    filter: &TitleFilter,
    sort: SortBy,
    dir: SortDir,
    group: Option<GroupBy>,
    policy: &ContentPolicy,
) -> SelectStatement {
    let mut condition = Condition::all();
    for predicate in predicates(filter, policy) {
        condition = condition.add(predicate);
    }

    let order = match dir {
        SortDir::Asc => Order::Asc,
        SortDir::Desc => Order::Desc,
    };

    let mut stmt = Query::select();
    stmt.column((titles::Entity, titles::Column::Id))
        .from(titles::Entity);
    join_references(&mut stmt);
    stmt.cond_where(condition);

    // Groups always cluster ascending; the sort direction applies inside
    // each group, and ascending id makes every ordering total.
    if let Some(group) = group {
        apply_group(&mut stmt, group);
    }
    apply_sort(&mut stmt, sort, order);
    stmt.order_by((titles::Entity, titles::Column::Id), Order::Asc);
    stmt
}

fn join_references(stmt: &mut SelectStatement) {
    stmt.left_join(
        formats::Entity,
        Expr::col((titles::Entity, titles::Column::FormatId))
            .equals((formats::Entity, formats::Column::Id)),
    )
    .left_join(
        targets::Entity,
        Expr::col((titles::Entity, titles::Column::TargetId))
            .equals((targets::Entity, targets::Column::Id)),
    )
    .left_join(
        origins::Entity,
        Expr::col((titles::Entity, titles::Column::OriginId))
            .equals((origins::Entity, origins::Column::Id)),
    )
    .left_join(
        seasons::Entity,
        Expr::col((titles::Entity, titles::Column::SeasonId))
            .equals((seasons::Entity, seasons::Column::Id)),
    );
}

/// Which child collection a re-fetch pass carries. Splitting the passes per
/// collection keeps unrelated collections from multiplying against each
/// other in the row count.
#[derive(Clone, Copy)]
enum ChildPass {
    None,
    AlternateTitles,
    ExternalLinks,
    Categories,
    Studios,
    Distributors,
    Staff,
    Episodes,
}

const CHILD_PASSES: [ChildPass; 8] = [
    ChildPass::None,
    ChildPass::AlternateTitles,
    ChildPass::ExternalLinks,
    ChildPass::Categories,
    ChildPass::Studios,
    ChildPass::Distributors,
    ChildPass::Staff,
    ChildPass::Episodes,
];

fn null_str() -> SimpleExpr {
    Expr::value(None::<String>)
}

fn null_i64() -> SimpleExpr {
    Expr::value(None::<i64>)
}

fn null_i32() -> SimpleExpr {
    Expr::value(None::<i32>)
}

fn null_i16() -> SimpleExpr {
    Expr::value(None::<i16>)
}

/// Second pass: one statement per child collection, every row carrying the
/// full title scalars plus that collection's columns. Unused child columns
/// are selected as NULL so every pass shares one row shape.
fn join_row_select(ids: &[i64], pass: ChildPass) -> SelectStatement {
    let mut stmt = Query::select();
    stmt.from(titles::Entity)
        .column((titles::Entity, titles::Column::Id))
        .column((titles::Entity, titles::Column::SheetId))
        .column((titles::Entity, titles::Column::Url))
        .column((titles::Entity, titles::Column::Name))
        .column((titles::Entity, titles::Column::Description))
        .column((titles::Entity, titles::Column::ThumbnailUrl))
        .column((titles::Entity, titles::Column::VoteAverage))
        .column((titles::Entity, titles::Column::VoteCount))
        .column((titles::Entity, titles::Column::DiffusionState))
        .column((titles::Entity, titles::Column::EpisodeCount))
        .column((titles::Entity, titles::Column::EpisodeDuration))
        .column((titles::Entity, titles::Column::ReleaseDate))
        .column((titles::Entity, titles::Column::EndDate))
        .column((titles::Entity, titles::Column::Remark))
        .column((titles::Entity, titles::Column::IsAdult))
        .column((titles::Entity, titles::Column::IsExplicit))
        .column((titles::Entity, titles::Column::FormatId))
        .column((titles::Entity, titles::Column::TargetId))
        .column((titles::Entity, titles::Column::OriginId))
        .column((titles::Entity, titles::Column::SeasonId));
    join_references(&mut stmt);
    stmt.expr_as(
        Expr::col((formats::Entity, formats::Column::Name)),
        Alias::new("format_name"),
    )
    .expr_as(
        Expr::col((targets::Entity, targets::Column::Name)),
        Alias::new("target_name"),
    )
    .expr_as(
        Expr::col((origins::Entity, origins::Column::Name)),
        Alias::new("origin_name"),
    )
    .expr_as(
        Expr::col((seasons::Entity, seasons::Column::SeasonNumber)),
        Alias::new("season_number"),
    )
    .expr_as(
        Expr::col((seasons::Entity, seasons::Column::Label)),
        Alias::new("season_label"),
    );

    if let ChildPass::AlternateTitles = pass {
        stmt.inner_join(
            alternate_titles::Entity,
            Expr::col((alternate_titles::Entity, alternate_titles::Column::TitleId))
                .equals((titles::Entity, titles::Column::Id)),
        )
        .expr_as(
            Expr::col((alternate_titles::Entity, alternate_titles::Column::Name)),
            Alias::new("alt_name"),
        )
        .expr_as(
            Expr::col((alternate_titles::Entity, alternate_titles::Column::Label)),
            Alias::new("alt_label"),
        )
        .order_by(
            (alternate_titles::Entity, alternate_titles::Column::Name),
            Order::Asc,
        );
    } else {
        stmt.expr_as(null_str(), Alias::new("alt_name"))
            .expr_as(null_str(), Alias::new("alt_label"));
    }

    if let ChildPass::ExternalLinks = pass {
        stmt.inner_join(
            external_links::Entity,
            Expr::col((external_links::Entity, external_links::Column::TitleId))
                .equals((titles::Entity, titles::Column::Id)),
        )
        .expr_as(
            Expr::col((external_links::Entity, external_links::Column::Url)),
            Alias::new("link_url"),
        )
        .expr_as(
            Expr::col((external_links::Entity, external_links::Column::Label)),
            Alias::new("link_label"),
        )
        .order_by(
            (external_links::Entity, external_links::Column::Id),
            Order::Asc,
        );
    } else {
        stmt.expr_as(null_str(), Alias::new("link_url"))
            .expr_as(null_str(), Alias::new("link_label"));
    }

    if let ChildPass::Categories = pass {
        stmt.inner_join(
            title_categories::Entity,
            Expr::col((title_categories::Entity, title_categories::Column::TitleId))
                .equals((titles::Entity, titles::Column::Id)),
        )
        .inner_join(
            categories::Entity,
            Expr::col((categories::Entity, categories::Column::Id)).equals((
                title_categories::Entity,
                title_categories::Column::CategoryId,
            )),
        )
        .expr_as(
            Expr::col((categories::Entity, categories::Column::Id)),
            Alias::new("category_id"),
        )
        .expr_as(
            Expr::col((categories::Entity, categories::Column::Name)),
            Alias::new("category_name"),
        )
        .expr_as(
            Expr::col((categories::Entity, categories::Column::Kind)),
            Alias::new("category_kind"),
        )
        .order_by((categories::Entity, categories::Column::Name), Order::Asc);
    } else {
        stmt.expr_as(null_i64(), Alias::new("category_id"))
            .expr_as(null_str(), Alias::new("category_name"))
            .expr_as(null_i16(), Alias::new("category_kind"));
    }

    if let ChildPass::Studios = pass {
        stmt.inner_join(
            title_studios::Entity,
            Expr::col((title_studios::Entity, title_studios::Column::TitleId))
                .equals((titles::Entity, titles::Column::Id)),
        )
        .inner_join(
            contacts::Entity,
            Expr::col((contacts::Entity, contacts::Column::Id))
                .equals((title_studios::Entity, title_studios::Column::ContactId)),
        )
        .expr_as(
            Expr::col((contacts::Entity, contacts::Column::Id)),
            Alias::new("studio_id"),
        )
        .expr_as(
            Expr::col((contacts::Entity, contacts::Column::DisplayName)),
            Alias::new("studio_name"),
        )
        .order_by((contacts::Entity, contacts::Column::DisplayName), Order::Asc);
    } else {
        stmt.expr_as(null_i64(), Alias::new("studio_id"))
            .expr_as(null_str(), Alias::new("studio_name"));
    }

    if let ChildPass::Distributors = pass {
        stmt.inner_join(
            title_distributors::Entity,
            Expr::col((
                title_distributors::Entity,
                title_distributors::Column::TitleId,
            ))
            .equals((titles::Entity, titles::Column::Id)),
        )
        .inner_join(
            contacts::Entity,
            Expr::col((contacts::Entity, contacts::Column::Id)).equals((
                title_distributors::Entity,
                title_distributors::Column::ContactId,
            )),
        )
        .left_join(
            license_types::Entity,
            Expr::col((license_types::Entity, license_types::Column::Id)).equals((
                title_distributors::Entity,
                title_distributors::Column::LicenseTypeId,
            )),
        )
        .expr_as(
            Expr::col((contacts::Entity, contacts::Column::Id)),
            Alias::new("distributor_id"),
        )
        .expr_as(
            Expr::col((contacts::Entity, contacts::Column::DisplayName)),
            Alias::new("distributor_name"),
        )
        .expr_as(
            Expr::col((license_types::Entity, license_types::Column::Name)),
            Alias::new("license_type_name"),
        )
        .order_by((contacts::Entity, contacts::Column::DisplayName), Order::Asc);
    } else {
        stmt.expr_as(null_i64(), Alias::new("distributor_id"))
            .expr_as(null_str(), Alias::new("distributor_name"))
            .expr_as(null_str(), Alias::new("license_type_name"));
    }

    if let ChildPass::Staff = pass {
        stmt.inner_join(
            title_staff::Entity,
            Expr::col((title_staff::Entity, title_staff::Column::TitleId))
                .equals((titles::Entity, titles::Column::Id)),
        )
        .inner_join(
            contacts::Entity,
            Expr::col((contacts::Entity, contacts::Column::Id))
                .equals((title_staff::Entity, title_staff::Column::ContactId)),
        )
        .inner_join(
            staff_roles::Entity,
            Expr::col((staff_roles::Entity, staff_roles::Column::Id))
                .equals((title_staff::Entity, title_staff::Column::RoleId)),
        )
        .expr_as(
            Expr::col((contacts::Entity, contacts::Column::Id)),
            Alias::new("staff_id"),
        )
        .expr_as(
            Expr::col((contacts::Entity, contacts::Column::DisplayName)),
            Alias::new("staff_name"),
        )
        .expr_as(
            Expr::col((staff_roles::Entity, staff_roles::Column::Name)),
            Alias::new("staff_role"),
        )
        .order_by((contacts::Entity, contacts::Column::DisplayName), Order::Asc);
    } else {
        stmt.expr_as(null_i64(), Alias::new("staff_id"))
            .expr_as(null_str(), Alias::new("staff_name"))
            .expr_as(null_str(), Alias::new("staff_role"));
    }

    if let ChildPass::Episodes = pass {
        stmt.inner_join(
            episodes::Entity,
            Expr::col((episodes::Entity, episodes::Column::TitleId))
                .equals((titles::Entity, titles::Column::Id)),
        )
        .expr_as(
            Expr::col((episodes::Entity, episodes::Column::Number)),
            Alias::new("episode_number"),
        )
        .expr_as(
            Expr::col((episodes::Entity, episodes::Column::Name)),
            Alias::new("episode_name"),
        )
        .expr_as(
            Expr::col((episodes::Entity, episodes::Column::ReleaseDate)),
            Alias::new("episode_date"),
        )
        .expr_as(
            Expr::col((episodes::Entity, episodes::Column::Weekday)),
            Alias::new("episode_weekday"),
        )
        .order_by((episodes::Entity, episodes::Column::Number), Order::Asc);
    } else {
        stmt.expr_as(null_i32(), Alias::new("episode_number"))
            .expr_as(null_str(), Alias::new("episode_name"))
            .expr_as(null_str(), Alias::new("episode_date"))
            .expr_as(null_i16(), Alias::new("episode_weekday"));
    }

    stmt.and_where(Expr::col((titles::Entity, titles::Column::Id)).is_in(ids.iter().copied()));
    stmt
}

/// Loads full aggregates for the given ids and returns them in the ids'
/// order. Ids that no longer exist are skipped.
pub(crate) async fn fetch_aggregates<C: ConnectionTrait>(
    conn: &C,
    ids: &[i64],
) -> Result<Vec<TitleAggregate>, StoreError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut rows = Vec::new();
    for pass in CHILD_PASSES {
        let stmt = join_row_select(ids, pass);
        let built = conn.get_database_backend().build(&stmt);
        rows.extend(JoinRow::find_by_statement(built).all(conn).await?);
    }

    let mut by_id: HashMap<i64, TitleAggregate> = materialize(rows)
        .into_iter()
        .map(|aggregate| (aggregate.id, aggregate))
        .collect();
    Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
}
