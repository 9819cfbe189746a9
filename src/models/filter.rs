use crate::normalize::PartialDate;
use serde::Serialize;

/// Ad-hoc search filter. Every populated field contributes exactly one
/// predicate; all predicates combine with AND. Include and exclude sets on
/// the same dimension are both applied, so an id present in both can never
/// match.
#[derive(Debug, Clone, Default)]
pub struct TitleFilter {
    /// Case-insensitive substring over name, description, and alternate
    /// titles.
    pub keyword: Option<String>,
    pub release_date_min: Option<PartialDate>,
    pub release_date_max: Option<PartialDate>,
    pub season_min: Option<i64>,
    pub season_max: Option<i64>,
    /// Tri-state: `Some` filters on the flag, `None` defers to the caller's
    /// [`ContentPolicy`].
    pub adult: Option<bool>,
    pub explicit: Option<bool>,
    pub include_formats: Vec<i64>,
    pub exclude_formats: Vec<i64>,
    pub include_targets: Vec<i64>,
    pub exclude_targets: Vec<i64>,
    pub include_origins: Vec<i64>,
    pub exclude_origins: Vec<i64>,
    pub include_categories: Vec<i64>,
    pub exclude_categories: Vec<i64>,
    pub include_studios: Vec<i64>,
    pub exclude_studios: Vec<i64>,
    pub include_distributors: Vec<i64>,
    pub exclude_distributors: Vec<i64>,
}

/// What visibility a caller gets when a filter leaves the adult or explicit
/// flag unset. The restrictive default hides flagged titles; permissive
/// callers must say so.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContentPolicy {
    pub allow_adult: bool,
    pub allow_explicit: bool,
}

impl ContentPolicy {
    #[must_use]
    pub const fn permissive() -> Self {
        Self {
            allow_adult: true,
            allow_explicit: true,
        }
    }
}

/// Sort key for searches. Whatever the key, rows with equal values tie-break
/// on ascending surrogate id, so page boundaries are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    Name,
    SheetId,
    ReleaseDate,
    VoteAverage,
    VoteCount,
    EpisodeCount,
    Season,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

/// Optional grouping key, applied as the leading sort so rows of one group
/// come out adjacent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Format,
    Target,
    Origin,
    Season,
    DiffusionState,
}

/// One page of results plus the totals of the whole match set.
#[derive(Debug, Clone, Serialize)]
pub struct Paged<T> {
    pub current_page: u64,
    pub total_pages: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub items: Vec<T>,
}

impl<T> Paged<T> {
    /// The shape of a search that matched nothing: one empty page.
    #[must_use]
    pub const fn empty(page_size: u64) -> Self {
        Self {
            current_page: 1,
            total_pages: 1,
            page_size,
            total_items: 0,
            items: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_restrictive() {
        let policy = ContentPolicy::default();
        assert!(!policy.allow_adult);
        assert!(!policy.allow_explicit);
    }

    #[test]
    fn empty_page_shape() {
        let page: Paged<u8> = Paged::empty(20);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_items, 0);
        assert!(page.items.is_empty());
    }
}
