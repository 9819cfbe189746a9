use crate::normalize::{DiffusionState, PartialDate, Season};
use serde::{Deserialize, Serialize};

/// Classification of a category tag on the source site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryKind {
    Genre,
    Theme,
}

impl CategoryKind {
    #[must_use]
    pub const fn as_i16(self) -> i16 {
        match self {
            Self::Genre => 1,
            Self::Theme => 2,
        }
    }

    #[must_use]
    pub const fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(Self::Genre),
            2 => Some(Self::Theme),
            _ => None,
        }
    }
}

/// What kind of party a contact row represents. A studio and a person with
/// the same display name stay distinct rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactKind {
    Studio,
    Distributor,
    Person,
}

impl ContactKind {
    #[must_use]
    pub const fn as_i16(self) -> i16 {
        match self {
            Self::Studio => 1,
            Self::Distributor => 2,
            Self::Person => 3,
        }
    }

    #[must_use]
    pub const fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(Self::Studio),
            2 => Some(Self::Distributor),
            3 => Some(Self::Person),
            _ => None,
        }
    }
}

/// Everything extracted and normalized from one sheet page, ready to be
/// written. Reference values are still plain names here; the store resolves
/// them to ids when the record is upserted.
#[derive(Debug, Clone, Default)]
pub struct TitleRecord {
    /// Explicit surrogate id. Normally unset; when set, a natural-key hit
    /// under a different id is refused instead of repointed.
    pub id: Option<i64>,
    pub sheet_id: i64,
    /// Canonical absolute URL of the sheet page.
    pub url: String,
    pub name: String,
    /// Site section the sheet lives under, part of every reference natural key.
    pub section: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub vote_average: f64,
    pub vote_count: i32,
    pub diffusion_state: DiffusionState,
    pub episode_count: i32,
    pub episode_duration: u32,
    pub release_date: Option<PartialDate>,
    pub end_date: Option<PartialDate>,
    pub remark: Option<String>,
    pub is_adult: bool,
    pub is_explicit: bool,
    pub format: Option<String>,
    pub target: Option<String>,
    pub origin: Option<String>,
    pub season: Option<Season>,
    pub alternate_titles: Vec<AlternateTitleRecord>,
    pub external_links: Vec<ExternalLinkRecord>,
    pub genres: Vec<String>,
    pub themes: Vec<String>,
    pub studios: Vec<String>,
    pub distributors: Vec<DistributorRecord>,
    pub staff: Vec<StaffRecord>,
    pub episodes: Vec<EpisodeRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlternateTitleRecord {
    pub name: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalLinkRecord {
    pub url: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributorRecord {
    pub name: String,
    pub license_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffRecord {
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeRecord {
    pub number: i32,
    pub name: Option<String>,
    pub release_date: Option<PartialDate>,
}

/// Result of writing a record: the surrogate id it landed under and whether
/// the row was created rather than updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub id: i64,
    pub created: bool,
}

/// A reference row as seen by readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonRef {
    pub id: i64,
    pub number: i64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlternateTitle {
    pub name: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalLink {
    pub url: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Distributor {
    pub contact_id: i64,
    pub name: String,
    pub license_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffCredit {
    pub contact_id: i64,
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EpisodeSummary {
    pub number: i32,
    pub name: Option<String>,
    pub release_date: Option<String>,
    pub weekday: Option<i16>,
}

/// A stored title with its reference names and child collections attached,
/// as returned by searches and lookups.
#[derive(Debug, Clone, Serialize)]
pub struct TitleAggregate {
    pub id: i64,
    pub sheet_id: i64,
    pub url: String,
    pub name: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub vote_average: f64,
    pub vote_count: i32,
    pub diffusion_state: DiffusionState,
    pub episode_count: i32,
    pub episode_duration: i32,
    pub release_date: Option<String>,
    pub end_date: Option<String>,
    pub remark: Option<String>,
    pub is_adult: bool,
    pub is_explicit: bool,
    pub format: Option<NamedRef>,
    pub target: Option<NamedRef>,
    pub origin: Option<NamedRef>,
    pub season: Option<SeasonRef>,
    pub alternate_titles: Vec<AlternateTitle>,
    pub external_links: Vec<ExternalLink>,
    pub genres: Vec<NamedRef>,
    pub themes: Vec<NamedRef>,
    pub studios: Vec<NamedRef>,
    pub distributors: Vec<Distributor>,
    pub staff: Vec<StaffCredit>,
    pub episodes: Vec<EpisodeSummary>,
}
