//! CLI module - Command-line interface for Anisheet
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::constants::paging::DEFAULT_PAGE_SIZE;
use crate::models::filter::{GroupBy, SortBy};

/// Anisheet - Anime Catalog Builder
/// Scrapes sheet pages from a catalog site into a queryable local database
#[derive(Parser)]
#[command(name = "anisheet")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch sheet pages and store them in the catalog
    #[command(alias = "in")]
    Ingest {
        /// Sheet URLs, or paths relative to the configured site
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Store one sheet from a page saved on disk
    IngestFile {
        /// Path to the saved HTML file
        path: String,
        /// URL the page was saved from
        url: String,
    },

    /// Search stored titles
    #[command(alias = "ls", alias = "l")]
    List(ListArgs),

    /// Show one stored title in full
    #[command(alias = "s")]
    Show {
        /// Sheet id of the title
        sheet_id: i64,
        /// Print the title as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a stored title and its child rows
    #[command(alias = "rm", alias = "r")]
    Remove {
        /// Sheet id of the title
        sheet_id: i64,
    },

    /// List broadcast seasons present in the catalog
    Seasons,

    /// List reference values usable as filter ids
    Refs {
        /// Which reference dimension to list
        #[arg(value_enum)]
        kind: RefKind,
    },

    /// Browse captured planning snapshots
    Planning {
        #[command(subcommand)]
        command: PlanningCommands,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

#[derive(Subcommand)]
pub enum PlanningCommands {
    /// Board captured for one broadcast season
    Season {
        /// Season label like "automne 2024", or a packed number like 20244
        #[arg(required = true)]
        label: Vec<String>,
    },
    /// Episodes captured for one calendar day
    Day {
        /// Complete date, YYYY-MM-DD
        date: String,
    },
}

#[derive(Args)]
pub struct ListArgs {
    /// Words matched case-insensitively against names, descriptions, and
    /// alternate titles
    pub keyword: Vec<String>,

    /// Only titles released on or after this date (YYYY, YYYY-MM, or
    /// YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub released_after: Option<String>,

    /// Only titles released on or before this date
    #[arg(long, value_name = "DATE")]
    pub released_before: Option<String>,

    /// Exact broadcast season, as a label like "automne 2024" or a packed
    /// number like 20244
    #[arg(long, value_name = "SEASON")]
    pub season: Option<String>,

    /// Earliest broadcast season to keep (overrides --season)
    #[arg(long, value_name = "SEASON")]
    pub season_from: Option<String>,

    /// Latest broadcast season to keep (overrides --season)
    #[arg(long, value_name = "SEASON")]
    pub season_to: Option<String>,

    /// Filter on the adult flag instead of the configured policy
    #[arg(long, value_name = "BOOL")]
    pub adult: Option<bool>,

    /// Filter on the explicit flag instead of the configured policy
    #[arg(long, value_name = "BOOL")]
    pub explicit: Option<bool>,

    /// Keep only titles with one of these format ids (repeatable)
    #[arg(long = "format", value_name = "ID")]
    pub formats: Vec<i64>,

    /// Drop titles with one of these format ids
    #[arg(long = "exclude-format", value_name = "ID")]
    pub exclude_formats: Vec<i64>,

    /// Keep only titles with one of these target ids
    #[arg(long = "target", value_name = "ID")]
    pub targets: Vec<i64>,

    /// Drop titles with one of these target ids
    #[arg(long = "exclude-target", value_name = "ID")]
    pub exclude_targets: Vec<i64>,

    /// Keep only titles with one of these origin ids
    #[arg(long = "origin", value_name = "ID")]
    pub origins: Vec<i64>,

    /// Drop titles with one of these origin ids
    #[arg(long = "exclude-origin", value_name = "ID")]
    pub exclude_origins: Vec<i64>,

    /// Keep only titles carrying one of these category ids
    #[arg(long = "category", value_name = "ID")]
    pub categories: Vec<i64>,

    /// Drop titles carrying one of these category ids
    #[arg(long = "exclude-category", value_name = "ID")]
    pub exclude_categories: Vec<i64>,

    /// Keep only titles produced by one of these studio contact ids
    #[arg(long = "studio", value_name = "ID")]
    pub studios: Vec<i64>,

    /// Drop titles produced by one of these studio contact ids
    #[arg(long = "exclude-studio", value_name = "ID")]
    pub exclude_studios: Vec<i64>,

    /// Keep only titles distributed by one of these contact ids
    #[arg(long = "distributor", value_name = "ID")]
    pub distributors: Vec<i64>,

    /// Drop titles distributed by one of these contact ids
    #[arg(long = "exclude-distributor", value_name = "ID")]
    pub exclude_distributors: Vec<i64>,

    /// Sort key
    #[arg(long, value_enum, default_value_t = SortField::Name)]
    pub sort: SortField,

    /// Reverse the sort direction
    #[arg(long)]
    pub desc: bool,

    /// Print rows grouped by this dimension
    #[arg(long, value_enum)]
    pub group: Option<GroupField>,

    /// Page to show, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: u64,

    /// Rows per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortField {
    Name,
    SheetId,
    ReleaseDate,
    Rating,
    Votes,
    Episodes,
    Season,
}

impl From<SortField> for SortBy {
    fn from(field: SortField) -> Self {
        match field {
            SortField::Name => Self::Name,
            SortField::SheetId => Self::SheetId,
            SortField::ReleaseDate => Self::ReleaseDate,
            SortField::Rating => Self::VoteAverage,
            SortField::Votes => Self::VoteCount,
            SortField::Episodes => Self::EpisodeCount,
            SortField::Season => Self::Season,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GroupField {
    Format,
    Target,
    Origin,
    Season,
    State,
}

impl From<GroupField> for GroupBy {
    fn from(field: GroupField) -> Self {
        match field {
            GroupField::Format => Self::Format,
            GroupField::Target => Self::Target,
            GroupField::Origin => Self::Origin,
            GroupField::Season => Self::Season,
            GroupField::State => Self::DiffusionState,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RefKind {
    Formats,
    Targets,
    Origins,
    Genres,
    Themes,
    Categories,
}

pub use commands::*;
