//! Normalization of scraped source text into canonical values.
//!
//! Everything in this module is pure: no I/O, no clock, no database.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use url::Url;

/// Broadcast state of a title, mapped from the source site's wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DiffusionState {
    #[default]
    Unknown,
    Upcoming,
    InProgress,
    Paused,
    Completed,
    Stopped,
}

impl DiffusionState {
    /// Maps the exact label used on the source site. Unrecognized or empty
    /// text degrades to `Unknown` rather than failing the sheet.
    #[must_use]
    pub fn from_source_text(text: &str) -> Self {
        match text.trim() {
            "Bientôt" | "Prochainement" => Self::Upcoming,
            "En cours" => Self::InProgress,
            "En pause" => Self::Paused,
            "Terminée" | "Terminé" => Self::Completed,
            "Arrêtée" | "Arrêté" => Self::Stopped,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn as_i16(self) -> i16 {
        match self {
            Self::Unknown => 0,
            Self::Upcoming => 1,
            Self::InProgress => 2,
            Self::Paused => 3,
            Self::Completed => 4,
            Self::Stopped => 5,
        }
    }

    #[must_use]
    pub const fn from_i16(value: i16) -> Self {
        match value {
            1 => Self::Upcoming,
            2 => Self::InProgress,
            3 => Self::Paused,
            4 => Self::Completed,
            5 => Self::Stopped,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for DiffusionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unknown => "Unknown",
            Self::Upcoming => "Upcoming",
            Self::InProgress => "In progress",
            Self::Paused => "Paused",
            Self::Completed => "Completed",
            Self::Stopped => "Stopped",
        };
        f.write_str(label)
    }
}

/// Calendar date where any component may be unknown (0).
///
/// Renders as `YYYY-MM-DD` with zero padding, so the textual form orders the
/// same way the numeric form does and unknown components sort before known
/// ones. A bare year is a valid value; so is year + month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct PartialDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl PartialDate {
    #[must_use]
    pub const fn new(year: u16, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    #[must_use]
    pub const fn from_year_month(year: u16, month: u8) -> Self {
        Self {
            year,
            month,
            day: 0,
        }
    }

    /// Parses the storage form `YYYY-MM-DD`. Zero components stay zero.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.splitn(3, '-');
        let year: u16 = parts.next()?.parse().ok()?;
        let month: u8 = parts.next()?.parse().ok()?;
        let day: u8 = parts.next()?.parse().ok()?;
        if month > 12 || day > 31 {
            return None;
        }
        Some(Self { year, month, day })
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.year == 0 && self.month == 0 && self.day == 0
    }

    #[must_use]
    pub const fn is_complete(self) -> bool {
        self.year > 0 && self.month > 0 && self.day > 0
    }

    #[must_use]
    pub fn to_naive_date(self) -> Option<chrono::NaiveDate> {
        if !self.is_complete() {
            return None;
        }
        chrono::NaiveDate::from_ymd_opt(i32::from(self.year), u32::from(self.month), u32::from(self.day))
    }

    /// ISO weekday (Monday = 1 .. Sunday = 7), only for complete dates.
    #[must_use]
    pub fn weekday_number(self) -> Option<u8> {
        use chrono::Datelike;
        self.to_naive_date()
            .map(|d| d.weekday().number_from_monday() as u8)
    }
}

impl fmt::Display for PartialDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Broadcast season: a year plus a quarter (1 = winter .. 4 = autumn).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Season {
    pub year: u16,
    pub quarter: u8,
}

impl Season {
    #[must_use]
    pub const fn new(year: u16, quarter: u8) -> Option<Self> {
        if quarter >= 1 && quarter <= 4 {
            Some(Self { year, quarter })
        } else {
            None
        }
    }

    /// Packs the season into a single ordered integer: `year * 10 + quarter`.
    #[must_use]
    pub const fn number(self) -> u32 {
        self.year as u32 * 10 + self.quarter as u32
    }

    /// Inverse of [`Season::number`].
    #[must_use]
    pub const fn from_number(number: u32) -> Option<Self> {
        let quarter = (number % 10) as u8;
        let year = number / 10;
        if quarter >= 1 && quarter <= 4 && year <= u16::MAX as u32 {
            Some(Self {
                year: year as u16,
                quarter,
            })
        } else {
            None
        }
    }

    #[must_use]
    pub const fn from_month(year: u16, month: u8) -> Option<Self> {
        match quarter_for_month(month) {
            Some(quarter) => Some(Self { year, quarter }),
            None => None,
        }
    }

    #[must_use]
    pub const fn quarter_name(self) -> &'static str {
        match self.quarter {
            1 => "Hiver",
            2 => "Printemps",
            3 => "Été",
            _ => "Automne",
        }
    }

    /// Parses a source label such as `"Automne 2024"`.
    #[must_use]
    pub fn parse_label(label: &str) -> Option<Self> {
        let mut parts = label.split_whitespace();
        let name = parts.next()?.to_lowercase();
        let year: u16 = parts.next()?.parse().ok()?;
        let quarter = match name.as_str() {
            "hiver" => 1,
            "printemps" => 2,
            "été" | "ete" => 3,
            "automne" => 4,
            _ => return None,
        };
        Some(Self { year, quarter })
    }

    #[must_use]
    pub fn label(self) -> String {
        format!("{} {}", self.quarter_name(), self.year)
    }
}

/// Quarter boundaries are fixed: 1-3 winter, 4-6 spring, 7-9 summer,
/// 10-12 autumn.
#[must_use]
pub const fn quarter_for_month(month: u8) -> Option<u8> {
    if month >= 1 && month <= 12 {
        Some((month - 1) / 3 + 1)
    } else {
        None
    }
}

#[must_use]
pub fn month_from_french_name(name: &str) -> Option<u8> {
    let month = match name.trim().to_lowercase().as_str() {
        "janvier" => 1,
        "février" | "fevrier" => 2,
        "mars" => 3,
        "avril" => 4,
        "mai" => 5,
        "juin" => 6,
        "juillet" => 7,
        "août" | "aout" => 8,
        "septembre" => 9,
        "octobre" => 10,
        "novembre" => 11,
        "décembre" | "decembre" => 12,
        _ => return None,
    };
    Some(month)
}

const fn checked_date(year: u16, month: u8, day: u8) -> Option<PartialDate> {
    if month > 12 || day > 31 {
        None
    } else {
        Some(PartialDate::new(year, month, day))
    }
}

/// Date written numerically in day/month/year order (`17/10/2024`). Shorter
/// forms omit leading components (`10/2024`, `2024`).
#[must_use]
pub fn slash_date(text: &str) -> Option<PartialDate> {
    let parts: Vec<&str> = text.trim().split('/').collect();
    match parts.as_slice() {
        [day, month, year] => checked_date(
            year.parse().ok()?,
            month.parse().ok()?,
            day.parse().ok()?,
        ),
        [month, year] => checked_date(year.parse().ok()?, month.parse().ok()?, 0),
        [year] => checked_date(year.parse().ok()?, 0, 0),
        _ => None,
    }
}

/// Date written out with a French month name, `"17 octobre 2024"` or
/// `"octobre 2024"`. A bare year is accepted; ordinal days ("1er") too.
#[must_use]
pub fn french_date(text: &str) -> Option<PartialDate> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    match tokens.as_slice() {
        [day, month, year] => {
            let day = first_uint(day).and_then(|d| u8::try_from(d).ok())?;
            checked_date(year.parse().ok()?, month_from_french_name(month)?, day)
        }
        [month, year] => checked_date(year.parse().ok()?, month_from_french_name(month)?, 0),
        [year] => checked_date(year.parse().ok()?, 0, 0),
        _ => None,
    }
}

struct NumberRegex {
    uint: Regex,
    float: Regex,
}

impl NumberRegex {
    fn get() -> Option<&'static Self> {
        static INSTANCE: OnceLock<Option<NumberRegex>> = OnceLock::new();
        INSTANCE
            .get_or_init(|| {
                Some(Self {
                    uint: Regex::new(r"[0-9]+").ok()?,
                    float: Regex::new(r"[0-9]+(?:[.,][0-9]+)?").ok()?,
                })
            })
            .as_ref()
    }
}

/// First unsigned integer embedded in free text, if any.
#[must_use]
pub fn first_uint(text: &str) -> Option<u64> {
    let re = NumberRegex::get()?;
    re.uint.find(text)?.as_str().parse().ok()
}

/// First decimal number embedded in free text. Accepts both `.` and the
/// French `,` as decimal separator.
#[must_use]
pub fn first_float(text: &str) -> Option<f64> {
    let re = NumberRegex::get()?;
    re.float.find(text)?.as_str().replace(',', ".").parse().ok()
}

/// Episode length in minutes from wording like `"24 min"` or
/// `"environ 24 minutes"`. Missing or malformed text counts as 0.
#[must_use]
pub fn duration_minutes(text: &str) -> u32 {
    first_uint(text)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0)
}

/// Canonical storage form of a sheet URL: scheme and host as normalized by
/// the parser, path verbatim, query and fragment dropped.
#[must_use]
pub fn canonicalize_url(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.to_string()
}

/// Extracts the numeric sheet id from a canonical URL path. The site encodes
/// it as a path segment, either bare (`/anime/5934/...`) or prefixed to a
/// slug (`/anime/5934-friren.html`).
#[must_use]
pub fn sheet_id_from_url(url: &Url) -> Option<i64> {
    for segment in url.path_segments()? {
        let digits: &str = {
            let end = segment
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(segment.len());
            &segment[..end]
        };
        if digits.is_empty() {
            continue;
        }
        if digits.len() == segment.len() || segment.as_bytes()[digits.len()] == b'-' {
            if let Ok(id) = digits.parse::<i64>() {
                if id > 0 {
                    return Some(id);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diffusion_state_matches_source_labels() {
        assert_eq!(
            DiffusionState::from_source_text("Bientôt"),
            DiffusionState::Upcoming
        );
        assert_eq!(
            DiffusionState::from_source_text("En cours"),
            DiffusionState::InProgress
        );
        assert_eq!(
            DiffusionState::from_source_text("En pause"),
            DiffusionState::Paused
        );
        assert_eq!(
            DiffusionState::from_source_text("Terminée"),
            DiffusionState::Completed
        );
        assert_eq!(
            DiffusionState::from_source_text("Arrêtée"),
            DiffusionState::Stopped
        );
    }

    #[test]
    fn diffusion_state_degrades_to_unknown() {
        assert_eq!(
            DiffusionState::from_source_text(""),
            DiffusionState::Unknown
        );
        assert_eq!(
            DiffusionState::from_source_text("quelque chose"),
            DiffusionState::Unknown
        );
        assert_eq!(
            DiffusionState::from_source_text("  En cours  "),
            DiffusionState::InProgress
        );
    }

    #[test]
    fn diffusion_state_roundtrips_through_i16() {
        for state in [
            DiffusionState::Unknown,
            DiffusionState::Upcoming,
            DiffusionState::InProgress,
            DiffusionState::Paused,
            DiffusionState::Completed,
            DiffusionState::Stopped,
        ] {
            assert_eq!(DiffusionState::from_i16(state.as_i16()), state);
        }
    }

    #[test]
    fn partial_date_renders_with_zero_padding() {
        assert_eq!(PartialDate::new(2024, 10, 3).to_string(), "2024-10-03");
        assert_eq!(PartialDate::from_year_month(2024, 4).to_string(), "2024-04-00");
        assert_eq!(PartialDate::default().to_string(), "0000-00-00");
    }

    #[test]
    fn partial_date_parses_its_own_rendering() {
        for date in [
            PartialDate::new(2024, 10, 3),
            PartialDate::from_year_month(1998, 1),
            PartialDate::new(2024, 0, 0),
            PartialDate::default(),
        ] {
            assert_eq!(PartialDate::parse(&date.to_string()), Some(date));
        }
        assert_eq!(PartialDate::parse("not-a-date"), None);
        assert_eq!(PartialDate::parse("2024-13-01"), None);
    }

    #[test]
    fn partial_date_orders_textually_and_numerically_alike() {
        let a = PartialDate::new(2024, 0, 0);
        let b = PartialDate::new(2024, 4, 0);
        let c = PartialDate::new(2024, 4, 12);
        assert!(a < b && b < c);
        assert!(a.to_string() < b.to_string() && b.to_string() < c.to_string());
    }

    #[test]
    fn weekday_only_for_complete_dates() {
        // 2024-10-17 is a Thursday.
        assert_eq!(PartialDate::new(2024, 10, 17).weekday_number(), Some(4));
        assert_eq!(PartialDate::from_year_month(2024, 10).weekday_number(), None);
    }

    #[test]
    fn season_number_roundtrips() {
        let season = Season::new(2024, 4).unwrap();
        assert_eq!(season.number(), 20244);
        assert_eq!(Season::from_number(20244), Some(season));
        assert_eq!(Season::from_number(20245), None);
        assert_eq!(Season::from_number(0), None);
    }

    #[test]
    fn season_from_month_uses_quarter_boundaries() {
        assert_eq!(Season::from_month(2024, 1).unwrap().quarter, 1);
        assert_eq!(Season::from_month(2024, 3).unwrap().quarter, 1);
        assert_eq!(Season::from_month(2024, 4).unwrap().quarter, 2);
        assert_eq!(Season::from_month(2024, 9).unwrap().quarter, 3);
        assert_eq!(Season::from_month(2024, 12).unwrap().quarter, 4);
        assert_eq!(Season::from_month(2024, 0), None);
        assert_eq!(Season::from_month(2024, 13), None);
    }

    #[test]
    fn season_labels_parse_and_render() {
        let season = Season::parse_label("Automne 2024").unwrap();
        assert_eq!(season, Season::new(2024, 4).unwrap());
        assert_eq!(season.label(), "Automne 2024");

        assert_eq!(
            Season::parse_label("été 2023"),
            Some(Season::new(2023, 3).unwrap())
        );
        assert_eq!(Season::parse_label("Monsoon 2024"), None);
        assert_eq!(Season::parse_label("Automne"), None);
    }

    #[test]
    fn french_months_accept_both_spellings() {
        assert_eq!(month_from_french_name("janvier"), Some(1));
        assert_eq!(month_from_french_name("Février"), Some(2));
        assert_eq!(month_from_french_name("fevrier"), Some(2));
        assert_eq!(month_from_french_name("Août"), Some(8));
        assert_eq!(month_from_french_name("aout"), Some(8));
        assert_eq!(month_from_french_name("décembre"), Some(12));
        assert_eq!(month_from_french_name("smarch"), None);
    }

    #[test]
    fn slash_dates_read_day_month_year() {
        assert_eq!(slash_date("17/10/2024"), Some(PartialDate::new(2024, 10, 17)));
        assert_eq!(slash_date("10/2024"), Some(PartialDate::from_year_month(2024, 10)));
        assert_eq!(slash_date("2024"), Some(PartialDate::new(2024, 0, 0)));
        assert_eq!(slash_date("17/13/2024"), None);
        assert_eq!(slash_date("bientôt"), None);
    }

    #[test]
    fn french_dates_accept_month_names_and_ordinals() {
        assert_eq!(
            french_date("17 octobre 2024"),
            Some(PartialDate::new(2024, 10, 17))
        );
        assert_eq!(
            french_date("1er avril 2023"),
            Some(PartialDate::new(2023, 4, 1))
        );
        assert_eq!(
            french_date("Octobre 2024"),
            Some(PartialDate::from_year_month(2024, 10))
        );
        assert_eq!(french_date("2024"), Some(PartialDate::new(2024, 0, 0)));
        assert_eq!(french_date("un jour"), None);
    }

    #[test]
    fn duration_takes_first_integer() {
        assert_eq!(duration_minutes("24 min"), 24);
        assert_eq!(duration_minutes("environ 23 minutes"), 23);
        assert_eq!(duration_minutes("une demi-heure"), 0);
        assert_eq!(duration_minutes(""), 0);
    }

    #[test]
    fn floats_accept_french_decimal_comma() {
        assert_eq!(first_float("8.54 / 10"), Some(8.54));
        assert_eq!(first_float("8,54 / 10"), Some(8.54));
        assert_eq!(first_float("123 votes"), Some(123.0));
        assert_eq!(first_float("aucun"), None);
    }

    #[test]
    fn canonical_url_drops_query_and_fragment() {
        let url = Url::parse("https://Example.com/anime/5934-friren.html?tab=eps#staff").unwrap();
        assert_eq!(
            canonicalize_url(&url),
            "https://example.com/anime/5934-friren.html"
        );
    }

    #[test]
    fn sheet_id_reads_bare_and_slugged_segments() {
        let slugged = Url::parse("https://example.com/anime/5934-friren.html").unwrap();
        assert_eq!(sheet_id_from_url(&slugged), Some(5934));

        let bare = Url::parse("https://example.com/anime/5934/friren.html").unwrap();
        assert_eq!(sheet_id_from_url(&bare), Some(5934));

        let none = Url::parse("https://example.com/anime/friren.html").unwrap();
        assert_eq!(sheet_id_from_url(&none), None);
    }
}
