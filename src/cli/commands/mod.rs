mod ingest;
mod list;
mod planning;
mod refs;
mod remove;
mod seasons;
mod show;

pub use ingest::{cmd_ingest, cmd_ingest_file};
pub use list::cmd_list;
pub use planning::{cmd_planning_day, cmd_planning_season};
pub use refs::cmd_refs;
pub use remove::cmd_remove;
pub use seasons::cmd_seasons;
pub use show::cmd_show;

use crate::normalize::{PartialDate, Season};

/// Date forms accepted on the command line: `YYYY`, `YYYY-MM`, `YYYY-MM-DD`.
/// Omitted components stay unknown.
fn parse_date_arg(text: &str) -> Option<PartialDate> {
    let mut parts = text.trim().splitn(3, '-');
    let year: u16 = parts.next()?.parse().ok()?;
    let month: u8 = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    let day: u8 = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    if month > 12 || day > 31 {
        return None;
    }
    Some(PartialDate::new(year, month, day))
}

/// A season argument is either a label (`"automne 2024"`) or a packed number
/// (`20244`).
fn parse_season_arg(text: &str) -> Option<Season> {
    text.trim()
        .parse::<u32>()
        .ok()
        .and_then(Season::from_number)
        .or_else(|| Season::parse_label(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_args_accept_partial_forms() {
        assert_eq!(parse_date_arg("2024"), Some(PartialDate::new(2024, 0, 0)));
        assert_eq!(
            parse_date_arg("2024-10"),
            Some(PartialDate::new(2024, 10, 0))
        );
        assert_eq!(
            parse_date_arg("2024-10-17"),
            Some(PartialDate::new(2024, 10, 17))
        );
        assert_eq!(parse_date_arg("2024-13"), None);
        assert_eq!(parse_date_arg("octobre"), None);
    }

    #[test]
    fn season_args_accept_labels_and_numbers() {
        assert_eq!(
            parse_season_arg("automne 2024").map(|s| s.number()),
            Some(20244)
        );
        assert_eq!(parse_season_arg("20244").map(|s| s.number()), Some(20244));
        assert_eq!(parse_season_arg("20245"), None);
        assert_eq!(parse_season_arg("bientôt"), None);
    }
}
