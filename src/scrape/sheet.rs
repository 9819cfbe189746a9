//! Reads one sheet page into a typed record.
//!
//! Only two things are mandatory: the display name on the page and the sheet
//! id carried by the URL. Every other field degrades to a default when its
//! node is missing or malformed, and a bad child entry (episode, staff line,
//! license) is skipped rather than failing the sheet.

use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::models::title::{
    AlternateTitleRecord, DistributorRecord, EpisodeRecord, ExternalLinkRecord, StaffRecord,
    TitleRecord,
};
use crate::normalize::{self, DiffusionState, Season};

/// Why a sheet could not be turned into a record at all. Child-item problems
/// never reach this level.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("missing mandatory field: {0}")]
    MissingField(&'static str),

    #[error("sheet URL carries no usable id: {0}")]
    MalformedUrl(String),

    #[error("selector table failed to compile")]
    SelectorTable,
}

/// Consolidates compiled selectors to avoid per-call overhead.
struct SheetSelectors {
    name: Selector,
    description: Selector,
    thumbnail: Selector,
    rating_value: Selector,
    rating_count: Selector,
    info_row: Selector,
    info_label: Selector,
    info_value: Selector,
    alternate: Selector,
    genre: Selector,
    theme: Selector,
    staff_item: Selector,
    staff_role: Selector,
    contact: Selector,
    studio: Selector,
    license_item: Selector,
    license_type: Selector,
    episode_item: Selector,
    episode_number: Selector,
    episode_date: Selector,
    episode_name: Selector,
    link: Selector,
    remark: Selector,
    marker_adult: Selector,
    marker_explicit: Selector,
}

impl SheetSelectors {
    fn get() -> Option<&'static Self> {
        static INSTANCE: OnceLock<Option<SheetSelectors>> = OnceLock::new();
        INSTANCE
            .get_or_init(|| {
                Some(Self {
                    name: Selector::parse("#sheet > h1").ok()?,
                    description: Selector::parse("#description").ok()?,
                    thumbnail: Selector::parse("#sheet img.thumbnail").ok()?,
                    rating_value: Selector::parse("#rating .rating-value").ok()?,
                    rating_count: Selector::parse("#rating .rating-count").ok()?,
                    info_row: Selector::parse("#information table tr").ok()?,
                    info_label: Selector::parse("th").ok()?,
                    info_value: Selector::parse("td").ok()?,
                    alternate: Selector::parse("#titles li").ok()?,
                    genre: Selector::parse("#categories a.genre").ok()?,
                    theme: Selector::parse("#categories a.theme").ok()?,
                    staff_item: Selector::parse("#staff li").ok()?,
                    staff_role: Selector::parse("span.role").ok()?,
                    contact: Selector::parse("a.contact").ok()?,
                    studio: Selector::parse("#studios a.studio").ok()?,
                    license_item: Selector::parse("#licenses li").ok()?,
                    license_type: Selector::parse("span.license-type").ok()?,
                    episode_item: Selector::parse("#episodes li").ok()?,
                    episode_number: Selector::parse("span.number").ok()?,
                    episode_date: Selector::parse("span.date").ok()?,
                    episode_name: Selector::parse("span.name").ok()?,
                    link: Selector::parse("#links a.external").ok()?,
                    remark: Selector::parse("#remark").ok()?,
                    marker_adult: Selector::parse("#sheet .marker-adult").ok()?,
                    marker_explicit: Selector::parse("#sheet .marker-explicit").ok()?,
                })
            })
            .as_ref()
    }
}

/// Inner text with whitespace collapsed, the way browsers render it.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn select_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

fn select_attr(document: &Html, selector: &Selector, attr: &str) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|element| element.value().attr(attr))
        .map(str::to_string)
        .filter(|value| !value.is_empty())
}

/// Site section from the first URL path segment (`/animes/5934-x.html` →
/// `animes`). A sheet served without one keeps an empty section.
fn section_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next())
        .filter(|segment| {
            !segment.is_empty() && !segment.starts_with(|c: char| c.is_ascii_digit())
        })
        .map(str::to_lowercase)
        .unwrap_or_default()
}

fn collect_names(document: &Html, selector: &Selector) -> Vec<String> {
    document
        .select(selector)
        .map(element_text)
        .filter(|name| !name.is_empty())
        .collect()
}

/// Field-by-field reader for one sheet page. Stateless; the policy decision
/// of whether an adult or explicit sheet may be kept belongs to the caller.
pub struct SheetExtractor;

impl SheetExtractor {
    pub fn extract(document: &Html, sheet_url: &Url) -> Result<TitleRecord, ExtractError> {
        let sel = SheetSelectors::get().ok_or(ExtractError::SelectorTable)?;

        let sheet_id = normalize::sheet_id_from_url(sheet_url)
            .ok_or_else(|| ExtractError::MalformedUrl(sheet_url.to_string()))?;
        let name = select_text(document, &sel.name).ok_or(ExtractError::MissingField("name"))?;

        let mut record = TitleRecord {
            sheet_id,
            url: normalize::canonicalize_url(sheet_url),
            name,
            section: section_from_url(sheet_url),
            ..TitleRecord::default()
        };

        record.description = select_text(document, &sel.description);
        record.thumbnail_url = select_attr(document, &sel.thumbnail, "src")
            .and_then(|src| sheet_url.join(&src).ok())
            .map(|url| url.to_string());
        record.vote_average = select_text(document, &sel.rating_value)
            .and_then(|text| normalize::first_float(&text))
            .unwrap_or(0.0);
        record.vote_count = select_text(document, &sel.rating_count)
            .and_then(|text| normalize::first_uint(&text))
            .and_then(|count| i32::try_from(count).ok())
            .unwrap_or(0);
        record.remark = select_text(document, &sel.remark);
        record.is_adult = document.select(&sel.marker_adult).next().is_some();
        record.is_explicit = document.select(&sel.marker_explicit).next().is_some();

        Self::apply_information(document, sel, &mut record);
        if record.season.is_none() {
            record.season = record
                .release_date
                .filter(|date| date.year > 0 && date.month > 0)
                .and_then(|date| Season::from_month(date.year, date.month));
        }

        record.alternate_titles = Self::alternate_titles(document, sel);
        record.external_links = Self::external_links(document, sel, sheet_url);
        record.genres = collect_names(document, &sel.genre);
        record.themes = collect_names(document, &sel.theme);
        record.studios = collect_names(document, &sel.studio);
        record.distributors = Self::distributors(document, sel);
        record.staff = Self::staff(document, sel);
        record.episodes = Self::episodes(document, sel);

        Ok(record)
    }

    /// The `#information` table is label/value rows. Unknown labels are
    /// ignored so a new site field cannot break extraction.
    fn apply_information(document: &Html, sel: &SheetSelectors, record: &mut TitleRecord) {
        for row in document.select(&sel.info_row) {
            let Some(label) = row.select(&sel.info_label).next().map(element_text) else {
                continue;
            };
            let Some(value) = row
                .select(&sel.info_value)
                .next()
                .map(element_text)
                .filter(|value| !value.is_empty())
            else {
                continue;
            };
            match label.trim_end_matches(':').trim() {
                "Format" => record.format = Some(value),
                "Origine" => record.origin = Some(value),
                "Public visé" => record.target = Some(value),
                "Saison" => record.season = Season::parse_label(&value),
                "Diffusion" => {
                    record.diffusion_state = DiffusionState::from_source_text(&value);
                }
                // The site mixes straight and typographic apostrophes.
                "Nombre d'épisodes" | "Nombre d\u{2019}épisodes" => {
                    record.episode_count = normalize::first_uint(&value)
                        .and_then(|count| i32::try_from(count).ok())
                        .unwrap_or(0);
                }
                "Durée d'un épisode" | "Durée d\u{2019}un épisode" => {
                    record.episode_duration = normalize::duration_minutes(&value);
                }
                "Début de diffusion" => record.release_date = normalize::french_date(&value),
                "Fin de diffusion" => record.end_date = normalize::french_date(&value),
                _ => {}
            }
        }
    }

    /// `#titles` entries read "Label : Name"; an entry without the separator
    /// is a bare name.
    fn alternate_titles(document: &Html, sel: &SheetSelectors) -> Vec<AlternateTitleRecord> {
        let mut titles = Vec::new();
        for item in document.select(&sel.alternate) {
            let text = element_text(item);
            let (label, name) = match text.split_once(" : ") {
                Some((label, name)) => (Some(label.trim().to_string()), name.trim().to_string()),
                None => (None, text),
            };
            if name.is_empty() {
                warn!("skipping alternate title without a name");
                continue;
            }
            titles.push(AlternateTitleRecord {
                name,
                label: label.filter(|label| !label.is_empty()),
            });
        }
        titles
    }

    fn external_links(
        document: &Html,
        sel: &SheetSelectors,
        sheet_url: &Url,
    ) -> Vec<ExternalLinkRecord> {
        let mut links = Vec::new();
        for anchor in document.select(&sel.link) {
            let Some(href) = anchor.value().attr("href") else {
                warn!("skipping external link without an href");
                continue;
            };
            let Ok(url) = sheet_url.join(href) else {
                warn!("skipping unparseable external link: {href}");
                continue;
            };
            let label = element_text(anchor);
            links.push(ExternalLinkRecord {
                url: url.to_string(),
                label: (!label.is_empty()).then_some(label),
            });
        }
        links
    }

    fn distributors(document: &Html, sel: &SheetSelectors) -> Vec<DistributorRecord> {
        let mut distributors = Vec::new();
        for item in document.select(&sel.license_item) {
            let Some(name) = item
                .select(&sel.contact)
                .next()
                .map(element_text)
                .filter(|name| !name.is_empty())
            else {
                warn!("skipping license entry without a contact");
                continue;
            };
            let license_type = item
                .select(&sel.license_type)
                .next()
                .map(element_text)
                .filter(|kind| !kind.is_empty());
            distributors.push(DistributorRecord { name, license_type });
        }
        distributors
    }

    fn staff(document: &Html, sel: &SheetSelectors) -> Vec<StaffRecord> {
        let mut staff = Vec::new();
        for item in document.select(&sel.staff_item) {
            let Some(name) = item
                .select(&sel.contact)
                .next()
                .map(element_text)
                .filter(|name| !name.is_empty())
            else {
                warn!("skipping staff entry without a contact");
                continue;
            };
            let Some(role) = item
                .select(&sel.staff_role)
                .next()
                .map(element_text)
                .filter(|role| !role.is_empty())
            else {
                warn!("skipping staff entry without a role: {name}");
                continue;
            };
            staff.push(StaffRecord { name, role });
        }
        staff
    }

    fn episodes(document: &Html, sel: &SheetSelectors) -> Vec<EpisodeRecord> {
        let mut episodes = Vec::new();
        for item in document.select(&sel.episode_item) {
            let Some(number) = item
                .select(&sel.episode_number)
                .next()
                .map(element_text)
                .and_then(|text| normalize::first_uint(&text))
                .and_then(|number| i32::try_from(number).ok())
            else {
                warn!("skipping episode without a number");
                continue;
            };
            let release_date = item
                .select(&sel.episode_date)
                .next()
                .map(element_text)
                .and_then(|text| normalize::slash_date(&text));
            let name = item
                .select(&sel.episode_name)
                .next()
                .map(element_text)
                .filter(|name| !name.is_empty());
            episodes.push(EpisodeRecord {
                number,
                name,
                release_date,
            });
        }
        episodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::PartialDate;

    const FULL_SHEET: &str = r##"
<html><body>
<div id="sheet">
  <h1>Exemple de Série</h1>
  <img class="thumbnail" src="/images/5934.jpg">
  <span class="marker-adult"></span>
</div>
<div id="rating">
  <span class="rating-value">8,54 / 10</span>
  <span class="rating-count">123 votes</span>
</div>
<div id="description"><p>Une aventure
  en deux   actes.</p></div>
<div id="information">
  <table>
    <tr><th>Format</th><td>Série TV</td></tr>
    <tr><th>Origine</th><td>Manga</td></tr>
    <tr><th>Public visé</th><td>Shōnen</td></tr>
    <tr><th>Saison</th><td>Automne 2024</td></tr>
    <tr><th>Diffusion</th><td>En cours</td></tr>
    <tr><th>Nombre d'épisodes</th><td>12</td></tr>
    <tr><th>Durée d'un épisode</th><td>24 min</td></tr>
    <tr><th>Début de diffusion</th><td>Octobre 2024</td></tr>
    <tr><th>Fin de diffusion</th><td></td></tr>
    <tr><th>Champ inconnu</th><td>ignoré</td></tr>
  </table>
</div>
<ul id="titles">
  <li>Japonais : Reizoku no Shō</li>
  <li>Titre court</li>
</ul>
<div id="categories">
  <a class="genre" href="#">Action</a>
  <a class="genre" href="#">Comédie</a>
  <a class="theme" href="#">Voyage</a>
</div>
<ul id="staff">
  <li><span class="role">Réalisateur</span> <a class="contact" href="#">A. Tanaka</a></li>
  <li><a class="contact" href="#">Sans Rôle</a></li>
</ul>
<div id="studios">
  <a class="studio" href="#">Studio Exemple</a>
</div>
<ul id="licenses">
  <li><a class="contact" href="#">Éditeur FR</a> <span class="license-type">Simulcast</span></li>
</ul>
<ul id="episodes">
  <li><span class="number">Épisode 1</span> <span class="date">03/10/2024</span> <span class="name">Départ</span></li>
  <li><span class="number">Épisode 2</span> <span class="date">10/10/2024</span></li>
  <li><span class="date">17/10/2024</span> <span class="name">Sans numéro</span></li>
</ul>
<ul id="links">
  <li><a class="external" href="https://example.org/fiche">Site officiel</a></li>
</ul>
<div id="remark">Adaptation fidèle.</div>
</body></html>
"##;

    fn sheet_url() -> Url {
        Url::parse("https://catalog.example/animes/5934-exemple.html?tab=1#top").unwrap()
    }

    fn extract_full() -> TitleRecord {
        let document = Html::parse_document(FULL_SHEET);
        SheetExtractor::extract(&document, &sheet_url()).unwrap()
    }

    #[test]
    fn full_sheet_extracts_scalars() {
        let record = extract_full();
        assert_eq!(record.sheet_id, 5934);
        assert_eq!(record.url, "https://catalog.example/animes/5934-exemple.html");
        assert_eq!(record.name, "Exemple de Série");
        assert_eq!(record.section, "animes");
        assert_eq!(
            record.description.as_deref(),
            Some("Une aventure en deux actes.")
        );
        assert_eq!(
            record.thumbnail_url.as_deref(),
            Some("https://catalog.example/images/5934.jpg")
        );
        assert!((record.vote_average - 8.54).abs() < 1e-9);
        assert_eq!(record.vote_count, 123);
        assert_eq!(record.remark.as_deref(), Some("Adaptation fidèle."));
        assert!(record.is_adult);
        assert!(!record.is_explicit);
    }

    #[test]
    fn information_rows_fill_references_and_dates() {
        let record = extract_full();
        assert_eq!(record.format.as_deref(), Some("Série TV"));
        assert_eq!(record.origin.as_deref(), Some("Manga"));
        assert_eq!(record.target.as_deref(), Some("Shōnen"));
        assert_eq!(record.season.map(Season::number), Some(20244));
        assert_eq!(record.diffusion_state, DiffusionState::InProgress);
        assert_eq!(record.episode_count, 12);
        assert_eq!(record.episode_duration, 24);
        assert_eq!(record.release_date, Some(PartialDate::from_year_month(2024, 10)));
        assert_eq!(record.end_date, None);
    }

    #[test]
    fn child_collections_are_item_by_item() {
        let record = extract_full();

        assert_eq!(record.alternate_titles.len(), 2);
        assert_eq!(record.alternate_titles[0].name, "Reizoku no Shō");
        assert_eq!(record.alternate_titles[0].label.as_deref(), Some("Japonais"));
        assert_eq!(record.alternate_titles[1].name, "Titre court");
        assert_eq!(record.alternate_titles[1].label, None);

        assert_eq!(record.genres, vec!["Action", "Comédie"]);
        assert_eq!(record.themes, vec!["Voyage"]);
        assert_eq!(record.studios, vec!["Studio Exemple"]);

        assert_eq!(record.staff.len(), 1);
        assert_eq!(record.staff[0].name, "A. Tanaka");
        assert_eq!(record.staff[0].role, "Réalisateur");

        assert_eq!(record.distributors.len(), 1);
        assert_eq!(record.distributors[0].name, "Éditeur FR");
        assert_eq!(record.distributors[0].license_type.as_deref(), Some("Simulcast"));

        assert_eq!(record.external_links.len(), 1);
        assert_eq!(record.external_links[0].url, "https://example.org/fiche");
        assert_eq!(
            record.external_links[0].label.as_deref(),
            Some("Site officiel")
        );
    }

    #[test]
    fn episodes_skip_entries_without_a_number() {
        let record = extract_full();
        assert_eq!(record.episodes.len(), 2);
        assert_eq!(record.episodes[0].number, 1);
        assert_eq!(record.episodes[0].name.as_deref(), Some("Départ"));
        assert_eq!(
            record.episodes[0].release_date,
            Some(PartialDate::new(2024, 10, 3))
        );
        assert_eq!(record.episodes[1].number, 2);
        assert_eq!(record.episodes[1].name, None);
    }

    #[test]
    fn name_is_mandatory() {
        let document = Html::parse_document("<html><body><div id='sheet'></div></body></html>");
        let err = SheetExtractor::extract(&document, &sheet_url()).unwrap_err();
        assert!(matches!(err, ExtractError::MissingField("name")));
    }

    #[test]
    fn url_without_sheet_id_is_refused() {
        let document = Html::parse_document(FULL_SHEET);
        let url = Url::parse("https://catalog.example/animes/exemple.html").unwrap();
        let err = SheetExtractor::extract(&document, &url).unwrap_err();
        assert!(matches!(err, ExtractError::MalformedUrl(_)));
    }

    #[test]
    fn season_falls_back_to_release_quarter() {
        let html = r"
<html><body>
<div id='sheet'><h1>Sans Saison</h1></div>
<div id='information'><table>
  <tr><th>Début de diffusion</th><td>Avril 2023</td></tr>
</table></div>
</body></html>";
        let document = Html::parse_document(html);
        let record = SheetExtractor::extract(&document, &sheet_url()).unwrap();
        assert_eq!(record.season.map(Season::number), Some(20232));
    }

    #[test]
    fn bare_sheet_degrades_to_defaults() {
        let document =
            Html::parse_document("<html><body><div id='sheet'><h1>Nu</h1></div></body></html>");
        let record = SheetExtractor::extract(&document, &sheet_url()).unwrap();
        assert_eq!(record.name, "Nu");
        assert_eq!(record.vote_count, 0);
        assert_eq!(record.diffusion_state, DiffusionState::Unknown);
        assert_eq!(record.episode_count, 0);
        assert_eq!(record.release_date, None);
        assert_eq!(record.season, None);
        assert!(record.alternate_titles.is_empty());
        assert!(record.episodes.is_empty());
        assert!(!record.is_adult);
    }
}
