//! Store tests: upsert identity, child replacement, and planning snapshots,
//! each against a throwaway on-disk database.

use anisheet::db::{Store, StoreError};
use anisheet::models::filter::{ContentPolicy, TitleFilter};
use anisheet::models::title::{
    AlternateTitleRecord, CategoryKind, DistributorRecord, EpisodeRecord, StaffRecord, TitleRecord,
};
use anisheet::normalize::{DiffusionState, PartialDate, Season};
use tokio_util::sync::CancellationToken;

async fn test_store() -> Store {
    let db_path =
        std::env::temp_dir().join(format!("anisheet-store-test-{}.db", uuid::Uuid::new_v4()));
    Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("failed to open test store")
}

fn sheet_record(sheet_id: i64, name: &str) -> TitleRecord {
    TitleRecord {
        sheet_id,
        url: format!("https://catalog.example/animes/{sheet_id}-fiche.html"),
        name: name.to_string(),
        section: "animes".to_string(),
        vote_average: 7.5,
        vote_count: 42,
        diffusion_state: DiffusionState::InProgress,
        episode_count: 12,
        episode_duration: 24,
        release_date: Some(PartialDate::new(2024, 10, 3)),
        format: Some("Série TV".to_string()),
        target: Some("Shōnen".to_string()),
        origin: Some("Manga".to_string()),
        season: Season::new(2024, 4),
        alternate_titles: vec![AlternateTitleRecord {
            name: format!("{name} (US)"),
            label: Some("Anglais".to_string()),
        }],
        genres: vec!["Action".to_string(), "Comédie".to_string()],
        themes: vec!["Voyage".to_string()],
        studios: vec!["Studio Exemple".to_string()],
        distributors: vec![DistributorRecord {
            name: "Éditeur FR".to_string(),
            license_type: Some("Simulcast".to_string()),
        }],
        staff: vec![StaffRecord {
            name: "A. Tanaka".to_string(),
            role: "Réalisateur".to_string(),
        }],
        episodes: vec![
            EpisodeRecord {
                number: 1,
                name: Some("Départ".to_string()),
                release_date: Some(PartialDate::new(2024, 10, 3)),
            },
            EpisodeRecord {
                number: 2,
                name: None,
                release_date: Some(PartialDate::new(2024, 10, 10)),
            },
        ],
        ..Default::default()
    }
}

#[tokio::test]
async fn upsert_creates_then_refreshes() {
    let store = test_store().await;
    let cancel = CancellationToken::new();
    let record = sheet_record(5934, "Exemple de Série");

    let first = store
        .upsert_title(&record, &cancel)
        .await
        .expect("first upsert");
    assert!(first.created);

    let mut refreshed = record.clone();
    refreshed.vote_count = 64;
    let second = store
        .upsert_title(&refreshed, &cancel)
        .await
        .expect("second upsert");
    assert!(!second.created);
    assert_eq!(second.id, first.id);

    let stored = store
        .find_title_by_sheet_id(5934)
        .await
        .expect("lookup")
        .expect("stored title");
    assert_eq!(stored.vote_count, 64);
    assert_eq!(stored.format.as_ref().map(|f| f.name.as_str()), Some("Série TV"));
    assert_eq!(stored.season.as_ref().map(|s| s.number), Some(20244));
    assert_eq!(stored.genres.len(), 2);
    assert_eq!(stored.themes.len(), 1);
    assert_eq!(stored.studios.len(), 1);
    assert_eq!(stored.distributors.len(), 1);
    assert_eq!(stored.staff.len(), 1);
    assert_eq!(stored.episodes.len(), 2);
    assert_eq!(stored.episodes[0].release_date.as_deref(), Some("2024-10-03"));
    assert_eq!(stored.episodes[0].weekday, Some(4));
}

#[tokio::test]
async fn dropped_children_disappear_but_references_survive() {
    let store = test_store().await;
    let cancel = CancellationToken::new();
    let record = sheet_record(10, "Première");
    store.upsert_title(&record, &cancel).await.expect("seed");

    let mut trimmed = record.clone();
    trimmed.genres = vec!["Action".to_string()];
    trimmed.episodes.truncate(1);
    store.upsert_title(&trimmed, &cancel).await.expect("refresh");

    let stored = store
        .find_title_by_sheet_id(10)
        .await
        .expect("lookup")
        .expect("stored title");
    assert_eq!(stored.genres.len(), 1);
    assert_eq!(stored.genres[0].name, "Action");
    assert_eq!(stored.episodes.len(), 1);

    // The dropped link is gone, but the shared category row stays listed.
    let genres = store
        .list_categories(Some(CategoryKind::Genre))
        .await
        .expect("genres");
    assert!(genres.iter().any(|g| g.name == "Comédie"));
}

#[tokio::test]
async fn references_resolve_case_insensitively() {
    let store = test_store().await;
    let cancel = CancellationToken::new();

    let mut first = sheet_record(1, "Un");
    first.genres = vec!["Action".to_string()];
    first.studios = vec!["MAPPA".to_string()];
    let mut second = sheet_record(2, "Deux");
    second.genres = vec!["ACTION".to_string()];
    second.studios = vec!["mappa".to_string()];

    store.upsert_title(&first, &cancel).await.expect("first");
    store.upsert_title(&second, &cancel).await.expect("second");

    let genres = store
        .list_categories(Some(CategoryKind::Genre))
        .await
        .expect("genres");
    let action: Vec<_> = genres
        .iter()
        .filter(|g| g.name.eq_ignore_ascii_case("action"))
        .collect();
    assert_eq!(action.len(), 1);
    // The first spelling seen is the one kept.
    assert_eq!(action[0].name, "Action");

    let one = store
        .find_title_by_sheet_id(1)
        .await
        .expect("lookup")
        .expect("first title");
    let two = store
        .find_title_by_sheet_id(2)
        .await
        .expect("lookup")
        .expect("second title");
    assert_eq!(one.studios[0].id, two.studios[0].id);
}

#[tokio::test]
async fn crossed_natural_keys_are_refused() {
    let store = test_store().await;
    let cancel = CancellationToken::new();
    let first = sheet_record(1, "Premier");
    let second = sheet_record(2, "Second");
    store.upsert_title(&first, &cancel).await.expect("first");
    store.upsert_title(&second, &cancel).await.expect("second");

    // Sheet id of the first row, URL of the second.
    let mut crossed = sheet_record(1, "Croisé");
    crossed.url = second.url.clone();
    let err = store.upsert_title(&crossed, &cancel).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));

    // Neither row moved.
    let one = store
        .find_title_by_sheet_id(1)
        .await
        .expect("lookup")
        .expect("first title");
    assert_eq!(one.name, "Premier");
    assert_eq!(one.url, first.url);
    let two = store
        .find_title_by_url(&second.url)
        .await
        .expect("lookup")
        .expect("second title");
    assert_eq!(two.name, "Second");
}

#[tokio::test]
async fn explicit_id_against_another_row_is_refused() {
    let store = test_store().await;
    let cancel = CancellationToken::new();
    let record = sheet_record(7, "Ancré");
    let outcome = store.upsert_title(&record, &cancel).await.expect("seed");

    let mut repointed = record.clone();
    repointed.id = Some(outcome.id + 100);
    let err = store.upsert_title(&repointed, &cancel).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));

    let mut anchored = record;
    anchored.id = Some(outcome.id);
    let again = store
        .upsert_title(&anchored, &cancel)
        .await
        .expect("matching id refreshes");
    assert_eq!(again.id, outcome.id);
    assert!(!again.created);
}

#[tokio::test]
async fn explicit_id_seeds_new_rows() {
    let store = test_store().await;
    let cancel = CancellationToken::new();
    let mut record = sheet_record(3, "Importé");
    record.id = Some(777);

    let outcome = store.upsert_title(&record, &cancel).await.expect("insert");
    assert!(outcome.created);
    assert_eq!(outcome.id, 777);
}

#[tokio::test]
async fn invalid_records_write_nothing() {
    let store = test_store().await;
    let cancel = CancellationToken::new();

    let mut blank = sheet_record(4, "X");
    blank.name = "   ".to_string();
    assert!(matches!(
        store.upsert_title(&blank, &cancel).await,
        Err(StoreError::Validation(_))
    ));

    let mut relative = sheet_record(4, "Relative");
    relative.url = "/animes/4-relative.html".to_string();
    assert!(matches!(
        store.upsert_title(&relative, &cancel).await,
        Err(StoreError::Validation(_))
    ));

    assert!(store
        .find_title_by_sheet_id(4)
        .await
        .expect("lookup")
        .is_none());
}

#[tokio::test]
async fn cancelled_upsert_leaves_no_row() {
    let store = test_store().await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = store
        .upsert_title(&sheet_record(9, "Interrompu"), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Cancelled));
    assert!(store
        .find_title_by_sheet_id(9)
        .await
        .expect("lookup")
        .is_none());
}

#[tokio::test]
async fn delete_removes_the_aggregate_only() {
    let store = test_store().await;
    let cancel = CancellationToken::new();
    store
        .upsert_title(&sheet_record(11, "Éphémère"), &cancel)
        .await
        .expect("seed");

    assert!(store.delete_title(11).await.expect("delete"));
    assert!(store
        .find_title_by_sheet_id(11)
        .await
        .expect("lookup")
        .is_none());
    assert!(!store.delete_title(11).await.expect("second delete"));

    // Reference rows outlive the titles that created them.
    let formats = store.list_formats().await.expect("formats");
    assert!(formats.iter().any(|f| f.name == "Série TV"));
}

#[tokio::test]
async fn concurrent_upserts_of_one_sheet_serialize() {
    let store = test_store().await;
    let cancel = CancellationToken::new();
    let mut left = sheet_record(21, "Parallèle");
    left.vote_count = 1;
    let mut right = sheet_record(21, "Parallèle");
    right.vote_count = 2;

    let (first, second) = tokio::join!(
        store.upsert_title(&left, &cancel),
        store.upsert_title(&right, &cancel),
    );
    let first = first.expect("left upsert");
    let second = second.expect("right upsert");

    assert_eq!(first.id, second.id);
    assert_ne!(first.created, second.created);

    let ids = store
        .matching_title_ids(&TitleFilter::default(), &ContentPolicy::permissive())
        .await
        .expect("ids");
    assert_eq!(ids.len(), 1);
}

#[tokio::test]
async fn seasons_list_in_chronological_order() {
    let store = test_store().await;
    let cancel = CancellationToken::new();

    let mut autumn = sheet_record(40, "Automnal");
    autumn.season = Season::new(2024, 4);
    let mut winter = sheet_record(41, "Hivernal");
    winter.season = Season::new(2024, 1);
    store.upsert_title(&autumn, &cancel).await.expect("autumn");
    store.upsert_title(&winter, &cancel).await.expect("winter");

    let seasons = store.list_seasons().await.expect("seasons");
    let numbers: Vec<i64> = seasons.iter().map(|s| s.number).collect();
    assert_eq!(numbers, vec![20241, 20244]);
    assert_eq!(seasons[0].label, "Hiver 2024");
    assert_eq!(seasons[1].label, "Automne 2024");
}

#[tokio::test]
async fn planning_snapshots_replace_per_sheet() {
    let store = test_store().await;
    let cancel = CancellationToken::new();
    let record = sheet_record(30, "Planifié");
    store
        .capture_planning(&record, &cancel)
        .await
        .expect("capture");

    let seasonal = store.list_seasonal_planning(20244).await.expect("seasonal");
    assert_eq!(seasonal.len(), 1);
    assert_eq!(seasonal[0].name, "Planifié");
    assert_eq!(seasonal[0].format_name.as_deref(), Some("Série TV"));

    let daily = store.list_daily_planning("2024-10-03").await.expect("daily");
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0].episode_number, 1);

    // Episode 1 moves two weeks out; the old day empties.
    let mut moved = record;
    moved.episodes[0].release_date = Some(PartialDate::new(2024, 10, 17));
    store
        .capture_planning(&moved, &cancel)
        .await
        .expect("recapture");

    assert!(store
        .list_daily_planning("2024-10-03")
        .await
        .expect("daily")
        .is_empty());
    assert_eq!(
        store
            .list_daily_planning("2024-10-17")
            .await
            .expect("daily")
            .len(),
        1
    );
    assert_eq!(
        store
            .list_seasonal_planning(20244)
            .await
            .expect("seasonal")
            .len(),
        1
    );
}

#[tokio::test]
async fn planning_skips_partial_dates_and_missing_seasons() {
    let store = test_store().await;
    let cancel = CancellationToken::new();
    let mut record = sheet_record(31, "Flou");
    record.season = None;
    record.episodes = vec![EpisodeRecord {
        number: 1,
        name: None,
        release_date: Some(PartialDate::from_year_month(2024, 10)),
    }];

    store
        .capture_planning(&record, &cancel)
        .await
        .expect("capture");

    assert!(store
        .list_seasonal_planning(20244)
        .await
        .expect("seasonal")
        .is_empty());
    assert!(store
        .list_daily_planning("2024-10-00")
        .await
        .expect("daily")
        .is_empty());
}
