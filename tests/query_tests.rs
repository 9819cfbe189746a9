//! Search composer tests: filtering, sorting, grouping, paging, and the
//! content policy, over a small seeded catalog.

use anisheet::db::Store;
use anisheet::models::filter::{ContentPolicy, GroupBy, SortBy, SortDir, TitleFilter};
use anisheet::models::title::{AlternateTitleRecord, CategoryKind, TitleAggregate, TitleRecord};
use anisheet::normalize::{PartialDate, Season};
use tokio_util::sync::CancellationToken;

async fn test_store() -> Store {
    let db_path =
        std::env::temp_dir().join(format!("anisheet-query-test-{}.db", uuid::Uuid::new_v4()));
    Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("failed to open test store")
}

fn record(sheet_id: i64, name: &str) -> TitleRecord {
    TitleRecord {
        sheet_id,
        url: format!("https://catalog.example/animes/{sheet_id}-fiche.html"),
        name: name.to_string(),
        section: "animes".to_string(),
        ..Default::default()
    }
}

async fn seed(store: &Store, records: &[TitleRecord]) {
    let cancel = CancellationToken::new();
    for record in records {
        store
            .upsert_title(record, &cancel)
            .await
            .expect("seed record");
    }
}

async fn search(
    store: &Store,
    filter: &TitleFilter,
    page: u64,
    page_size: u64,
) -> anisheet::models::filter::Paged<TitleAggregate> {
    store
        .search_titles(
            filter,
            SortBy::Name,
            SortDir::Asc,
            None,
            page,
            page_size,
            &ContentPolicy::permissive(),
            &CancellationToken::new(),
        )
        .await
        .expect("search")
}

fn names(page: &anisheet::models::filter::Paged<TitleAggregate>) -> Vec<String> {
    page.items.iter().map(|t| t.name.clone()).collect()
}

async fn genre_id(store: &Store, name: &str) -> i64 {
    store
        .list_categories(Some(CategoryKind::Genre))
        .await
        .expect("genres")
        .into_iter()
        .find(|g| g.name == name)
        .expect("seeded genre")
        .id
}

#[tokio::test]
async fn keyword_spans_name_description_and_alternates() {
    let store = test_store().await;
    let mut shingeki = record(1, "Shingeki no Kyojin");
    shingeki.alternate_titles = vec![AlternateTitleRecord {
        name: "Attack on Titan".to_string(),
        label: Some("Anglais".to_string()),
    }];
    let mut naruto = record(2, "Naruto");
    naruto.description = Some("Un ninja du village de Konoha.".to_string());
    seed(&store, &[shingeki, naruto, record(3, "One Piece")]).await;

    let by_alt = search(
        &store,
        &TitleFilter {
            keyword: Some("ATTACK".to_string()),
            ..Default::default()
        },
        1,
        20,
    )
    .await;
    assert_eq!(names(&by_alt), vec!["Shingeki no Kyojin"]);

    let by_description = search(
        &store,
        &TitleFilter {
            keyword: Some("konoha".to_string()),
            ..Default::default()
        },
        1,
        20,
    )
    .await;
    assert_eq!(names(&by_description), vec!["Naruto"]);

    let nothing = search(
        &store,
        &TitleFilter {
            keyword: Some("zz".to_string()),
            ..Default::default()
        },
        1,
        20,
    )
    .await;
    assert_eq!(nothing.total_items, 0);
    assert_eq!(nothing.total_pages, 1);
    assert_eq!(nothing.current_page, 1);
    assert!(nothing.items.is_empty());
}

#[tokio::test]
async fn category_inclusion_and_exclusion_split_the_catalog() {
    let store = test_store().await;
    let mut action = record(1, "Combat");
    action.genres = vec!["Action".to_string()];
    let mut romance = record(2, "Tendresse");
    romance.genres = vec!["Romance".to_string()];
    seed(&store, &[action, romance]).await;
    let action_id = genre_id(&store, "Action").await;

    let included = search(
        &store,
        &TitleFilter {
            include_categories: vec![action_id],
            ..Default::default()
        },
        1,
        20,
    )
    .await;
    assert_eq!(names(&included), vec!["Combat"]);

    let excluded = search(
        &store,
        &TitleFilter {
            exclude_categories: vec![action_id],
            ..Default::default()
        },
        1,
        20,
    )
    .await;
    assert_eq!(names(&excluded), vec!["Tendresse"]);
}

#[tokio::test]
async fn including_and_excluding_one_studio_matches_nothing() {
    let store = test_store().await;
    let mut title = record(1, "Unique");
    title.studios = vec!["MAPPA".to_string()];
    seed(&store, &[title]).await;

    let studio_id = store
        .find_title_by_sheet_id(1)
        .await
        .expect("lookup")
        .expect("stored title")
        .studios[0]
        .id;

    let page = search(
        &store,
        &TitleFilter {
            include_studios: vec![studio_id],
            exclude_studios: vec![studio_id],
            ..Default::default()
        },
        1,
        20,
    )
    .await;
    assert_eq!(page.total_items, 0);
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn exclusion_keeps_titles_without_the_reference() {
    let store = test_store().await;
    let mut with_format = record(1, "Formaté");
    with_format.format = Some("Série TV".to_string());
    seed(&store, &[with_format, record(2, "Sans Format")]).await;

    let format_id = store.list_formats().await.expect("formats")[0].id;
    let page = search(
        &store,
        &TitleFilter {
            exclude_formats: vec![format_id],
            ..Default::default()
        },
        1,
        20,
    )
    .await;
    assert_eq!(names(&page), vec!["Sans Format"]);
}

#[tokio::test]
async fn pages_partition_the_match_set() {
    let store = test_store().await;
    seed(
        &store,
        &[
            record(1, "Titre A"),
            record(2, "Titre B"),
            record(3, "Titre C"),
            record(4, "Titre D"),
            record(5, "Titre E"),
        ],
    )
    .await;
    let filter = TitleFilter::default();

    let mut ids_from_pages = Vec::new();
    for page_number in 1..=3 {
        let page = search(&store, &filter, page_number, 2).await;
        assert_eq!(page.total_items, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, page_number);
        ids_from_pages.extend(page.items.iter().map(|t| t.id));
    }
    assert_eq!(names(&search(&store, &filter, 1, 2).await), vec!["Titre A", "Titre B"]);
    assert_eq!(names(&search(&store, &filter, 3, 2).await), vec!["Titre E"]);

    let all_ids = store
        .matching_title_ids(&filter, &ContentPolicy::permissive())
        .await
        .expect("ids");
    assert_eq!(ids_from_pages, all_ids);

    // Past the end: empty items, totals intact.
    let beyond = search(&store, &filter, 4, 2).await;
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.total_items, 5);
    assert_eq!(beyond.total_pages, 3);
    assert_eq!(beyond.current_page, 4);

    // Page and size clamp up to 1.
    let clamped = search(&store, &filter, 0, 0).await;
    assert_eq!(clamped.current_page, 1);
    assert_eq!(clamped.page_size, 1);
    assert_eq!(names(&clamped), vec!["Titre A"]);
}

#[tokio::test]
async fn sort_ties_break_on_ascending_id() {
    let store = test_store().await;
    let mut alpha = record(1, "Alpha");
    alpha.vote_count = 10;
    let mut beta = record(2, "Beta");
    beta.vote_count = 10;
    let mut gamma = record(3, "Gamma");
    gamma.vote_count = 5;
    seed(&store, &[alpha, beta, gamma]).await;

    let page = store
        .search_titles(
            &TitleFilter::default(),
            SortBy::VoteCount,
            SortDir::Desc,
            None,
            1,
            20,
            &ContentPolicy::permissive(),
            &CancellationToken::new(),
        )
        .await
        .expect("search");
    assert_eq!(names(&page), vec!["Alpha", "Beta", "Gamma"]);
}

#[tokio::test]
async fn grouping_leads_the_ordering() {
    let store = test_store().await;
    let mut delta = record(1, "Delta");
    delta.format = Some("Série TV".to_string());
    let mut echo = record(2, "Echo");
    echo.format = Some("Film".to_string());
    let mut alpha = record(3, "Alpha");
    alpha.format = Some("Série TV".to_string());
    let mut bravo = record(4, "Bravo");
    bravo.format = Some("Film".to_string());
    seed(&store, &[delta, echo, alpha, bravo]).await;

    let page = store
        .search_titles(
            &TitleFilter::default(),
            SortBy::Name,
            SortDir::Asc,
            Some(GroupBy::Format),
            1,
            20,
            &ContentPolicy::permissive(),
            &CancellationToken::new(),
        )
        .await
        .expect("search");
    assert_eq!(names(&page), vec!["Bravo", "Echo", "Alpha", "Delta"]);
    let formats: Vec<&str> = page
        .items
        .iter()
        .map(|t| t.format.as_ref().map_or("", |f| f.name.as_str()))
        .collect();
    assert_eq!(formats, vec!["Film", "Film", "Série TV", "Série TV"]);
}

#[tokio::test]
async fn policy_gates_flagged_titles_until_a_filter_overrides() {
    let store = test_store().await;
    let mut adult = record(2, "Réservé");
    adult.is_adult = true;
    let mut explicit = record(3, "Cru");
    explicit.is_explicit = true;
    seed(&store, &[record(1, "Propre"), adult, explicit]).await;
    let cancel = CancellationToken::new();
    let empty = TitleFilter::default();

    let restricted = store
        .search_titles(
            &empty,
            SortBy::Name,
            SortDir::Asc,
            None,
            1,
            20,
            &ContentPolicy::default(),
            &cancel,
        )
        .await
        .expect("search");
    assert_eq!(names(&restricted), vec!["Propre"]);

    let permissive = search(&store, &empty, 1, 20).await;
    assert_eq!(permissive.total_items, 3);

    let adult_only = search(
        &store,
        &TitleFilter {
            adult: Some(true),
            ..Default::default()
        },
        1,
        20,
    )
    .await;
    assert_eq!(names(&adult_only), vec!["Réservé"]);

    // An explicit flag filter overrides the policy even when restrictive.
    let adult_under_restrictive = store
        .search_titles(
            &TitleFilter {
                adult: Some(true),
                ..Default::default()
            },
            SortBy::Name,
            SortDir::Asc,
            None,
            1,
            20,
            &ContentPolicy::default(),
            &cancel,
        )
        .await
        .expect("search");
    assert_eq!(names(&adult_under_restrictive), vec!["Réservé"]);
}

#[tokio::test]
async fn season_bounds_filter_and_the_helper_pages_one_season() {
    let store = test_store().await;
    let mut winter = record(1, "Hivernal");
    winter.season = Season::new(2024, 1);
    let mut autumn = record(2, "Automnal");
    autumn.season = Season::new(2024, 4);
    seed(&store, &[winter, autumn, record(3, "Sans Saison")]).await;

    let late = search(
        &store,
        &TitleFilter {
            season_min: Some(20242),
            ..Default::default()
        },
        1,
        20,
    )
    .await;
    assert_eq!(names(&late), vec!["Automnal"]);

    let early = search(
        &store,
        &TitleFilter {
            season_max: Some(20241),
            ..Default::default()
        },
        1,
        20,
    )
    .await;
    assert_eq!(names(&early), vec!["Hivernal"]);

    let year = search(
        &store,
        &TitleFilter {
            season_min: Some(20241),
            season_max: Some(20244),
            ..Default::default()
        },
        1,
        20,
    )
    .await;
    // Titles without a season never match a season bound.
    assert_eq!(names(&year), vec!["Automnal", "Hivernal"]);

    let page = store
        .titles_in_season(
            20241,
            1,
            20,
            &ContentPolicy::permissive(),
            &CancellationToken::new(),
        )
        .await
        .expect("season page");
    assert_eq!(names(&page), vec!["Hivernal"]);
    assert_eq!(
        page.items[0].season.as_ref().map(|s| s.label.as_str()),
        Some("Hiver 2024")
    );
}

#[tokio::test]
async fn release_date_bounds_are_inclusive_and_skip_unknowns() {
    let store = test_store().await;
    let mut spring = record(1, "Printanier");
    spring.release_date = Some(PartialDate::new(2023, 5, 10));
    let mut newyear = record(2, "Nouvel An");
    newyear.release_date = Some(PartialDate::new(2024, 1, 1));
    seed(&store, &[spring, newyear, record(3, "Sans Date")]).await;

    let recent = search(
        &store,
        &TitleFilter {
            release_date_min: Some(PartialDate::new(2024, 1, 1)),
            ..Default::default()
        },
        1,
        20,
    )
    .await;
    assert_eq!(names(&recent), vec!["Nouvel An"]);

    let old = search(
        &store,
        &TitleFilter {
            release_date_max: Some(PartialDate::new(2023, 12, 31)),
            ..Default::default()
        },
        1,
        20,
    )
    .await;
    assert_eq!(names(&old), vec!["Printanier"]);

    let span = search(
        &store,
        &TitleFilter {
            release_date_min: Some(PartialDate::new(2023, 1, 1)),
            release_date_max: Some(PartialDate::new(2024, 12, 31)),
            ..Default::default()
        },
        1,
        20,
    )
    .await;
    assert_eq!(names(&span), vec!["Nouvel An", "Printanier"]);
}
