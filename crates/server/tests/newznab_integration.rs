//! Newznab endpoint tests against the in-process router.

mod common;

use axum::http::StatusCode;
use chrono::NaiveDate;
use common::{fixtures, TestConfig, TestFixture};
use mediathekarr_core::ruleset::MatchingStrategy;
use mediathekarr_core::MediathekError;

fn show_ruleset(tvdb_id: u64) -> mediathekarr_core::ruleset::RawRuleset {
    let mut raw = fixtures::raw_ruleset(1, "Show", 1);
    raw.media.tvdb_id = Some(tvdb_id);
    raw.media.name = "ShowName".to_string();
    raw.matching_strategy = MatchingStrategy::SeasonAndEpisodeNumber;
    raw.season_regex = Some(r"S(\d+)E\d+".to_string());
    raw.episode_regex = Some(r"S\d+E(\d+)".to_string());
    raw
}

async fn anchored_fixture() -> TestFixture {
    let fixture = TestFixture::new().await;
    fixture
        .ruleset_source
        .set_pages(vec![vec![show_ruleset(100)]])
        .await;
    fixture.load_rulesets().await;
    fixture
        .episodes
        .add_series(fixtures::series(
            100,
            "Show",
            vec![fixtures::episode("Mord im Dorf", 2, 5, None)],
        ))
        .await;
    fixture
        .items
        .set_items(vec![fixtures::raw_item("Show", "Show S02E05 Something")])
        .await;
    fixture
}

#[tokio::test]
async fn test_caps() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api?t=caps").await;

    assert_status!(response, StatusCode::OK);
    assert!(response
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.starts_with("application/xml")));
    assert!(response.text.contains("<caps>"));
    assert!(response.text.contains("tv-search"));
    assert_eq!(fixture.items.query_count().await, 0);
}

#[tokio::test]
async fn test_missing_function() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api").await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.text.contains("code=\"200\""));
}

#[tokio::test]
async fn test_unknown_function() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api?t=music").await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.text.contains("code=\"202\""));
}

#[tokio::test]
async fn test_malformed_number() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api?t=tvsearch&tvdbid=abc").await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.text.contains("code=\"201\""));
    assert_eq!(fixture.items.query_count().await, 0);
}

#[tokio::test]
async fn test_anchored_tvsearch() {
    let fixture = anchored_fixture().await;

    let response = fixture
        .get("/api?t=tvsearch&tvdbid=100&season=2&ep=5&cat=5030,5040")
        .await;

    assert_status!(response, StatusCode::OK);
    assert!(response
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.starts_with("application/rss+xml")));
    assert!(response
        .text
        .contains("ShowName.S02E05.Mord.im.Dorf.GERMAN.720p.WEB.h264-MEDiATHEK"));
    assert!(response.text.contains("total=\"3\""));
    assert_eq!(response.text.matches("<item>").count(), 3);
}

#[tokio::test]
async fn test_anchored_tvsearch_other_episode() {
    let fixture = anchored_fixture().await;

    let response = fixture.get("/api?t=tvsearch&tvdbid=100&season=2&ep=6").await;

    assert_status!(response, StatusCode::OK);
    assert!(response.text.contains("total=\"0\""));
}

#[tokio::test]
async fn test_unknown_show() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api?t=tvsearch&tvdbid=999").await;

    assert_status!(response, StatusCode::NOT_FOUND);
    assert!(response.text.contains("code=\"300\""));
}

#[tokio::test]
async fn test_daily_episode() {
    let fixture = TestFixture::new().await;
    fixture
        .episodes
        .add_series(fixtures::series(
            7,
            "Tagesschau",
            vec![fixtures::episode(
                "Tagesschau 20:00 Uhr",
                2024,
                210,
                NaiveDate::from_ymd_opt(2024, 10, 24),
            )],
        ))
        .await;
    fixture
        .items
        .set_items(vec![fixtures::raw_item(
            "Tagesschau",
            "Tagesschau 20:00 Uhr vom 24.10.2024",
        )])
        .await;

    let response = fixture
        .get("/api?t=tvsearch&tvdbid=7&season=2024&ep=10/24")
        .await;

    assert_status!(response, StatusCode::OK);
    assert!(response.text.contains("Tagesschau.2024-10-24."));
    assert!(response.text.contains("total=\"6\""));
}

#[tokio::test]
async fn test_free_text_search() {
    let fixture = TestFixture::new().await;
    fixture
        .items
        .set_items(vec![
            fixtures::raw_item("Tatort", "Tatort: Murot (S01/E02)"),
            fixtures::raw_item("Tatort", "Murot und das Prinzip Hoffnung"),
        ])
        .await;

    let response = fixture.get("/api?t=search&q=Tatort").await;

    assert_status!(response, StatusCode::OK);
    assert!(response
        .text
        .contains("Tatort.S01E02.Tatort.Murot.GERMAN.720p.WEB.h264-MEDiATHEK"));
    assert!(response.text.contains("WEB.h264-NO.MATCH"));
}

#[tokio::test]
async fn test_movie_search() {
    let fixture = TestFixture::new().await;
    fixture
        .items
        .set_items(vec![fixtures::raw_item("Filme im Ersten", "Das Boot")])
        .await;

    let response = fixture.get("/api?t=movie&q=Das%20Boot").await;

    assert_status!(response, StatusCode::OK);
    assert!(response
        .text
        .contains("Das.Boot.GERMAN.720p.WEB.h264-MEDiATHEK"));
    assert!(response.text.contains("<category>2000</category>"));
}

#[tokio::test]
async fn test_content_failure_returns_empty_feed() {
    let fixture = TestFixture::new().await;
    fixture
        .items
        .set_error(Some(MediathekError::Timeout))
        .await;

    let response = fixture.get("/api?t=search&q=Tatort").await;

    assert_status!(response, StatusCode::OK);
    assert!(response.text.contains("total=\"0\""));
    assert!(!response.text.contains("<item>"));
}

#[tokio::test]
async fn test_offset_and_limit() {
    let fixture = TestFixture::new().await;
    fixture
        .items
        .set_items(vec![fixtures::raw_item("Tatort", "Tatort: Murot (S01/E02)")])
        .await;

    let limited = fixture.get("/api?t=search&q=Tatort&limit=2").await;
    assert_status!(limited, StatusCode::OK);
    assert_eq!(limited.text.matches("<item>").count(), 2);

    let paged = fixture.get("/api?t=search&q=Tatort&offset=100").await;
    assert_status!(paged, StatusCode::OK);
    assert!(paged.text.contains("offset=\"100\""));
    assert!(!paged.text.contains("<item>"));
}

#[tokio::test]
async fn test_repeated_search_is_cached() {
    let fixture = TestFixture::new().await;
    fixture
        .items
        .set_items(vec![fixtures::raw_item("Tatort", "Tatort: Murot (S01/E02)")])
        .await;

    let first = fixture.get("/api?t=search&q=Tatort").await;
    let second = fixture.get("/api?t=search&q=%20tatort%20").await;

    assert_eq!(first.text, second.text);
    assert_eq!(fixture.items.query_count().await, 1);
}

#[tokio::test]
async fn test_api_key_required() {
    let fixture = TestFixture::with_config(TestConfig::with_api_key("secret")).await;

    let missing = fixture.get("/api?t=caps").await;
    assert_status!(missing, StatusCode::UNAUTHORIZED);
    assert!(missing.text.contains("code=\"100\""));

    let wrong = fixture.get("/api?t=caps&apikey=nope").await;
    assert_status!(wrong, StatusCode::UNAUTHORIZED);

    let ok = fixture.get("/api?t=caps&apikey=secret").await;
    assert_status!(ok, StatusCode::OK);
}

#[tokio::test]
async fn test_api_key_not_needed_for_management_routes() {
    let fixture = TestFixture::with_config(TestConfig::with_api_key("secret")).await;

    let health = fixture.get("/api/v1/health").await;
    assert_status!(health, StatusCode::OK);

    let config = fixture.get("/api/v1/config").await;
    assert_status!(config, StatusCode::OK);
    assert_eq!(config.json()["server"]["api_key_configured"], true);
    assert!(!config.text.contains("secret"));
}

#[tokio::test]
async fn test_health_reports_rulesets() {
    let fixture = anchored_fixture().await;

    let response = fixture.get("/api/v1/health").await;

    assert_status!(response, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["rulesets_loaded"], 1);
    assert!(body["rulesets_loaded_at"].is_string());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.get("/api?t=caps").await;

    let response = fixture.get("/metrics").await;

    assert_status!(response, StatusCode::OK);
    assert!(response.text.contains("mediathekarr_newznab_requests_total"));
    assert!(response.text.contains("mediathekarr_result_cache_entries"));
}
