use super::*;
use async_trait::async_trait;
use std::collections::HashMap;

const ROOT: &str = r#"<MediaContainer size="3">
  <Directory key="1" type="movie" title="Movies"/>
  <Directory key="2" type="show" title="TV Shows"/>
  <Directory key="3" type="movie" title="Kids"/>
</MediaContainer>"#;

const MOVIES: &str = r#"<MediaContainer size="2">
  <Video title="Arrival" year="2016" viewCount="1" lastViewedAt="1700000000" userRating="8.0">
    <Guid id="tmdb://329865"/>
    <Guid id="imdb://tt2543164"/>
  </Video>
  <Video title="Nope" year="2022" viewCount="0">
    <Guid id="imdb://tt10954984"/>
  </Video>
</MediaContainer>"#;

const KIDS: &str = r#"<MediaContainer size="2">
  <Video title="Paddington 2" year="2017" viewCount="3"/>
  <Video title="" year="2001" viewCount="1"/>
</MediaContainer>"#;

/// In-memory library keyed by section; a missing key fails the fetch
struct FakeLibrary {
    root: Result<String, String>,
    sections: HashMap<String, String>,
}

impl FakeLibrary {
    fn new(root: &str) -> Self {
        Self {
            root: Ok(root.to_string()),
            sections: HashMap::new(),
        }
    }

    fn with_section(mut self, key: &str, xml: &str) -> Self {
        self.sections.insert(key.to_string(), xml.to_string());
        self
    }

    fn unreachable() -> Self {
        Self {
            root: Err("connection refused".to_string()),
            sections: HashMap::new(),
        }
    }
}

#[async_trait]
impl LibraryApi for FakeLibrary {
    async fn fetch_sections(&self) -> Result<String, PipelineError> {
        self.root.clone().map_err(PipelineError::Transport)
    }

    async fn fetch_section_items(&self, section_key: &str) -> Result<String, PipelineError> {
        self.sections
            .get(section_key)
            .cloned()
            .ok_or_else(|| PipelineError::Transport(format!("HTTP 500 for section {}", section_key)))
    }
}

fn item(title: &str) -> LibraryItem {
    LibraryItem {
        title: title.to_string(),
        view_count: Some(1),
        ..LibraryItem::default()
    }
}

fn guid(id: &str) -> Guid {
    Guid { id: id.to_string() }
}

#[tokio::test]
async fn test_extracts_only_watched_movies() {
    let library = FakeLibrary::new(ROOT)
        .with_section("1", MOVIES)
        .with_section("3", KIDS);
    let extraction = RecordExtractor::new(&library, TimeZonePolicy::Utc)
        .extract()
        .await
        .unwrap();

    let titles: Vec<_> = extraction.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Arrival", "Paddington 2"]);

    let arrival = &extraction.records[0];
    assert_eq!(arrival.year, "2016");
    assert_eq!(arrival.external_id, "tt2543164");
    assert_eq!(arrival.rating, "8");
    assert_eq!(arrival.watched_date, "2023-11-14");

    let paddington = &extraction.records[1];
    assert_eq!(paddington.external_id, "");
    assert_eq!(paddington.rating, "");
    assert_eq!(paddington.watched_date, "");

    let report = &extraction.report;
    assert_eq!(report.sections_total, 3);
    assert_eq!(report.sections_skipped, 1);
    assert!(report.sections_failed.is_empty());
    assert_eq!(report.items_total, 4);
    assert_eq!(report.items_unwatched, 1);
    assert_eq!(report.items_untitled, 1);
    assert_eq!(report.records, 2);
}

#[tokio::test]
async fn test_empty_year_keeps_section_records() {
    let section = r#"<MediaContainer size="2">
  <Video title="Arrival" year="" viewCount="1"/>
  <Video title="Heat" year="1995" viewCount="2"/>
</MediaContainer>"#;
    let library = FakeLibrary::new(ROOT)
        .with_section("1", section)
        .with_section("3", "<MediaContainer size=\"0\"/>");
    let extraction = RecordExtractor::new(&library, TimeZonePolicy::Utc)
        .extract()
        .await
        .unwrap();

    assert!(extraction.report.sections_failed.is_empty());
    let rows: Vec<_> = extraction
        .records
        .iter()
        .map(|r| (r.title.as_str(), r.year.as_str()))
        .collect();
    assert_eq!(rows, vec![("Arrival", ""), ("Heat", "1995")]);
}

#[tokio::test]
async fn test_local_timezone_date() {
    let library = FakeLibrary::new(ROOT)
        .with_section("1", MOVIES)
        .with_section("3", KIDS);
    let extraction = RecordExtractor::new(&library, TimeZonePolicy::Local)
        .extract()
        .await
        .unwrap();

    let expected = Local
        .timestamp_opt(1_700_000_000, 0)
        .single()
        .unwrap()
        .format("%Y-%m-%d")
        .to_string();
    assert_eq!(extraction.records[0].watched_date, expected);
}

#[tokio::test]
async fn test_section_failure_is_reported_not_fatal() {
    let library = FakeLibrary::new(ROOT).with_section("3", KIDS);
    let extraction = RecordExtractor::new(&library, TimeZonePolicy::Utc)
        .extract()
        .await
        .unwrap();

    assert_eq!(extraction.records.len(), 1);
    assert_eq!(extraction.records[0].title, "Paddington 2");
    assert_eq!(extraction.report.sections_failed.len(), 1);
    assert_eq!(extraction.report.sections_failed[0].key, "1");
    assert_eq!(extraction.report.sections_failed[0].title, "Movies");
    assert!(extraction.report.sections_failed[0].error.contains("HTTP 500"));
}

#[tokio::test]
async fn test_unparseable_section_is_reported_not_fatal() {
    let library = FakeLibrary::new(ROOT)
        .with_section("1", "<html>maintenance</html>")
        .with_section("3", KIDS);
    let extraction = RecordExtractor::new(&library, TimeZonePolicy::Utc)
        .extract()
        .await
        .unwrap();

    assert_eq!(extraction.report.sections_failed.len(), 1);
    assert_eq!(extraction.records.len(), 1);
}

#[tokio::test]
async fn test_root_failure_is_fatal() {
    let library = FakeLibrary::unreachable();
    let result = RecordExtractor::new(&library, TimeZonePolicy::Utc).extract().await;
    assert!(matches!(result, Err(PipelineError::Transport(_))));
}

#[tokio::test]
async fn test_unparseable_root_is_fatal() {
    let library = FakeLibrary::new("not xml at all");
    let result = RecordExtractor::new(&library, TimeZonePolicy::Utc).extract().await;
    assert!(matches!(result, Err(PipelineError::Format(_))));
}

#[tokio::test]
async fn test_library_without_movie_sections() {
    let library = FakeLibrary::new(r#"<MediaContainer><Directory key="2" type="artist" title="Music"/></MediaContainer>"#);
    let extraction = RecordExtractor::new(&library, TimeZonePolicy::Utc)
        .extract()
        .await
        .unwrap();
    assert!(extraction.records.is_empty());
    assert_eq!(extraction.report.sections_skipped, 1);
}

#[test]
fn test_first_imdb_id_wins() {
    let guids = vec![
        guid("tmdb://329865"),
        guid("imdb://tt2543164"),
        guid("imdb://tt0000001"),
    ];
    assert_eq!(first_imdb_id(&guids), Some("tt2543164"));
}

#[test]
fn test_imdb_prefix_must_match_exactly() {
    let guids = vec![guid("com.plexapp.agents.imdb://tt2543164?lang=en"), guid("IMDB://tt1")];
    assert_eq!(first_imdb_id(&guids), None);
    assert_eq!(first_imdb_id(&[]), None);
}

#[test]
fn test_format_rating() {
    assert_eq!(format_rating(Some(7.6)), "8");
    assert_eq!(format_rating(Some(8.5)), "8");
    assert_eq!(format_rating(Some(7.5)), "8");
    assert_eq!(format_rating(Some(10.0)), "10");
    assert_eq!(format_rating(Some(0.4)), "0");
    assert_eq!(format_rating(Some(0.0)), "");
    assert_eq!(format_rating(Some(-1.0)), "");
    assert_eq!(format_rating(None), "");
}

#[test]
fn test_format_watched_date() {
    assert_eq!(format_watched_date(Some(1_700_000_000), TimeZonePolicy::Utc), "2023-11-14");
    assert_eq!(format_watched_date(Some(0), TimeZonePolicy::Utc), "");
    assert_eq!(format_watched_date(Some(-5), TimeZonePolicy::Local), "");
    assert_eq!(format_watched_date(None, TimeZonePolicy::Utc), "");
}

#[test]
fn test_format_year() {
    assert_eq!(format_year(Some(2016)), "2016");
    assert_eq!(format_year(Some(0)), "");
    assert_eq!(format_year(None), "");
}

#[test]
fn test_build_record_with_everything_missing() {
    let record = build_record(&item("Primer"), TimeZonePolicy::Utc);
    assert_eq!(record, WatchRecord::new("Primer"));
}
