use crate::error::PipelineError;
use crate::plex::parser::{self, Guid, LibraryItem, SectionDescriptor};
use crate::traits::LibraryApi;
use chrono::{Local, TimeZone, Utc};
use plexboxd_config::TimeZonePolicy;
use plexboxd_models::WatchRecord;
use serde::Serialize;
use tracing::{debug, info, warn};

pub const IMDB_GUID_PREFIX: &str = "imdb://";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Watched films of one run, in section order then item order
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub records: Vec<WatchRecord>,
    pub report: ExtractionReport,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionReport {
    pub sections_total: usize,
    pub sections_skipped: usize,
    pub sections_failed: Vec<SectionFailure>,
    pub items_total: usize,
    pub items_unwatched: usize,
    pub items_untitled: usize,
    pub records: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionFailure {
    pub key: String,
    pub title: String,
    pub error: String,
}

pub struct RecordExtractor<'a> {
    library: &'a dyn LibraryApi,
    timezone: TimeZonePolicy,
}

impl<'a> RecordExtractor<'a> {
    pub fn new(library: &'a dyn LibraryApi, timezone: TimeZonePolicy) -> Self {
        Self { library, timezone }
    }

    /// Root listing failures are fatal, a failing movie section is reported and skipped.
    pub async fn extract(&self) -> Result<Extraction, PipelineError> {
        let root = self.library.fetch_sections().await?;
        let sections = parser::parse_sections(&root)?;
        info!(sections = sections.len(), "Fetched Plex library sections");

        let mut extraction = Extraction::default();
        extraction.report.sections_total = sections.len();

        for section in &sections {
            if !section.is_movie() {
                debug!(section = %section.title, kind = %section.kind, "Skipping non-movie section");
                extraction.report.sections_skipped += 1;
                continue;
            }

            let items = match self.fetch_items(section).await {
                Ok(items) => items,
                Err(e) => {
                    warn!(section = %section.title, key = %section.key, error = %e, "Failed to read movie section, continuing");
                    extraction.report.sections_failed.push(SectionFailure {
                        key: section.key.clone(),
                        title: section.title.clone(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let before = extraction.records.len();
            for item in &items {
                self.collect_item(item, &mut extraction);
            }
            info!(
                section = %section.title,
                items = items.len(),
                records = extraction.records.len() - before,
                "Processed movie section"
            );
        }

        extraction.report.records = extraction.records.len();
        Ok(extraction)
    }

    async fn fetch_items(&self, section: &SectionDescriptor) -> Result<Vec<LibraryItem>, PipelineError> {
        let xml = self.library.fetch_section_items(&section.key).await?;
        parser::parse_section_items(&xml)
    }

    fn collect_item(&self, item: &LibraryItem, extraction: &mut Extraction) {
        extraction.report.items_total += 1;

        if item.view_count.unwrap_or(0) == 0 {
            extraction.report.items_unwatched += 1;
            return;
        }
        if item.title.trim().is_empty() {
            debug!(year = ?item.year, "Skipping watched item without a title");
            extraction.report.items_untitled += 1;
            return;
        }

        extraction.records.push(build_record(item, self.timezone));
    }
}

/// Convert a watched, titled item. Filtering happens in the extractor.
pub fn build_record(item: &LibraryItem, timezone: TimeZonePolicy) -> WatchRecord {
    WatchRecord {
        title: item.title.clone(),
        year: format_year(item.year),
        external_id: first_imdb_id(&item.guids).unwrap_or_default().to_string(),
        rating: format_rating(item.user_rating),
        watched_date: format_watched_date(item.last_viewed_at, timezone),
    }
}

pub fn format_year(year: Option<i32>) -> String {
    match year {
        Some(year) if year > 0 => year.to_string(),
        _ => String::new(),
    }
}

/// Whole number, halves round to even
pub fn format_rating(rating: Option<f64>) -> String {
    match rating {
        Some(r) if r > 0.0 && r.is_finite() => format!("{}", r.round_ties_even() as i64),
        _ => String::new(),
    }
}

pub fn format_watched_date(last_viewed_at: Option<i64>, timezone: TimeZonePolicy) -> String {
    let ts = match last_viewed_at {
        Some(ts) if ts > 0 => ts,
        _ => return String::new(),
    };

    let formatted = match timezone {
        TimeZonePolicy::Local => Local
            .timestamp_opt(ts, 0)
            .single()
            .map(|dt| dt.format(DATE_FORMAT).to_string()),
        TimeZonePolicy::Utc => Utc
            .timestamp_opt(ts, 0)
            .single()
            .map(|dt| dt.format(DATE_FORMAT).to_string()),
    };
    formatted.unwrap_or_default()
}

pub fn first_imdb_id(guids: &[Guid]) -> Option<&str> {
    guids
        .iter()
        .find_map(|guid| guid.id.strip_prefix(IMDB_GUID_PREFIX))
}

#[cfg(test)]
mod tests;
