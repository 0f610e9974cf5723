use serde::{Deserialize, Serialize};

/// Column names of the Letterboxd importer. The importer matches them by name.
pub const EXPORT_HEADER: [&str; 5] = ["Title", "Year", "imdbID", "Rating10", "WatchedDate"];

/// One "watched this film" fact, normalized for the Letterboxd import format.
///
/// Optional values are empty strings: the CSV format has no null marker.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchRecord {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year")]
    pub year: String, // Four-digit release year
    #[serde(rename = "imdbID")]
    pub external_id: String, // IMDb id without the "imdb://" marker
    #[serde(rename = "Rating10")]
    pub rating: String, // Integer 0-10
    #[serde(rename = "WatchedDate")]
    pub watched_date: String, // YYYY-MM-DD
}

impl WatchRecord {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Fields in export column order
    pub fn as_row(&self) -> [&str; 5] {
        [
            &self.title,
            &self.year,
            &self.external_id,
            &self.rating,
            &self.watched_date,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_follows_header_order() {
        let record = WatchRecord {
            title: "Arrival".to_string(),
            year: "2016".to_string(),
            external_id: "tt2543164".to_string(),
            rating: "8".to_string(),
            watched_date: "2023-11-14".to_string(),
        };
        assert_eq!(record.as_row(), ["Arrival", "2016", "tt2543164", "8", "2023-11-14"]);
    }

    #[test]
    fn test_serde_uses_export_column_names() {
        let record = WatchRecord::new("Nope");
        let json = serde_json::to_value(&record).unwrap();
        for column in EXPORT_HEADER {
            assert!(json.get(column).is_some(), "missing column {}", column);
        }
        assert_eq!(json["Title"], "Nope");
        assert_eq!(json["imdbID"], "");
    }
}
