//! Plex library XML documents.
//!
//! Root listing: `<MediaContainer><Directory key type title/>...</MediaContainer>`
//! Section listing: `<MediaContainer><Video ...><Guid id/>...</Video>...</MediaContainer>`

use crate::error::PipelineError;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Deserializer};
use std::fmt::Display;
use std::str::FromStr;

const ROOT_ELEMENT: &[u8] = b"MediaContainer";

#[derive(Debug, Deserialize)]
struct MediaContainer {
    #[serde(rename = "Directory", default)]
    directories: Vec<SectionDescriptor>,
    #[serde(rename = "Video", default)]
    videos: Vec<LibraryItem>,
}

/// Library section from the root listing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SectionDescriptor {
    #[serde(rename = "@key")]
    pub key: String,
    #[serde(rename = "@type", default)]
    pub kind: String,
    #[serde(rename = "@title", default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LibraryItem {
    #[serde(rename = "@title", default)]
    pub title: String,
    #[serde(rename = "@year", default, deserialize_with = "empty_as_none")]
    pub year: Option<i32>,
    #[serde(rename = "@viewCount", default, deserialize_with = "empty_as_none")]
    pub view_count: Option<u64>,
    /// Epoch seconds
    #[serde(rename = "@lastViewedAt", default, deserialize_with = "empty_as_none")]
    pub last_viewed_at: Option<i64>,
    #[serde(rename = "@userRating", default, deserialize_with = "empty_as_none")]
    pub user_rating: Option<f64>,
    #[serde(rename = "Guid", default)]
    pub guids: Vec<Guid>,
}

/// Cross-reference identifier such as `imdb://tt2543164`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Guid {
    #[serde(rename = "@id")]
    pub id: String,
}

/// Plex writes unknown numbers as empty attributes (`year=""`)
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

impl SectionDescriptor {
    pub fn is_movie(&self) -> bool {
        self.kind == "movie"
    }
}

pub fn parse_sections(xml: &str) -> Result<Vec<SectionDescriptor>, PipelineError> {
    Ok(parse_container(xml)?.directories)
}

pub fn parse_section_items(xml: &str) -> Result<Vec<LibraryItem>, PipelineError> {
    Ok(parse_container(xml)?.videos)
}

fn parse_container(xml: &str) -> Result<MediaContainer, PipelineError> {
    ensure_media_container(xml)?;
    Ok(quick_xml::de::from_str(xml)?)
}

/// The deserializer accepts any root element, so check the name first
fn ensure_media_container(xml: &str) -> Result<(), PipelineError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.name().as_ref() == ROOT_ELEMENT {
                    return Ok(());
                }
                return Err(PipelineError::Format(format!(
                    "expected <MediaContainer> root element, found <{}>",
                    String::from_utf8_lossy(e.name().as_ref())
                )));
            }
            Ok(Event::Eof) => {
                return Err(PipelineError::Format("response contains no XML element".to_string()));
            }
            Ok(Event::Text(text)) if !text.iter().all(u8::is_ascii_whitespace) => {
                return Err(PipelineError::Format("response is not an XML document".to_string()));
            }
            Ok(_) => continue,
            Err(e) => return Err(PipelineError::Format(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<MediaContainer size="3" allowSync="0" title1="Plex Library">
  <Directory allowSync="1" key="1" type="movie" title="Movies" agent="tv.plex.agents.movie">
    <Location id="1" path="/data/movies"/>
  </Directory>
  <Directory key="2" type="show" title="TV Shows"/>
  <Directory key="7" type="movie" title="Documentaries"/>
</MediaContainer>"#;

    const SECTION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<MediaContainer size="2" librarySectionID="1">
  <Video ratingKey="10" title="Arrival" year="2016" viewCount="1" lastViewedAt="1700000000" userRating="8.0">
    <Media id="1" duration="6960000"><Part id="1" file="/data/movies/arrival.mkv"/></Media>
    <Genre tag="Science Fiction"/>
    <Guid id="tmdb://329865"/>
    <Guid id="imdb://tt2543164"/>
  </Video>
  <Video ratingKey="11" title="Nope" year="2022"/>
</MediaContainer>"#;

    #[test]
    fn test_parse_sections() {
        let sections = parse_sections(ROOT).unwrap();
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].key, "1");
        assert_eq!(sections[0].title, "Movies");
        assert!(sections[0].is_movie());
        assert!(!sections[1].is_movie());
        assert_eq!(sections[2].key, "7");
    }

    #[test]
    fn test_parse_section_items() {
        let items = parse_section_items(SECTION).unwrap();
        assert_eq!(items.len(), 2);

        let arrival = &items[0];
        assert_eq!(arrival.title, "Arrival");
        assert_eq!(arrival.year, Some(2016));
        assert_eq!(arrival.view_count, Some(1));
        assert_eq!(arrival.last_viewed_at, Some(1_700_000_000));
        assert_eq!(arrival.user_rating, Some(8.0));
        assert_eq!(
            arrival.guids.iter().map(|g| g.id.as_str()).collect::<Vec<_>>(),
            vec!["tmdb://329865", "imdb://tt2543164"]
        );

        let nope = &items[1];
        assert_eq!(nope.view_count, None);
        assert!(nope.guids.is_empty());
        assert_eq!(nope.user_rating, None);
    }

    #[test]
    fn test_empty_container() {
        assert!(parse_sections("<MediaContainer size=\"0\"/>").unwrap().is_empty());
        assert!(parse_section_items("<MediaContainer size=\"0\"></MediaContainer>").unwrap().is_empty());
    }

    #[test]
    fn test_wrong_root_is_format_error() {
        let err = parse_sections("<html><body>Unauthorized</body></html>").unwrap_err();
        assert!(matches!(err, PipelineError::Format(_)));
    }

    #[test]
    fn test_non_xml_is_format_error() {
        assert!(matches!(parse_sections("401 Unauthorized"), Err(PipelineError::Format(_))));
        assert!(matches!(parse_sections(""), Err(PipelineError::Format(_))));
    }

    #[test]
    fn test_empty_numeric_attributes_are_unknown() {
        let xml = r#"<MediaContainer>
  <Video title="Arrival" year="" viewCount="1" lastViewedAt="" userRating=""/>
  <Video title="Heat" year="1995" viewCount="2"/>
</MediaContainer>"#;
        let items = parse_section_items(xml).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].year, None);
        assert_eq!(items[0].view_count, Some(1));
        assert_eq!(items[0].last_viewed_at, None);
        assert_eq!(items[0].user_rating, None);
        assert_eq!(items[1].year, Some(1995));
    }

    #[test]
    fn test_bad_attribute_is_format_error() {
        let xml = r#"<MediaContainer><Video title="Broken" viewCount="many"/></MediaContainer>"#;
        assert!(matches!(parse_section_items(xml), Err(PipelineError::Format(_))));
    }
}
