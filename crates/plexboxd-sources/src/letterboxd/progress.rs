use crate::error::PipelineError;

/// Parse the final import status, e.g. "Saved 42 films".
///
/// Surrounding whitespace and anything after the unit word are ignored.
/// The unit is "films" or "film", optionally followed by punctuation.
pub fn parse_saved_count(text: &str) -> Result<u64, PipelineError> {
    let parse_error = || PipelineError::Parse { text: text.to_string() };

    let mut words = text.split_whitespace();
    match (words.next(), words.next(), words.next()) {
        (Some("Saved"), Some(count), Some(unit)) if is_film_unit(unit) => {
            count.parse::<u64>().map_err(|_| parse_error())
        }
        _ => Err(parse_error()),
    }
}

fn is_film_unit(word: &str) -> bool {
    matches!(word.trim_end_matches(|c: char| c.is_ascii_punctuation()), "film" | "films")
}
