use serde::{Deserialize, Serialize};

/// Outcome of a fully successful Letterboxd import run
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportResult {
    /// Count reported by the site's "Saved N films" message
    pub imported_count: u64,
    /// Per-row matched-title fragments shown before confirming (observability only)
    #[serde(default)]
    pub matched_titles: Vec<String>,
}
