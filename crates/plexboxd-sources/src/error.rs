use crate::letterboxd::ImportStep;
use plexboxd_config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Network or HTTP failure talking to the library API
    #[error("transport error: {0}")]
    Transport(String),

    /// Library API response did not have the expected structure
    #[error("unexpected library response: {0}")]
    Format(String),

    /// Export file could not be created, written or read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("browser automation failed at step '{step}': {message}")]
    Automation { step: ImportStep, message: String },

    /// Final progress text did not read "Saved <N> films"
    #[error("could not parse import progress text {text:?}")]
    Parse { text: String },

    /// Engine provisioning or launch outside an import run
    #[error("browser error: {0}")]
    Browser(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl PipelineError {
    pub fn automation(step: ImportStep, err: impl std::fmt::Display) -> Self {
        PipelineError::Automation {
            step,
            message: err.to_string(),
        }
    }

    /// Step that failed, for automation errors
    pub fn step(&self) -> Option<ImportStep> {
        match self {
            PipelineError::Automation { step, .. } => Some(*step),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries the Plex token as a query parameter
        PipelineError::Transport(err.without_url().to_string())
    }
}

impl From<quick_xml::DeError> for PipelineError {
    fn from(err: quick_xml::DeError) -> Self {
        PipelineError::Format(err.to_string())
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::Io(std::io::Error::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_automation_error_names_step() {
        let err = PipelineError::automation(ImportStep::UploadFile, "no element matched input#upload-imdb-import");
        assert_eq!(err.step(), Some(ImportStep::UploadFile));
        assert_eq!(
            err.to_string(),
            "browser automation failed at step 'upload_file': no element matched input#upload-imdb-import"
        );
    }

    #[test]
    fn test_parse_error_quotes_text() {
        let err = PipelineError::Parse { text: "Processing…".to_string() };
        assert!(err.to_string().contains("\"Processing…\""));
        assert_eq!(err.step(), None);
    }
}
