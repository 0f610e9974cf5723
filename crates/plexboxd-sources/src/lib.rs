pub mod error;
pub mod letterboxd;
pub mod plex;
pub mod traits;

pub use error::PipelineError;
pub use letterboxd::{
    ChromiumLauncher, ImportSettings, ImportStep, LetterboxdCredentials, LetterboxdImporter,
    StepObserver, WaitPlan, WaitPolicy,
};
pub use plex::{Extraction, ExtractionReport, PlexHttpClient, RecordExtractor, SectionFailure};
pub use traits::{BrowserLauncher, BrowserSession, LibraryApi};
