pub mod chromium;
pub mod export;
pub mod importer;
pub mod progress;

pub use chromium::ChromiumLauncher;
pub use export::{count_rows, read_watch_records, write_watch_records};
pub use importer::{
    ImportSettings, ImportStep, LetterboxdCredentials, LetterboxdImporter, StepObserver, WaitPlan,
    WaitPolicy,
};
pub use progress::parse_saved_count;
