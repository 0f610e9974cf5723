pub mod api;
pub mod extractor;
pub mod parser;

pub use api::PlexHttpClient;
pub use extractor::{Extraction, ExtractionReport, RecordExtractor, SectionFailure};
pub use parser::{Guid, LibraryItem, SectionDescriptor};
