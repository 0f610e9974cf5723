pub mod import_result;
pub mod watch_record;

pub use import_result::ImportResult;
pub use watch_record::{WatchRecord, EXPORT_HEADER};
