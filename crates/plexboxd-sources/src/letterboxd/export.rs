use crate::error::PipelineError;
use plexboxd_models::{WatchRecord, EXPORT_HEADER};
use std::io;
use std::path::Path;
use tracing::{debug, info};

/// Create or truncate `path` and write the header plus one row per record.
/// Returns the number of data rows.
pub fn write_watch_records(path: &Path, records: &[WatchRecord]) -> Result<usize, PipelineError> {
    let file = std::fs::File::create(path)?;
    let rows = write_records_to(file, records)?;
    info!(path = %path.display(), records = rows, "Wrote Letterboxd import file");
    Ok(rows)
}

pub fn write_records_to<W: io::Write>(writer: W, records: &[WatchRecord]) -> Result<usize, PipelineError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    writer.write_record(EXPORT_HEADER)?;
    for record in records {
        writer.write_record(record.as_row())?;
    }
    writer.flush()?;
    Ok(records.len())
}

pub fn read_watch_records(path: &Path) -> Result<Vec<WatchRecord>, PipelineError> {
    let file = std::fs::File::open(path)?;
    read_records_from(file)
}

pub fn read_records_from<R: io::Read>(reader: R) -> Result<Vec<WatchRecord>, PipelineError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers = reader.headers()?.clone();
    if !headers.iter().eq(EXPORT_HEADER.iter().copied()) {
        return Err(PipelineError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "unexpected CSV header '{}', expected '{}'",
                headers.iter().collect::<Vec<_>>().join(","),
                EXPORT_HEADER.join(",")
            ),
        )));
    }

    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: WatchRecord = row?;
        records.push(record);
    }
    debug!(records = records.len(), "Read Letterboxd import file");
    Ok(records)
}

/// Data rows in an export file, header excluded
pub fn count_rows(path: &Path) -> Result<usize, PipelineError> {
    Ok(read_watch_records(path)?.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn arrival() -> WatchRecord {
        WatchRecord {
            title: "Arrival".to_string(),
            year: "2016".to_string(),
            external_id: "tt2543164".to_string(),
            rating: "8".to_string(),
            watched_date: "2023-11-14".to_string(),
        }
    }

    #[test]
    fn test_write_exact_bytes() {
        let mut buffer = Vec::new();
        let rows = write_records_to(&mut buffer, &[arrival(), WatchRecord::new("Primer")]).unwrap();
        assert_eq!(rows, 2);
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "Title,Year,imdbID,Rating10,WatchedDate\n\
             Arrival,2016,tt2543164,8,2023-11-14\n\
             Primer,,,,\n"
        );
    }

    #[test]
    fn test_header_written_for_empty_export() {
        let mut buffer = Vec::new();
        write_records_to(&mut buffer, &[]).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "Title,Year,imdbID,Rating10,WatchedDate\n");
    }

    #[test]
    fn test_titles_with_commas_are_quoted() {
        let mut buffer = Vec::new();
        let record = WatchRecord {
            title: "Crouching Tiger, Hidden Dragon".to_string(),
            year: "2000".to_string(),
            ..WatchRecord::default()
        };
        write_records_to(&mut buffer, &[record.clone()]).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.contains("\"Crouching Tiger, Hidden Dragon\",2000,,,"));

        let back = read_records_from(buffer.as_slice()).unwrap();
        assert_eq!(back, vec![record]);
    }

    #[test]
    fn test_file_reread_preserves_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("letterboxd.csv");
        let records = vec![arrival(), WatchRecord::new("Primer"), WatchRecord::new("Heat")];

        assert_eq!(write_watch_records(&path, &records).unwrap(), 3);
        assert_eq!(read_watch_records(&path).unwrap(), records);
        assert_eq!(count_rows(&path).unwrap(), 3);
    }

    #[test]
    fn test_write_truncates_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("letterboxd.csv");
        write_watch_records(&path, &[arrival(), arrival()]).unwrap();
        write_watch_records(&path, &[WatchRecord::new("Heat")]).unwrap();
        assert_eq!(count_rows(&path).unwrap(), 1);
    }

    #[test]
    fn test_unwritable_destination_is_io_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("letterboxd.csv");
        let err = write_watch_records(&path, &[arrival()]).unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
    }

    #[test]
    fn test_foreign_header_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Name,Year,Const").unwrap();
        writeln!(file, "Arrival,2016,tt2543164").unwrap();
        let err = read_watch_records(file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::Io(ref e) if e.kind() == io::ErrorKind::InvalidData));
        assert!(err.to_string().contains("Name,Year,Const"));
    }

    #[test]
    fn test_count_rows_missing_file() {
        let dir = tempdir().unwrap();
        assert!(matches!(count_rows(&dir.path().join("nope.csv")), Err(PipelineError::Io(_))));
    }
}
