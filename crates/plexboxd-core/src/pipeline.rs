use crate::reconcile::{reconcile, Reconciliation};
use plexboxd_config::TimeZonePolicy;
use plexboxd_models::ImportResult;
use plexboxd_sources::letterboxd::{count_rows, write_watch_records};
use plexboxd_sources::{
    BrowserLauncher, ExtractionReport, ImportSettings, ImportStep, LetterboxdCredentials,
    LetterboxdImporter, LibraryApi, PipelineError, RecordExtractor, StepObserver,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Everything the Letterboxd stage needs
pub struct ImportPlan<'a> {
    pub launcher: &'a dyn BrowserLauncher,
    pub credentials: LetterboxdCredentials,
    pub settings: ImportSettings,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub export_path: PathBuf,
    pub exported: usize,
    /// Absent when an existing file was imported
    pub extraction: Option<ExtractionReport>,
    pub import: Option<ImportResult>,
    pub reconciliation: Reconciliation,
    #[serde(with = "duration_secs")]
    pub duration: Duration,
}

/// Plex extraction, CSV export, then an optional Letterboxd import
pub struct Orchestrator<'a> {
    library: &'a dyn LibraryApi,
    export_path: PathBuf,
    timezone: TimeZonePolicy,
    import: Option<ImportPlan<'a>>,
    observer: Option<StepObserver>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(library: &'a dyn LibraryApi, export_path: impl Into<PathBuf>) -> Self {
        Self {
            library,
            export_path: export_path.into(),
            timezone: TimeZonePolicy::default(),
            import: None,
            observer: None,
        }
    }

    pub fn with_timezone(mut self, timezone: TimeZonePolicy) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_import(mut self, plan: ImportPlan<'a>) -> Self {
        self.import = Some(plan);
        self
    }

    pub fn with_step_observer(mut self, observer: impl Fn(ImportStep) + Send + Sync + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub async fn run(self) -> Result<RunSummary, PipelineError> {
        let start = Instant::now();
        info!(
            operation = "run_start",
            export_path = %self.export_path.display(),
            import = self.import.is_some(),
            "Starting Plex to Letterboxd run"
        );

        let extraction = RecordExtractor::new(self.library, self.timezone).extract().await?;
        if !extraction.report.sections_failed.is_empty() {
            warn!(
                failed = extraction.report.sections_failed.len(),
                "Some movie sections could not be read, their films are missing from the export"
            );
        }

        let exported = write_watch_records(&self.export_path, &extraction.records)?;

        let import = match self.import {
            Some(plan) => Some(run_import(plan, self.observer, &self.export_path).await?),
            None => {
                info!("Letterboxd import not requested");
                None
            }
        };

        let reconciliation = reconcile(exported, import.as_ref());
        log_reconciliation(reconciliation);

        let summary = RunSummary {
            export_path: self.export_path,
            exported,
            extraction: Some(extraction.report),
            import,
            reconciliation,
            duration: start.elapsed(),
        };
        info!(
            operation = "run_complete",
            exported = summary.exported,
            duration_ms = summary.duration.as_millis() as u64,
            "Run finished"
        );
        Ok(summary)
    }
}

/// Import a previously exported file, reconciling against its data rows
pub async fn import_existing_file(
    plan: ImportPlan<'_>,
    path: &Path,
    observer: Option<StepObserver>,
) -> Result<RunSummary, PipelineError> {
    let start = Instant::now();
    let rows = count_rows(path)?;
    info!(operation = "import_start", file = %path.display(), rows, "Importing existing export file");

    let result = run_import(plan, observer, path).await?;

    let reconciliation = reconcile(rows, Some(&result));
    log_reconciliation(reconciliation);

    Ok(RunSummary {
        export_path: path.to_path_buf(),
        exported: rows,
        extraction: None,
        import: Some(result),
        reconciliation,
        duration: start.elapsed(),
    })
}

async fn run_import(
    plan: ImportPlan<'_>,
    observer: Option<StepObserver>,
    path: &Path,
) -> Result<ImportResult, PipelineError> {
    let mut importer = LetterboxdImporter::new(plan.launcher, plan.credentials, plan.settings);
    if let Some(observer) = observer {
        importer = importer.with_step_observer(observer);
    }
    importer.import_watched_films(path).await
}

fn log_reconciliation(reconciliation: Reconciliation) {
    match reconciliation {
        Reconciliation::NotImported => {}
        Reconciliation::Matched { count } => {
            info!(count, "Letterboxd imported every exported film");
        }
        Reconciliation::Mismatch { exported, imported } => {
            warn!(exported, imported, "Letterboxd imported a different number of films than were exported");
        }
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }
}
