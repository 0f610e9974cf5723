use crate::error::PipelineError;
use crate::letterboxd::progress::parse_saved_count;
use crate::traits::{BrowserLauncher, BrowserSession};
use plexboxd_config::{LetterboxdConfig, WaitPolicyKind};
use plexboxd_models::ImportResult;
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, trace, warn};

pub const SIGN_IN_PATH: &str = "/sign-in/";
pub const IMPORT_PATH: &str = "/import/";

const USERNAME_FIELD: &str = "#field-username";
const PASSWORD_FIELD: &str = "#field-password";
const SIGN_IN_BUTTON: &str = ".formactions button.standalone-flow-button";
const UPLOAD_INPUT: &str = "input#upload-imdb-import";
const MATCHED_TITLES: &str = "ul#import-films li.import-film p.import-original";
const SUBMIT_MATCHED: &str = "a.submit-matched-films";
const IMPORT_PROGRESS: &str = ".import-progress";

/// Import wizard stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportStep {
    Init,
    NavigateSignIn,
    FillCredentials,
    SubmitLogin,
    AwaitLoginSettle,
    NavigateImport,
    UploadFile,
    AwaitProcessing,
    ReadMatchedList,
    SubmitMatched,
    AwaitImportCompletion,
    ReadProgressText,
    ParseResult,
    Closed,
}

impl ImportStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStep::Init => "init",
            ImportStep::NavigateSignIn => "navigate_sign_in",
            ImportStep::FillCredentials => "fill_credentials",
            ImportStep::SubmitLogin => "submit_login",
            ImportStep::AwaitLoginSettle => "await_login_settle",
            ImportStep::NavigateImport => "navigate_import",
            ImportStep::UploadFile => "upload_file",
            ImportStep::AwaitProcessing => "await_processing",
            ImportStep::ReadMatchedList => "read_matched_list",
            ImportStep::SubmitMatched => "submit_matched",
            ImportStep::AwaitImportCompletion => "await_import_completion",
            ImportStep::ReadProgressText => "read_progress_text",
            ImportStep::ParseResult => "parse_result",
            ImportStep::Closed => "closed",
        }
    }

    /// Short human label for progress displays
    pub fn label(&self) -> &'static str {
        match self {
            ImportStep::Init => "Opening browser",
            ImportStep::NavigateSignIn => "Loading sign-in page",
            ImportStep::FillCredentials => "Entering credentials",
            ImportStep::SubmitLogin => "Signing in",
            ImportStep::AwaitLoginSettle => "Waiting for sign-in",
            ImportStep::NavigateImport => "Loading import page",
            ImportStep::UploadFile => "Uploading file",
            ImportStep::AwaitProcessing => "Waiting for film matching",
            ImportStep::ReadMatchedList => "Reading matched films",
            ImportStep::SubmitMatched => "Confirming import",
            ImportStep::AwaitImportCompletion => "Waiting for import to finish",
            ImportStep::ReadProgressText => "Reading import status",
            ImportStep::ParseResult => "Reading import status",
            ImportStep::Closed => "Closing browser",
        }
    }
}

impl fmt::Display for ImportStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
pub struct LetterboxdCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LetterboxdCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LetterboxdCredentials")
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPolicy {
    /// Sleep for the whole interval
    Fixed,
    /// Check the page every `interval` until ready, the wait interval is the deadline
    Poll { interval: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitPlan {
    pub policy: WaitPolicy,
    pub login_settle: Duration,
    pub processing: Duration,
    pub completion: Duration,
}

impl Default for WaitPlan {
    fn default() -> Self {
        Self {
            policy: WaitPolicy::Fixed,
            login_settle: Duration::from_secs(5),
            processing: Duration::from_secs(20),
            completion: Duration::from_secs(20),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSettings {
    pub base_url: String,
    pub waits: WaitPlan,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self::from_config(&LetterboxdConfig::default())
    }
}

impl ImportSettings {
    pub fn from_config(config: &LetterboxdConfig) -> Self {
        let waits = &config.waits;
        let policy = match waits.policy {
            WaitPolicyKind::Fixed => WaitPolicy::Fixed,
            WaitPolicyKind::Poll => WaitPolicy::Poll {
                interval: Duration::from_millis(waits.poll_interval_ms.max(1)),
            },
        };

        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            waits: WaitPlan {
                policy,
                login_settle: Duration::from_secs(waits.login_settle_secs),
                processing: Duration::from_secs(waits.processing_secs),
                completion: Duration::from_secs(waits.completion_secs),
            },
        }
    }

    pub fn sign_in_url(&self) -> String {
        format!("{}{}", self.base_url, SIGN_IN_PATH)
    }

    pub fn import_url(&self) -> String {
        format!("{}{}", self.base_url, IMPORT_PATH)
    }
}

/// Page state a wait is synchronizing on
#[derive(Debug, Clone, Copy)]
enum Readiness {
    LeftSignIn,
    Present(&'static str),
    ProgressReported,
}

/// Called with each step as it starts
pub type StepObserver = Box<dyn Fn(ImportStep) + Send + Sync>;

/// Drives one browser session through the Letterboxd import wizard.
///
/// Steps run strictly in order and the first failure ends the run. The
/// session is closed on every exit path.
pub struct LetterboxdImporter<'a> {
    launcher: &'a dyn BrowserLauncher,
    credentials: LetterboxdCredentials,
    settings: ImportSettings,
    observer: Option<StepObserver>,
}

impl<'a> LetterboxdImporter<'a> {
    pub fn new(
        launcher: &'a dyn BrowserLauncher,
        credentials: LetterboxdCredentials,
        settings: ImportSettings,
    ) -> Self {
        Self {
            launcher,
            credentials,
            settings,
            observer: None,
        }
    }

    /// Called as each step starts
    pub fn with_step_observer(mut self, observer: impl Fn(ImportStep) + Send + Sync + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub async fn import_watched_films(&self, file: &Path) -> Result<ImportResult, PipelineError> {
        info!(
            username = %self.credentials.username,
            file = %file.display(),
            "Starting Letterboxd import"
        );

        self.enter(ImportStep::Init);
        let mut session = self.launcher.launch().await.map_err(|e| match e {
            PipelineError::Automation { .. } => e,
            other => PipelineError::automation(ImportStep::Init, other),
        })?;

        let outcome = self.drive(&*session, file).await;

        self.enter(ImportStep::Closed);
        let closed = session.close().await;

        match (outcome, closed) {
            (Ok(result), Ok(())) => {
                info!(imported = result.imported_count, "Letterboxd import finished");
                Ok(result)
            }
            (Ok(_), Err(e)) => {
                error!(step = %ImportStep::Closed, error = %format!("{:#}", e), "Failed to close browser session");
                Err(PipelineError::automation(ImportStep::Closed, format!("{:#}", e)))
            }
            (Err(err), close_result) => {
                if let Err(close_err) = close_result {
                    warn!(error = %format!("{:#}", close_err), "Failed to close browser session after import failure");
                }
                warn!("Letterboxd import aborted; check the import page on the site before retrying");
                Err(err)
            }
        }
    }

    async fn drive(&self, session: &dyn BrowserSession, file: &Path) -> Result<ImportResult, PipelineError> {
        let sign_in_url = self.settings.sign_in_url();
        self.step(ImportStep::NavigateSignIn, session.goto(&sign_in_url)).await?;

        self.step(ImportStep::FillCredentials, async {
            session.fill(USERNAME_FIELD, &self.credentials.username).await?;
            session.fill(PASSWORD_FIELD, &self.credentials.password).await
        })
        .await?;

        self.step(ImportStep::SubmitLogin, session.click(SIGN_IN_BUTTON)).await?;

        let waits = &self.settings.waits;
        self.wait_for(session, ImportStep::AwaitLoginSettle, waits.login_settle, Readiness::LeftSignIn)
            .await?;

        let import_url = self.settings.import_url();
        self.step(ImportStep::NavigateImport, session.goto(&import_url)).await?;

        self.step(ImportStep::UploadFile, session.set_input_file(UPLOAD_INPUT, file)).await?;

        self.wait_for(
            session,
            ImportStep::AwaitProcessing,
            waits.processing,
            Readiness::Present(SUBMIT_MATCHED),
        )
        .await?;

        let matched = self
            .step(ImportStep::ReadMatchedList, session.all_text_contents(MATCHED_TITLES))
            .await?;
        let matched_titles: Vec<String> = matched.iter().map(|t| t.trim().to_string()).collect();
        for title in &matched_titles {
            info!(title = %title, "Matched film");
        }
        info!(matched = matched_titles.len(), "Read matched film list");

        self.step(ImportStep::SubmitMatched, session.click(SUBMIT_MATCHED)).await?;

        self.wait_for(
            session,
            ImportStep::AwaitImportCompletion,
            waits.completion,
            Readiness::ProgressReported,
        )
        .await?;

        let progress = self
            .step(ImportStep::ReadProgressText, session.text_content(IMPORT_PROGRESS))
            .await?;
        info!(progress = %progress.trim(), "Import progress");

        self.enter(ImportStep::ParseResult);
        let imported_count = parse_saved_count(&progress).map_err(|e| {
            error!(step = %ImportStep::ParseResult, error = %e, "Import step failed");
            e
        })?;

        Ok(ImportResult {
            imported_count,
            matched_titles,
        })
    }

    /// Run one browser step, tagging any failure with the step
    async fn step<T>(
        &self,
        step: ImportStep,
        action: impl Future<Output = anyhow::Result<T>>,
    ) -> Result<T, PipelineError> {
        self.enter(step);
        action.await.map_err(|e| {
            let message = format!("{:#}", e);
            error!(step = %step, error = %message, "Import step failed");
            PipelineError::automation(step, message)
        })
    }

    async fn wait_for(
        &self,
        session: &dyn BrowserSession,
        step: ImportStep,
        limit: Duration,
        readiness: Readiness,
    ) -> Result<(), PipelineError> {
        self.enter(step);
        match self.settings.waits.policy {
            WaitPolicy::Fixed => {
                sleep(limit).await;
                Ok(())
            }
            WaitPolicy::Poll { interval } => {
                let deadline = Instant::now() + limit;
                loop {
                    match is_ready(session, readiness).await {
                        Ok(true) => return Ok(()),
                        Ok(false) => {}
                        Err(e) => trace!(step = %step, error = %format!("{:#}", e), "Readiness check failed"),
                    }

                    let now = Instant::now();
                    if now >= deadline {
                        let message = format!("page not ready after {}s", limit.as_secs());
                        error!(step = %step, error = %message, "Import step failed");
                        return Err(PipelineError::automation(step, message));
                    }
                    sleep(interval.min(deadline - now)).await;
                }
            }
        }
    }

    fn enter(&self, step: ImportStep) {
        debug!(step = %step, "Entering import step");
        if let Some(observer) = &self.observer {
            observer(step);
        }
    }
}

async fn is_ready(session: &dyn BrowserSession, readiness: Readiness) -> anyhow::Result<bool> {
    match readiness {
        Readiness::LeftSignIn => Ok(!session.current_url().await?.contains(SIGN_IN_PATH)),
        Readiness::Present(selector) => session.exists(selector).await,
        Readiness::ProgressReported => {
            if !session.exists(IMPORT_PROGRESS).await? {
                return Ok(false);
            }
            let text = session.text_content(IMPORT_PROGRESS).await?;
            Ok(parse_saved_count(&text).is_ok())
        }
    }
}
