pub mod config;
pub mod import;
pub mod init;
pub mod prompts;
pub mod sync;
pub mod ui;

use crate::output::Output;
use clap::builder::BoolishValueParser;
use clap::Args;
use color_eyre::eyre::{eyre, Report};
use color_eyre::Result;
use plexboxd_config::{Config, CredentialStore, PathManager};
use plexboxd_core::{ImportPlan, Reconciliation, RunSummary};
use plexboxd_sources::{ChromiumLauncher, ImportSettings, LetterboxdCredentials, PipelineError};
use std::path::PathBuf;

/// Paths plus the config file merged with stored credentials
pub struct AppContext {
    pub paths: PathManager,
    pub config_file: PathBuf,
    pub config: Config,
}

impl AppContext {
    pub fn load(config_file: Option<PathBuf>, home: Option<PathBuf>) -> Result<Self> {
        let paths = PathManager::resolve(home);
        let config_file = config_file.unwrap_or_else(|| paths.config_file());

        let mut config = Config::load_or_default(&config_file)
            .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;

        let credentials_file = paths.credentials_file();
        let store = CredentialStore::open(credentials_file.clone())
            .map_err(|e| eyre!("Failed to load credentials from {}: {:#}", credentials_file.display(), e))?;
        config.merge_credentials(&store);

        Ok(Self {
            paths,
            config_file,
            config,
        })
    }

    pub fn browser_launcher(&self, config: &Config) -> ChromiumLauncher {
        ChromiumLauncher::new(
            config.letterboxd.headless,
            config.browser.executable.clone(),
            self.paths.browser_dir(),
        )
    }
}

/// Letterboxd flags shared by `sync` and `import`
#[derive(Args, Debug, Clone, Default)]
pub struct LetterboxdArgs {
    /// Letterboxd username
    #[arg(long, env = "LETTERBOXD_USERNAME")]
    pub letterboxd_username: Option<String>,

    /// Letterboxd password (prompted when missing and a terminal is attached)
    #[arg(long, env = "LETTERBOXD_PASSWORD", hide_env_values = true)]
    pub letterboxd_password: Option<String>,

    /// Run the browser without a window
    #[arg(long, env = "HEADLESS", value_name = "BOOL", value_parser = BoolishValueParser::new())]
    pub headless: Option<bool>,
}

/// Ask for the Letterboxd password when nothing provided one
pub fn ensure_letterboxd_password(config: &mut Config) -> Result<()> {
    let missing = config.letterboxd.password.as_deref().map_or(true, str::is_empty);
    if missing && !config.letterboxd.username.is_empty() && prompts::can_prompt() {
        let prompt = format!("Letterboxd password for {}: ", config.letterboxd.username);
        config.letterboxd.password = Some(prompts::prompt_secret(&prompt, false)?);
    }
    Ok(())
}

pub fn import_plan<'a>(config: &Config, launcher: &'a ChromiumLauncher) -> ImportPlan<'a> {
    ImportPlan {
        launcher,
        credentials: LetterboxdCredentials {
            username: config.letterboxd.username.clone(),
            password: config.letterboxd.password.clone().unwrap_or_default(),
        },
        settings: ImportSettings::from_config(&config.letterboxd),
    }
}

pub fn pipeline_failure(err: PipelineError, output: &Output) -> Report {
    if let Some(step) = err.step() {
        output.error(format!("Letterboxd import failed while {}", step.label().to_lowercase()));
        output.warn("Check the import page on Letterboxd before running the import again");
    }
    Report::new(err)
}

pub fn report_summary(summary: &RunSummary, output: &Output) {
    if output.format() != crate::output::OutputFormat::Human {
        match serde_json::to_value(summary) {
            Ok(value) => output.json(&value),
            Err(e) => output.error(format!("Failed to serialize run summary: {}", e)),
        }
        return;
    }

    if let Some(report) = &summary.extraction {
        for failure in &report.sections_failed {
            output.warn(format!("Skipped library section '{}': {}", failure.title, failure.error));
        }
        output.success(format!(
            "Exported {} watched films to {}",
            summary.exported,
            summary.export_path.display()
        ));
    }

    match summary.reconciliation {
        Reconciliation::NotImported => output.info("Letterboxd import skipped"),
        Reconciliation::Matched { count } => {
            output.success(format!("Letterboxd imported {} films", count));
        }
        Reconciliation::Mismatch { exported, imported } => {
            output.warn(format!(
                "Letterboxd imported {} films but the file has {}; films it could not match were left out",
                imported, exported
            ));
        }
    }
}
