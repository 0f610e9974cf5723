use super::ui::ImportProgress;
use super::{AppContext, LetterboxdArgs};
use crate::output::Output;
use clap::Args;
use color_eyre::eyre::Context;
use color_eyre::Result;
use plexboxd_config::{ConfigOverrides, TimeZonePolicy};
use plexboxd_core::Orchestrator;
use plexboxd_sources::PlexHttpClient;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Plex server URL, e.g. http://127.0.0.1:32400
    #[arg(long, env = "PLEX_URL")]
    pub plex_url: Option<String>,

    /// Plex access token
    #[arg(long, env = "PLEX_TOKEN", hide_env_values = true)]
    pub plex_token: Option<String>,

    /// CSV file to write [default: letterboxd.csv]
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Stop after writing the CSV file
    #[arg(long)]
    pub no_import: bool,

    /// Locate or download Chromium before running
    #[arg(long)]
    pub init_browser: bool,

    /// Zone for watched dates: local or utc
    #[arg(long, value_name = "ZONE")]
    pub timezone: Option<TimeZonePolicy>,

    #[command(flatten)]
    pub letterboxd: LetterboxdArgs,
}

pub async fn run_sync(args: SyncArgs, ctx: &AppContext, output: &Output) -> Result<()> {
    tracing::debug!("Sync command started");

    let mut config = ctx.config.clone();
    config.apply_overrides(ConfigOverrides {
        plex_url: args.plex_url,
        plex_token: args.plex_token,
        letterboxd_username: args.letterboxd.letterboxd_username,
        letterboxd_password: args.letterboxd.letterboxd_password,
        headless: args.letterboxd.headless,
        export_path: args.file,
        timezone: args.timezone,
    });
    config.validate_for_extract()?;

    let import = !args.no_import;
    if import {
        super::ensure_letterboxd_password(&mut config)?;
        config.validate_for_import()?;
    }

    let launcher = ctx.browser_launcher(&config);
    if args.init_browser {
        super::init::provision(&launcher, output).await?;
    }

    let token = config.plex.token.clone().unwrap_or_default();
    let client = PlexHttpClient::new(&config.plex.url, token).wrap_err("Failed to create Plex client")?;
    info!(url = client.base_url(), export = %config.export.path.display(), "Starting sync");

    let progress = ImportProgress::new(output);
    let mut orchestrator = Orchestrator::new(&client, config.export.path.clone())
        .with_timezone(config.export.timezone);
    if import {
        orchestrator = orchestrator
            .with_import(super::import_plan(&config, &launcher))
            .with_step_observer(progress.observer());
    }

    progress.set_message("Reading Plex library");
    let result = orchestrator.run().await;
    progress.finish();

    let summary = result.map_err(|e| super::pipeline_failure(e, output))?;
    super::report_summary(&summary, output);
    Ok(())
}
