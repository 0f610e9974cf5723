use super::ui::ImportProgress;
use super::{AppContext, LetterboxdArgs};
use crate::output::Output;
use clap::Args;
use color_eyre::Result;
use plexboxd_config::ConfigOverrides;
use plexboxd_core::import_existing_file;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// CSV file to upload [default: letterboxd.csv]
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub letterboxd: LetterboxdArgs,
}

pub async fn run_import(args: ImportArgs, ctx: &AppContext, output: &Output) -> Result<()> {
    tracing::debug!("Import command started");

    let mut config = ctx.config.clone();
    config.apply_overrides(ConfigOverrides {
        letterboxd_username: args.letterboxd.letterboxd_username,
        letterboxd_password: args.letterboxd.letterboxd_password,
        headless: args.letterboxd.headless,
        export_path: args.file,
        ..ConfigOverrides::default()
    });
    super::ensure_letterboxd_password(&mut config)?;
    config.validate_for_import()?;

    let launcher = ctx.browser_launcher(&config);
    let progress = ImportProgress::new(output);
    let result = import_existing_file(
        super::import_plan(&config, &launcher),
        &config.export.path,
        Some(progress.observer()),
    )
    .await;
    progress.finish();

    let summary = result.map_err(|e| super::pipeline_failure(e, output))?;
    super::report_summary(&summary, output);
    Ok(())
}
