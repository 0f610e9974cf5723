use super::ui::ImportProgress;
use super::AppContext;
use crate::output::Output;
use color_eyre::eyre::Context;
use color_eyre::Result;
use plexboxd_sources::ChromiumLauncher;
use serde_json::json;

pub async fn run_init(ctx: &AppContext, output: &Output) -> Result<()> {
    ctx.paths
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create {}: {}", ctx.paths.config_dir().display(), e))?;
    let launcher = ctx.browser_launcher(&ctx.config);
    provision(&launcher, output).await
}

pub async fn provision(launcher: &ChromiumLauncher, output: &Output) -> Result<()> {
    let progress = ImportProgress::new(output);
    progress.set_message("Preparing Chromium");
    let result = launcher.provision().await;
    progress.finish();

    let executable = result.wrap_err("Could not prepare a browser for the Letterboxd import")?;
    output.success(format!("Browser ready: {}", executable.display()));
    output.json(&json!({
        "type": "browser",
        "executable": executable.display().to_string(),
    }));
    Ok(())
}
