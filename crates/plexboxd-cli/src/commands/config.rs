use super::{prompts, AppContext};
use crate::output::{Output, OutputFormat};
use crate::ConfigCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use owo_colors::OwoColorize;
use plexboxd_config::{Config, CredentialStore};
use serde_json::json;
use std::path::PathBuf;

pub fn run_config(cmd: ConfigCommands, ctx: &AppContext, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show { full } => show_config(full, ctx, output),
        ConfigCommands::Credentials {
            plex_token,
            letterboxd_username,
        } => configure_credentials(plex_token, letterboxd_username, ctx, output),
    }
}

fn known_paths(ctx: &AppContext) -> Vec<(&'static str, PathBuf)> {
    vec![
        ("config_file", ctx.config_file.clone()),
        ("credentials_file", ctx.paths.credentials_file()),
        ("data_dir", ctx.paths.data_dir().to_path_buf()),
        ("browser_dir", ctx.paths.browser_dir()),
        ("log_dir", ctx.paths.log_dir().to_path_buf()),
    ]
}

fn show_config(full: bool, ctx: &AppContext, output: &Output) -> Result<()> {
    let shown = if full { ctx.config.clone() } else { ctx.config.masked() };

    match output.format() {
        OutputFormat::Human => {
            if output.is_quiet() {
                return Ok(());
            }
            if !ctx.config_file.exists() {
                output.warn(format!(
                    "Configuration file not found at {}, showing defaults",
                    ctx.config_file.display()
                ));
            }

            println!("{}", "Paths".bright_cyan().bold());
            for (name, path) in known_paths(ctx) {
                println!("  {:<18}{}", format!("{}:", name.replace('_', " ")), path.display());
            }
            println!();
            println!("{}", "Configuration".bright_cyan().bold());
            let rendered = toml::to_string_pretty(&shown).map_err(|e| eyre!("Failed to render config: {}", e))?;
            println!("{}", rendered);
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            let paths: serde_json::Map<String, serde_json::Value> = known_paths(ctx)
                .into_iter()
                .map(|(name, path)| (name.to_string(), json!(path.display().to_string())))
                .collect();
            output.json(&json!({
                "paths": paths,
                "config": serde_json::to_value(&shown)?,
            }));
        }
    }
    Ok(())
}

fn configure_credentials(
    plex_token: Option<String>,
    letterboxd_username: Option<String>,
    ctx: &AppContext,
    output: &Output,
) -> Result<()> {
    let interactive = prompts::can_prompt();
    if !interactive && plex_token.is_none() {
        return Err(eyre!("No terminal attached; pass --plex-token or set secrets in the environment"));
    }

    let credentials_file = ctx.paths.credentials_file();
    let mut store = CredentialStore::open(credentials_file.clone())
        .map_err(|e| eyre!("Failed to load credentials from {}: {:#}", credentials_file.display(), e))?;

    let token = match plex_token {
        Some(token) => token,
        None => prompts::prompt_secret("Plex token (empty keeps the stored one)", true)?,
    };
    if !token.trim().is_empty() {
        store.set_plex_token(token.trim());
    }

    let username = match letterboxd_username {
        Some(username) => Some(username),
        None if interactive => Some(prompts::prompt_line("Letterboxd username (empty to skip)")?),
        None => None,
    };
    if let Some(username) = username.filter(|u| !u.is_empty()) {
        // Reload the file so merged secrets never land in config.toml
        let mut file_config = Config::load_or_default(&ctx.config_file)
            .map_err(|e| eyre!("Failed to load config from {}: {}", ctx.config_file.display(), e))?;
        file_config.letterboxd.username = username;
        file_config
            .save_to_file(&ctx.config_file)
            .map_err(|e| eyre!("Failed to save config to {}: {}", ctx.config_file.display(), e))?;
        output.success(format!("Saved Letterboxd username to {}", ctx.config_file.display()));
    }

    if interactive {
        let password = prompts::prompt_secret("Letterboxd password (empty keeps the stored one)", true)?;
        if !password.is_empty() {
            store.set_letterboxd_password(password);
        }
    }

    store
        .save()
        .map_err(|e| eyre!("Failed to save credentials to {}: {}", store.path().display(), e))?;
    output.success(format!("Saved credentials to {}", store.path().display()));
    Ok(())
}
