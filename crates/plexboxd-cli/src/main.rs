use clap::{ArgAction, Parser, Subcommand};
use commands::{config, import, init, sync, AppContext};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "plex2letterboxd")]
#[command(about = "Export watched movies from Plex and import them into Letterboxd")]
#[command(version)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Config file (defaults to config.toml in the config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Base directory for config, credentials, logs and the downloaded browser
    #[arg(long, global = true, env = "PLEX2LETTERBOXD_HOME", value_name = "DIR", hide_env_values = true)]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export watched movies from Plex to CSV, then import the file into Letterboxd
    #[command(long_about = "Read every movie section of the Plex library, write the watched films to a Letterboxd import CSV, then sign in to Letterboxd with a headless browser and import the file. Use --no-import to stop after the export.")]
    Sync(sync::SyncArgs),

    /// Import an existing CSV file into Letterboxd
    Import(import::ImportArgs),

    /// Locate or download Chromium, then exit
    #[command(long_about = "Prepare the browser used for the Letterboxd import: use the configured executable or a system Chromium, otherwise download one into the data directory. No data is read or uploaded.")]
    Init,

    /// Inspect or edit configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the merged configuration (secrets masked)
    Show {
        /// Print secrets in full
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },

    /// Store the Plex token and Letterboxd password in the credentials file
    Credentials {
        /// Plex token (prompted when omitted)
        #[arg(long)]
        plex_token: Option<String>,

        /// Letterboxd username, saved to config.toml
        #[arg(long)]
        letterboxd_username: Option<String>,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let ctx = AppContext::load(cli.config, cli.home)?;

    logging::init_logging(&logging::LogSettings::from_config(cli.verbose, cli.quiet, &ctx.config.logging))
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Sync(args) => sync::run_sync(args, &ctx, &output).await,
        Commands::Import(args) => import::run_import(args, &ctx, &output).await,
        Commands::Init => init::run_init(&ctx, &output).await,
        Commands::Config { cmd } => config::run_config(cmd, &ctx, &output),
    }
}
