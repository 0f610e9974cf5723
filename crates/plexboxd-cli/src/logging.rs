use anyhow::Result;
use plexboxd_config::LoggingConfig;
use std::io;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, time::ChronoUtc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

const VERBOSE_DIRECTIVE: &str = "debug,hyper::proto::h1=warn,hyper::client::pool=warn,chromiumoxide::conn=warn";

#[derive(Debug, Clone, Default)]
pub struct LogSettings {
    pub verbose: u8,
    pub quiet: bool,
    pub configured_level: Option<String>,
    pub json: Option<bool>,
    pub file: Option<PathBuf>,
}

impl LogSettings {
    pub fn from_config(verbose: u8, quiet: bool, config: &LoggingConfig) -> Self {
        Self {
            verbose,
            quiet,
            configured_level: config.level.clone(),
            json: config.json,
            file: config.file.clone(),
        }
    }
}

/// Filter directive, first match wins: -q, -v/-vv, RUST_LOG, LOG_LEVEL, config, "info"
pub fn filter_directive(
    settings: &LogSettings,
    rust_log: Option<String>,
    log_level: Option<String>,
) -> String {
    if settings.quiet {
        return "error".to_string();
    }
    match settings.verbose {
        0 => {}
        1 => return VERBOSE_DIRECTIVE.to_string(),
        _ => return "trace".to_string(),
    }

    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    if let Some(directive) = non_empty(rust_log) {
        return directive;
    }
    if let Some(level) = non_empty(log_level).or_else(|| non_empty(settings.configured_level.clone())) {
        return normalize_level(&level);
    }
    "info".to_string()
}

/// Accept the level names of other loggers ("warning", "fatal", "panic")
fn normalize_level(level: &str) -> String {
    match level.trim().to_lowercase().as_str() {
        "warning" => "warn".to_string(),
        "fatal" | "panic" => "error".to_string(),
        other => other.to_string(),
    }
}

pub fn init_logging(settings: &LogSettings) -> Result<()> {
    let directive = filter_directive(
        settings,
        std::env::var("RUST_LOG").ok(),
        std::env::var("LOG_LEVEL").ok(),
    );
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

    let json = match std::env::var("RUST_LOG_JSON") {
        Ok(v) => v == "true",
        Err(_) => settings.json.unwrap_or_else(|| !io::stdout().is_terminal()),
    };

    let registry = Registry::default().with(filter);

    if let Some(log_path) = &settings.file {
        let file_appender = rolling_appender(log_path)?;

        if json {
            let json_layer = fmt::layer()
                .json()
                .with_timer(ChronoUtc::rfc_3339())
                .with_writer(file_appender);
            registry.with(json_layer).init();
        } else {
            let fmt_layer = fmt::layer()
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(false)
                .with_writer(file_appender);
            registry.with(fmt_layer).init();
        }
    } else if json {
        let json_layer = fmt::layer()
            .json()
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(io::stderr);
        registry.with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer()
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(io::stderr);
        registry.with(fmt_layer).init();
    }

    Ok(())
}

/// Daily rotation: plex2letterboxd.log becomes plex2letterboxd.2026-10-14 etc.
fn rolling_appender(log_path: &Path) -> Result<RollingFileAppender> {
    let log_dir = log_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(log_dir)?;

    let log_filename = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid log filename: {}", log_path.display()))?;
    let log_prefix = log_filename.rsplitn(2, '.').nth(1).unwrap_or(log_filename);

    Ok(RollingFileAppender::new(Rotation::DAILY, log_dir, log_prefix))
}
