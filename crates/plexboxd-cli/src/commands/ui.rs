use crate::output::{Output, OutputFormat};
use indicatif::{ProgressBar, ProgressStyle};
use plexboxd_core::StepObserver;
use plexboxd_sources::ImportStep;
use std::io::IsTerminal;
use std::time::Duration;

/// Spinner for the long browser waits. Hidden unless a human is watching.
pub struct ImportProgress {
    spinner: ProgressBar,
}

impl ImportProgress {
    pub fn new(output: &Output) -> Self {
        let interactive = is_interactive() && output.format() == OutputFormat::Human && !output.is_quiet();
        if !interactive {
            tracing::debug!(operation = "ui_init", mode = "non_interactive", "Progress spinner disabled");
            return Self {
                spinner: ProgressBar::hidden(),
            };
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "),
        );
        spinner.enable_steady_tick(Duration::from_millis(120));
        Self { spinner }
    }

    pub fn set_message(&self, msg: &'static str) {
        self.spinner.set_message(msg);
    }

    /// Mirrors import steps into the spinner message
    pub fn observer(&self) -> StepObserver {
        let spinner = self.spinner.clone();
        Box::new(move |step: ImportStep| spinner.set_message(step.label()))
    }

    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}
