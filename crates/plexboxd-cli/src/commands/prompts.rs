use color_eyre::eyre::eyre;
use color_eyre::Result;
use dialoguer::{Input, Password};
use std::io::{self, IsTerminal};

/// Prompts need a terminal on both ends
pub fn can_prompt() -> bool {
    io::stdin().is_terminal() && io::stderr().is_terminal()
}

/// dialoguer appends its own ": " suffix
fn prompt_label(prompt: &str) -> &str {
    prompt.trim_end().trim_end_matches(':').trim_end()
}

/// Masked input. With `allow_empty` an empty answer is returned as "".
pub fn prompt_secret(prompt: &str, allow_empty: bool) -> Result<String> {
    Password::new()
        .with_prompt(prompt_label(prompt))
        .allow_empty_password(allow_empty)
        .interact()
        .map_err(|e| eyre!("Failed to read password: {}", e))
}

/// One visible line, trimmed
pub fn prompt_line(prompt: &str) -> Result<String> {
    let line = Input::<String>::new()
        .with_prompt(prompt_label(prompt))
        .allow_empty(true)
        .interact_text()
        .map_err(|e| eyre!("Failed to read input: {}", e))?;
    Ok(line.trim().to_string())
}
