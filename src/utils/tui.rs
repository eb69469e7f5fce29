use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};

pub fn create_spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["-", "\\", "|", "/"])
        .template("{msg} {spinner}")
    {
        spinner.set_style(style);
    }
    spinner.set_message(message.into());
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

/// Ask a yes/no question, defaulting to no. `skip` answers yes without asking.
pub fn confirm(prompt: String, skip: bool) -> anyhow::Result<bool> {
    if skip {
        return Ok(true);
    }

    println!();
    Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}
