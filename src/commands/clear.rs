use anyhow::Result;
use owo_colors::OwoColorize;

use crate::commands::Engine;
use crate::render::{Render, pluralize};
use crate::utils::tui;

pub async fn run(engine: &Engine, yes: bool) -> Result<()> {
    let synced = engine.load_config()?.event_mapping.len();

    if synced == 0 {
        println!("{}", "Nothing to clear".dimmed());
        return Ok(());
    }

    let prompt = format!(
        "Remove {} synced {} from your calendar?",
        synced,
        pluralize("event", synced)
    );
    if !tui::confirm(prompt, yes)? {
        println!("{}", "Clear cancelled".dimmed());
        return Ok(());
    }

    let spinner = tui::create_spinner("Removing events...");
    let result = engine.clear_synced_events().await;
    spinner.finish_and_clear();

    println!("{}", result.render());

    if !result.success {
        anyhow::bail!("Some events could not be removed");
    }

    Ok(())
}
