use anyhow::Result;

use crate::commands::Engine;
use crate::render::Render;
use crate::utils::tui;

pub async fn run(engine: &Engine, json: bool) -> Result<()> {
    let spinner = (!json).then(|| tui::create_spinner("Loading events..."));
    let summary = engine.summary().await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let summary = summary?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary.render());
    }

    Ok(())
}
