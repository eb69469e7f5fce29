use anyhow::Result;
use medsync_core::SyncResult;
use owo_colors::OwoColorize;

use crate::commands::Engine;
use crate::render::{Render, pluralize};
use crate::utils::tui;

pub async fn run(engine: &Engine, yes: bool, json: bool, auto: bool) -> Result<()> {
    if auto {
        return run_scheduled(engine, json).await;
    }

    // Preview first, so the user confirms before anything is written
    if !json {
        let spinner = tui::create_spinner("Loading events...");
        let summary = engine.summary().await;
        spinner.finish_and_clear();
        let summary = summary?;

        println!("{}", summary.render());

        let changes = summary.to_create + summary.already_synced + summary.to_delete;
        if changes == 0 {
            return Ok(());
        }

        let calendar = engine
            .load_config()?
            .selected_calendar_id
            .unwrap_or_else(|| "?".to_string());
        let prompt = format!(
            "Write {} {} to calendar {}?",
            changes,
            pluralize("change", changes),
            calendar
        );
        if !tui::confirm(prompt, yes)? {
            println!("{}", "Sync cancelled".dimmed());
            return Ok(());
        }
    }

    let spinner = (!json).then(|| tui::create_spinner("Syncing..."));
    let result = engine.sync().await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    report(&result, json)
}

/// Unattended pass for schedulers: respects the auto sync switch and never prompts.
async fn run_scheduled(engine: &Engine, json: bool) -> Result<()> {
    match engine.sync_if_enabled().await {
        Some(result) => report(&result, json),
        None => {
            if !json {
                println!("{}", "Auto sync is off, skipping".dimmed());
            }
            Ok(())
        }
    }
}

fn report(result: &SyncResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        println!("{}", result.render());
    }

    if !result.success {
        anyhow::bail!(
            "Sync failed with {} {}",
            result.errors.len(),
            pluralize("error", result.errors.len())
        );
    }

    Ok(())
}
