use anyhow::{Context, Result};
use medsync_core::{EventType, Settings};
use owo_colors::OwoColorize;

use crate::commands::Engine;
use crate::render::Render;
use crate::{ConfigAction, Toggle};

pub async fn run(engine: &Engine, action: ConfigAction) -> Result<()> {
    let config = match action {
        ConfigAction::Show => {
            show_paths()?;
            engine.load_config()?
        }
        ConfigAction::Select { calendar_id } => {
            let calendars = engine.list_calendars().await;
            let calendar = calendars
                .iter()
                .find(|c| c.id == calendar_id)
                .with_context(|| format!("Unknown calendar: {calendar_id}"))?;
            if !calendar.allows_modifications {
                anyhow::bail!("Calendar {calendar_id} is read-only");
            }
            engine
                .update_config(|config| config.selected_calendar_id = Some(calendar_id))
                .await?
        }
        ConfigAction::Enable => {
            engine
                .update_config(|config| config.sync_enabled = true)
                .await?
        }
        ConfigAction::Disable => {
            engine
                .update_config(|config| config.sync_enabled = false)
                .await?
        }
        ConfigAction::Category { name, state } => {
            let category = EventType::from_name(&name)
                .with_context(|| format!("Unknown category: {name}"))?;
            let enabled = matches!(state, Toggle::On);
            engine
                .update_config(|config| config.set_category_enabled(category, enabled))
                .await?
        }
        ConfigAction::Reset => engine.reset_config().await?,
    };

    println!("{}", config.render());
    Ok(())
}

fn show_paths() -> Result<()> {
    let settings = Settings::load()?;

    println!("{}", "Paths".bold());
    println!(
        "   Settings:     {}",
        Settings::config_path()?.display().dimmed()
    );
    println!(
        "   Sync state:   {}",
        settings.sync_state_path().display().dimmed()
    );
    println!(
        "   Calendars:    {}",
        settings.calendar_path().display().dimmed()
    );
    println!(
        "   App export:   {}",
        settings.domain_export_path().display().dimmed()
    );
    println!();

    Ok(())
}
