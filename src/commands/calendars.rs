use anyhow::Result;
use owo_colors::OwoColorize;

use crate::commands::Engine;
use crate::render::Render;

pub async fn run(engine: &Engine) -> Result<()> {
    let calendars = engine.list_calendars().await;
    let selected = engine.config().selected_calendar_id;

    if calendars.is_empty() {
        println!("{}", "No calendars found".dimmed());
        println!(
            "{}",
            "Run `medsync permission --request` to set up calendar access".dimmed()
        );
        return Ok(());
    }

    for calendar in &calendars {
        let marker = if selected.as_deref() == Some(calendar.id.as_str()) {
            "●".green().to_string()
        } else {
            " ".to_string()
        };
        println!("{} {}", marker, calendar.render());
    }

    if selected.is_none() {
        println!();
        println!(
            "{}",
            "Pick one with `medsync config select <calendar-id>`".dimmed()
        );
    }

    Ok(())
}
