use anyhow::Result;
use owo_colors::OwoColorize;

use crate::commands::Engine;
use crate::render::Render;

pub async fn run(engine: &Engine, request: bool) -> Result<()> {
    let state = engine.check_permission().await;

    if !request || state.granted {
        println!("{}", state.render());
        return Ok(());
    }

    if !state.can_request {
        println!("{}", state.render());
        anyhow::bail!("Calendar access was denied and cannot be requested again");
    }

    if engine.request_permission().await {
        println!("{}", engine.check_permission().await.render());
        Ok(())
    } else {
        println!("{}", "Access was not granted".red());
        anyhow::bail!("Calendar access not granted")
    }
}
