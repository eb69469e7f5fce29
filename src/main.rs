mod commands;
mod render;
mod utils;

use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use medsync_core::{
    FileConfigStore, IcsDirectoryStore, JsonFileProvider, Settings, SyncEngine, logging,
};

use crate::commands::Engine;

#[derive(Parser)]
#[command(name = "medsync")]
#[command(about = "Sync medication intakes and medical appointments into your calendar")]
struct Cli {
    /// Show debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the calendars you can sync to
    Calendars,
    /// Check calendar access
    Permission {
        /// Ask for access if it can still be granted
        #[arg(long)]
        request: bool,
    },
    /// Show what a sync would do
    Summary {
        #[arg(long)]
        json: bool,
    },
    /// Sync events to the selected calendar
    #[command(group(ArgGroup::new("unattended").args(["yes", "auto"]).multiple(true)))]
    Sync {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Print the result as JSON (needs --yes or --auto, no prompt is shown)
        #[arg(long, requires = "unattended")]
        json: bool,

        /// Only sync if auto sync is enabled, without prompting
        #[arg(long)]
        auto: bool,
    },
    /// Remove every synced event from the calendar
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show or change sync options
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    Show,
    /// Pick the calendar to sync to
    Select { calendar_id: String },
    /// Turn automatic sync on
    Enable,
    /// Turn automatic sync off
    Disable,
    /// Turn one category on or off (intake, doctor, pharmacy, lab, renewal)
    Category { name: String, state: Toggle },
    /// Restore default options (synced events are kept)
    Reset,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_with_level(if cli.verbose { "debug" } else { "warn" });

    let engine = build_engine()?;

    match cli.command {
        Commands::Calendars => commands::calendars::run(&engine).await,
        Commands::Permission { request } => commands::permission::run(&engine, request).await,
        Commands::Summary { json } => commands::summary::run(&engine, json).await,
        Commands::Sync { yes, json, auto } => {
            commands::sync::run(&engine, yes, json, auto).await
        }
        Commands::Clear { yes } => commands::clear::run(&engine, yes).await,
        Commands::Config { action } => {
            commands::config::run(&engine, action.unwrap_or(ConfigAction::Show)).await
        }
    }
}

fn build_engine() -> Result<Engine> {
    let settings = Settings::load()?;

    let engine = SyncEngine::new(
        JsonFileProvider::new(settings.domain_export_path()),
        IcsDirectoryStore::new(settings.calendar_path()),
        FileConfigStore::new(settings.sync_state_path()),
        settings.clock()?,
    )
    .with_anchor(settings.anchor()?);

    Ok(engine)
}
