//! Colored terminal rendering for medsync types.

use chrono::{DateTime, Utc};
use medsync_core::config::{FuturePolicy, HistoryPolicy};
use medsync_core::sync::OpKind;
use medsync_core::{
    ClearResult, EventType, NativeCalendar, PermissionState, SyncConfig, SyncResult, SyncSummary,
};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for OpKind {
    fn render(&self) -> String {
        let symbol = self.to_string();
        match self {
            OpKind::Create => symbol.green().to_string(),
            OpKind::Recreate => symbol.yellow().to_string(),
            OpKind::Prune => symbol.red().to_string(),
        }
    }
}

pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

fn render_day(instant: Option<DateTime<Utc>>) -> String {
    instant
        .map(|i| i.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn render_op_line(kind: OpKind, count: usize, label: &str) -> Option<String> {
    if count == 0 {
        return None;
    }
    let text = format!("{count} {} {label}", pluralize("event", count));
    let text = match kind {
        OpKind::Create => text.green().to_string(),
        OpKind::Recreate => text.yellow().to_string(),
        OpKind::Prune => text.red().to_string(),
    };
    Some(format!("   {} {}", kind.render(), text))
}

impl Render for NativeCalendar {
    fn render(&self) -> String {
        let mut line = format!("📅 {} {}", self.display_name, format!("({})", self.id).dimmed());
        if self.is_primary {
            line.push_str(&format!(" {}", "primary".cyan()));
        }
        if !self.allows_modifications {
            line.push_str(&format!(" {}", "read-only".yellow()));
        }
        line
    }
}

impl Render for PermissionState {
    fn render(&self) -> String {
        if self.granted {
            format!("{} Calendar access granted", "✓".green())
        } else if self.can_request {
            format!(
                "{} Calendar access not granted yet (run `medsync permission --request`)",
                "?".yellow()
            )
        } else {
            format!("{} Calendar access denied", "✗".red())
        }
    }
}

impl Render for SyncSummary {
    fn render(&self) -> String {
        let mut lines = vec![format!(
            "{} {} in window",
            self.total_events,
            pluralize("event", self.total_events)
        )];

        for (category, count) in &self.by_category {
            lines.push(format!("   {:<22} {}", category.to_string(), count));
        }

        lines.push(
            format!(
                "Period {} → {} ({} past, {} upcoming)",
                render_day(self.period_start),
                render_day(self.period_end),
                self.history_count,
                self.future_count
            )
            .dimmed()
            .to_string(),
        );

        let ops = [
            render_op_line(OpKind::Create, self.to_create, "to create"),
            render_op_line(OpKind::Recreate, self.already_synced, "to refresh"),
            render_op_line(OpKind::Prune, self.to_delete, "to remove"),
        ];
        let ops: Vec<String> = ops.into_iter().flatten().collect();
        if ops.is_empty() {
            lines.push("Nothing to sync".dimmed().to_string());
        } else {
            lines.extend(ops);
        }

        lines.join("\n")
    }
}

impl Render for SyncResult {
    fn render(&self) -> String {
        let mut lines = Vec::new();

        if self.success {
            if self.changes() == 0 {
                lines.push("Everything up to date".dimmed().to_string());
            } else {
                lines.push(format!(
                    "{} Synced {} {}",
                    "✓".green(),
                    self.changes(),
                    pluralize("change", self.changes())
                ));
            }
        } else {
            lines.push(format!("{} Sync finished with errors", "✗".red()));
        }

        lines.extend(
            [
                render_op_line(OpKind::Create, self.events_created, "created"),
                render_op_line(OpKind::Recreate, self.events_updated, "refreshed"),
                render_op_line(OpKind::Prune, self.events_deleted, "removed"),
            ]
            .into_iter()
            .flatten(),
        );

        for error in &self.errors {
            lines.push(format!("   {}", error.red()));
        }

        lines.join("\n")
    }
}

impl Render for ClearResult {
    fn render(&self) -> String {
        let mut lines = Vec::new();
        let removed = format!(
            "Removed {} synced {}",
            self.deleted_count,
            pluralize("event", self.deleted_count)
        );

        if self.success {
            lines.push(format!("{} {}", "✓".green(), removed));
        } else {
            lines.push(format!("{} {}", "✗".red(), removed));
            for error in &self.errors {
                lines.push(format!("   {}", error.red()));
            }
        }

        lines.join("\n")
    }
}

fn render_history(policy: &HistoryPolicy) -> String {
    match (policy.keeps_history(), policy.period) {
        (false, _) => "delete".to_string(),
        (true, None) => "keep all".to_string(),
        (true, Some(period)) => format!("keep {} days", period.in_days()),
    }
}

fn render_future(policy: &FuturePolicy) -> String {
    match (policy.syncs_future(), policy.period) {
        (false, _) => "don't sync".to_string(),
        (true, None) => "sync all".to_string(),
        (true, Some(period)) => format!("sync {} days", period.in_days()),
    }
}

fn render_toggle(on: bool) -> String {
    if on {
        "on".green().to_string()
    } else {
        "off".dimmed().to_string()
    }
}

impl Render for SyncConfig {
    fn render(&self) -> String {
        let mut lines = vec!["Sync".bold().to_string()];

        let calendar = self
            .selected_calendar_id
            .clone()
            .unwrap_or_else(|| "none".yellow().to_string());
        lines.push(format!("   Calendar:     {calendar}"));
        lines.push(format!("   Auto sync:    {}", render_toggle(self.sync_enabled)));
        lines.push(format!(
            "   Last sync:    {}",
            self.last_sync_date
                .map(|d| d.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_else(|| "never".to_string())
        ));
        lines.push(format!("   Synced:       {}", self.event_mapping.len()));

        lines.push(String::new());
        lines.push("Categories".bold().to_string());
        for category in EventType::ALL {
            lines.push(format!(
                "   {:<22} {}",
                category.to_string(),
                render_toggle(self.is_category_enabled(category))
            ));
        }

        lines.push(String::new());
        lines.push("Retention".bold().to_string());
        lines.push(format!(
            "   Intakes:      history {}, future {}",
            render_history(&self.intakes.history),
            render_future(&self.intakes.future)
        ));
        lines.push(format!(
            "   Appointments: history {}, future {}",
            render_history(&self.appointments.history),
            render_future(&self.appointments.future)
        ));

        lines.join("\n")
    }
}
