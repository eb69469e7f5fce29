//! Calendar event value objects.
//!
//! A [`CalendarEvent`] is what the engine wants to see in the native
//! calendar for one domain fact. Its `id` is derived from the category and
//! the domain row id, so the same fact yields the same id on every pass.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Domain category an event was projected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Intake,
    DoctorVisit,
    PharmacyVisit,
    LabVisit,
    PrescriptionRenewal,
}

impl EventType {
    /// Every category, in load order.
    pub const ALL: [EventType; 5] = [
        EventType::Intake,
        EventType::DoctorVisit,
        EventType::PharmacyVisit,
        EventType::LabVisit,
        EventType::PrescriptionRenewal,
    ];

    /// Prefix of the stable event id.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            EventType::Intake => "intake",
            EventType::DoctorVisit => "doctor",
            EventType::PharmacyVisit => "pharmacy",
            EventType::LabVisit => "lab",
            EventType::PrescriptionRenewal => "renewal",
        }
    }

    pub fn classification(&self) -> Classification {
        match self {
            EventType::Intake => Classification::Reminder,
            _ => Classification::Appointment,
        }
    }

    /// Doctor, pharmacy and lab visits.
    pub fn is_visit(&self) -> bool {
        matches!(
            self,
            EventType::DoctorVisit | EventType::PharmacyVisit | EventType::LabVisit
        )
    }

    /// Parse a user-facing category name ("intake", "doctor", "pharmacy_visit", ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "intake" | "intakes" => Some(EventType::Intake),
            "doctor" | "doctor_visit" => Some(EventType::DoctorVisit),
            "pharmacy" | "pharmacy_visit" => Some(EventType::PharmacyVisit),
            "lab" | "lab_visit" => Some(EventType::LabVisit),
            "renewal" | "prescription_renewal" => Some(EventType::PrescriptionRenewal),
            _ => None,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventType::Intake => "intake",
            EventType::DoctorVisit => "doctor_visit",
            EventType::PharmacyVisit => "pharmacy_visit",
            EventType::LabVisit => "lab_visit",
            EventType::PrescriptionRenewal => "prescription_renewal",
        };
        write!(f, "{name}")
    }
}

/// Presentation policy: short reminders vs. appointments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Reminder,
    Appointment,
}

/// Resolved status of a medication intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeStatus {
    OnTime,
    Late,
    Missed,
    Upcoming,
}

impl IntakeStatus {
    /// Taken or missed: nothing left to remind about.
    pub fn is_resolved(&self) -> bool {
        matches!(self, IntakeStatus::OnTime | IntakeStatus::Missed)
    }

    pub fn icon(&self) -> &'static str {
        match self {
            IntakeStatus::OnTime => "⊚",
            IntakeStatus::Late => "⏰",
            IntakeStatus::Missed => "⊗",
            IntakeStatus::Upcoming => "○",
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            IntakeStatus::OnTime => "À l'heure",
            IntakeStatus::Late => "En retard",
            IntakeStatus::Missed => "Manquée",
            IntakeStatus::Upcoming => "À venir",
        }
    }

    /// Icon and text, as embedded in titles and descriptions.
    pub fn label(&self) -> String {
        format!("{} {}", self.icon(), self.text())
    }
}

/// Link back to the domain row. Not part of the event identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    pub app_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<IntakeStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub professional_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pharmacy_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: Option<String>,
    pub event_type: EventType,
    pub classification: Classification,
    /// Hex color, e.g. `#10B981`
    pub color: String,
    /// Alerts, in minutes before start
    pub alerts: Vec<i64>,
    pub metadata: EventMetadata,
}

impl CalendarEvent {
    /// Stable id for a domain row of the given category.
    pub fn stable_id(event_type: EventType, app_id: &str) -> String {
        format!("{}_{}", event_type.id_prefix(), app_id)
    }

    pub fn duration(&self) -> Duration {
        self.end_date - self.start_date
    }
}

impl fmt::Display for CalendarEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}
