//! Domain rows and the provider that supplies them.
//!
//! The application's data layer is an external collaborator. It hands us
//! timestamped rows per category; the mapper turns them into calendar events.

mod json_file;
mod memory;

pub use json_file::{DomainExport, JsonFileProvider};
pub use memory::MemoryProvider;

use std::future::Future;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MedSyncResult;
use crate::event::EventType;

/// Intake status as stored by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeRowStatus {
    Taken,
    Pending,
    Missed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeRow {
    pub id: String,
    pub scheduled_time: DateTime<Utc>,
    #[serde(default)]
    pub taken_at: Option<DateTime<Utc>>,
    pub status: IntakeRowStatus,
    #[serde(default)]
    pub medication_name: Option<String>,
    #[serde(default)]
    pub treatment_name: Option<String>,
    #[serde(default)]
    pub dosage: Option<String>,
}

/// End of a treatment, projected as a follow-up appointment with the prescriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorVisitRow {
    pub id: String,
    pub treatment_name: String,
    #[serde(default)]
    pub pathology: Option<String>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub doctor_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PharmacyVisitRow {
    pub id: String,
    pub visit_date: NaiveDate,
    pub visit_number: u32,
    #[serde(default)]
    pub pharmacy_name: Option<String>,
    #[serde(default)]
    pub pharmacy_address: Option<String>,
    #[serde(default)]
    pub treatment_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabVisitRow {
    pub id: String,
    pub visit_date: NaiveDate,
    #[serde(default)]
    pub lab_name: Option<String>,
    #[serde(default)]
    pub lab_address: Option<String>,
    #[serde(default)]
    pub treatment_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionRow {
    pub id: String,
    pub prescription_date: NaiveDate,
    pub duration_days: i64,
    #[serde(default)]
    pub doctor_name: Option<String>,
}

/// A row of any category.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainRow {
    Intake(IntakeRow),
    DoctorVisit(DoctorVisitRow),
    PharmacyVisit(PharmacyVisitRow),
    LabVisit(LabVisitRow),
    Prescription(PrescriptionRow),
}

impl DomainRow {
    pub fn id(&self) -> &str {
        match self {
            DomainRow::Intake(r) => &r.id,
            DomainRow::DoctorVisit(r) => &r.id,
            DomainRow::PharmacyVisit(r) => &r.id,
            DomainRow::LabVisit(r) => &r.id,
            DomainRow::Prescription(r) => &r.id,
        }
    }

    pub fn event_type(&self) -> EventType {
        match self {
            DomainRow::Intake(_) => EventType::Intake,
            DomainRow::DoctorVisit(_) => EventType::DoctorVisit,
            DomainRow::PharmacyVisit(_) => EventType::PharmacyVisit,
            DomainRow::LabVisit(_) => EventType::LabVisit,
            DomainRow::Prescription(_) => EventType::PrescriptionRenewal,
        }
    }

    /// The row's own date column, used for the provider's lower-bound query.
    /// Date-only columns count from midnight UTC.
    pub fn row_date(&self) -> Option<DateTime<Utc>> {
        match self {
            DomainRow::Intake(r) => Some(r.scheduled_time),
            DomainRow::DoctorVisit(r) => r.end_date.map(midnight_utc),
            DomainRow::PharmacyVisit(r) => Some(midnight_utc(r.visit_date)),
            DomainRow::LabVisit(r) => Some(midnight_utc(r.visit_date)),
            DomainRow::Prescription(r) => Some(midnight_utc(r.prescription_date)),
        }
    }
}

pub(crate) fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Source of domain rows.
pub trait DomainEventProvider: Send + Sync {
    /// Rows of `category` whose date column is at or after `since`.
    fn fetch(
        &self,
        category: EventType,
        since: DateTime<Utc>,
    ) -> impl Future<Output = MedSyncResult<Vec<DomainRow>>> + Send;
}
