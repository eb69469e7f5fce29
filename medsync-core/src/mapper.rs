//! Domain rows → calendar events.
//!
//! Pure functions, one per category. The presentation policy:
//!
//! | Category              | Classification | Duration | Alerts (min before)             |
//! |-----------------------|----------------|----------|---------------------------------|
//! | intake                | reminder       | 15 min   | resolved: none, else [15, 5]    |
//! | doctor/lab/pharmacy   | appointment    | 60 min   | [1440, 60]                      |
//! | prescription renewal  | appointment    | 30 min   | [10080, 1440]                   |
//!
//! Intakes are colored by resolved status, everything else by category.

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use crate::constants::LATE_THRESHOLD_MINUTES;
use crate::domain::{
    DoctorVisitRow, DomainRow, IntakeRow, IntakeRowStatus, LabVisitRow, PharmacyVisitRow,
    PrescriptionRow, midnight_utc,
};
use crate::event::{CalendarEvent, EventMetadata, EventType, IntakeStatus};

pub const INTAKE_DURATION_MINUTES: i64 = 15;
pub const VISIT_DURATION_MINUTES: i64 = 60;
pub const RENEWAL_DURATION_MINUTES: i64 = 30;

const UNRESOLVED_INTAKE_ALERTS: [i64; 2] = [15, 5];
const VISIT_ALERTS: [i64; 2] = [1440, 60];
const RENEWAL_ALERTS: [i64; 2] = [10080, 1440];

/// Default appointment hours (UTC) for date-only rows.
const PHARMACY_VISIT_HOUR: i64 = 9;
const LAB_VISIT_HOUR: i64 = 8;
const DOCTOR_VISIT_HOUR: i64 = 14;

/// Renewal reminder lands this many days before the prescription runs out.
const RENEWAL_LEAD_DAYS: i64 = 7;

/// Resolve the display status of an intake.
///
/// The stored status wins for taken (always on time) and missed/skipped.
/// A pending intake stays upcoming until it is more than
/// [`LATE_THRESHOLD_MINUTES`] overdue.
pub fn intake_status(
    status: IntakeRowStatus,
    scheduled: DateTime<Utc>,
    now: DateTime<Utc>,
) -> IntakeStatus {
    match status {
        IntakeRowStatus::Taken => IntakeStatus::OnTime,
        IntakeRowStatus::Missed | IntakeRowStatus::Skipped => IntakeStatus::Missed,
        IntakeRowStatus::Pending => {
            if now - scheduled > Duration::minutes(LATE_THRESHOLD_MINUTES) {
                IntakeStatus::Late
            } else {
                IntakeStatus::Upcoming
            }
        }
    }
}

pub fn event_color(event_type: EventType, status: Option<IntakeStatus>) -> &'static str {
    match (event_type, status) {
        (EventType::Intake, Some(IntakeStatus::OnTime)) => "#10B981",
        (EventType::Intake, Some(IntakeStatus::Late)) => "#F59E0B",
        (EventType::Intake, Some(IntakeStatus::Missed)) => "#EF4444",
        (EventType::Intake, _) => "#3B82F6",
        (EventType::DoctorVisit, _) => "#8B5CF6",
        (EventType::PharmacyVisit, _) => "#06B6D4",
        (EventType::LabVisit, _) => "#F97316",
        (EventType::PrescriptionRenewal, _) => "#EC4899",
    }
}

pub fn event_alerts(event_type: EventType, status: Option<IntakeStatus>) -> Vec<i64> {
    match event_type {
        EventType::Intake => match status {
            Some(s) if s.is_resolved() => vec![],
            _ => UNRESOLVED_INTAKE_ALERTS.to_vec(),
        },
        EventType::DoctorVisit | EventType::PharmacyVisit | EventType::LabVisit => {
            VISIT_ALERTS.to_vec()
        }
        EventType::PrescriptionRenewal => RENEWAL_ALERTS.to_vec(),
    }
}

pub fn map_intake(row: &IntakeRow, now: DateTime<Utc>) -> CalendarEvent {
    let status = intake_status(row.status, row.scheduled_time, now);
    let label = status.label();

    let medication_name = row.medication_name.as_deref().unwrap_or("Médicament");
    let treatment_name = row.treatment_name.clone().unwrap_or_default();
    let dosage = row.dosage.as_deref().unwrap_or_default();

    CalendarEvent {
        id: CalendarEvent::stable_id(EventType::Intake, &row.id),
        title: format!("{label} - {medication_name}"),
        description: format!(
            "Traitement: {treatment_name}\nDosage: {dosage}\nStatut: {label}"
        ),
        start_date: row.scheduled_time,
        end_date: row.scheduled_time + Duration::minutes(INTAKE_DURATION_MINUTES),
        location: None,
        event_type: EventType::Intake,
        classification: EventType::Intake.classification(),
        color: event_color(EventType::Intake, Some(status)).to_string(),
        alerts: event_alerts(EventType::Intake, Some(status)),
        metadata: EventMetadata {
            app_id: row.id.clone(),
            status: Some(status),
            medication_name: Some(medication_name.to_string()),
            treatment_name: Some(treatment_name),
            ..Default::default()
        },
    }
}

/// Treatments without an end date have no follow-up appointment.
pub fn map_doctor_visit(row: &DoctorVisitRow) -> Option<CalendarEvent> {
    let start = midnight_utc(row.end_date?) + Duration::hours(DOCTOR_VISIT_HOUR);
    let doctor_name = row.doctor_name.as_deref().unwrap_or("Médecin");
    let pathology = row.pathology.as_deref().unwrap_or("Non spécifiée");

    Some(CalendarEvent {
        id: CalendarEvent::stable_id(EventType::DoctorVisit, &row.id),
        title: format!("👨‍⚕️ RDV Médecin - {}", row.treatment_name),
        description: format!(
            "Fin de traitement: {}\nMédecin: {doctor_name}\nPathologie: {pathology}",
            row.treatment_name
        ),
        start_date: start,
        end_date: start + Duration::minutes(VISIT_DURATION_MINUTES),
        location: None,
        event_type: EventType::DoctorVisit,
        classification: EventType::DoctorVisit.classification(),
        color: event_color(EventType::DoctorVisit, None).to_string(),
        alerts: event_alerts(EventType::DoctorVisit, None),
        metadata: EventMetadata {
            app_id: row.id.clone(),
            treatment_name: Some(row.treatment_name.clone()),
            professional_name: Some(doctor_name.to_string()),
            ..Default::default()
        },
    })
}

pub fn map_pharmacy_visit(row: &PharmacyVisitRow) -> CalendarEvent {
    let start = midnight_utc(row.visit_date) + Duration::hours(PHARMACY_VISIT_HOUR);
    let pharmacy_name = row.pharmacy_name.as_deref().unwrap_or("Pharmacie");
    let treatment_name = row.treatment_name.clone().unwrap_or_default();

    CalendarEvent {
        id: CalendarEvent::stable_id(EventType::PharmacyVisit, &row.id),
        title: format!("🏥 Visite pharmacie - {pharmacy_name}"),
        description: format!(
            "Traitement: {treatment_name}\nPharmacie: {pharmacy_name}\nVisite #{}",
            row.visit_number
        ),
        start_date: start,
        end_date: start + Duration::minutes(VISIT_DURATION_MINUTES),
        location: row.pharmacy_address.clone(),
        event_type: EventType::PharmacyVisit,
        classification: EventType::PharmacyVisit.classification(),
        color: event_color(EventType::PharmacyVisit, None).to_string(),
        alerts: event_alerts(EventType::PharmacyVisit, None),
        metadata: EventMetadata {
            app_id: row.id.clone(),
            treatment_name: Some(treatment_name),
            pharmacy_name: Some(pharmacy_name.to_string()),
            ..Default::default()
        },
    }
}

pub fn map_lab_visit(row: &LabVisitRow) -> CalendarEvent {
    let start = midnight_utc(row.visit_date) + Duration::hours(LAB_VISIT_HOUR);
    let lab_name = row.lab_name.as_deref().unwrap_or("Laboratoire");
    let treatment_name = row.treatment_name.clone().unwrap_or_default();

    CalendarEvent {
        id: CalendarEvent::stable_id(EventType::LabVisit, &row.id),
        title: format!("🧪 Analyses laboratoire - {lab_name}"),
        description: format!("Traitement: {treatment_name}\nLaboratoire: {lab_name}"),
        start_date: start,
        end_date: start + Duration::minutes(VISIT_DURATION_MINUTES),
        location: row.lab_address.clone(),
        event_type: EventType::LabVisit,
        classification: EventType::LabVisit.classification(),
        color: event_color(EventType::LabVisit, None).to_string(),
        alerts: event_alerts(EventType::LabVisit, None),
        metadata: EventMetadata {
            app_id: row.id.clone(),
            treatment_name: Some(treatment_name),
            professional_name: Some(lab_name.to_string()),
            ..Default::default()
        },
    }
}

/// Skipped when the prescription length puts the reminder outside the
/// representable date range.
pub fn map_prescription_renewal(row: &PrescriptionRow) -> Option<CalendarEvent> {
    let Some(start) = row
        .duration_days
        .checked_sub(RENEWAL_LEAD_DAYS)
        .and_then(Duration::try_days)
        .and_then(|lead| midnight_utc(row.prescription_date).checked_add_signed(lead))
    else {
        warn!(
            "Skipping renewal for prescription {}: duration of {} days is out of range",
            row.id, row.duration_days
        );
        return None;
    };
    let doctor_name = row.doctor_name.as_deref().unwrap_or("Médecin");

    Some(CalendarEvent {
        id: CalendarEvent::stable_id(EventType::PrescriptionRenewal, &row.id),
        title: "📋 Renouvellement ordonnance".to_string(),
        description: format!(
            "Médecin: {doctor_name}\nDurée: {} jours\nPrévu {RENEWAL_LEAD_DAYS} jours avant expiration",
            row.duration_days
        ),
        start_date: start,
        end_date: start + Duration::minutes(RENEWAL_DURATION_MINUTES),
        location: None,
        event_type: EventType::PrescriptionRenewal,
        classification: EventType::PrescriptionRenewal.classification(),
        color: event_color(EventType::PrescriptionRenewal, None).to_string(),
        alerts: event_alerts(EventType::PrescriptionRenewal, None),
        metadata: EventMetadata {
            app_id: row.id.clone(),
            professional_name: Some(doctor_name.to_string()),
            ..Default::default()
        },
    })
}

/// Map any row. `now` only matters for intakes (lateness).
pub fn map_row(row: &DomainRow, now: DateTime<Utc>) -> Option<CalendarEvent> {
    match row {
        DomainRow::Intake(r) => Some(map_intake(r, now)),
        DomainRow::DoctorVisit(r) => map_doctor_visit(r),
        DomainRow::PharmacyVisit(r) => Some(map_pharmacy_visit(r)),
        DomainRow::LabVisit(r) => Some(map_lab_visit(r)),
        DomainRow::Prescription(r) => map_prescription_renewal(r),
    }
}
