//! Domain rows read from a JSON export file.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    DoctorVisitRow, DomainEventProvider, DomainRow, IntakeRow, LabVisitRow, PharmacyVisitRow,
    PrescriptionRow,
};
use crate::error::{MedSyncError, MedSyncResult};
use crate::event::EventType;

/// Shape of the export file: one array per category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainExport {
    pub intakes: Vec<IntakeRow>,
    pub doctor_visits: Vec<DoctorVisitRow>,
    pub pharmacy_visits: Vec<PharmacyVisitRow>,
    pub lab_visits: Vec<LabVisitRow>,
    pub prescriptions: Vec<PrescriptionRow>,
}

impl DomainExport {
    pub fn rows(self, category: EventType) -> Vec<DomainRow> {
        match category {
            EventType::Intake => self.intakes.into_iter().map(DomainRow::Intake).collect(),
            EventType::DoctorVisit => self
                .doctor_visits
                .into_iter()
                .map(DomainRow::DoctorVisit)
                .collect(),
            EventType::PharmacyVisit => self
                .pharmacy_visits
                .into_iter()
                .map(DomainRow::PharmacyVisit)
                .collect(),
            EventType::LabVisit => self.lab_visits.into_iter().map(DomainRow::LabVisit).collect(),
            EventType::PrescriptionRenewal => self
                .prescriptions
                .into_iter()
                .map(DomainRow::Prescription)
                .collect(),
        }
    }
}

pub struct JsonFileProvider {
    path: PathBuf,
}

impl JsonFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileProvider { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_export(&self) -> MedSyncResult<DomainExport> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            MedSyncError::Provider(format!("Could not read {}: {}", self.path.display(), e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            MedSyncError::Provider(format!("Invalid export {}: {}", self.path.display(), e))
        })
    }
}

impl DomainEventProvider for JsonFileProvider {
    async fn fetch(
        &self,
        category: EventType,
        since: DateTime<Utc>,
    ) -> MedSyncResult<Vec<DomainRow>> {
        let export = self.read_export().await?;

        Ok(export
            .rows(category)
            .into_iter()
            .filter(|row| row.row_date().is_some_and(|date| date >= since))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const EXPORT: &str = r#"{
        "intakes": [
            {"id": "i1", "scheduled_time": "2025-10-20T08:00:00Z", "status": "taken",
             "medication_name": "Doliprane"},
            {"id": "i0", "scheduled_time": "2025-09-01T08:00:00Z", "status": "pending"}
        ],
        "doctor_visits": [
            {"id": "t1", "treatment_name": "Antibiotiques", "end_date": "2025-11-02"},
            {"id": "t2", "treatment_name": "Chronique"}
        ],
        "pharmacy_visits": [
            {"id": "p1", "visit_date": "2025-10-25", "visit_number": 2, "pharmacy_name": "Centrale"}
        ]
    }"#;

    #[tokio::test]
    async fn test_fetch_filters_by_lower_bound_and_category() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        std::fs::write(&path, EXPORT).unwrap();

        let provider = JsonFileProvider::new(&path);
        let since = Utc.with_ymd_and_hms(2025, 10, 13, 0, 0, 0).unwrap();

        let intakes = provider.fetch(EventType::Intake, since).await.unwrap();
        assert_eq!(intakes.len(), 1);
        assert_eq!(intakes[0].id(), "i1");

        // Treatments without an end date have no row date and are skipped
        let doctors = provider.fetch(EventType::DoctorVisit, since).await.unwrap();
        assert_eq!(doctors.len(), 1);
        assert_eq!(doctors[0].id(), "t1");

        // Missing arrays default to empty
        let labs = provider.fetch(EventType::LabVisit, since).await.unwrap();
        assert!(labs.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let provider = JsonFileProvider::new(dir.path().join("nope.json"));
        let since = Utc.with_ymd_and_hms(2025, 10, 13, 0, 0, 0).unwrap();

        let result = provider.fetch(EventType::Intake, since).await;
        assert!(matches!(result, Err(MedSyncError::Provider(_))));
    }
}
