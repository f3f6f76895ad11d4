//! Patient record storage.

use super::shared::StoredRecord;
use crate::config::CoreConfig;
use crate::error::{ClinicResult, RecordKind};
use clinic_records::{Patient, PatientData};
use clinic_uuid::RecordId;
use std::path::PathBuf;

impl StoredRecord for PatientData {
    const KIND: RecordKind = RecordKind::Patient;
    const FILE_NAME: &'static str = Patient::FILE_NAME;

    fn base_dir(cfg: &CoreConfig) -> PathBuf {
        cfg.patients_dir()
    }

    fn id(&self) -> RecordId {
        self.id
    }

    fn parse(yaml_text: &str) -> ClinicResult<Self> {
        Ok(Patient::parse(yaml_text)?)
    }

    fn render(&self) -> ClinicResult<String> {
        Ok(Patient::render(self)?)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::CoreConfig;
    use crate::error::{ClinicError, RecordKind};
    use crate::repositories::RecordStore;
    use chrono::{NaiveDate, Offset, TimeZone, Utc};
    use clinic_records::{Gender, PatientData};
    use clinic_types::NonEmptyText;
    use clinic_uuid::RecordId;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn test_store(temp_dir: &TempDir) -> RecordStore {
        let cfg = CoreConfig::new(temp_dir.path().to_path_buf(), Utc.fix()).unwrap();
        RecordStore::open(Arc::new(cfg)).unwrap()
    }

    fn siti(id: RecordId) -> PatientData {
        let at = Utc.with_ymd_and_hms(2026, 2, 23, 8, 0, 0).unwrap();
        PatientData {
            id,
            name: NonEmptyText::new("Siti").unwrap(),
            gender: Gender::Female,
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            phone_number: NonEmptyText::new("08123456789").unwrap(),
            address: NonEmptyText::new("Jl. Merdeka 1").unwrap(),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_insert_writes_patient_yaml_in_sharded_dir() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);

        let patient = store.insert(siti).unwrap();

        let path = patient
            .id
            .sharded_dir(&temp_dir.path().join("patients"))
            .join("patient.yaml");
        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("recordType: Patient"));
        assert!(contents.contains("name: Siti"));

        let loaded: PatientData = store.load(patient.id).unwrap();
        assert_eq!(loaded, patient);
    }

    #[test]
    fn test_load_all_skips_corrupt_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);

        let good = store.insert(siti).unwrap();
        let bad_dir = RecordId::new().sharded_dir(&temp_dir.path().join("patients"));
        fs::create_dir_all(&bad_dir).unwrap();
        fs::write(bad_dir.join("patient.yaml"), "recordType: Patient\nname: [\n").unwrap();

        let all: Vec<PatientData> = store.load_all().unwrap();
        assert_eq!(all, vec![good]);
    }

    #[test]
    fn test_load_unknown_patient_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let id = RecordId::new();

        match store.load::<PatientData>(id) {
            Err(ClinicError::NotFound {
                kind: RecordKind::Patient,
                id: missing,
            }) => assert_eq!(missing, id),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_replace_overwrites_in_place() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let patient = store.insert(siti).unwrap();

        let (mut loaded, raw) = store.load_with_raw::<PatientData>(patient.id).unwrap();
        loaded.address = NonEmptyText::new("Jl. Sudirman 5").unwrap();
        store.replace(&loaded, &raw).unwrap();

        let reloaded: PatientData = store.load(patient.id).unwrap();
        assert_eq!(reloaded.address.as_str(), "Jl. Sudirman 5");
    }
}
