//! Shared fixtures for unit tests.

use crate::access::Session;
use crate::clock::FixedClock;
use crate::config::{utc_offset_from_env_value, CoreConfig};
use crate::directory::{DirectoryService, NewPatient, NewUser};
use crate::lifecycle::{appointment_time_from_parts, BookingLifecycleService};
use crate::repositories::RecordStore;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use clinic_records::{BookingData, Gender, PatientData, Role};
use clinic_uuid::RecordId;
use std::sync::Arc;
use tempfile::TempDir;

pub(crate) fn patient_input(name: &str) -> NewPatient {
    NewPatient {
        name: name.to_string(),
        gender: Gender::Female,
        date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
        phone_number: "08123456789".into(),
        address: "Jl. Merdeka 1, Jakarta".into(),
    }
}

/// A clinic in a temporary data directory at UTC+07:00, with one admin, one desk clerk and
/// Dr. Amin.
pub(crate) struct TestClinic {
    _temp_dir: Arc<TempDir>,
    pub now: DateTime<Utc>,
    pub store: RecordStore,
    pub directory: DirectoryService,
    pub lifecycle: BookingLifecycleService,
    pub admin: Session,
    pub cs: Session,
    pub doctor: Session,
}

impl TestClinic {
    /// Frozen at 2026-02-24 09:05 clinic time.
    pub fn new() -> Self {
        Self::at(Utc.with_ymd_and_hms(2026, 2, 24, 2, 5, 0).unwrap())
    }

    pub fn at(now: DateTime<Utc>) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let offset = utc_offset_from_env_value(Some("+07:00".into())).unwrap();
        let cfg = CoreConfig::new(temp_dir.path().to_path_buf(), offset).unwrap();
        let store = RecordStore::open(Arc::new(cfg)).unwrap();

        let clock = Arc::new(FixedClock(now));
        let directory = DirectoryService::new(store.clone(), clock.clone());
        let lifecycle = BookingLifecycleService::new(store.clone(), clock);

        let admin_user = directory.bootstrap_admin("Admin", "admin@g.c").unwrap();
        let admin = directory.authenticate(&admin_user.id.to_string()).unwrap();
        let cs = Self::add_user(&directory, &admin, "Desk", "cs@g.c", Role::Cs);
        let doctor = Self::add_user(&directory, &admin, "Dr. Amin", "doctor@g.c", Role::Doctor);

        Self {
            _temp_dir: Arc::new(temp_dir),
            now,
            store,
            directory,
            lifecycle,
            admin,
            cs,
            doctor,
        }
    }

    /// Same data directory and sessions, different clock.
    pub fn reopen(other: &TestClinic, now: DateTime<Utc>) -> Self {
        let clock = Arc::new(FixedClock(now));
        Self {
            _temp_dir: other._temp_dir.clone(),
            now,
            store: other.store.clone(),
            directory: DirectoryService::new(other.store.clone(), clock.clone()),
            lifecycle: BookingLifecycleService::new(other.store.clone(), clock),
            admin: other.admin,
            cs: other.cs,
            doctor: other.doctor,
        }
    }

    fn add_user(
        directory: &DirectoryService,
        admin: &Session,
        name: &str,
        email: &str,
        role: Role,
    ) -> Session {
        let user = directory
            .create_user(
                admin,
                NewUser {
                    name: name.into(),
                    email: email.into(),
                    role,
                },
            )
            .unwrap();
        directory.authenticate(&user.id.to_string()).unwrap()
    }

    pub fn add_doctor(&self, name: &str, email: &str) -> Session {
        Self::add_user(&self.directory, &self.admin, name, email, Role::Doctor)
    }

    pub fn patient(&self, name: &str) -> PatientData {
        self.directory
            .create_patient(&self.cs, patient_input(name))
            .unwrap()
    }

    /// Book `patient_id` with Dr. Amin.
    pub fn book(&self, patient_id: RecordId, date: &str, time: &str) -> BookingData {
        self.lifecycle
            .create(
                &self.cs,
                patient_id,
                self.doctor.user_id(),
                appointment_time_from_parts(date, time).unwrap(),
            )
            .unwrap()
    }
}
