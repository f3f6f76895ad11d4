//! # Clinic Core
//!
//! Core business logic for the clinic appointment system.
//!
//! This crate contains pure data operations and file/folder management:
//! - patient and staff directory with role-based sessions
//! - booking lifecycle (create, start, finish, cancel) and the medical record written on finish
//! - sharded YAML storage under the configured data directory, with rollback on failed writes
//!
//! **No API concerns**: HTTP servers, API keys and command-line parsing belong in `api-rest`,
//! `api-shared` and `clinic-cli`.

pub mod access;
pub mod clock;
pub mod config;
pub mod constants;
pub mod directory;
pub mod error;
pub mod lifecycle;
pub(crate) mod record_files;
pub mod repositories;
pub mod transition;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use access::{Capability, Session};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{utc_offset_from_env_value, CoreConfig};
pub use directory::{DirectoryService, NewPatient, NewUser};
pub use error::{ClinicError, ClinicResult, RecordKind};
pub use lifecycle::{
    appointment_time_from_parts, BookingLifecycleService, BookingOverview, ExaminationDetail,
    FinishedExamination,
};
pub use repositories::RecordStore;
pub use transition::Transition;

pub use clinic_records::{
    BookingData, BookingStatus, Gender, MedicalRecordData, PatientData, Role, UserData,
};
pub use clinic_types::NonEmptyText;
pub use clinic_uuid::RecordId;
