//! On-disk wire models for clinic records.
//!
//! Each persisted record is a small YAML document. This crate owns:
//! - the domain-level carriers (`PatientData`, `UserData`, `BookingData`, `MedicalRecordData`)
//! - strict wire structs used for (de)serialisation
//! - translation between the two, including validation of identifiers and required text
//!
//! Every document starts with a `recordType` key naming its kind so that a file copied into the
//! wrong place is rejected instead of silently misread.

pub mod booking;
pub mod medical_record;
pub mod patient;
pub mod user;

// Re-export facades
pub use booking::Booking;
pub use medical_record::MedicalRecord;
pub use patient::Patient;
pub use user::User;

// Re-export public domain-level types
pub use booking::{BookingData, BookingStatus};
pub use medical_record::MedicalRecordData;
pub use patient::{Gender, PatientData};
pub use user::{Role, UserData};

use serde::de::DeserializeOwned;

/// Errors returned by the `clinic-records` crate.
#[derive(Debug, thiserror::Error)]
pub enum RecordsError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("invalid UUID: {0}")]
    InvalidUuid(String),
}

/// Type alias for Results that can fail with a [`RecordsError`].
pub type RecordsResult<T> = Result<T, RecordsError>;

/// Deserialise a wire struct from YAML, reporting the path of the first mismatching field.
fn parse_wire<W: DeserializeOwned>(yaml_text: &str, kind: &str) -> RecordsResult<W> {
    let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

    serde_path_to_error::deserialize::<_, W>(deserializer).map_err(|err| {
        let path = err.path().to_string();
        let source = err.into_inner();
        let path = if path.is_empty() {
            "<root>"
        } else {
            path.as_str()
        };
        RecordsError::Translation(format!("{kind} schema mismatch at {path}: {source}"))
    })
}

/// Reject documents whose `recordType` header names a different kind.
fn expect_record_type(found: &str, expected: &str) -> RecordsResult<()> {
    if found != expected {
        return Err(RecordsError::InvalidInput(format!(
            "Expected recordType '{expected}', got '{found}'"
        )));
    }
    Ok(())
}

/// Parse a canonical identifier field, naming the field in the error.
fn parse_id(value: &str, field: &str) -> RecordsResult<clinic_uuid::RecordId> {
    clinic_uuid::RecordId::parse(value)
        .map_err(|e| RecordsError::InvalidUuid(format!("Invalid {field}: {e}")))
}

/// Parse a required text field, naming the field in the error.
fn parse_text(value: String, field: &str) -> RecordsResult<clinic_types::NonEmptyText> {
    clinic_types::NonEmptyText::new(value)
        .map_err(|e| RecordsError::Translation(format!("Invalid {field}: {e}")))
}
