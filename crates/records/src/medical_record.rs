//! Medical record wire model.
//!
//! A medical record is written once, next to the booking it documents, at the moment that
//! booking is finished. Patient and doctor ids are denormalised copies of the booking's.

use crate::{expect_record_type, parse_id, parse_text, parse_wire, RecordsError};
use chrono::{DateTime, Utc};
use clinic_types::NonEmptyText;
use clinic_uuid::RecordId;
use serde::{Deserialize, Serialize};

/// Domain-level carrier for a medical record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MedicalRecordData {
    pub id: RecordId,
    /// The booking this record documents.
    pub appointment_id: RecordId,
    pub patient_id: RecordId,
    pub doctor_id: RecordId,
    pub diagnosis: NonEmptyText,
    pub notes: Option<NonEmptyText>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Medical record operations.
pub struct MedicalRecord;

impl MedicalRecord {
    /// File name of a medical record inside its booking's directory.
    pub const FILE_NAME: &'static str = "medical_record.yaml";

    const RECORD_TYPE: &'static str = "MedicalRecord";

    /// Parse a medical record from YAML text.
    ///
    /// Blank `notes` are read back as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] on schema mismatch, wrong `recordType`, non-canonical ids or a
    /// blank diagnosis.
    pub fn parse(yaml_text: &str) -> Result<MedicalRecordData, RecordsError> {
        let wire: MedicalRecordWire = parse_wire(yaml_text, Self::RECORD_TYPE)?;
        expect_record_type(&wire.record_type, Self::RECORD_TYPE)?;

        Ok(MedicalRecordData {
            id: parse_id(&wire.id, "medical record id")?,
            appointment_id: parse_id(&wire.appointment_id, "appointmentId")?,
            patient_id: parse_id(&wire.patient_id, "patientId")?,
            doctor_id: parse_id(&wire.doctor_id, "doctorId")?,
            diagnosis: parse_text(wire.diagnosis, "diagnosis")?,
            notes: NonEmptyText::optional(wire.notes),
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        })
    }

    /// Render a medical record as YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] if serialisation fails.
    pub fn render(data: &MedicalRecordData) -> Result<String, RecordsError> {
        let wire = MedicalRecordWire {
            record_type: Self::RECORD_TYPE.to_string(),
            id: data.id.to_string(),
            appointment_id: data.appointment_id.to_string(),
            patient_id: data.patient_id.to_string(),
            doctor_id: data.doctor_id.to_string(),
            diagnosis: data.diagnosis.to_string(),
            notes: data.notes.as_ref().map(ToString::to_string),
            created_at: data.created_at,
            updated_at: data.updated_at,
        };
        serde_yaml::to_string(&wire).map_err(|e| {
            RecordsError::Translation(format!("Failed to serialise medical record: {e}"))
        })
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct MedicalRecordWire {
    #[serde(rename = "recordType")]
    pub record_type: String,

    pub id: String,

    #[serde(rename = "appointmentId")]
    pub appointment_id: String,

    #[serde(rename = "patientId")]
    pub patient_id: String,

    #[serde(rename = "doctorId")]
    pub doctor_id: String,

    pub diagnosis: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}
