//! Patient wire model and translation helpers.
//!
//! Patients are shared by many bookings. The file is mutable: explicit edits overwrite it in
//! place and bump `updatedAt`.

use crate::{expect_record_type, parse_id, parse_text, parse_wire, RecordsError};
use chrono::{DateTime, NaiveDate, Utc};
use clinic_types::NonEmptyText;
use clinic_uuid::RecordId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Public domain-level types
// ============================================================================

/// Administrative gender recorded for a patient.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = RecordsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(RecordsError::InvalidInput(format!(
                "gender must be 'male' or 'female', got '{other}'"
            ))),
        }
    }
}

/// Domain-level carrier for patient data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientData {
    pub id: RecordId,
    pub name: NonEmptyText,
    pub gender: Gender,
    pub date_of_birth: NaiveDate,
    pub phone_number: NonEmptyText,
    pub address: NonEmptyText,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Public Patient operations
// ============================================================================

/// Patient record operations.
///
/// Zero-sized type used for namespacing; all methods are associated functions.
pub struct Patient;

impl Patient {
    /// File name of a patient record inside its sharded directory.
    pub const FILE_NAME: &'static str = "patient.yaml";

    const RECORD_TYPE: &'static str = "Patient";

    /// Parse a patient record from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] if the YAML does not match the wire schema (including unknown
    /// keys), the `recordType` is not `Patient`, the id is not canonical, or a required text
    /// field is blank.
    pub fn parse(yaml_text: &str) -> Result<PatientData, RecordsError> {
        let wire: PatientWire = parse_wire(yaml_text, Self::RECORD_TYPE)?;
        expect_record_type(&wire.record_type, Self::RECORD_TYPE)?;
        wire_to_domain(wire)
    }

    /// Render a patient record as YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] if serialisation fails.
    pub fn render(data: &PatientData) -> Result<String, RecordsError> {
        serde_yaml::to_string(&domain_to_wire(data))
            .map_err(|e| RecordsError::Translation(format!("Failed to serialise patient: {e}")))
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct PatientWire {
    #[serde(rename = "recordType")]
    pub record_type: String,

    pub id: String,

    pub name: String,

    pub gender: Gender,

    #[serde(rename = "dateOfBirth")]
    pub date_of_birth: NaiveDate,

    #[serde(rename = "phoneNumber")]
    pub phone_number: String,

    pub address: String,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

fn wire_to_domain(wire: PatientWire) -> Result<PatientData, RecordsError> {
    Ok(PatientData {
        id: parse_id(&wire.id, "patient id")?,
        name: parse_text(wire.name, "name")?,
        gender: wire.gender,
        date_of_birth: wire.date_of_birth,
        phone_number: parse_text(wire.phone_number, "phoneNumber")?,
        address: parse_text(wire.address, "address")?,
        created_at: wire.created_at,
        updated_at: wire.updated_at,
    })
}

fn domain_to_wire(data: &PatientData) -> PatientWire {
    PatientWire {
        record_type: Patient::RECORD_TYPE.to_string(),
        id: data.id.to_string(),
        name: data.name.to_string(),
        gender: data.gender,
        date_of_birth: data.date_of_birth,
        phone_number: data.phone_number.to_string(),
        address: data.address.to_string(),
        created_at: data.created_at,
        updated_at: data.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"recordType: Patient
id: 90a8d1ea318041d9adb070a834d4e0f6
name: Siti
gender: female
dateOfBirth: 1990-01-01
phoneNumber: "+62 812 0000 0000"
address: Jl. Merdeka 1, Jakarta
createdAt: 2026-02-23T09:00:00Z
updatedAt: 2026-02-23T09:00:00Z
"#;

    #[test]
    fn parses_sample_yaml() {
        let patient = Patient::parse(SAMPLE).expect("parse yaml");

        assert_eq!(patient.name.as_str(), "Siti");
        assert_eq!(patient.gender, Gender::Female);
        assert_eq!(
            patient.date_of_birth,
            NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()
        );
        assert_eq!(patient.phone_number.as_str(), "+62 812 0000 0000");
    }

    #[test]
    fn render_then_parse_preserves_data() {
        let patient = Patient::parse(SAMPLE).expect("parse yaml");
        let output = Patient::render(&patient).expect("render patient");
        assert_eq!(Patient::parse(&output).expect("reparse"), patient);
    }

    #[test]
    fn strict_validation_rejects_unknown_keys() {
        let input = format!("{SAMPLE}unexpected_key: should_fail\n");

        let err = Patient::parse(&input).expect_err("should reject unknown key");
        match err {
            RecordsError::Translation(msg) => assert!(msg.contains("unexpected_key")),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_wrong_record_type() {
        let input = SAMPLE.replace("recordType: Patient", "recordType: Booking");
        let err = Patient::parse(&input).expect_err("should reject wrong record type");
        assert!(matches!(err, RecordsError::InvalidInput(_)));
    }

    #[test]
    fn rejects_unknown_gender() {
        let input = SAMPLE.replace("gender: female", "gender: other");
        let err = Patient::parse(&input).expect_err("should reject unknown gender");
        match err {
            RecordsError::Translation(msg) => assert!(msg.contains("gender")),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_blank_name() {
        let input = SAMPLE.replace("name: Siti", "name: \"  \"");
        assert!(Patient::parse(&input).is_err());
    }

    #[test]
    fn gender_from_str_is_case_insensitive() {
        assert_eq!("Male".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!(" female ".parse::<Gender>().unwrap(), Gender::Female);
        assert!("x".parse::<Gender>().is_err());
    }
}
