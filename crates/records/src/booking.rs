//! Booking wire model.
//!
//! `appointmentTime` is a clinic-local wall-clock timestamp (no offset). `startedAt` and
//! `finishedAt` are UTC instants and are omitted from the file while unset.

use crate::{expect_record_type, parse_id, parse_wire, RecordsError};
use chrono::{DateTime, NaiveDateTime, Utc};
use clinic_uuid::RecordId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Booking status.
///
/// Serialised with the variant names as-is (`Waiting`, `InProgress`, `Finished`, `Cancelled`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingStatus {
    Waiting,
    InProgress,
    Finished,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 4] = [
        BookingStatus::Waiting,
        BookingStatus::InProgress,
        BookingStatus::Finished,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Waiting => "Waiting",
            BookingStatus::InProgress => "InProgress",
            BookingStatus::Finished => "Finished",
            BookingStatus::Cancelled => "Cancelled",
        }
    }

    /// Finished and Cancelled accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Finished | BookingStatus::Cancelled)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = RecordsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                RecordsError::InvalidInput(format!(
                    "status must be one of Waiting, InProgress, Finished, Cancelled; got '{wanted}'"
                ))
            })
    }
}

/// Domain-level carrier for a booking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingData {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub doctor_id: RecordId,
    pub appointment_time: NaiveDateTime,
    pub status: BookingStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Booking record operations.
pub struct Booking;

impl Booking {
    /// File name of a booking record inside its sharded directory.
    pub const FILE_NAME: &'static str = "booking.yaml";

    const RECORD_TYPE: &'static str = "Booking";

    /// Parse a booking record from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] on schema mismatch, wrong `recordType`, non-canonical ids or an
    /// unknown status.
    pub fn parse(yaml_text: &str) -> Result<BookingData, RecordsError> {
        let wire: BookingWire = parse_wire(yaml_text, Self::RECORD_TYPE)?;
        expect_record_type(&wire.record_type, Self::RECORD_TYPE)?;

        Ok(BookingData {
            id: parse_id(&wire.id, "booking id")?,
            patient_id: parse_id(&wire.patient_id, "patientId")?,
            doctor_id: parse_id(&wire.doctor_id, "doctorId")?,
            appointment_time: wire.appointment_time,
            status: wire.status,
            started_at: wire.started_at,
            finished_at: wire.finished_at,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        })
    }

    /// Render a booking record as YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] if serialisation fails.
    pub fn render(data: &BookingData) -> Result<String, RecordsError> {
        let wire = BookingWire {
            record_type: Self::RECORD_TYPE.to_string(),
            id: data.id.to_string(),
            patient_id: data.patient_id.to_string(),
            doctor_id: data.doctor_id.to_string(),
            appointment_time: data.appointment_time,
            status: data.status,
            started_at: data.started_at,
            finished_at: data.finished_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
        };
        serde_yaml::to_string(&wire)
            .map_err(|e| RecordsError::Translation(format!("Failed to serialise booking: {e}")))
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct BookingWire {
    #[serde(rename = "recordType")]
    pub record_type: String,

    pub id: String,

    #[serde(rename = "patientId")]
    pub patient_id: String,

    #[serde(rename = "doctorId")]
    pub doctor_id: String,

    #[serde(rename = "appointmentTime")]
    pub appointment_time: NaiveDateTime,

    pub status: BookingStatus,

    #[serde(
        rename = "startedAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(
        rename = "finishedAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub finished_at: Option<DateTime<Utc>>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}
