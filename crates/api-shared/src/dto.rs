//! Request and response bodies.
//!
//! Identifiers are canonical 32-character hex strings, dates are `YYYY-MM-DD`, appointment
//! times are clinic-local `YYYY-MM-DDTHH:MM`, and instants are RFC 3339 in UTC.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Body of every non-2xx response.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    /// Machine-readable error kind, e.g. `conflict` or `not_found`.
    pub error: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Patients
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PatientReq {
    pub name: String,
    /// `male` or `female`.
    pub gender: String,
    pub date_of_birth: String,
    pub phone_number: String,
    pub address: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PatientRes {
    pub id: String,
    pub name: String,
    pub gender: String,
    pub date_of_birth: String,
    pub phone_number: String,
    pub address: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ListPatientsRes {
    pub patients: Vec<PatientRes>,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct UserReq {
    pub name: String,
    pub email: String,
    /// `admin`, `cs` or `doctor`.
    pub role: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct UserRes {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ListUsersRes {
    pub users: Vec<UserRes>,
}

/// Returned by cascading deletes.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteRes {
    pub deleted_id: String,
    pub bookings_removed: Vec<String>,
}

// ---------------------------------------------------------------------------
// Bookings
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateBookingReq {
    pub patient_id: String,
    pub doctor_id: String,
    pub appointment_date: String,
    /// `HH:MM`.
    pub appointment_time: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateBookingWithPatientReq {
    pub patient: PatientReq,
    pub doctor_id: String,
    pub appointment_date: String,
    pub appointment_time: String,
}

/// A booking as shown in listings, with the names a reader needs next to the ids.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct BookingRes {
    pub id: String,
    pub patient_id: String,
    pub patient_name: Option<String>,
    pub patient_gender: Option<String>,
    pub doctor_id: String,
    pub doctor_name: Option<String>,
    pub appointment_time: String,
    pub status: String,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    /// Present once the booking is finished.
    pub diagnosis: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateBookingWithPatientRes {
    pub patient: PatientRes,
    pub booking: BookingRes,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ListBookingsRes {
    pub bookings: Vec<BookingRes>,
}

// ---------------------------------------------------------------------------
// Examinations
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct FinishExaminationReq {
    pub diagnosis: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct MedicalRecordRes {
    pub id: String,
    pub appointment_id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub diagnosis: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct FinishExaminationRes {
    pub booking: BookingRes,
    pub medical_record: MedicalRecordRes,
    pub message: String,
}

/// Read-only examination view. `diagnosis` and `notes` are `-` when not recorded.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ExaminationDetailRes {
    pub booking_id: String,
    pub recorded: bool,
    pub diagnosis: String,
    pub notes: String,
}
