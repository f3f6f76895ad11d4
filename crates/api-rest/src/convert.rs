//! Translation between core records and REST DTOs.

use api_shared::{BookingRes, MedicalRecordRes, PatientReq, PatientRes, UserRes};
use chrono::NaiveDate;
use clinic_core::{
    BookingOverview, ClinicError, Gender, MedicalRecordData, NewPatient, PatientData, RecordId,
    UserData,
};

use crate::error::ApiError;

const APPOINTMENT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

pub fn parse_id(raw: &str) -> Result<RecordId, ApiError> {
    Ok(RecordId::parse(raw).map_err(ClinicError::from)?)
}

/// Parse an optional query value with `FromStr`, reporting failures as bad requests.
pub fn parse_optional<T>(raw: Option<&str>) -> Result<Option<T>, ApiError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.parse::<T>().map_err(|e| ApiError::BadRequest(e.to_string())))
        .transpose()
}

pub fn new_patient(req: PatientReq) -> Result<NewPatient, ApiError> {
    let gender = req
        .gender
        .parse::<Gender>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let date_of_birth = NaiveDate::parse_from_str(req.date_of_birth.trim(), "%Y-%m-%d")
        .map_err(|e| ApiError::BadRequest(format!("date_of_birth must be YYYY-MM-DD: {e}")))?;

    Ok(NewPatient {
        name: req.name,
        gender,
        date_of_birth,
        phone_number: req.phone_number,
        address: req.address,
    })
}

pub fn patient_res(patient: &PatientData) -> PatientRes {
    PatientRes {
        id: patient.id.to_string(),
        name: patient.name.to_string(),
        gender: patient.gender.as_str().into(),
        date_of_birth: patient.date_of_birth.format("%Y-%m-%d").to_string(),
        phone_number: patient.phone_number.to_string(),
        address: patient.address.to_string(),
        created_at: patient.created_at.to_rfc3339(),
        updated_at: patient.updated_at.to_rfc3339(),
    }
}

pub fn user_res(user: &UserData) -> UserRes {
    UserRes {
        id: user.id.to_string(),
        name: user.name.to_string(),
        email: user.email.to_string(),
        role: user.role.as_str().into(),
        created_at: user.created_at.to_rfc3339(),
    }
}

pub fn booking_res(overview: BookingOverview) -> BookingRes {
    let BookingOverview {
        booking,
        patient_name,
        patient_gender,
        doctor_name,
        diagnosis,
    } = overview;

    BookingRes {
        id: booking.id.to_string(),
        patient_id: booking.patient_id.to_string(),
        patient_name: patient_name.map(|n| n.into_inner()),
        patient_gender: patient_gender.map(|g| g.as_str().to_string()),
        doctor_id: booking.doctor_id.to_string(),
        doctor_name: doctor_name.map(|n| n.into_inner()),
        appointment_time: booking
            .appointment_time
            .format(APPOINTMENT_TIME_FORMAT)
            .to_string(),
        status: booking.status.as_str().into(),
        started_at: booking.started_at.map(|t| t.to_rfc3339()),
        finished_at: booking.finished_at.map(|t| t.to_rfc3339()),
        diagnosis: diagnosis.map(|d| d.into_inner()),
        created_at: booking.created_at.to_rfc3339(),
        updated_at: booking.updated_at.to_rfc3339(),
    }
}

pub fn medical_record_res(record: &MedicalRecordData) -> MedicalRecordRes {
    MedicalRecordRes {
        id: record.id.to_string(),
        appointment_id: record.appointment_id.to_string(),
        patient_id: record.patient_id.to_string(),
        doctor_id: record.doctor_id.to_string(),
        diagnosis: record.diagnosis.to_string(),
        notes: record.notes.as_ref().map(|n| n.to_string()),
        created_at: record.created_at.to_rfc3339(),
        updated_at: record.updated_at.to_rfc3339(),
    }
}
