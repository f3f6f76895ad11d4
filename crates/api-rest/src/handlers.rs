//! HTTP handlers.
//!
//! Handlers stay thin: parse the request, call the directory or lifecycle service with the
//! caller's session, and convert the result to a DTO. Authorisation is decided in core.

use api_shared::{
    BookingRes, CreateBookingReq, CreateBookingWithPatientReq, CreateBookingWithPatientRes,
    DeleteRes, ErrorRes, ExaminationDetailRes, FinishExaminationReq, FinishExaminationRes,
    HealthRes, HealthService, ListBookingsRes, ListPatientsRes, ListUsersRes, PatientReq,
    PatientRes, UserReq, UserRes,
};
use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::Json,
};
use clinic_core::{
    appointment_time_from_parts, BookingData, BookingStatus, NewUser, RecordId, Role, Session,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    convert::{
        booking_res, medical_record_res, new_patient, parse_id, parse_optional, patient_res,
        user_res,
    },
    error::ApiError,
    session::Authenticated,
    AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PatientQuery {
    /// Case-insensitive substring of the patient name.
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    /// `admin`, `cs` or `doctor`.
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookingQuery {
    /// `Waiting`, `InProgress`, `Finished` or `Cancelled`.
    pub status: Option<String>,
    pub doctor_id: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QueueQuery {
    pub status: Option<String>,
}

fn describe(
    state: &AppState,
    session: &Session,
    bookings: Vec<BookingData>,
) -> Result<Vec<BookingRes>, ApiError> {
    let overviews = state.lifecycle.overview(session, bookings)?;
    Ok(overviews.into_iter().map(booking_res).collect())
}

fn describe_one(
    state: &AppState,
    session: &Session,
    booking: BookingData,
) -> Result<BookingRes, ApiError> {
    describe(state, session, vec![booking])?
        .pop()
        .ok_or_else(|| ApiError::Internal("booking overview came back empty".into()))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks. Needs no credentials.
#[axum::debug_handler]
pub async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

// ---------------------------------------------------------------------------
// Patients
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/patients",
    params(PatientQuery),
    responses(
        (status = 200, description = "Patients ordered by name", body = ListPatientsRes),
        (status = 401, description = "Unauthenticated", body = ErrorRes)
    )
)]
/// List patients, optionally filtered by name
#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Query(query): Query<PatientQuery>,
) -> Result<Json<ListPatientsRes>, ApiError> {
    let patients = state
        .directory
        .list_patients(&session, query.name.as_deref())?;
    Ok(Json(ListPatientsRes {
        patients: patients.iter().map(patient_res).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = PatientReq,
    responses(
        (status = 201, description = "Patient registered", body = PatientRes),
        (status = 400, description = "Invalid patient details", body = ErrorRes),
        (status = 403, description = "Role may not manage patients", body = ErrorRes)
    )
)]
/// Register a new patient
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - a required field is blank or too long,
/// - the gender or date of birth cannot be parsed, or
/// - the phone number contains anything but digits and separators.
#[axum::debug_handler]
pub async fn create_patient(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Json(req): Json<PatientReq>,
) -> Result<(StatusCode, Json<PatientRes>), ApiError> {
    let patient = state
        .directory
        .create_patient(&session, new_patient(req)?)?;
    Ok((StatusCode::CREATED, Json(patient_res(&patient))))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient", body = PatientRes),
        (status = 404, description = "No such patient", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<PatientRes>, ApiError> {
    let patient = state.directory.get_patient(&session, parse_id(&id)?)?;
    Ok(Json(patient_res(&patient)))
}

#[utoipa::path(
    put,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    request_body = PatientReq,
    responses(
        (status = 200, description = "Patient updated", body = PatientRes),
        (status = 400, description = "Invalid patient details", body = ErrorRes),
        (status = 404, description = "No such patient", body = ErrorRes)
    )
)]
/// Replace a patient's details
///
/// The identifier and registration time are kept; every other field is overwritten.
#[axum::debug_handler]
pub async fn update_patient(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<PatientReq>,
) -> Result<Json<PatientRes>, ApiError> {
    let id = parse_id(&id)?;
    let patient = state
        .directory
        .update_patient(&session, id, new_patient(req)?)?;
    Ok(Json(patient_res(&patient)))
}

#[utoipa::path(
    delete,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient and their bookings removed", body = DeleteRes),
        (status = 404, description = "No such patient", body = ErrorRes)
    )
)]
/// Delete a patient together with their bookings and medical records
#[axum::debug_handler]
pub async fn delete_patient(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<DeleteRes>, ApiError> {
    let id = parse_id(&id)?;
    let removed = state.directory.delete_patient(&session, id)?;
    Ok(Json(delete_res(id, removed)))
}

fn delete_res(id: RecordId, removed: Vec<RecordId>) -> DeleteRes {
    DeleteRes {
        deleted_id: id.to_string(),
        bookings_removed: removed.iter().map(ToString::to_string).collect(),
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/users",
    params(UserQuery),
    responses(
        (status = 200, description = "Staff accounts", body = ListUsersRes),
        (status = 403, description = "Caller is not an admin", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Query(query): Query<UserQuery>,
) -> Result<Json<ListUsersRes>, ApiError> {
    let role: Option<Role> = parse_optional(query.role.as_deref())?;
    let users = state.directory.list_users(&session, role)?;
    Ok(Json(ListUsersRes {
        users: users.iter().map(user_res).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/users",
    request_body = UserReq,
    responses(
        (status = 201, description = "User created", body = UserRes),
        (status = 400, description = "Invalid user details", body = ErrorRes),
        (status = 403, description = "Caller is not an admin", body = ErrorRes),
        (status = 409, description = "Email already registered", body = ErrorRes)
    )
)]
/// Create a staff account
///
/// # Errors
/// Returns `409 Conflict` if another account already uses the email, compared without regard
/// to case.
#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Json(req): Json<UserReq>,
) -> Result<(StatusCode, Json<UserRes>), ApiError> {
    let role = req
        .role
        .parse::<Role>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let user = state.directory.create_user(
        &session,
        NewUser {
            name: req.name,
            email: req.email,
            role,
        },
    )?;
    Ok((StatusCode::CREATED, Json(user_res(&user))))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserRes),
        (status = 404, description = "No such user", body = ErrorRes)
    )
)]
/// Fetch a staff account. Non-admins may only fetch their own.
#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<UserRes>, ApiError> {
    let user = state.directory.get_user(&session, parse_id(&id)?)?;
    Ok(Json(user_res(&user)))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User removed with any bookings they were assigned", body = DeleteRes),
        (status = 403, description = "Caller is not an admin, or is deleting themselves", body = ErrorRes),
        (status = 404, description = "No such user", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<DeleteRes>, ApiError> {
    let id = parse_id(&id)?;
    let removed = state.directory.delete_user(&session, id)?;
    Ok(Json(delete_res(id, removed)))
}

#[utoipa::path(
    get,
    path = "/doctors",
    responses(
        (status = 200, description = "Doctors available for booking", body = ListUsersRes),
        (status = 403, description = "Role may not create bookings", body = ErrorRes)
    )
)]
/// Doctors that a booking can be assigned to
#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
) -> Result<Json<ListUsersRes>, ApiError> {
    let doctors = state.directory.list_doctors(&session)?;
    Ok(Json(ListUsersRes {
        users: doctors.iter().map(user_res).collect(),
    }))
}

// ---------------------------------------------------------------------------
// Bookings
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/bookings",
    params(BookingQuery),
    responses(
        (status = 200, description = "Bookings, latest appointment first", body = ListBookingsRes),
        (status = 400, description = "Unknown status or malformed doctor id", body = ErrorRes),
        (status = 403, description = "Role may not view all bookings", body = ErrorRes)
    )
)]
/// List bookings across all doctors
///
/// Each entry carries the patient's name and gender, the doctor's name and, once finished,
/// the recorded diagnosis.
#[axum::debug_handler]
pub async fn list_bookings(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Query(query): Query<BookingQuery>,
) -> Result<Json<ListBookingsRes>, ApiError> {
    let status: Option<BookingStatus> = parse_optional(query.status.as_deref())?;
    let doctor_id = query
        .doctor_id
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(parse_id)
        .transpose()?;

    let bookings = state.lifecycle.list(&session, status, doctor_id)?;
    Ok(Json(ListBookingsRes {
        bookings: describe(&state, &session, bookings)?,
    }))
}

#[utoipa::path(
    post,
    path = "/bookings",
    request_body = CreateBookingReq,
    responses(
        (status = 201, description = "Booking created in Waiting", body = BookingRes),
        (status = 400, description = "Malformed id, date or time", body = ErrorRes),
        (status = 403, description = "Role may not create bookings", body = ErrorRes),
        (status = 422, description = "Patient unknown, or doctor unknown or not a doctor", body = ErrorRes)
    )
)]
/// Book an existing patient with a doctor
///
/// `appointment_date` is `YYYY-MM-DD` and `appointment_time` is `HH:MM`, both clinic-local.
///
/// # Errors
/// Returns `422 Unprocessable Entity` if:
/// - the patient does not exist,
/// - the doctor does not exist, or
/// - the chosen user is not a doctor.
#[axum::debug_handler]
pub async fn create_booking(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Json(req): Json<CreateBookingReq>,
) -> Result<(StatusCode, Json<BookingRes>), ApiError> {
    let patient_id = parse_id(&req.patient_id)?;
    let doctor_id = parse_id(&req.doctor_id)?;
    let appointment_time =
        appointment_time_from_parts(&req.appointment_date, &req.appointment_time)?;

    let booking = state
        .lifecycle
        .create(&session, patient_id, doctor_id, appointment_time)
        .map_err(ApiError::referential)?;
    Ok((
        StatusCode::CREATED,
        Json(describe_one(&state, &session, booking)?),
    ))
}

#[utoipa::path(
    post,
    path = "/bookings/with-patient",
    request_body = CreateBookingWithPatientReq,
    responses(
        (status = 201, description = "Patient registered and booked", body = CreateBookingWithPatientRes),
        (status = 400, description = "Invalid patient details, date or time", body = ErrorRes),
        (status = 422, description = "Doctor unknown or not a doctor", body = ErrorRes)
    )
)]
/// Register a new patient and book them in one step
///
/// Nothing is kept if the booking cannot be written.
#[axum::debug_handler]
pub async fn create_booking_with_patient(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Json(req): Json<CreateBookingWithPatientReq>,
) -> Result<(StatusCode, Json<CreateBookingWithPatientRes>), ApiError> {
    let patient = new_patient(req.patient)?;
    let doctor_id = parse_id(&req.doctor_id)?;
    let appointment_time =
        appointment_time_from_parts(&req.appointment_date, &req.appointment_time)?;

    let (patient, booking) = state
        .lifecycle
        .create_with_new_patient(&session, patient, doctor_id, appointment_time)
        .map_err(ApiError::referential)?;
    Ok((
        StatusCode::CREATED,
        Json(CreateBookingWithPatientRes {
            patient: patient_res(&patient),
            booking: describe_one(&state, &session, booking)?,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/bookings/{id}",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking", body = BookingRes),
        (status = 403, description = "Booking belongs to another doctor", body = ErrorRes),
        (status = 404, description = "No such booking", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn get_booking(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<BookingRes>, ApiError> {
    let booking = state.lifecycle.get(&session, parse_id(&id)?)?;
    Ok(Json(describe_one(&state, &session, booking)?))
}

#[utoipa::path(
    get,
    path = "/queue",
    params(QueueQuery),
    responses(
        (status = 200, description = "Today's bookings for the calling doctor, earliest first", body = ListBookingsRes),
        (status = 403, description = "Caller is not a doctor", body = ErrorRes)
    )
)]
/// The calling doctor's queue for today
///
/// "Today" is the current calendar day at the clinic's configured UTC offset.
#[axum::debug_handler]
pub async fn doctor_queue(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Query(query): Query<QueueQuery>,
) -> Result<Json<ListBookingsRes>, ApiError> {
    let status: Option<BookingStatus> = parse_optional(query.status.as_deref())?;
    let bookings = state.lifecycle.doctor_queue(&session, status)?;
    Ok(Json(ListBookingsRes {
        bookings: describe(&state, &session, bookings)?,
    }))
}

// ---------------------------------------------------------------------------
// Examinations
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/bookings/{id}/start",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking moved to InProgress", body = BookingRes),
        (status = 403, description = "Caller is not the assigned doctor", body = ErrorRes),
        (status = 409, description = "Booking is not Waiting", body = ErrorRes)
    )
)]
/// Call the patient in
#[axum::debug_handler]
pub async fn start_examination(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<BookingRes>, ApiError> {
    let booking = state.lifecycle.start(&session, parse_id(&id)?)?;
    Ok(Json(describe_one(&state, &session, booking)?))
}

#[utoipa::path(
    post,
    path = "/bookings/{id}/finish",
    params(("id" = String, Path, description = "Booking id")),
    request_body = FinishExaminationReq,
    responses(
        (status = 200, description = "Booking finished and medical record written", body = FinishExaminationRes),
        (status = 400, description = "Diagnosis is blank", body = ErrorRes),
        (status = 403, description = "Caller is not the assigned doctor", body = ErrorRes),
        (status = 404, description = "No such booking", body = ErrorRes),
        (status = 409, description = "Booking already finished or cancelled", body = ErrorRes)
    )
)]
/// Finish an examination
///
/// Moves the booking to Finished and writes its medical record as one unit: either both are
/// stored or neither is.
///
/// # Returns
/// * `Ok(Json<FinishExaminationRes>)` - The finished booking, the new record and a confirmation
///   message for the doctor
///
/// # Errors
/// Returns `409 Conflict` if:
/// - the booking was already finished, or
/// - the booking was cancelled.
#[axum::debug_handler]
pub async fn finish_examination(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<FinishExaminationReq>,
) -> Result<Json<FinishExaminationRes>, ApiError> {
    let finished = state.lifecycle.finish(
        &session,
        parse_id(&id)?,
        &req.diagnosis,
        req.notes.as_deref(),
    )?;

    let medical_record = medical_record_res(&finished.record);
    Ok(Json(FinishExaminationRes {
        booking: describe_one(&state, &session, finished.booking)?,
        medical_record,
        message: finished.notification.into(),
    }))
}

#[utoipa::path(
    post,
    path = "/bookings/{id}/cancel",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking cancelled", body = BookingRes),
        (status = 403, description = "Role may not cancel bookings", body = ErrorRes),
        (status = 409, description = "Booking already finished or cancelled", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn cancel_booking(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<BookingRes>, ApiError> {
    let booking = state.lifecycle.cancel(&session, parse_id(&id)?)?;
    Ok(Json(describe_one(&state, &session, booking)?))
}

#[utoipa::path(
    get,
    path = "/bookings/{id}/examination",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Recorded diagnosis and notes, or placeholders", body = ExaminationDetailRes),
        (status = 403, description = "Booking belongs to another doctor", body = ErrorRes),
        (status = 404, description = "No such booking", body = ErrorRes)
    )
)]
/// Read-only examination outcome of a booking
#[axum::debug_handler]
pub async fn examination_detail(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<ExaminationDetailRes>, ApiError> {
    let id = parse_id(&id)?;
    let detail = state.lifecycle.view_detail(&session, id)?;
    Ok(Json(ExaminationDetailRes {
        booking_id: id.to_string(),
        recorded: detail.record().is_some(),
        diagnosis: detail.diagnosis().into(),
        notes: detail.notes().into(),
    }))
}
