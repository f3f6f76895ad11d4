use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{FixedOffset, TimeZone, Utc};
use clinic_core::{FixedClock, NewUser, RecordId, Role};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const KEY: &str = "test-key";

struct Harness {
    _dir: TempDir,
    app: Router,
    cs: String,
    doctor: String,
}

/// Clinic at +07:00 whose clock reads 2026-02-24 09:05 local time.
fn harness() -> Harness {
    let dir = TempDir::new().unwrap();
    let offset = FixedOffset::east_opt(7 * 3600).unwrap();
    let cfg = Arc::new(CoreConfig::new(dir.path().to_path_buf(), offset).unwrap());
    let now = Utc.with_ymd_and_hms(2026, 2, 24, 2, 5, 0).unwrap();
    let state = AppState::with_clock(cfg, KEY, Arc::new(FixedClock(now))).unwrap();

    let admin = state
        .directory
        .bootstrap_admin("Admin", "admin@clinic.test")
        .unwrap();
    let admin = state.directory.authenticate(&admin.id.to_string()).unwrap();
    let staff = |name: &str, email: &str, role: Role| {
        state
            .directory
            .create_user(
                &admin,
                NewUser {
                    name: name.into(),
                    email: email.into(),
                    role,
                },
            )
            .unwrap()
            .id
            .to_string()
    };
    let cs = staff("Desk", "desk@clinic.test", Role::Cs);
    let doctor = staff("Dr. Amin", "amin@clinic.test", Role::Doctor);

    Harness {
        _dir: dir,
        app: router(state),
        cs,
        doctor,
    }
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    headers: &[(&str, &str)],
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn send_as(
    app: &Router,
    user: &str,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    request(
        app,
        method,
        uri,
        &[(API_KEY_HEADER, KEY), (USER_ID_HEADER, user)],
        body,
    )
    .await
}

fn siti() -> Value {
    json!({
        "name": "Siti Aminah",
        "gender": "female",
        "date_of_birth": "1990-01-01",
        "phone_number": "08123456789",
        "address": "Jl. Merdeka 1"
    })
}

/// Registers Siti and books her with the doctor; returns the booking id.
async fn book_siti(h: &Harness, date: &str, time: &str) -> String {
    let (status, patient) = send_as(&h.app, &h.cs, "POST", "/patients", Some(siti())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, booking) = send_as(
        &h.app,
        &h.cs,
        "POST",
        "/bookings",
        Some(json!({
            "patient_id": patient["id"],
            "doctor_id": h.doctor,
            "appointment_date": date,
            "appointment_time": time
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    booking["id"].as_str().unwrap().to_string()
}

#[test]
fn test_api_key_is_required() {
    assert_eq!(
        api_key_from_env_value(Some("secret".into())).unwrap(),
        "secret"
    );
    assert!(api_key_from_env_value(None).is_err());
    assert!(api_key_from_env_value(Some("  ".into())).is_err());
}

#[tokio::test]
async fn test_health_needs_no_credentials() {
    let h = harness();
    let (status, body) = request(&h.app, "GET", "/health", &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_requests_need_key_and_known_user() {
    let h = harness();

    let (status, _) = request(
        &h.app,
        "GET",
        "/patients",
        &[(USER_ID_HEADER, h.cs.as_str())],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request(
        &h.app,
        "GET",
        "/patients",
        &[(API_KEY_HEADER, "wrong"), (USER_ID_HEADER, h.cs.as_str())],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let stranger = RecordId::new().to_string();
    let (status, body) = send_as(&h.app, &stranger, "GET", "/patients", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");
}

#[tokio::test]
async fn test_finish_examination_end_to_end() {
    let h = harness();
    let booking_id = book_siti(&h, "2026-02-24", "09:30").await;

    let (status, body) = send_as(
        &h.app,
        &h.doctor,
        "POST",
        &format!("/bookings/{booking_id}/finish"),
        Some(json!({ "diagnosis": "Common cold", "notes": "Rest for three days" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Examination finished: data saved");
    assert_eq!(body["booking"]["status"], "Finished");
    assert_eq!(body["booking"]["patient_name"], "Siti Aminah");
    assert_eq!(body["medical_record"]["appointment_id"], booking_id.as_str());
    assert_eq!(body["medical_record"]["doctor_id"], h.doctor.as_str());

    let (status, body) = send_as(
        &h.app,
        &h.doctor,
        "POST",
        &format!("/bookings/{booking_id}/finish"),
        Some(json!({ "diagnosis": "Flu" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, detail) = send_as(
        &h.app,
        &h.cs,
        "GET",
        &format!("/bookings/{booking_id}/examination"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["recorded"], true);
    assert_eq!(detail["diagnosis"], "Common cold");

    let (status, list) = send_as(&h.app, &h.cs, "GET", "/bookings?status=Finished", None).await;
    assert_eq!(status, StatusCode::OK);
    let bookings = list["bookings"].as_array().unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0]["diagnosis"], "Common cold");
    assert_eq!(bookings[0]["doctor_name"], "Dr. Amin");
    assert_eq!(bookings[0]["appointment_time"], "2026-02-24T09:30");
}

#[tokio::test]
async fn test_blank_diagnosis_leaves_booking_waiting() {
    let h = harness();
    let booking_id = book_siti(&h, "2026-02-24", "09:30").await;

    let (status, body) = send_as(
        &h.app,
        &h.doctor,
        "POST",
        &format!("/bookings/{booking_id}/finish"),
        Some(json!({ "diagnosis": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");

    let (_, booking) = send_as(
        &h.app,
        &h.cs,
        "GET",
        &format!("/bookings/{booking_id}"),
        None,
    )
    .await;
    assert_eq!(booking["status"], "Waiting");

    let (_, detail) = send_as(
        &h.app,
        &h.cs,
        "GET",
        &format!("/bookings/{booking_id}/examination"),
        None,
    )
    .await;
    assert_eq!(detail["recorded"], false);
    assert_eq!(detail["diagnosis"], "-");
}

#[tokio::test]
async fn test_only_doctors_finish_and_only_desk_cancels() {
    let h = harness();
    let booking_id = book_siti(&h, "2026-02-24", "09:30").await;

    let (status, _) = send_as(
        &h.app,
        &h.cs,
        "POST",
        &format!("/bookings/{booking_id}/finish"),
        Some(json!({ "diagnosis": "Flu" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send_as(
        &h.app,
        &h.doctor,
        "POST",
        &format!("/bookings/{booking_id}/cancel"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send_as(
        &h.app,
        &h.cs,
        "POST",
        &format!("/bookings/{booking_id}/cancel"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Cancelled");

    let (status, _) = send_as(
        &h.app,
        &h.doctor,
        "POST",
        &format!("/bookings/{booking_id}/finish"),
        Some(json!({ "diagnosis": "Flu" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_booking_references_are_checked() {
    let h = harness();
    let (_, patient) = send_as(&h.app, &h.cs, "POST", "/patients", Some(siti())).await;

    let (status, body) = send_as(
        &h.app,
        &h.cs,
        "POST",
        "/bookings",
        Some(json!({
            "patient_id": patient["id"],
            "doctor_id": h.cs,
            "appointment_date": "2026-02-24",
            "appointment_time": "10:00"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "unprocessable");

    let (status, _) = send_as(
        &h.app,
        &h.cs,
        "POST",
        "/bookings",
        Some(json!({
            "patient_id": RecordId::new().to_string(),
            "doctor_id": h.doctor,
            "appointment_date": "2026-02-24",
            "appointment_time": "10:00"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send_as(
        &h.app,
        &h.cs,
        "POST",
        "/bookings",
        Some(json!({
            "patient_id": "not-an-id",
            "doctor_id": h.doctor,
            "appointment_date": "2026-02-24",
            "appointment_time": "10:00"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_booking_is_not_found() {
    let h = harness();
    let (status, body) = send_as(
        &h.app,
        &h.doctor,
        "POST",
        &format!("/bookings/{}/finish", RecordId::new()),
        Some(json!({ "diagnosis": "Flu" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_queue_shows_today_for_calling_doctor() {
    let h = harness();
    let today = book_siti(&h, "2026-02-24", "09:30").await;
    book_siti(&h, "2026-02-25", "09:30").await;

    let (status, body) = send_as(&h.app, &h.doctor, "GET", "/queue", None).await;
    assert_eq!(status, StatusCode::OK);
    let bookings = body["bookings"].as_array().unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0]["id"], today.as_str());
    assert_eq!(bookings[0]["patient_gender"], "female");

    let (status, _) = send_as(&h.app, &h.cs, "GET", "/queue", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_book_with_new_patient() {
    let h = harness();
    let (status, body) = send_as(
        &h.app,
        &h.cs,
        "POST",
        "/bookings/with-patient",
        Some(json!({
            "patient": siti(),
            "doctor_id": h.doctor,
            "appointment_date": "2026-02-24",
            "appointment_time": "11:15"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["booking"]["patient_id"], body["patient"]["id"]);
    assert_eq!(body["booking"]["status"], "Waiting");

    let (_, patients) = send_as(&h.app, &h.cs, "GET", "/patients?name=siti", None).await;
    assert_eq!(patients["patients"].as_array().unwrap().len(), 1);
}
