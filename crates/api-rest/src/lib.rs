//! # API REST
//!
//! REST API implementation for the clinic.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, request authentication)
//!
//! Uses `api-shared` for common types and `clinic-core` for everything that touches records.

#![warn(rust_2018_idioms)]

mod convert;
mod error;
mod handlers;
mod session;

#[cfg(test)]
mod tests;

use axum::{
    routing::{get, post},
    Router,
};
use clinic_core::{
    utc_offset_from_env_value, BookingLifecycleService, ClinicResult, Clock, CoreConfig,
    DirectoryService, RecordStore, SystemClock,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use error::ApiError;
pub use session::{API_KEY_HEADER, USER_ID_HEADER};

/// Application state for the REST API server
///
/// Contains shared state that needs to be accessible to all request handlers: the core
/// configuration, both services over one record store, and the API key clients must present.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub directory: DirectoryService,
    pub lifecycle: BookingLifecycleService,
    api_key: Arc<str>,
}

impl AppState {
    /// Open the record store under `cfg` using the host clock.
    pub fn new(cfg: Arc<CoreConfig>, api_key: impl Into<Arc<str>>) -> ClinicResult<Self> {
        Self::with_clock(cfg, api_key, Arc::new(SystemClock))
    }

    pub fn with_clock(
        cfg: Arc<CoreConfig>,
        api_key: impl Into<Arc<str>>,
        clock: Arc<dyn Clock>,
    ) -> ClinicResult<Self> {
        let store = RecordStore::open(cfg.clone())?;
        Ok(Self {
            cfg,
            directory: DirectoryService::new(store.clone(), clock.clone()),
            lifecycle: BookingLifecycleService::new(store, clock),
            api_key: api_key.into(),
        })
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::list_patients,
        handlers::create_patient,
        handlers::get_patient,
        handlers::update_patient,
        handlers::delete_patient,
        handlers::list_users,
        handlers::create_user,
        handlers::get_user,
        handlers::delete_user,
        handlers::list_doctors,
        handlers::list_bookings,
        handlers::create_booking,
        handlers::create_booking_with_patient,
        handlers::get_booking,
        handlers::doctor_queue,
        handlers::start_examination,
        handlers::finish_examination,
        handlers::cancel_booking,
        handlers::examination_detail,
    ),
    components(schemas(
        api_shared::HealthRes,
        api_shared::ErrorRes,
        api_shared::PatientReq,
        api_shared::PatientRes,
        api_shared::ListPatientsRes,
        api_shared::UserReq,
        api_shared::UserRes,
        api_shared::ListUsersRes,
        api_shared::DeleteRes,
        api_shared::CreateBookingReq,
        api_shared::CreateBookingWithPatientReq,
        api_shared::CreateBookingWithPatientRes,
        api_shared::BookingRes,
        api_shared::ListBookingsRes,
        api_shared::FinishExaminationReq,
        api_shared::FinishExaminationRes,
        api_shared::MedicalRecordRes,
        api_shared::ExaminationDetailRes,
    ))
)]
pub struct ApiDoc;

/// Build the application router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/patients",
            get(handlers::list_patients).post(handlers::create_patient),
        )
        .route(
            "/patients/:id",
            get(handlers::get_patient)
                .put(handlers::update_patient)
                .delete(handlers::delete_patient),
        )
        .route(
            "/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            "/users/:id",
            get(handlers::get_user).delete(handlers::delete_user),
        )
        .route("/doctors", get(handlers::list_doctors))
        .route(
            "/bookings",
            get(handlers::list_bookings).post(handlers::create_booking),
        )
        .route(
            "/bookings/with-patient",
            post(handlers::create_booking_with_patient),
        )
        .route("/bookings/:id", get(handlers::get_booking))
        .route("/bookings/:id/start", post(handlers::start_examination))
        .route("/bookings/:id/finish", post(handlers::finish_examination))
        .route("/bookings/:id/cancel", post(handlers::cancel_booking))
        .route(
            "/bookings/:id/examination",
            get(handlers::examination_detail),
        )
        .route("/queue", get(handlers::doctor_queue))
        .merge(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Resolve [`CoreConfig`] from the environment.
///
/// # Environment Variables
/// - `CLINIC_DATA_DIR`: Directory for clinic records (default: "clinic_data")
/// - `CLINIC_UTC_OFFSET`: Clinic UTC offset such as `+07:00` (default: UTC)
///
/// # Errors
/// Returns an error if the offset cannot be parsed or the data directory is empty.
pub fn core_config_from_env() -> anyhow::Result<Arc<CoreConfig>> {
    let data_dir = std::env::var("CLINIC_DATA_DIR")
        .unwrap_or_else(|_| clinic_core::constants::DEFAULT_DATA_DIR.into());
    let utc_offset = utc_offset_from_env_value(std::env::var("CLINIC_UTC_OFFSET").ok())?;

    Ok(Arc::new(CoreConfig::new(PathBuf::from(data_dir), utc_offset)?))
}

/// Resolve the API key clients must present from the raw `API_KEY` value.
///
/// # Errors
/// Returns an error if the key is unset or blank.
pub fn api_key_from_env_value(value: Option<String>) -> anyhow::Result<String> {
    match value {
        Some(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(anyhow::anyhow!("API_KEY must be set for the REST API")),
    }
}

/// Bind `addr` and serve the router until the process is stopped.
///
/// # Errors
/// Returns an error if the address cannot be bound or the HTTP server fails while running.
pub async fn serve(state: AppState, addr: &str) -> anyhow::Result<()> {
    tracing::info!("-- Starting clinic REST API on {}", addr);
    tracing::info!(data_dir = %state.cfg.data_dir().display(), "using data directory");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}
