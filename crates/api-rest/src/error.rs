use api_shared::{auth::AuthError, ErrorRes};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use clinic_core::ClinicError;

/// Failure of a REST request, rendered as an [`ErrorRes`] body.
#[derive(Debug)]
pub enum ApiError {
    Clinic(ClinicError),
    Auth(AuthError),
    BadRequest(String),
    /// The request named a patient or doctor that cannot take part in a booking.
    Unprocessable(ClinicError),
    Internal(String),
}

impl ApiError {
    /// Treat lookups of the referenced patient or doctor as unprocessable input rather than a
    /// missing resource.
    pub fn referential(err: ClinicError) -> Self {
        match err {
            ClinicError::NotFound { .. } | ClinicError::NotADoctor(_) => Self::Unprocessable(err),
            other => Self::Clinic(other),
        }
    }

    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            ApiError::Unprocessable(_) => (StatusCode::UNPROCESSABLE_ENTITY, "unprocessable"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            ApiError::Auth(AuthError::NotConfigured) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
            ApiError::Auth(_) => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            ApiError::Clinic(err) => match err {
                ClinicError::InvalidInput(_)
                | ClinicError::InvalidField { .. }
                | ClinicError::Uuid(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
                ClinicError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "unauthenticated"),
                ClinicError::Forbidden { .. }
                | ClinicError::NotAssignedDoctor { .. }
                | ClinicError::SelfDeletion => (StatusCode::FORBIDDEN, "forbidden"),
                ClinicError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
                ClinicError::NotADoctor(_) => (StatusCode::UNPROCESSABLE_ENTITY, "unprocessable"),
                ClinicError::AdminAlreadyExists
                | ClinicError::DuplicateEmail(_)
                | ClinicError::AlreadyFinished(_)
                | ClinicError::InvalidTransition { .. }
                | ClinicError::RecordFileExists { .. } => (StatusCode::CONFLICT, "conflict"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            },
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Clinic(err) | ApiError::Unprocessable(err) => err.to_string(),
            ApiError::Auth(err) => err.to_string(),
            ApiError::BadRequest(message) | ApiError::Internal(message) => message.clone(),
        }
    }
}

impl From<ClinicError> for ApiError {
    fn from(err: ClinicError) -> Self {
        Self::Clinic(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::Auth(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {:?}", self);
            "Internal error".to_string()
        } else {
            self.message()
        };

        let body = ErrorRes {
            error: kind.into(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
