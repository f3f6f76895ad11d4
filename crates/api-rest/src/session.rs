//! Request authentication.
//!
//! Every endpoint except `/health` needs two headers: `x-api-key`, shared by all clients of
//! this deployment, and `x-user-id`, the staff member acting. The user id is resolved against
//! the directory so handlers receive a role-checked [`Session`].

use api_shared::auth::validate_api_key;
use axum::{extract::FromRequestParts, http::request::Parts};
use clinic_core::{ClinicError, Session};

use crate::{error::ApiError, AppState};

pub const API_KEY_HEADER: &str = "x-api-key";
pub const USER_ID_HEADER: &str = "x-user-id";

/// Extractor yielding the caller's [`Session`].
pub struct Authenticated(pub Session);

#[axum::async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        validate_api_key(header(parts, API_KEY_HEADER), &state.api_key)?;

        let user_id = header(parts, USER_ID_HEADER).ok_or_else(|| {
            ClinicError::Unauthenticated(format!("missing {USER_ID_HEADER} header"))
        })?;
        let session = state.directory.authenticate(user_id)?;
        Ok(Self(session))
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}
