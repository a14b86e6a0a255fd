pub mod circles;
pub mod events;
pub mod family;
pub mod join;
pub mod notifications;
pub mod profile;

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use kith_core::user::UserProfile;
use kith_core::KithError;

use crate::state::AppState;

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Convert errors to HTTP responses. Domain errors carry their own
/// status; anything else is a 500.
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0.downcast_ref::<KithError>() {
            Some(KithError::NotAuthenticated) => StatusCode::UNAUTHORIZED,
            Some(
                KithError::UserNotFound(_)
                | KithError::CircleNotFound(_)
                | KithError::EventNotFound(_)
                | KithError::NotificationNotFound(_)
                | KithError::FamilyMemberNotFound(_),
            ) => StatusCode::NOT_FOUND,
            Some(
                KithError::NotAMember(_) | KithError::NotOwner | KithError::OwnerRemoval,
            ) => StatusCode::FORBIDDEN,
            Some(KithError::InvalidInvite | KithError::InvalidDate(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// Resolve the request's bearer token to a user.
pub fn identify(state: &AppState, headers: &HeaderMap) -> Result<UserProfile, AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(KithError::NotAuthenticated)?;

    Ok(state.store()?.session_user(token)?)
}
