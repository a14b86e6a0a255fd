//! Profile and session endpoints

use axum::{
    extract::State,
    http::{header, HeaderMap},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use kith_core::user::UserProfile;
use kith_core::KithError;

use crate::routes::{identify, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/logout", post(logout))
}

/// GET /profile - The signed-in user's profile
async fn get_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserProfile>, AppError> {
    Ok(Json(identify(&state, &headers)?))
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: String,
    pub phone: Option<String>,
    pub home_location: Option<String>,
}

/// PUT /profile - Update display fields; the email is the account key
/// and stays fixed
async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, AppError> {
    let mut user = identify(&state, &headers)?;
    let store = state.store()?;

    user.full_name = req.full_name;
    user.phone = req.phone;
    user.home_location = req.home_location;
    store.update_profile(&user)?;

    Ok(Json(user))
}

/// POST /logout - Revoke the presented session token
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(KithError::NotAuthenticated)?;

    let store = state.store()?;
    // Resolve first so an unknown token still reads as unauthenticated
    store.session_user(token)?;
    store.revoke_session(token)?;

    Ok(Json(serde_json::json!({ "signed_out": true })))
}
