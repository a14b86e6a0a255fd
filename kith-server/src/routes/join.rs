//! Invite acceptance and the invite-mail relay endpoint

use axum::{
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use kith_core::circle::CircleRef;

use crate::routes::{identify, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/join-circle", post(join_circle))
        .route("/send-circle-invite", post(send_circle_invite))
}

#[derive(Deserialize)]
pub struct JoinCircleRequest {
    pub token: String,
}

#[derive(Serialize)]
pub struct JoinCircleResponse {
    pub circle: CircleRef,
}

/// POST /join-circle - Consume an invite token for the signed-in user
async fn join_circle(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<JoinCircleRequest>,
) -> Result<Json<JoinCircleResponse>, AppError> {
    let user = identify(&state, &headers)?;
    let mut store = state.store()?;

    let circle = store.accept_invite(&req.token, &user.id)?;
    tracing::info!(circle = %circle.id, user = %user.id, "invite accepted");

    Ok(Json(JoinCircleResponse { circle }))
}

/// Request body of the mail relay. Field names match the original
/// hosted function, so existing clients keep working.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendInviteRequest {
    pub email: String,
    pub circle_name: String,
    pub token: String,
    #[serde(default)]
    pub origin: Option<String>,
}

#[derive(Serialize)]
pub struct SendInviteResponse {
    pub success: bool,
}

/// POST /send-circle-invite - Compose and send one invite mail
async fn send_circle_invite(
    State(state): State<AppState>,
    Json(req): Json<SendInviteRequest>,
) -> Result<Json<SendInviteResponse>, AppError> {
    state
        .mailer
        .send_circle_invite(&req.email, &req.circle_name, &req.token, req.origin.as_deref())
        .await?;

    Ok(Json(SendInviteResponse { success: true }))
}
