//! Circle, membership and invite endpoints

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use kith_core::circle::{Circle, CircleRef, Invite, Member};
use kith_core::KithError;

use crate::routes::{identify, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/circles", get(list_circles).post(create_circle))
        .route("/circles/{id}", get(circle_details).delete(delete_circle))
        .route("/circles/{id}/members/{user_id}", delete(remove_member))
        .route("/circles/{id}/invites", post(create_invite))
        .route("/circles/{id}/invites/{invite_id}", delete(revoke_invite))
}

/// GET /circles - Circles the signed-in user owns or has joined
async fn list_circles(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<CircleRef>>, AppError> {
    let user = identify(&state, &headers)?;
    let store = state.store()?;

    Ok(Json(store.joined_circles(&user.id)?))
}

/// Request body for creating a circle
#[derive(Deserialize)]
pub struct CreateCircleRequest {
    pub name: String,
    /// When present, an invite is created and mailed right away
    pub invite_email: Option<String>,
    pub origin: Option<String>,
}

/// How the optional initial invite went. The join link is always
/// returned so the creator can share it by hand when mailing failed.
#[derive(Serialize)]
pub struct InviteOutcome {
    pub email: String,
    pub invite_link: String,
    pub email_sent: bool,
    pub email_error: Option<String>,
}

#[derive(Serialize)]
pub struct CreateCircleResponse {
    pub circle: CircleRef,
    pub invite: Option<InviteOutcome>,
}

/// POST /circles - Create a circle owned by the signed-in user
async fn create_circle(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateCircleRequest>,
) -> Result<Json<CreateCircleResponse>, AppError> {
    let user = identify(&state, &headers)?;
    let mut store = state.store()?;

    let circle = store.create_circle(&req.name, &user.id)?;
    tracing::info!(circle = %circle.id, owner = %user.id, "circle created");

    let invite = match req.invite_email {
        Some(email) => Some(
            send_invite(
                &state,
                &store.create_invite(&circle.id, &email, &user.id)?,
                &circle.name,
                req.origin.as_deref(),
            )
            .await,
        ),
        None => None,
    };

    Ok(Json(CreateCircleResponse {
        circle: CircleRef::from(&circle),
        invite,
    }))
}

/// Mail an invite, reporting failure in the outcome instead of failing
/// the surrounding operation.
async fn send_invite(
    state: &AppState,
    invite: &Invite,
    circle_name: &str,
    origin: Option<&str>,
) -> InviteOutcome {
    match state
        .mailer
        .send_circle_invite(&invite.email, circle_name, &invite.token, origin)
        .await
    {
        Ok(link) => InviteOutcome {
            email: invite.email.clone(),
            invite_link: link,
            email_sent: true,
            email_error: None,
        },
        Err(e) => {
            tracing::warn!(email = %invite.email, error = %e, "invite mail failed");
            InviteOutcome {
                email: invite.email.clone(),
                invite_link: state.mailer.invite_link(&invite.token, origin),
                email_sent: false,
                email_error: Some(e.to_string()),
            }
        }
    }
}

#[derive(Serialize)]
pub struct CircleDetails {
    pub circle: Circle,
    pub members: Vec<Member>,
    pub invites: Vec<Invite>,
}

/// GET /circles/:id - Members and invites, visible to members only
async fn circle_details(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(circle_id): Path<String>,
) -> Result<Json<CircleDetails>, AppError> {
    let user = identify(&state, &headers)?;
    let store = state.store()?;

    let circle = store.circle(&circle_id)?;
    let members = store.members(&circle_id)?;
    if circle.owner_id != user.id && !members.iter().any(|m| m.user_id == user.id) {
        return Err(KithError::NotAMember(circle_id).into());
    }

    let invites = store.invites(&circle_id)?;
    Ok(Json(CircleDetails {
        circle,
        members,
        invites,
    }))
}

/// DELETE /circles/:id - Owner only
async fn delete_circle(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(circle_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = identify(&state, &headers)?;
    let mut store = state.store()?;

    require_owner(&store, &circle_id, &user.id)?;
    store.delete_circle(&circle_id)?;
    tracing::info!(circle = %circle_id, "circle deleted");

    Ok(Json(serde_json::json!({ "deleted": circle_id })))
}

/// DELETE /circles/:id/members/:user_id - Owner only; the owner's own
/// membership cannot be removed
async fn remove_member(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((circle_id, member_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = identify(&state, &headers)?;
    let store = state.store()?;

    require_owner(&store, &circle_id, &user.id)?;
    store.remove_member(&circle_id, &member_id)?;

    Ok(Json(serde_json::json!({ "removed": member_id })))
}

#[derive(Deserialize)]
pub struct CreateInviteRequest {
    pub email: String,
    pub origin: Option<String>,
}

#[derive(Serialize)]
pub struct CreateInviteResponse {
    pub invite: Invite,
    pub outcome: InviteOutcome,
}

/// POST /circles/:id/invites - Owner only; mails the join link
async fn create_invite(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(circle_id): Path<String>,
    Json(req): Json<CreateInviteRequest>,
) -> Result<Json<CreateInviteResponse>, AppError> {
    let user = identify(&state, &headers)?;
    let store = state.store()?;

    let circle = require_owner(&store, &circle_id, &user.id)?;
    let invite = store.create_invite(&circle_id, &req.email, &user.id)?;
    let outcome = send_invite(&state, &invite, &circle.name, req.origin.as_deref()).await;

    Ok(Json(CreateInviteResponse { invite, outcome }))
}

/// DELETE /circles/:id/invites/:invite_id - Owner only
async fn revoke_invite(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((circle_id, invite_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = identify(&state, &headers)?;
    let store = state.store()?;

    require_owner(&store, &circle_id, &user.id)?;
    store.revoke_invite(&circle_id, &invite_id)?;

    Ok(Json(serde_json::json!({ "revoked": invite_id })))
}

fn require_owner(
    store: &kith_core::store::Store,
    circle_id: &str,
    user_id: &str,
) -> Result<Circle, AppError> {
    let circle = store.circle(circle_id)?;
    if circle.owner_id != user_id {
        return Err(KithError::NotOwner.into());
    }
    Ok(circle)
}
