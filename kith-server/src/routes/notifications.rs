//! Notification endpoints: visibility, publishing and read state

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kith_core::notification::{has_unread, visible_notifications, Notification};
use kith_core::store::Store;
use kith_core::{KithError, KithResult};

use crate::routes::{identify, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications).post(publish))
        .route("/notifications/{id}/read", post(mark_read))
        .route("/notifications/read-all", post(mark_all_read))
}

#[derive(Serialize)]
pub struct NotificationView {
    pub id: String,
    pub circle_id: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub unread: bool,
}

#[derive(Serialize)]
pub struct NotificationList {
    pub notifications: Vec<NotificationView>,
    /// Badge state: true while any visible notification is unread
    pub has_unread: bool,
}

fn visible_for(store: &Store, user_id: &str) -> KithResult<Vec<Notification>> {
    let joined = store.joined_circle_ids(user_id)?;
    Ok(visible_notifications(&store.all_notifications()?, &joined))
}

/// GET /notifications - Notifications of joined circles, newest first
async fn list_notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<NotificationList>, AppError> {
    let user = identify(&state, &headers)?;
    let store = state.store()?;

    let visible = visible_for(&store, &user.id)?;
    let badge = has_unread(&visible, &user.id);

    let notifications = visible
        .into_iter()
        .map(|n| {
            let unread = !n.is_read_by(&user.id);
            NotificationView {
                id: n.id,
                circle_id: n.circle_id,
                message: n.message,
                created_at: n.created_at,
                unread,
            }
        })
        .collect();

    Ok(Json(NotificationList {
        notifications,
        has_unread: badge,
    }))
}

#[derive(Deserialize)]
pub struct PublishRequest {
    pub circle_id: String,
    pub message: String,
}

/// POST /notifications - Publish to a circle the user has joined
async fn publish(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PublishRequest>,
) -> Result<Json<Notification>, AppError> {
    let user = identify(&state, &headers)?;
    let store = state.store()?;

    if !store.joined_circle_ids(&user.id)?.contains(&req.circle_id) {
        return Err(KithError::NotAMember(req.circle_id).into());
    }

    let notification = store.publish_notification(&req.circle_id, &req.message)?;
    tracing::info!(circle = %notification.circle_id, "notification published");

    Ok(Json(notification))
}

#[derive(Serialize)]
pub struct MarkReadResponse {
    /// False when the notification had already been read
    pub updated: bool,
}

/// POST /notifications/:id/read - Idempotent read receipt
async fn mark_read(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(notification_id): Path<String>,
) -> Result<Json<MarkReadResponse>, AppError> {
    let user = identify(&state, &headers)?;
    let store = state.store()?;

    // Only visible notifications can be acknowledged
    let visible = visible_for(&store, &user.id)?;
    if !visible.iter().any(|n| n.id == notification_id) {
        return Err(KithError::NotificationNotFound(notification_id).into());
    }

    let updated = store.mark_notification_read(&notification_id, &user.id)?;
    Ok(Json(MarkReadResponse { updated }))
}

#[derive(Serialize)]
pub struct FailedUpdate {
    pub id: String,
    pub error: String,
}

#[derive(Serialize)]
pub struct MarkAllReadResponse {
    pub updated: Vec<String>,
    pub failed: Vec<FailedUpdate>,
}

/// POST /notifications/read-all - Mark every visible unread
/// notification; failures are reported per notification
async fn mark_all_read(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MarkAllReadResponse>, AppError> {
    let user = identify(&state, &headers)?;
    let store = state.store()?;

    let unread_ids: Vec<String> = visible_for(&store, &user.id)?
        .into_iter()
        .filter(|n| !n.is_read_by(&user.id))
        .map(|n| n.id)
        .collect();

    let outcome = store.mark_all_read(&unread_ids, &user.id);
    if !outcome.failed.is_empty() {
        tracing::warn!(
            failed = outcome.failed.len(),
            "some read receipts could not be written"
        );
    }

    Ok(Json(MarkAllReadResponse {
        updated: outcome.updated,
        failed: outcome
            .failed
            .into_iter()
            .map(|(id, error)| FailedUpdate { id, error })
            .collect(),
    }))
}
