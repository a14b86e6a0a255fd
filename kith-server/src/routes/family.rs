//! Family roster endpoints

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

use kith_core::family::FamilyMember;
use kith_core::store::Store;
use kith_core::KithError;

use crate::routes::{identify, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/family-members", get(list_members).post(add_member))
        .route("/family-members/{id}", put(update_member).delete(delete_member))
}

#[derive(Deserialize)]
pub struct RosterQuery {
    pub circle: String,
}

/// GET /family-members?circle=:id - A circle's roster, members only
async fn list_members(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RosterQuery>,
) -> Result<Json<Vec<FamilyMember>>, AppError> {
    let user = identify(&state, &headers)?;
    let store = state.store()?;

    require_membership(&store, &query.circle, &user.id)?;
    Ok(Json(store.family_members(&query.circle)?))
}

#[derive(Deserialize)]
pub struct AddMemberRequest {
    pub circle_id: String,
    pub name: String,
    pub age: Option<u32>,
    pub relationship: String,
}

/// POST /family-members - Add a person to a circle's roster
async fn add_member(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AddMemberRequest>,
) -> Result<Json<FamilyMember>, AppError> {
    let user = identify(&state, &headers)?;
    let store = state.store()?;

    require_membership(&store, &req.circle_id, &user.id)?;
    let member =
        store.add_family_member(&req.circle_id, &req.name, req.age, &req.relationship)?;

    Ok(Json(member))
}

#[derive(Deserialize)]
pub struct UpdateMemberRequest {
    pub name: String,
    pub age: Option<u32>,
    pub relationship: String,
    /// URL from the external photo store, when one was uploaded
    pub photo_url: Option<String>,
}

/// PUT /family-members/:id - Overwrite a roster entry
async fn update_member(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(member_id): Path<String>,
    Json(req): Json<UpdateMemberRequest>,
) -> Result<Json<FamilyMember>, AppError> {
    let user = identify(&state, &headers)?;
    let store = state.store()?;

    let mut member = store.family_member(&member_id)?;
    require_membership(&store, &member.circle_id, &user.id)?;

    member.name = req.name;
    member.age = req.age;
    member.relationship = req.relationship;
    member.photo_url = req.photo_url;
    store.update_family_member(&member)?;

    Ok(Json(member))
}

/// DELETE /family-members/:id
async fn delete_member(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(member_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = identify(&state, &headers)?;
    let store = state.store()?;

    let member = store.family_member(&member_id)?;
    require_membership(&store, &member.circle_id, &user.id)?;
    store.delete_family_member(&member_id)?;

    Ok(Json(serde_json::json!({ "deleted": member_id })))
}

fn require_membership(store: &Store, circle_id: &str, user_id: &str) -> Result<(), AppError> {
    let circle = store.circle(circle_id)?;
    let members = store.members(circle_id)?;
    if !kith_core::membership::is_joined(user_id, &circle, &members) {
        return Err(KithError::NotAMember(circle_id.to_string()).into());
    }
    Ok(())
}
