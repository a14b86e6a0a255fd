//! Calendar endpoints: month view and event CRUD

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::{get, put},
    Json, Router,
};
use chrono::{Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use kith_core::event::{Event, EventOwner, RepeatRule};
use kith_core::month_grid::{parse_month, MonthGrid};
use kith_core::recurrence::expand_events;
use kith_core::store::Store;
use kith_core::KithError;

use crate::routes::{identify, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events", get(month_view).post(create_event))
        .route("/events/{id}", put(update_event).delete(delete_event))
}

#[derive(Deserialize)]
pub struct MonthQuery {
    /// YYYY-MM; defaults to the current month
    pub month: Option<String>,
}

#[derive(Serialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub events: Vec<Event>,
}

/// A month of calendar cells, padded to full weeks. Empty cells are
/// the blank leading/trailing days of the calendar page.
#[derive(Serialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    pub cells: Vec<Option<DayCell>>,
}

/// GET /events?month=YYYY-MM - The signed-in user's month view,
/// including events of every joined circle and repeat occurrences
async fn month_view(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthView>, AppError> {
    let user = identify(&state, &headers)?;
    let store = state.store()?;

    let (year, month) = match &query.month {
        Some(raw) => parse_month(raw)?,
        None => {
            let today = Utc::now().date_naive();
            (today.year(), today.month())
        }
    };

    let grid = MonthGrid::new(year, month)?;
    let events = store.events_visible_to(&user.id)?;
    let mut occurrences = expand_events(&events, &grid.days());

    let cells = grid
        .cells()
        .iter()
        .map(|cell| {
            cell.map(|date| DayCell {
                date,
                events: occurrences.remove(&date).unwrap_or_default(),
            })
        })
        .collect();

    Ok(Json(MonthView { year, month, cells }))
}

#[derive(Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub repeat: Option<RepeatRule>,
    /// Share with this circle instead of keeping the event private
    pub circle_id: Option<String>,
}

/// POST /events - Create a private or circle-shared event
async fn create_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateEventRequest>,
) -> Result<Json<Event>, AppError> {
    let user = identify(&state, &headers)?;
    let store = state.store()?;

    let owner = match req.circle_id {
        Some(circle_id) => {
            require_membership(&store, &circle_id, &user.id)?;
            EventOwner::Circle(circle_id)
        }
        None => EventOwner::User(user.id),
    };

    let mut event = Event::new(req.title, req.date, owner);
    event.start_time = req.start_time;
    event.end_time = req.end_time;
    event.repeat = req.repeat;

    store.create_event(&event)?;
    Ok(Json(event))
}

#[derive(Deserialize)]
pub struct UpdateEventRequest {
    pub title: String,
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub repeat: Option<RepeatRule>,
}

/// PUT /events/:id - Overwrite an event
async fn update_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
    Json(req): Json<UpdateEventRequest>,
) -> Result<Json<Event>, AppError> {
    let user = identify(&state, &headers)?;
    let store = state.store()?;

    let mut event = editable_event(&store, &event_id, &user.id)?;
    event.title = req.title;
    event.date = req.date;
    event.start_time = req.start_time;
    event.end_time = req.end_time;
    event.repeat = req.repeat;

    store.update_event(&event)?;
    Ok(Json(event))
}

/// DELETE /events/:id
async fn delete_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = identify(&state, &headers)?;
    let store = state.store()?;

    editable_event(&store, &event_id, &user.id)?;
    store.delete_event(&event_id)?;

    Ok(Json(serde_json::json!({ "deleted": event_id })))
}

/// Fetch an event the user may modify. Someone else's private event
/// reads as not-found rather than revealing it exists.
fn editable_event(store: &Store, event_id: &str, user_id: &str) -> Result<Event, AppError> {
    let event = store.event(event_id)?;

    match &event.owner {
        EventOwner::User(owner_id) if owner_id == user_id => Ok(event),
        EventOwner::User(_) => Err(KithError::EventNotFound(event_id.to_string()).into()),
        EventOwner::Circle(circle_id) => {
            require_membership(store, circle_id, user_id)?;
            Ok(event)
        }
    }
}

fn require_membership(store: &Store, circle_id: &str, user_id: &str) -> Result<(), AppError> {
    let circle = store.circle(circle_id)?;
    let members = store.members(circle_id)?;
    if !kith_core::membership::is_joined(user_id, &circle, &members) {
        return Err(KithError::NotAMember(circle_id.to_string()).into());
    }
    Ok(())
}
