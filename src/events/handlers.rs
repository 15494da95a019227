use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument};

use super::dto::{ChangesResponse, EventPayload, EventResponse, EventsResponse};
use super::repo::Event;
use crate::auth::extractors::{CurrentUser, StaffUser};
use crate::error::ApiError;
use crate::scope::Scope;
use crate::state::AppState;

#[instrument(skip(state, user), fields(user_id = user.0.id))]
pub async fn list_events(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<EventsResponse>, ApiError> {
    let scope = Scope::for_session(&user.0);
    let events = Event::list(&state.db, &scope).await?;
    Ok(Json(EventsResponse { events }))
}

#[instrument(skip(state, user), fields(user_id = user.0.id))]
pub async fn get_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<EventResponse>, ApiError> {
    let scope = Scope::for_session(&user.0);
    let event = Event::get(&state.db, &scope, id)
        .await?
        .ok_or(ApiError::NotFound("event"))?;
    Ok(Json(EventResponse { event }))
}

#[instrument(skip(state, staff, payload), fields(user_id = staff.0.id))]
pub async fn create_event(
    State(state): State<AppState>,
    staff: StaffUser,
    Json(payload): Json<EventPayload>,
) -> Result<(StatusCode, Json<EventResponse>), ApiError> {
    let new = payload.validate()?;
    let event = Event::create(&state.db, &staff.0, &new).await?;
    info!(event_id = event.id, "event created");
    Ok((StatusCode::CREATED, Json(EventResponse { event })))
}

#[instrument(skip(state, staff, payload), fields(user_id = staff.0.id))]
pub async fn update_event(
    State(state): State<AppState>,
    staff: StaffUser,
    Path(id): Path<i64>,
    Json(payload): Json<EventPayload>,
) -> Result<Json<ChangesResponse>, ApiError> {
    let new = payload.validate()?;
    let changes = Event::update(&state.db, id, &new).await?;
    if changes == 0 {
        return Err(ApiError::NotFound("event"));
    }
    info!(event_id = id, "event updated");
    Ok(Json(ChangesResponse { changes }))
}

#[instrument(skip(state, staff), fields(user_id = staff.0.id))]
pub async fn delete_event(
    State(state): State<AppState>,
    staff: StaffUser,
    Path(id): Path<i64>,
) -> Result<Json<ChangesResponse>, ApiError> {
    let changes = Event::delete(&state.db, id).await?;
    if changes == 0 {
        return Err(ApiError::NotFound("event"));
    }
    info!(event_id = id, "event deleted");
    Ok(Json(ChangesResponse { changes }))
}
