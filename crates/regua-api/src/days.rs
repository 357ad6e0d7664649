//! Handlers for `/days` endpoints (scheduled days).
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/days` | Ordered by day, then id |
//! | `POST`   | `/days` | Body: `{"day":3,"link_id":1}`; captures the snapshot |
//! | `GET`    | `/days/:id` | 404 if not found |
//! | `PUT`    | `/days/:id` | Moves the entry; the snapshot is kept |
//! | `DELETE` | `/days/:id` | |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use regua_core::{
  schedule::{DayId, NewScheduledDay, ScheduledDay},
  store::ScheduleStore,
};

use crate::error::ApiError;

/// `GET /days`
pub async fn list<S: ScheduleStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<ScheduledDay>>, ApiError> {
  let days = store.list_days().await.map_err(ApiError::from_store)?;
  Ok(Json(days))
}

/// `POST /days`
pub async fn create<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewScheduledDay>,
) -> Result<impl IntoResponse, ApiError> {
  let day = store.schedule_day(body).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(day)))
}

/// `GET /days/:id`
pub async fn get_one<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<DayId>,
) -> Result<Json<ScheduledDay>, ApiError> {
  let day = store
    .get_day(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("scheduled day {id} not found")))?;
  Ok(Json(day))
}

/// `PUT /days/:id`
pub async fn update<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<DayId>,
  Json(body): Json<NewScheduledDay>,
) -> Result<Json<ScheduledDay>, ApiError> {
  let day = store
    .update_day(id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(day))
}

/// `DELETE /days/:id`
pub async fn delete<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<DayId>,
) -> Result<StatusCode, ApiError> {
  store.delete_day(id).await.map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
