//! Handlers for `/journeys` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/journeys` | Ordered by id |
//! | `POST`   | `/journeys` | Body: [`NewJourney`]; returns 201 |
//! | `GET`    | `/journeys/:id` | 404 if not found |
//! | `PUT`    | `/journeys/:id` | Replaces name and description |
//! | `DELETE` | `/journeys/:id` | Themes keep existing with no journey |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use regua_core::{
  journey::{Journey, JourneyId, NewJourney},
  store::ScheduleStore,
};

use crate::error::ApiError;

/// `GET /journeys`
pub async fn list<S: ScheduleStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Journey>>, ApiError> {
  let journeys = store.list_journeys().await.map_err(ApiError::from_store)?;
  Ok(Json(journeys))
}

/// `POST /journeys`
pub async fn create<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewJourney>,
) -> Result<impl IntoResponse, ApiError> {
  let journey = store
    .create_journey(body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(journey)))
}

/// `GET /journeys/:id`
pub async fn get_one<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<JourneyId>,
) -> Result<Json<Journey>, ApiError> {
  let journey = store
    .get_journey(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("journey {id} not found")))?;
  Ok(Json(journey))
}

/// `PUT /journeys/:id`
pub async fn update<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<JourneyId>,
  Json(body): Json<NewJourney>,
) -> Result<Json<Journey>, ApiError> {
  let journey = store
    .update_journey(id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(journey))
}

/// `DELETE /journeys/:id`
pub async fn delete<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<JourneyId>,
) -> Result<StatusCode, ApiError> {
  store.delete_journey(id).await.map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
