//! Handlers for `/themes` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/themes` | Ordered by id |
//! | `POST`   | `/themes` | Body: [`NewTheme`]; returns 201 |
//! | `GET`    | `/themes/:id` | 404 if not found |
//! | `PUT`    | `/themes/:id` | 400 if the theme names itself as alternative |
//! | `DELETE` | `/themes/:id` | Also deletes its links and their days |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use regua_core::{
  store::ScheduleStore,
  theme::{NewTheme, Theme, ThemeId},
};

use crate::error::ApiError;

/// `GET /themes`
pub async fn list<S: ScheduleStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Theme>>, ApiError> {
  let themes = store.list_themes().await.map_err(ApiError::from_store)?;
  Ok(Json(themes))
}

/// `POST /themes`
pub async fn create<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewTheme>,
) -> Result<impl IntoResponse, ApiError> {
  let theme = store.create_theme(body).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(theme)))
}

/// `GET /themes/:id`
pub async fn get_one<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<ThemeId>,
) -> Result<Json<Theme>, ApiError> {
  let theme = store
    .get_theme(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("theme {id} not found")))?;
  Ok(Json(theme))
}

/// `PUT /themes/:id`
pub async fn update<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<ThemeId>,
  Json(body): Json<NewTheme>,
) -> Result<Json<Theme>, ApiError> {
  let theme = store
    .update_theme(id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(theme))
}

/// `DELETE /themes/:id`
pub async fn delete<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<ThemeId>,
) -> Result<StatusCode, ApiError> {
  store.delete_theme(id).await.map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
