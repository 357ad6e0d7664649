//! Handlers for `/rules` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/rules` | Ordered by id |
//! | `POST`   | `/rules` | Body: `{"description":"..."}`; 409 for a second "No Rule" |
//! | `GET`    | `/rules/default` | The "No Rule" sentinel, created on first use |
//! | `GET`    | `/rules/:id` | 404 if not found |
//! | `PUT`    | `/rules/:id` | 409 when renamed to an existing sentinel |
//! | `DELETE` | `/rules/:id` | Also deletes its links and their days |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use regua_core::{
  rule::{NewRule, Rule, RuleId},
  store::ScheduleStore,
};

use crate::error::ApiError;

/// `GET /rules`
pub async fn list<S: ScheduleStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Rule>>, ApiError> {
  let rules = store.list_rules().await.map_err(ApiError::from_store)?;
  Ok(Json(rules))
}

/// `POST /rules`
pub async fn create<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewRule>,
) -> Result<impl IntoResponse, ApiError> {
  let rule = store.create_rule(body).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(rule)))
}

/// `GET /rules/default`
pub async fn default_rule<S: ScheduleStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Rule>, ApiError> {
  let rule = store.default_rule().await.map_err(ApiError::from_store)?;
  Ok(Json(rule))
}

/// `GET /rules/:id`
pub async fn get_one<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<RuleId>,
) -> Result<Json<Rule>, ApiError> {
  let rule = store
    .get_rule(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("rule {id} not found")))?;
  Ok(Json(rule))
}

/// `PUT /rules/:id`
pub async fn update<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<RuleId>,
  Json(body): Json<NewRule>,
) -> Result<Json<Rule>, ApiError> {
  let rule = store
    .update_rule(id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(rule))
}

/// `DELETE /rules/:id`
pub async fn delete<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<RuleId>,
) -> Result<StatusCode, ApiError> {
  store.delete_rule(id).await.map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
