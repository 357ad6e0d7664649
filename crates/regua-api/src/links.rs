//! Handlers for `/links` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/links` | Ordered by id |
//! | `POST`   | `/links` | Body: [`NewLink`]; `rule_id` defaults to "No Rule" |
//! | `GET`    | `/links/:id` | 404 if not found |
//! | `PUT`    | `/links/:id` | 409 if the alternative would close a loop |
//! | `DELETE` | `/links/:id` | Clears alternatives that pointed here |
//! | `GET`    | `/links/:id/chain` | The alternative chain starting at `id` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use regua_core::{
  link::{LinkId, NewLink, ThemeRuleLink},
  store::ScheduleStore,
};

use crate::error::ApiError;

/// `GET /links`
pub async fn list<S: ScheduleStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<ThemeRuleLink>>, ApiError> {
  let links = store.list_links().await.map_err(ApiError::from_store)?;
  Ok(Json(links))
}

/// `POST /links`
pub async fn create<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewLink>,
) -> Result<impl IntoResponse, ApiError> {
  let link = store.create_link(body).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(link)))
}

/// `GET /links/:id`
pub async fn get_one<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<LinkId>,
) -> Result<Json<ThemeRuleLink>, ApiError> {
  let link = store
    .get_link(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("link {id} not found")))?;
  Ok(Json(link))
}

/// `PUT /links/:id`
///
/// A rejected cycle leaves the stored link as it was; the client should
/// redisplay the previous values.
pub async fn update<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<LinkId>,
  Json(body): Json<NewLink>,
) -> Result<Json<ThemeRuleLink>, ApiError> {
  let link = store
    .update_link(id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(link))
}

/// `DELETE /links/:id`
pub async fn delete<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<LinkId>,
) -> Result<StatusCode, ApiError> {
  store.delete_link(id).await.map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /links/:id/chain`
pub async fn chain<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<LinkId>,
) -> Result<Json<Vec<ThemeRuleLink>>, ApiError> {
  let chain = store.resolve_chain(id).await.map_err(ApiError::from_store)?;
  Ok(Json(chain))
}
