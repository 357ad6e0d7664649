//! Handlers for the catalog and the generated schedule diagram.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/catalog` | Every entity in one document |
//! | `GET`  | `/diagram` | Mermaid text; `ETag`, 304 on `If-None-Match` |
//! | `GET`  | `/diagram/download` | Same text as `schedule_diagram.mmd` |

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use regua_core::{
  Catalog,
  diagram::{self, DiagramOptions},
  store::ScheduleStore,
};

use crate::{
  DiagramState,
  error::ApiError,
  etag::{compute_etag, if_none_match},
};

/// File name offered by the download endpoint.
pub const DOWNLOAD_NAME: &str = "schedule_diagram.mmd";

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

async fn render<S: ScheduleStore>(
  store: &S,
  options: &DiagramOptions,
) -> Result<String, ApiError> {
  let catalog = store.load_catalog().await.map_err(ApiError::from_store)?;
  Ok(diagram::render(&catalog, options))
}

/// `GET /catalog`
pub async fn catalog<S: ScheduleStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Catalog>, ApiError> {
  let catalog = store.load_catalog().await.map_err(ApiError::from_store)?;
  Ok(Json(catalog))
}

/// `GET /diagram`
pub async fn show<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  State(DiagramState(options)): State<DiagramState>,
  headers: HeaderMap,
) -> Result<Response, ApiError> {
  let text = render(store.as_ref(), &options).await?;
  let etag = compute_etag(&text);

  if if_none_match(&headers, &etag) {
    return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
  }

  Ok(
    (
      [(header::CONTENT_TYPE, TEXT_PLAIN.to_owned()), (header::ETAG, etag)],
      text,
    )
      .into_response(),
  )
}

/// `GET /diagram/download`
pub async fn download<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  State(DiagramState(options)): State<DiagramState>,
) -> Result<Response, ApiError> {
  let text = render(store.as_ref(), &options).await?;
  let disposition = format!("attachment; filename=\"{DOWNLOAD_NAME}\"");

  Ok(
    (
      [
        (header::CONTENT_TYPE, TEXT_PLAIN.to_owned()),
        (header::CONTENT_DISPOSITION, disposition),
      ],
      text,
    )
      .into_response(),
  )
}
