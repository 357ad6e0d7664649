//! HTTP front end for Régua.
//!
//! Mounts the JSON API from `regua-api` under `/api`, adds request tracing,
//! and carries the server configuration.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::{Router, routing::get};
use regua_core::{diagram::DiagramOptions, store::ScheduleStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `REGUA_*` environment variables. Every field has a default.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Labels and direction of the generated flowchart.
  pub diagram:    DiagramOptions,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_string(),
      port:       5240,
      store_path: PathBuf::from("~/.local/share/regua/regua.db"),
      diagram:    DiagramOptions::default(),
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router for `store`.
pub fn app<S>(store: Arc<S>, config: &ServerConfig) -> Router
where
  S: ScheduleStore + 'static,
{
  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", regua_api::api_router(store, config.diagram.clone()))
    .layer(TraceLayer::new_for_http())
}

// ─── Export ───────────────────────────────────────────────────────────────────

/// Render the current schedule and write it to `path`.
pub async fn export_diagram<S>(
  store: &S,
  options: &DiagramOptions,
  path: &std::path::Path,
) -> anyhow::Result<()>
where
  S: ScheduleStore,
{
  let catalog = store
    .load_catalog()
    .await
    .context("failed to load the schedule")?;
  let text = regua_core::diagram::render(&catalog, options);
  tokio::fs::write(path, &text)
    .await
    .with_context(|| format!("failed to write {path:?}"))?;
  tracing::info!(path = %path.display(), bytes = text.len(), "exported diagram");
  Ok(())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use regua_core::{
    diagram::Direction, link::NewLink, schedule::NewScheduledDay, theme::NewTheme,
  };
  use regua_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  async fn get_text(app: Router, uri: &str) -> (StatusCode, String) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
  }

  #[test]
  fn empty_config_uses_defaults() {
    let cfg: ServerConfig = config::Config::builder()
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap();
    assert_eq!(cfg.port, 5240);
    assert_eq!(cfg.diagram, DiagramOptions::default());
  }

  #[test]
  fn diagram_labels_can_be_localised() {
    let cfg: ServerConfig = config::Config::builder()
      .set_override("diagram.day_label", "Dia")
      .unwrap()
      .set_override("diagram.terminal_label", "Fim")
      .unwrap()
      .set_override("diagram.direction", "TD")
      .unwrap()
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap();
    assert_eq!(cfg.diagram.day_label, "Dia");
    assert_eq!(cfg.diagram.terminal_label, "Fim");
    assert_eq!(cfg.diagram.direction, Direction::Td);
    assert_eq!(cfg.diagram.yes_label, "Yes");
  }

  #[tokio::test]
  async fn api_is_nested_under_prefix() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let config = ServerConfig {
      diagram: DiagramOptions { day_label: "Dia".into(), ..Default::default() },
      ..Default::default()
    };
    let theme = store.create_theme(NewTheme::new("Boas-vindas")).await.unwrap();
    let link = store
      .create_link(NewLink { theme_id: theme.theme_id, rule_id: None, alternative_id: None })
      .await
      .unwrap();
    store
      .schedule_day(NewScheduledDay::new(1, link.link_id))
      .await
      .unwrap();

    let (status, body) = get_text(app(store.clone(), &config), "/api/diagram").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("D1[\"Dia 1\"]"));
    assert!(body.contains("[\"Boas-vindas\"]"));

    let (status, _) = get_text(app(store, &config), "/diagram").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn export_writes_the_rendered_text() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let path = std::env::temp_dir()
      .join(format!("regua-export-{}.mmd", std::process::id()));

    export_diagram(&store, &DiagramOptions::default(), &path)
      .await
      .unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).ok();
    let catalog = store.load_catalog().await.unwrap();
    assert_eq!(
      written,
      regua_core::diagram::render(&catalog, &DiagramOptions::default())
    );
    assert!(written.contains("EMPTY"));
  }
}
