//! JSON REST API for Régua.
//!
//! Exposes an axum [`Router`] backed by any [`regua_core::store::ScheduleStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", regua_api::api_router(store.clone(), options))
//! ```

pub mod days;
pub mod diagram;
pub mod error;
pub mod etag;
pub mod journeys;
pub mod links;
pub mod rules;
pub mod themes;

use std::sync::Arc;

use axum::{Router, extract::FromRef, routing::get};
use regua_core::{diagram::DiagramOptions, store::ScheduleStore};

pub use error::ApiError;

// ─── State ────────────────────────────────────────────────────────────────────

/// Shared state for the API handlers. Most handlers only extract the store.
pub struct ApiState<S> {
  pub store:   Arc<S>,
  pub diagram: Arc<DiagramOptions>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:   Arc::clone(&self.store),
      diagram: Arc::clone(&self.diagram),
    }
  }
}

impl<S> FromRef<ApiState<S>> for Arc<S> {
  fn from_ref(state: &ApiState<S>) -> Self { Arc::clone(&state.store) }
}

/// Diagram options as a handler sub-state.
///
/// Wrapped so its `FromRef` impl cannot overlap the `Arc<S>` one.
#[derive(Clone)]
pub struct DiagramState(pub Arc<DiagramOptions>);

impl<S> FromRef<ApiState<S>> for DiagramState {
  fn from_ref(state: &ApiState<S>) -> Self {
    Self(Arc::clone(&state.diagram))
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, diagram: DiagramOptions) -> Router<()>
where
  S: ScheduleStore + 'static,
{
  let state = ApiState { store, diagram: Arc::new(diagram) };

  Router::new()
    // Journeys
    .route("/journeys", get(journeys::list::<S>).post(journeys::create::<S>))
    .route(
      "/journeys/{id}",
      get(journeys::get_one::<S>)
        .put(journeys::update::<S>)
        .delete(journeys::delete::<S>),
    )
    // Themes
    .route("/themes", get(themes::list::<S>).post(themes::create::<S>))
    .route(
      "/themes/{id}",
      get(themes::get_one::<S>)
        .put(themes::update::<S>)
        .delete(themes::delete::<S>),
    )
    // Rules
    .route("/rules", get(rules::list::<S>).post(rules::create::<S>))
    .route("/rules/default", get(rules::default_rule::<S>))
    .route(
      "/rules/{id}",
      get(rules::get_one::<S>)
        .put(rules::update::<S>)
        .delete(rules::delete::<S>),
    )
    // Theme-rule links
    .route("/links", get(links::list::<S>).post(links::create::<S>))
    .route(
      "/links/{id}",
      get(links::get_one::<S>)
        .put(links::update::<S>)
        .delete(links::delete::<S>),
    )
    .route("/links/{id}/chain", get(links::chain::<S>))
    // Scheduled days
    .route("/days", get(days::list::<S>).post(days::create::<S>))
    .route(
      "/days/{id}",
      get(days::get_one::<S>)
        .put(days::update::<S>)
        .delete(days::delete::<S>),
    )
    // Catalog & diagram
    .route("/catalog", get(diagram::catalog::<S>))
    .route("/diagram", get(diagram::show::<S>))
    .route("/diagram/download", get(diagram::download::<S>))
    .with_state(state)
}
