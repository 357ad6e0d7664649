//! The `ScheduleStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `regua-store-sqlite`).
//! Higher layers (`regua-api`, `regua-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use crate::{
  Catalog,
  journey::{Journey, JourneyId, NewJourney},
  link::{LinkId, NewLink, ThemeRuleLink},
  rule::{NewRule, Rule, RuleId},
  schedule::{DayId, NewScheduledDay, ScheduledDay},
  theme::{NewTheme, Theme, ThemeId},
};

/// Backend errors that may wrap a domain [`crate::Error`].
///
/// Lets callers tell a not-found or a cycle conflict apart from an I/O
/// failure without knowing the backend's error type.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn as_core(&self) -> Option<&crate::Error>;
}

/// Abstraction over a schedule store backend.
///
/// Every write is atomic: it is visible in full or not at all. Deletes follow
/// the foreign-key rules of the data model:
///
/// - deleting a theme or rule deletes its links, and through them their days;
/// - deleting a link deletes its days and clears `alternative_id` on links
///   that pointed at it;
/// - deleting a theme clears `alternative_theme_id` on themes that pointed at
///   it; deleting a journey clears `journey_id` on its themes.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ScheduleStore: Send + Sync {
  type Error: StoreError;

  // ── Journeys ──────────────────────────────────────────────────────────

  fn create_journey(
    &self,
    input: NewJourney,
  ) -> impl Future<Output = Result<Journey, Self::Error>> + Send + '_;

  /// Retrieve a journey by id. Returns `None` if not found.
  fn get_journey(
    &self,
    id: JourneyId,
  ) -> impl Future<Output = Result<Option<Journey>, Self::Error>> + Send + '_;

  fn list_journeys(
    &self,
  ) -> impl Future<Output = Result<Vec<Journey>, Self::Error>> + Send + '_;

  fn update_journey(
    &self,
    id: JourneyId,
    input: NewJourney,
  ) -> impl Future<Output = Result<Journey, Self::Error>> + Send + '_;

  fn delete_journey(
    &self,
    id: JourneyId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Themes ────────────────────────────────────────────────────────────

  /// Create a theme. Referenced journey and alternative theme must exist.
  fn create_theme(
    &self,
    input: NewTheme,
  ) -> impl Future<Output = Result<Theme, Self::Error>> + Send + '_;

  fn get_theme(
    &self,
    id: ThemeId,
  ) -> impl Future<Output = Result<Option<Theme>, Self::Error>> + Send + '_;

  fn list_themes(
    &self,
  ) -> impl Future<Output = Result<Vec<Theme>, Self::Error>> + Send + '_;

  /// Replace every field of a theme. A theme may not be its own alternative.
  fn update_theme(
    &self,
    id: ThemeId,
    input: NewTheme,
  ) -> impl Future<Output = Result<Theme, Self::Error>> + Send + '_;

  fn delete_theme(
    &self,
    id: ThemeId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Rules ─────────────────────────────────────────────────────────────

  /// Create a rule. Rejects a second copy of the default sentinel.
  fn create_rule(
    &self,
    input: NewRule,
  ) -> impl Future<Output = Result<Rule, Self::Error>> + Send + '_;

  fn get_rule(
    &self,
    id: RuleId,
  ) -> impl Future<Output = Result<Option<Rule>, Self::Error>> + Send + '_;

  fn list_rules(
    &self,
  ) -> impl Future<Output = Result<Vec<Rule>, Self::Error>> + Send + '_;

  fn update_rule(
    &self,
    id: RuleId,
    input: NewRule,
  ) -> impl Future<Output = Result<Rule, Self::Error>> + Send + '_;

  fn delete_rule(
    &self,
    id: RuleId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The "No Rule" sentinel, created on first use.
  fn default_rule(
    &self,
  ) -> impl Future<Output = Result<Rule, Self::Error>> + Send + '_;

  // ── Theme-rule links ──────────────────────────────────────────────────

  /// Create a link. A missing rule means the default sentinel.
  fn create_link(
    &self,
    input: NewLink,
  ) -> impl Future<Output = Result<ThemeRuleLink, Self::Error>> + Send + '_;

  fn get_link(
    &self,
    id: LinkId,
  ) -> impl Future<Output = Result<Option<ThemeRuleLink>, Self::Error>> + Send + '_;

  fn list_links(
    &self,
  ) -> impl Future<Output = Result<Vec<ThemeRuleLink>, Self::Error>> + Send + '_;

  /// Replace a link's theme, rule and alternative.
  ///
  /// Fails with [`crate::Error::AlternativeCycle`] when the new alternative
  /// would close a loop; nothing is written in that case.
  fn update_link(
    &self,
    id: LinkId,
    input: NewLink,
  ) -> impl Future<Output = Result<ThemeRuleLink, Self::Error>> + Send + '_;

  fn delete_link(
    &self,
    id: LinkId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The alternative chain starting at `id`, see [`crate::chain::resolve_chain`].
  fn resolve_chain(
    &self,
    id: LinkId,
  ) -> impl Future<Output = Result<Vec<ThemeRuleLink>, Self::Error>> + Send + '_;

  // ── Scheduled days ────────────────────────────────────────────────────

  /// Schedule a link on a day, capturing the link's snapshot.
  fn schedule_day(
    &self,
    input: NewScheduledDay,
  ) -> impl Future<Output = Result<ScheduledDay, Self::Error>> + Send + '_;

  fn get_day(
    &self,
    id: DayId,
  ) -> impl Future<Output = Result<Option<ScheduledDay>, Self::Error>> + Send + '_;

  /// All scheduled days ordered by `(day, day_id)`.
  fn list_days(
    &self,
  ) -> impl Future<Output = Result<Vec<ScheduledDay>, Self::Error>> + Send + '_;

  /// Move an entry to another day and/or link. The snapshot is left as it
  /// was captured.
  fn update_day(
    &self,
    id: DayId,
    input: NewScheduledDay,
  ) -> impl Future<Output = Result<ScheduledDay, Self::Error>> + Send + '_;

  fn delete_day(
    &self,
    id: DayId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Load every entity at once for diagram generation. Scheduled days that
  /// cannot be decoded are left out with a warning.
  fn load_catalog(
    &self,
  ) -> impl Future<Output = Result<Catalog, Self::Error>> + Send + '_;
}
