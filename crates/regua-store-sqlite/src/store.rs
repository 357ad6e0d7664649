//! [`SqliteStore`]: the SQLite implementation of [`ScheduleStore`].

use std::{collections::BTreeMap, path::Path};

use chrono::Utc;
use regua_core::{
  Catalog,
  chain,
  journey::{Journey, JourneyId, NewJourney},
  link::{LinkId, NewLink, ThemeRuleLink},
  rule::{self, DEFAULT_RULE, NewRule, Rule, RuleId},
  schedule::{DayId, NewScheduledDay, ScheduledDay, Snapshot},
  store::ScheduleStore,
  theme::{NewTheme, Theme, ThemeId},
};
use rusqlite::{Connection, OptionalExtension as _, Transaction, params};

use crate::{
  Error, Result,
  encode::{
    RawScheduledDay, encode_dt, journey_from_row, link_from_row,
    rule_from_row, theme_from_row,
  },
  migrate,
  schema::{
    DAY_COLUMNS, JOURNEY_COLUMNS, LINK_COLUMNS, RULE_COLUMNS, SCHEMA,
    THEME_COLUMNS,
  },
};

type CoreError = regua_core::Error;

// ─── Transaction plumbing ────────────────────────────────────────────────────

/// Failure inside a write transaction. `Core` rolls back and is returned to
/// the caller as a domain error; `Sql` surfaces as a database error.
pub(crate) enum TxError {
  Sql(rusqlite::Error),
  Core(CoreError),
}

impl From<rusqlite::Error> for TxError {
  fn from(e: rusqlite::Error) -> Self { Self::Sql(e) }
}

impl From<CoreError> for TxError {
  fn from(e: CoreError) -> Self { Self::Core(e) }
}

pub(crate) type TxResult<T> = std::result::Result<T, TxError>;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Régua schedule store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::from_connection(conn).await
  }

  /// Open an in-memory store, used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::from_connection(conn).await
  }

  /// Wrap an already-open connection, initialising the schema and bringing
  /// older databases up to date.
  pub async fn from_connection(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let store = Self { conn };
    store.init_schema().await?;
    store.migrate().await;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Best-effort: a failure here leaves the store usable.
  pub(crate) async fn migrate(&self) {
    let outcome = self
      .conn
      .call(|conn| {
        let added = migrate::add_missing_columns(conn)?;
        let filled = migrate::backfill_snapshots(conn)?;
        Ok((added, filled))
      })
      .await;

    match outcome {
      Ok((added, filled)) if !added.is_empty() || filled > 0 => {
        tracing::info!(?added, filled, "migrated scheduled_days snapshots");
      }
      Ok(_) => {}
      Err(e) => tracing::warn!("schema migration skipped: {e}"),
    }
  }

  /// Run `f` inside one transaction; commit only if it succeeds.
  async fn write<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Transaction<'_>) -> TxResult<T> + Send + 'static,
  {
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        match f(&tx) {
          Ok(value) => {
            tx.commit()?;
            Ok(Ok(value))
          }
          Err(TxError::Sql(e)) => Err(e.into()),
          Err(TxError::Core(e)) => Ok(Err(e)),
        }
      })
      .await?;
    Ok(outcome?)
  }

  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
  {
    Ok(self.conn.call(move |conn| Ok(f(&*conn)?)).await?)
  }

  async fn delete_by_id(
    &self,
    sql: &'static str,
    id: i64,
    missing: CoreError,
  ) -> Result<()> {
    self
      .write(move |tx| {
        if tx.execute(sql, [id])? == 0 {
          return Err(missing.into());
        }
        Ok(())
      })
      .await
  }
}

// ─── Query helpers ───────────────────────────────────────────────────────────

fn exists(conn: &Connection, table: &str, key: &str, id: i64) -> rusqlite::Result<bool> {
  let sql = format!("SELECT 1 FROM {table} WHERE {key} = ?1");
  Ok(conn.query_row(&sql, [id], |_| Ok(())).optional()?.is_some())
}

fn require_journey(conn: &Connection, id: JourneyId) -> TxResult<()> {
  if !exists(conn, "journeys", "journey_id", id)? {
    return Err(CoreError::JourneyNotFound(id).into());
  }
  Ok(())
}

fn require_theme(conn: &Connection, id: ThemeId) -> TxResult<()> {
  if !exists(conn, "themes", "theme_id", id)? {
    return Err(CoreError::ThemeNotFound(id).into());
  }
  Ok(())
}

fn require_rule(conn: &Connection, id: RuleId) -> TxResult<()> {
  if !exists(conn, "rules", "rule_id", id)? {
    return Err(CoreError::RuleNotFound(id).into());
  }
  Ok(())
}

fn require_link(conn: &Connection, id: LinkId) -> TxResult<()> {
  if !exists(conn, "theme_rule_links", "link_id", id)? {
    return Err(CoreError::LinkNotFound(id).into());
  }
  Ok(())
}

fn select_all<T>(
  conn: &Connection,
  sql: &str,
  map: fn(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
) -> rusqlite::Result<Vec<T>> {
  let mut stmt = conn.prepare(sql)?;
  let rows = stmt.query_map([], map)?.collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn select_one<T>(
  conn: &Connection,
  sql: &str,
  id: i64,
  map: fn(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
) -> rusqlite::Result<Option<T>> {
  conn.query_row(sql, [id], map).optional()
}

fn load_links(conn: &Connection) -> rusqlite::Result<BTreeMap<LinkId, ThemeRuleLink>> {
  let links = select_all(
    conn,
    &format!("SELECT {LINK_COLUMNS} FROM theme_rule_links"),
    link_from_row,
  )?;
  Ok(links.into_iter().map(|l| (l.link_id, l)).collect())
}

fn find_default_rule(conn: &Connection) -> rusqlite::Result<Option<Rule>> {
  let rules = select_all(
    conn,
    &format!("SELECT {RULE_COLUMNS} FROM rules ORDER BY rule_id"),
    rule_from_row,
  )?;
  Ok(rules.into_iter().find(|r| rule::is_default(&r.description)))
}

fn ensure_default_rule(conn: &Connection) -> rusqlite::Result<Rule> {
  if let Some(rule) = find_default_rule(conn)? {
    return Ok(rule);
  }
  conn.execute("INSERT INTO rules (description) VALUES (?1)", [DEFAULT_RULE])?;
  let rule = Rule {
    rule_id:     conn.last_insert_rowid(),
    description: DEFAULT_RULE.to_owned(),
  };
  tracing::info!(rule_id = rule.rule_id, "created default rule");
  Ok(rule)
}

/// The rule a link should use: the given one if it exists, otherwise the
/// default sentinel.
fn resolve_rule(conn: &Connection, rule_id: Option<RuleId>) -> TxResult<RuleId> {
  match rule_id {
    Some(id) => {
      require_rule(conn, id)?;
      Ok(id)
    }
    None => Ok(ensure_default_rule(conn)?.rule_id),
  }
}

fn check_theme_refs(conn: &Connection, input: &NewTheme) -> TxResult<()> {
  if let Some(journey_id) = input.journey_id {
    require_journey(conn, journey_id)?;
  }
  if let Some(alternative) = input.alternative_theme_id {
    require_theme(conn, alternative)?;
  }
  Ok(())
}

/// Copy the current data of `link_id` into a [`Snapshot`].
///
/// The alternative theme is the theme of the link's alternative when there
/// is one, otherwise the theme's own alternative.
pub(crate) fn capture_snapshot(conn: &Connection, link_id: LinkId) -> TxResult<Snapshot> {
  let link = select_one(
    conn,
    &format!("SELECT {LINK_COLUMNS} FROM theme_rule_links WHERE link_id = ?1"),
    link_id,
    link_from_row,
  )?
  .ok_or(CoreError::LinkNotFound(link_id))?;

  let theme = select_one(
    conn,
    &format!("SELECT {THEME_COLUMNS} FROM themes WHERE theme_id = ?1"),
    link.theme_id,
    theme_from_row,
  )?
  .ok_or(CoreError::ThemeNotFound(link.theme_id))?;

  let alternative_link_theme: Option<ThemeId> = match link.alternative_id {
    Some(alt) => conn
      .query_row(
        "SELECT theme_id FROM theme_rule_links WHERE link_id = ?1",
        [alt],
        |r| r.get(0),
      )
      .optional()?,
    None => None,
  };

  let journey_name: Option<String> = match theme.journey_id {
    Some(journey_id) => conn
      .query_row(
        "SELECT name FROM journeys WHERE journey_id = ?1",
        [journey_id],
        |r| r.get(0),
      )
      .optional()?,
    None => None,
  };

  Ok(Snapshot {
    theme_id: theme.theme_id,
    theme_name: theme.name,
    rule_id: link.rule_id,
    alternative_theme_id: alternative_link_theme.or(theme.alternative_theme_id),
    journey_id: theme.journey_id,
    journey_name,
  })
}

fn select_day(conn: &Connection, id: DayId) -> rusqlite::Result<Option<RawScheduledDay>> {
  select_one(
    conn,
    &format!("SELECT {DAY_COLUMNS} FROM scheduled_days WHERE day_id = ?1"),
    id,
    RawScheduledDay::from_row,
  )
}

fn select_days(conn: &Connection) -> rusqlite::Result<Vec<RawScheduledDay>> {
  select_all(
    conn,
    &format!("SELECT {DAY_COLUMNS} FROM scheduled_days ORDER BY day, day_id"),
    RawScheduledDay::from_row,
  )
}

// ─── ScheduleStore impl ──────────────────────────────────────────────────────

impl ScheduleStore for SqliteStore {
  type Error = Error;

  // ── Journeys ──────────────────────────────────────────────────────────────

  async fn create_journey(&self, input: NewJourney) -> Result<Journey> {
    input.validate()?;
    self
      .write(move |tx| {
        tx.execute(
          "INSERT INTO journeys (name, description) VALUES (?1, ?2)",
          params![input.name, input.description],
        )?;
        Ok(Journey {
          journey_id:  tx.last_insert_rowid(),
          name:        input.name,
          description: input.description,
        })
      })
      .await
  }

  async fn get_journey(&self, id: JourneyId) -> Result<Option<Journey>> {
    self
      .read(move |conn| {
        select_one(
          conn,
          &format!("SELECT {JOURNEY_COLUMNS} FROM journeys WHERE journey_id = ?1"),
          id,
          journey_from_row,
        )
      })
      .await
  }

  async fn list_journeys(&self) -> Result<Vec<Journey>> {
    self
      .read(|conn| {
        select_all(
          conn,
          &format!("SELECT {JOURNEY_COLUMNS} FROM journeys ORDER BY journey_id"),
          journey_from_row,
        )
      })
      .await
  }

  async fn update_journey(&self, id: JourneyId, input: NewJourney) -> Result<Journey> {
    input.validate()?;
    self
      .write(move |tx| {
        let changed = tx.execute(
          "UPDATE journeys SET name = ?1, description = ?2 WHERE journey_id = ?3",
          params![input.name, input.description, id],
        )?;
        if changed == 0 {
          return Err(CoreError::JourneyNotFound(id).into());
        }
        Ok(Journey {
          journey_id:  id,
          name:        input.name,
          description: input.description,
        })
      })
      .await
  }

  async fn delete_journey(&self, id: JourneyId) -> Result<()> {
    self
      .delete_by_id(
        "DELETE FROM journeys WHERE journey_id = ?1",
        id,
        CoreError::JourneyNotFound(id),
      )
      .await?;
    tracing::info!(journey_id = id, "deleted journey");
    Ok(())
  }

  // ── Themes ────────────────────────────────────────────────────────────────

  async fn create_theme(&self, input: NewTheme) -> Result<Theme> {
    input.validate(None)?;
    self
      .write(move |tx| {
        check_theme_refs(tx, &input)?;
        tx.execute(
          "INSERT INTO themes (
             name, description, objective, journey_id, alternative_theme_id
           ) VALUES (?1, ?2, ?3, ?4, ?5)",
          params![
            input.name,
            input.description,
            input.objective,
            input.journey_id,
            input.alternative_theme_id,
          ],
        )?;
        Ok(Theme {
          theme_id:             tx.last_insert_rowid(),
          name:                 input.name,
          description:          input.description,
          objective:            input.objective,
          journey_id:           input.journey_id,
          alternative_theme_id: input.alternative_theme_id,
        })
      })
      .await
  }

  async fn get_theme(&self, id: ThemeId) -> Result<Option<Theme>> {
    self
      .read(move |conn| {
        select_one(
          conn,
          &format!("SELECT {THEME_COLUMNS} FROM themes WHERE theme_id = ?1"),
          id,
          theme_from_row,
        )
      })
      .await
  }

  async fn list_themes(&self) -> Result<Vec<Theme>> {
    self
      .read(|conn| {
        select_all(
          conn,
          &format!("SELECT {THEME_COLUMNS} FROM themes ORDER BY theme_id"),
          theme_from_row,
        )
      })
      .await
  }

  async fn update_theme(&self, id: ThemeId, input: NewTheme) -> Result<Theme> {
    input.validate(Some(id))?;
    self
      .write(move |tx| {
        require_theme(tx, id)?;
        check_theme_refs(tx, &input)?;
        tx.execute(
          "UPDATE themes
           SET name = ?1, description = ?2, objective = ?3,
               journey_id = ?4, alternative_theme_id = ?5
           WHERE theme_id = ?6",
          params![
            input.name,
            input.description,
            input.objective,
            input.journey_id,
            input.alternative_theme_id,
            id,
          ],
        )?;
        Ok(Theme {
          theme_id:             id,
          name:                 input.name,
          description:          input.description,
          objective:            input.objective,
          journey_id:           input.journey_id,
          alternative_theme_id: input.alternative_theme_id,
        })
      })
      .await
  }

  async fn delete_theme(&self, id: ThemeId) -> Result<()> {
    self
      .delete_by_id(
        "DELETE FROM themes WHERE theme_id = ?1",
        id,
        CoreError::ThemeNotFound(id),
      )
      .await?;
    tracing::info!(theme_id = id, "deleted theme and its links");
    Ok(())
  }

  // ── Rules ─────────────────────────────────────────────────────────────────

  async fn create_rule(&self, input: NewRule) -> Result<Rule> {
    input.validate()?;
    self
      .write(move |tx| {
        if rule::is_default(&input.description) && find_default_rule(tx)?.is_some() {
          return Err(CoreError::DuplicateDefaultRule.into());
        }
        tx.execute(
          "INSERT INTO rules (description) VALUES (?1)",
          params![input.description],
        )?;
        Ok(Rule {
          rule_id:     tx.last_insert_rowid(),
          description: input.description,
        })
      })
      .await
  }

  async fn get_rule(&self, id: RuleId) -> Result<Option<Rule>> {
    self
      .read(move |conn| {
        select_one(
          conn,
          &format!("SELECT {RULE_COLUMNS} FROM rules WHERE rule_id = ?1"),
          id,
          rule_from_row,
        )
      })
      .await
  }

  async fn list_rules(&self) -> Result<Vec<Rule>> {
    self
      .read(|conn| {
        select_all(
          conn,
          &format!("SELECT {RULE_COLUMNS} FROM rules ORDER BY rule_id"),
          rule_from_row,
        )
      })
      .await
  }

  async fn update_rule(&self, id: RuleId, input: NewRule) -> Result<Rule> {
    input.validate()?;
    self
      .write(move |tx| {
        require_rule(tx, id)?;
        if rule::is_default(&input.description)
          && find_default_rule(tx)?.is_some_and(|r| r.rule_id != id)
        {
          return Err(CoreError::DuplicateDefaultRule.into());
        }
        tx.execute(
          "UPDATE rules SET description = ?1 WHERE rule_id = ?2",
          params![input.description, id],
        )?;
        Ok(Rule { rule_id: id, description: input.description })
      })
      .await
  }

  async fn delete_rule(&self, id: RuleId) -> Result<()> {
    self
      .delete_by_id(
        "DELETE FROM rules WHERE rule_id = ?1",
        id,
        CoreError::RuleNotFound(id),
      )
      .await?;
    tracing::info!(rule_id = id, "deleted rule and its links");
    Ok(())
  }

  async fn default_rule(&self) -> Result<Rule> {
    self.write(|tx| Ok(ensure_default_rule(tx)?)).await
  }

  // ── Theme-rule links ──────────────────────────────────────────────────────

  async fn create_link(&self, input: NewLink) -> Result<ThemeRuleLink> {
    self
      .write(move |tx| {
        require_theme(tx, input.theme_id)?;
        let rule_id = resolve_rule(tx, input.rule_id)?;
        let links = load_links(tx)?;
        chain::check_alternative(&links, None, input.alternative_id)?;

        tx.execute(
          "INSERT INTO theme_rule_links (theme_id, rule_id, alternative_id)
           VALUES (?1, ?2, ?3)",
          params![input.theme_id, rule_id, input.alternative_id],
        )?;
        Ok(ThemeRuleLink {
          link_id: tx.last_insert_rowid(),
          theme_id: input.theme_id,
          rule_id,
          alternative_id: input.alternative_id,
        })
      })
      .await
  }

  async fn get_link(&self, id: LinkId) -> Result<Option<ThemeRuleLink>> {
    self
      .read(move |conn| {
        select_one(
          conn,
          &format!("SELECT {LINK_COLUMNS} FROM theme_rule_links WHERE link_id = ?1"),
          id,
          link_from_row,
        )
      })
      .await
  }

  async fn list_links(&self) -> Result<Vec<ThemeRuleLink>> {
    let links = self.read(load_links).await?;
    Ok(links.into_values().collect())
  }

  async fn update_link(&self, id: LinkId, input: NewLink) -> Result<ThemeRuleLink> {
    let result = self
      .write(move |tx| {
        require_link(tx, id)?;
        require_theme(tx, input.theme_id)?;
        let rule_id = resolve_rule(tx, input.rule_id)?;
        let links = load_links(tx)?;
        chain::check_alternative(&links, Some(id), input.alternative_id)?;

        tx.execute(
          "UPDATE theme_rule_links
           SET theme_id = ?1, rule_id = ?2, alternative_id = ?3
           WHERE link_id = ?4",
          params![input.theme_id, rule_id, input.alternative_id, id],
        )?;
        Ok(ThemeRuleLink {
          link_id: id,
          theme_id: input.theme_id,
          rule_id,
          alternative_id: input.alternative_id,
        })
      })
      .await;

    if let Err(Error::Core(e @ CoreError::AlternativeCycle { .. })) = &result {
      tracing::warn!(link_id = id, "rejected link edit: {e}");
    }
    result
  }

  async fn delete_link(&self, id: LinkId) -> Result<()> {
    self
      .delete_by_id(
        "DELETE FROM theme_rule_links WHERE link_id = ?1",
        id,
        CoreError::LinkNotFound(id),
      )
      .await?;
    tracing::info!(link_id = id, "deleted link and its scheduled days");
    Ok(())
  }

  async fn resolve_chain(&self, id: LinkId) -> Result<Vec<ThemeRuleLink>> {
    let links = self.read(load_links).await?;
    let start = links.get(&id).ok_or(CoreError::LinkNotFound(id))?;
    Ok(
      chain::resolve_chain(&links, start)
        .into_iter()
        .cloned()
        .collect(),
    )
  }

  // ── Scheduled days ────────────────────────────────────────────────────────

  async fn schedule_day(&self, input: NewScheduledDay) -> Result<ScheduledDay> {
    input.validate()?;
    let captured_at = Utc::now();
    let captured_at_str = encode_dt(captured_at);

    self
      .write(move |tx| {
        let snapshot = capture_snapshot(tx, input.link_id)?;
        tx.execute(
          "INSERT INTO scheduled_days (
             day, link_id, theme_id, theme_name, rule_id,
             alternative_theme_id, journey_id, journey_name, captured_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          params![
            input.day,
            input.link_id,
            snapshot.theme_id,
            snapshot.theme_name,
            snapshot.rule_id,
            snapshot.alternative_theme_id,
            snapshot.journey_id,
            snapshot.journey_name,
            captured_at_str,
          ],
        )?;
        Ok(ScheduledDay {
          day_id: tx.last_insert_rowid(),
          day: input.day,
          link_id: input.link_id,
          snapshot,
          captured_at,
        })
      })
      .await
  }

  async fn get_day(&self, id: DayId) -> Result<Option<ScheduledDay>> {
    let raw = self.read(move |conn| select_day(conn, id)).await?;
    raw.map(RawScheduledDay::into_day).transpose()
  }

  async fn list_days(&self) -> Result<Vec<ScheduledDay>> {
    let raws = self.read(select_days).await?;
    raws.into_iter().map(RawScheduledDay::into_day).collect()
  }

  async fn update_day(&self, id: DayId, input: NewScheduledDay) -> Result<ScheduledDay> {
    input.validate()?;
    let raw = self
      .write(move |tx| {
        if select_day(tx, id)?.is_none() {
          return Err(CoreError::DayNotFound(id).into());
        }
        require_link(tx, input.link_id)?;
        tx.execute(
          "UPDATE scheduled_days SET day = ?1, link_id = ?2 WHERE day_id = ?3",
          params![input.day, input.link_id, id],
        )?;
        Ok(select_day(tx, id)?.ok_or(CoreError::DayNotFound(id))?)
      })
      .await?;
    raw.into_day()
  }

  async fn delete_day(&self, id: DayId) -> Result<()> {
    self
      .delete_by_id(
        "DELETE FROM scheduled_days WHERE day_id = ?1",
        id,
        CoreError::DayNotFound(id),
      )
      .await
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn load_catalog(&self) -> Result<Catalog> {
    let (journeys, themes, rules, links, raw_days) = self
      .read(|conn| {
        let journeys = select_all(
          conn,
          &format!("SELECT {JOURNEY_COLUMNS} FROM journeys"),
          journey_from_row,
        )?;
        let themes = select_all(
          conn,
          &format!("SELECT {THEME_COLUMNS} FROM themes"),
          theme_from_row,
        )?;
        let rules = select_all(
          conn,
          &format!("SELECT {RULE_COLUMNS} FROM rules"),
          rule_from_row,
        )?;
        let links = select_all(
          conn,
          &format!("SELECT {LINK_COLUMNS} FROM theme_rule_links"),
          link_from_row,
        )?;
        Ok((journeys, themes, rules, links, select_days(conn)?))
      })
      .await?;

    // Rows that fail to decode are logged and left out.
    let days = raw_days
      .into_iter()
      .filter_map(|raw| {
        let day_id = raw.day_id;
        raw
          .into_day()
          .inspect_err(|e| tracing::warn!(day_id, "skipping scheduled day: {e}"))
          .ok()
      })
      .collect();

    Ok(Catalog::from_parts(journeys, themes, rules, links, days))
  }
}
