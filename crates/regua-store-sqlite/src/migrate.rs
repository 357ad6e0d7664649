//! In-place upgrade of databases created before scheduled days carried a
//! snapshot.
//!
//! Runs once when the store opens, after [`crate::schema::SCHEMA`]. Both steps
//! are idempotent: columns are only added when missing and only rows with an
//! empty snapshot are filled.

use chrono::Utc;
use rusqlite::{Connection, params};

use crate::{
  encode::encode_dt,
  store::{TxError, capture_snapshot},
};

/// Snapshot columns and the declaration used when adding them to an older
/// `scheduled_days` table.
const SNAPSHOT_COLUMNS: [(&str, &str); 7] = [
  ("theme_id", "INTEGER NOT NULL DEFAULT 0"),
  ("theme_name", "TEXT NOT NULL DEFAULT ''"),
  ("rule_id", "INTEGER NOT NULL DEFAULT 0"),
  ("alternative_theme_id", "INTEGER"),
  ("journey_id", "INTEGER"),
  ("journey_name", "TEXT"),
  ("captured_at", "TEXT NOT NULL DEFAULT ''"),
];

/// Add any snapshot column the table lacks. Returns the added names.
pub fn add_missing_columns(conn: &Connection) -> rusqlite::Result<Vec<&'static str>> {
  let existing: Vec<String> = {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('scheduled_days')")?;
    stmt
      .query_map([], |row| row.get(0))?
      .collect::<rusqlite::Result<_>>()?
  };

  let mut added = Vec::new();
  for (name, decl) in SNAPSHOT_COLUMNS {
    if existing.iter().any(|c| c == name) {
      continue;
    }
    conn.execute_batch(&format!(
      "ALTER TABLE scheduled_days ADD COLUMN {name} {decl}"
    ))?;
    added.push(name);
  }
  Ok(added)
}

/// Fill empty snapshots from the current link data. Returns how many rows
/// were filled.
pub fn backfill_snapshots(conn: &mut Connection) -> rusqlite::Result<usize> {
  let tx = conn.transaction()?;

  let pending: Vec<(i64, i64)> = {
    let mut stmt = tx.prepare(
      "SELECT day_id, link_id FROM scheduled_days WHERE trim(theme_name) = ''",
    )?;
    stmt
      .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
      .collect::<rusqlite::Result<_>>()?
  };

  let mut filled = 0;
  for (day_id, link_id) in pending {
    let snapshot = match capture_snapshot(&tx, link_id) {
      Ok(snapshot) => snapshot,
      Err(TxError::Sql(e)) => return Err(e),
      Err(TxError::Core(e)) => {
        tracing::warn!(day_id, "cannot backfill snapshot: {e}");
        continue;
      }
    };
    tx.execute(
      "UPDATE scheduled_days
       SET theme_id = ?1, theme_name = ?2, rule_id = ?3,
           alternative_theme_id = ?4, journey_id = ?5, journey_name = ?6
       WHERE day_id = ?7",
      params![
        snapshot.theme_id,
        snapshot.theme_name,
        snapshot.rule_id,
        snapshot.alternative_theme_id,
        snapshot.journey_id,
        snapshot.journey_name,
        day_id,
      ],
    )?;
    filled += 1;
  }

  tx.execute(
    "UPDATE scheduled_days SET captured_at = ?1 WHERE captured_at = ''",
    [encode_dt(Utc::now())],
  )?;
  tx.commit()?;
  Ok(filled)
}
