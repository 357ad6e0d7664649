//! SQL schema for the Régua SQLite store.
//!
//! Executed once at connection startup. Columns added after the first
//! release are reconciled by [`crate::migrate`], which runs right after.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS journeys (
    journey_id  INTEGER PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT
);

CREATE TABLE IF NOT EXISTS themes (
    theme_id             INTEGER PRIMARY KEY,
    name                 TEXT NOT NULL,
    description          TEXT,
    objective            TEXT,
    journey_id           INTEGER REFERENCES journeys(journey_id) ON DELETE SET NULL,
    alternative_theme_id INTEGER REFERENCES themes(theme_id)     ON DELETE SET NULL,
    CHECK (alternative_theme_id IS NULL OR alternative_theme_id != theme_id)
);

-- Exactly one row carries the 'No Rule' sentinel; the store enforces it.
CREATE TABLE IF NOT EXISTS rules (
    rule_id     INTEGER PRIMARY KEY,
    description TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS theme_rule_links (
    link_id        INTEGER PRIMARY KEY,
    theme_id       INTEGER NOT NULL REFERENCES themes(theme_id) ON DELETE CASCADE,
    rule_id        INTEGER NOT NULL REFERENCES rules(rule_id)   ON DELETE CASCADE,
    alternative_id INTEGER REFERENCES theme_rule_links(link_id) ON DELETE SET NULL,
    CHECK (alternative_id IS NULL OR alternative_id != link_id)
);

-- Snapshot columns are copied from the link when the row is inserted and are
-- never rewritten afterwards.
CREATE TABLE IF NOT EXISTS scheduled_days (
    day_id               INTEGER PRIMARY KEY,
    day                  INTEGER NOT NULL CHECK (day BETWEEN 0 AND 99998),
    link_id              INTEGER NOT NULL REFERENCES theme_rule_links(link_id) ON DELETE CASCADE,
    theme_id             INTEGER NOT NULL DEFAULT 0,
    theme_name           TEXT    NOT NULL DEFAULT '',
    rule_id              INTEGER NOT NULL DEFAULT 0,
    alternative_theme_id INTEGER,
    journey_id           INTEGER,
    journey_name         TEXT,
    captured_at          TEXT    NOT NULL DEFAULT ''  -- ISO 8601 UTC
);

CREATE INDEX IF NOT EXISTS links_theme_idx ON theme_rule_links(theme_id);
CREATE INDEX IF NOT EXISTS links_rule_idx  ON theme_rule_links(rule_id);
CREATE INDEX IF NOT EXISTS days_link_idx   ON scheduled_days(link_id);
CREATE INDEX IF NOT EXISTS days_day_idx    ON scheduled_days(day);

PRAGMA user_version = 1;
";

pub const JOURNEY_COLUMNS: &str = "journey_id, name, description";

pub const THEME_COLUMNS: &str =
  "theme_id, name, description, objective, journey_id, alternative_theme_id";

pub const RULE_COLUMNS: &str = "rule_id, description";

pub const LINK_COLUMNS: &str = "link_id, theme_id, rule_id, alternative_id";

pub const DAY_COLUMNS: &str = "day_id, day, link_id, theme_id, theme_name, \
                               rule_id, alternative_theme_id, journey_id, \
                               journey_name, captured_at";
