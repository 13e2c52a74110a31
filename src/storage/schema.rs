//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the tidepool database.

use rusqlite::Connection;

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Normalized catalog records, upserted by bvid
CREATE TABLE IF NOT EXISTS videos (
    bvid TEXT PRIMARY KEY,
    aid INTEGER NOT NULL,
    cid TEXT,
    tid INTEGER NOT NULL,
    tname TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    pic TEXT NOT NULL DEFAULT '',
    pubdate INTEGER NOT NULL DEFAULT 0,
    ctime INTEGER NOT NULL DEFAULT 0,
    duration INTEGER NOT NULL DEFAULT 0,
    videos INTEGER NOT NULL DEFAULT 1,
    copyright INTEGER NOT NULL DEFAULT 0,
    owner_mid INTEGER NOT NULL DEFAULT 0,
    owner_name TEXT NOT NULL DEFAULT '',
    stat_view INTEGER NOT NULL DEFAULT 0,
    stat_danmaku INTEGER NOT NULL DEFAULT 0,
    stat_reply INTEGER NOT NULL DEFAULT 0,
    stat_favorite INTEGER NOT NULL DEFAULT 0,
    stat_coin INTEGER NOT NULL DEFAULT 0,
    stat_share INTEGER NOT NULL DEFAULT 0,
    stat_like INTEGER NOT NULL DEFAULT 0,
    inserted_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_videos_tid ON videos(tid);
CREATE INDEX IF NOT EXISTS idx_videos_pubdate ON videos(pubdate);

-- Region totals recorded by the scanner
CREATE TABLE IF NOT EXISTS region_stats (
    tid INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    videos INTEGER NOT NULL,
    pages INTEGER NOT NULL,
    scanned_at TEXT NOT NULL
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
