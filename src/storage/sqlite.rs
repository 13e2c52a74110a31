//! SQLite storage implementation

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CatalogStorage, StorageResult};
use crate::storage::{RegionCount, RegionStat, VideoRecord};
use crate::CrawlError;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (creating if needed) the database at the given path
    pub fn new(path: &Path) -> Result<Self, CrawlError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self, CrawlError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl CatalogStorage for SqliteStorage {
    fn upsert_videos(&mut self, records: &[VideoRecord]) -> StorageResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO videos (
                    bvid, aid, cid, tid, tname, title, description, pic,
                    pubdate, ctime, duration, videos, copyright,
                    owner_mid, owner_name,
                    stat_view, stat_danmaku, stat_reply, stat_favorite,
                    stat_coin, stat_share, stat_like, inserted_at
                ) VALUES (
                    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8,
                    ?9, ?10, ?11, ?12, ?13,
                    ?14, ?15,
                    ?16, ?17, ?18, ?19,
                    ?20, ?21, ?22, ?23
                )
                ON CONFLICT(bvid) DO UPDATE SET
                    aid = excluded.aid,
                    cid = excluded.cid,
                    tid = excluded.tid,
                    tname = excluded.tname,
                    title = excluded.title,
                    description = excluded.description,
                    pic = excluded.pic,
                    pubdate = excluded.pubdate,
                    ctime = excluded.ctime,
                    duration = excluded.duration,
                    videos = excluded.videos,
                    copyright = excluded.copyright,
                    owner_mid = excluded.owner_mid,
                    owner_name = excluded.owner_name,
                    stat_view = excluded.stat_view,
                    stat_danmaku = excluded.stat_danmaku,
                    stat_reply = excluded.stat_reply,
                    stat_favorite = excluded.stat_favorite,
                    stat_coin = excluded.stat_coin,
                    stat_share = excluded.stat_share,
                    stat_like = excluded.stat_like,
                    inserted_at = excluded.inserted_at",
            )?;

            for record in records {
                stmt.execute(params![
                    record.bvid,
                    record.aid,
                    record.cid,
                    record.tid,
                    record.tname,
                    record.title,
                    record.description,
                    record.pic,
                    record.pubdate,
                    record.ctime,
                    record.duration,
                    record.videos,
                    record.copyright,
                    record.owner_mid,
                    record.owner_name,
                    record.stat_view,
                    record.stat_danmaku,
                    record.stat_reply,
                    record.stat_favorite,
                    record.stat_coin,
                    record.stat_share,
                    record.stat_like,
                    now,
                ])?;
            }
        }

        tx.commit()?;
        Ok(records.len())
    }

    fn count_videos(&self) -> StorageResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM videos", [], |row| row.get(0))?;
        Ok(count)
    }

    fn count_videos_in_region(&self, tid: i64) -> StorageResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM videos WHERE tid = ?1",
            params![tid],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn video_counts_by_region(&self) -> StorageResult<Vec<RegionCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT tid, tname, COUNT(*) AS n FROM videos
             GROUP BY tid, tname ORDER BY n DESC",
        )?;

        let counts = stmt
            .query_map([], |row| {
                Ok(RegionCount {
                    tid: row.get(0)?,
                    tname: row.get(1)?,
                    count: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(counts)
    }

    fn upsert_region_stat(&mut self, stat: &RegionStat) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO region_stats (tid, name, videos, pages, scanned_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(tid) DO UPDATE SET
                name = excluded.name,
                videos = excluded.videos,
                pages = excluded.pages,
                scanned_at = excluded.scanned_at",
            params![stat.tid, stat.name, stat.videos, stat.pages, stat.scanned_at],
        )?;
        Ok(())
    }

    fn list_region_stats(&self) -> StorageResult<Vec<RegionStat>> {
        let mut stmt = self.conn.prepare(
            "SELECT tid, name, videos, pages, scanned_at FROM region_stats ORDER BY tid",
        )?;

        let stats = stmt
            .query_map([], |row| {
                Ok(RegionStat {
                    tid: row.get(0)?,
                    name: row.get(1)?,
                    videos: row.get(2)?,
                    pages: row.get(3)?,
                    scanned_at: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record(bvid: &str, tid: i64, view: i64) -> VideoRecord {
        VideoRecord {
            bvid: bvid.to_string(),
            aid: 1,
            cid: None,
            tid,
            tname: format!("region-{}", tid),
            title: "title".to_string(),
            description: String::new(),
            pic: String::new(),
            pubdate: 1700000000,
            ctime: 1700000000,
            duration: 60,
            videos: 1,
            copyright: 1,
            owner_mid: 7,
            owner_name: "owner".to_string(),
            stat_view: view,
            stat_danmaku: 0,
            stat_reply: 0,
            stat_favorite: 0,
            stat_coin: 0,
            stat_share: 0,
            stat_like: 0,
        }
    }

    #[test]
    fn test_upsert_inserts_and_counts() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();

        let written = storage
            .upsert_videos(&[sample_record("BV1", 95, 10), sample_record("BV2", 95, 20)])
            .unwrap();

        assert_eq!(written, 2);
        assert_eq!(storage.count_videos().unwrap(), 2);
        assert_eq!(storage.count_videos_in_region(95).unwrap(), 2);
        assert_eq!(storage.count_videos_in_region(42).unwrap(), 0);
    }

    #[test]
    fn test_upsert_overwrites_on_conflict() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();

        storage.upsert_videos(&[sample_record("BV1", 95, 10)]).unwrap();
        storage.upsert_videos(&[sample_record("BV1", 95, 999)]).unwrap();

        assert_eq!(storage.count_videos().unwrap(), 1);

        let view: i64 = storage
            .conn
            .query_row(
                "SELECT stat_view FROM videos WHERE bvid = 'BV1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(view, 999);
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        assert_eq!(storage.upsert_videos(&[]).unwrap(), 0);
    }

    #[test]
    fn test_counts_by_region_ordering() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .upsert_videos(&[
                sample_record("BV1", 95, 1),
                sample_record("BV2", 95, 1),
                sample_record("BV3", 21, 1),
            ])
            .unwrap();

        let counts = storage.video_counts_by_region().unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].tid, 95);
        assert_eq!(counts[0].count, 2);
    }

    #[test]
    fn test_region_stat_roundtrip() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();

        storage
            .upsert_region_stat(&RegionStat {
                tid: 95,
                name: "Mobile".to_string(),
                videos: 104,
                pages: 3,
                scanned_at: "2026-01-01T00:00:00Z".to_string(),
            })
            .unwrap();

        storage
            .upsert_region_stat(&RegionStat {
                tid: 95,
                name: "Mobile".to_string(),
                videos: 150,
                pages: 3,
                scanned_at: "2026-01-02T00:00:00Z".to_string(),
            })
            .unwrap();

        let stats = storage.list_region_stats().unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].videos, 150);
    }
}
