//! Archive-to-record normalization
//!
//! Raw archive objects from the listing API are normalized into
//! [`VideoRecord`]s. A record missing its unique key is malformed and gets
//! skipped individually; one bad archive never aborts the batch it arrived
//! in.

use crate::storage::VideoRecord;
use serde_json::Value;
use thiserror::Error;

/// A single archive that cannot be normalized
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("archive is not a JSON object")]
    NotAnObject,

    #[error("archive is missing required field '{0}'")]
    MissingField(&'static str),
}

fn str_field(archive: &Value, key: &str) -> String {
    archive
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn int_field(archive: &Value, key: &str) -> i64 {
    archive.get(key).and_then(Value::as_i64).unwrap_or(0)
}

fn nested_int(archive: &Value, outer: &str, key: &str) -> i64 {
    archive
        .get(outer)
        .and_then(|v| v.get(key))
        .and_then(Value::as_i64)
        .unwrap_or(0)
}

/// Normalizes one raw archive object
///
/// `bvid` is the upsert key and must be a non-empty string; everything
/// else falls back to zero/empty when absent.
pub fn parse_archive(archive: &Value) -> Result<VideoRecord, RecordError> {
    if !archive.is_object() {
        return Err(RecordError::NotAnObject);
    }

    let bvid = archive
        .get("bvid")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(RecordError::MissingField("bvid"))?
        .to_string();

    Ok(VideoRecord {
        bvid,
        aid: int_field(archive, "aid"),
        cid: archive
            .get("cid")
            .and_then(Value::as_str)
            .map(str::to_string),
        tid: int_field(archive, "tid"),
        tname: str_field(archive, "tname"),
        title: str_field(archive, "title"),
        description: str_field(archive, "desc"),
        pic: str_field(archive, "pic"),
        pubdate: int_field(archive, "pubdate"),
        ctime: int_field(archive, "ctime"),
        duration: int_field(archive, "duration"),
        videos: int_field(archive, "videos"),
        copyright: int_field(archive, "copyright"),
        owner_mid: nested_int(archive, "owner", "mid"),
        owner_name: archive
            .get("owner")
            .and_then(|owner| owner.get("name"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        stat_view: nested_int(archive, "stat", "view"),
        stat_danmaku: nested_int(archive, "stat", "danmaku"),
        stat_reply: nested_int(archive, "stat", "reply"),
        stat_favorite: nested_int(archive, "stat", "favorite"),
        stat_coin: nested_int(archive, "stat", "coin"),
        stat_share: nested_int(archive, "stat", "share"),
        stat_like: nested_int(archive, "stat", "like"),
    })
}

/// Normalizes a batch, skipping malformed archives with a warning
pub fn normalize_archives(archives: &[Value]) -> Vec<VideoRecord> {
    let mut records = Vec::with_capacity(archives.len());

    for archive in archives {
        match parse_archive(archive) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("Skipping malformed archive: {}", e);
            }
        }
    }

    records
}
