//! SQLite-backed store for tracked URL records.
//!
//! One row per observed post URL, keyed by the URL-safe base64 encoding of
//! the URL itself so the same URL always lands on the same row. `last_sent`
//! records the last successful indexing notification; NULL means a record
//! predates the marker and has never been notified.

use crate::model::TrackedUrl;
use anyhow::Result;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::instrument;

pub type Pool = SqlitePool;

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let options = SqliteConnectOptions::from_str(&normalized)?.create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await?;
    // Enable WAL and stricter durability.
    sqlx::query("PRAGMA journal_mode=WAL;")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous=FULL;")
        .execute(&pool)
        .await?;
    Ok(pool)
}

/// If using a file-backed SQLite URL, expand a leading `~/` and ensure the
/// parent directory exists. Leaves in-memory URLs and non-sqlite schemes
/// untouched.
fn prepare_sqlite_url(url: &str) -> String {
    if !url.starts_with("sqlite:") || url.starts_with("sqlite::memory") {
        return url.to_string();
    }

    let rest = url["sqlite:".len()..].trim_start_matches("//");
    let (path_part, query_part) = match rest.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (rest, None),
    };
    if path_part.is_empty() {
        return url.to_string();
    }

    let expanded = match path_part.strip_prefix("~/") {
        Some(tail) => match std::env::var("HOME") {
            Ok(home) => format!("{}/{}", home.trim_end_matches('/'), tail),
            Err(_) => path_part.to_string(),
        },
        None => path_part.to_string(),
    };

    if let Some(parent) = std::path::Path::new(&expanded).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    let mut rebuilt = format!("sqlite://{expanded}");
    if let Some(q) = query_part {
        rebuilt.push('?');
        rebuilt.push_str(q);
    }
    rebuilt
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Stable row key for a URL: URL-safe base64 of its UTF-8 bytes. Deterministic
/// and reversible, so distinct URLs never collide.
pub fn encode_doc_id(url: &str) -> String {
    URL_SAFE.encode(url.as_bytes())
}

/// Upsert one observed URL.
///
/// Existing rows keep their marker, except that a row with no marker at all
/// gets one now so it is not treated as immediately due. The `url` column is
/// always refreshed. New rows are created with `last_sent = now`: a freshly
/// discovered URL becomes due only once its marker ages past the rest of the
/// table, not on discovery.
#[instrument(skip_all, fields(url = %url))]
pub async fn register_url(pool: &Pool, url: &str, now: DateTime<Utc>) -> Result<()> {
    let doc_id = encode_doc_id(url);
    let existing = sqlx::query("SELECT last_sent FROM url_notifications WHERE doc_id = ?")
        .bind(&doc_id)
        .fetch_optional(pool)
        .await?;
    match existing {
        Some(row) => {
            let last_sent: Option<DateTime<Utc>> = row.get("last_sent");
            if last_sent.is_none() {
                sqlx::query("UPDATE url_notifications SET url = ?, last_sent = ? WHERE doc_id = ?")
                    .bind(url)
                    .bind(now)
                    .bind(&doc_id)
                    .execute(pool)
                    .await?;
            } else {
                sqlx::query("UPDATE url_notifications SET url = ? WHERE doc_id = ?")
                    .bind(url)
                    .bind(&doc_id)
                    .execute(pool)
                    .await?;
            }
        }
        None => {
            sqlx::query("INSERT INTO url_notifications (doc_id, url, last_sent) VALUES (?, ?, ?)")
                .bind(&doc_id)
                .bind(url)
                .bind(now)
                .execute(pool)
                .await?;
        }
    }
    Ok(())
}

/// The up-to-`batch_size` records most overdue for notification. Records
/// without a marker sort before any marked record.
#[instrument(skip_all)]
pub async fn pending_urls(pool: &Pool, batch_size: i64) -> Result<Vec<TrackedUrl>> {
    let rows = sqlx::query_as::<_, TrackedUrl>(
        "SELECT doc_id, url, last_sent FROM url_notifications \
         ORDER BY last_sent IS NOT NULL, last_sent ASC LIMIT ?",
    )
    .bind(batch_size)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Overwrite a record's marker after a successful notification.
#[instrument(skip_all, fields(doc_id = %doc_id))]
pub async fn mark_sent(pool: &Pool, doc_id: &str, now: DateTime<Utc>) -> Result<()> {
    sqlx::query("UPDATE url_notifications SET last_sent = ? WHERE doc_id = ?")
        .bind(now)
        .bind(doc_id)
        .execute(pool)
        .await?;
    Ok(())
}
