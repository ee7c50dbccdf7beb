// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable conversion queue operations.
//!
//! The queue is the retry substrate: it owns attempt counting, the backoff
//! schedule between attempts, and the per-entry lock that keeps one image to
//! at most one in-flight conversion.

use chrono::Utc;
use imgpress_core::ImgpressError;
use rusqlite::params;

use super::{format_ts, parse_opt_ts, parse_ts};
use crate::database::Database;
use crate::models::{FailOutcome, QueueEntry};

fn row_to_entry(row: &rusqlite::Row<'_>) -> Result<QueueEntry, rusqlite::Error> {
    Ok(QueueEntry {
        id: row.get(0)?,
        image_id: row.get(1)?,
        status: row.get(2)?,
        attempts: row.get(3)?,
        max_attempts: row.get(4)?,
        available_at: parse_ts(5, &row.get::<_, String>(5)?)?,
        locked_until: parse_opt_ts(6, row.get(6)?)?,
        created_at: parse_ts(7, &row.get::<_, String>(7)?)?,
        updated_at: parse_ts(8, &row.get::<_, String>(8)?)?,
    })
}

const ENTRY_COLUMNS: &str = "id, image_id, status, attempts, max_attempts, available_at, \
     locked_until, created_at, updated_at";

/// Enqueue a conversion task. Returns the auto-generated entry ID.
pub async fn enqueue(
    db: &Database,
    image_id: &str,
    max_attempts: i32,
) -> Result<i64, ImgpressError> {
    let image_id = image_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO conversion_queue (image_id, max_attempts) VALUES (?1, ?2)",
                params![image_id, max_attempts],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Dequeue the next runnable pending entry.
///
/// Atomically selects the oldest pending entry whose `available_at` has
/// passed and marks it "processing" with a 5-minute lock. Returns `None`
/// if nothing is due.
pub async fn dequeue(db: &Database) -> Result<Option<QueueEntry>, ImgpressError> {
    let now = format_ts(&Utc::now());
    db.connection()
        .call(move |conn| {
            // Use a transaction to atomically find + update the next pending entry.
            let tx = conn.transaction()?;

            let result = {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {ENTRY_COLUMNS}
                     FROM conversion_queue
                     WHERE status = 'pending' AND available_at <= ?1
                     ORDER BY id ASC
                     LIMIT 1"
                ))?;
                stmt.query_row(params![now], row_to_entry)
            };

            match result {
                Ok(entry) => {
                    tx.execute(
                        "UPDATE conversion_queue SET status = 'processing',
                         locked_until = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', '+5 minutes'),
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                         WHERE id = ?1",
                        params![entry.id],
                    )?;
                    tx.commit()?;

                    // Return the entry with updated status.
                    Ok(Some(QueueEntry {
                        status: "processing".to_string(),
                        ..entry
                    }))
                }
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    tx.commit()?;
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Acknowledge an entry whose conversion reached a terminal outcome.
pub async fn ack(db: &Database, id: i64) -> Result<(), ImgpressError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE conversion_queue SET status = 'completed', locked_until = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Record a failed attempt.
///
/// Increments attempts. While budget remains, the entry returns to "pending"
/// with `available_at` pushed out by the backoff schedule (indexed by
/// failed-attempt count; the last entry repeats). At exhaustion the entry is
/// marked "failed" and never dequeues again.
pub async fn fail(
    db: &Database,
    id: i64,
    backoff_secs: &[u64],
) -> Result<FailOutcome, ImgpressError> {
    let backoff_secs = backoff_secs.to_vec();
    db.connection()
        .call(move |conn| {
            let (attempts, max_attempts): (i32, i32) = conn.query_row(
                "SELECT attempts, max_attempts FROM conversion_queue WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            let new_attempts = attempts + 1;
            if new_attempts >= max_attempts {
                conn.execute(
                    "UPDATE conversion_queue SET status = 'failed', attempts = ?1,
                     locked_until = NULL,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?2",
                    params![new_attempts, id],
                )?;
                Ok(FailOutcome {
                    attempts: new_attempts,
                    exhausted: true,
                })
            } else {
                let delay = backoff_secs
                    .get((new_attempts - 1) as usize)
                    .or(backoff_secs.last())
                    .copied()
                    .unwrap_or(0);
                let available_at =
                    format_ts(&(Utc::now() + chrono::Duration::seconds(delay as i64)));
                conn.execute(
                    "UPDATE conversion_queue SET status = 'pending', attempts = ?1,
                     available_at = ?2, locked_until = NULL,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?3",
                    params![new_attempts, available_at, id],
                )?;
                Ok(FailOutcome {
                    attempts: new_attempts,
                    exhausted: false,
                })
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn enqueue_and_dequeue_lifecycle() {
        let (db, _dir) = setup_db().await;

        let id = enqueue(&db, "img-1", 3).await.unwrap();
        assert!(id > 0);

        let entry = dequeue(&db).await.unwrap();
        assert!(entry.is_some());
        let entry = entry.unwrap();
        assert_eq!(entry.id, id);
        assert_eq!(entry.status, "processing");
        assert_eq!(entry.image_id, "img-1");
        assert_eq!(entry.attempts, 0);

        // Queue should be empty now (no more pending).
        let next = dequeue(&db).await.unwrap();
        assert!(next.is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn ack_marks_completed() {
        let (db, _dir) = setup_db().await;

        let id = enqueue(&db, "img-1", 3).await.unwrap();
        let _entry = dequeue(&db).await.unwrap().unwrap();

        ack(&db, id).await.unwrap();

        let status: String = db
            .connection()
            .call(move |conn| {
                conn.query_row(
                    "SELECT status FROM conversion_queue WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();
        assert_eq!(status, "completed");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn fail_applies_backoff_and_retries() {
        let (db, _dir) = setup_db().await;

        let id = enqueue(&db, "img-1", 3).await.unwrap();
        let _entry = dequeue(&db).await.unwrap().unwrap();

        // First failure: attempts=1, back to pending with a 60s delay.
        let outcome = fail(&db, id, &[60, 300, 900]).await.unwrap();
        assert_eq!(outcome.attempts, 1);
        assert!(!outcome.exhausted);

        let (status, attempts, available_at): (String, i32, String) = db
            .connection()
            .call(move |conn| {
                conn.query_row(
                    "SELECT status, attempts, available_at FROM conversion_queue WHERE id = ?1",
                    params![id],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
            })
            .await
            .unwrap();
        assert_eq!(status, "pending");
        assert_eq!(attempts, 1);

        // The entry is backed off into the future, so it does not dequeue now.
        let now = format_ts(&Utc::now());
        assert!(available_at > now, "{available_at} should be after {now}");
        assert!(dequeue(&db).await.unwrap().is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn fail_marks_entry_failed_at_max_attempts() {
        let (db, _dir) = setup_db().await;

        let id = enqueue(&db, "img-1", 3).await.unwrap();
        let _entry = dequeue(&db).await.unwrap().unwrap();

        // Zero backoff so every failure is immediately runnable again.
        let first = fail(&db, id, &[0]).await.unwrap();
        assert!(!first.exhausted);
        let _ = dequeue(&db).await.unwrap().unwrap();
        let second = fail(&db, id, &[0]).await.unwrap();
        assert!(!second.exhausted);
        let _ = dequeue(&db).await.unwrap().unwrap();
        let third = fail(&db, id, &[0]).await.unwrap();
        assert_eq!(third.attempts, 3);
        assert!(third.exhausted);

        let status: String = db
            .connection()
            .call(move |conn| {
                conn.query_row(
                    "SELECT status FROM conversion_queue WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();
        assert_eq!(status, "failed");

        // Exhausted entries never dequeue.
        assert!(dequeue(&db).await.unwrap().is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn dequeue_empty_queue_returns_none() {
        let (db, _dir) = setup_db().await;
        let result = dequeue(&db).await.unwrap();
        assert!(result.is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_writers_no_sqlite_busy() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("concurrent_test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

        // Spawn 10 concurrent tasks all writing through the same Database.
        let mut handles = Vec::new();
        for i in 0..10 {
            let conn = db.connection().clone();
            let handle = tokio::spawn(async move {
                conn.call(move |conn| {
                    conn.execute(
                        "INSERT INTO conversion_queue (image_id, max_attempts) VALUES (?1, 3)",
                        params![format!("img-{i}")],
                    )?;
                    Ok::<(), rusqlite::Error>(())
                })
                .await
            });
            handles.push(handle);
        }

        // All should complete without SQLITE_BUSY.
        for handle in handles {
            let result = handle.await.unwrap();
            assert!(result.is_ok(), "concurrent write failed: {result:?}");
        }

        let count: i64 = db
            .connection()
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM conversion_queue", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(count, 10);

        db.close().await.unwrap();
    }
}
