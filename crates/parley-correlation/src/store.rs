//! Persistence operations for the correlation store.
//!
//! The store is a single key-value table: one row per request identifier
//! holding the normalized answer and the time it was written. Writes are
//! upserts, so a second write for the same identifier silently replaces the
//! first (last writer wins).

use parley_types::{RequestId, ResultRecord};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StoreError;

/// Upserts the result for `request_id`, stamped with the current time.
///
/// # Errors
///
/// Returns `StoreError::EmptyResponse` if `response` is blank, or
/// `StoreError::Database` on SQL failure.
pub fn put_result(
    conn: &Connection,
    request_id: &RequestId,
    response: &str,
) -> Result<ResultRecord, StoreError> {
    put_result_at(conn, request_id, response, chrono::Utc::now().timestamp())
}

/// Upserts the result for `request_id` with an explicit write timestamp
/// (unix seconds).
///
/// # Errors
///
/// Same as [`put_result`].
pub fn put_result_at(
    conn: &Connection,
    request_id: &RequestId,
    response: &str,
    written_at: i64,
) -> Result<ResultRecord, StoreError> {
    if response.trim().is_empty() {
        return Err(StoreError::EmptyResponse(request_id.to_string()));
    }

    conn.execute(
        "INSERT INTO results (request_id, response, written_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(request_id) DO UPDATE SET
            response = excluded.response,
            written_at = excluded.written_at",
        params![request_id.as_str(), response, written_at],
    )?;

    tracing::debug!(request_id = %request_id, written_at, "stored result");

    Ok(ResultRecord {
        request_id: request_id.clone(),
        response: response.to_string(),
        written_at,
    })
}

/// Looks up the result for `request_id`.
///
/// Returns `Ok(None)` when the worker has not written anything yet. That is
/// the normal "not ready" state, not an error.
///
/// # Errors
///
/// Returns `StoreError::Database` on SQL failure.
pub fn get_result(
    conn: &Connection,
    request_id: &RequestId,
) -> Result<Option<ResultRecord>, StoreError> {
    let row = conn
        .query_row(
            "SELECT response, written_at FROM results WHERE request_id = ?1",
            params![request_id.as_str()],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
        )
        .optional()?;

    Ok(row.map(|(response, written_at)| ResultRecord {
        request_id: request_id.clone(),
        response,
        written_at,
    }))
}

/// Deletes every result written strictly before `cutoff` (unix seconds).
///
/// Returns the number of rows removed.
///
/// # Errors
///
/// Returns `StoreError::Database` on SQL failure.
pub fn prune_results_before(conn: &Connection, cutoff: i64) -> Result<usize, StoreError> {
    let deleted = conn.execute(
        "DELETE FROM results WHERE written_at < ?1",
        params![cutoff],
    )?;
    Ok(deleted)
}
