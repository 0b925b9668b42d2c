//! Error types for the correlation layer.

/// Errors that can occur during correlation store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A database operation failed.
    #[error("correlation store database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The record to write has no answer text.
    #[error("refusing to store an empty response for request {0}")]
    EmptyResponse(String),
}

/// Errors from a single poll attempt.
///
/// The poller absorbs these: a failed attempt counts as "no result yet" and
/// the loop continues until its deadline.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// The read endpoint could not be reached or the connection failed.
    #[error("result read transport error: {0}")]
    Transport(String),

    /// The read endpoint answered with a non-success status.
    #[error("result read returned status {0}")]
    Status(u16),

    /// The read endpoint's body was not the expected JSON.
    #[error("result read decode error: {0}")]
    Decode(String),

    /// The local store failed.
    #[error("result read store error: {0}")]
    Store(String),
}

impl From<StoreError> for ReadError {
    fn from(e: StoreError) -> Self {
        Self::Store(e.to_string())
    }
}
