//! Result sources the server's voice relay can poll.

use parley_correlation::{get_result, ReadError, ResultSource};
use parley_db::DbPool;
use parley_types::RequestId;
use parley_voice::HttpResultSource;

/// Reads results straight from this server's correlation store.
#[derive(Clone)]
pub struct StoreResultSource {
    pool: DbPool,
}

impl StoreResultSource {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl ResultSource for StoreResultSource {
    type Output = String;

    async fn fetch(&self, request_id: &RequestId) -> Result<Option<String>, ReadError> {
        let pool = self.pool.clone();
        let request_id = request_id.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| ReadError::Store(format!("db connection failed: {}", e)))?;
            let record = get_result(&conn, &request_id)?;
            Ok(record.map(|r| r.response))
        })
        .await
        .map_err(|e| ReadError::Store(format!("read task failed: {}", e)))?
    }
}

/// Where the relay looks for answers: a remote read endpoint when
/// `relay.result_url` is set, otherwise the local store.
#[derive(Clone)]
pub enum RelaySource {
    Http(HttpResultSource),
    Store(StoreResultSource),
}

impl ResultSource for RelaySource {
    type Output = String;

    async fn fetch(&self, request_id: &RequestId) -> Result<Option<String>, ReadError> {
        match self {
            Self::Http(source) => source.fetch(request_id).await,
            Self::Store(source) => source.fetch(request_id).await,
        }
    }
}
