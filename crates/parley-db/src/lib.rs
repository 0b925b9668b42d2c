//! Database layer for the Parley relay.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! and embedded SQL migrations. The correlation store's `results` table is
//! created through the versioned migrations managed by this crate.
//!
//! # Design decisions
//!
//! - **SQLite with WAL mode**: the correlation store is a single key-value
//!   table with point reads and writes. WAL mode lets the poller read while
//!   the ingress endpoint writes.
//! - **`r2d2` connection pool**: bounded connection reuse shared by the
//!   ingress handlers, the local poll source, and the retention task.
//! - **Embedded migrations**: SQL files are compiled into the binary via
//!   `include_str!`, so the schema ships with the server.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
