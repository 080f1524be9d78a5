//! Durable alert history
//!
//! ## Design
//!
//! - **Trait-based**: `AlertHistoryBackend` lets the worker run against
//!   SQLite or memory without knowing which
//! - **Idempotent**: every row is keyed by `alert_id`; writing the same alert
//!   twice leaves one row
//!
//! ## Backends
//!
//! - **SQLite** (default): embedded database file
//! - **In-Memory**: no persistence, for tests or throwaway runs
//!
//! ## Usage
//!
//! ```no_run
//! use gridspace::storage::{AlertHistoryBackend, sqlite::SqliteBackend};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = SqliteBackend::new("./alert_history.db").await?;
//!     println!("{}", backend.get_stats().await?);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod error;
pub mod memory;
pub mod schema;
#[cfg(feature = "storage-sqlite")]
pub mod sqlite;

pub use backend::{AlertHistoryBackend, HealthStatus, SaveOutcome};
pub use error::{StorageError, StorageResult};
pub use schema::{AlertHistoryRecord, AlertHistoryRow};
