//! Actor-based background work
//!
//! Each actor runs as an independent async task and is driven through a
//! cloneable handle that sends it commands over a Tokio mpsc channel.
//!
//! ## Actor Types
//!
//! - **PersistenceWorker**: drains the alert history queue into durable
//!   storage on a fixed interval
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: mpsc command channel for control messages
//! 2. **Request/Response**: oneshot channels for replies (`run_now`, stats)

pub mod messages;
pub mod persistence;

pub use messages::{PersistenceCommand, PersistenceStats};
pub use persistence::{PersistenceHandle, PersistenceWorker};
