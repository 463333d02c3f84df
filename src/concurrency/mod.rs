//! Transaction layer: transaction ids, permissions and page locks.
//!
//! # Components
//! - [`TransactionId`] - Opaque transaction token
//! - [`Permissions`] - Access requested from the buffer pool
//! - [`LockManager`] - Page-level shared/exclusive lock table

mod lock_manager;
mod transaction;

pub use lock_manager::{LockEntry, LockManager, LockMode};
pub use transaction::{Permissions, TransactionId};
