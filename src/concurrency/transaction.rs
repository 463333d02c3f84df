//! Transaction identifiers and access permissions.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use super::LockMode;

static NEXT_TRANSACTION_ID: AtomicU64 = AtomicU64::new(1);

/// Names a transaction. Equality is by value.
///
/// The pool does not track transaction state beyond the locks and dirty
/// pages a transaction currently owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Allocate a fresh, process-unique id.
    pub fn new() -> Self {
        TransactionId(NEXT_TRANSACTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap an existing raw id (recovery tooling and tests).
    #[inline]
    pub fn from_raw(id: u64) -> Self {
        TransactionId(id)
    }

    /// The raw numeric id.
    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Txn({})", self.0)
    }
}

/// Access requested from `BufferPool::get_page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permissions {
    ReadOnly,
    ReadWrite,
}

impl Permissions {
    /// The page lock this access needs.
    #[inline]
    pub fn lock_mode(self) -> LockMode {
        match self {
            Permissions::ReadOnly => LockMode::Shared,
            Permissions::ReadWrite => LockMode::Exclusive,
        }
    }
}
