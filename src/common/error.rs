//! Error types for KeelDB.

use thiserror::Error;

use crate::common::{PageId, TableId};
use crate::concurrency::{LockMode, TransactionId};

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in KeelDB.
///
/// Two families matter to callers:
/// - concurrency/capacity errors ([`Error::TransactionAborted`],
///   [`Error::EvictionImpossible`]) are handled by aborting and retrying
///   the whole transaction;
/// - everything else points at a caller bug or a broken file and is never
///   retried.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from disk operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The lock wait in `get_page` ran past its randomized deadline.
    #[error("transaction {tid} aborted: timed out waiting for {mode} lock on {page_id}")]
    TransactionAborted {
        tid: TransactionId,
        page_id: PageId,
        mode: LockMode,
    },

    /// Dirty pages fill the pool, so nothing can be evicted (no steal).
    #[error("cannot evict: {dirty} dirty pages fill capacity {capacity}")]
    EvictionImpossible { dirty: usize, capacity: usize },

    /// A tuple's field types do not match the table schema.
    #[error("schema mismatch: expected {expected}, found {found}")]
    SchemaMismatch { expected: String, found: String },

    /// Page number lies beyond the file's current extent.
    #[error("{page_id} is out of range: file has {num_pages} pages")]
    PageOutOfRange { page_id: PageId, num_pages: u32 },

    /// No page store registered for this table.
    #[error("{0} not found in catalog")]
    TableNotFound(TableId),

    /// Tried to insert into a page with no empty slot.
    #[error("{0} has no free slots")]
    PageFull(PageId),

    /// The record id points at an empty or nonexistent slot.
    #[error("no tuple in slot {slot} of {page_id}")]
    TupleNotFound { page_id: PageId, slot: u16 },

    /// Delete was called with a tuple that was never stored.
    #[error("tuple has no record id")]
    MissingRecordId,

    /// Page checksum does not match its contents.
    #[error("{0} failed checksum verification")]
    CorruptedPage(PageId),
}

impl Error {
    /// Whether the transaction layer should abort and retry the transaction.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::TransactionAborted { .. } | Error::EvictionImpossible { .. }
        )
    }
}
