//! Buffer pool management.
//!
//! The buffer pool is the in-memory cache layer between table files and
//! transactions. It caches a bounded number of pages, locks them on behalf
//! of transactions, and decides which clean page to drop when it is full.
//!
//! # Components
//! - [`BufferPool`] - The page cache and commit/abort boundary
//! - [`Frame`] - A cached page + dirty/owner metadata
//! - [`PageHandle`] - Caller-facing shared page buffer
//! - [`BufferPoolStats`] - Performance statistics
//! - [`replacer`] - LRU ordering

mod buffer_pool;
mod frame;
mod page_handle;
pub mod replacer;
mod stats;

pub use buffer_pool::BufferPool;
pub use frame::Frame;
pub use page_handle::PageHandle;
pub use stats::{BufferPoolStats, StatsSnapshot};
