//! KeelDB - a transactional buffer pool for a disk-backed tabular store.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 Callers (operators, transactions)               │
//! │        get_page / insert_tuple / delete_tuple / commit / abort  │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │               Buffer Pool (buffer/)                      │   │
//! │  │   bounded page cache · LRU order · no-steal eviction     │   │
//! │  │   flush on commit · restore from disk on abort           │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │              ↓                               ↓                  │
//! │  ┌──────────────────────────┐   ┌──────────────────────────┐   │
//! │  │ Lock Manager             │   │ Catalog (storage/)       │   │
//! │  │ (concurrency/)           │   │ TableId → PageStore      │   │
//! │  │ shared/exclusive, upgrade│   └──────────────────────────┘   │
//! │  │ randomized timeouts      │                ↓                  │
//! │  └──────────────────────────┘   ┌──────────────────────────┐   │
//! │                                 │ HeapFile: Page + header  │   │
//! │                                 │ + slotted tuples         │   │
//! │                                 └──────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, TableId, FrameId, Error, config)
//! - [`concurrency`] - Transaction ids and the page lock table
//! - [`buffer`] - The buffer pool, its frames and LRU ordering
//! - [`storage`] - Table files, page formats and tuples
//!
//! # Quick Start
//! ```no_run
//! use std::sync::Arc;
//! use keeldb::{BufferPool, BufferPoolConfig, Catalog, Field, HeapFile, Permissions};
//! use keeldb::{TransactionId, Tuple, TupleDesc, Type};
//!
//! let desc = TupleDesc::new(vec![Type::Int, Type::Str]);
//! let table = Arc::new(HeapFile::open_or_create("people.dat", desc).unwrap());
//!
//! let catalog = Arc::new(Catalog::new());
//! let table_id = catalog.add_table(table.clone());
//! let pool = BufferPool::new(BufferPoolConfig::default(), catalog);
//!
//! let tid = TransactionId::new();
//! let row = Tuple::new(vec![Field::Int(1), Field::Str("ada".into())]);
//! let rid = pool.insert_tuple(tid, table_id, row).unwrap();
//! let page = pool.get_page(tid, rid.page_id, Permissions::ReadOnly).unwrap();
//! drop(page);
//! pool.commit(tid).unwrap();
//! ```

pub mod buffer;
pub mod common;
pub mod concurrency;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::PAGE_SIZE;
pub use common::{BufferPoolConfig, Error, FrameId, PageId, Result, TableId};

pub use buffer::{BufferPool, BufferPoolStats, Frame, PageHandle, StatsSnapshot};
pub use concurrency::{LockManager, LockMode, Permissions, TransactionId};
pub use storage::page::{Page, PageHeader, PageType};
pub use storage::tuple::{Field, RecordId, Tuple, TupleDesc, Type};
pub use storage::{Catalog, HeapFile, PageStore};
