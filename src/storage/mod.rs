//! Storage layer - table files, page formats and tuples.
//!
//! This module handles persistent storage:
//! - [`PageStore`] - The seam the buffer pool reads and writes pages through
//! - [`HeapFile`] - File-backed page store for one table
//! - [`Catalog`] - Table id → page store registry
//! - [`page`] - Page types and layouts
//! - [`tuple`] - Schemas, fields and record ids

mod catalog;
mod heap_file;
pub mod page;
mod page_store;
pub mod tuple;

pub use catalog::Catalog;
pub use heap_file::HeapFile;
pub use page_store::PageStore;
