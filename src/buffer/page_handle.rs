//! Caller-facing handles on cached pages.
//!
//! A [`PageHandle`] is what `BufferPool::get_page` returns: a shared
//! reference to one page buffer behind a reader/writer latch.
//!
//! The latch only guarantees memory safety. Logical isolation comes from
//! the page lock the transaction took in `get_page`: callers must only
//! `write()` through a handle obtained with `Permissions::ReadWrite`.

use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::PageId;
use crate::storage::page::Page;

/// Shared handle on a cached page buffer.
///
/// # Example
/// ```ignore
/// let handle = pool.get_page(tid, pid, Permissions::ReadOnly)?;
/// let header = handle.read().header();
/// ```
#[derive(Clone)]
pub struct PageHandle {
    /// Page ID for convenience.
    page_id: PageId,
    /// The buffer, shared with the pool's frame.
    page: Arc<RwLock<Page>>,
}

impl PageHandle {
    pub(crate) fn new(page_id: PageId, page: Arc<RwLock<Page>>) -> Self {
        Self { page_id, page }
    }

    /// Get the page ID.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Latch the page for reading.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, Page> {
        self.page.read()
    }

    /// Latch the page for writing.
    ///
    /// Changes are not dirty-tracked until the pool re-registers the page
    /// (`BufferPool::insert_tuple` / `delete_tuple` do this).
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, Page> {
        self.page.write()
    }

    pub(crate) fn buffer(&self) -> &Arc<RwLock<Page>> {
        &self.page
    }
}

impl fmt::Debug for PageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageHandle")
            .field("page_id", &self.page_id)
            .finish_non_exhaustive()
    }
}
