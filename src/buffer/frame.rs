//! Frame - a slot in the buffer pool.
//!
//! A [`Frame`] pairs a cached page buffer with the metadata the pool needs:
//! - Which page is loaded
//! - Which transaction (if any) has dirtied it
//! - A write generation, bumped every time the page is marked dirty
//!
//! The dirty flag and its owner are one field, so a page can never be
//! dirty without an owner.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::buffer::PageHandle;
use crate::common::PageId;
use crate::concurrency::TransactionId;
use crate::storage::page::Page;

/// A cached page plus its dirty/owner metadata.
///
/// The metadata lives here, inside the pool's arena, and never in the
/// [`Page`] callers see; a caller holding a [`PageHandle`] cannot race the
/// pool's own dirty-state transitions.
pub struct Frame {
    /// Which page is loaded.
    page_id: PageId,

    /// The page data, shared with outstanding handles.
    page: Arc<RwLock<Page>>,

    /// Transaction whose uncommitted writes this page holds.
    dirtied_by: Option<TransactionId>,

    /// Bumped on every `mark_dirty`; a flush may only clear the writes it saw.
    generation: u64,
}

impl Frame {
    /// Create a clean frame for `page_id` around an existing buffer.
    pub fn new(page_id: PageId, page: Arc<RwLock<Page>>) -> Self {
        Self {
            page_id,
            page,
            dirtied_by: None,
            generation: 0,
        }
    }

    /// Get the page ID of the loaded page.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// A new caller-facing handle on this frame's buffer.
    pub fn handle(&self) -> PageHandle {
        PageHandle::new(self.page_id, Arc::clone(&self.page))
    }

    /// Whether `handle` points at this frame's buffer.
    pub fn shares_buffer(&self, handle: &PageHandle) -> bool {
        Arc::ptr_eq(&self.page, handle.buffer())
    }

    /// Swap in another buffer for the same page.
    ///
    /// Used when a modified page comes back after its stale copy was evicted
    /// and reloaded.
    pub fn replace_buffer(&mut self, handle: &PageHandle) {
        debug_assert_eq!(handle.page_id(), self.page_id);
        self.page = Arc::clone(handle.buffer());
    }

    // ========================================================================
    // Dirty flag operations
    // ========================================================================

    /// Mark the frame dirty on behalf of `tid`.
    #[inline]
    pub fn mark_dirty(&mut self, tid: TransactionId) {
        self.dirtied_by = Some(tid);
        self.generation = self.generation.wrapping_add(1);
    }

    /// Clear the dirty flag and its owner together.
    #[inline]
    pub fn clear_dirty(&mut self) {
        self.dirtied_by = None;
    }

    /// Check if the frame is dirty.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirtied_by.is_some()
    }

    /// The transaction that last modified this page, if dirty.
    #[inline]
    pub fn dirtied_by(&self) -> Option<TransactionId> {
        self.dirtied_by
    }

    /// Write generation; changes whenever the page is dirtied again.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
