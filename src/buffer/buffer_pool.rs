//! Buffer Pool - the page cache and transaction boundary.
//!
//! The [`BufferPool`] provides:
//! - Page caching between table files and memory, with LRU ordering
//! - Page-level two-phase locking through the [`LockManager`]
//! - No-steal eviction: dirty pages are never evicted
//! - Commit (flush) and abort (restore from disk) of a transaction's pages

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace, warn};

use crate::buffer::replacer::LruReplacer;
use crate::buffer::{BufferPoolStats, Frame, PageHandle};
use crate::common::{BufferPoolConfig, Error, FrameId, PageId, Result, TableId};
use crate::concurrency::{LockManager, Permissions, TransactionId};
use crate::storage::page::Page;
use crate::storage::tuple::{RecordId, Tuple};
use crate::storage::Catalog;

/// Cache bookkeeping, always mutated under one lock so eviction never
/// works from a stale view of occupancy.
struct PoolState {
    /// Frame arena; `None` slots are on `free_frames`.
    frames: Vec<Option<Frame>>,

    /// Recycled arena slots.
    free_frames: Vec<FrameId>,

    /// Maps page IDs to frame IDs.
    page_table: HashMap<PageId, FrameId>,

    /// Recency order over exactly the frames in `page_table`.
    lru: LruReplacer,
}

impl PoolState {
    fn new(capacity: usize) -> Self {
        Self {
            frames: Vec::with_capacity(capacity + 1),
            free_frames: Vec::new(),
            page_table: HashMap::with_capacity(capacity + 1),
            lru: LruReplacer::new(),
        }
    }

    fn len(&self) -> usize {
        self.page_table.len()
    }

    fn frame(&self, frame_id: FrameId) -> Option<&Frame> {
        self.frames.get(frame_id.0)?.as_ref()
    }

    fn frame_mut(&mut self, frame_id: FrameId) -> Option<&mut Frame> {
        self.frames.get_mut(frame_id.0)?.as_mut()
    }

    fn lookup(&self, page_id: PageId) -> Option<&Frame> {
        self.frame(*self.page_table.get(&page_id)?)
    }

    fn lookup_mut(&mut self, page_id: PageId) -> Option<&mut Frame> {
        let frame_id = *self.page_table.get(&page_id)?;
        self.frame_mut(frame_id)
    }

    /// Move a cached page to the head and hand out its buffer.
    fn touch(&mut self, page_id: PageId) -> Option<PageHandle> {
        let frame_id = *self.page_table.get(&page_id)?;
        self.lru.touch(frame_id);
        self.frame(frame_id).map(Frame::handle)
    }

    /// Register a frame at the head of the LRU order.
    fn insert(&mut self, frame: Frame) -> FrameId {
        let page_id = frame.page_id();
        let frame_id = match self.free_frames.pop() {
            Some(frame_id) => {
                self.frames[frame_id.0] = Some(frame);
                frame_id
            }
            None => {
                self.frames.push(Some(frame));
                FrameId::new(self.frames.len() - 1)
            }
        };
        self.page_table.insert(page_id, frame_id);
        self.lru.push_front(frame_id);
        frame_id
    }

    /// Drop a frame from the page table, the LRU order and the arena.
    fn remove_frame(&mut self, frame_id: FrameId) -> Option<Frame> {
        let frame = self.frames.get_mut(frame_id.0)?.take()?;
        self.page_table.remove(&frame.page_id());
        self.lru.remove(frame_id);
        self.free_frames.push(frame_id);
        Some(frame)
    }

    fn remove(&mut self, page_id: PageId) -> Option<Frame> {
        let frame_id = *self.page_table.get(&page_id)?;
        self.remove_frame(frame_id)
    }

    /// Least recently used clean frame, scanning tail → head.
    fn find_victim(&self, protect: Option<FrameId>) -> Option<FrameId> {
        self.lru.iter_lru().find(|&frame_id| {
            Some(frame_id) != protect && self.frame(frame_id).is_some_and(|f| !f.is_dirty())
        })
    }

    fn dirty_count(&self) -> usize {
        self.frames.iter().flatten().filter(|f| f.is_dirty()).count()
    }

    /// Cached pages dirtied by `tid`, or by anyone when `tid` is `None`.
    fn dirty_pages(&self, tid: Option<TransactionId>) -> Vec<PageId> {
        self.frames
            .iter()
            .flatten()
            .filter(|f| match tid {
                Some(tid) => f.dirtied_by() == Some(tid),
                None => f.is_dirty(),
            })
            .map(Frame::page_id)
            .collect()
    }
}

/// Fixed-capacity page cache with transactional page locking.
///
/// # Architecture
/// ```text
/// ┌───────────────────────────────────────────────────────────────┐
/// │                          BufferPool                           │
/// │  ┌──────────────────────── state: Mutex ──────────────────┐   │
/// │  │ page_table        frames: Vec<Option<Frame>>           │   │
/// │  │ PageId → Fid ──▶  [Frame0] [Frame1] [ -- ] [Frame3]    │   │
/// │  │ lru: HEAD ⇄ F3 ⇄ F0 ⇄ F1 ⇄ TAIL   free_frames: [2]     │   │
/// │  └────────────────────────────────────────────────────────┘   │
/// │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐         │
/// │  │ lock_manager │  │   catalog    │  │    stats     │         │
/// │  │ PageId→locks │  │ TableId→store│  │   atomics    │         │
/// │  └──────────────┘  └──────────────┘  └──────────────┘         │
/// └───────────────────────────────────────────────────────────────┘
/// ```
///
/// # Thread Safety
/// - `state`: `Mutex`; page table, frame arena and LRU order change together
/// - `lock_manager`: its own `Mutex` + `Condvar`; never taken while `state`
///   is held
/// - page I/O runs outside `state`; page buffers have their own latches
/// - `stats`: no lock, all atomic counters
///
/// # Usage
/// ```ignore
/// let pool = BufferPool::new(BufferPoolConfig::default(), catalog);
/// let tid = TransactionId::new();
///
/// let rid = pool.insert_tuple(tid, table_id, tuple)?;
/// let page = pool.get_page(tid, rid.page_id, Permissions::ReadOnly)?;
/// pool.commit(tid)?;
/// ```
pub struct BufferPool {
    config: BufferPoolConfig,
    state: Mutex<PoolState>,
    lock_manager: LockManager,
    catalog: Arc<Catalog>,
    stats: BufferPoolStats,
}

impl BufferPool {
    /// Create a buffer pool over the tables registered in `catalog`.
    ///
    /// # Panics
    /// Panics if `config.capacity` is 0.
    pub fn new(config: BufferPoolConfig, catalog: Arc<Catalog>) -> Self {
        assert!(config.capacity > 0, "capacity must be > 0");

        Self {
            state: Mutex::new(PoolState::new(config.capacity)),
            config,
            lock_manager: LockManager::new(),
            catalog,
            stats: BufferPoolStats::new(),
        }
    }

    /// Create a pool with default settings and the given page capacity.
    pub fn with_capacity(capacity: usize, catalog: Arc<Catalog>) -> Self {
        Self::new(BufferPoolConfig::default().with_capacity(capacity), catalog)
    }

    // ========================================================================
    // Public API: Page access
    // ========================================================================

    /// Fetch a page on behalf of `tid`, locking it first.
    ///
    /// `ReadOnly` takes a shared lock, `ReadWrite` an exclusive one. The
    /// wait is bounded by a deadline drawn once per call from the
    /// configured window; past it the call fails and the caller should
    /// abort the transaction.
    ///
    /// # Errors
    /// - `Error::TransactionAborted` if the lock wait timed out
    /// - `Error::EvictionImpossible` if loading the page overflowed a pool
    ///   full of dirty pages
    /// - `Error::PageOutOfRange` / I/O errors from the page store
    pub fn get_page(
        &self,
        tid: TransactionId,
        page_id: PageId,
        perm: Permissions,
    ) -> Result<PageHandle> {
        let mode = perm.lock_mode();
        let timeout = self.config.lock_timeout();

        if !self.lock_manager.acquire_for(page_id, tid, mode, timeout) {
            BufferPoolStats::bump(&self.stats.lock_timeouts);
            debug!(%tid, %page_id, %mode, ?timeout, "lock wait timed out");
            return Err(Error::TransactionAborted { tid, page_id, mode });
        }

        if let Some(handle) = self.state.lock().touch(page_id) {
            BufferPoolStats::bump(&self.stats.cache_hits);
            trace!(%tid, %page_id, "cache hit");
            return Ok(handle);
        }

        self.load_page(page_id)
    }

    /// Release `tid`'s lock on one page.
    ///
    /// Breaks two-phase locking if used casually; meant for recovery code,
    /// tests, and page stores releasing pages they only inspected.
    pub fn release_page(&self, tid: TransactionId, page_id: PageId) {
        self.lock_manager.release(page_id, tid);
    }

    /// Whether `tid` holds a lock on `page_id`.
    pub fn holds_lock(&self, tid: TransactionId, page_id: PageId) -> bool {
        self.lock_manager.holds_lock(page_id, tid)
    }

    // ========================================================================
    // Public API: Tuple mutation
    // ========================================================================

    /// Insert `tuple` into table `table_id` on behalf of `tid`.
    ///
    /// The table's page store picks (and exclusively locks) the page; every
    /// page it modified is then marked dirty by `tid`, moved to the LRU
    /// head and re-registered in the cache.
    ///
    /// # Errors
    /// - `Error::SchemaMismatch` if the tuple doesn't fit the table schema
    /// - `Error::TableNotFound`, lock and eviction errors
    pub fn insert_tuple(&self, tid: TransactionId, table_id: TableId, tuple: Tuple) -> Result<RecordId> {
        let store = self.catalog.get(table_id)?;
        let (record_id, pages) = store.insert_tuple(self, tid, &tuple)?;
        self.register_dirty_pages(tid, &pages)?;
        trace!(%tid, ?record_id, "inserted tuple");
        Ok(record_id)
    }

    /// Delete `tuple` (located by its record id) on behalf of `tid`.
    ///
    /// # Errors
    /// - `Error::MissingRecordId` if the tuple was never stored
    /// - `Error::SchemaMismatch`, `Error::TupleNotFound`, lock and eviction
    ///   errors
    pub fn delete_tuple(&self, tid: TransactionId, tuple: &Tuple) -> Result<()> {
        let record_id = tuple.record_id().ok_or(Error::MissingRecordId)?;
        let store = self.catalog.get(record_id.page_id.table_id)?;
        let pages = store.delete_tuple(self, tid, tuple)?;
        self.register_dirty_pages(tid, &pages)?;
        trace!(%tid, ?record_id, "deleted tuple");
        Ok(())
    }

    // ========================================================================
    // Public API: Transactions
    // ========================================================================

    /// Commit `tid`: flush its dirty pages, then release all its locks.
    pub fn commit(&self, tid: TransactionId) -> Result<()> {
        self.transaction_complete(tid, true)
    }

    /// Abort `tid`: restore its dirty pages from disk, then release all its
    /// locks.
    pub fn abort(&self, tid: TransactionId) -> Result<()> {
        self.transaction_complete(tid, false)
    }

    /// Finish `tid`, either flushing (`commit`) or restoring its pages.
    ///
    /// Afterwards `tid` holds no locks anywhere. If flushing or restoring
    /// fails, the error is returned and the locks stay held.
    pub fn transaction_complete(&self, tid: TransactionId, commit: bool) -> Result<()> {
        if commit {
            self.flush_pages(tid)?;
        } else {
            self.restore_pages(tid)?;
        }

        let released = self.lock_manager.release_all(tid);
        debug!(%tid, commit, released, "transaction complete");

        // Pages this transaction kept over capacity are clean now.
        let mut state = self.state.lock();
        if let Err(err) = self.evict_locked(&mut state, None) {
            trace!(%tid, %err, "pool still over capacity");
        }
        Ok(())
    }

    // ========================================================================
    // Public API: Flush and restore
    // ========================================================================

    /// Write a cached page to its store if dirty, then mark it clean.
    ///
    /// # Errors
    /// - I/O errors from the page store
    pub fn flush_page(&self, page_id: PageId) -> Result<()> {
        let Some((handle, generation)) = self.dirty_handle(page_id) else {
            return Ok(());
        };

        let store = self.catalog.get(page_id.table_id)?;
        store.write_page(page_id, &handle.read())?;
        BufferPoolStats::bump(&self.stats.pages_written);

        self.clear_dirty_if_current(&handle, generation);
        trace!(%page_id, "flushed page");
        Ok(())
    }

    /// Flush every cached page dirtied by `tid`.
    pub fn flush_pages(&self, tid: TransactionId) -> Result<()> {
        let pages = self.state.lock().dirty_pages(Some(tid));
        for page_id in pages {
            self.flush_page(page_id)?;
        }
        Ok(())
    }

    /// Flush every dirty page, whoever owns it.
    ///
    /// Under no-steal this can put uncommitted data on disk; use it only at
    /// shutdown or in tests.
    pub fn flush_all_pages(&self) -> Result<()> {
        let pages = self.state.lock().dirty_pages(None);
        for page_id in pages {
            self.flush_page(page_id)?;
        }
        Ok(())
    }

    /// Roll a dirty cached page back to its on-disk image.
    ///
    /// The bytes are copied into the existing buffer, so handles callers
    /// still hold see the restored contents.
    pub fn restore_page(&self, page_id: PageId) -> Result<()> {
        let Some((handle, generation)) = self.dirty_handle(page_id) else {
            return Ok(());
        };

        let store = self.catalog.get(page_id.table_id)?;
        let on_disk = store.read_page(page_id)?;
        handle.write().copy_from(&on_disk);
        BufferPoolStats::bump(&self.stats.pages_restored);

        self.clear_dirty_if_current(&handle, generation);
        trace!(%page_id, "restored page");
        Ok(())
    }

    /// Restore every cached page dirtied by `tid`.
    pub fn restore_pages(&self, tid: TransactionId) -> Result<()> {
        let pages = self.state.lock().dirty_pages(Some(tid));
        for page_id in pages {
            self.restore_page(page_id)?;
        }
        Ok(())
    }

    /// Drop a page from the cache without flushing it.
    ///
    /// For recovery/maintenance code that knows the cached image is
    /// irrelevant or already on disk.
    pub fn discard_page(&self, page_id: PageId) {
        if self.state.lock().remove(page_id).is_some() {
            trace!(%page_id, "discarded page");
        }
    }

    // ========================================================================
    // Public API: Stats and info
    // ========================================================================

    /// Get buffer pool statistics.
    pub fn stats(&self) -> &BufferPoolStats {
        &self.stats
    }

    /// The pool's lock table.
    pub fn lock_manager(&self) -> &LockManager {
        &self.lock_manager
    }

    /// The catalog the pool resolves tables through.
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Maximum number of cached pages.
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Get the number of pages in the buffer pool.
    pub fn page_count(&self) -> usize {
        self.state.lock().len()
    }

    /// Whether `page_id` is cached.
    pub fn is_cached(&self, page_id: PageId) -> bool {
        self.state.lock().page_table.contains_key(&page_id)
    }

    /// Whether `page_id` is cached and dirty.
    pub fn is_dirty(&self, page_id: PageId) -> bool {
        self.dirtied_by(page_id).is_some()
    }

    /// The transaction whose writes the cached page holds, if any.
    pub fn dirtied_by(&self, page_id: PageId) -> Option<TransactionId> {
        self.state.lock().lookup(page_id)?.dirtied_by()
    }

    /// Cached pages from most to least recently used.
    pub fn lru_order(&self) -> Vec<PageId> {
        let state = self.state.lock();
        state
            .lru
            .iter_mru()
            .filter_map(|frame_id| state.frame(frame_id).map(Frame::page_id))
            .collect()
    }

    // ========================================================================
    // Internal: Cache maintenance
    // ========================================================================

    /// Handle a cache miss: read from the store, then register the page.
    fn load_page(&self, page_id: PageId) -> Result<PageHandle> {
        BufferPoolStats::bump(&self.stats.cache_misses);

        let store = self.catalog.get(page_id.table_id)?;
        let page: Page = store.read_page(page_id)?;
        BufferPoolStats::bump(&self.stats.pages_read);

        let mut state = self.state.lock();

        // Another reader may have loaded it while we were on disk.
        if let Some(handle) = state.touch(page_id) {
            return Ok(handle);
        }

        let frame = Frame::new(page_id, Arc::new(RwLock::new(page)));
        let handle = frame.handle();
        let frame_id = state.insert(frame);

        if let Err(err) = self.evict_locked(&mut state, Some(frame_id)) {
            // Keep occupancy within bounds; the new page is clean.
            state.remove_frame(frame_id);
            return Err(err);
        }

        debug!(%page_id, "loaded page");
        Ok(handle)
    }

    /// Mark every page a mutation touched as dirtied by `tid`.
    ///
    /// All pages are marked before the first error is returned, so a failed
    /// eviction never leaves a modified page looking clean.
    fn register_dirty_pages(&self, tid: TransactionId, pages: &[PageHandle]) -> Result<()> {
        let mut result = Ok(());
        for handle in pages {
            if let Err(err) = self.register_dirty(tid, handle) {
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }
        result
    }

    /// Mark dirty, move to head, replace any stale cached copy, then evict.
    fn register_dirty(&self, tid: TransactionId, handle: &PageHandle) -> Result<()> {
        let page_id = handle.page_id();
        let mut state = self.state.lock();

        let frame_id = match state.page_table.get(&page_id).copied() {
            Some(frame_id) => {
                state.lru.touch(frame_id);
                frame_id
            }
            None => state.insert(Frame::new(page_id, Arc::clone(handle.buffer()))),
        };

        if let Some(frame) = state.frame_mut(frame_id) {
            if !frame.shares_buffer(handle) {
                frame.replace_buffer(handle);
            }
            frame.mark_dirty(tid);
        }

        self.evict_locked(&mut state, Some(frame_id))
    }

    /// Evict clean LRU pages until the cache fits its capacity.
    ///
    /// `protect` is the page being served to the caller; it is never its
    /// own eviction victim.
    fn evict_locked(&self, state: &mut PoolState, protect: Option<FrameId>) -> Result<()> {
        while state.len() > self.config.capacity {
            let Some(victim) = state.find_victim(protect) else {
                let dirty = state.dirty_count();
                let capacity = self.config.capacity;
                warn!(cached = state.len(), dirty, capacity, "no clean page to evict");
                return Err(Error::EvictionImpossible { dirty, capacity });
            };

            // Clean pages match their on-disk image; nothing to write back.
            if let Some(frame) = state.remove_frame(victim) {
                BufferPoolStats::bump(&self.stats.evictions);
                trace!(page_id = %frame.page_id(), "evicted page");
            }
        }
        Ok(())
    }

    /// Handle on a cached page and its write generation, only if dirty.
    fn dirty_handle(&self, page_id: PageId) -> Option<(PageHandle, u64)> {
        let state = self.state.lock();
        let frame = state.lookup(page_id)?;
        frame.is_dirty().then(|| (frame.handle(), frame.generation()))
    }

    /// Clear dirty state, unless the frame was replaced or dirtied again
    /// since `generation` was read.
    fn clear_dirty_if_current(&self, handle: &PageHandle, generation: u64) {
        let mut state = self.state.lock();
        if let Some(frame) = state.lookup_mut(handle.page_id()) {
            if frame.shares_buffer(handle) && frame.generation() == generation {
                frame.clear_dirty();
            } else {
                trace!(page_id = %handle.page_id(), "page rewritten during flush; stays dirty");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::PAGE_SIZE;
    use crate::concurrency::LockMode;
    use crate::storage::tuple::{Field, Type, TupleDesc};
    use crate::storage::{HeapFile, PageStore};
    use std::time::Duration;
    use tempfile::tempdir;

    /// Pool over one heap table with `pages` empty pages already on disk.
    fn create_test_pool(capacity: usize, pages: u32) -> (BufferPool, Arc<HeapFile>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let desc = TupleDesc::new(vec![Type::Int, Type::Int]);
        let file = Arc::new(HeapFile::create(dir.path().join("t.dat"), desc).unwrap());
        for _ in 0..pages {
            file.append_empty_page().unwrap();
        }

        let catalog = Arc::new(Catalog::new());
        catalog.add_table(file.clone());

        let config = BufferPoolConfig::default()
            .with_capacity(capacity)
            .with_lock_timeout(Duration::from_millis(50), Duration::from_millis(100));
        (BufferPool::new(config, catalog), file, dir)
    }

    fn pid(file: &HeapFile, n: u32) -> PageId {
        PageId::new(file.table_id(), n)
    }

    fn row(a: i32) -> Tuple {
        Tuple::new(vec![Field::Int(a), Field::Int(a * 10)])
    }

    #[test]
    fn test_get_page_miss_then_hit() {
        let (pool, file, _dir) = create_test_pool(4, 2);
        let tid = TransactionId::new();

        let first = pool.get_page(tid, pid(&file, 0), Permissions::ReadOnly).unwrap();
        let second = pool.get_page(tid, pid(&file, 0), Permissions::ReadOnly).unwrap();
        assert_eq!(first.page_id(), second.page_id());

        let snapshot = pool.stats().snapshot();
        assert_eq!(snapshot.cache_misses, 1);
        assert_eq!(snapshot.cache_hits, 1);
        assert_eq!(pool.page_count(), 1);
    }

    #[test]
    fn test_get_page_takes_matching_lock() {
        let (pool, file, _dir) = create_test_pool(4, 2);
        let tid = TransactionId::new();

        pool.get_page(tid, pid(&file, 0), Permissions::ReadOnly).unwrap();
        pool.get_page(tid, pid(&file, 1), Permissions::ReadWrite).unwrap();

        let lm = pool.lock_manager();
        assert_eq!(lm.lock_mode(pid(&file, 0), tid), Some(LockMode::Shared));
        assert_eq!(lm.lock_mode(pid(&file, 1), tid), Some(LockMode::Exclusive));
        assert!(pool.holds_lock(tid, pid(&file, 0)));
    }

    #[test]
    fn test_get_page_out_of_range() {
        let (pool, file, _dir) = create_test_pool(4, 1);
        let tid = TransactionId::new();

        let err = pool.get_page(tid, pid(&file, 5), Permissions::ReadOnly).unwrap_err();
        assert!(matches!(err, Error::PageOutOfRange { num_pages: 1, .. }));
        assert!(!pool.is_cached(pid(&file, 5)));
    }

    #[test]
    fn test_lru_evicts_least_recently_used() {
        let (pool, file, _dir) = create_test_pool(2, 3);
        let tid = TransactionId::new();
        let (a, b, c) = (pid(&file, 0), pid(&file, 1), pid(&file, 2));

        pool.get_page(tid, a, Permissions::ReadOnly).unwrap();
        pool.get_page(tid, b, Permissions::ReadOnly).unwrap();
        pool.get_page(tid, c, Permissions::ReadOnly).unwrap();

        assert!(!pool.is_cached(a));
        assert_eq!(pool.lru_order(), vec![c, b]);
        assert_eq!(pool.stats().snapshot().evictions, 1);
    }

    #[test]
    fn test_hit_refreshes_recency() {
        let (pool, file, _dir) = create_test_pool(2, 3);
        let tid = TransactionId::new();
        let (a, b, c) = (pid(&file, 0), pid(&file, 1), pid(&file, 2));

        pool.get_page(tid, a, Permissions::ReadOnly).unwrap();
        pool.get_page(tid, b, Permissions::ReadOnly).unwrap();
        pool.get_page(tid, a, Permissions::ReadOnly).unwrap();
        pool.get_page(tid, c, Permissions::ReadOnly).unwrap();

        assert!(!pool.is_cached(b));
        assert_eq!(pool.lru_order(), vec![c, a]);
    }

    #[test]
    fn test_eviction_skips_dirty_pages() {
        let (pool, file, _dir) = create_test_pool(2, 0);
        let tid = TransactionId::new();

        // Dirty page 0, then read two more pages through the pool.
        let rid = pool.insert_tuple(tid, file.table_id(), row(1)).unwrap();
        file.append_empty_page().unwrap();
        file.append_empty_page().unwrap();
        pool.get_page(tid, pid(&file, 1), Permissions::ReadOnly).unwrap();
        pool.get_page(tid, pid(&file, 2), Permissions::ReadOnly).unwrap();

        assert!(pool.is_dirty(rid.page_id));
        assert!(pool.is_cached(rid.page_id));
        assert!(!pool.is_cached(pid(&file, 1)));
        assert_eq!(pool.page_count(), 2);
    }

    #[test]
    fn test_eviction_impossible_when_all_dirty() {
        let (pool, file, _dir) = create_test_pool(1, 0);
        let tid = TransactionId::new();

        let rid = pool.insert_tuple(tid, file.table_id(), row(1)).unwrap();
        file.append_empty_page().unwrap();

        let err = pool.get_page(tid, pid(&file, 1), Permissions::ReadOnly).unwrap_err();
        assert!(matches!(err, Error::EvictionImpossible { dirty: 1, capacity: 1 }));
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "cannot evict: 1 dirty pages fill capacity 1");

        // The dirty page survives, the new one was not kept.
        assert!(pool.is_dirty(rid.page_id));
        assert!(!pool.is_cached(pid(&file, 1)));
        assert_eq!(pool.page_count(), 1);
    }

    #[test]
    fn test_commit_flushes_and_releases() {
        let (pool, file, _dir) = create_test_pool(4, 0);
        let tid = TransactionId::new();

        let rid = pool.insert_tuple(tid, file.table_id(), row(7)).unwrap();
        assert_eq!(pool.dirtied_by(rid.page_id), Some(tid));

        pool.commit(tid).unwrap();

        assert!(!pool.is_dirty(rid.page_id));
        assert!(!pool.holds_lock(tid, rid.page_id));
        let on_disk = file.read_page(rid.page_id).unwrap();
        let cached = pool.get_page(tid, rid.page_id, Permissions::ReadOnly).unwrap();
        // The store stamps a checksum on its copy; everything past it matches.
        assert_eq!(&on_disk.as_slice()[5..PAGE_SIZE], &cached.read().as_slice()[5..PAGE_SIZE]);
    }

    #[test]
    fn test_abort_restores_disk_image() {
        let (pool, file, _dir) = create_test_pool(4, 1);
        let tid = TransactionId::new();
        let page_id = pid(&file, 0);

        let handle = pool.get_page(tid, page_id, Permissions::ReadOnly).unwrap();
        let before = handle.read().as_slice().to_vec();

        pool.insert_tuple(tid, file.table_id(), row(3)).unwrap();
        assert_ne!(handle.read().as_slice(), &before[..]);

        pool.abort(tid).unwrap();

        assert_eq!(handle.read().as_slice(), &before[..]);
        assert!(!pool.is_dirty(page_id));
        assert!(!pool.holds_lock(tid, page_id));
        assert_eq!(pool.stats().snapshot().pages_restored, 1);
    }

    #[test]
    fn test_flush_page_of_clean_or_uncached_page_is_noop() {
        let (pool, file, _dir) = create_test_pool(4, 1);
        let tid = TransactionId::new();

        pool.flush_page(pid(&file, 0)).unwrap();
        pool.get_page(tid, pid(&file, 0), Permissions::ReadOnly).unwrap();
        pool.flush_page(pid(&file, 0)).unwrap();

        assert_eq!(pool.stats().snapshot().pages_written, 0);
    }

    #[test]
    fn test_flush_all_pages_ignores_owner() {
        let (pool, file, _dir) = create_test_pool(4, 0);
        let t1 = TransactionId::new();

        let rid = pool.insert_tuple(t1, file.table_id(), row(1)).unwrap();
        pool.flush_all_pages().unwrap();

        assert!(!pool.is_dirty(rid.page_id));
        // Lock is still held: flushing is not committing.
        assert!(pool.holds_lock(t1, rid.page_id));
    }

    #[test]
    fn test_write_during_flush_keeps_page_dirty() {
        let (pool, file, _dir) = create_test_pool(4, 0);
        let tid = TransactionId::new();

        let rid = pool.insert_tuple(tid, file.table_id(), row(1)).unwrap();
        let (handle, generation) = pool.dirty_handle(rid.page_id).unwrap();

        // A second write lands after the flush took its snapshot.
        pool.insert_tuple(tid, file.table_id(), row(2)).unwrap();
        pool.clear_dirty_if_current(&handle, generation);
        assert_eq!(pool.dirtied_by(rid.page_id), Some(tid));

        // With the current generation the flush may clear it.
        let (handle, generation) = pool.dirty_handle(rid.page_id).unwrap();
        pool.clear_dirty_if_current(&handle, generation);
        assert!(!pool.is_dirty(rid.page_id));
    }

    #[test]
    fn test_unbounded_lock_timeout_serves_pages() {
        let (_, file, _dir) = create_test_pool(4, 1);
        let catalog = Arc::new(Catalog::new());
        catalog.add_table(file.clone());
        let config = BufferPoolConfig::default()
            .with_capacity(4)
            .with_lock_timeout(Duration::MAX, Duration::MAX);
        let pool = BufferPool::new(config, catalog);
        let tid = TransactionId::new();

        pool.get_page(tid, pid(&file, 0), Permissions::ReadWrite).unwrap();
        pool.get_page(tid, pid(&file, 0), Permissions::ReadOnly).unwrap();
        assert!(pool.holds_lock(tid, pid(&file, 0)));
    }

    #[test]
    fn test_discard_page_drops_without_flush() {
        let (pool, file, _dir) = create_test_pool(4, 0);
        let tid = TransactionId::new();

        let rid = pool.insert_tuple(tid, file.table_id(), row(1)).unwrap();
        pool.discard_page(rid.page_id);

        assert!(!pool.is_cached(rid.page_id));
        assert!(pool.lru_order().is_empty());
        assert_eq!(pool.stats().snapshot().pages_written, 0);
    }

    #[test]
    fn test_release_page() {
        let (pool, file, _dir) = create_test_pool(4, 1);
        let tid = TransactionId::new();

        pool.get_page(tid, pid(&file, 0), Permissions::ReadWrite).unwrap();
        pool.release_page(tid, pid(&file, 0));
        assert!(!pool.holds_lock(tid, pid(&file, 0)));
    }

    #[test]
    fn test_lock_timeout_aborts() {
        let (pool, file, _dir) = create_test_pool(4, 1);
        let (t1, t2) = (TransactionId::new(), TransactionId::new());

        pool.get_page(t1, pid(&file, 0), Permissions::ReadWrite).unwrap();
        let err = pool.get_page(t2, pid(&file, 0), Permissions::ReadOnly).unwrap_err();

        assert!(matches!(err, Error::TransactionAborted { tid, .. } if tid == t2));
        assert_eq!(pool.stats().snapshot().lock_timeouts, 1);
    }

    #[test]
    #[should_panic(expected = "capacity must be > 0")]
    fn test_zero_capacity_panics() {
        BufferPool::with_capacity(0, Arc::new(Catalog::new()));
    }
}
