//! Page-granularity shared/exclusive lock table.
//!
//! The [`LockManager`] grants locks per [`PageId`]. For every page the set
//! of holders is one of:
//! - empty (the row is dropped from the table),
//! - exactly one EXCLUSIVE entry,
//! - any number of SHARED entries.
//!
//! A transaction holds at most one entry per page. A sole SHARED holder
//! asking for EXCLUSIVE is upgraded in place.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::trace;

use crate::common::PageId;
use crate::concurrency::TransactionId;

/// Lock strength on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    Shared,
    Exclusive,
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockMode::Shared => write!(f, "shared"),
            LockMode::Exclusive => write!(f, "exclusive"),
        }
    }
}

/// One transaction's hold on one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockEntry {
    pub tid: TransactionId,
    pub mode: LockMode,
}

type LockTable = HashMap<PageId, Vec<LockEntry>>;

/// Grants and releases page locks.
///
/// # Thread Safety
/// - `table`: one `Mutex` over the whole lock table; no row is ever seen
///   half-updated
/// - `released`: `Condvar` signalled on every release so blocked
///   requests re-check instead of polling
pub struct LockManager {
    table: Mutex<LockTable>,
    released: Condvar,
}

impl LockManager {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self {
            table: Mutex::new(HashMap::new()),
            released: Condvar::new(),
        }
    }

    /// Try once to grant `mode` on `page_id` to `tid`. Never blocks.
    pub fn acquire(&self, page_id: PageId, tid: TransactionId, mode: LockMode) -> bool {
        let mut table = self.table.lock();
        Self::try_grant(&mut table, page_id, tid, mode)
    }

    /// Block until the lock is granted or `deadline` passes.
    ///
    /// Returns `false` on timeout. Waiters are woken by every release and
    /// retry the grant against the current table.
    pub fn acquire_until(
        &self,
        page_id: PageId,
        tid: TransactionId,
        mode: LockMode,
        deadline: Instant,
    ) -> bool {
        let mut table = self.table.lock();
        loop {
            if Self::try_grant(&mut table, page_id, tid, mode) {
                return true;
            }
            trace!(%tid, %page_id, %mode, "waiting for page lock");
            if self.released.wait_until(&mut table, deadline).timed_out() {
                return Self::try_grant(&mut table, page_id, tid, mode);
            }
        }
    }

    /// Block for at most `timeout`, or indefinitely if the deadline would
    /// overflow the clock.
    pub fn acquire_for(
        &self,
        page_id: PageId,
        tid: TransactionId,
        mode: LockMode,
        timeout: Duration,
    ) -> bool {
        if let Some(deadline) = Instant::now().checked_add(timeout) {
            return self.acquire_until(page_id, tid, mode, deadline);
        }

        let mut table = self.table.lock();
        while !Self::try_grant(&mut table, page_id, tid, mode) {
            trace!(%tid, %page_id, %mode, "waiting for page lock without deadline");
            self.released.wait(&mut table);
        }
        true
    }

    /// Drop `tid`'s entry on `page_id`, if any.
    pub fn release(&self, page_id: PageId, tid: TransactionId) {
        let mut table = self.table.lock();
        if Self::remove_entry(&mut table, page_id, tid) {
            self.released.notify_all();
        }
    }

    /// Drop every lock `tid` holds. Returns how many were released.
    pub fn release_all(&self, tid: TransactionId) -> usize {
        let mut table = self.table.lock();
        let before = table.len();
        let mut released = 0;
        table.retain(|_, entries| {
            let len = entries.len();
            entries.retain(|e| e.tid != tid);
            released += len - entries.len();
            !entries.is_empty()
        });
        if released > 0 {
            trace!(%tid, released, rows_dropped = before - table.len(), "released all locks");
            self.released.notify_all();
        }
        released
    }

    /// Whether `tid` holds any lock on `page_id`.
    pub fn holds_lock(&self, page_id: PageId, tid: TransactionId) -> bool {
        self.lock_mode(page_id, tid).is_some()
    }

    /// The mode `tid` currently holds on `page_id`.
    pub fn lock_mode(&self, page_id: PageId, tid: TransactionId) -> Option<LockMode> {
        let table = self.table.lock();
        table
            .get(&page_id)?
            .iter()
            .find(|e| e.tid == tid)
            .map(|e| e.mode)
    }

    /// Snapshot of the entries held on `page_id`.
    pub fn holders(&self, page_id: PageId) -> Vec<LockEntry> {
        self.table.lock().get(&page_id).cloned().unwrap_or_default()
    }

    /// Every page `tid` holds a lock on.
    pub fn pages_locked_by(&self, tid: TransactionId) -> Vec<PageId> {
        let table = self.table.lock();
        table
            .iter()
            .filter(|(_, entries)| entries.iter().any(|e| e.tid == tid))
            .map(|(&pid, _)| pid)
            .collect()
    }

    /// Number of pages with at least one lock.
    pub fn locked_page_count(&self) -> usize {
        self.table.lock().len()
    }

    fn try_grant(table: &mut LockTable, page_id: PageId, tid: TransactionId, mode: LockMode) -> bool {
        let entries = table.entry(page_id).or_default();
        if entries.is_empty() {
            entries.push(LockEntry { tid, mode });
            return true;
        }

        let sole_holder = entries.len() == 1;
        let current = if sole_holder && entries[0].mode == LockMode::Exclusive {
            LockMode::Exclusive
        } else {
            LockMode::Shared
        };

        if let Some(entry) = entries.iter_mut().find(|e| e.tid == tid) {
            if current == LockMode::Exclusive || mode == LockMode::Shared {
                return true;
            }
            // Shared -> exclusive only while no other reader is present.
            if sole_holder {
                entry.mode = LockMode::Exclusive;
                return true;
            }
            return false;
        }

        if mode == LockMode::Exclusive || current == LockMode::Exclusive {
            return false;
        }
        entries.push(LockEntry {
            tid,
            mode: LockMode::Shared,
        });
        true
    }

    fn remove_entry(table: &mut LockTable, page_id: PageId, tid: TransactionId) -> bool {
        let Some(entries) = table.get_mut(&page_id) else {
            return false;
        };
        let Some(pos) = entries.iter().position(|e| e.tid == tid) else {
            return false;
        };
        entries.swap_remove(pos);
        if entries.is_empty() {
            table.remove(&page_id);
        }
        true
    }
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new()
    }
}
