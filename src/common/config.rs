//! Configuration constants and buffer pool settings.

use std::time::Duration;

use rand::Rng;

/// Size of a page in bytes (4KB).
///
/// Every table file is a sequence of pages of exactly this size; page N
/// lives at byte offset `N × PAGE_SIZE`.
pub const PAGE_SIZE: usize = 4096;

/// Default number of pages the buffer pool caches.
pub const DEFAULT_PAGES: usize = 50;

/// Fixed on-disk width of a string field's payload.
pub const STRING_LEN: usize = 128;

/// Default bounds of the randomized lock-wait deadline.
pub const DEFAULT_LOCK_TIMEOUT_MIN: Duration = Duration::from_millis(1000);
pub const DEFAULT_LOCK_TIMEOUT_MAX: Duration = Duration::from_millis(3000);

/// Settings for a [`BufferPool`](crate::buffer::BufferPool).
///
/// # Lock timeout
/// Every `get_page` call draws one deadline uniformly from
/// `[lock_timeout_min, lock_timeout_max]`. A wait that outlives it aborts
/// the transaction. This is a deadlock heuristic: it also aborts slow
/// transactions that were never deadlocked.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use keeldb::BufferPoolConfig;
///
/// let config = BufferPoolConfig::default()
///     .with_capacity(8)
///     .with_lock_timeout(Duration::from_millis(50), Duration::from_millis(100));
/// assert_eq!(config.capacity, 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferPoolConfig {
    /// Maximum number of cached pages.
    pub capacity: usize,
    /// Lower bound of the lock-wait deadline.
    pub lock_timeout_min: Duration,
    /// Upper bound of the lock-wait deadline.
    pub lock_timeout_max: Duration,
}

impl BufferPoolConfig {
    /// Set the page capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the lock-wait deadline window. Bounds are swapped if reversed.
    pub fn with_lock_timeout(mut self, min: Duration, max: Duration) -> Self {
        self.lock_timeout_min = min.min(max);
        self.lock_timeout_max = max.max(min);
        self
    }

    /// Draw one deadline from the configured window.
    pub fn lock_timeout(&self) -> Duration {
        let millis = |d: Duration| u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
        let (min, max) = (millis(self.lock_timeout_min), millis(self.lock_timeout_max));
        if min >= max {
            return self.lock_timeout_min;
        }
        Duration::from_millis(rand::rng().random_range(min..=max))
    }
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_PAGES,
            lock_timeout_min: DEFAULT_LOCK_TIMEOUT_MIN,
            lock_timeout_max: DEFAULT_LOCK_TIMEOUT_MAX,
        }
    }
}
