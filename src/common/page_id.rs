//! Table and page identifier types.

use std::fmt;

/// Identifies a table (and the page file backing it).
///
/// Heap files derive this from a CRC32 of their absolute path, so the same
/// file always maps to the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub u32);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Table({})", self.0)
    }
}

/// Identifies a page: the owning table plus the page number in its file.
///
/// Used as the key of both the page cache and the lock table.
///
/// # Example
/// ```
/// use keeldb::{PageId, TableId};
///
/// let pid = PageId::new(TableId(3), 42);
/// assert_eq!(pid.table_id, TableId(3));
/// assert_eq!(pid.page_no, 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId {
    pub table_id: TableId,
    pub page_no: u32,
}

impl PageId {
    /// Create a new PageId.
    #[inline]
    pub fn new(table_id: TableId, page_no: u32) -> Self {
        PageId { table_id, page_no }
    }

    /// Byte offset of this page within its table file.
    #[inline]
    pub fn file_offset(&self, page_size: usize) -> u64 {
        self.page_no as u64 * page_size as u64
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page({}:{})", self.table_id.0, self.page_no)
    }
}
