//! The page store seam between the buffer pool and table files.

use crate::buffer::{BufferPool, PageHandle};
use crate::common::{PageId, Result, TableId};
use crate::concurrency::TransactionId;
use crate::storage::page::Page;
use crate::storage::tuple::{RecordId, Tuple, TupleDesc};

/// Durable storage for one table's pages.
///
/// The buffer pool reads and writes whole pages through this trait and
/// delegates tuple placement to it. Tuple mutations go back through the
/// pool's `get_page`, so every page they touch is locked and cached; they
/// return the handles of the pages they modified, which the pool then marks
/// dirty.
pub trait PageStore: Send + Sync {
    /// Identifier the catalog and page ids use for this table.
    fn table_id(&self) -> TableId;

    /// Schema of the stored tuples.
    fn tuple_desc(&self) -> &TupleDesc;

    /// Read the current on-disk image of a page.
    ///
    /// # Errors
    /// - `Error::PageOutOfRange` past the end of the table
    /// - `Error::CorruptedPage` if the stored image fails verification
    fn read_page(&self, page_id: PageId) -> Result<Page>;

    /// Durably write a page image.
    fn write_page(&self, page_id: PageId, page: &Page) -> Result<()>;

    /// Number of pages currently stored.
    fn num_pages(&self) -> Result<u32>;

    /// Place `tuple` in some page, locking pages through `pool`.
    fn insert_tuple(
        &self,
        pool: &BufferPool,
        tid: TransactionId,
        tuple: &Tuple,
    ) -> Result<(RecordId, Vec<PageHandle>)>;

    /// Remove the tuple named by `tuple`'s record id.
    fn delete_tuple(&self, pool: &BufferPool, tid: TransactionId, tuple: &Tuple) -> Result<Vec<PageHandle>>;
}
