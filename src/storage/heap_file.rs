//! Heap File - a table stored as a sequence of heap pages.
//!
//! The [`HeapFile`] handles all direct file operations for one table:
//! - Reading and writing whole pages
//! - Appending empty pages
//! - Placing and removing tuples (through the buffer pool)

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::buffer::{BufferPool, PageHandle};
use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result, TableId};
use crate::concurrency::{Permissions, TransactionId};
use crate::storage::page::{HeapPageLayout, Page, PageHeader, PageType};
use crate::storage::tuple::{RecordId, Tuple, TupleDesc};
use crate::storage::PageStore;

/// File-backed page store for one table.
///
/// # File Layout
/// The table is stored as a single file with pages laid out sequentially:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (4KB)   │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096     8192    ...    N×4096
/// ```
///
/// The page count is always derived from the file length, so it can never
/// disagree with what is on disk.
///
/// # Thread Safety
/// The file handle sits behind a `Mutex`; each read or write is one
/// seek + transfer under that lock.
///
/// # Durability
/// All writes are followed by `fdatasync()`.
pub struct HeapFile {
    path: PathBuf,
    file: Mutex<File>,
    table_id: TableId,
    desc: TupleDesc,
    layout: HeapPageLayout,
}

impl HeapFile {
    /// Create a new, empty table file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P, desc: TupleDesc) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)?;

        Self::from_file(path.as_ref(), file, desc)
    }

    /// Open an existing table file.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P, desc: TupleDesc) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        Self::from_file(path.as_ref(), file, desc)
    }

    /// Open an existing table file, or create if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P, desc: TupleDesc) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path, desc)
        } else {
            Self::create(path, desc)
        }
    }

    fn from_file(path: &Path, file: File, desc: TupleDesc) -> Result<Self> {
        let path = path.canonicalize()?;
        let table_id = TableId(crc32fast::hash(path.to_string_lossy().as_bytes()));
        let layout = HeapPageLayout::new(&desc);

        debug!(%table_id, path = %path.display(), %desc, "opened heap file");
        Ok(Self {
            path,
            file: Mutex::new(file),
            table_id,
            desc,
            layout,
        })
    }

    /// Absolute path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Slot geometry of this table's pages.
    pub fn layout(&self) -> HeapPageLayout {
        self.layout
    }

    /// Extend the file with one zeroed page and return its id.
    ///
    /// A zeroed page is a valid empty heap page.
    pub fn append_empty_page(&self) -> Result<PageId> {
        let mut file = self.file.lock();
        let page_no = Self::page_count(&file)?;
        let page_id = PageId::new(self.table_id, page_no);

        file.seek(SeekFrom::Start(page_id.file_offset(PAGE_SIZE)))?;
        file.write_all(&[0u8; PAGE_SIZE])?;
        file.sync_data()?;

        debug!(%page_id, "appended empty page");
        Ok(page_id)
    }

    /// Every tuple in the table, read under shared locks through `pool`.
    ///
    /// The locks stay held until `tid` completes.
    pub fn scan(&self, pool: &BufferPool, tid: TransactionId) -> Result<Vec<Tuple>> {
        let mut tuples = Vec::new();
        for page_no in 0..self.num_pages()? {
            let page_id = PageId::new(self.table_id, page_no);
            let handle = pool.get_page(tid, page_id, Permissions::ReadOnly)?;
            tuples.extend(self.layout.tuples(&handle.read(), &self.desc, page_id));
        }
        Ok(tuples)
    }

    fn page_count(file: &File) -> Result<u32> {
        Ok((file.metadata()?.len() / PAGE_SIZE as u64) as u32)
    }

    fn check_schema(&self, tuple: &Tuple) -> Result<()> {
        if tuple.matches(&self.desc) {
            Ok(())
        } else {
            Err(Error::SchemaMismatch {
                expected: self.desc.to_string(),
                found: tuple.shape(),
            })
        }
    }

    /// Try to place `tuple` on one page. `Ok(None)` if the page is full.
    fn try_insert(&self, handle: &PageHandle, tuple: &Tuple) -> Result<Option<RecordId>> {
        let mut page = handle.write();
        if self.layout.free_slots(&page) == 0 {
            return Ok(None);
        }
        self.layout.insert(&mut page, handle.page_id(), tuple).map(Some)
    }
}

impl PageStore for HeapFile {
    fn table_id(&self) -> TableId {
        self.table_id
    }

    fn tuple_desc(&self) -> &TupleDesc {
        &self.desc
    }

    fn read_page(&self, page_id: PageId) -> Result<Page> {
        let mut file = self.file.lock();
        let num_pages = Self::page_count(&file)?;
        if page_id.page_no >= num_pages {
            return Err(Error::PageOutOfRange { page_id, num_pages });
        }

        file.seek(SeekFrom::Start(page_id.file_offset(PAGE_SIZE)))?;
        let mut page = Page::new();
        file.read_exact(page.as_mut_slice())?;
        drop(file);

        let intact = match PageType::from_u8(PageHeader::raw_page_type(page.as_slice())) {
            Some(PageType::Empty) => true,
            Some(PageType::Heap) => page.verify_checksum(),
            None => false,
        };
        if !intact {
            warn!(%page_id, "page failed verification");
            return Err(Error::CorruptedPage(page_id));
        }

        trace!(%page_id, "read page");
        Ok(page)
    }

    /// Write a page image, stamping its checksum.
    ///
    /// The target must be an existing page or the page exactly at the end
    /// of the file.
    fn write_page(&self, page_id: PageId, page: &Page) -> Result<()> {
        let mut image = Page::new();
        image.copy_from(page);
        if image.header().page_type == PageType::Heap {
            image.update_checksum();
        }

        let mut file = self.file.lock();
        let num_pages = Self::page_count(&file)?;
        if page_id.page_no > num_pages {
            return Err(Error::PageOutOfRange { page_id, num_pages });
        }

        file.seek(SeekFrom::Start(page_id.file_offset(PAGE_SIZE)))?;
        file.write_all(image.as_slice())?;
        file.sync_data()?;

        trace!(%page_id, "wrote page");
        Ok(())
    }

    fn num_pages(&self) -> Result<u32> {
        Self::page_count(&self.file.lock())
    }

    fn insert_tuple(
        &self,
        pool: &BufferPool,
        tid: TransactionId,
        tuple: &Tuple,
    ) -> Result<(RecordId, Vec<PageHandle>)> {
        self.check_schema(tuple)?;

        for page_no in 0..self.num_pages()? {
            let page_id = PageId::new(self.table_id, page_no);
            let already_held = pool.holds_lock(tid, page_id);

            let handle = pool.get_page(tid, page_id, Permissions::ReadWrite)?;
            if let Some(record_id) = self.try_insert(&handle, tuple)? {
                return Ok((record_id, vec![handle]));
            }

            // Only inspected; nothing on it changed.
            if !already_held {
                pool.release_page(tid, page_id);
            }
        }

        let page_id = self.append_empty_page()?;
        let handle = pool.get_page(tid, page_id, Permissions::ReadWrite)?;
        let record_id = self
            .try_insert(&handle, tuple)?
            .ok_or(Error::PageFull(page_id))?;
        Ok((record_id, vec![handle]))
    }

    fn delete_tuple(&self, pool: &BufferPool, tid: TransactionId, tuple: &Tuple) -> Result<Vec<PageHandle>> {
        self.check_schema(tuple)?;
        let record_id = tuple.record_id().ok_or(Error::MissingRecordId)?;

        let handle = pool.get_page(tid, record_id.page_id, Permissions::ReadWrite)?;
        self.layout.delete(&mut handle.write(), record_id)?;
        Ok(vec![handle])
    }
}
