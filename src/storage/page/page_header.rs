//! Page header and type definitions.
//!
//! Every heap page starts with a [`PageHeader`] containing metadata:
//! - [`PageType`] discriminator
//! - CRC32 checksum for integrity
//! - Occupied-slot count and slot width of the heap layout

/// Type of page stored on disk.
///
/// Uses `#[repr(u8)]` to guarantee a 1-byte representation for serialization.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    /// Freshly appended, never formatted (all zeros).
    #[default]
    Empty = 0,
    /// Heap page holding fixed-width tuple slots.
    Heap = 1,
}

impl PageType {
    /// Convert from u8. Unknown values read as `None`.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(PageType::Empty),
            1 => Some(PageType::Heap),
            _ => None,
        }
    }
}

/// Metadata stored at the beginning of every page.
///
/// # Layout (9 bytes)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       1     page_type (PageType as u8)
/// 1       4     checksum (CRC32, little-endian)
/// 5       2     tuple_count (occupied slots, little-endian)
/// 7       2     tuple_width (bytes per slot, little-endian)
/// ```
///
/// # Checksum
/// The checksum is computed over the entire page with the checksum field
/// itself set to zero. It is stamped when a page is written to disk and
/// checked when a formatted page is read back; the in-memory copy is not
/// kept in sync while a transaction mutates it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    /// Type of this page.
    pub page_type: PageType,
    /// CRC32 checksum of the page contents.
    pub checksum: u32,
    /// Number of occupied tuple slots.
    pub tuple_count: u16,
    /// Width of one tuple slot in bytes.
    pub tuple_width: u16,
}

impl PageHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 9;

    /// Offset of each field within the header.
    pub const OFFSET_PAGE_TYPE: usize = 0;
    pub const OFFSET_CHECKSUM: usize = 1;
    pub const OFFSET_TUPLE_COUNT: usize = 5;
    pub const OFFSET_TUPLE_WIDTH: usize = 7;

    /// Create a heap header for slots of `tuple_width` bytes.
    pub fn heap(tuple_width: u16) -> Self {
        Self {
            page_type: PageType::Heap,
            checksum: 0,
            tuple_count: 0,
            tuple_width,
        }
    }

    /// Read a header from the beginning of a byte slice.
    ///
    /// Unknown page type bytes decode as `PageType::Empty`; callers that care
    /// check [`PageHeader::raw_page_type`].
    ///
    /// # Panics
    /// Panics if `data.len() < PageHeader::SIZE`.
    pub fn from_bytes(data: &[u8]) -> Self {
        assert!(data.len() >= Self::SIZE, "buffer too small for PageHeader");

        let page_type = PageType::from_u8(data[Self::OFFSET_PAGE_TYPE]).unwrap_or_default();

        let checksum = u32::from_le_bytes([
            data[Self::OFFSET_CHECKSUM],
            data[Self::OFFSET_CHECKSUM + 1],
            data[Self::OFFSET_CHECKSUM + 2],
            data[Self::OFFSET_CHECKSUM + 3],
        ]);

        let tuple_count = u16::from_le_bytes([
            data[Self::OFFSET_TUPLE_COUNT],
            data[Self::OFFSET_TUPLE_COUNT + 1],
        ]);

        let tuple_width = u16::from_le_bytes([
            data[Self::OFFSET_TUPLE_WIDTH],
            data[Self::OFFSET_TUPLE_WIDTH + 1],
        ]);

        Self {
            page_type,
            checksum,
            tuple_count,
            tuple_width,
        }
    }

    /// The undecoded page type byte.
    pub fn raw_page_type(data: &[u8]) -> u8 {
        data[Self::OFFSET_PAGE_TYPE]
    }

    /// Write this header to the beginning of a byte slice.
    ///
    /// # Panics
    /// Panics if `data.len() < PageHeader::SIZE`.
    pub fn write_to(&self, data: &mut [u8]) {
        assert!(data.len() >= Self::SIZE, "buffer too small for PageHeader");

        data[Self::OFFSET_PAGE_TYPE] = self.page_type as u8;
        data[Self::OFFSET_CHECKSUM..Self::OFFSET_CHECKSUM + 4]
            .copy_from_slice(&self.checksum.to_le_bytes());
        data[Self::OFFSET_TUPLE_COUNT..Self::OFFSET_TUPLE_COUNT + 2]
            .copy_from_slice(&self.tuple_count.to_le_bytes());
        data[Self::OFFSET_TUPLE_WIDTH..Self::OFFSET_TUPLE_WIDTH + 2]
            .copy_from_slice(&self.tuple_width.to_le_bytes());
    }

    /// Compute CRC32 checksum of a page.
    ///
    /// The checksum field (bytes 1-4) is hashed as zeros, so the checksum
    /// doesn't include itself.
    pub fn compute_checksum(page_data: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&page_data[..Self::OFFSET_CHECKSUM]);
        hasher.update(&[0u8; 4]);
        hasher.update(&page_data[Self::OFFSET_CHECKSUM + 4..]);
        hasher.finalize()
    }

    /// Verify that the stored checksum matches the computed checksum.
    pub fn verify_checksum(&self, page_data: &[u8]) -> bool {
        self.checksum == Self::compute_checksum(page_data)
    }
}
