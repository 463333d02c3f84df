//! Heap page slot layout.
//!
//! ```text
//! ┌────────────┬──────────────────┬────────┬────────┬─────┬────────┐
//! │ PageHeader │ occupancy bitmap │ slot 0 │ slot 1 │ ... │ slot N │
//! │  9 bytes   │ ceil(N / 8) bytes│        │        │     │        │
//! └────────────┴──────────────────┴────────┴────────┴─────┴────────┘
//! ```
//!
//! Every slot is `tuple_size` bytes wide. A zeroed page (freshly appended)
//! is a valid empty heap page: its bitmap has no bits set.

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::tuple::{RecordId, Tuple, TupleDesc};

use super::{Page, PageHeader, PageType};

/// Slot geometry of heap pages for one schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapPageLayout {
    tuple_size: usize,
    num_slots: usize,
}

impl HeapPageLayout {
    /// Geometry for tuples of `desc`.
    ///
    /// Each slot costs `tuple_size` bytes plus one bitmap bit.
    pub fn new(desc: &TupleDesc) -> Self {
        let tuple_size = desc.tuple_size();
        let usable_bits = (PAGE_SIZE - PageHeader::SIZE) * 8;
        Self {
            tuple_size,
            num_slots: usable_bits / (tuple_size * 8 + 1),
        }
    }

    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    pub fn tuple_size(&self) -> usize {
        self.tuple_size
    }

    fn bitmap_len(&self) -> usize {
        self.num_slots.div_ceil(8)
    }

    fn slot_offset(&self, slot: usize) -> usize {
        PageHeader::SIZE + self.bitmap_len() + slot * self.tuple_size
    }

    /// Whether `slot` holds a tuple.
    pub fn is_used(&self, page: &Page, slot: usize) -> bool {
        slot < self.num_slots
            && page.as_slice()[PageHeader::SIZE + slot / 8] & (1 << (slot % 8)) != 0
    }

    fn set_used(&self, page: &mut Page, slot: usize, used: bool) {
        let byte = &mut page.as_mut_slice()[PageHeader::SIZE + slot / 8];
        if used {
            *byte |= 1 << (slot % 8);
        } else {
            *byte &= !(1 << (slot % 8));
        }
    }

    /// Number of empty slots on the page.
    pub fn free_slots(&self, page: &Page) -> usize {
        (0..self.num_slots).filter(|&s| !self.is_used(page, s)).count()
    }

    /// Store `tuple` in the first empty slot. Formats an empty page first.
    ///
    /// The caller has already checked the tuple against the schema.
    pub fn insert(&self, page: &mut Page, page_id: PageId, tuple: &Tuple) -> Result<RecordId> {
        let slot = (0..self.num_slots)
            .find(|&s| !self.is_used(page, s))
            .ok_or(Error::PageFull(page_id))?;

        let mut header = page.header();
        if header.page_type == PageType::Empty {
            header = PageHeader::heap(self.tuple_size as u16);
        }
        header.tuple_count += 1;
        page.set_header(&header);

        let offset = self.slot_offset(slot);
        tuple.write_to(&mut page.as_mut_slice()[offset..offset + self.tuple_size]);
        self.set_used(page, slot, true);

        Ok(RecordId::new(page_id, slot as u16))
    }

    /// Clear the slot named by `record_id`.
    pub fn delete(&self, page: &mut Page, record_id: RecordId) -> Result<()> {
        let slot = record_id.slot as usize;
        if !self.is_used(page, slot) {
            return Err(Error::TupleNotFound {
                page_id: record_id.page_id,
                slot: record_id.slot,
            });
        }

        self.set_used(page, slot, false);
        let mut header = page.header();
        header.tuple_count = header.tuple_count.saturating_sub(1);
        page.set_header(&header);
        Ok(())
    }

    /// All tuples on the page, in slot order, with their record ids set.
    pub fn tuples(&self, page: &Page, desc: &TupleDesc, page_id: PageId) -> Vec<Tuple> {
        (0..self.num_slots)
            .filter(|&s| self.is_used(page, s))
            .map(|s| {
                let offset = self.slot_offset(s);
                Tuple::read_from(
                    desc,
                    &page.as_slice()[offset..offset + self.tuple_size],
                    RecordId::new(page_id, s as u16),
                )
            })
            .collect()
    }
}
