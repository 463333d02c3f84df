//! Frame identifier type.

use std::fmt;

/// Identifies a slot in the buffer pool's frame arena.
///
/// Frame ids are stable for as long as the page stays cached; the LRU list
/// links frames by id instead of by reference, so removing a frame can
/// never leave a dangling link. Freed ids are recycled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub usize);

impl FrameId {
    /// Create a new FrameId.
    #[inline]
    pub fn new(id: usize) -> Self {
        FrameId(id)
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({})", self.0)
    }
}
