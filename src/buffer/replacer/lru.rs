//! LRU (Least Recently Used) ordering over the frame arena.
//!
//! A doubly linked list from most-recently-used (head) to least-recently-used
//! (tail), bounded by two sentinel nodes that are never evicted. Links are
//! indices into a `Vec`, not references: node `i + 2` belongs to
//! `FrameId(i)`, nodes 0 and 1 are the head and tail sentinels.

use crate::common::FrameId;

const HEAD: usize = 0;
const TAIL: usize = 1;
const SENTINELS: usize = 2;

#[derive(Debug, Clone, Copy)]
struct Link {
    prev: usize,
    next: usize,
    linked: bool,
}

impl Link {
    const UNLINKED: Link = Link {
        prev: HEAD,
        next: TAIL,
        linked: false,
    };
}

/// Recency order of cached frames.
///
/// Dirty-page skipping is the pool's job; the replacer only answers
/// "who is least recently used".
#[derive(Debug)]
pub struct LruReplacer {
    links: Vec<Link>,
    len: usize,
}

impl LruReplacer {
    /// Create an empty list (just the two sentinels).
    pub fn new() -> Self {
        let head = Link {
            prev: HEAD,
            next: TAIL,
            linked: true,
        };
        let tail = Link {
            prev: HEAD,
            next: TAIL,
            linked: true,
        };
        Self {
            links: vec![head, tail],
            len: 0,
        }
    }

    #[inline]
    fn node(frame_id: FrameId) -> usize {
        frame_id.0 + SENTINELS
    }

    /// Insert `frame_id` at the head, or move it there if already present.
    pub fn push_front(&mut self, frame_id: FrameId) {
        let node = Self::node(frame_id);
        if node >= self.links.len() {
            self.links.resize(node + 1, Link::UNLINKED);
        }
        if self.links[node].linked {
            self.unlink(node);
        }

        let first = self.links[HEAD].next;
        self.links[node] = Link {
            prev: HEAD,
            next: first,
            linked: true,
        };
        self.links[first].prev = node;
        self.links[HEAD].next = node;
        self.len += 1;
    }

    /// Mark `frame_id` most recently used.
    #[inline]
    pub fn touch(&mut self, frame_id: FrameId) {
        self.push_front(frame_id);
    }

    /// Take `frame_id` out of the ordering. No-op if absent.
    pub fn remove(&mut self, frame_id: FrameId) {
        let node = Self::node(frame_id);
        if self.links.get(node).is_some_and(|l| l.linked) {
            self.unlink(node);
        }
    }

    fn unlink(&mut self, node: usize) {
        let Link { prev, next, .. } = self.links[node];
        self.links[prev].next = next;
        self.links[next].prev = prev;
        self.links[node] = Link::UNLINKED;
        self.len -= 1;
    }

    /// Whether `frame_id` is in the ordering.
    pub fn contains(&self, frame_id: FrameId) -> bool {
        self.links
            .get(Self::node(frame_id))
            .is_some_and(|l| l.linked)
    }

    /// Frames from least to most recently used (tail → head).
    pub fn iter_lru(&self) -> impl Iterator<Item = FrameId> + '_ {
        let mut node = self.links[TAIL].prev;
        std::iter::from_fn(move || {
            if node == HEAD {
                return None;
            }
            let frame_id = FrameId::new(node - SENTINELS);
            node = self.links[node].prev;
            Some(frame_id)
        })
    }

    /// Frames from most to least recently used (head → tail).
    pub fn iter_mru(&self) -> impl Iterator<Item = FrameId> + '_ {
        let mut node = self.links[HEAD].next;
        std::iter::from_fn(move || {
            if node == TAIL {
                return None;
            }
            let frame_id = FrameId::new(node - SENTINELS);
            node = self.links[node].next;
            Some(frame_id)
        })
    }

    /// Number of frames in the ordering.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for LruReplacer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(id: usize) -> FrameId {
        FrameId::new(id)
    }

    fn lru_order(r: &LruReplacer) -> Vec<usize> {
        r.iter_lru().map(|f| f.0).collect()
    }

    #[test]
    fn test_lru_basic() {
        let mut replacer = LruReplacer::new();
        assert!(replacer.is_empty());

        replacer.push_front(f(0));
        replacer.push_front(f(1));
        replacer.push_front(f(2));

        assert_eq!(replacer.len(), 3);
        assert_eq!(lru_order(&replacer), vec![0, 1, 2]);
        assert_eq!(replacer.iter_mru().map(|f| f.0).collect::<Vec<_>>(), vec![2, 1, 0]);
    }

    #[test]
    fn test_touch_moves_to_head() {
        let mut replacer = LruReplacer::new();
        replacer.push_front(f(0));
        replacer.push_front(f(1));
        replacer.push_front(f(2));

        replacer.touch(f(0));

        assert_eq!(lru_order(&replacer), vec![1, 2, 0]);
        assert_eq!(replacer.len(), 3);
    }

    #[test]
    fn test_remove() {
        let mut replacer = LruReplacer::new();
        replacer.push_front(f(0));
        replacer.push_front(f(1));
        replacer.push_front(f(2));

        replacer.remove(f(1));
        assert!(!replacer.contains(f(1)));
        assert_eq!(lru_order(&replacer), vec![0, 2]);

        // Removing twice or removing an unknown frame is harmless
        replacer.remove(f(1));
        replacer.remove(f(99));
        assert_eq!(replacer.len(), 2);
    }

    #[test]
    fn test_reuse_after_remove() {
        let mut replacer = LruReplacer::new();
        replacer.push_front(f(0));
        replacer.push_front(f(1));
        replacer.remove(f(0));
        replacer.push_front(f(0));

        assert_eq!(lru_order(&replacer), vec![1, 0]);
    }

    #[test]
    fn test_sparse_frame_ids() {
        let mut replacer = LruReplacer::new();
        replacer.push_front(f(5));
        replacer.push_front(f(2));

        assert!(!replacer.contains(f(3)));
        assert_eq!(lru_order(&replacer), vec![5, 2]);
    }

    #[test]
    fn test_drain_to_empty() {
        let mut replacer = LruReplacer::new();
        for i in 0..4 {
            replacer.push_front(f(i));
        }
        for i in 0..4 {
            replacer.remove(f(i));
        }
        assert!(replacer.is_empty());
        assert_eq!(replacer.iter_lru().count(), 0);
        assert_eq!(replacer.iter_mru().count(), 0);
    }
}
