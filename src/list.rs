use std::collections::TryReserveError;
use std::iter::FusedIterator;

const HEAD: usize = 0;
const TAIL: usize = 1;
const SENTINELS: usize = 2;
const DETACHED: usize = usize::MAX;

#[derive(Debug)]
struct RecencyNode<T> {
    prev: usize,
    next: usize,
    data: Option<T>,
}

impl<T> RecencyNode<T> {
    fn detached() -> Self {
        Self {
            prev: DETACHED,
            next: DETACHED,
            data: None,
        }
    }

    fn is_linked(&self) -> bool {
        self.prev != DETACHED && self.next != DETACHED
    }
}

/// Doubly linked list ordered from most recently used (front) to least recently used (back).
///
/// Nodes live in an arena allocated once at construction and refer to each other by slot index.
/// Slots `HEAD` and `TAIL` are sentinels that are never handed out, so every real node always has
/// a predecessor and a successor.
#[derive(Debug)]
pub(crate) struct RecencyList<T> {
    nodes: Box<[RecencyNode<T>]>,
    free: Vec<usize>,
}

impl<T> RecencyList<T> {
    /// Allocates the whole arena up front, failing instead of panicking when it cannot.
    ///
    /// `capacity + 2` must not overflow; the cache checks this before calling.
    pub(crate) fn new(capacity: usize) -> Result<Self, TryReserveError> {
        let slots = capacity + SENTINELS;
        let mut nodes = Vec::new();
        nodes.try_reserve_exact(slots)?;
        nodes.resize_with(slots, RecencyNode::detached);
        nodes[HEAD].next = TAIL;
        nodes[TAIL].prev = HEAD;
        let mut free = Vec::new();
        free.try_reserve_exact(capacity)?;
        free.extend((SENTINELS..slots).rev());
        Ok(Self {
            nodes: nodes.into_boxed_slice(),
            free,
        })
    }

    pub(crate) fn capacity(&self) -> usize {
        self.nodes.len() - SENTINELS
    }

    pub(crate) fn len(&self) -> usize {
        self.capacity() - self.free.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    pub(crate) fn get(&self, slot: usize) -> Option<&T> {
        self.nodes.get(slot).and_then(|node| node.data.as_ref())
    }

    pub(crate) fn get_mut(&mut self, slot: usize) -> Option<&mut T> {
        self.nodes.get_mut(slot).and_then(|node| node.data.as_mut())
    }

    pub(crate) fn front(&self) -> Option<&T> {
        self.get(self.nodes[HEAD].next)
    }

    pub(crate) fn back(&self) -> Option<&T> {
        self.get(self.nodes[TAIL].prev)
    }

    /// Stores `data` in a free slot linked at the front. Returns `None` when every slot is taken.
    pub(crate) fn push_front(&mut self, data: T) -> Option<usize> {
        let slot = self.free.pop()?;
        self.nodes[slot].data = Some(data);
        self.insert_front(slot);
        Some(slot)
    }

    fn insert_front(&mut self, slot: usize) {
        debug_assert!(slot >= SENTINELS, "sentinel {} cannot be relinked", slot);
        debug_assert!(!self.nodes[slot].is_linked(), "slot {} is already linked", slot);
        let first = self.nodes[HEAD].next;
        self.nodes[slot].prev = HEAD;
        self.nodes[slot].next = first;
        self.nodes[first].prev = slot;
        self.nodes[HEAD].next = slot;
    }

    fn unlink(&mut self, slot: usize) {
        debug_assert!(slot >= SENTINELS, "sentinel {} cannot be unlinked", slot);
        debug_assert!(self.nodes[slot].is_linked(), "slot {} is not linked", slot);
        let prev = self.nodes[slot].prev;
        let next = self.nodes[slot].next;
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
        self.nodes[slot].prev = DETACHED;
        self.nodes[slot].next = DETACHED;
    }

    pub(crate) fn move_to_front(&mut self, slot: usize) {
        if self.nodes[HEAD].next != slot {
            self.unlink(slot);
            self.insert_front(slot);
        }
    }

    /// Detaches the least recently used node, releases its slot and returns its data.
    pub(crate) fn pop_back(&mut self) -> Option<T> {
        let slot = self.nodes[TAIL].prev;
        if slot == HEAD {
            return None;
        }
        self.unlink(slot);
        self.free.push(slot);
        self.nodes[slot].data.take()
    }

    pub(crate) fn iter(&self) -> RecencyIter<'_, T> {
        RecencyIter {
            list: self,
            front: self.nodes[HEAD].next,
            back: self.nodes[TAIL].prev,
            len: self.len(),
        }
    }

    /// Walks the list in both directions and panics on any broken link.
    #[cfg(test)]
    pub(crate) fn validate_links(&self) {
        let mut seen = 0;
        let mut prev = HEAD;
        let mut current = self.nodes[HEAD].next;
        while current != TAIL {
            assert!(
                (SENTINELS..self.nodes.len()).contains(&current),
                "link to slot {} is out of range",
                current
            );
            let node = &self.nodes[current];
            assert_eq!(node.prev, prev, "slot {} has a broken back link", current);
            assert!(node.data.is_some(), "linked slot {} is empty", current);
            seen += 1;
            assert!(seen <= self.capacity(), "recency list contains a cycle");
            prev = current;
            current = node.next;
        }
        assert_eq!(self.nodes[TAIL].prev, prev, "tail sentinel has a broken back link");
        assert_eq!(seen, self.len(), "linked nodes do not match allocated slots");
        for &slot in &self.free {
            assert!(!self.nodes[slot].is_linked(), "free slot {} is linked", slot);
            assert!(self.nodes[slot].data.is_none(), "free slot {} holds data", slot);
        }
    }
}

pub(crate) struct RecencyIter<'a, T> {
    list: &'a RecencyList<T>,
    front: usize,
    back: usize,
    len: usize,
}

impl<'a, T> Clone for RecencyIter<'a, T> {
    fn clone(&self) -> Self {
        Self {
            list: self.list,
            front: self.front,
            back: self.back,
            len: self.len,
        }
    }
}

impl<'a, T> Iterator for RecencyIter<'a, T> {
    type Item = (usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        let slot = self.front;
        let node = &self.list.nodes[slot];
        self.front = node.next;
        self.len -= 1;
        node.data.as_ref().map(|data| (slot, data))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, T> DoubleEndedIterator for RecencyIter<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        let slot = self.back;
        let node = &self.list.nodes[slot];
        self.back = node.prev;
        self.len -= 1;
        node.data.as_ref().map(|data| (slot, data))
    }
}

impl<'a, T> ExactSizeIterator for RecencyIter<'a, T> {}

impl<'a, T> FusedIterator for RecencyIter<'a, T> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents<T: Copy>(list: &RecencyList<T>) -> Vec<T> {
        list.iter().map(|(_, data)| *data).collect()
    }

    #[test]
    fn test_recency_list() {
        let mut list = RecencyList::new(4).unwrap();

        assert!(list.is_empty());
        assert!(!list.is_full());
        assert_eq!(list.len(), 0);
        assert_eq!(list.capacity(), 4);
        assert_eq!(list.front(), None);
        assert_eq!(list.back(), None);
        assert_eq!(list.iter().count(), 0);
        assert_eq!(list.iter().rev().count(), 0);

        assert_eq!(list.push_front(7), Some(2));
        assert_eq!(list.front(), Some(&7));
        assert_eq!(list.back(), Some(&7));
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![(2, &7)]);
        list.validate_links();

        assert_eq!(list.push_front(5), Some(3));
        assert_eq!(list.push_front(3), Some(4));

        assert_eq!(list.len(), 3);
        assert_eq!(list.front(), Some(&3));
        assert_eq!(list.back(), Some(&7));
        assert_eq!(
            list.iter().collect::<Vec<_>>(),
            vec![(4, &3), (3, &5), (2, &7)]
        );
        assert_eq!(
            list.iter().rev().collect::<Vec<_>>(),
            vec![(2, &7), (3, &5), (4, &3)]
        );
        list.validate_links();
    }

    #[test]
    fn test_move_to_front() {
        let mut list = RecencyList::new(3).unwrap();
        let a = list.push_front('a').unwrap();
        let b = list.push_front('b').unwrap();
        let c = list.push_front('c').unwrap();
        assert_eq!(contents(&list), vec!['c', 'b', 'a']);

        // Already first: nothing moves.
        list.move_to_front(c);
        assert_eq!(contents(&list), vec!['c', 'b', 'a']);

        list.move_to_front(a);
        assert_eq!(contents(&list), vec!['a', 'c', 'b']);
        list.validate_links();

        list.move_to_front(b);
        assert_eq!(contents(&list), vec!['b', 'a', 'c']);
        assert_eq!(list.back(), Some(&'c'));
        list.validate_links();
    }

    #[test]
    fn test_pop_back_releases_slot() {
        let mut list = RecencyList::new(2).unwrap();
        let first = list.push_front(1).unwrap();
        list.push_front(2).unwrap();

        assert!(list.is_full());
        assert_eq!(list.push_front(3), None);

        assert_eq!(list.pop_back(), Some(1));
        assert_eq!(list.len(), 1);
        assert!(list.get(first).is_none());
        list.validate_links();

        assert_eq!(list.push_front(3), Some(first));
        assert_eq!(contents(&list), vec![3, 2]);

        assert_eq!(list.pop_back(), Some(2));
        assert_eq!(list.pop_back(), Some(3));
        assert_eq!(list.pop_back(), None);
        assert!(list.is_empty());
        list.validate_links();
    }

    #[test]
    fn test_get_mut_keeps_position() {
        let mut list = RecencyList::new(2).unwrap();
        let slot = list.push_front(10).unwrap();
        list.push_front(20).unwrap();

        *list.get_mut(slot).unwrap() = 11;

        assert_eq!(contents(&list), vec![20, 11]);
        assert!(list.get(0).is_none());
        assert!(list.get(1).is_none());
        assert!(list.get(99).is_none());
    }

    #[test]
    fn test_iter_forwards_and_backwards() {
        let mut list = RecencyList::new(3).unwrap();
        list.push_front('a');
        list.push_front('b');
        list.push_front('c');

        let mut iter = list.iter();
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.next().map(|(_, v)| *v), Some('c'));
        assert_eq!(iter.next_back().map(|(_, v)| *v), Some('a'));
        assert_eq!(iter.len(), 1);
        assert_eq!(iter.next().map(|(_, v)| *v), Some('b'));
        assert_eq!(iter.next_back(), None);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_oversized_arena_fails_to_allocate() {
        assert!(RecencyList::<u64>::new(usize::MAX / 4).is_err());
        assert!(RecencyList::<u64>::new(usize::MAX - 2).is_err());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "is not linked")]
    fn test_unlink_detached_slot_is_a_logic_fault() {
        let mut list = RecencyList::new(2).unwrap();
        let slot = list.push_front(1).unwrap();
        list.unlink(slot);
        list.unlink(slot);
    }
}
