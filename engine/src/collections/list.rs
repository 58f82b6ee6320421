// SPDX-FileCopyrightText: 2025 Ashton Warner
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::{ffi::c_void, marker::PhantomData, ptr, ptr::NonNull};

use crate::allocators::Allocator;

struct ListNode<T> {
    prev: *mut ListNode<T>,
    next: *mut ListNode<T>,
    value: T,
}

/// A doubly-linked list whose nodes are allocated one at a time from an
/// [`Allocator`]. Push appends at the tail, pop removes from the tail,
/// and [`List::remove`] detaches an arbitrary node in O(1) given the
/// [`NodeRef`] its push returned. Traversal order is insertion order.
///
/// An empty list costs nothing to create, so it's cheap to embed one in
/// every scene-graph node. The list has no destructor of its own:
/// [`List::destroy`] must be called with the allocator the nodes came
/// from, or the node memory is left for that allocator's owner to
/// reclaim (which is exactly what happens when the nodes live in an
/// arena).
pub struct List<T> {
    head: *mut ListNode<T>,
    tail: *mut ListNode<T>,
}

// Safety: all nodes are exclusively owned by the list (reachable only
// through it or through NodeRefs, which can't be dereferenced without
// the list), so sending the list sends the values.
unsafe impl<T: Send> Send for List<T> {}

/// A direct reference to a pushed node, for O(1) [`List::remove`].
pub struct NodeRef<T>(NonNull<ListNode<T>>);

// Safety: a NodeRef is only a token. The node it names can't be read or
// freed through it without the list (and an unsafe contract), so the
// reference may travel between threads alongside its list.
unsafe impl<T: Send> Send for NodeRef<T> {}

impl<T> Clone for NodeRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for NodeRef<T> {}

impl<T> List<T> {
    pub const fn new() -> List<T> {
        List {
            head: ptr::null_mut(),
            tail: ptr::null_mut(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_null()
    }

    /// Walks the list to count its nodes.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Appends `value` at the tail, allocating the node from `alloc`.
    pub fn push(&mut self, alloc: &mut dyn Allocator, value: T) -> NodeRef<T> {
        let node = alloc.alloc(size_of::<ListNode<T>>(), 1) as *mut ListNode<T>;
        // Safety: the allocation above is exactly one ListNode<T>, so
        // the write is in bounds, over uninitialized memory.
        unsafe {
            node.write(ListNode {
                prev: self.tail,
                next: ptr::null_mut(),
                value,
            });
        }
        if self.head.is_null() {
            self.head = node;
        } else {
            // Safety: a non-null head implies a non-null tail, pointing
            // at the node of a previous push, still owned by this list.
            unsafe { (*self.tail).next = node };
        }
        self.tail = node;
        // Safety: fresh allocations are never null (fatal otherwise).
        NodeRef(unsafe { NonNull::new_unchecked(node) })
    }

    /// Removes the tail node, freeing it back to `alloc` and returning
    /// its value. Returns None on an empty list.
    pub fn pop(&mut self, alloc: &mut dyn Allocator) -> Option<T> {
        if self.tail.is_null() {
            return None;
        }
        // Safety: the tail is a live node owned by this list; detach
        // below makes sure nothing points at it before it's freed.
        Some(unsafe { self.take_node(alloc, self.tail) })
    }

    /// Detaches the given node and returns its value, freeing the node
    /// back to `alloc`.
    ///
    /// ## Safety
    ///
    /// - `node` must have been returned by [`List::push`] on this same
    ///   list, and not removed (or popped) since.
    pub unsafe fn remove(&mut self, alloc: &mut dyn Allocator, node: NodeRef<T>) -> T {
        // Safety: per this function's contract the node is live and
        // belongs to this list.
        unsafe { self.take_node(alloc, node.0.as_ptr()) }
    }

    /// Detach + read + free. Caller guarantees `node` is a live node of
    /// this list.
    unsafe fn take_node(&mut self, alloc: &mut dyn Allocator, node: *mut ListNode<T>) -> T {
        // Safety (all accesses below): `node`, and any prev/next
        // neighbor of it, are live nodes exclusively owned by this
        // list. After the relinking, nothing points at `node` anymore.
        unsafe {
            let prev = (*node).prev;
            let next = (*node).next;
            if prev.is_null() {
                self.head = next;
            } else {
                (*prev).next = next;
            }
            if next.is_null() {
                self.tail = prev;
            } else {
                (*next).prev = prev;
            }
            // Move the value out without dropping it in place, then
            // release the node's memory.
            let value = ptr::read(&(*node).value);
            alloc.free(node as *mut c_void);
            value
        }
    }

    /// Frees every node back to `alloc`, dropping the values, and
    /// leaves the list empty (and reusable).
    pub fn destroy(&mut self, alloc: &mut dyn Allocator) {
        let mut node = self.head;
        while !node.is_null() {
            // Safety: walking nodes owned by this list; each node is
            // read before its memory is released.
            unsafe {
                let next = (*node).next;
                ptr::drop_in_place(&mut (*node).value);
                alloc.free(node as *mut c_void);
                node = next;
            }
        }
        self.head = ptr::null_mut();
        self.tail = ptr::null_mut();
    }

    /// Iterates the values front to back (insertion order).
    pub fn iter(&self) -> ListIter<'_, T> {
        ListIter {
            next: self.head,
            _borrow: PhantomData,
        }
    }
}

pub struct ListIter<'a, T> {
    next: *const ListNode<T>,
    _borrow: PhantomData<&'a List<T>>,
}

impl<'a, T> Iterator for ListIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.next.is_null() {
            return None;
        }
        // Safety: the iterator borrows the list, so every node it can
        // reach stays alive and unmodified for the 'a lifetime.
        unsafe {
            let node = &*self.next;
            self.next = node.next;
            Some(&node.value)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::test_platform::TestHeap;

    use super::List;

    #[test]
    fn traversal_matches_insertion_order() {
        let mut heap = TestHeap::new();
        let mut list: List<u32> = List::new();
        assert!(list.is_empty());

        for value in [10, 20, 30] {
            list.push(&mut heap, value);
        }
        let collected: Vec<u32> = list.iter().copied().collect();
        assert_eq!(vec![10, 20, 30], collected);
        assert_eq!(3, list.len());

        list.destroy(&mut heap);
        assert!(list.is_empty());
        assert_eq!(0, heap.live_blocks);
    }

    #[test]
    fn pop_removes_from_the_tail() {
        let mut heap = TestHeap::new();
        let mut list: List<u32> = List::new();
        list.push(&mut heap, 1);
        list.push(&mut heap, 2);

        assert_eq!(Some(2), list.pop(&mut heap));
        assert_eq!(Some(1), list.pop(&mut heap));
        assert_eq!(None, list.pop(&mut heap));
        assert_eq!(0, heap.live_blocks);
    }

    #[test]
    fn remove_detaches_head_middle_and_tail() {
        let mut heap = TestHeap::new();
        let mut list: List<u32> = List::new();
        let a = list.push(&mut heap, 1);
        let b = list.push(&mut heap, 2);
        let c = list.push(&mut heap, 3);
        let d = list.push(&mut heap, 4);

        assert_eq!(2, unsafe { list.remove(&mut heap, b) });
        assert_eq!(vec![1, 3, 4], list.iter().copied().collect::<Vec<u32>>());
        assert_eq!(1, unsafe { list.remove(&mut heap, a) });
        assert_eq!(4, unsafe { list.remove(&mut heap, d) });
        assert_eq!(vec![3], list.iter().copied().collect::<Vec<u32>>());
        assert_eq!(3, unsafe { list.remove(&mut heap, c) });
        assert!(list.is_empty());
        assert_eq!(0, heap.live_blocks);
    }

    #[test]
    fn destroy_drops_values() {
        use std::rc::Rc;

        let mut heap = TestHeap::new();
        let mut list: List<Rc<u8>> = List::new();
        let tracked = Rc::new(0u8);
        for _ in 0..4 {
            list.push(&mut heap, tracked.clone());
        }
        assert_eq!(5, Rc::strong_count(&tracked));
        list.destroy(&mut heap);
        assert_eq!(1, Rc::strong_count(&tracked));
        assert_eq!(0, heap.live_blocks);
    }
}
