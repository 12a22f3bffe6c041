//! Intrusive doubly-linked list used to hold the timers queued in one bucket.
//!
//! Based on `kern::queue`'s `QueueChain`/`QueueHead` (Mach4 `kern/queue.h`),
//! specialized to a single payload type (`crate::timer::Timer`) instead of a
//! generic, offset-cast queue: exactly one struct is ever linked into this
//! list, so the recovery cast can be a fixed, checked `repr(C)` projection
//! instead of a caller-supplied byte offset. The sentinel-headed circular
//! shape and the head-agnostic `unlink` are ported from
//! `examples/original_source/rtimers.h` (`struct list_t`, `list_init`/
//! `list_append`/`list_unlink`).

use core::ptr::NonNull;

/// The embedded link. Must be the first field of any struct linked into a
/// [`BucketHead`] — see the `#[repr(C)]` layout of [`crate::timer::Timer`].
#[derive(Debug)]
pub(crate) struct TimerLink {
    next: Option<NonNull<TimerLink>>,
    prev: Option<NonNull<TimerLink>>,
}

impl TimerLink {
    pub const fn new() -> Self {
        Self {
            next: None,
            prev: None,
        }
    }

    pub fn is_linked(&self) -> bool {
        self.next.is_some()
    }

    /// Detaches `self` from whatever list it is linked into. No head
    /// reference is needed: in a sentinel-headed list `prev`/`next` are
    /// always valid pointers, whether they refer to a sibling node or to the
    /// bucket's own sentinel.
    ///
    /// # Safety
    /// `self` must currently be linked.
    pub(crate) unsafe fn unlink(&mut self) {
        debug_assert!(self.is_linked(), "unlink of an unlinked node");
        // SAFETY: both pointers were installed by `append`/`init` and refer
        // to live `TimerLink`s (a sibling node or the bucket sentinel).
        unsafe {
            let mut prev = self.prev.unwrap();
            let mut next = self.next.unwrap();
            prev.as_mut().next = Some(next);
            next.as_mut().prev = Some(prev);
        }
        self.next = None;
        self.prev = None;
    }
}

impl Default for TimerLink {
    fn default() -> Self {
        Self::new()
    }
}

/// Sentinel-headed circular list: one bucket of a `TimerContext`.
///
/// An empty bucket has its sentinel pointing to itself, exactly as
/// `QueueHead`/`struct list_t` do.
#[derive(Debug)]
pub(crate) struct BucketHead {
    sentinel: TimerLink,
}

impl BucketHead {
    /// Produces an inert, not-yet-circular head. Call [`Self::init`] once the
    /// head is at its final address, before appending anything to it.
    pub const fn new() -> Self {
        Self {
            sentinel: TimerLink::new(),
        }
    }

    fn sentinel_ptr(&mut self) -> NonNull<TimerLink> {
        NonNull::from(&mut self.sentinel)
    }

    /// Makes the sentinel self-referential: the empty-bucket state.
    ///
    /// The bucket (and the `TimerContext` array it lives in) must not move
    /// after this call: the sentinel's `next`/`prev` point at its own
    /// pre-move address, so relocating the bucket leaves them dangling.
    pub fn init(&mut self) {
        let ptr = self.sentinel_ptr();
        self.sentinel.next = Some(ptr);
        self.sentinel.prev = Some(ptr);
    }

    pub fn is_empty(&self) -> bool {
        match self.sentinel.next {
            Some(next) => core::ptr::eq(next.as_ptr(), &self.sentinel),
            None => true, // uninitialized bucket counts as empty
        }
    }

    pub fn first(&self) -> Option<NonNull<TimerLink>> {
        let next = self.sentinel.next?;
        if core::ptr::eq(next.as_ptr(), &self.sentinel) {
            None
        } else {
            Some(next)
        }
    }

    pub fn last(&self) -> Option<NonNull<TimerLink>> {
        let prev = self.sentinel.prev?;
        if core::ptr::eq(prev.as_ptr(), &self.sentinel) {
            None
        } else {
            Some(prev)
        }
    }

    /// Appends `node` at the tail, i.e. just before the sentinel.
    ///
    /// # Safety
    /// The bucket must already be [`init`](Self::init)ed; `node` must not
    /// already be linked into any list, and must stay valid for as long as
    /// it remains in this one.
    pub unsafe fn append(&mut self, mut node: NonNull<TimerLink>) {
        // SAFETY: caller guarantees `node` is not currently linked.
        debug_assert!(unsafe { !node.as_ref().is_linked() }, "node already linked");
        let head = self.sentinel_ptr();
        let mut last = self
            .sentinel
            .prev
            .expect("append on an uninitialized bucket");
        // SAFETY: `last` is either a live sibling node or the sentinel
        // itself, both valid for the duration of this call.
        unsafe {
            last.as_mut().next = Some(node);
            node.as_mut().prev = Some(last);
            node.as_mut().next = Some(head);
        }
        self.sentinel.prev = Some(node);
    }

    /// Detaches and returns the first node, or `None` if the bucket is empty.
    pub fn detach_first(&mut self) -> Option<NonNull<TimerLink>> {
        let mut first = self.first()?;
        // SAFETY: `first` is a live, currently-linked node.
        unsafe { first.as_mut().unlink() };
        Some(first)
    }
}

impl Default for BucketHead {
    fn default() -> Self {
        let mut head = Self::new();
        head.init();
        head
    }
}
