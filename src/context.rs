//! The timer context: owns `Q` bucket queues and the tick counter, and
//! drives expiry via [`TimerContext::tick`].
//!
//! Ported from `struct timer_context_t` / `timer_context_init` /
//! `timer_context_tick` in `examples/original_source/rtimers.h` — the actual
//! radix-wheel algorithm this module implements. (The teacher kernel's own
//! `kern::timer::TimerQueue` is a `BinaryHeap`-backed callout queue, not a
//! radix wheel, and was not a model for the tick algorithm itself; only its
//! "one `pub fn tick()`-shaped entry point per period" shape carried over.)

use crate::bitindex::{diff_msb, to_gray, Tick};
use crate::list::BucketHead;
use crate::timer::Timer;

/// Default bucket count, matching the upstream `NQUEUE` default.
pub const DEFAULT_QUEUES: usize = 10;

/// Owns the bucket queues and tick counter for one independent wheel of
/// timers carrying opaque argument type `A`.
///
/// Distinct contexts never share state or observe each other's ticks; a
/// program may run as many as it needs, each with its own `A` and `Q`.
///
/// Must not move after [`Self::init`]: each bucket's empty-queue state is a
/// self-referential sentinel, the same constraint `kern::queue::QueueHead`
/// documents on itself.
pub struct TimerContext<A, const Q: usize = DEFAULT_QUEUES> {
    pub(crate) buckets: [BucketHead; Q],
    pub(crate) ticks: Tick,
    pub(crate) gray_ticks: Tick,
    _arg: core::marker::PhantomData<fn(&mut A)>,
}

impl<A, const Q: usize> TimerContext<A, Q> {
    const _Q_IN_RANGE: () = assert!(Q >= 1 && Q <= Tick::BITS as usize, "Q must be in 1..=32");

    /// Produces an inert context (zeroed counters, not-yet-circular
    /// buckets). Call [`Self::init`] once it is at its final address, before
    /// arming any timer against it.
    pub const fn new() -> Self {
        let _ = Self::_Q_IN_RANGE;
        Self {
            buckets: [const { BucketHead::new() }; Q],
            ticks: 0,
            gray_ticks: 0,
            _arg: core::marker::PhantomData,
        }
    }

    /// Zeros the counters and wires up each bucket's empty-queue sentinel.
    /// Mirrors `timer_context_init`; idempotent on fresh storage.
    pub fn init(&mut self) {
        self.ticks = 0;
        self.gray_ticks = 0;
        for bucket in &mut self.buckets {
            bucket.init();
        }
    }

    /// The context's current tick count.
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Advances the tick counter by one and fires every timer whose expiry
    /// matches the new count, reinserting the rest. Mirrors
    /// `timer_context_tick`: call once per tick period.
    pub fn tick(&mut self) {
        let old_key = self.gray_ticks;
        self.ticks = self.ticks.wrapping_add(1);
        self.gray_ticks = to_gray(self.ticks);
        let new_key = self.gray_ticks;
        let bucket_index = diff_msb(old_key, new_key, Q);

        // Reached through a raw pointer for the rest of this call: a firing
        // callback may call `Timer::set` on this very context (re-arming
        // itself), which reaches it through its own `NonNull` handle. A
        // single long-lived `&mut self` spanning that reentrant call would
        // alias it. No `&mut self`/`&self` borrow of `*this` is held across a
        // `timer.fire()` call below.
        let this: *mut Self = self;

        // SAFETY: `this` is valid for the duration of `tick`, which owns the
        // exclusive borrow it was derived from.
        let snapshot_tail = unsafe { (*this).buckets[bucket_index].last() };

        loop {
            // SAFETY: see above; no other reference to `*this` is alive here.
            let node = match unsafe { (*this).buckets[bucket_index].detach_first() } {
                Some(node) => node,
                None => break,
            };
            let is_tail = snapshot_tail == Some(node);

            // SAFETY: `node` was linked into this context's own bucket, so
            // it points at the `link` field of a live `Timer<A, Q>` that
            // outlives this call (caller-owned storage).
            let timer: &mut Timer<A, Q> = unsafe { Timer::<A, Q>::from_link(node).as_mut() };

            if timer.expiry_key() == new_key {
                timer.fire();
            } else {
                let next_bucket = diff_msb(timer.expiry_key(), new_key, Q);
                // SAFETY: `node` was just detached from `bucket_index` above
                // and is not linked anywhere else.
                unsafe { (*this).buckets[next_bucket].append(node) };
            }

            if is_tail {
                break;
            }
        }
    }
}

impl<A, const Q: usize> Default for TimerContext<A, Q> {
    fn default() -> Self {
        let mut ctx = Self::new();
        ctx.init();
        ctx
    }
}
