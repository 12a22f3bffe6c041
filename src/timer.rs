//! A single one-shot timer: caller-owned storage, bound to one
//! [`TimerContext`], carrying an opaque argument of caller-chosen type `A`.
//!
//! Field layout is ported from `struct timer_t` in
//! `examples/original_source/rtimers.h` (`parent`, `func`, `arg`, `timeout`,
//! `link`); the callback-plus-payload shape also echoes
//! `kern::timer::TimerElement`/`TimerCallback` in the teacher kernel.

use core::ptr::NonNull;

use crate::bitindex::{diff_msb, to_gray, Tick};
use crate::context::{TimerContext, DEFAULT_QUEUES};
use crate::list::TimerLink;

/// Callback invoked exactly once per arming, on the tick the timer expires.
///
/// On entry the timer is already unarmed; the callback may re-arm it with
/// [`Timer::set`], including on the context currently ticking (the re-arm
/// takes effect on a later `tick` call, never the current one).
pub type Callback<A, const Q: usize> = fn(&mut Timer<A, Q>);

/// A one-shot timer bound to a [`TimerContext<A, Q>`].
///
/// `link` must stay the struct's first field: [`TimerContext::tick`]
/// recovers a `Timer` from a bare `TimerLink` pointer via an offset-0,
/// `repr(C)` pointer cast.
#[repr(C)]
pub struct Timer<A, const Q: usize = DEFAULT_QUEUES> {
    pub(crate) link: TimerLink,
    context: Option<NonNull<TimerContext<A, Q>>>,
    callback: Callback<A, Q>,
    expiry: Tick,
    arg: A,
}

impl<A, const Q: usize> Timer<A, Q> {
    const _Q_IN_RANGE: () = assert!(Q >= 1 && Q <= Tick::BITS as usize, "Q must be in 1..=32");

    /// Binds `callback` and `arg` to `context`. The timer starts unarmed;
    /// mirrors `timer_init`, which does not touch the context itself.
    ///
    /// Takes `context` by exclusive reference, not because `new` itself
    /// mutates it, but so the `NonNull` captured here is only ever derived
    /// from a pointer Rust already considers mutable: `set` later reaches
    /// the context through this same pointer to append into a bucket, and
    /// doing that through a pointer that started life as a shared reference
    /// would be unsound.
    pub fn new(context: &mut TimerContext<A, Q>, callback: Callback<A, Q>, arg: A) -> Self {
        let _ = Self::_Q_IN_RANGE;
        Self {
            link: TimerLink::new(),
            context: Some(NonNull::from(context)),
            callback,
            expiry: 0,
            arg,
        }
    }

    /// Whether the timer is currently linked into a bucket.
    pub fn is_armed(&self) -> bool {
        self.link.is_linked()
    }

    pub fn arg(&self) -> &A {
        &self.arg
    }

    pub fn arg_mut(&mut self) -> &mut A {
        &mut self.arg
    }

    pub(crate) fn expiry_key(&self) -> Tick {
        self.expiry
    }

    /// Arms the timer to fire `delay` ticks from its context's current tick
    /// count. Mirrors `timer_set`.
    ///
    /// # Panics
    /// Panics if the timer is already armed, or if `delay` is not in
    /// `1..2^31` — both are programmer errors, not recoverable conditions.
    pub fn set(&mut self, delay: u32) {
        assert!(!self.is_armed(), "timer is already armed");
        assert!(delay > 0 && delay < (1u32 << 31), "delay out of range");
        let ctx_ptr = self.context.expect("timer is not bound to a context");
        // SAFETY: caller-owned storage that outlives this call; the pointer
        // was captured from a `&mut TimerContext` in `new`, so reconstructing
        // a mutable reference here does not alias a shared one.
        let ctx: &mut TimerContext<A, Q> = unsafe { &mut *ctx_ptr.as_ptr() };

        let old_key = ctx.gray_ticks;
        let expiry_ticks = ctx.ticks.wrapping_add(delay);
        let expiry_key = to_gray(expiry_ticks);
        self.expiry = expiry_key;

        let bucket = diff_msb(old_key, expiry_key, Q);
        let node = NonNull::from(&mut self.link);
        // SAFETY: `self` was just asserted unarmed, so `node` is not linked
        // into any bucket.
        unsafe { ctx.buckets[bucket].append(node) };
    }

    /// Unarms the timer without firing it, returning whether it had been
    /// armed. Safe to call on an unarmed timer (a no-op returning `false`).
    ///
    /// Not part of the scheduling core proper: cancellation is an embedder
    /// concern the core leaves external, provided here at the crate boundary
    /// so callers don't have to reimplement a raw unlink themselves.
    pub fn cancel(&mut self) -> bool {
        if !self.is_armed() {
            return false;
        }
        // SAFETY: just confirmed armed, i.e. linked into a bucket.
        unsafe { self.link.unlink() };
        true
    }

    pub(crate) fn fire(&mut self) {
        let callback = self.callback;
        callback(self);
    }

    /// Recovers a `Timer` handle from a pointer to its embedded `link`.
    ///
    /// # Safety
    /// `link` must point at the `link` field of a live `Timer<A, Q>`.
    pub(crate) unsafe fn from_link(link: NonNull<TimerLink>) -> NonNull<Self> {
        link.cast()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU32, Ordering};

    static FIRE_COUNT: AtomicU32 = AtomicU32::new(0);

    fn record_fire(_timer: &mut Timer<(), 10>) {
        FIRE_COUNT.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn new_timer_is_unarmed() {
        let mut ctx: TimerContext<()> = TimerContext::default();
        let timer = Timer::new(&mut ctx, record_fire, ());
        assert!(!timer.is_armed());
    }

    #[test]
    fn set_arms_the_timer() {
        let mut ctx: TimerContext<()> = TimerContext::default();
        let mut timer = Timer::new(&mut ctx, record_fire, ());
        timer.set(5);
        assert!(timer.is_armed());
    }

    #[test]
    #[should_panic(expected = "already armed")]
    fn set_twice_panics() {
        let mut ctx: TimerContext<()> = TimerContext::default();
        let mut timer = Timer::new(&mut ctx, record_fire, ());
        timer.set(5);
        timer.set(5);
    }

    #[test]
    #[should_panic(expected = "delay out of range")]
    fn zero_delay_panics() {
        let mut ctx: TimerContext<()> = TimerContext::default();
        let mut timer = Timer::new(&mut ctx, record_fire, ());
        timer.set(0);
    }

    #[test]
    fn cancel_unarms_without_firing() {
        FIRE_COUNT.store(0, Ordering::SeqCst);
        let mut ctx: TimerContext<()> = TimerContext::default();
        let mut timer = Timer::new(&mut ctx, record_fire, ());
        timer.set(3);
        assert!(timer.cancel());
        assert!(!timer.is_armed());
        assert!(!timer.cancel());

        for _ in 0..10 {
            ctx.tick();
        }
        assert_eq!(FIRE_COUNT.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn arg_accessors_reach_the_payload() {
        let mut ctx: TimerContext<u32> = TimerContext::default();
        let mut timer = Timer::new(&mut ctx, |_t: &mut Timer<u32, 10>| {}, 7u32);
        assert_eq!(*timer.arg(), 7);
        *timer.arg_mut() = 9;
        assert_eq!(*timer.arg(), 9);
    }
}
