//! rtimers - a radix timer wheel for scheduling one-shot, tick-relative
//! callbacks with bounded per-operation work.
//!
//! Arm a [`Timer`] against a [`TimerContext`], call [`TimerContext::tick`]
//! once per tick period, and the timer's callback runs on the tick it
//! expires. Each tick visits exactly one bucket of timers, so per-tick work
//! stays bounded regardless of how many timers are outstanding.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![allow(clippy::new_without_default)]

mod bitindex;
mod context;
mod list;
mod timer;

pub use context::{TimerContext, DEFAULT_QUEUES};
pub use timer::{Callback, Timer};

/// Crate version, exposed for driver/embedder diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
