//! Demonstration driver for the radix timer wheel: arms a handful of timers
//! against one process-wide context and ticks it on a wall-clock period,
//! printing each firing as it happens.
//!
//! Ported from `main` in `examples/original_source/timers.c`: argument
//! validation (`0 < delay < INT32_MAX`), a single global context, a
//! 10ms-period tick loop. The global-context-behind-`spin::Once<Mutex<_>>`
//! shape mirrors `static TIMER_QUEUE` in the teacher's `kern::timer`; the
//! fixed-capacity fire log mirrors the teacher's fondness for `heapless`
//! buffers over heap-allocated ones, here recording fire order instead of
//! just the upstream single stop flag.

use std::env;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use spin::{Mutex, Once};

use rtimers::{Timer, TimerContext};

const TICK_PERIOD: Duration = Duration::from_millis(10);
const MAX_LOGGED_FIRINGS: usize = 8;

/// Errors in the arguments passed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// No delay argument was given.
    MissingArgument,
    /// The argument did not parse as an integer.
    NotANumber,
    /// The argument parsed but is outside `1..2^31`, same bound `Timer::set`
    /// enforces.
    OutOfRange,
}

impl DriverError {
    fn exit_code(self) -> ExitCode {
        ExitCode::from(match self {
            DriverError::MissingArgument => 1,
            DriverError::NotANumber => 2,
            DriverError::OutOfRange => 3,
        })
    }
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverError::MissingArgument => {
                write!(f, "please specify a timeout value in 10ms ticks")
            }
            DriverError::NotANumber => write!(f, "timeout must be an integer"),
            DriverError::OutOfRange => write!(f, "timeout must be 0 < t < 2^31"),
        }
    }
}

fn parse_delay(args: &[String]) -> Result<u32, DriverError> {
    let raw = args.get(1).ok_or(DriverError::MissingArgument)?;
    let value: i64 = raw.parse().map_err(|_| DriverError::NotANumber)?;
    if value <= 0 || value >= (1i64 << 31) {
        return Err(DriverError::OutOfRange);
    }
    Ok(value as u32)
}

/// Shared state every timer on the driver's context can reach through its
/// opaque argument: a fixed-capacity log of firing order plus the stop flag
/// that ends the tick loop.
struct DriverState {
    log: Mutex<heapless::Vec<&'static str, MAX_LOGGED_FIRINGS>>,
    stop: AtomicBool,
}

impl DriverState {
    fn new() -> Self {
        Self {
            log: Mutex::new(heapless::Vec::new()),
            stop: AtomicBool::new(false),
        }
    }

    fn record(&self, name: &'static str) {
        let mut log = self.log.lock();
        // Fixed capacity: a run with more firings than the log can hold
        // silently stops recording past `MAX_LOGGED_FIRINGS` rather than
        // growing or panicking.
        let _ = log.push(name);
    }
}

static CONTEXT: Once<Mutex<TimerContext<&'static DriverState, 10>>> = Once::new();

fn log_and_continue(timer: &mut Timer<&'static DriverState, 10>) {
    timer.arg().record("tick");
}

fn log_and_stop(timer: &mut Timer<&'static DriverState, 10>) {
    let state = *timer.arg();
    state.record("timeout");
    state.stop.store(true, Ordering::SeqCst);
}

fn run(delay: u32, state: &'static DriverState) {
    let context_lock = CONTEXT.call_once(|| Mutex::new(TimerContext::default()));

    // Timers only need a momentary exclusive reference to the context to
    // capture its address (`Timer::new`); the lock is released before arming
    // them, since `Timer::set`/`TimerContext::tick` reach the context through
    // the pointer the timer captured here, not through this guard.
    let (mut stop_timer, mut early, mut late) = {
        let mut context = context_lock.lock();
        (
            Timer::new(&mut context, log_and_stop, state),
            Timer::new(&mut context, log_and_continue, state),
            Timer::new(&mut context, log_and_continue, state),
        )
    };

    stop_timer.set(delay);
    // A couple of extra timers so fire order is visible even when the run
    // is otherwise a single timeout.
    if delay > 2 {
        early.set(delay / 2);
        late.set(delay - 1);
    }

    while !state.stop.load(Ordering::SeqCst) {
        thread::sleep(TICK_PERIOD);
        context_lock.lock().tick();
    }

    let ticks = context_lock.lock().ticks();
    println!("timeout elapsed after {ticks} ticks");
    print!("fire order:");
    for name in state.log.lock().iter() {
        print!(" {name}");
    }
    println!();
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    match parse_delay(&args) {
        Ok(delay) => {
            let state = Box::leak(Box::new(DriverState::new()));
            run(delay, state);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            err.exit_code()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_argument() {
        let args = vec!["rtimersctl".to_string()];
        assert_eq!(parse_delay(&args), Err(DriverError::MissingArgument));
    }

    #[test]
    fn rejects_non_numeric_argument() {
        let args = vec!["rtimersctl".to_string(), "soon".to_string()];
        assert_eq!(parse_delay(&args), Err(DriverError::NotANumber));
    }

    #[test]
    fn rejects_zero_and_negative() {
        let args = vec!["rtimersctl".to_string(), "0".to_string()];
        assert_eq!(parse_delay(&args), Err(DriverError::OutOfRange));
        let args = vec!["rtimersctl".to_string(), "-5".to_string()];
        assert_eq!(parse_delay(&args), Err(DriverError::OutOfRange));
    }

    #[test]
    fn rejects_too_large() {
        let args = vec!["rtimersctl".to_string(), "3000000000".to_string()];
        assert_eq!(parse_delay(&args), Err(DriverError::OutOfRange));
    }

    #[test]
    fn accepts_in_range_value() {
        let args = vec!["rtimersctl".to_string(), "100".to_string()];
        assert_eq!(parse_delay(&args), Ok(100));
    }
}
