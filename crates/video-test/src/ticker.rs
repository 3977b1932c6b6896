use crate::{Error, Result, MAX_FRAME_PERIOD};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Outcome of waiting on a [`Ticker`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Tick {
    /// A tick fired. `missed` counts grid points that elapsed while nobody was
    /// waiting; they are dropped rather than delivered in a burst.
    Fired { missed: u32 },
    /// The ticker was stopped.
    Stopped,
}

#[derive(Debug)]
struct State {
    next: Instant,
    stopped: bool,
}

/// Fixed period pacer.
///
/// Ticks are due on a grid of `start + k * period`. A caller that arrives late
/// gets the pending tick at once and the next one on the following grid point.
/// There is no drift compensation beyond staying on the grid.
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    state: Mutex<State>,
    wake: Condvar,
}

impl Ticker {
    /// Start ticking now; the first tick is due one period from now.
    ///
    /// `period` is clamped to `1ns..=MAX_FRAME_PERIOD`.
    pub fn start(period: Duration) -> Self {
        let period = period.clamp(Duration::from_nanos(1), MAX_FRAME_PERIOD);
        let now = Instant::now();
        Self {
            period,
            state: Mutex::new(State {
                next: now.checked_add(period).unwrap_or(now),
                stopped: false,
            }),
            wake: Condvar::new(),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Block until the next tick is due or the ticker is stopped.
    pub fn wait(&self) -> Result<Tick> {
        let mut state = self.state.lock().map_err(|_| Error::Poisoned("ticker"))?;
        loop {
            if state.stopped {
                return Ok(Tick::Stopped);
            }
            let now = Instant::now();
            if now >= state.next {
                let behind = (now - state.next).as_nanos() / self.period.as_nanos();
                let missed = u32::try_from(behind).unwrap_or(u32::MAX);
                let due = state.next;
                state.next = missed
                    .checked_add(1)
                    .and_then(|steps| self.period.checked_mul(steps))
                    .and_then(|skip| due.checked_add(skip))
                    .or_else(|| now.checked_add(self.period))
                    .unwrap_or(now);
                return Ok(Tick::Fired { missed });
            }
            let timeout = state.next - now;
            let (guard, _) = self
                .wake
                .wait_timeout(state, timeout)
                .map_err(|_| Error::Poisoned("ticker"))?;
            state = guard;
        }
    }

    /// Stop ticking and wake any waiter. Returns `true` for the call that
    /// actually stopped it.
    pub fn stop(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let first = !state.stopped;
        state.stopped = true;
        drop(state);
        self.wake.notify_all();
        first
    }

    pub fn is_stopped(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stopped
    }
}
