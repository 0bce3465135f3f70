use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Callbacks the session can have in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// One-second countdown tick
    Countdown,
    /// Deferred submission of the typed answer
    AutoSubmit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// Monotonic time source, measured from an arbitrary origin
pub trait Clock {
    fn now(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Schedule-once / schedule-periodic / cancel, polled by the event loop.
pub trait Scheduler {
    fn schedule_once(&mut self, delay: Duration, kind: TimerKind) -> TimerHandle;
    fn schedule_periodic(&mut self, period: Duration, kind: TimerKind) -> TimerHandle;
    fn cancel(&mut self, handle: TimerHandle);
    fn is_scheduled(&self, handle: TimerHandle) -> bool;

    /// Pop the earliest timer whose deadline has passed. Periodic timers are
    /// re-armed one period later, so a late poll yields one firing per
    /// elapsed period.
    fn pop_due(&mut self) -> Option<TimerKind>;

    /// Time until the next deadline, zero if one is already due.
    fn next_deadline_in(&self) -> Option<Duration>;
}

#[derive(Debug, Clone)]
struct Timer {
    handle: TimerHandle,
    kind: TimerKind,
    deadline: Duration,
    period: Option<Duration>,
}

/// Timer list driven by any [`Clock`]
#[derive(Debug)]
pub struct TimerQueue<C: Clock> {
    clock: C,
    next_id: u64,
    timers: Vec<Timer>,
}

impl<C: Clock> TimerQueue<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            next_id: 0,
            timers: Vec::new(),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    fn insert(&mut self, delay: Duration, period: Option<Duration>, kind: TimerKind) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            handle,
            kind,
            deadline: self.clock.now() + delay,
            period,
        });
        handle
    }

    fn earliest(&self) -> Option<usize> {
        self.timers
            .iter()
            .enumerate()
            .min_by_key(|(_, t)| (t.deadline, t.handle.0))
            .map(|(idx, _)| idx)
    }
}

impl<C: Clock> Scheduler for TimerQueue<C> {
    fn schedule_once(&mut self, delay: Duration, kind: TimerKind) -> TimerHandle {
        self.insert(delay, None, kind)
    }

    fn schedule_periodic(&mut self, period: Duration, kind: TimerKind) -> TimerHandle {
        self.insert(period, Some(period), kind)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.timers.retain(|t| t.handle != handle);
    }

    fn is_scheduled(&self, handle: TimerHandle) -> bool {
        self.timers.iter().any(|t| t.handle == handle)
    }

    fn pop_due(&mut self) -> Option<TimerKind> {
        let idx = self.earliest()?;
        if self.timers[idx].deadline > self.clock.now() {
            return None;
        }
        let kind = self.timers[idx].kind;
        match self.timers[idx].period {
            // zero periods would spin forever
            Some(period) if !period.is_zero() => self.timers[idx].deadline += period,
            _ => {
                self.timers.remove(idx);
            }
        }
        Some(kind)
    }

    fn next_deadline_in(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.earliest()
            .map(|idx| self.timers[idx].deadline.saturating_sub(now))
    }
}
