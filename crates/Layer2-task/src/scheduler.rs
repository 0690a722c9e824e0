//! Scheduler capability
//!
//! The bridge cannot drive the host's cadence itself; it only asks the host
//! to "call this tick periodically on your thread". [`Scheduler`] is that
//! capability, and [`HostLoop`] is a single-thread timer loop implementing it
//! for hosts that don't bring their own.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Timer callback. Returns the delay before the next call, or `None` to
/// unregister itself.
pub type TickFn = Box<dyn FnMut() -> Option<Duration>>;

/// Periodic callbacks on the host's designated thread
pub trait Scheduler {
    /// Register a named timer, first fired after `first_delay`.
    ///
    /// Returns `false` (and drops `tick`) if a timer with that name exists.
    fn register(&self, name: &str, first_delay: Duration, tick: TickFn) -> bool;

    /// Remove a named timer. Returns `false` if it was not registered.
    fn unregister(&self, name: &str) -> bool;

    fn is_registered(&self, name: &str) -> bool;
}

struct Timer {
    name: String,
    due: Instant,
    /// `None` while the callback is running
    tick: Option<TickFn>,
}

/// Single-thread timer loop. Cloning shares the same timer table.
#[derive(Clone, Default)]
pub struct HostLoop {
    timers: Rc<RefCell<Vec<Timer>>>,
}

impl HostLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timer_count(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Earliest due time among idle timers
    pub fn next_due(&self) -> Option<Instant> {
        self.timers
            .borrow()
            .iter()
            .filter(|t| t.tick.is_some())
            .map(|t| t.due)
            .min()
    }

    /// Fire every timer that is due now. Returns how many fired.
    ///
    /// Callbacks run with the timer table unborrowed, so a callback may
    /// register or unregister timers.
    pub fn run_pending(&self) -> usize {
        let now = Instant::now();
        let due: Vec<(String, TickFn)> = {
            let mut timers = self.timers.borrow_mut();
            timers
                .iter_mut()
                .filter(|t| t.due <= now)
                .filter_map(|t| t.tick.take().map(|tick| (t.name.clone(), tick)))
                .collect()
        };

        let fired = due.len();
        for (name, mut tick) in due {
            trace!(timer = %name, "Timer fired");
            let next = tick();

            let mut timers = self.timers.borrow_mut();
            let Some(pos) = timers
                .iter()
                .position(|t| t.name == name && t.tick.is_none())
            else {
                // unregistered by its own callback
                continue;
            };
            match next {
                Some(delay) => {
                    timers[pos].due = Instant::now() + delay;
                    timers[pos].tick = Some(tick);
                }
                None => {
                    debug!(timer = %name, "Timer finished");
                    timers.remove(pos);
                }
            }
        }
        fired
    }

    /// Run timers until `should_stop` returns true.
    ///
    /// `should_stop` is checked at least every `poll` even when no timer is due.
    pub fn run_until(&self, poll: Duration, mut should_stop: impl FnMut() -> bool) {
        while !should_stop() {
            self.run_pending();
            let wake = self
                .next_due()
                .map(|due| due.saturating_duration_since(Instant::now()))
                .unwrap_or(poll)
                .min(poll);
            if !wake.is_zero() {
                std::thread::sleep(wake);
            }
        }
    }

    /// Run timers for a fixed wall-clock duration
    pub fn run_for(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        self.run_until(Duration::from_millis(5), || Instant::now() >= deadline);
    }
}

impl Scheduler for HostLoop {
    fn register(&self, name: &str, first_delay: Duration, tick: TickFn) -> bool {
        let mut timers = self.timers.borrow_mut();
        if timers.iter().any(|t| t.name == name) {
            return false;
        }
        debug!(timer = name, "Timer registered");
        timers.push(Timer {
            name: name.to_string(),
            due: Instant::now() + first_delay,
            tick: Some(tick),
        });
        true
    }

    fn unregister(&self, name: &str) -> bool {
        let mut timers = self.timers.borrow_mut();
        let before = timers.len();
        timers.retain(|t| t.name != name);
        let removed = timers.len() != before;
        if removed {
            debug!(timer = name, "Timer unregistered");
        }
        removed
    }

    fn is_registered(&self, name: &str) -> bool {
        self.timers.borrow().iter().any(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_register_is_unique_by_name() {
        let host = HostLoop::new();
        assert!(host.register("tick", Duration::ZERO, Box::new(|| Some(Duration::ZERO))));
        assert!(!host.register("tick", Duration::ZERO, Box::new(|| None)));
        assert_eq!(host.timer_count(), 1);
        assert!(host.is_registered("tick"));
    }

    #[test]
    fn test_unregister_twice() {
        let host = HostLoop::new();
        host.register("tick", Duration::ZERO, Box::new(|| None));
        assert!(host.unregister("tick"));
        assert!(!host.unregister("tick"));
        assert!(!host.is_registered("tick"));
    }

    #[test]
    fn test_run_pending_respects_due_time() {
        let host = HostLoop::new();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        host.register(
            "slow",
            Duration::from_secs(60),
            Box::new(move || {
                c.set(c.get() + 1);
                Some(Duration::from_secs(60))
            }),
        );
        assert_eq!(host.run_pending(), 0);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_timer_returning_none_is_removed() {
        let host = HostLoop::new();
        host.register("once", Duration::ZERO, Box::new(|| None));
        assert_eq!(host.run_pending(), 1);
        assert!(!host.is_registered("once"));
    }

    #[test]
    fn test_callback_may_unregister_itself() {
        let host = HostLoop::new();
        let handle = host.clone();
        host.register(
            "self-removing",
            Duration::ZERO,
            Box::new(move || {
                handle.unregister("self-removing");
                Some(Duration::ZERO)
            }),
        );
        host.run_pending();
        assert_eq!(host.timer_count(), 0);
    }

    #[test]
    fn test_run_until_fires_repeatedly() {
        let host = HostLoop::new();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        host.register(
            "tick",
            Duration::ZERO,
            Box::new(move || {
                c.set(c.get() + 1);
                Some(Duration::from_millis(1))
            }),
        );
        let seen = count.clone();
        host.run_until(Duration::from_millis(5), || seen.get() >= 3);
        assert!(count.get() >= 3);
    }
}
