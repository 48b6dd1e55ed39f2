//! Timer contract used for boot pacing and command timeouts.

use std::{cell::RefCell, future::Future, pin::Pin, rc::Rc, time::Duration};

use futures::{channel::oneshot, FutureExt};

/// Boxed sleep future returned by [`TerminalClock::sleep`].
pub type ClockFuture = Pin<Box<dyn Future<Output = ()> + 'static>>;

/// Host timer service.
pub trait TerminalClock {
    /// Resolves once `duration` has elapsed.
    fn sleep(&self, duration: Duration) -> ClockFuture;
}

#[derive(Default)]
struct ManualClockState {
    now: Duration,
    sleepers: Vec<(Duration, oneshot::Sender<()>)>,
}

/// Deterministic clock whose time only moves through [`ManualClock::advance`].
///
/// Zero-length sleeps resolve immediately.
#[derive(Clone, Default)]
pub struct ManualClock {
    state: Rc<RefCell<ManualClockState>>,
}

impl ManualClock {
    /// Creates a clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns elapsed virtual time.
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    /// Returns the number of sleeps still waiting.
    pub fn pending_sleeps(&self) -> usize {
        self.state.borrow().sleepers.len()
    }

    /// Moves time forward and wakes every sleep whose deadline has passed.
    pub fn advance(&self, by: Duration) {
        let due = {
            let mut state = self.state.borrow_mut();
            state.now += by;
            let now = state.now;
            let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut state.sleepers)
                .into_iter()
                .partition(|(deadline, _)| *deadline <= now);
            state.sleepers = waiting;
            due
        };
        for (_, sender) in due {
            let _ = sender.send(());
        }
    }
}

impl TerminalClock for ManualClock {
    fn sleep(&self, duration: Duration) -> ClockFuture {
        if duration.is_zero() {
            return Box::pin(async {});
        }
        let (sender, receiver) = oneshot::channel();
        let mut state = self.state.borrow_mut();
        let deadline = state.now + duration;
        state.sleepers.push((deadline, sender));
        Box::pin(receiver.map(|_| ()))
    }
}

#[cfg(test)]
mod tests {
    use futures::{executor::LocalPool, task::LocalSpawnExt};
    use std::cell::Cell;

    use super::*;

    #[test]
    fn sleeps_resolve_only_after_their_deadline() {
        let clock = ManualClock::new();
        let mut pool = LocalPool::new();
        let woke = Rc::new(Cell::new(false));
        pool.spawner()
            .spawn_local({
                let clock = clock.clone();
                let woke = woke.clone();
                async move {
                    clock.sleep(Duration::from_millis(100)).await;
                    woke.set(true);
                }
            })
            .expect("spawn");

        pool.run_until_stalled();
        assert!(!woke.get());
        assert_eq!(clock.pending_sleeps(), 1);

        clock.advance(Duration::from_millis(99));
        pool.run_until_stalled();
        assert!(!woke.get());

        clock.advance(Duration::from_millis(1));
        pool.run_until_stalled();
        assert!(woke.get());
        assert_eq!(clock.now(), Duration::from_millis(100));
    }

    #[test]
    fn zero_sleep_is_immediate() {
        let clock = ManualClock::new();
        futures::executor::block_on(clock.sleep(Duration::ZERO));
        assert_eq!(clock.pending_sleeps(), 0);
    }
}
