//! Two-phase adaptive wait: bounded spin, then timed sleep.
//!
//! Both sides of a slot poll its state while the other side works. Crossings
//! are expected to resolve in microseconds, so the first phase spins to keep
//! the waiting thread hot. If the other side is delayed past the spin budget,
//! the waiter degrades to fixed-interval sleeps to bound CPU usage.

use std::time::Duration;

use minstant::Instant;

/// Check the monotonic clock only once per this many spin iterations.
const CLOCK_CHECK_MASK: u32 = 1024 - 1;

/// Backoff policy shared by requesters and the worker while polling a slot.
#[derive(Debug, Clone, Copy)]
pub struct WaitStrategy {
    /// Maximum number of spin iterations before degrading to sleep.
    pub spin_limit: u32,
    /// Maximum wall-clock time spent spinning before degrading to sleep.
    pub spin_for: Duration,
    /// Sleep interval once degraded.
    pub sleep_for: Duration,
}

impl Default for WaitStrategy {
    fn default() -> Self {
        Self {
            spin_limit: 100_000,
            spin_for: Duration::from_millis(1),
            sleep_for: Duration::from_millis(10),
        }
    }
}

/// Cursor over a [`WaitStrategy`] for one logical wait.
///
/// `pause()` spins until either the iteration budget or the elapsed-time
/// budget runs out, whichever comes first, then sleeps between polls until
/// `reset()` re-arms the spin phase. The clock is read at a coarse interval
/// so the spin loop itself stays free of timing overhead.
#[derive(Debug)]
pub struct Waiter {
    strategy: WaitStrategy,
    spins: u32,
    started: Option<Instant>,
    sleeping: bool,
}

impl Waiter {
    pub fn new(strategy: WaitStrategy) -> Self {
        Self {
            strategy,
            spins: 0,
            started: None,
            sleeping: false,
        }
    }

    /// Re-arms the spin phase. Call after observing progress.
    #[inline]
    pub fn reset(&mut self) {
        self.spins = 0;
        self.started = None;
        self.sleeping = false;
    }

    /// Backs off once: a spin while within budget, a sleep afterwards.
    #[inline]
    pub fn pause(&mut self) {
        if self.sleeping {
            std::thread::sleep(self.strategy.sleep_for);
            return;
        }
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
        self.spins += 1;
        let out_of_spins = self.spins >= self.strategy.spin_limit;
        if out_of_spins || self.spins & CLOCK_CHECK_MASK == 0 {
            let elapsed = self.started.map(|s| s.elapsed()).unwrap_or(Duration::ZERO);
            if out_of_spins || elapsed >= self.strategy.spin_for {
                log::trace!(
                    "spin budget exhausted after {} iterations ({:?}), degrading to {:?} sleeps",
                    self.spins,
                    elapsed,
                    self.strategy.sleep_for
                );
                self.sleeping = true;
                std::thread::sleep(self.strategy.sleep_for);
                return;
            }
        }
        std::hint::spin_loop();
    }
}
