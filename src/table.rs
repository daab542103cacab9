//! Fixed-capacity table of slots, indexed by caller tokens.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Error, Result};
use crate::serial::Serial;
use crate::slot::{Slot, State};
use crate::wait::{WaitStrategy, Waiter};

/// Index of the slot the shutdown handshake runs on.
const SHUTDOWN_SLOT: usize = 0;

/// A caller's stable identity: the index of its dedicated slot.
///
/// Tokens are plain indices; they are validated against the table capacity
/// when a [`Requester`](crate::Requester) is built, never on the call path.
/// Token allocation is up to the embedding application. Callers sharing a
/// token contend on its slot and serialize through the reservation CAS;
/// distinct tokens never contend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token(usize);

impl Token {
    pub fn new(index: usize) -> Self {
        Token(index)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Fixed array of rendezvous slots shared by requesters and one worker.
///
/// Built once, structurally immutable afterwards: slot lookup by token needs
/// no synchronization beyond the per-slot state machine. One worker serves
/// the whole table; each token gets its own dedicated slot.
pub struct SlotTable<Q, P> {
    slots: Box<[Slot<Q, P>]>,
    wait: WaitStrategy,
    /// Set when shutdown begins; new calls fail fast instead of reserving.
    closed: AtomicBool,
}

impl<Q: Serial + Send, P: Serial + Send> SlotTable<Q, P> {
    /// Creates a table with the default wait strategy.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_wait(capacity, WaitStrategy::default())
    }

    /// Creates a table with an explicit wait strategy.
    ///
    /// Capacity 1 selects the degenerate single-slot mode. Capacity 0 is a
    /// configuration error.
    pub fn with_wait(capacity: usize, wait: WaitStrategy) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }
        let slots: Box<[Slot<Q, P>]> = (0..capacity).map(|_| Slot::new()).collect();
        log::debug!("slot table initialized, capacity {}", capacity);
        Ok(Self {
            slots,
            wait,
            closed: AtomicBool::new(false),
        })
    }
}

impl<Q, P> SlotTable<Q, P> {
    /// Number of independent channels in the table.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// The backoff policy both sides of every slot use.
    #[inline]
    pub fn wait_strategy(&self) -> WaitStrategy {
        self.wait
    }

    /// Validates a token against the table capacity.
    pub fn check_token(&self, token: Token) -> Result<()> {
        if token.index() >= self.slots.len() {
            return Err(Error::InvalidToken {
                token: token.index(),
                capacity: self.slots.len(),
            });
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn slot(&self, token: Token) -> &Slot<Q, P> {
        &self.slots[token.index()]
    }

    #[inline]
    pub(crate) fn slots(&self) -> &[Slot<Q, P>] {
        &self.slots
    }

    /// True once [`shutdown`](Self::shutdown) has begun.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Stops the worker and closes the table for new calls.
    ///
    /// Reserved for the controller that owns the worker's lifecycle; a
    /// requester must never call this. The caller must guarantee no request
    /// is in flight and none will be issued: the handshake claims the
    /// shutdown slot only from a quiescent state (`Idle` or an unconsumed
    /// `ResponseReady`), retrying until it wins, then blocks until the
    /// worker acknowledges. There is no timeout; a worker that never
    /// acknowledges stalls this call indefinitely.
    ///
    /// Calling again after the first shutdown is a no-op.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let slot = &self.slots[SHUTDOWN_SLOT];
        let mut waiter = Waiter::new(self.wait);
        loop {
            if slot.try_transition(State::Idle, State::ShutdownRequested)
                || slot.try_transition(State::ResponseReady, State::ShutdownRequested)
            {
                break;
            }
            waiter.pause();
        }
        log::debug!("shutdown requested, waiting for worker acknowledgement");
        waiter.reset();
        while slot.state() != State::ShutdownAcked {
            waiter.pause();
        }
        log::debug!("worker acknowledged shutdown");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_rejected() {
        let err = SlotTable::<u32, u32>::new(0).err().unwrap();
        assert!(matches!(err, Error::InvalidCapacity(0)));
    }

    #[test]
    fn token_bounds_are_checked() {
        let table = SlotTable::<u32, u32>::new(4).unwrap();
        assert!(table.check_token(Token::new(0)).is_ok());
        assert!(table.check_token(Token::new(3)).is_ok());
        let err = table.check_token(Token::new(4)).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidToken {
                token: 4,
                capacity: 4
            }
        ));
    }

    #[test]
    fn slots_start_idle_and_table_open() {
        let table = SlotTable::<u32, u32>::new(2).unwrap();
        assert!(!table.is_closed());
        for slot in table.slots() {
            assert_eq!(slot.state(), State::Idle);
        }
    }

    #[test]
    fn shutdown_without_worker_is_acknowledged_manually() {
        // Stand in for the worker: ack the request from this thread.
        let table = SlotTable::<u32, u32>::new(1).unwrap();
        std::thread::scope(|s| {
            let t = &table;
            s.spawn(move || {
                let slot = t.slot(Token::new(0));
                while !slot.try_transition(State::ShutdownRequested, State::ShutdownAcked) {
                    std::hint::spin_loop();
                }
            });
            table.shutdown();
        });
        assert!(table.is_closed());
        assert_eq!(table.slot(Token::new(0)).state(), State::ShutdownAcked);
    }
}
