//! Requester-side protocol: publish a request, block until the response.

use std::sync::Arc;

use crate::error::{Result, ShutdownError};
use crate::serial::Serial;
use crate::slot::State;
use crate::table::{SlotTable, Token};
use crate::wait::Waiter;

/// A caller's handle on its slot.
///
/// Cheap to clone; clones share the token and therefore the slot. Concurrent
/// calls through clones are safe: each call must first win the reservation
/// CAS, so at most one request occupies the slot at a time and the others
/// back off until it resolves.
pub struct Requester<Q, P> {
    table: Arc<SlotTable<Q, P>>,
    token: Token,
}

impl<Q, P> Clone for Requester<Q, P> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
            token: self.token,
        }
    }
}

impl<Q: Serial + Send, P: Serial + Send> Requester<Q, P> {
    /// Binds a requester to its slot. The token is validated here, once.
    pub fn new(table: Arc<SlotTable<Q, P>>, token: Token) -> Result<Self> {
        table.check_token(token)?;
        Ok(Self { table, token })
    }

    #[inline]
    pub fn token(&self) -> Token {
        self.token
    }

    /// Issues one request and blocks until its response arrives.
    ///
    /// The calling thread suspends (spin, then sleep) without blocking the
    /// worker or other requesters. If the channel shuts down before the slot
    /// can be claimed, or while the call is waiting for its response, the
    /// request payload is returned inside [`ShutdownError`] so the caller
    /// can fall back to the direct synchronous path.
    pub fn call(&self, request: Q) -> std::result::Result<P, ShutdownError<Q>> {
        let slot = self.table.slot(self.token);
        let mut waiter = Waiter::new(self.table.wait_strategy());

        // Claim the slot. The reservation CAS is what makes concurrent
        // requesters on one token safe.
        loop {
            if self.table.is_closed() {
                return Err(ShutdownError(request));
            }
            let state = slot.state();
            if state.is_shutdown() {
                return Err(ShutdownError(request));
            }
            if state == State::Idle && slot.try_transition(State::Idle, State::Reserved) {
                break;
            }
            waiter.pause();
        }

        // The slot is ours until the worker claims the published request.
        unsafe { slot.publish_request(request) };
        let published = slot.try_transition(State::Reserved, State::RequestReady);
        debug_assert!(published, "reserved slot moved under its requester");

        waiter.reset();
        loop {
            let state = slot.state();
            if state == State::ResponseReady {
                break;
            }
            if state.is_shutdown() {
                return Err(ShutdownError(request));
            }
            waiter.pause();
        }

        let response = unsafe { slot.take_response() };
        // Losing this CAS means shutdown claimed the quiescent slot between
        // our observation and the reset; the response is already ours.
        let _ = slot.try_transition(State::ResponseReady, State::Idle);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::Slot;

    fn serve_once(slot: &Slot<u32, u32>) {
        while !slot.try_transition(State::RequestReady, State::Processing) {
            std::hint::spin_loop();
        }
        let request = unsafe { slot.take_request() };
        unsafe { slot.publish_response(request + 100) };
        assert!(slot.try_transition(State::Processing, State::ResponseReady));
    }

    #[test]
    fn invalid_token_is_rejected_at_construction() {
        let table = Arc::new(SlotTable::<u32, u32>::new(2).unwrap());
        assert!(Requester::new(Arc::clone(&table), Token::new(2)).is_err());
        assert!(Requester::new(table, Token::new(1)).is_ok());
    }

    #[test]
    fn call_roundtrips_through_a_hand_driven_worker() {
        let table = Arc::new(SlotTable::<u32, u32>::new(1).unwrap());
        let requester = Requester::new(Arc::clone(&table), Token::new(0)).unwrap();
        std::thread::scope(|s| {
            let t = &table;
            s.spawn(move || {
                for _ in 0..3 {
                    serve_once(t.slot(Token::new(0)));
                }
            });
            for i in 0..3 {
                assert_eq!(requester.call(i).unwrap(), i + 100);
            }
        });
    }

    #[test]
    fn closed_table_fails_fast_with_payload() {
        let table = Arc::new(SlotTable::<u32, u32>::new(1).unwrap());
        let requester = Requester::new(Arc::clone(&table), Token::new(0)).unwrap();
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
        let err = requester.call(9).unwrap_err();
        assert_eq!(err.into_inner(), 9);
    }
}
