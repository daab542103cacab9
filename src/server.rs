//! Worker-side protocol: claim published requests, run the handler, publish
//! responses, and participate in the shutdown handshake.

use std::sync::Arc;

use crate::serial::Serial;
use crate::slot::{Slot, State};
use crate::table::SlotTable;
use crate::wait::Waiter;

/// The single worker execution context for a table.
///
/// Exactly one server may exist per table; this is a design precondition,
/// not enforced at runtime. The server scans slots round-robin, so requests
/// on distinct slots are resolved independently of each other while requests
/// within one slot cycle strictly one at a time.
pub struct Server<Q, P> {
    table: Arc<SlotTable<Q, P>>,
    waiter: Waiter,
}

impl<Q: Serial + Send, P: Serial + Send> Server<Q, P> {
    pub fn new(table: Arc<SlotTable<Q, P>>) -> Self {
        let waiter = Waiter::new(table.wait_strategy());
        Self { table, waiter }
    }

    /// One scheduling step: scans every slot once, resolving any published
    /// requests.
    ///
    /// Returns `false` when a shutdown request was observed and acknowledged;
    /// the worker must then stop calling `serve`. An empty scan backs off
    /// through the adaptive waiter, so callers can loop without burning a
    /// core when the table goes quiet.
    pub fn serve<F: FnMut(Q) -> P>(&mut self, handler: &mut F) -> bool {
        let mut served = 0usize;
        for slot in self.table.slots() {
            match slot.state() {
                State::RequestReady => {
                    if slot.try_transition(State::RequestReady, State::Processing) {
                        Self::process(slot, handler);
                        served += 1;
                    }
                }
                State::ShutdownRequested => {
                    let acked =
                        slot.try_transition(State::ShutdownRequested, State::ShutdownAcked);
                    debug_assert!(acked, "shutdown slot moved under the worker");
                    log::debug!("worker acknowledged shutdown after {} slot(s)", served);
                    return false;
                }
                _ => {}
            }
        }
        if served > 0 {
            self.waiter.reset();
        } else {
            self.waiter.pause();
        }
        true
    }

    /// Serves until shutdown is acknowledged.
    pub fn run<F: FnMut(Q) -> P>(mut self, mut handler: F) {
        log::debug!("worker serving table of {} slot(s)", self.table.capacity());
        while self.serve(&mut handler) {}
    }

    fn process<F: FnMut(Q) -> P>(slot: &Slot<Q, P>, handler: &mut F) {
        let request = unsafe { slot.take_request() };
        let response = handler(request);
        unsafe { slot.publish_response(response) };
        let resolved = slot.try_transition(State::Processing, State::ResponseReady);
        debug_assert!(resolved, "processing slot moved under the worker");
    }
}
