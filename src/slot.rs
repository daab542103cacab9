//! The shared exchange unit for one outstanding request/response handoff.
//!
//! A slot is a single atomic state word plus request and response storage.
//! There is no lock: at any instant exactly one side owns the payload cells,
//! and ownership is decided solely by the state value. Every transition is a
//! sequentially-consistent compare-and-swap, so payload writes made before a
//! transition are visible to the other side as soon as it observes the new
//! state.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::serial::Serial;

/// Protocol states of a slot.
///
/// The request path cycles `Idle -> Reserved -> RequestReady -> Processing ->
/// ResponseReady -> Idle`. The shutdown path branches from a quiescent slot:
/// `Idle | ResponseReady -> ShutdownRequested -> ShutdownAcked`, and
/// `ShutdownAcked` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum State {
    /// No outstanding request.
    Idle = 0,
    /// A requester won the slot and is writing its request.
    Reserved = 1,
    /// Request published; the requester is polling for the response.
    RequestReady = 2,
    /// The worker claimed the request and is running the handler.
    Processing = 3,
    /// Response published; the requester may consume it.
    ResponseReady = 4,
    /// The controller asked the worker to stop.
    ShutdownRequested = 5,
    /// The worker acknowledged shutdown and exited.
    ShutdownAcked = 6,
}

impl State {
    fn from_u32(v: u32) -> State {
        match v {
            0 => State::Idle,
            1 => State::Reserved,
            2 => State::RequestReady,
            3 => State::Processing,
            4 => State::ResponseReady,
            5 => State::ShutdownRequested,
            6 => State::ShutdownAcked,
            _ => unreachable!("corrupt slot state {}", v),
        }
    }

    /// True for both shutdown states.
    #[inline]
    pub fn is_shutdown(self) -> bool {
        matches!(self, State::ShutdownRequested | State::ShutdownAcked)
    }
}

/// One rendezvous slot.
///
/// Cache-line aligned so that neighbouring slots in a table never share a
/// line while their owners spin on them.
#[repr(C, align(64))]
pub struct Slot<Q, P> {
    state: AtomicU32,
    request: UnsafeCell<MaybeUninit<Q>>,
    response: UnsafeCell<MaybeUninit<P>>,
}

unsafe impl<Q: Send, P: Send> Send for Slot<Q, P> {}
unsafe impl<Q: Send, P: Send> Sync for Slot<Q, P> {}

impl<Q, P> Slot<Q, P> {
    pub(crate) fn new() -> Self
    where
        Q: Serial,
        P: Serial,
    {
        Self {
            state: AtomicU32::new(State::Idle as u32),
            request: UnsafeCell::new(MaybeUninit::uninit()),
            response: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> State {
        State::from_u32(self.state.load(Ordering::SeqCst))
    }

    /// Attempts the transition `from -> to`, returning whether it won.
    ///
    /// Failure means another party moved the slot first; re-read the state
    /// and decide again.
    #[inline]
    pub fn try_transition(&self, from: State, to: State) -> bool {
        self.state
            .compare_exchange(from as u32, to as u32, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Writes the request payload.
    ///
    /// # Safety
    /// The caller must hold the slot in `Reserved`.
    #[inline]
    pub(crate) unsafe fn publish_request(&self, request: Q) {
        unsafe { (*self.request.get()).write(request) };
    }

    /// Reads the request payload.
    ///
    /// # Safety
    /// The caller must hold the slot in `Processing`, after a requester
    /// published in `Reserved`.
    #[inline]
    pub(crate) unsafe fn take_request(&self) -> Q {
        unsafe { (*self.request.get()).assume_init_read() }
    }

    /// Writes the response payload.
    ///
    /// # Safety
    /// The caller must hold the slot in `Processing`.
    #[inline]
    pub(crate) unsafe fn publish_response(&self, response: P) {
        unsafe { (*self.response.get()).write(response) };
    }

    /// Reads the response payload.
    ///
    /// # Safety
    /// The caller must have observed `ResponseReady` for its own request.
    #[inline]
    pub(crate) unsafe fn take_response(&self) -> P {
        unsafe { (*self.response.get()).assume_init_read() }
    }
}
