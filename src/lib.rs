//! fastcall - synchronous call handoff over shared slots, for callers that
//! cannot afford to cross an expensive boundary on every call.
//!
//! A fast caller publishes a request into a [`Slot`] and blocks on its state
//! word; a single slow [`Server`] thread claims the request, runs the
//! handler, and publishes the response. No mutex is held across the
//! exchange: mutual exclusion comes entirely from sequentially-consistent
//! compare-and-swap transitions on the slot state, and the common-case cost
//! of a call is two word-sized memory handoffs plus the handler itself.
//!
//! # Architecture
//!
//! ```text
//!  Requester 0 ──► Slot 0 ─┐
//!  Requester 1 ──► Slot 1 ─┼── SlotTable ◄─── Server (one worker thread,
//!  Requester n ──► Slot n ─┘                   round-robin scan)
//!
//!  Slot state machine:
//!    Idle ─► Reserved ─► RequestReady ─► Processing ─► ResponseReady ─► Idle
//!    Idle | ResponseReady ─► ShutdownRequested ─► ShutdownAcked (terminal)
//! ```
//!
//! Each caller token owns one slot, so distinct tokens never contend.
//! Requesters sharing a token serialize through the reservation CAS. Both
//! sides poll with the same two-phase [`WaitStrategy`]: spin while the
//! exchange is expected to resolve in microseconds, degrade to timed sleeps
//! when the other side is delayed.
//!
//! The [`Dispatcher`] wraps the protocol in an accelerated-or-direct front
//! end: it owns the plain synchronous call, serves the table with it from a
//! worker thread, and falls back to calling it directly whenever the
//! accelerated path is unavailable or shutting down.
//!
//! # Limitations
//!
//! A worker that never resolves a claimed request leaves its requester
//! waiting indefinitely; there is no per-request timeout or cancellation.
//! The only cancellation primitive is the one-way, table-wide shutdown
//! handshake, and a shutdown must not race in-flight requests: the
//! controller has to quiesce callers first.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod serial;
pub mod server;
pub mod slot;
pub mod table;
pub mod wait;

pub use client::Requester;
pub use config::{Config, DEFAULT_CAPACITY};
pub use dispatch::{acceleration_available, Dispatcher, Handle};
pub use error::{Error, Result, ShutdownError};
pub use serial::Serial;
pub use server::Server;
pub use slot::{Slot, State};
pub use table::{SlotTable, Token};
pub use wait::{WaitStrategy, Waiter};
