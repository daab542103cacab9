//! Accelerated-or-direct call dispatch.
//!
//! The dispatcher owns a plain synchronous call function and, while started,
//! a slot table plus the worker thread that serves it with that same
//! function. Callers go through a [`Handle`], which uses the accelerated
//! slot handoff when it is available and transparently falls back to the
//! direct call otherwise, so a caller cannot distinguish the two paths by
//! result.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::client::Requester;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::serial::Serial;
use crate::server::Server;
use crate::table::{SlotTable, Token};

/// Whether this machine can host the accelerated path at all.
///
/// The worker busy-spins on its own core for up to the spin budget, so a
/// single-core machine is better off calling directly.
pub fn acceleration_available() -> bool {
    thread::available_parallelism()
        .map(|n| n.get() > 1)
        .unwrap_or(false)
}

struct Active<Q, P> {
    table: Arc<SlotTable<Q, P>>,
    worker: thread::JoinHandle<()>,
}

/// Front end pairing a slot table with its fallback synchronous call.
///
/// `start`/`stop` calls nest: only the first start spawns the worker and
/// only the matching last stop tears it down. Handles should be acquired
/// after `start`; a handle acquired earlier (or across a stop/start cycle)
/// keeps working but routes through the fallback path.
pub struct Dispatcher<Q, P, F> {
    sync_call: Arc<F>,
    config: Config,
    enabled: AtomicBool,
    starts: usize,
    active: Option<Active<Q, P>>,
}

impl<Q, P, F> Dispatcher<Q, P, F>
where
    Q: Serial + Send + 'static,
    P: Serial + Send + 'static,
    F: Fn(Q) -> P + Send + Sync + 'static,
{
    /// Creates a dispatcher around the direct synchronous call path.
    pub fn new(config: Config, sync_call: F) -> Result<Self> {
        if config.capacity == 0 {
            return Err(Error::InvalidCapacity(config.capacity));
        }
        Ok(Self {
            sync_call: Arc::new(sync_call),
            enabled: AtomicBool::new(config.enabled),
            config,
            starts: 0,
            active: None,
        })
    }

    /// Allows or forbids the accelerated path. Takes effect at the next
    /// `start`; an already-running worker keeps serving until `stop`.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// True while a worker is serving the slot table.
    pub fn accelerated(&self) -> bool {
        self.active.is_some()
    }

    /// Brings up the accelerated path.
    ///
    /// A no-op (beyond nesting bookkeeping) when acceleration is disabled,
    /// unavailable on this machine, or already running.
    pub fn start(&mut self) -> Result<()> {
        self.starts += 1;
        if self.active.is_some() || !self.enabled() || !acceleration_available() {
            return Ok(());
        }
        let table = Arc::new(SlotTable::with_wait(self.config.capacity, self.config.wait)?);
        let worker_table = Arc::clone(&table);
        let handler = Arc::clone(&self.sync_call);
        let worker = thread::Builder::new()
            .name("fastcall-worker".into())
            .spawn(move || Server::new(worker_table).run(move |request| handler(request)))?;
        log::debug!("accelerated path started, capacity {}", self.config.capacity);
        self.active = Some(Active { table, worker });
        Ok(())
    }

    /// Undoes one `start`. The last stop runs the shutdown handshake and
    /// joins the worker; callers must have quiesced their requests first.
    pub fn stop(&mut self) -> Result<()> {
        if self.starts == 0 {
            return Err(Error::NotStarted);
        }
        self.starts -= 1;
        if self.starts > 0 {
            return Ok(());
        }
        if let Some(active) = self.active.take() {
            active.table.shutdown();
            if active.worker.join().is_err() {
                log::debug!("worker thread panicked before shutdown");
            }
            log::debug!("accelerated path stopped");
        }
        Ok(())
    }

    /// Binds a caller token to a call handle. The token is validated here
    /// against the configured capacity, never per call.
    pub fn handle(&self, token: Token) -> Result<Handle<Q, P, F>> {
        if token.index() >= self.config.capacity {
            return Err(Error::InvalidToken {
                token: token.index(),
                capacity: self.config.capacity,
            });
        }
        let requester = match &self.active {
            Some(active) => Some(Requester::new(Arc::clone(&active.table), token)?),
            None => None,
        };
        Ok(Handle {
            requester,
            sync_call: Arc::clone(&self.sync_call),
        })
    }

    /// A handle that always takes the direct path, for callers beyond the
    /// table capacity.
    pub fn direct_handle(&self) -> Handle<Q, P, F> {
        Handle {
            requester: None,
            sync_call: Arc::clone(&self.sync_call),
        }
    }
}

impl<Q, P, F> Drop for Dispatcher<Q, P, F> {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.table.shutdown();
            let _ = active.worker.join();
        }
    }
}

/// A caller's routed entry point.
///
/// Clones share the token, and concurrent calls through clones are safe.
pub struct Handle<Q, P, F> {
    requester: Option<Requester<Q, P>>,
    sync_call: Arc<F>,
}

impl<Q, P, F> Clone for Handle<Q, P, F> {
    fn clone(&self) -> Self {
        Self {
            requester: self.requester.clone(),
            sync_call: Arc::clone(&self.sync_call),
        }
    }
}

impl<Q, P, F> Handle<Q, P, F>
where
    Q: Serial + Send + 'static,
    P: Serial + Send + 'static,
    F: Fn(Q) -> P + Send + Sync + 'static,
{
    /// Issues one call, accelerated when possible.
    ///
    /// Transport-level conditions (acceleration off, channel shutting down)
    /// are resolved here by retrying on the direct path; handler-level
    /// outcomes travel inside the response payload either way.
    pub fn call(&self, request: Q) -> P {
        match &self.requester {
            Some(requester) => match requester.call(request) {
                Ok(response) => response,
                Err(err) => (self.sync_call)(err.into_inner()),
            },
            None => (self.sync_call)(request),
        }
    }
}
