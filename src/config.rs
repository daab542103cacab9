//! Configuration for the dispatcher.

use crate::wait::WaitStrategy;

/// Default number of slots in a dispatcher's table, one per caller token.
pub const DEFAULT_CAPACITY: usize = 256;

/// Dispatcher configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Slot table capacity: the number of concurrent independent channels.
    /// 1 selects the degenerate single-slot mode.
    /// Default: 256
    pub capacity: usize,
    /// Whether the accelerated path may be used at all.
    /// Default: true
    pub enabled: bool,
    /// Backoff policy for both sides of every slot.
    pub wait: WaitStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            enabled: true,
            wait: WaitStrategy::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the slot table capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Enable or disable the accelerated path.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the wait strategy.
    pub fn with_wait(mut self, wait: WaitStrategy) -> Self {
        self.wait = wait;
        self
    }
}
