//! Bridge configuration.
//!
//! ```ignore
//! use std::time::Duration;
//! use reverbulizer_bridge::BridgeConfig;
//!
//! static BRIDGE: BridgeConfig = BridgeConfig::new()
//!     .with_broadcast_interval(Duration::from_millis(33))
//!     .with_command_capacity(16);
//! ```

use std::time::Duration;

/// ~60 Hz.
pub const DEFAULT_BROADCAST_INTERVAL: Duration = Duration::from_micros(16_667);

/// Settings for [`Bridge::start()`](crate::Bridge::start).
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Time between push broadcasts.
    pub broadcast_interval: Duration,

    /// Commands that may wait for the message thread before
    /// [`invoke()`](crate::Bridge::invoke) reports `QueueFull`.
    pub command_capacity: usize,

    /// Name of the message thread.
    pub thread_name: &'static str,
}

impl BridgeConfig {
    pub const fn new() -> Self {
        Self {
            broadcast_interval: DEFAULT_BROADCAST_INTERVAL,
            command_capacity: 64,
            thread_name: "reverbulizer-bridge",
        }
    }

    pub const fn with_broadcast_interval(mut self, interval: Duration) -> Self {
        self.broadcast_interval = interval;
        self
    }

    pub const fn with_command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity;
        self
    }

    pub const fn with_thread_name(mut self, name: &'static str) -> Self {
        self.thread_name = name;
        self
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new()
    }
}
