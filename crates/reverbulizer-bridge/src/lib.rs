//! # reverbulizer-bridge
//!
//! Telemetry and control bridge between the Reverbulizer signal path and a
//! remote UI.
//!
//! The bridge never touches the audio thread. It reads what the processor
//! publishes into [`SharedState`](reverbulizer_core::SharedState) and writes
//! parameters through the store, like any other control thread.
//!
//! ## Surfaces
//!
//! - **Pull**: [`Bridge::query()`] / [`Bridge::resource()`] answer named
//!   [`Endpoint`]s with small JSON [`Record`]s
//! - **Push**: a ticker broadcasts [`PushEvent`]s to every connected
//!   [`EventSink`]
//! - **Commands**: [`Bridge::invoke()`] queues a [`Command`] and returns a
//!   [`CommandCompletion`]
//! - **UI input**: [`Bridge::handle_event()`] and [`Bridge::handle_key()`]
//!   drive undo/redo

pub mod bridge;
pub mod command;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod events;
pub mod ui;

// Re-exports for convenience
pub use bridge::{Bridge, CommandCompletion};
pub use command::Command;
pub use config::{BridgeConfig, DEFAULT_BROADCAST_INTERVAL};
pub use endpoint::{Endpoint, Record, Resource, JSON_MIME_TYPE};
pub use error::{BridgeError, BridgeResult};
pub use events::{ChannelSink, EventSink, PushEvent, SinkId, EVENT_NAMES};
pub use ui::{KeyPress, Modifiers, UiEvent};
