//! Push events and the sinks that receive them.
//!
//! On every broadcast tick the bridge emits one event per telemetry scalar
//! plus a payload-less `levels` event telling consumers a spectrum can be
//! pulled. Events carry the value at broadcast time and are never queued
//! for slow consumers.

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use reverbulizer_core::TelemetrySnapshot;
use serde_json::Value;

pub const OUTPUT_LEVEL: &str = "outputLevel";
pub const IS_FROZEN: &str = "isFrozen";
pub const MIX_VALUE: &str = "mixValue";
pub const ROOM_SIZE_VALUE: &str = "roomSizeValue";
pub const WIDTH_VALUE: &str = "widthValue";
pub const DAMP_VALUE: &str = "dampValue";
pub const LEVELS: &str = "levels";

/// Every event name, in broadcast order.
pub const EVENT_NAMES: [&str; 7] = [
    OUTPUT_LEVEL,
    IS_FROZEN,
    MIX_VALUE,
    ROOM_SIZE_VALUE,
    WIDTH_VALUE,
    DAMP_VALUE,
    LEVELS,
];

/// A broadcast notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PushEvent {
    OutputLevel(f32),
    IsFrozen(bool),
    MixValue(f32),
    RoomSizeValue(f32),
    WidthValue(f32),
    DampValue(f32),
    /// A spectrum is available at the `levels` endpoint.
    Levels,
}

impl PushEvent {
    /// The events of one broadcast tick.
    pub fn from_telemetry(telemetry: &TelemetrySnapshot) -> [PushEvent; 7] {
        [
            PushEvent::OutputLevel(telemetry.output_level_db),
            PushEvent::IsFrozen(telemetry.frozen),
            PushEvent::MixValue(telemetry.mix),
            PushEvent::RoomSizeValue(telemetry.room_size),
            PushEvent::WidthValue(telemetry.width),
            PushEvent::DampValue(telemetry.damp),
            PushEvent::Levels,
        ]
    }

    pub const fn name(&self) -> &'static str {
        match self {
            PushEvent::OutputLevel(_) => OUTPUT_LEVEL,
            PushEvent::IsFrozen(_) => IS_FROZEN,
            PushEvent::MixValue(_) => MIX_VALUE,
            PushEvent::RoomSizeValue(_) => ROOM_SIZE_VALUE,
            PushEvent::WidthValue(_) => WIDTH_VALUE,
            PushEvent::DampValue(_) => DAMP_VALUE,
            PushEvent::Levels => LEVELS,
        }
    }

    /// JSON payload, `None` for `levels`.
    pub fn payload(&self) -> Option<Value> {
        match *self {
            PushEvent::OutputLevel(v)
            | PushEvent::MixValue(v)
            | PushEvent::RoomSizeValue(v)
            | PushEvent::WidthValue(v)
            | PushEvent::DampValue(v) => Some(Value::from(v)),
            PushEvent::IsFrozen(frozen) => Some(Value::Bool(frozen)),
            PushEvent::Levels => None,
        }
    }
}

/// Identifies a connected sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinkId(pub(crate) u64);

/// Receiver of push events.
///
/// Called on the bridge thread without any bridge lock held, so a sink may
/// call back into the bridge. Must not block.
pub trait EventSink: Send + Sync + 'static {
    /// Deliver one event. Return false once the consumer is gone, so the
    /// bridge can drop the sink.
    fn emit(&self, event: &PushEvent) -> bool;
}

/// Sink backed by a bounded channel. Events are dropped while the channel
/// is full.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<PushEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver its consumer reads from.
    pub fn bounded(capacity: usize) -> (Self, Receiver<PushEvent>) {
        let (tx, rx) = channel::bounded(capacity);
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: &PushEvent) -> bool {
        match self.tx.try_send(*event) {
            Ok(()) | Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

impl<F> EventSink for F
where
    F: Fn(&PushEvent) + Send + Sync + 'static,
{
    fn emit(&self, event: &PushEvent) -> bool {
        self(event);
        true
    }
}
