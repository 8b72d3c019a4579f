//! Parameter declarations.
//!
//! Reverbulizer has a fixed set of eight parameters. Rather than looking them
//! up by string at runtime, every parameter is a variant of the closed
//! [`ParameterId`] enumeration and resolves statically to its
//! [`ParameterInfo`]. String identifiers only exist at the edges (the bridge
//! and the remote UI) and are translated once via
//! [`ParameterId::from_identifier()`].

use crate::types::ParameterValue;

/// Closed set of Reverbulizer parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterId {
    /// Output gain, linear 0..=1.
    Gain,
    /// Hard bypass toggle.
    Bypass,
    /// Collapse stereo input to dual-mono (channel 0 on both sides).
    MonoSum,
    /// Reverb room size.
    RoomSize,
    /// Wet/dry mix.
    Mix,
    /// Stereo width of the wet signal.
    Width,
    /// High-frequency damping inside the reverb network.
    Damping,
    /// Freeze amount. Engaged at or above the configured threshold.
    Freeze,
}

impl ParameterId {
    /// Number of parameters.
    pub const COUNT: usize = 8;

    /// All parameters in storage order.
    pub const ALL: [ParameterId; Self::COUNT] = [
        ParameterId::Gain,
        ParameterId::Bypass,
        ParameterId::MonoSum,
        ParameterId::RoomSize,
        ParameterId::Mix,
        ParameterId::Width,
        ParameterId::Damping,
        ParameterId::Freeze,
    ];

    /// Storage slot of this parameter.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The identifier string shared with the host and the remote UI.
    pub const fn identifier(self) -> &'static str {
        match self {
            ParameterId::Gain => "GAIN",
            ParameterId::Bypass => "BYPASS",
            ParameterId::MonoSum => "MONO",
            ParameterId::RoomSize => "SIZE",
            ParameterId::Mix => "MIX",
            ParameterId::Width => "WIDTH",
            ParameterId::Damping => "DAMP",
            ParameterId::Freeze => "FREEZE",
        }
    }

    /// Resolve an identifier string. Case-sensitive.
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|id| id.identifier() == identifier)
    }

    /// Static metadata for this parameter.
    pub const fn info(self) -> ParameterInfo {
        match self {
            ParameterId::Gain => ParameterInfo::continuous(self, "Gain", 1.0),
            ParameterId::Bypass => ParameterInfo::toggle(self, "Bypass"),
            ParameterId::MonoSum => ParameterInfo::toggle(self, "Mono"),
            ParameterId::RoomSize => ParameterInfo::continuous(self, "Room Size", 0.5),
            ParameterId::Mix => ParameterInfo::continuous(self, "Mix", 0.75),
            ParameterId::Width => ParameterInfo::continuous(self, "Width", 0.75),
            ParameterId::Damping => ParameterInfo::continuous(self, "Damping", 0.5),
            ParameterId::Freeze => ParameterInfo::continuous(self, "Freeze", 0.0),
        }
    }
}

/// How a parameter's values are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// Two-state switch stored as 0.0 or 1.0.
    Toggle,
    /// Continuous value anywhere in the declared range.
    Continuous,
}

/// Slider step the UI uses for continuous parameters.
pub const CONTINUOUS_STEP: ParameterValue = 0.01;

/// Metadata describing a single parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterInfo {
    /// Parameter this metadata belongs to.
    pub id: ParameterId,
    /// Display name (e.g., "Room Size").
    pub name: &'static str,
    /// Toggle or continuous.
    pub kind: ParameterKind,
    /// Lower bound (inclusive).
    pub min: ParameterValue,
    /// Upper bound (inclusive).
    pub max: ParameterValue,
    /// Value on construction and after a reset.
    pub default: ParameterValue,
    /// Step between selectable values. 1.0 for toggles.
    pub step: ParameterValue,
}

impl ParameterInfo {
    /// A 0..=1 continuous parameter.
    pub const fn continuous(id: ParameterId, name: &'static str, default: ParameterValue) -> Self {
        Self {
            id,
            name,
            kind: ParameterKind::Continuous,
            min: 0.0,
            max: 1.0,
            default,
            step: CONTINUOUS_STEP,
        }
    }

    /// An off-by-default toggle.
    pub const fn toggle(id: ParameterId, name: &'static str) -> Self {
        Self {
            id,
            name,
            kind: ParameterKind::Toggle,
            min: 0.0,
            max: 1.0,
            default: 0.0,
            step: 1.0,
        }
    }

    /// The identifier string of this parameter.
    #[inline]
    pub const fn identifier(&self) -> &'static str {
        self.id.identifier()
    }

    /// Returns true if `value` is finite and inside the declared range.
    #[inline]
    pub fn contains(&self, value: ParameterValue) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }

    /// Map an in-range value to the value that is actually stored.
    ///
    /// Toggles snap to 0.0 / 1.0 around the midpoint; continuous values are
    /// stored as given.
    #[inline]
    pub fn quantize(&self, value: ParameterValue) -> ParameterValue {
        match self.kind {
            ParameterKind::Toggle => {
                if value >= 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            ParameterKind::Continuous => value,
        }
    }
}
