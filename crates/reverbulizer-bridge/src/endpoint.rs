//! Pull endpoints.
//!
//! Each endpoint answers with a small JSON record built from the latest
//! published telemetry. Queries only read atomics or try-acquire the spectrum
//! slot, so they never wait on the audio thread.

use std::str::FromStr;

use reverbulizer_core::SharedState;
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};

/// MIME type of every resource the bridge serves.
pub const JSON_MIME_TYPE: &str = "application/json";

/// A named snapshot query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    OutputLevel,
    Freeze,
    Mix,
    RoomSize,
    Width,
    Damp,
    Levels,
}

impl Endpoint {
    pub const ALL: [Endpoint; 7] = [
        Endpoint::OutputLevel,
        Endpoint::Freeze,
        Endpoint::Mix,
        Endpoint::RoomSize,
        Endpoint::Width,
        Endpoint::Damp,
        Endpoint::Levels,
    ];

    /// Resource name the UI fetches.
    pub const fn name(self) -> &'static str {
        match self {
            Endpoint::OutputLevel => "outputLevel",
            Endpoint::Freeze => "freeze",
            Endpoint::Mix => "mix",
            Endpoint::RoomSize => "roomSize",
            Endpoint::Width => "width",
            Endpoint::Damp => "damp",
            Endpoint::Levels => "levels",
        }
    }

    /// Resolve a resource path such as `/roomSize.json` or `mix`.
    pub fn from_path(path: &str) -> Option<Self> {
        let name = path.strip_prefix('/').unwrap_or(path);
        let name = name.strip_suffix(".json").unwrap_or(name);
        Self::ALL.into_iter().find(|endpoint| endpoint.name() == name)
    }
}

impl FromStr for Endpoint {
    type Err = BridgeError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        Self::from_path(path).ok_or_else(|| BridgeError::UnknownResource(path.to_string()))
    }
}

/// Response body of an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Record {
    OutputLevel {
        /// Level of channel 0 in dB.
        left: f32,
    },
    Freeze {
        freeze: bool,
    },
    Mix {
        mix: f32,
    },
    RoomSize {
        #[serde(rename = "roomSize")]
        room_size: f32,
    },
    Width {
        width: f32,
    },
    Damp {
        damp: f32,
    },
    Levels {
        levels: Vec<f32>,
    },
}

impl Record {
    /// Answer `endpoint` from the shared state.
    ///
    /// Fails with [`BridgeError::Unavailable`] for `levels` when no complete
    /// spectrum can be read right now.
    pub fn query(shared: &SharedState, endpoint: Endpoint) -> BridgeResult<Self> {
        let telemetry = &shared.telemetry;
        Ok(match endpoint {
            Endpoint::OutputLevel => Record::OutputLevel {
                left: telemetry.output_level_db(),
            },
            Endpoint::Freeze => Record::Freeze {
                freeze: telemetry.is_frozen(),
            },
            Endpoint::Mix => Record::Mix {
                mix: telemetry.mix(),
            },
            Endpoint::RoomSize => Record::RoomSize {
                room_size: telemetry.room_size(),
            },
            Endpoint::Width => Record::Width {
                width: telemetry.width(),
            },
            Endpoint::Damp => Record::Damp {
                damp: telemetry.damp(),
            },
            Endpoint::Levels => Record::Levels {
                levels: shared.spectrum.try_snapshot()?,
            },
        })
    }
}

/// A serialized endpoint response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub mime_type: &'static str,
    pub data: Vec<u8>,
}

impl Resource {
    pub(crate) fn json(record: &Record) -> Option<Self> {
        match serde_json::to_vec(record) {
            Ok(data) => Some(Self {
                mime_type: JSON_MIME_TYPE,
                data,
            }),
            Err(err) => {
                log::warn!("failed to serialize {:?}: {}", record, err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reverbulizer_core::{PluginConfig, UnavailableReason};
    use serde_json::json;

    #[test]
    fn test_paths() {
        assert_eq!(Endpoint::from_path("outputLevel.json"), Some(Endpoint::OutputLevel));
        assert_eq!(Endpoint::from_path("/roomSize.json"), Some(Endpoint::RoomSize));
        assert_eq!(Endpoint::from_path("damp"), Some(Endpoint::Damp));
        assert_eq!(Endpoint::from_path("/levels"), Some(Endpoint::Levels));
        assert_eq!(Endpoint::from_path("RoomSize.json"), None);
        assert!(matches!(
            "index.html".parse::<Endpoint>(),
            Err(BridgeError::UnknownResource(_))
        ));
        for endpoint in Endpoint::ALL {
            assert_eq!(endpoint.name().parse::<Endpoint>().unwrap(), endpoint);
        }
    }

    #[test]
    fn test_record_shapes() {
        let shared = SharedState::new(&PluginConfig::DEFAULT);

        let value = |endpoint| {
            let record = Record::query(&shared, endpoint).unwrap();
            serde_json::to_value(record).unwrap()
        };
        assert_eq!(value(Endpoint::OutputLevel), json!({ "left": -100.0 }));
        assert_eq!(value(Endpoint::Freeze), json!({ "freeze": false }));
        assert_eq!(value(Endpoint::Mix), json!({ "mix": 0.75 }));
        assert_eq!(value(Endpoint::RoomSize), json!({ "roomSize": 0.5 }));
        assert_eq!(value(Endpoint::Width), json!({ "width": 0.75 }));
        assert_eq!(value(Endpoint::Damp), json!({ "damp": 0.5 }));
    }

    #[test]
    fn test_levels_unavailable_until_published() {
        let shared = SharedState::new(&PluginConfig::DEFAULT);
        let err = Record::query(&shared, Endpoint::Levels).unwrap_err();
        assert_eq!(
            err,
            BridgeError::Unavailable(reverbulizer_core::SnapshotUnavailable {
                reason: UnavailableReason::NotPublished
            })
        );

        let mut frame = vec![0.25; shared.spectrum.bins()];
        shared.spectrum.try_publish(&mut frame);
        match Record::query(&shared, Endpoint::Levels).unwrap() {
            Record::Levels { levels } => assert_eq!(levels.len(), 512),
            other => panic!("unexpected record {other:?}"),
        }
    }

    #[test]
    fn test_record_parses_back() {
        let record: Record = serde_json::from_str(r#"{"roomSize":0.25}"#).unwrap();
        assert_eq!(record, Record::RoomSize { room_size: 0.25 });
    }
}
