use prost::Message;
use prost_types::Timestamp;
use serde::{Deserialize, Serialize};

use super::error::{Result, SnapshotError};
use crate::counter::Event;
use crate::counter::proto::{from_timestamp, to_timestamp};

/// Encoding used for snapshot files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFormat {
    /// JSON array of RFC 3339 timestamps
    #[default]
    Json,
    /// `EventSnapshot` protobuf message
    Protobuf,
}

/// Whole-state snapshot message: `repeated google.protobuf.Timestamp events = 1`
#[derive(Clone, PartialEq, Message)]
pub struct EventSnapshot {
    #[prost(message, repeated, tag = "1")]
    pub events: Vec<Timestamp>,
}

impl SnapshotFormat {
    pub fn encode(&self, events: &[Event]) -> Result<Vec<u8>> {
        match self {
            SnapshotFormat::Json => Ok(serde_json::to_vec(events)?),
            SnapshotFormat::Protobuf => {
                let message = EventSnapshot {
                    events: events.iter().map(to_timestamp).collect(),
                };
                Ok(message.encode_to_vec())
            }
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Vec<Event>> {
        match self {
            SnapshotFormat::Json => Ok(serde_json::from_slice(bytes)?),
            SnapshotFormat::Protobuf => EventSnapshot::decode(bytes)?
                .events
                .iter()
                .map(|ts| from_timestamp(ts).map_err(SnapshotError::from))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone, Utc};

    fn sample() -> Vec<Event> {
        let base = Utc.with_ymd_and_hms(2020, 11, 1, 0, 0, 0).unwrap();
        vec![
            base,
            base + TimeDelta::nanoseconds(1),
            base + TimeDelta::milliseconds(1500),
            base + TimeDelta::milliseconds(1500),
        ]
    }

    #[test]
    fn test_json_round_trip() {
        let bytes = SnapshotFormat::Json.encode(&sample()).unwrap();
        assert!(bytes.starts_with(b"[\"2020-11-01T00:00:00"));
        assert_eq!(SnapshotFormat::Json.decode(&bytes).unwrap(), sample());
    }

    #[test]
    fn test_protobuf_round_trip() {
        let bytes = SnapshotFormat::Protobuf.encode(&sample()).unwrap();
        assert_eq!(SnapshotFormat::Protobuf.decode(&bytes).unwrap(), sample());
    }

    #[test]
    fn test_empty_snapshot() {
        for format in [SnapshotFormat::Json, SnapshotFormat::Protobuf] {
            let bytes = format.encode(&[]).unwrap();
            assert!(format.decode(&bytes).unwrap().is_empty());
        }
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(SnapshotFormat::Json.decode(b"[\"not a time\"]").is_err());
        assert!(SnapshotFormat::Protobuf.decode(&[0x0a, 0xff]).is_err());
    }
}
