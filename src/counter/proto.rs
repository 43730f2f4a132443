//! `google.protobuf.Timestamp` conversions shared by the journal and the
//! protobuf snapshot format

use chrono::DateTime;
use prost_types::Timestamp;
use thiserror::Error;

use super::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Timestamp out of range: {seconds}s {nanos}ns")]
pub struct TimestampOutOfRange {
    pub seconds: i64,
    pub nanos: i32,
}

pub fn to_timestamp(at: &Event) -> Timestamp {
    Timestamp {
        seconds: at.timestamp(),
        nanos: at.timestamp_subsec_nanos() as i32,
    }
}

pub fn from_timestamp(ts: &Timestamp) -> Result<Event, TimestampOutOfRange> {
    u32::try_from(ts.nanos)
        .ok()
        .and_then(|nanos| DateTime::from_timestamp(ts.seconds, nanos))
        .ok_or(TimestampOutOfRange {
            seconds: ts.seconds,
            nanos: ts.nanos,
        })
}
