use thiserror::Error;

use crate::counter::proto::TimestampOutOfRange;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Protobuf decode error: {0}")]
    ProtobufDecode(#[from] prost::DecodeError),

    #[error(transparent)]
    TimestampOutOfRange(#[from] TimestampOutOfRange),
}

pub type Result<T> = std::result::Result<T, SnapshotError>;
