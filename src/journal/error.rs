use std::path::PathBuf;

use thiserror::Error;

use crate::counter::proto::TimestampOutOfRange;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record encode error: {0}")]
    Encode(#[from] prost::EncodeError),

    #[error("Record decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error(transparent)]
    TimestampOutOfRange(#[from] TimestampOutOfRange),

    #[error("Journal {} is damaged at byte {offset}: {reason}", path.display())]
    Damaged {
        path: PathBuf,
        offset: u64,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, JournalError>;
