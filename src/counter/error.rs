use thiserror::Error;

use crate::journal::JournalError;

#[derive(Debug, Error)]
pub enum CounterError {
    #[error("Journal error: {0}")]
    Journal(#[from] JournalError),
}

pub type Result<T> = std::result::Result<T, CounterError>;
