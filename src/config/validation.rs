use super::models::{Config, DurabilityStrategy, VacuumMode};
use crate::humanize::HumanDuration;
use crate::task::MAX_PERIOD;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Duration must be positive: {field} = {value}")]
    ZeroDuration { field: &'static str, value: HumanDuration },

    #[error("Period too long: {field} = {value} (at most 8760h)")]
    PeriodTooLong { field: &'static str, value: HumanDuration },

    #[error("journal.buffer_capacity must be positive")]
    ZeroBufferCapacity,

    #[error("journal.path and snapshot.path must differ: {path}")]
    SharedPath { path: String },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_window(config)?;
    validate_journal(config)?;
    validate_snapshot(config)?;
    validate_paths(config)?;
    Ok(())
}

fn require_positive(field: &'static str, value: HumanDuration) -> Result<(), ValidationError> {
    if value.is_zero() {
        return Err(ValidationError::ZeroDuration { field, value });
    }
    Ok(())
}

/// Ticker periods must be positive and no longer than [`MAX_PERIOD`]
fn require_period(field: &'static str, value: HumanDuration) -> Result<(), ValidationError> {
    require_positive(field, value)?;
    if value.as_duration() > MAX_PERIOD {
        return Err(ValidationError::PeriodTooLong { field, value });
    }
    Ok(())
}

fn validate_window(config: &Config) -> Result<(), ValidationError> {
    require_positive("window.length", config.window.length)?;

    if config.window.vacuum == VacuumMode::Periodic {
        require_period("window.vacuum_period", config.window.vacuum_period)?;
    }

    Ok(())
}

fn validate_journal(config: &Config) -> Result<(), ValidationError> {
    require_period("journal.flush_interval", config.journal.flush_interval)?;

    if config.journal.buffer_capacity.as_u64() == 0 {
        return Err(ValidationError::ZeroBufferCapacity);
    }

    Ok(())
}

fn validate_snapshot(config: &Config) -> Result<(), ValidationError> {
    require_period("snapshot.interval", config.snapshot.interval)
}

/// A snapshot rename over the journal would destroy it
fn validate_paths(config: &Config) -> Result<(), ValidationError> {
    if config.durability.strategy != DurabilityStrategy::None
        && config.journal.path == config.snapshot.path
    {
        return Err(ValidationError::SharedPath {
            path: config.journal.path.display().to_string(),
        });
    }

    Ok(())
}
