pub mod api;
pub mod app;
pub mod atomic;
pub mod clock;
pub mod config;
pub mod counter;
pub mod humanize;
pub mod journal;
pub mod observability;
pub mod snapshot;
pub mod task;
pub mod vacuum;
