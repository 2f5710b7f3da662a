//! Configuration for Callboard.

mod settings;

pub use settings::{Config, SchedulingConfig};
