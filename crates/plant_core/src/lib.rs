//! `plant_core` — plant simulation tick, operator commands and report hand-off.
//!
//! No network. All randomness via the passed-in Rng; reports leave through a
//! [`ReportSink`].

mod catalog;
mod commands;
mod engine;
mod plant;
mod registry;
mod sink;
mod types;

pub use catalog::{Catalog, CatalogError, DEFAULT_TICK_EXCLUDED, MAX_FLOW_RATE_GPM, MAX_RPM};
pub use commands::{apply_action, transition, ActionOutcome};
pub use engine::{
    tick, FLOW_JITTER_GPM, OFFLINE_TEMP_C, POWER_JITTER_MW, PRESSURE_JITTER_PSI, RPM_JITTER,
    SHUTDOWN_BLEED_MAX_MW, SHUTDOWN_RETAIN_FRACTION, STARTUP_STEP_MAX_MW, STARTUP_STEP_MIN_MW,
    STARTUP_TARGET_MW, TEMP_JITTER_C, WATER_TEMP_JITTER_C,
};
pub use plant::Plant;
pub use registry::Registry;
pub use sink::{MemorySink, ReportSink, SinkError};
pub use types::*;

#[cfg(any(test, feature = "test-support"))]
pub mod test_fixtures;

#[cfg(test)]
mod tests;
