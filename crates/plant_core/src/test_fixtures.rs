//! Shared test fixtures for `plant_core` and downstream crates.
//!
//! `base_state()` is the reference plant at tick 0. The setters reach into
//! the registry directly so tests can stage states the operator commands
//! would take many ticks to produce.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    Catalog, Module, PlantState, Registry, ReportRecord, ReportSink, SinkError, Status, Telemetry,
};

pub fn base_registry() -> Registry {
    Registry::from_catalog(Catalog::default_plant()).expect("default catalog is valid")
}

pub fn base_state() -> PlantState {
    PlantState::new(base_registry(), 0)
}

pub fn make_rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(42)
}

pub fn fixed_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 25, 12, 0, 0).unwrap()
}

pub fn module<'a>(state: &'a PlantState, name: &str) -> &'a Module {
    state
        .registry
        .get(name)
        .unwrap_or_else(|| panic!("no module named '{name}'"))
}

pub fn set_status(state: &mut PlantState, name: &str, status: Status) {
    state
        .registry
        .get_mut(name)
        .unwrap_or_else(|| panic!("no module named '{name}'"))
        .status = status;
}

/// Set a reactor's power output, keeping its temperature.
pub fn set_power(state: &mut PlantState, name: &str, power_output_mw: f64) {
    let module = state
        .registry
        .get_mut(name)
        .unwrap_or_else(|| panic!("no module named '{name}'"));
    assert!(
        matches!(module.telemetry, Telemetry::Reactor { .. }),
        "'{name}' has no power output"
    );
    module.telemetry.set_power_output_mw(power_output_mw);
}

/// Sink that accepts the first `accept` records and fails every one after.
#[derive(Debug, Default)]
pub struct FailingSink {
    accept: usize,
    seen: AtomicUsize,
}

impl FailingSink {
    pub fn always() -> Self {
        Self::after(0)
    }

    pub fn after(accept: usize) -> Self {
        Self {
            accept,
            seen: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.seen.load(Ordering::SeqCst)
    }
}

impl ReportSink for FailingSink {
    fn append(&self, _record: ReportRecord) -> Result<(), SinkError> {
        let seen = self.seen.fetch_add(1, Ordering::SeqCst);
        if seen < self.accept {
            Ok(())
        } else {
            Err(SinkError::Unavailable {
                reason: "store offline".to_string(),
            })
        }
    }
}
