use super::*;
use crate::test_fixtures::{
    base_state, fixed_timestamp, make_rng, module, set_power, set_status, FailingSink,
};

mod plant;

// --- Shared test helpers ------------------------------------------------

fn run_ticks(state: &mut PlantState, rng: &mut impl rand::Rng, count: usize) -> Vec<ReportRecord> {
    let mut records = Vec::new();
    for _ in 0..count {
        records.extend(tick(state, rng, fixed_timestamp()));
    }
    records
}

fn power(state: &PlantState, name: &str) -> f64 {
    module(state, name)
        .telemetry
        .power_output_mw()
        .unwrap_or_else(|| panic!("'{name}' has no power output"))
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
