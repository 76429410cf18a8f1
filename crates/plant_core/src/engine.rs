use chrono::{DateTime, Utc};
use rand::Rng;

use crate::{Module, PlantState, ReportRecord, Status, Telemetry};

/// Running-state jitter bounds, one per telemetry unit.
pub const POWER_JITTER_MW: f64 = 5.0;
pub const TEMP_JITTER_C: f64 = 0.5;
pub const RPM_JITTER: i64 = 5;
pub const PRESSURE_JITTER_PSI: f64 = 1.0;
pub const FLOW_JITTER_GPM: i64 = 100;
pub const WATER_TEMP_JITTER_C: f64 = 0.1;

/// Each shutdown tick keeps this fraction of power, minus a random bleed.
pub const SHUTDOWN_RETAIN_FRACTION: f64 = 0.8;
pub const SHUTDOWN_BLEED_MAX_MW: f64 = 20.0;
/// Temperature a power-bearing module settles at once offline.
pub const OFFLINE_TEMP_C: f64 = 25.0;

/// Startup ramps power by a random step until it reaches this level.
pub const STARTUP_TARGET_MW: f64 = 800.0;
pub const STARTUP_STEP_MIN_MW: f64 = 50.0;
pub const STARTUP_STEP_MAX_MW: f64 = 80.0;

/// Advance the plant by one tick.
///
/// Every eligible module is advanced in catalog order, then captured into a
/// report record stamped with the current tick and `timestamp`. Skipped
/// modules (compliance category, exclusion list) produce nothing.
///
/// Returns the records in emission order; the tick counter is incremented.
pub fn tick(
    state: &mut PlantState,
    rng: &mut impl Rng,
    timestamp: DateTime<Utc>,
) -> Vec<ReportRecord> {
    let current_tick = state.meta.tick;
    let mut records = Vec::new();

    for module in state.registry.eligible_modules_mut() {
        let before = module.status;
        advance_module(module, rng);
        if module.status != before {
            tracing::debug!(
                module = %module.name,
                from = %before,
                to = %module.status,
                tick = current_tick,
                "status transition"
            );
        }
        records.push(ReportRecord::capture(module, current_tick, timestamp));
    }

    state.meta.tick += 1;
    records
}

fn advance_module(module: &mut Module, rng: &mut impl Rng) {
    match module.status {
        Status::Online | Status::Active => fluctuate(&mut module.telemetry, rng),
        Status::ShuttingDown => wind_down(module, rng),
        Status::StartingUp => spin_up(module, rng),
        Status::Standby | Status::Offline | Status::Ready | Status::Operational => {}
    }
}

/// Independent symmetric jitter on every field the module carries.
fn fluctuate(telemetry: &mut Telemetry, rng: &mut impl Rng) {
    match telemetry {
        Telemetry::Reactor {
            power_output_mw,
            temp_c,
        } => {
            *power_output_mw =
                (*power_output_mw + rng.gen_range(-POWER_JITTER_MW..=POWER_JITTER_MW)).max(0.0);
            *temp_c += rng.gen_range(-TEMP_JITTER_C..=TEMP_JITTER_C);
        }
        Telemetry::Turbine { rpm } => {
            *rpm = rpm.saturating_add(rng.gen_range(-RPM_JITTER..=RPM_JITTER));
        }
        Telemetry::Boiler {
            pressure_psi,
            temp_c,
        } => {
            *pressure_psi += rng.gen_range(-PRESSURE_JITTER_PSI..=PRESSURE_JITTER_PSI);
            *temp_c += rng.gen_range(-TEMP_JITTER_C..=TEMP_JITTER_C);
        }
        Telemetry::CoolingTower {
            flow_rate_gpm,
            water_temp_c,
        } => {
            *flow_rate_gpm =
                flow_rate_gpm.saturating_add(rng.gen_range(-FLOW_JITTER_GPM..=FLOW_JITTER_GPM));
            *water_temp_c += rng.gen_range(-WATER_TEMP_JITTER_C..=WATER_TEMP_JITTER_C);
        }
        Telemetry::Auxiliary => {}
    }
}

/// Decays power toward zero; goes `Offline` on the first tick that starts
/// with no power left. A module without a power field counts as zero.
fn wind_down(module: &mut Module, rng: &mut impl Rng) {
    let power = module.telemetry.power_output_mw().unwrap_or(0.0);
    if power > 0.0 {
        let bleed = rng.gen_range(0.0..=SHUTDOWN_BLEED_MAX_MW);
        let decayed = (power * SHUTDOWN_RETAIN_FRACTION - bleed).max(0.0);
        module.telemetry.set_power_output_mw(decayed);
        return;
    }

    module.status = Status::Offline;
    match &mut module.telemetry {
        Telemetry::Reactor { temp_c, .. } | Telemetry::Boiler { temp_c, .. } => {
            *temp_c = OFFLINE_TEMP_C;
        }
        Telemetry::Turbine { rpm } => *rpm = 0,
        Telemetry::CoolingTower { .. } | Telemetry::Auxiliary => {}
    }
}

/// Ramps power up to [`STARTUP_TARGET_MW`], then goes `Online` on the
/// following tick. A module without a power field has nothing to ramp and
/// goes straight to `Active`.
fn spin_up(module: &mut Module, rng: &mut impl Rng) {
    match module.telemetry.power_output_mw() {
        Some(power) if power < STARTUP_TARGET_MW => {
            let step = rng.gen_range(STARTUP_STEP_MIN_MW..=STARTUP_STEP_MAX_MW);
            module.telemetry.set_power_output_mw(power + step);
        }
        Some(_) => module.status = Status::Online,
        None => module.status = Status::Active,
    }
}
