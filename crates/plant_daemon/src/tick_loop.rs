use crate::state::SharedPlant;
use plant_core::TickSummary;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Interval between timer ticks, or `None` when the timer is disabled.
pub fn tick_period(ticks_per_sec: f64) -> anyhow::Result<Option<Duration>> {
    anyhow::ensure!(
        ticks_per_sec >= 0.0 && ticks_per_sec.is_finite(),
        "--ticks-per-sec must be a non-negative number, got {ticks_per_sec}"
    );
    if ticks_per_sec <= 0.0 {
        return Ok(None);
    }
    let period = Duration::try_from_secs_f64(1.0 / ticks_per_sec)
        .map_err(|err| anyhow::anyhow!("--ticks-per-sec {ticks_per_sec} is too small: {err}"))?;
    anyhow::ensure!(
        !period.is_zero(),
        "--ticks-per-sec {ticks_per_sec} is too large"
    );
    Ok(Some(period))
}

/// Run one tick off the async runtime. The sink may block on disk while the
/// plant lock is held.
pub async fn tick_blocking(plant: SharedPlant) -> anyhow::Result<TickSummary> {
    let summary = tokio::task::spawn_blocking(move || plant.tick()).await??;
    Ok(summary)
}

/// Tick the plant every `period` until `max_ticks` is reached.
///
/// Sink failures are logged and the loop keeps going; the plant state has
/// already advanced.
pub async fn run_tick_loop(
    plant: SharedPlant,
    paused: Arc<AtomicBool>,
    period: Duration,
    max_ticks: Option<u64>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        if paused.load(Ordering::Relaxed) {
            continue;
        }

        if let Err(err) = tick_blocking(plant.clone()).await {
            tracing::error!(%err, tick = plant.tick_count(), "tick reports not recorded");
        }

        if max_ticks.is_some_and(|max| plant.tick_count() >= max) {
            tracing::info!(ticks = plant.tick_count(), "tick limit reached, stopping loop");
            break;
        }
    }
}
