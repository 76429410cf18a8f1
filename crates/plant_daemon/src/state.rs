use crate::reports::ReportHub;
use plant_core::Plant;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub type SharedPlant = Arc<Plant<ReportHub>>;

#[derive(Clone)]
pub struct AppState {
    pub plant: SharedPlant,
    pub paused: Arc<AtomicBool>,
    /// 0 when ticks are only driven through `POST /api/v1/tick`.
    pub ticks_per_sec: f64,
}
