use chrono::Utc;
use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::commands::ActionOutcome;
use crate::{Catalog, CatalogError, PlantState, Registry, ReportSink, SinkError, TickSummary};

struct SimState {
    state: PlantState,
    rng: ChaCha8Rng,
}

/// Shared handle over the live plant.
///
/// One lock guards the whole state, so each tick pass, each command and each
/// snapshot sees or produces a consistent plant. Ticks emit their records
/// to the sink while still holding the lock, which keeps report order equal
/// to tick order.
pub struct Plant<S> {
    sim: Mutex<SimState>,
    sink: S,
}

impl<S: ReportSink> Plant<S> {
    pub fn new(registry: Registry, seed: u64, sink: S) -> Self {
        Self {
            sim: Mutex::new(SimState {
                state: PlantState::new(registry, seed),
                rng: ChaCha8Rng::seed_from_u64(seed),
            }),
            sink,
        }
    }

    pub fn from_catalog(catalog: Catalog, seed: u64, sink: S) -> Result<Self, CatalogError> {
        Ok(Self::new(Registry::from_catalog(catalog)?, seed, sink))
    }

    /// Deep copy of the current state.
    pub fn snapshot(&self) -> PlantState {
        self.sim.lock().state.clone()
    }

    pub fn tick_count(&self) -> u64 {
        self.sim.lock().state.meta.tick
    }

    pub fn seed(&self) -> u64 {
        self.sim.lock().state.meta.seed
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Advance one tick and hand every record to the sink.
    ///
    /// A sink failure is returned to the caller and stops delivery of the
    /// remaining records of this tick. The state change itself stays applied.
    pub fn tick(&self) -> Result<TickSummary, SinkError> {
        let mut sim = self.sim.lock();
        let SimState { state, rng } = &mut *sim;
        let tick = state.meta.tick;
        let records = crate::tick(state, rng, Utc::now());
        let records_emitted = records.len();

        for record in records {
            if let Err(err) = self.sink.append(record) {
                tracing::warn!(tick, %err, "report sink rejected a record");
                return Err(err);
            }
        }

        tracing::trace!(tick, records_emitted, "tick committed");
        Ok(TickSummary {
            tick,
            records_emitted,
        })
    }

    /// Apply an operator command; see [`crate::apply_action`].
    pub fn apply_action(&self, identifier: &str, action: &str) -> ActionOutcome {
        let outcome = crate::apply_action(&mut self.sim.lock().state, identifier, action);
        if outcome.applied {
            tracing::info!(identifier, action, "{}", outcome.message);
        } else {
            tracing::debug!(identifier, action, "{}", outcome.message);
        }
        outcome
    }
}
