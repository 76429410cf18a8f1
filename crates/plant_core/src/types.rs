//! Type definitions for `plant_core`.
//!
//! Categories, statuses, per-kind telemetry, modules and report records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Operation Module")]
    Operation,
    #[serde(rename = "Safety Module")]
    Safety,
    #[serde(rename = "Environmental & Compliance Module")]
    EnvironmentalCompliance,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Operation,
        Category::Safety,
        Category::EnvironmentalCompliance,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Operation => "Operation Module",
            Category::Safety => "Safety Module",
            Category::EnvironmentalCompliance => "Environmental & Compliance Module",
        }
    }

    /// Environmental & Compliance modules are never advanced by the tick.
    pub fn is_ticked(self) -> bool {
        !matches!(self, Category::EnvironmentalCompliance)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Status & actions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Online,
    Active,
    Standby,
    Offline,
    Ready,
    Operational,
    #[serde(rename = "shutting_down")]
    ShuttingDown,
    #[serde(rename = "starting_up")]
    StartingUp,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Online => "Online",
            Status::Active => "Active",
            Status::Standby => "Standby",
            Status::Offline => "Offline",
            Status::Ready => "Ready",
            Status::Operational => "Operational",
            Status::ShuttingDown => "shutting_down",
            Status::StartingUp => "starting_up",
        }
    }

    /// `Online` or `Active`: telemetry fluctuates and `stop` is accepted.
    pub fn is_running(self) -> bool {
        matches!(self, Status::Online | Status::Active)
    }

    pub fn is_transient(self) -> bool {
        matches!(self, Status::ShuttingDown | Status::StartingUp)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Operator command verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Start,
    Stop,
}

impl Action {
    /// Exact, case-sensitive match on the wire verb.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "start" => Some(Action::Start),
            "stop" => Some(Action::Stop),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Stop => "stop",
        }
    }

    /// Verb used in operator-facing outcome messages.
    pub fn progressive(self) -> &'static str {
        match self {
            Action::Start => "starting",
            Action::Stop => "stopping",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Telemetry
// ---------------------------------------------------------------------------

/// Numeric fields carried by a module. The variant fixes which fields exist;
/// the engine only ever rewrites values inside the variant it was built with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Telemetry {
    Reactor { power_output_mw: f64, temp_c: f64 },
    Turbine { rpm: i64 },
    Boiler { pressure_psi: f64, temp_c: f64 },
    CoolingTower { flow_rate_gpm: i64, water_temp_c: f64 },
    /// No numeric telemetry (generators, safety and compliance units).
    Auxiliary,
}

impl Telemetry {
    pub fn power_output_mw(&self) -> Option<f64> {
        match self {
            Telemetry::Reactor {
                power_output_mw, ..
            } => Some(*power_output_mw),
            _ => None,
        }
    }

    pub fn temp_c(&self) -> Option<f64> {
        match self {
            Telemetry::Reactor { temp_c, .. } | Telemetry::Boiler { temp_c, .. } => Some(*temp_c),
            _ => None,
        }
    }

    pub fn rpm(&self) -> Option<i64> {
        match self {
            Telemetry::Turbine { rpm } => Some(*rpm),
            _ => None,
        }
    }

    /// Modules with a power output ramp through `starting_up`/`shutting_down`
    /// instead of switching state immediately.
    pub fn is_power_bearing(&self) -> bool {
        matches!(self, Telemetry::Reactor { .. })
    }

    /// Overwrite the power output. No-op on kinds without the field.
    pub(crate) fn set_power_output_mw(&mut self, value: f64) {
        if let Telemetry::Reactor {
            power_output_mw, ..
        } = self
        {
            *power_output_mw = value;
        }
    }
}

// ---------------------------------------------------------------------------
// Modules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub status: Status,
    pub telemetry: Telemetry,
    /// Static descriptive fields (`fuel_level`, `last_test`, ...). Never
    /// touched by the engine.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
}

impl Module {
    pub fn new(name: impl Into<String>, status: Status, telemetry: Telemetry) -> Self {
        Self {
            name: name.into(),
            status,
            telemetry,
            details: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_detail(mut self, key: &str, value: &str) -> Self {
        self.details.insert(key.to_string(), value.to_string());
        self
    }

    /// External identifier used for command dispatch.
    pub fn identifier(&self) -> String {
        module_identifier(&self.name)
    }
}

/// Character substituted for spaces when deriving module identifiers.
pub const IDENTIFIER_JOIN: char = '_';

/// `"Reactor 1"` -> `"reactor_1"`. Lossy: distinct names can collide, which
/// the catalog validator rejects.
pub fn module_identifier(name: &str) -> String {
    name.to_lowercase().replace(' ', &IDENTIFIER_JOIN.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryState {
    pub category: Category,
    pub modules: Vec<Module>,
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// One module's post-update state for one tick. Handed to the sink by value
/// and never read back by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub tick: u64,
    pub module_name: String,
    pub status: Status,
    pub power_output_mw: Option<f64>,
    pub temperature_c: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl ReportRecord {
    pub fn capture(module: &Module, tick: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            tick,
            module_name: module.name.clone(),
            status: module.status,
            power_output_mw: module.telemetry.power_output_mw(),
            temperature_c: module.telemetry.temp_c(),
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickSummary {
    /// Tick number the records were stamped with.
    pub tick: u64,
    pub records_emitted: usize,
}

// ---------------------------------------------------------------------------
// Plant state
// ---------------------------------------------------------------------------

/// Everything a tick reads and writes. Cloning it yields a fully independent
/// copy, which is what snapshots hand out.
#[derive(Debug, Clone, Serialize)]
pub struct PlantState {
    pub meta: MetaState,
    pub registry: crate::Registry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaState {
    /// Number of ticks advanced so far.
    pub tick: u64,
    pub seed: u64,
}

impl PlantState {
    pub fn new(registry: crate::Registry, seed: u64) -> Self {
        Self {
            meta: MetaState { tick: 0, seed },
            registry,
        }
    }
}
