//! Plant catalog: the module set a registry is built from.
//!
//! The built-in catalog is the reference plant. A catalog can also be
//! deserialized from JSON; either way it passes [`Catalog::validate`] before a
//! registry exists, so naming mistakes fail at startup rather than mid-run.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Category, CategoryState, Module, Status, Telemetry};

/// Upper bound accepted for turbine speed in a loaded catalog.
pub const MAX_RPM: i64 = 1_000_000;
/// Upper bound accepted for cooling tower flow in a loaded catalog.
pub const MAX_FLOW_RATE_GPM: i64 = 1_000_000_000;

/// Modules permanently left out of every tick.
pub const DEFAULT_TICK_EXCLUDED: [&str; 2] = ["Fire Safety System", "Cooling Safety Backup"];

fn default_tick_excluded() -> Vec<String> {
    DEFAULT_TICK_EXCLUDED.iter().map(ToString::to_string).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub categories: Vec<CategoryState>,
    #[serde(default = "default_tick_excluded")]
    pub tick_excluded: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    Read { path: String, reason: String },
    Parse { reason: String },
    DuplicateCategory { category: Category },
    DuplicateModule { name: String },
    IdentifierCollision { identifier: String, first: String, second: String },
    UnknownExcludedModule { name: String },
    InconsistentModule { name: String, reason: String },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Read { path, reason } => {
                write!(f, "cannot read catalog '{path}': {reason}")
            }
            CatalogError::Parse { reason } => write!(f, "invalid catalog: {reason}"),
            CatalogError::DuplicateCategory { category } => {
                write!(f, "category '{category}' is listed more than once")
            }
            CatalogError::DuplicateModule { name } => {
                write!(f, "module name '{name}' is used more than once")
            }
            CatalogError::IdentifierCollision {
                identifier,
                first,
                second,
            } => write!(
                f,
                "modules '{first}' and '{second}' share identifier '{identifier}'"
            ),
            CatalogError::UnknownExcludedModule { name } => {
                write!(f, "tick exclusion list names unknown module '{name}'")
            }
            CatalogError::InconsistentModule { name, reason } => {
                write!(f, "module '{name}' is inconsistent: {reason}")
            }
        }
    }
}

impl std::error::Error for CatalogError {}

impl Catalog {
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        serde_json::from_str(json).map_err(|err| CatalogError::Parse {
            reason: err.to_string(),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|err| CatalogError::Read {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        Self::from_json(&json)
    }

    pub fn module_count(&self) -> usize {
        self.categories.iter().map(|c| c.modules.len()).sum()
    }

    /// Checks every invariant the registry relies on.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen_categories: HashSet<Category> = HashSet::new();
        let mut names: HashSet<&str> = HashSet::new();
        let mut identifiers: HashMap<String, &str> = HashMap::new();

        for group in &self.categories {
            if !seen_categories.insert(group.category) {
                return Err(CatalogError::DuplicateCategory {
                    category: group.category,
                });
            }
            for module in &group.modules {
                if !names.insert(module.name.as_str()) {
                    return Err(CatalogError::DuplicateModule {
                        name: module.name.clone(),
                    });
                }
                let identifier = module.identifier();
                if let Some(first) = identifiers.get(&identifier) {
                    return Err(CatalogError::IdentifierCollision {
                        identifier,
                        first: (*first).to_string(),
                        second: module.name.clone(),
                    });
                }
                identifiers.insert(identifier, module.name.as_str());
                check_module(module)?;
            }
        }

        for name in &self.tick_excluded {
            if !names.contains(name.as_str()) {
                return Err(CatalogError::UnknownExcludedModule { name: name.clone() });
            }
        }
        Ok(())
    }

    /// The reference plant: three reactors with their turbines, boilers and
    /// cooling towers, the safety systems and the compliance units.
    pub fn default_plant() -> Self {
        let operation = vec![
            reactor("Reactor 1", Status::Online, 950.0, 320.0),
            reactor("Reactor 2", Status::Online, 945.0, 318.0),
            reactor("Reactor 3", Status::Standby, 0.0, 45.0),
            Module::new("Turbine 1", Status::Online, Telemetry::Turbine { rpm: 1800 }),
            Module::new("Turbine 2", Status::Online, Telemetry::Turbine { rpm: 1800 }),
            boiler("Boiler 1", 2200.0, 350.0),
            boiler("Boiler 2", 2205.0, 352.0),
            cooling_tower("Cooling Tower 1", 28.0),
            cooling_tower("Cooling Tower 2", 29.0),
        ];
        let safety = vec![
            Module::new("Safety Gen 1", Status::Standby, Telemetry::Auxiliary)
                .with_detail("fuel_level", "100%")
                .with_detail("last_test", "2025-08-25"),
            Module::new("Safety Gen 2", Status::Standby, Telemetry::Auxiliary)
                .with_detail("fuel_level", "100%")
                .with_detail("last_test", "2025-08-25"),
            Module::new("Fire Safety System", Status::Active, Telemetry::Auxiliary)
                .with_detail("pressure", "Normal")
                .with_detail("alarms", "0"),
            Module::new("Cooling Safety Backup", Status::Ready, Telemetry::Auxiliary)
                .with_detail("reservoir_level", "Full"),
        ];
        let environmental = vec![
            Module::new("Emission Control Unit 1", Status::Active, Telemetry::Auxiliary)
                .with_detail("filter_status", "OK"),
            Module::new("Emission Control Unit 2", Status::Active, Telemetry::Auxiliary)
                .with_detail("filter_status", "OK"),
            Module::new("Waste Treatment Plant", Status::Operational, Telemetry::Auxiliary)
                .with_detail("processing_load", "75%"),
            Module::new("Water Recycling Unit", Status::Operational, Telemetry::Auxiliary)
                .with_detail("flow_rate", "High"),
        ];

        Self {
            categories: vec![
                CategoryState {
                    category: Category::Operation,
                    modules: operation,
                },
                CategoryState {
                    category: Category::Safety,
                    modules: safety,
                },
                CategoryState {
                    category: Category::EnvironmentalCompliance,
                    modules: environmental,
                },
            ],
            tick_excluded: default_tick_excluded(),
        }
    }
}

fn reactor(name: &str, status: Status, power_output_mw: f64, temp_c: f64) -> Module {
    Module::new(
        name,
        status,
        Telemetry::Reactor {
            power_output_mw,
            temp_c,
        },
    )
}

fn boiler(name: &str, pressure_psi: f64, temp_c: f64) -> Module {
    Module::new(
        name,
        Status::Online,
        Telemetry::Boiler {
            pressure_psi,
            temp_c,
        },
    )
}

fn cooling_tower(name: &str, water_temp_c: f64) -> Module {
    Module::new(
        name,
        Status::Active,
        Telemetry::CoolingTower {
            flow_rate_gpm: 500_000,
            water_temp_c,
        },
    )
}

fn check_module(module: &Module) -> Result<(), CatalogError> {
    let inconsistent = |reason: &str| CatalogError::InconsistentModule {
        name: module.name.clone(),
        reason: reason.to_string(),
    };
    if let Some(power) = module.telemetry.power_output_mw() {
        if !power.is_finite() || power < 0.0 {
            return Err(inconsistent("power output must be a non-negative number"));
        }
        if module.status == Status::Offline && power > 0.0 {
            return Err(inconsistent("offline with nonzero power output"));
        }
    }
    match module.telemetry {
        Telemetry::Reactor { temp_c, .. } if !temp_c.is_finite() => {
            Err(inconsistent("temperature must be finite"))
        }
        Telemetry::Boiler {
            pressure_psi,
            temp_c,
        } if !pressure_psi.is_finite() || !temp_c.is_finite() => {
            Err(inconsistent("pressure and temperature must be finite"))
        }
        Telemetry::Turbine { rpm } if !(0..=MAX_RPM).contains(&rpm) => Err(inconsistent(
            &format!("rpm must be between 0 and {MAX_RPM}"),
        )),
        Telemetry::CoolingTower {
            flow_rate_gpm,
            water_temp_c,
        } if !(0..=MAX_FLOW_RATE_GPM).contains(&flow_rate_gpm) || !water_temp_c.is_finite() => {
            Err(inconsistent(&format!(
                "flow rate must be between 0 and {MAX_FLOW_RATE_GPM} and water temperature finite"
            )))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_plant_is_valid() {
        let catalog = Catalog::default_plant();
        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.module_count(), 17);
    }

    #[test]
    fn duplicate_name_across_categories_is_rejected() {
        let mut catalog = Catalog::default_plant();
        catalog.categories[2]
            .modules
            .push(Module::new("Reactor 1", Status::Active, Telemetry::Auxiliary));
        assert_eq!(
            catalog.validate(),
            Err(CatalogError::DuplicateModule {
                name: "Reactor 1".to_string()
            })
        );
    }

    #[test]
    fn identifier_collision_is_rejected() {
        let mut catalog = Catalog::default_plant();
        catalog.categories[1]
            .modules
            .push(Module::new("reactor 1", Status::Active, Telemetry::Auxiliary));
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::IdentifierCollision { ref identifier, .. }) if identifier == "reactor_1"
        ));
    }

    #[test]
    fn unknown_excluded_module_is_rejected() {
        let mut catalog = Catalog::default_plant();
        catalog.tick_excluded.push("Ghost Module".to_string());
        assert_eq!(
            catalog.validate(),
            Err(CatalogError::UnknownExcludedModule {
                name: "Ghost Module".to_string()
            })
        );
    }

    #[test]
    fn offline_reactor_with_power_is_rejected() {
        let mut catalog = Catalog::default_plant();
        catalog.categories[0].modules[0].status = Status::Offline;
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::InconsistentModule { .. })
        ));
    }

    #[test]
    fn out_of_range_integer_telemetry_is_rejected() {
        let json = r#"{
            "categories": [
                {
                    "category": "Operation Module",
                    "modules": [
                        {"name": "Turbine 9", "status": "Online",
                         "telemetry": {"kind": "turbine", "rpm": 9223372036854775807}}
                    ]
                }
            ],
            "tick_excluded": []
        }"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::InconsistentModule { ref name, .. }) if name == "Turbine 9"
        ));

        let mut catalog = Catalog::default_plant();
        catalog.categories[0].modules[7].telemetry = Telemetry::CoolingTower {
            flow_rate_gpm: -1,
            water_temp_c: 28.0,
        };
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn non_finite_temperature_is_rejected() {
        let mut catalog = Catalog::default_plant();
        catalog.categories[0].modules[5].telemetry = Telemetry::Boiler {
            pressure_psi: 2200.0,
            temp_c: f64::NAN,
        };
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::InconsistentModule { ref name, .. }) if name == "Boiler 1"
        ));
    }

    #[test]
    fn json_catalog_defaults_exclusion_list() {
        let json = r#"{
            "categories": [
                {
                    "category": "Safety Module",
                    "modules": [
                        {"name": "Fire Safety System", "status": "Active", "telemetry": {"kind": "auxiliary"}},
                        {"name": "Cooling Safety Backup", "status": "Ready", "telemetry": {"kind": "auxiliary"}},
                        {"name": "Reactor 9", "status": "shutting_down",
                         "telemetry": {"kind": "reactor", "power_output_mw": 12.0, "temp_c": 300.0}}
                    ]
                }
            ]
        }"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.tick_excluded, default_tick_excluded());
        assert!(catalog.validate().is_ok());
        assert_eq!(
            catalog.categories[0].modules[2].status,
            Status::ShuttingDown
        );
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            Catalog::from_json("{\"categories\": 3}"),
            Err(CatalogError::Parse { .. })
        ));
    }
}
