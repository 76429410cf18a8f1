use ahash::AHashMap;
use serde::Serialize;

use crate::{Catalog, CatalogError, Category, CategoryState, Module};

/// Canonical module set, grouped by category.
///
/// Built once from a validated [`Catalog`]. Modules can change status and
/// telemetry values but are never added, removed or moved between categories.
#[derive(Debug, Clone, Serialize)]
pub struct Registry {
    categories: Vec<CategoryState>,
    tick_excluded: Vec<String>,
    /// name -> (category slot, module slot)
    #[serde(skip)]
    index: AHashMap<String, (usize, usize)>,
}

impl Registry {
    pub fn from_catalog(catalog: Catalog) -> Result<Self, CatalogError> {
        catalog.validate()?;
        let Catalog {
            categories,
            tick_excluded,
        } = catalog;

        let mut index = AHashMap::with_capacity(categories.iter().map(|c| c.modules.len()).sum());
        for (group_slot, group) in categories.iter().enumerate() {
            for (module_slot, module) in group.modules.iter().enumerate() {
                index.insert(module.name.clone(), (group_slot, module_slot));
            }
        }

        Ok(Self {
            categories,
            tick_excluded,
            index,
        })
    }

    pub fn categories(&self) -> &[CategoryState] {
        &self.categories
    }

    pub fn tick_excluded(&self) -> &[String] {
        &self.tick_excluded
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Exact-name lookup.
    pub fn get(&self, name: &str) -> Option<&Module> {
        let &(group_slot, module_slot) = self.index.get(name)?;
        Some(&self.categories[group_slot].modules[module_slot])
    }

    #[cfg(any(test, feature = "test-support"))]
    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Module> {
        let &(group_slot, module_slot) = self.index.get(name)?;
        Some(&mut self.categories[group_slot].modules[module_slot])
    }

    pub fn category_of(&self, name: &str) -> Option<Category> {
        let &(group_slot, _) = self.index.get(name)?;
        Some(self.categories[group_slot].category)
    }

    /// All modules in catalog order, paired with their category.
    pub fn modules(&self) -> impl Iterator<Item = (Category, &Module)> + '_ {
        self.categories
            .iter()
            .flat_map(|group| group.modules.iter().map(move |m| (group.category, m)))
    }

    pub fn module_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.modules().map(|(_, module)| module.name.as_str())
    }

    /// Scans categories in order; first module whose derived identifier
    /// matches wins.
    pub fn find_by_identifier(&self, identifier: &str) -> Option<&Module> {
        self.modules()
            .map(|(_, module)| module)
            .find(|module| module.identifier() == identifier)
    }

    pub(crate) fn find_by_identifier_mut(&mut self, identifier: &str) -> Option<&mut Module> {
        self.categories
            .iter_mut()
            .flat_map(|group| group.modules.iter_mut())
            .find(|module| module.identifier() == identifier)
    }

    pub fn is_tick_excluded(&self, name: &str) -> bool {
        self.tick_excluded.iter().any(|excluded| excluded == name)
    }

    /// Whether the tick advances this module: its category is ticked and it
    /// is not on the exclusion list.
    pub fn is_eligible(&self, name: &str) -> bool {
        self.category_of(name)
            .is_some_and(|category| category.is_ticked() && !self.is_tick_excluded(name))
    }

    pub fn eligible_count(&self) -> usize {
        self.module_names()
            .filter(|name| self.is_eligible(name))
            .count()
    }

    /// Mutable access to every eligible module, in catalog order.
    pub(crate) fn eligible_modules_mut(&mut self) -> impl Iterator<Item = &mut Module> + '_ {
        let excluded = &self.tick_excluded;
        self.categories
            .iter_mut()
            .filter(|group| group.category.is_ticked())
            .flat_map(|group| group.modules.iter_mut())
            .filter(move |module| !excluded.iter().any(|name| *name == module.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Status, Telemetry};

    fn registry() -> Registry {
        Registry::from_catalog(Catalog::default_plant()).unwrap()
    }

    #[test]
    fn lookup_by_exact_name() {
        let registry = registry();
        let reactor = registry.get("Reactor 1").unwrap();
        assert_eq!(reactor.status, Status::Online);
        assert!(registry.get("reactor 1").is_none());
        assert_eq!(
            registry.category_of("Safety Gen 2"),
            Some(Category::Safety)
        );
    }

    #[test]
    fn names_listed_in_catalog_order() {
        let registry = registry();
        let names: Vec<&str> = registry.module_names().collect();
        assert_eq!(names.len(), 17);
        assert_eq!(names[0], "Reactor 1");
        assert_eq!(names[16], "Water Recycling Unit");
    }

    #[test]
    fn identifier_lookup_matches_lowercased_joined_name() {
        let registry = registry();
        let module = registry.find_by_identifier("cooling_tower_2").unwrap();
        assert_eq!(module.name, "Cooling Tower 2");
        assert!(registry.find_by_identifier("Cooling Tower 2").is_none());
    }

    #[test]
    fn eligibility_skips_exclusions_and_compliance() {
        let registry = registry();
        assert!(registry.is_eligible("Reactor 3"));
        assert!(registry.is_eligible("Safety Gen 1"));
        assert!(!registry.is_eligible("Fire Safety System"));
        assert!(!registry.is_eligible("Cooling Safety Backup"));
        assert!(!registry.is_eligible("Emission Control Unit 1"));
        assert!(!registry.is_eligible("Nope"));
        // 9 operation modules + 2 safety generators
        assert_eq!(registry.eligible_count(), 11);
    }

    #[test]
    fn eligible_iteration_agrees_with_predicate() {
        let mut registry = registry();
        let names: Vec<String> = registry
            .eligible_modules_mut()
            .map(|module| module.name.clone())
            .collect();
        assert_eq!(names.len(), registry.eligible_count());
        assert!(names.iter().all(|name| registry.is_eligible(name)));
    }

    #[test]
    fn clone_is_independent() {
        let mut registry = registry();
        let copy = registry.clone();
        registry.get_mut("Reactor 1").unwrap().telemetry = Telemetry::Reactor {
            power_output_mw: 1.0,
            temp_c: 1.0,
        };
        assert_eq!(copy.get("Reactor 1").unwrap().telemetry.power_output_mw(), Some(950.0));
    }

    #[test]
    fn invalid_catalog_fails_construction() {
        let mut catalog = Catalog::default_plant();
        catalog.tick_excluded = vec!["Missing".to_string()];
        assert!(Registry::from_catalog(catalog).is_err());
    }
}
