//! Named, typed section registries.
//!
//! A bundle keeps one [`SectionRegistry`] per value type. Lookups by name are
//! get-or-create: asking for a section that does not exist yet creates an
//! empty, unallocated one and registers it.

use std::collections::{BTreeMap, BTreeSet};

use crate::data::section::Section;

/// Map from section name to section, creating entries on first use.
#[derive(Clone, Debug)]
pub struct SectionRegistry<V> {
    kind: &'static str,
    sections: BTreeMap<String, Section<V>>,
}

impl<V: Clone + Default> SectionRegistry<V> {
    /// `kind` names the value type in diagnostics ("real", "int", "pair").
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            sections: BTreeMap::new(),
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// The section called `name`, created empty if absent.
    pub fn get_or_create(&mut self, name: &str, debug: i32) -> &mut Section<V> {
        if !self.sections.contains_key(name) {
            if debug > 0 {
                log::debug!("Creating new {} section: {name}", self.kind);
            }
            self.sections.insert(name.to_string(), Section::new());
        }
        self.sections.entry(name.to_string()).or_default()
    }

    pub fn get(&self, name: &str) -> Option<&Section<V>> {
        self.sections.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Section<V>> {
        self.sections.get_mut(name)
    }

    /// Register `section` under `name`, replacing any previous one.
    pub fn set(&mut self, name: &str, section: Section<V>) -> Option<Section<V>> {
        self.sections.insert(name.to_string(), section)
    }

    pub fn remove(&mut self, name: &str) -> Option<Section<V>> {
        self.sections.remove(name)
    }

    /// Names of all registered sections.
    pub fn names(&self) -> BTreeSet<String> {
        self.sections.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Section<V>)> + '_ {
        self.sections.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::point::PointId;

    #[test]
    fn get_or_create_is_idempotent() {
        let mut reg = SectionRegistry::<f64>::new("real");
        assert!(!reg.has("u"));
        reg.get_or_create("u", 1)
            .set_fiber_dimension(0, PointId::new(1), 2)
            .unwrap();
        assert!(reg.has("u"));
        let again = reg.get_or_create("u", 1);
        assert_eq!(again.fiber_dimension(0, PointId::new(1)), Some(2));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.names().into_iter().collect::<Vec<_>>(), vec!["u".to_string()]);
    }

    #[test]
    fn set_replaces_and_remove_drops() {
        let mut reg = SectionRegistry::<i32>::new("int");
        reg.get_or_create("a", 0);
        let mut fresh = Section::new();
        fresh.set_fiber_dimension(0, PointId::new(3), 1).unwrap();
        assert!(reg.set("a", fresh).is_some());
        assert!(reg.get("a").is_some_and(|s| s.contains(0, PointId::new(3))));
        assert!(reg.remove("a").is_some());
        assert!(reg.is_empty());
    }
}
