//! Point label storage for topology metadata.
//!
//! A [`Label`] is a named partial map `PointId → i32` marker, used for boundary
//! markers and similar integer annotations. Labels live per patch in a
//! [`LabelSet`] and must be created before values are written.

use std::collections::{BTreeMap, HashMap};

use crate::topology::point::PointId;

/// One named label: a partial map from points to integer markers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Label {
    values: HashMap<PointId, i32>,
}

impl Label {
    /// Assigns `marker` to `point`, returning the previous marker, if any.
    pub fn set_value(&mut self, point: PointId, marker: i32) -> Option<i32> {
        self.values.insert(point, marker)
    }

    /// Marker of `point`, if labelled.
    pub fn value(&self, point: PointId) -> Option<i32> {
        self.values.get(&point).copied()
    }

    /// All points with `marker`, sorted by point id.
    pub fn stratum(&self, marker: i32) -> Vec<PointId> {
        let mut points: Vec<_> = self
            .values
            .iter()
            .filter_map(|(&p, &v)| (v == marker).then_some(p))
            .collect();
        points.sort_unstable();
        points
    }

    /// Distinct markers present, ascending.
    pub fn markers(&self) -> Vec<i32> {
        let mut values: Vec<i32> = self.values.values().copied().collect();
        values.sort_unstable();
        values.dedup();
        values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Labelled points with their markers, sorted by point id.
    pub fn iter_sorted(&self) -> Vec<(PointId, i32)> {
        let mut all: Vec<_> = self.values.iter().map(|(&p, &v)| (p, v)).collect();
        all.sort_unstable();
        all
    }
}

/// Named labels of one patch.
#[derive(Clone, Debug, Default)]
pub struct LabelSet {
    labels: BTreeMap<String, Label>,
}

impl LabelSet {
    /// Creates an empty label set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates label `name` if absent and returns it.
    pub fn create(&mut self, name: &str) -> &mut Label {
        self.labels.entry(name.to_string()).or_default()
    }

    pub fn get(&self, name: &str) -> Option<&Label> {
        self.labels.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Label> {
        self.labels.get_mut(name)
    }

    /// Points with label `name == marker` in deterministic order; empty for unknown labels.
    pub fn stratum_points(&self, name: &str, marker: i32) -> Vec<PointId> {
        self.labels
            .get(name)
            .map_or_else(Vec::new, |l| l.stratum(marker))
    }

    /// Label names, ascending.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.labels.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Label)> + '_ {
        self.labels.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns true when no label has been created.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
