//! Patched mesh topology: one sieve per patch plus strata, labels and overlaps.
//!
//! Arrows run from covering entities to what they cover (`cell → face → vertex`)
//! and carry an integer order key. Height and depth are only available after
//! [`Topology::stratify`]; any arrow insertion bumps the topology version and
//! makes them stale until the next `stratify()`.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::mesh_error::MeshError;
use crate::overlap::overlap::{Overlap, OverlapPair};
use crate::topology::cache::InvalidateCache;
use crate::topology::labels::{Label, LabelSet};
use crate::topology::point::{PatchId, PointId};
use crate::topology::sieve::{InMemorySieve, Sieve, StrataCache, compute_strata};

/// Order key carried by every arrow.
pub type ArrowOrder = i32;

/// Sieve storing one patch.
pub type PatchSieve = InMemorySieve<PointId, ArrowOrder>;

static NEXT_TOPOLOGY_ID: AtomicU64 = AtomicU64::new(1);

/// Incidence structure of a (possibly distributed) mesh.
#[derive(Debug)]
pub struct Topology {
    id: u64,
    debug: i32,
    version: u64,
    patches: BTreeMap<PatchId, PatchSieve>,
    strata: HashMap<PatchId, StrataCache<PointId>>,
    stratified_version: Option<u64>,
    labels: BTreeMap<PatchId, LabelSet>,
    label_version: u64,
    overlaps: OverlapPair,
}

impl Default for Topology {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Topology {
    /// Creates an empty topology with a process-unique identity.
    pub fn new(debug: i32) -> Self {
        Self {
            id: NEXT_TOPOLOGY_ID.fetch_add(1, Ordering::Relaxed),
            debug,
            version: 0,
            patches: BTreeMap::new(),
            strata: HashMap::new(),
            stratified_version: None,
            labels: BTreeMap::new(),
            label_version: 0,
            overlaps: OverlapPair::default(),
        }
    }

    /// Identity used to key derived data (numberings) computed for this topology.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Incremented on every structural mutation.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Incremented whenever a label is created or a marker is written.
    #[inline]
    pub fn label_version(&self) -> u64 {
        self.label_version
    }

    #[inline]
    pub fn debug(&self) -> i32 {
        self.debug
    }

    fn bump(&mut self) {
        self.version += 1;
        self.invalidate_cache();
    }

    // --- patches & arrows ---

    /// Ensures `patch` exists (possibly empty).
    pub fn create_patch(&mut self, patch: PatchId) -> &mut PatchSieve {
        if !self.patches.contains_key(&patch) {
            self.bump();
        }
        self.patches.entry(patch).or_default()
    }

    pub fn has_patch(&self, patch: PatchId) -> bool {
        self.patches.contains_key(&patch)
    }

    /// Patch ids, ascending.
    pub fn patches(&self) -> impl Iterator<Item = PatchId> + '_ {
        self.patches.keys().copied()
    }

    pub fn patch(&self, patch: PatchId) -> Result<&PatchSieve, MeshError> {
        self.patches
            .get(&patch)
            .ok_or(MeshError::UnknownPatch(patch))
    }

    /// Appends `source → target` with `order` to `patch`, creating the patch if needed.
    pub fn add_arrow(&mut self, patch: PatchId, source: PointId, target: PointId, order: ArrowOrder) {
        self.bump();
        self.patches
            .entry(patch)
            .or_default()
            .add_arrow(source, target, order);
    }

    /// Registers a point without arrows.
    pub fn add_point(&mut self, patch: PatchId, p: PointId) {
        let sieve = self.patches.entry(patch).or_default();
        if !sieve.contains(p) {
            sieve.add_point(p);
            self.bump();
        }
    }

    /// Points `p` covers, in arrow order. Empty for unknown patches or points.
    pub fn cone(&self, patch: PatchId, p: PointId) -> impl Iterator<Item = PointId> + '_ {
        self.patches
            .get(&patch)
            .into_iter()
            .flat_map(move |s| s.cone(p).map(|(q, _)| q))
    }

    /// Points covering `p`, in arrow order.
    pub fn support(&self, patch: PatchId, p: PointId) -> impl Iterator<Item = PointId> + '_ {
        self.patches
            .get(&patch)
            .into_iter()
            .flat_map(move |s| s.support(p).map(|(q, _)| q))
    }

    /// `p` and everything below it, breadth-first in arrow order.
    pub fn closure(&self, patch: PatchId, p: PointId) -> Result<Vec<PointId>, MeshError> {
        let sieve = self.patch(patch)?;
        if !sieve.contains(p) {
            return Err(MeshError::UnknownPoint { patch, point: p });
        }
        Ok(sieve.ordered_closure(p))
    }

    /// `p` and everything above it (unordered).
    pub fn star(&self, patch: PatchId, p: PointId) -> Result<Vec<PointId>, MeshError> {
        let sieve = self.patch(patch)?;
        if !sieve.contains(p) {
            return Err(MeshError::UnknownPoint { patch, point: p });
        }
        Ok(sieve.star([p]).collect())
    }

    // --- strata ---

    /// Computes height and depth for every patch. Idempotent on an unchanged topology.
    pub fn stratify(&mut self) -> Result<(), MeshError> {
        if self.is_stratified() {
            return Ok(());
        }
        let mut strata = HashMap::with_capacity(self.patches.len());
        for (&patch, sieve) in &self.patches {
            strata.insert(patch, compute_strata(sieve, patch)?);
        }
        self.strata = strata;
        self.stratified_version = Some(self.version);
        if self.debug > 0 {
            log::debug!(
                "Stratified topology {} (version {}) with {} patches",
                self.id,
                self.version,
                self.patches.len()
            );
        }
        Ok(())
    }

    /// Whether strata reflect the current arrows.
    pub fn is_stratified(&self) -> bool {
        self.stratified_version == Some(self.version)
    }

    /// Strata of `patch`; fails if stale or unknown.
    pub fn strata(&self, patch: PatchId) -> Result<&StrataCache<PointId>, MeshError> {
        if !self.patches.contains_key(&patch) {
            return Err(MeshError::UnknownPatch(patch));
        }
        if !self.is_stratified() {
            return Err(MeshError::StrataStale(patch));
        }
        self.strata.get(&patch).ok_or(MeshError::StrataStale(patch))
    }

    pub fn height(&self, patch: PatchId, p: PointId) -> Result<u32, MeshError> {
        self.strata(patch)?
            .height_of(p)
            .ok_or(MeshError::UnknownPoint { patch, point: p })
    }

    pub fn depth(&self, patch: PatchId, p: PointId) -> Result<u32, MeshError> {
        self.strata(patch)?
            .depth_of(p)
            .ok_or(MeshError::UnknownPoint { patch, point: p })
    }

    /// Points at height `h` in first-insertion order (cells at `h = 0`).
    pub fn height_stratum(&self, patch: PatchId, h: u32) -> Result<&[PointId], MeshError> {
        Ok(self.strata(patch)?.height_stratum(h))
    }

    /// Points at depth `d` in first-insertion order (vertices at `d = 0`).
    pub fn depth_stratum(&self, patch: PatchId, d: u32) -> Result<&[PointId], MeshError> {
        Ok(self.strata(patch)?.depth_stratum(d))
    }

    pub fn max_height(&self, patch: PatchId) -> Result<u32, MeshError> {
        Ok(self.strata(patch)?.diameter)
    }

    pub fn max_depth(&self, patch: PatchId) -> Result<u32, MeshError> {
        Ok(self.strata(patch)?.max_depth())
    }

    // --- labels ---

    /// Creates label `name` on `patch` if absent.
    pub fn create_label(&mut self, patch: PatchId, name: &str) {
        let set = self.labels.entry(patch).or_default();
        if set.get(name).is_none() {
            set.create(name);
            self.label_version += 1;
        }
    }

    pub fn label(&self, patch: PatchId, name: &str) -> Option<&Label> {
        self.labels.get(&patch).and_then(|l| l.get(name))
    }

    pub fn labels(&self, patch: PatchId) -> Option<&LabelSet> {
        self.labels.get(&patch)
    }

    /// Sets `point`'s marker in an existing label.
    pub fn set_value(
        &mut self,
        patch: PatchId,
        name: &str,
        point: PointId,
        marker: i32,
    ) -> Result<(), MeshError> {
        let label = self
            .labels
            .get_mut(&patch)
            .and_then(|l| l.get_mut(name))
            .ok_or_else(|| MeshError::UnknownLabel {
                patch,
                name: name.to_string(),
            })?;
        if label.set_value(point, marker) != Some(marker) {
            self.label_version += 1;
        }
        Ok(())
    }

    /// Points of `patch` carrying `marker` under `name`, sorted. Empty if the label is unknown.
    pub fn get_label_stratum(&self, patch: PatchId, name: &str, marker: i32) -> Vec<PointId> {
        self.labels
            .get(&patch)
            .map_or_else(Vec::new, |l| l.stratum_points(name, marker))
    }

    // --- overlaps ---

    pub fn overlaps(&self) -> &OverlapPair {
        &self.overlaps
    }

    pub fn send_overlap(&self) -> &Overlap {
        &self.overlaps.send
    }

    pub fn recv_overlap(&self) -> &Overlap {
        &self.overlaps.recv
    }

    /// Replaces both overlaps. Derived numberings of the previous distribution become stale.
    /// Strata are unaffected.
    pub fn set_overlaps(&mut self, overlaps: OverlapPair) {
        let fresh = self.is_stratified();
        self.overlaps = overlaps;
        self.version += 1;
        if fresh {
            self.stratified_version = Some(self.version);
        }
    }

    /// Human-readable dump of patches, cones and labels.
    pub fn view(&self, name: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Topology {name} (version {})", self.version);
        for (&patch, sieve) in &self.patches {
            let _ = writeln!(
                out,
                "  patch {patch}: {} points, {} arrows",
                sieve.num_points(),
                sieve.num_arrows()
            );
            for p in sieve.points() {
                let cone: Vec<String> = sieve
                    .cone(p)
                    .map(|(q, o)| format!("{q}({o})"))
                    .collect();
                if !cone.is_empty() {
                    let _ = writeln!(out, "    {p} --> [{}]", itertools::join(cone, ", "));
                }
            }
            if let Some(labels) = self.labels.get(&patch) {
                for (lname, label) in labels.iter() {
                    let entries = label
                        .iter_sorted()
                        .into_iter()
                        .map(|(p, v)| format!("{p}:{v}"));
                    let _ = writeln!(out, "    label {lname}: {}", itertools::join(entries, " "));
                }
            }
        }
        out
    }
}

impl InvalidateCache for Topology {
    fn invalidate_cache(&mut self) {
        self.strata.clear();
        self.stratified_version = None;
    }
}
