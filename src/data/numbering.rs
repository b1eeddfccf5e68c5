//! Global point numberings and the memoizing factory that produces them.
//!
//! A [`Numbering`] assigns every selected point of a patch a global index in
//! `[0, N)`, consistent across all ranks of a group. Owned points (those not in
//! the topology's receive overlap) are numbered first by rank (ascending) and
//! then by point id within each rank. Ghost points receive their owner's index
//! through a section completion over the overlaps.
//!
//! [`NumberingFactory`] caches numberings by topology identity, topology
//! version, patch and selector, so repeated requests against an unchanged
//! topology are answered without communication. Because a fresh computation is
//! collective, all ranks must see the same sequence of hits and misses; keep
//! caches in step by invalidating them on every rank together.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::algs::communicator::{CommTag, Communicator, SectionCommTags};
use crate::algs::completion::complete_section_with_tags;
use crate::algs::wire::{WireIndex, cast_slice, decode_records};
use crate::data::section::Section;
use crate::mesh_error::MeshError;
use crate::overlap::delta::CopyDelta;
use crate::topology::mesh_topology::Topology;
use crate::topology::point::{PatchId, PointId};
use crate::topology::sieve::Sieve;

/// Base tag of the numbering protocol: counts, then the ghost completion.
pub const NUMBERING_TAG: CommTag = CommTag::new(0xC0DE);

/// Which points of a patch a numbering covers.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PointSelector {
    /// Every point of the patch.
    All,
    /// Points of one depth stratum (vertices at depth 0).
    Depth(u32),
    /// Points carrying `value` under label `name`.
    Label { name: String, value: i32 },
}

impl PointSelector {
    pub fn label(name: impl Into<String>, value: i32) -> Self {
        Self::Label {
            name: name.into(),
            value,
        }
    }

    fn select(&self, topology: &Topology, patch: PatchId) -> Result<Vec<PointId>, MeshError> {
        let mut points = match self {
            PointSelector::All => topology.patch(patch)?.points().collect(),
            PointSelector::Depth(d) => topology.depth_stratum(patch, *d)?.to_vec(),
            PointSelector::Label { name, value } => {
                topology.patch(patch)?;
                topology.get_label_stratum(patch, name, *value)
            }
        };
        points.sort_unstable();
        points.dedup();
        Ok(points)
    }
}

/// Contiguous global indices for the selected points of one patch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Numbering {
    patch: PatchId,
    points: Vec<PointId>,
    indices: HashMap<PointId, u64>,
    owned: usize,
    offset: u64,
    global_size: u64,
}

impl Numbering {
    pub fn patch(&self) -> PatchId {
        self.patch
    }

    /// Global index of `p`, if numbered.
    pub fn index(&self, p: PointId) -> Option<u64> {
        self.indices.get(&p).copied()
    }

    /// Total number of points across all ranks.
    pub fn global_size(&self) -> u64 {
        self.global_size
    }

    /// Number of points this rank owns.
    pub fn local_size(&self) -> usize {
        self.owned
    }

    /// First global index owned by this rank.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Whether this rank owns `p`.
    pub fn is_owned(&self, p: PointId) -> bool {
        self.index(p)
            .is_some_and(|i| i >= self.offset && i < self.offset + self.owned as u64)
    }

    /// Numbered local points, ascending by point id.
    pub fn points(&self) -> impl Iterator<Item = PointId> + '_ {
        self.points.iter().copied().filter(|p| self.indices.contains_key(p))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct NumberingKey {
    topology: u64,
    version: u64,
    labels: u64,
    patch: PatchId,
    selector: PointSelector,
}

/// Memoizing producer of [`Numbering`]s.
#[derive(Debug)]
pub struct NumberingFactory {
    debug: i32,
    cache: DashMap<NumberingKey, Arc<Numbering>>,
    computed: AtomicUsize,
}

static FACTORIES: Lazy<DashMap<i32, Arc<NumberingFactory>>> = Lazy::new(DashMap::new);

impl NumberingFactory {
    /// A private factory, independent of the process-wide registry.
    pub fn new(debug: i32) -> Self {
        Self {
            debug,
            cache: DashMap::new(),
            computed: AtomicUsize::new(0),
        }
    }

    /// The process-wide factory for `debug`; every call with the same level
    /// returns the same instance.
    pub fn singleton(debug: i32) -> Arc<NumberingFactory> {
        FACTORIES
            .entry(debug)
            .or_insert_with(|| Arc::new(NumberingFactory::new(debug)))
            .clone()
    }

    pub fn debug(&self) -> i32 {
        self.debug
    }

    /// Number of numberings actually derived (cache misses) so far.
    pub fn computations(&self) -> usize {
        self.computed.load(Ordering::Relaxed)
    }

    /// Number of cached numberings.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Drop every cached numbering of `topology`.
    pub fn invalidate(&self, topology: &Topology) {
        let id = topology.id();
        self.cache.retain(|k, _| k.topology != id);
    }

    /// Numbering of `selector`'s points of `patch`, computed collectively on a miss.
    ///
    /// Hits return the very same `Arc`. A miss also evicts numberings cached for
    /// older versions (structural or label) of the same topology.
    pub fn get_numbering<C: Communicator>(
        &self,
        topology: &Topology,
        patch: PatchId,
        selector: &PointSelector,
        comm: &C,
    ) -> Result<Arc<Numbering>, MeshError> {
        let key = NumberingKey {
            topology: topology.id(),
            version: topology.version(),
            labels: topology.label_version(),
            patch,
            selector: selector.clone(),
        };
        if let Some(hit) = self.cache.get(&key) {
            if self.debug > 0 {
                log::debug!("numbering cache hit for {key:?}");
            }
            return Ok(Arc::clone(hit.value()));
        }
        if self.debug > 0 {
            log::debug!("numbering cache miss for {key:?}");
        }

        let numbering = Arc::new(self.compute(topology, patch, selector, comm)?);
        self.cache
            .retain(|k, _| {
                k.topology != key.topology || (k.version == key.version && k.labels == key.labels)
            });
        Ok(Arc::clone(
            self.cache.entry(key).or_insert(numbering).value(),
        ))
    }

    fn compute<C: Communicator>(
        &self,
        topology: &Topology,
        patch: PatchId,
        selector: &PointSelector,
        comm: &C,
    ) -> Result<Numbering, MeshError> {
        self.computed.fetch_add(1, Ordering::Relaxed);
        let points = selector.select(topology, patch)?;
        let recv = topology.recv_overlap();
        let owned: Vec<PointId> = points.iter().copied().filter(|p| !recv.contains(*p)).collect();

        // 1) rank offsets from everybody's owned count
        let mine = [WireIndex::new(owned.len() as u64)];
        let all = comm.allgather(NUMBERING_TAG, cast_slice(&mine))?;
        let mut counts = Vec::with_capacity(all.len());
        for (r, bytes) in all.iter().enumerate() {
            let rec: Vec<WireIndex> = decode_records(bytes, r)?;
            counts.push(rec.first().map_or(0, WireIndex::get));
        }
        let offset: u64 = counts[..comm.rank()].iter().sum();
        let global_size: u64 = counts.iter().sum();

        // 2) owned indices, ghosts pending
        let mut scratch = Section::<i64>::new();
        for &p in &points {
            scratch.set_fiber_dimension(patch, p, 1)?;
        }
        scratch.allocate()?;
        scratch.fill(-1)?;
        for (i, &p) in owned.iter().enumerate() {
            scratch.update(patch, p, &[(offset + i as u64) as i64])?;
        }

        // 3) ghosts learn their owner's index
        complete_section_with_tags::<i64, CopyDelta, C>(
            &mut scratch,
            patch,
            topology.send_overlap(),
            recv,
            comm,
            SectionCommTags::from_base(NUMBERING_TAG.offset(1)),
        )?;

        let mut indices = HashMap::with_capacity(points.len());
        for &p in &points {
            match scratch.restrict(patch, p)?.first().copied() {
                Some(i) if i >= 0 => {
                    indices.insert(p, i as u64);
                }
                _ => log::warn!("point {p} of patch {patch} received no global number from its owner"),
            }
        }

        Ok(Numbering {
            patch,
            points,
            indices,
            owned: owned.len(),
            offset,
            global_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::NoComm;

    fn pid(i: u64) -> PointId {
        PointId::new(i)
    }

    fn segment() -> Topology {
        // edge 0 -> vertices 2, 1
        let mut t = Topology::new(0);
        t.add_arrow(0, pid(0), pid(2), 0);
        t.add_arrow(0, pid(0), pid(1), 1);
        t.stratify().unwrap();
        t
    }

    #[test]
    fn serial_numbering_is_contiguous_in_point_order() {
        let t = segment();
        let f = NumberingFactory::new(0);
        let n = f.get_numbering(&t, 0, &PointSelector::Depth(0), &NoComm).unwrap();
        assert_eq!(n.global_size(), 2);
        assert_eq!(n.index(pid(1)), Some(0));
        assert_eq!(n.index(pid(2)), Some(1));
        assert_eq!(n.index(pid(0)), None);
        assert!(n.is_owned(pid(2)));
        let all = f.get_numbering(&t, 0, &PointSelector::All, &NoComm).unwrap();
        assert_eq!(all.points().collect::<Vec<_>>(), vec![pid(0), pid(1), pid(2)]);
    }

    #[test]
    fn repeated_requests_hit_the_cache() {
        let t = segment();
        let f = NumberingFactory::new(0);
        let a = f.get_numbering(&t, 0, &PointSelector::All, &NoComm).unwrap();
        let b = f.get_numbering(&t, 0, &PointSelector::All, &NoComm).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(f.computations(), 1);
    }

    #[test]
    fn structural_change_forces_recomputation() {
        let mut t = segment();
        let f = NumberingFactory::new(0);
        let a = f.get_numbering(&t, 0, &PointSelector::All, &NoComm).unwrap();
        t.add_arrow(0, pid(0), pid(3), 2);
        t.stratify().unwrap();
        let b = f.get_numbering(&t, 0, &PointSelector::All, &NoComm).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(b.global_size(), 4);
        assert_eq!(f.computations(), 2);
        assert_eq!(f.cached(), 1);
        f.invalidate(&t);
        assert_eq!(f.cached(), 0);
    }

    #[test]
    fn label_selector_numbers_only_marked_points() {
        let mut t = segment();
        t.create_label(0, "marker");
        t.set_value(0, "marker", pid(2), 1).unwrap();
        let f = NumberingFactory::new(0);
        let n = f
            .get_numbering(&t, 0, &PointSelector::label("marker", 1), &NoComm)
            .unwrap();
        assert_eq!(n.global_size(), 1);
        assert_eq!(n.index(pid(2)), Some(0));
        assert!(matches!(
            f.get_numbering(&t, 9, &PointSelector::label("marker", 1), &NoComm),
            Err(MeshError::UnknownPatch(9))
        ));
    }

    #[test]
    fn label_edits_renumber_label_selections() {
        let mut t = segment();
        t.create_label(0, "marker");
        t.set_value(0, "marker", pid(1), 1).unwrap();
        let f = NumberingFactory::new(0);
        let sel = PointSelector::label("marker", 1);
        let before = f.get_numbering(&t, 0, &sel, &NoComm).unwrap();
        assert_eq!(before.global_size(), 1);

        t.set_value(0, "marker", pid(2), 1).unwrap();
        let after = f.get_numbering(&t, 0, &sel, &NoComm).unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.global_size(), 2);
        assert_eq!(after.index(pid(2)), Some(1));
        assert_eq!(f.cached(), 1);

        // rewriting the same marker leaves the cached numbering valid
        t.set_value(0, "marker", pid(2), 1).unwrap();
        let again = f.get_numbering(&t, 0, &sel, &NoComm).unwrap();
        assert!(Arc::ptr_eq(&after, &again));
    }
}
