//! Section: per-(patch, point) variable-length storage over a topology.
//!
//! A `Section<V>` keeps one [`Atlas`] and one backing array per patch. Fiber
//! dimensions are declared first (per point, or in bulk per depth stratum),
//! then [`Section::allocate`] lays out every patch once. After that the layout
//! is frozen: values can be read and written but fiber dimensions cannot
//! change.
//!
//! A negative fiber dimension marks a *constrained* point: it still stores
//! `|dim|` values, but they are boundary values written through
//! [`Section::update_bc`] rather than unknowns.

use std::collections::BTreeMap;
use std::fmt::{Debug, Display, Write as _};

use crate::data::atlas::{Atlas, FiberSpan};
use crate::mesh_error::MeshError;
use crate::topology::mesh_topology::Topology;
use crate::topology::point::{PatchId, PointId};

/// Variable-length typed storage indexed by `(patch, point)`.
#[derive(Clone, Debug)]
pub struct Section<V> {
    atlases: BTreeMap<PatchId, Atlas>,
    data: BTreeMap<PatchId, Vec<V>>,
    allocated: bool,
}

impl<V> Default for Section<V> {
    fn default() -> Self {
        Self {
            atlases: BTreeMap::new(),
            data: BTreeMap::new(),
            allocated: false,
        }
    }
}

impl<V: Clone + Default> Section<V> {
    pub fn new() -> Self {
        Self::default()
    }

    // --- layout ---

    /// Declare `|dim|` values at `point`; negative `dim` marks the point constrained.
    ///
    /// Later calls override earlier ones for the same point.
    ///
    /// # Errors
    /// [`MeshError::SectionAlreadyAllocated`] once [`allocate`](Self::allocate) has run.
    pub fn set_fiber_dimension(
        &mut self,
        patch: PatchId,
        point: PointId,
        dim: i32,
    ) -> Result<(), MeshError> {
        if self.allocated {
            return Err(MeshError::SectionAlreadyAllocated { point });
        }
        self.atlases
            .entry(patch)
            .or_default()
            .set_fiber_dimension(point, dim);
        Ok(())
    }

    /// Declare `dim` values at every point of depth `depth` in `patch`.
    ///
    /// # Errors
    /// Stale strata or an unknown patch in `topology`, or an allocated section.
    pub fn set_fiber_dimension_by_depth(
        &mut self,
        topology: &Topology,
        patch: PatchId,
        depth: u32,
        dim: i32,
    ) -> Result<(), MeshError> {
        for &p in topology.depth_stratum(patch, depth)? {
            self.set_fiber_dimension(patch, p, dim)?;
        }
        Ok(())
    }

    /// Declare `dim` values at every point of height `height` in `patch`.
    pub fn set_fiber_dimension_by_height(
        &mut self,
        topology: &Topology,
        patch: PatchId,
        height: u32,
        dim: i32,
    ) -> Result<(), MeshError> {
        for &p in topology.height_stratum(patch, height)? {
            self.set_fiber_dimension(patch, p, dim)?;
        }
        Ok(())
    }

    /// Signed fiber dimension of `point`, if declared.
    pub fn fiber_dimension(&self, patch: PatchId, point: PointId) -> Option<i32> {
        self.atlases.get(&patch)?.fiber_dimension(point)
    }

    /// Lay out every patch and allocate default-initialised storage.
    ///
    /// A second call is a no-op.
    pub fn allocate(&mut self) -> Result<(), MeshError> {
        if self.allocated {
            return Ok(());
        }
        for (&patch, atlas) in self.atlases.iter_mut() {
            let len = atlas.lay_out();
            self.data.insert(patch, vec![V::default(); len]);
        }
        self.allocated = true;
        Ok(())
    }

    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.allocated
    }

    /// Drop layout and values, returning to the unallocated state.
    pub fn clear(&mut self) {
        self.atlases.clear();
        self.data.clear();
        self.allocated = false;
    }

    // --- access ---

    fn span(&self, patch: PatchId, point: PointId) -> Result<FiberSpan, MeshError> {
        if !self.allocated {
            return Err(MeshError::SectionNotAllocated);
        }
        self.atlases
            .get(&patch)
            .and_then(|a| a.get(point))
            .ok_or(MeshError::PointNotInSection { patch, point })
    }

    /// The `|dim|` values stored at `point`.
    ///
    /// # Errors
    /// [`MeshError::SectionNotAllocated`] before allocation,
    /// [`MeshError::PointNotInSection`] for undeclared points.
    pub fn restrict(&self, patch: PatchId, point: PointId) -> Result<&[V], MeshError> {
        let span = self.span(patch, point)?;
        let data = self
            .data
            .get(&patch)
            .ok_or(MeshError::PointNotInSection { patch, point })?;
        Ok(&data[span.range()])
    }

    /// Alias of [`restrict`](Self::restrict) for a single point.
    #[inline]
    pub fn restrict_point(&self, patch: PatchId, point: PointId) -> Result<&[V], MeshError> {
        self.restrict(patch, point)
    }

    /// Mutable view of the values stored at `point`.
    pub fn restrict_mut(&mut self, patch: PatchId, point: PointId) -> Result<&mut [V], MeshError> {
        let span = self.span(patch, point)?;
        let data = self
            .data
            .get_mut(&patch)
            .ok_or(MeshError::PointNotInSection { patch, point })?;
        Ok(&mut data[span.range()])
    }

    fn checked_slot(
        &mut self,
        patch: PatchId,
        point: PointId,
        found: usize,
    ) -> Result<&mut [V], MeshError> {
        let slot = self.restrict_mut(patch, point)?;
        if slot.len() != found {
            return Err(MeshError::SliceLengthMismatch {
                point,
                expected: slot.len(),
                found,
            });
        }
        Ok(slot)
    }

    /// Overwrite the values at `point`.
    pub fn update(&mut self, patch: PatchId, point: PointId, values: &[V]) -> Result<(), MeshError> {
        self.checked_slot(patch, point, values.len())?
            .clone_from_slice(values);
        Ok(())
    }

    /// Write boundary values at a constrained point.
    ///
    /// # Errors
    /// [`MeshError::NotConstrained`] if the fiber dimension of `point` is not negative.
    pub fn update_bc(
        &mut self,
        patch: PatchId,
        point: PointId,
        values: &[V],
    ) -> Result<(), MeshError> {
        if !self.span(patch, point)?.is_constrained() {
            return Err(MeshError::NotConstrained { patch, point });
        }
        self.update(patch, point, values)
    }

    /// Fill every value of every patch with `value`.
    pub fn fill(&mut self, value: V) -> Result<(), MeshError> {
        if !self.allocated {
            return Err(MeshError::SectionNotAllocated);
        }
        for data in self.data.values_mut() {
            data.fill(value.clone());
        }
        Ok(())
    }

    // --- introspection ---

    /// Patches with declared points, ascending.
    pub fn patches(&self) -> impl Iterator<Item = PatchId> + '_ {
        self.atlases.keys().copied()
    }

    pub fn atlas(&self, patch: PatchId) -> Option<&Atlas> {
        self.atlases.get(&patch)
    }

    /// Declared points of `patch` in layout order.
    pub fn points(&self, patch: PatchId) -> impl Iterator<Item = PointId> + '_ {
        self.atlases
            .get(&patch)
            .into_iter()
            .flat_map(|a| a.points())
    }

    /// Whether `point` has a fiber (possibly of dimension zero) in `patch`.
    pub fn contains(&self, patch: PatchId, point: PointId) -> bool {
        self.atlases.get(&patch).is_some_and(|a| a.contains(point))
    }

    /// Number of stored values in `patch`.
    pub fn size(&self, patch: PatchId) -> usize {
        self.atlases.get(&patch).map_or(0, Atlas::total_len)
    }

    /// Number of unconstrained values in `patch`.
    pub fn free_size(&self, patch: PatchId) -> usize {
        self.atlases.get(&patch).map_or(0, |a| {
            a.spans()
                .filter(|(_, s)| !s.is_constrained())
                .map(|(_, s)| s.len())
                .sum()
        })
    }

    /// Raw backing array of `patch`.
    pub fn raw(&self, patch: PatchId) -> Option<&[V]> {
        self.data.get(&patch).map(Vec::as_slice)
    }
}

impl<V> Section<V>
where
    V: Copy + Default + std::ops::AddAssign,
{
    /// Add `values` into the values at `point`.
    pub fn update_add(
        &mut self,
        patch: PatchId,
        point: PointId,
        values: &[V],
    ) -> Result<(), MeshError> {
        let slot = self.checked_slot(patch, point, values.len())?;
        for (dst, src) in slot.iter_mut().zip(values) {
            *dst += *src;
        }
        Ok(())
    }
}

impl<V: Clone + Default + num_traits::Zero> Section<V> {
    /// Reset every value to zero.
    pub fn zero(&mut self) -> Result<(), MeshError> {
        self.fill(V::zero())
    }
}

impl<V: Clone + Default + Debug> Section<V> {
    /// Human-readable dump of every patch: point, fiber dimension, offset and values.
    pub fn view(&self, name: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "viewing Section {name}");
        for (&patch, atlas) in &self.atlases {
            let _ = writeln!(out, "  patch {patch}: size {}", atlas.total_len());
            for (p, span) in atlas.spans() {
                let values = match self.data.get(&patch) {
                    Some(d) if self.allocated => format!("{:?}", &d[span.range()]),
                    _ => "<unallocated>".to_string(),
                };
                let _ = writeln!(
                    out,
                    "    ({p}) dim {} offset {} {values}",
                    span.dim, span.offset
                );
            }
        }
        out
    }
}

/// Scalar payload of the pair registry: a point paired with a 3-vector.
#[repr(C)]
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    bytemuck::Pod,
    bytemuck::Zeroable,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct PairValue {
    pub point: PointId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Display for PairValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, [{}, {}, {}])", self.point, self.x, self.y, self.z)
    }
}
