//! Atlas: mapping mesh points to signed fiber dimensions and contiguous slices.
//!
//! An [`Atlas`] records, for every point of one patch, a signed fiber dimension.
//! A negative dimension marks a constrained (boundary) slot of `|dim|` values.
//! Once [`Atlas::lay_out`] runs, every point owns the slice
//! `offset .. offset + |dim|` of the patch's backing array, with offsets
//! assigned as prefix sums in insertion order.

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshError;
use crate::topology::point::PointId;
use std::collections::HashMap;

/// Slice descriptor of one point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FiberSpan {
    /// Start of the point's values in the backing array (valid after layout).
    pub offset: usize,
    /// Signed fiber dimension; negative means constrained.
    pub dim: i32,
}

impl FiberSpan {
    /// Number of stored values, `|dim|`.
    #[inline]
    pub fn len(&self) -> usize {
        self.dim.unsigned_abs() as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dim == 0
    }

    #[inline]
    pub fn is_constrained(&self) -> bool {
        self.dim < 0
    }

    #[inline]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len()
    }
}

/// `Atlas` maintains:
/// - a lookup `map` from each `PointId` to its [`FiberSpan`],
/// - an `order` vector preserving insertion order for deterministic layout,
/// - and `total_len`, the sum of `|dim|` over all points.
///
/// # Invariants
///
/// - Each point appears exactly once in `order`, and `map` has exactly those keys.
/// - After layout, offsets are contiguous in insertion order.
#[derive(Clone, Debug, Default)]
pub struct Atlas {
    map: HashMap<PointId, FiberSpan>,
    order: Vec<PointId>,
    total_len: usize,
    laid_out: bool,
}

impl Atlas {
    /// Set the fiber dimension of `p`, inserting it if new. Later calls override.
    ///
    /// Offsets are only meaningful after [`lay_out`](Self::lay_out); calling this
    /// afterwards clears the layout.
    pub fn set_fiber_dimension(&mut self, p: PointId, dim: i32) {
        match self.map.get_mut(&p) {
            Some(span) => {
                self.total_len = self.total_len - span.len() + dim.unsigned_abs() as usize;
                span.dim = dim;
            }
            None => {
                self.map.insert(p, FiberSpan { offset: 0, dim });
                self.order.push(p);
                self.total_len += dim.unsigned_abs() as usize;
            }
        }
        self.laid_out = false;
    }

    /// Assign prefix-sum offsets in insertion order; returns the total length.
    pub fn lay_out(&mut self) -> usize {
        let mut offset = 0usize;
        for p in &self.order {
            if let Some(span) = self.map.get_mut(p) {
                span.offset = offset;
                offset += span.len();
            }
        }
        self.laid_out = true;
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        self.debug_assert_invariants();
        offset
    }

    #[inline]
    pub fn is_laid_out(&self) -> bool {
        self.laid_out
    }

    #[inline]
    pub fn get(&self, p: PointId) -> Option<FiberSpan> {
        self.map.get(&p).copied()
    }

    #[inline]
    pub fn contains(&self, p: PointId) -> bool {
        self.map.contains_key(&p)
    }

    /// Signed fiber dimension of `p`.
    #[inline]
    pub fn fiber_dimension(&self, p: PointId) -> Option<i32> {
        self.map.get(&p).map(|s| s.dim)
    }

    /// Number of registered points.
    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Sum of `|dim|` over all points.
    #[inline]
    pub fn total_len(&self) -> usize {
        self.total_len
    }

    /// Points in insertion order.
    pub fn points(&self) -> impl Iterator<Item = PointId> + '_ {
        self.order.iter().copied()
    }

    /// `(point, span)` pairs in insertion order.
    pub fn spans(&self) -> impl Iterator<Item = (PointId, FiberSpan)> + '_ {
        self.order.iter().filter_map(|p| self.map.get(p).map(|s| (*p, *s)))
    }
}

impl DebugInvariants for Atlas {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Atlas invalid");
    }

    fn validate_invariants(&self) -> Result<(), MeshError> {
        if self.order.len() != self.map.len() {
            return Err(MeshError::AtlasCorrupted(format!(
                "{} ordered points but {} mapped",
                self.order.len(),
                self.map.len()
            )));
        }
        let mut expected = 0usize;
        for p in &self.order {
            let span = self
                .map
                .get(p)
                .ok_or_else(|| MeshError::AtlasCorrupted(format!("point {p} missing from map")))?;
            if self.laid_out && span.offset != expected {
                return Err(MeshError::AtlasCorrupted(format!(
                    "point {p} at offset {} but expected {expected}",
                    span.offset
                )));
            }
            expected += span.len();
        }
        if expected != self.total_len {
            return Err(MeshError::AtlasCorrupted(format!(
                "total_len {} but spans sum to {expected}",
                self.total_len
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(i: u64) -> PointId {
        PointId::new(i)
    }

    #[test]
    fn offsets_are_prefix_sums_of_absolute_dims() {
        let mut a = Atlas::default();
        a.set_fiber_dimension(pid(3), 2);
        a.set_fiber_dimension(pid(1), -3);
        a.set_fiber_dimension(pid(2), 0);
        a.set_fiber_dimension(pid(4), 1);
        assert_eq!(a.lay_out(), 6);
        assert_eq!(a.get(pid(3)).map(|s| s.range()), Some(0..2));
        assert_eq!(a.get(pid(1)).map(|s| s.range()), Some(2..5));
        assert_eq!(a.get(pid(2)).map(|s| s.range()), Some(5..5));
        assert_eq!(a.get(pid(4)).map(|s| s.range()), Some(5..6));
        assert!(a.get(pid(1)).is_some_and(|s| s.is_constrained()));
        a.validate_invariants().unwrap();
    }

    #[test]
    fn override_keeps_position_and_total() {
        let mut a = Atlas::default();
        a.set_fiber_dimension(pid(1), 2);
        a.set_fiber_dimension(pid(2), 2);
        a.set_fiber_dimension(pid(1), -1);
        assert_eq!(a.total_len(), 3);
        assert_eq!(a.points().collect::<Vec<_>>(), vec![pid(1), pid(2)]);
        a.lay_out();
        assert_eq!(a.get(pid(2)).map(|s| s.offset), Some(1));
        assert_eq!(a.fiber_dimension(pid(1)), Some(-1));
    }
}
