//! `PointId`: a strong, zero-cost handle for mesh entities
//!
//! Every cell, face, edge and vertex of a mesh is an opaque integer point.
//! Builders number points densely from zero (cells or edges first, then
//! vertices), so unlike a sentinel-based id every `u64` is a valid point.
//!
//! This module provides:
//! - A transparent `PointId` newtype around `u64` that can travel on the wire
//!   as plain bytes (`bytemuck::Pod`).
//! - The `PatchId` alias naming an independent chart of a topology.

use std::fmt;

/// Identifier of a patch (an independent sub-topology). The local patch is `0`.
pub type PatchId = u32;

/// Patch used by builders and by single-chart meshes.
pub const DEFAULT_PATCH: PatchId = 0;

/// Opaque mesh point identifier.
///
/// # Memory layout
/// `repr(transparent)` over `u64`, so slices of points can be cast to bytes
/// for message passing without copying.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    serde::Serialize,
    serde::Deserialize,
    bytemuck::Pod,
    bytemuck::Zeroable,
)]
#[repr(transparent)]
pub struct PointId(u64);

impl PointId {
    /// Creates a new `PointId` from a raw `u64` value.
    ///
    /// ```rust
    /// # use sieve_bundle::topology::point::PointId;
    /// let p = PointId::new(1);
    /// assert_eq!(p.get(), 1);
    /// ```
    #[inline]
    pub const fn new(raw: u64) -> Self {
        PointId(raw)
    }

    /// Returns the inner `u64` value of this `PointId`.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for PointId {
    #[inline]
    fn from(raw: u64) -> Self {
        PointId(raw)
    }
}

impl fmt::Debug for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PointId").field(&self.get()).finish()
    }
}

/// Prints only the raw integer.
impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// `PointId` has the same MPI datatype as `u64`.
#[cfg(feature = "mpi-support")]
unsafe impl mpi::datatype::Equivalence for PointId {
    type Out = <u64 as mpi::datatype::Equivalence>::Out;

    fn equivalent_datatype() -> Self::Out {
        u64::equivalent_datatype()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_a_valid_point() {
        let p = PointId::new(0);
        assert_eq!(p.get(), 0);
        assert_eq!(p, PointId::default());
    }

    #[test]
    fn debug_and_display() {
        let p = PointId::new(7);
        assert_eq!(format!("{:?}", p), "PointId(7)");
        assert_eq!(format!("{}", p), "7");
    }

    #[test]
    fn ordering_and_hash() {
        let a = PointId::new(1);
        let b = PointId::from(2);
        assert!(a < b);
        let set: std::collections::HashSet<_> = [a, b, a].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn casts_to_bytes() {
        let pts = [PointId::new(1), PointId::new(258)];
        let bytes: &[u8] = bytemuck::cast_slice(&pts);
        assert_eq!(bytes.len(), 16);
        let back: PointId = bytemuck::pod_read_unaligned(&bytes[8..16]);
        assert_eq!(back, pts[1]);
    }
}
