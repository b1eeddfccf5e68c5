//! Strata computation utilities for sieves.
//!
//! This module provides [`StrataCache`], the height, depth and strata of every
//! point of a sieve, and [`compute_strata`], which fills it with one Kahn pass
//! in each direction.
//!
//! Height counts arrows from a source (a point nothing points to), so cells of
//! a `cell → face → vertex` sieve sit at height 0. Depth counts arrows down to
//! a sink, so vertices sit at depth 0.
//!
//! # Errors
//! * [`MeshError::CycleDetected`]: the arrows contain a cycle.

use crate::mesh_error::MeshError;
use crate::topology::point::PatchId;
use crate::topology::sieve::Sieve;
use std::collections::HashMap;
use std::hash::Hash;

/// Precomputed stratum information for a sieve.
#[derive(Clone, Debug)]
pub struct StrataCache<P> {
    /// Map from point to its height (distance from any zero-in-degree source).
    pub height: HashMap<P, u32>,
    /// Map from point to its depth (distance down to any zero-out-degree sink).
    pub depth: HashMap<P, u32>,
    /// `strata[h]` = points at height `h`, in first-insertion order.
    pub strata: Vec<Vec<P>>,
    /// `depth_strata[d]` = points at depth `d`, in first-insertion order.
    pub depth_strata: Vec<Vec<P>>,
    /// Maximum height (diameter) of the sieve.
    pub diameter: u32,
}

impl<P: Copy + Eq + Hash> StrataCache<P> {
    /// Create a new, empty `StrataCache`.
    pub fn new() -> Self {
        Self {
            height: HashMap::new(),
            depth: HashMap::new(),
            strata: Vec::new(),
            depth_strata: Vec::new(),
            diameter: 0,
        }
    }

    #[inline]
    pub fn height_of(&self, p: P) -> Option<u32> {
        self.height.get(&p).copied()
    }

    #[inline]
    pub fn depth_of(&self, p: P) -> Option<u32> {
        self.depth.get(&p).copied()
    }

    /// Points at height `h`; empty past the diameter.
    pub fn height_stratum(&self, h: u32) -> &[P] {
        self.strata.get(h as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Points at depth `d`; empty past the diameter.
    pub fn depth_stratum(&self, d: u32) -> &[P] {
        self.depth_strata
            .get(d as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Largest depth of any point.
    pub fn max_depth(&self) -> u32 {
        self.depth_strata.len().saturating_sub(1) as u32
    }
}

impl<P: Copy + Eq + Hash> Default for StrataCache<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute height, depth and strata of `sieve` in `O(points + arrows)`.
///
/// `patch` only labels the error.
pub fn compute_strata<S>(sieve: &S, patch: PatchId) -> Result<StrataCache<S::Point>, MeshError>
where
    S: Sieve,
{
    let points: Vec<S::Point> = sieve.points().collect();

    // 1) in-degrees, then Kahn from the sources
    let mut in_deg: HashMap<S::Point, usize> = HashMap::with_capacity(points.len());
    for &p in &points {
        in_deg.insert(p, sieve.support(p).count());
    }
    let mut stack: Vec<S::Point> = points
        .iter()
        .rev()
        .copied()
        .filter(|p| in_deg[p] == 0)
        .collect();
    let mut topo = Vec::with_capacity(points.len());
    while let Some(p) = stack.pop() {
        topo.push(p);
        for (q, _) in sieve.cone(p) {
            if let Some(d) = in_deg.get_mut(&q) {
                *d -= 1;
                if *d == 0 {
                    stack.push(q);
                }
            }
        }
    }
    if topo.len() != points.len() {
        return Err(MeshError::CycleDetected(patch));
    }

    // 2) heights forward, depths backward along the topological order
    let mut height = HashMap::with_capacity(points.len());
    for &p in &topo {
        let h = sieve
            .support(p)
            .map(|(q, _)| height.get(&q).copied().unwrap_or(0) + 1)
            .max()
            .unwrap_or(0);
        height.insert(p, h);
    }
    let mut depth = HashMap::with_capacity(points.len());
    for &p in topo.iter().rev() {
        let d = sieve
            .cone(p)
            .map(|(q, _)| depth.get(&q).copied().unwrap_or(0) + 1)
            .max()
            .unwrap_or(0);
        depth.insert(p, d);
    }

    // 3) strata in first-insertion order
    let diameter = height.values().copied().max().unwrap_or(0);
    let max_depth = depth.values().copied().max().unwrap_or(0);
    let mut strata = vec![Vec::new(); if points.is_empty() { 0 } else { diameter as usize + 1 }];
    let mut depth_strata =
        vec![Vec::new(); if points.is_empty() { 0 } else { max_depth as usize + 1 }];
    for &p in &points {
        strata[height[&p] as usize].push(p);
        depth_strata[depth[&p] as usize].push(p);
    }

    Ok(StrataCache {
        height,
        depth,
        strata,
        depth_strata,
        diameter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::sieve::InMemorySieve;

    fn triangle() -> InMemorySieve<u32, i32> {
        // cell 0 -> edges 1,2,3 -> vertices 4,5,6
        InMemorySieve::from_arrows([
            (0, 1, 0),
            (0, 2, 1),
            (0, 3, 2),
            (1, 4, 0),
            (1, 5, 1),
            (2, 5, 0),
            (2, 6, 1),
            (3, 6, 0),
            (3, 4, 1),
        ])
    }

    #[test]
    fn heights_and_depths_of_interpolated_triangle() {
        let s = triangle();
        let c = compute_strata(&s, 0).unwrap();
        assert_eq!(c.height_of(0), Some(0));
        assert_eq!(c.height_of(2), Some(1));
        assert_eq!(c.height_of(5), Some(2));
        assert_eq!(c.depth_of(0), Some(2));
        assert_eq!(c.depth_of(3), Some(1));
        assert_eq!(c.depth_of(6), Some(0));
        assert_eq!(c.diameter, 2);
        assert_eq!(c.height_stratum(1), &[1, 2, 3]);
        assert_eq!(c.depth_stratum(0), &[4, 5, 6]);
        assert!(c.height_stratum(3).is_empty());
    }

    #[test]
    fn cycle_is_rejected() {
        let s = InMemorySieve::<u32, ()>::from_arrows([(1, 2, ()), (2, 3, ()), (3, 1, ())]);
        assert_eq!(compute_strata(&s, 4).unwrap_err(), MeshError::CycleDetected(4));
    }

    #[test]
    fn empty_sieve_has_no_strata() {
        let s = InMemorySieve::<u32, ()>::default();
        let c = compute_strata(&s, 0).unwrap();
        assert!(c.strata.is_empty());
        assert_eq!(c.diameter, 0);
    }

    #[test]
    fn isolated_point_is_both_source_and_sink() {
        let mut s = InMemorySieve::<u32, ()>::default();
        s.add_point(9);
        let c = compute_strata(&s, 0).unwrap();
        assert_eq!(c.height_of(9), Some(0));
        assert_eq!(c.depth_of(9), Some(0));
    }
}
