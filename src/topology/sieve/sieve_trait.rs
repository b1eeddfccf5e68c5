//! Core trait for sieve data structures in mesh topology.
//!
//! This module defines the [`Sieve`] trait, a bidirectional incidence API over
//! generic points and arrow payloads. Arrows point from a covering entity to
//! the entity it covers, so `cone(cell)` yields the cell's faces (or vertices)
//! and `support(vertex)` yields the entities that contain it.

use std::collections::HashSet;

/// Core bidirectional incidence API for mesh topology.
///
/// # Associated Types
/// - `Point`: the type of points in the sieve.
/// - `Payload`: the type of payloads associated with arrows.
/// - `ConeIter`: iterator over outgoing arrows from a point, in insertion order.
/// - `SupportIter`: iterator over incoming arrows to a point, in insertion order.
pub trait Sieve: Default {
    type Point: Copy + Eq + std::hash::Hash + Ord + std::fmt::Debug;
    type Payload;

    type ConeIter<'a>: Iterator<Item = (Self::Point, &'a Self::Payload)>
    where
        Self: 'a;
    type SupportIter<'a>: Iterator<Item = (Self::Point, &'a Self::Payload)>
    where
        Self: 'a;

    /// Outgoing arrows from `p`.
    fn cone<'a>(&'a self, p: Self::Point) -> Self::ConeIter<'a>;
    /// Incoming arrows to `p`.
    fn support<'a>(&'a self, p: Self::Point) -> Self::SupportIter<'a>;

    /// Insert arrow `src → dst`. Re-inserting an existing arrow replaces its payload
    /// and keeps its position.
    fn add_arrow(&mut self, src: Self::Point, dst: Self::Point, payload: Self::Payload);
    /// Remove arrow `src → dst`, returning its payload.
    fn remove_arrow(&mut self, src: Self::Point, dst: Self::Point) -> Option<Self::Payload>;
    /// Register `p` without any arrows.
    fn add_point(&mut self, p: Self::Point);

    /// All points, in the order they were first seen.
    fn points<'a>(&'a self) -> Box<dyn Iterator<Item = Self::Point> + 'a>;

    /// All “base” points (with outgoing arrows).
    fn base_points<'a>(&'a self) -> Box<dyn Iterator<Item = Self::Point> + 'a> {
        Box::new(self.points().filter(move |&p| self.cone(p).next().is_some()))
    }
    /// All “cap” points (with incoming arrows).
    fn cap_points<'a>(&'a self) -> Box<dyn Iterator<Item = Self::Point> + 'a> {
        Box::new(self.points().filter(move |&p| self.support(p).next().is_some()))
    }

    /// Number of points.
    fn num_points(&self) -> usize {
        self.points().count()
    }

    // --- graph traversals ---

    /// Transitive closure along cones (seeds included). Traversal order is unspecified.
    fn closure<'s, I>(&'s self, seeds: I) -> Box<dyn Iterator<Item = Self::Point> + 's>
    where
        I: IntoIterator<Item = Self::Point>,
    {
        let mut stack: Vec<_> = seeds.into_iter().collect();
        let mut seen: HashSet<Self::Point> = stack.iter().copied().collect();
        Box::new(std::iter::from_fn(move || {
            let p = stack.pop()?;
            for (q, _) in self.cone(p) {
                if seen.insert(q) {
                    stack.push(q);
                }
            }
            Some(p)
        }))
    }

    /// Transitive closure along supports (seeds included).
    fn star<'s, I>(&'s self, seeds: I) -> Box<dyn Iterator<Item = Self::Point> + 's>
    where
        I: IntoIterator<Item = Self::Point>,
    {
        let mut stack: Vec<_> = seeds.into_iter().collect();
        let mut seen: HashSet<Self::Point> = stack.iter().copied().collect();
        Box::new(std::iter::from_fn(move || {
            let p = stack.pop()?;
            for (q, _) in self.support(p) {
                if seen.insert(q) {
                    stack.push(q);
                }
            }
            Some(p)
        }))
    }

    /// Closure of a single point in breadth-first cone order: `p`, then its cone in
    /// arrow order, then the cones of those, each point reported once.
    ///
    /// For a cell whose cone lists its vertices this yields the vertices in the
    /// order the arrows were inserted, which is what geometry routines rely on.
    fn ordered_closure(&self, p: Self::Point) -> Vec<Self::Point> {
        let mut out = vec![p];
        let mut seen: HashSet<Self::Point> = HashSet::from([p]);
        let mut head = 0;
        while head < out.len() {
            let q = out[head];
            head += 1;
            for (r, _) in self.cone(q) {
                if seen.insert(r) {
                    out.push(r);
                }
            }
        }
        out
    }
}
