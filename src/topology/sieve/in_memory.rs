//! In-memory implementation of the [`Sieve`] trait.
//!
//! [`InMemorySieve`] stores both adjacency directions in hash maps of vectors,
//! so cones and supports come back in arrow insertion order. Points are also
//! kept in first-seen order, which strata and geometry use as their tie-break.

use super::sieve_trait::Sieve;
use std::collections::HashMap;
use std::hash::Hash;

/// An in-memory sieve using hash maps for adjacency storage.
///
/// # Type Parameters
/// - `P`: the type of points in the sieve.
/// - `T`: the type of payloads associated with arrows. Defaults to `()`.
#[derive(Clone, Debug)]
pub struct InMemorySieve<P, T = ()>
where
    P: Ord + std::fmt::Debug,
{
    /// Outgoing adjacency: maps each point to its (destination, payload) pairs.
    pub adjacency_out: HashMap<P, Vec<(P, T)>>,
    /// Incoming adjacency: maps each point to its (source, payload) pairs.
    pub adjacency_in: HashMap<P, Vec<(P, T)>>,
    order: Vec<P>,
}

impl<P: Copy + Eq + Hash + Ord + std::fmt::Debug, T> Default for InMemorySieve<P, T> {
    fn default() -> Self {
        Self {
            adjacency_out: HashMap::new(),
            adjacency_in: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<P: Copy + Eq + Hash + Ord + std::fmt::Debug, T: Clone> InMemorySieve<P, T> {
    /// Creates a new, empty `InMemorySieve`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs an `InMemorySieve` from an iterator of arrows.
    ///
    /// ```rust
    /// use sieve_bundle::topology::sieve::{InMemorySieve, Sieve};
    /// let sieve = InMemorySieve::from_arrows(vec![(1u32, 2, "a"), (1, 3, "b")]);
    /// assert_eq!(sieve.cone(1).count(), 2);
    /// ```
    pub fn from_arrows<I: IntoIterator<Item = (P, P, T)>>(arrows: I) -> Self {
        let mut sieve = Self::default();
        for (src, dst, payload) in arrows {
            sieve.add_arrow(src, dst, payload);
        }
        sieve
    }
}

impl<P: Copy + Eq + Hash + Ord + std::fmt::Debug, T> InMemorySieve<P, T> {
    #[inline]
    pub fn contains(&self, p: P) -> bool {
        self.adjacency_out.contains_key(&p)
    }

    #[inline]
    pub fn has_arrow(&self, src: P, dst: P) -> bool {
        self.adjacency_out
            .get(&src)
            .is_some_and(|v| v.iter().any(|(d, _)| *d == dst))
    }

    /// Total number of arrows.
    pub fn num_arrows(&self) -> usize {
        self.adjacency_out.values().map(Vec::len).sum()
    }

    #[inline]
    fn touch(&mut self, p: P) {
        if !self.adjacency_out.contains_key(&p) {
            self.adjacency_out.insert(p, Vec::new());
            self.adjacency_in.insert(p, Vec::new());
            self.order.push(p);
        }
    }

    #[cfg(debug_assertions)]
    pub fn debug_assert_consistent(&self) {
        for (src, outs) in &self.adjacency_out {
            for (dst, _) in outs {
                let ok = self
                    .adjacency_in
                    .get(dst)
                    .is_some_and(|ins| ins.iter().any(|(s, _)| s == src));
                debug_assert!(
                    ok,
                    "Missing mirror in[{dst:?}] for out edge ({src:?} -> {dst:?})"
                );
            }
        }
        debug_assert_eq!(self.order.len(), self.adjacency_out.len());
    }
}

type ConeRefMapIter<'a, P, T> =
    std::iter::Map<std::slice::Iter<'a, (P, T)>, fn(&'a (P, T)) -> (P, &'a T)>;

impl<P: Copy + Eq + Hash + Ord + std::fmt::Debug, T: Clone> Sieve for InMemorySieve<P, T> {
    type Point = P;
    type Payload = T;
    type ConeIter<'a>
        = ConeRefMapIter<'a, P, T>
    where
        Self: 'a;
    type SupportIter<'a>
        = ConeRefMapIter<'a, P, T>
    where
        Self: 'a;

    fn cone<'a>(&'a self, p: P) -> Self::ConeIter<'a> {
        fn map_fn<P: Copy, T>((dst, pay): &(P, T)) -> (P, &T) {
            (*dst, pay)
        }
        let f: fn(&'a (P, T)) -> (P, &'a T) = map_fn::<P, T>;
        self.adjacency_out
            .get(&p)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(f)
    }

    fn support<'a>(&'a self, p: P) -> Self::SupportIter<'a> {
        fn map_fn<P: Copy, T>((src, pay): &(P, T)) -> (P, &T) {
            (*src, pay)
        }
        let f: fn(&'a (P, T)) -> (P, &'a T) = map_fn::<P, T>;
        self.adjacency_in
            .get(&p)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(f)
    }

    fn add_arrow(&mut self, src: P, dst: P, payload: T) {
        self.touch(src);
        self.touch(dst);
        let outs = self.adjacency_out.entry(src).or_default();
        if let Some(slot) = outs.iter_mut().find(|(d, _)| *d == dst) {
            slot.1 = payload.clone();
            if let Some(ins) = self.adjacency_in.get_mut(&dst) {
                if let Some(back) = ins.iter_mut().find(|(s, _)| *s == src) {
                    back.1 = payload;
                }
            }
        } else {
            outs.push((dst, payload.clone()));
            self.adjacency_in.entry(dst).or_default().push((src, payload));
        }
        #[cfg(debug_assertions)]
        self.debug_assert_consistent();
    }

    fn remove_arrow(&mut self, src: P, dst: P) -> Option<T> {
        let outs = self.adjacency_out.get_mut(&src)?;
        let pos = outs.iter().position(|(d, _)| *d == dst)?;
        let (_, payload) = outs.remove(pos);
        if let Some(ins) = self.adjacency_in.get_mut(&dst) {
            ins.retain(|(s, _)| *s != src);
        }
        Some(payload)
    }

    fn add_point(&mut self, p: P) {
        self.touch(p);
    }

    fn points<'a>(&'a self) -> Box<dyn Iterator<Item = P> + 'a> {
        Box::new(self.order.iter().copied())
    }

    fn num_points(&self) -> usize {
        self.order.len()
    }
}
