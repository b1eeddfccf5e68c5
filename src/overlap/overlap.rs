//! Sharing relationships between the local topology and its peers.
//!
//! An [`Overlap`] is a sieve whose arrows run from a local point to a
//! *partition point* standing for a peer rank; the arrow payload is a
//! [`Remote`] naming the peer and the point's alias there. A topology keeps two
//! of them ([`OverlapPair`]): the send overlap lists points whose values this
//! rank pushes to peers, the receive overlap lists points it pulls from peers.

use std::collections::{BTreeMap, BTreeSet};

use crate::topology::point::PointId;
use crate::topology::sieve::{InMemorySieve, Sieve};

/// Metadata that identifies a remote copy of a local point.
#[repr(C)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Remote {
    pub rank: usize,
    pub remote_point: PointId,
}

/// Vertex of the overlap sieve: either a mesh point or a partition marker.
///
/// Keeping the two in separate variants means partition markers can never
/// collide with mesh point ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OvlId {
    Local(PointId),
    Part(usize),
}

/// A sieve that stores sharing relationships with other ranks.
#[derive(Clone, Debug, Default)]
pub struct Overlap {
    sieve: InMemorySieve<OvlId, Remote>,
}

impl Overlap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an overlap arrow: `local --(rank, remote)--> partition(rank)`.
    ///
    /// A point has at most one alias per peer; re-adding replaces the alias.
    pub fn add_link(&mut self, local: PointId, remote_rank: usize, remote: PointId) {
        self.sieve.add_arrow(
            OvlId::Local(local),
            OvlId::Part(remote_rank),
            Remote {
                rank: remote_rank,
                remote_point: remote,
            },
        );
    }

    /// Ranks this overlap talks to, ascending.
    pub fn neighbor_ranks(&self) -> BTreeSet<usize> {
        self.sieve
            .points()
            .filter_map(|p| match p {
                OvlId::Part(r) if self.sieve.support(p).next().is_some() => Some(r),
                _ => None,
            })
            .collect()
    }

    /// `(local, remote)` pairs shared with `nbr`, sorted by `(local, remote)`.
    pub fn links_to(&self, nbr: usize) -> Vec<(PointId, PointId)> {
        let mut links: Vec<_> = self
            .sieve
            .support(OvlId::Part(nbr))
            .filter_map(|(local, r)| match local {
                OvlId::Local(p) => Some((p, r.remote_point)),
                OvlId::Part(_) => None,
            })
            .collect();
        links.sort_unstable();
        links
    }

    /// All remote copies of `local`.
    pub fn remotes(&self, local: PointId) -> Vec<Remote> {
        self.sieve
            .cone(OvlId::Local(local))
            .map(|(_, r)| *r)
            .collect()
    }

    /// Whether `local` is shared with any peer.
    pub fn contains(&self, local: PointId) -> bool {
        self.sieve.cone(OvlId::Local(local)).next().is_some()
    }

    /// Local points that appear in the overlap, in insertion order.
    pub fn local_points(&self) -> impl Iterator<Item = PointId> + '_ {
        self.sieve.points().filter_map(|p| match p {
            OvlId::Local(q) if self.sieve.cone(p).next().is_some() => Some(q),
            _ => None,
        })
    }

    /// Number of `(local, peer)` links.
    pub fn num_links(&self) -> usize {
        self.sieve.num_arrows()
    }

    pub fn is_empty(&self) -> bool {
        self.num_links() == 0
    }
}

/// One entry of a sharing table: `local` is also known as `remote` on `rank`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SharedPoint {
    pub local: PointId,
    pub rank: usize,
    pub remote: PointId,
}

/// Send and receive overlaps of one topology.
#[derive(Clone, Debug, Default)]
pub struct OverlapPair {
    pub send: Overlap,
    pub recv: Overlap,
}

impl OverlapPair {
    /// Build owner-to-ghost overlaps from a sharing table.
    ///
    /// The owner of a shared point is the lowest rank among all sharers. The
    /// owner sends to every other sharer; every non-owner receives from the
    /// owner and from nobody else.
    pub fn from_shared_points<I>(my_rank: usize, shared: I) -> Self
    where
        I: IntoIterator<Item = SharedPoint>,
    {
        let mut by_point: BTreeMap<PointId, Vec<(usize, PointId)>> = BTreeMap::new();
        for s in shared {
            if s.rank != my_rank {
                by_point.entry(s.local).or_default().push((s.rank, s.remote));
            }
        }
        let mut pair = OverlapPair::default();
        for (local, mut peers) in by_point {
            peers.sort_unstable();
            let owner = peers[0].0.min(my_rank);
            if owner == my_rank {
                for (rank, remote) in peers {
                    pair.send.add_link(local, rank, remote);
                }
            } else if let Some(&(rank, remote)) = peers.iter().find(|(r, _)| *r == owner) {
                pair.recv.add_link(local, rank, remote);
            }
        }
        pair
    }

    pub fn is_empty(&self) -> bool {
        self.send.is_empty() && self.recv.is_empty()
    }

    /// Union of send and receive peers, ascending.
    pub fn neighbor_ranks(&self) -> BTreeSet<usize> {
        let mut all = self.send.neighbor_ranks();
        all.extend(self.recv.neighbor_ranks());
        all
    }
}
