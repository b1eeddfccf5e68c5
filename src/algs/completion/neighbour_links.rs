//! Build the per-peer send and receive plans for section completion.
//!
//! For each neighbor rank the plan lists the local points whose values travel,
//! with the number of values each contributes. Both sides order their lists by
//! `(sender point, receiver point)`, so the sender's payload lines up with the
//! receiver's list without shipping point ids.
//!
//! Points present in an overlap but absent from the section are skipped.

use std::collections::{BTreeMap, BTreeSet};

use crate::data::section::Section;
use crate::overlap::overlap::Overlap;
use crate::topology::point::{PatchId, PointId};

/// `(local point, number of values)` in wire order.
pub type LinkList = Vec<(PointId, usize)>;

/// Send and receive plans, keyed by neighbor rank.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NeighbourLinks {
    pub send: BTreeMap<usize, LinkList>,
    pub recv: BTreeMap<usize, LinkList>,
}

impl NeighbourLinks {
    /// Every rank we exchange with, ascending.
    pub fn neighbors(&self) -> BTreeSet<usize> {
        self.send.keys().chain(self.recv.keys()).copied().collect()
    }

    /// Number of values we send to `nbr`.
    pub fn send_count(&self, nbr: usize) -> usize {
        self.send
            .get(&nbr)
            .map_or(0, |l| l.iter().map(|(_, n)| n).sum())
    }

    /// Number of values we expect from `nbr`.
    pub fn recv_count(&self, nbr: usize) -> usize {
        self.recv
            .get(&nbr)
            .map_or(0, |l| l.iter().map(|(_, n)| n).sum())
    }
}

fn fiber_len<V: Clone + Default>(section: &Section<V>, patch: PatchId, p: PointId) -> Option<usize> {
    section
        .fiber_dimension(patch, p)
        .map(|d| d.unsigned_abs() as usize)
}

/// Compute the plans for `patch` of `section`.
pub fn neighbour_links<V: Clone + Default>(
    section: &Section<V>,
    patch: PatchId,
    send: &Overlap,
    recv: &Overlap,
    my_rank: usize,
) -> NeighbourLinks {
    let mut out = NeighbourLinks::default();

    // outbound: links_to is already sorted by (local, remote)
    for nbr in send.neighbor_ranks() {
        if nbr == my_rank {
            continue;
        }
        let list: LinkList = send
            .links_to(nbr)
            .into_iter()
            .filter_map(|(local, _)| fiber_len(section, patch, local).map(|n| (local, n)))
            .collect();
        out.send.insert(nbr, list);
    }

    // inbound: order by the sender's point first
    for nbr in recv.neighbor_ranks() {
        if nbr == my_rank {
            continue;
        }
        let mut links = recv.links_to(nbr);
        links.sort_unstable_by_key(|&(local, remote)| (remote, local));
        let list: LinkList = links
            .into_iter()
            .filter_map(|(local, _)| fiber_len(section, patch, local).map(|n| (local, n)))
            .collect();
        out.recv.insert(nbr, list);
    }

    out
}
