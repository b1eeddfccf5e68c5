//! High-level `complete_section` orchestration: neighbour_links → exchange_sizes → exchange_data.
//!
//! Completion is collective: every rank of the group must call it, in the same
//! order relative to other collective operations, with overlaps that mirror
//! each other (a send link on one rank is a receive link on its peer).

use crate::algs::communicator::{CommTag, Communicator, SectionCommTags};
use crate::algs::completion::{
    data_exchange::exchange_data_symmetric, neighbour_links::neighbour_links,
    size_exchange::exchange_sizes_symmetric,
};
use crate::data::section::Section;
use crate::mesh_error::MeshError;
use crate::overlap::delta::ValueDelta;
use crate::overlap::overlap::{Overlap, OverlapPair};
use crate::topology::point::PatchId;

/// Base tag of [`complete_section`].
pub const DEFAULT_COMPLETION_TAG: CommTag = CommTag::new(0xBEEF);

/// Complete `patch` of `section` using explicit communication tags.
///
/// Values at points of the send overlap are pushed to their aliases on peer
/// ranks; values arriving for points of the receive overlap are merged with `D`.
/// With no peers the call returns immediately.
pub fn complete_section_with_tags<V, D, C>(
    section: &mut Section<V>,
    patch: PatchId,
    send: &Overlap,
    recv: &Overlap,
    comm: &C,
    tags: SectionCommTags,
) -> Result<(), MeshError>
where
    V: Clone + Default,
    D: ValueDelta<V>,
    C: Communicator,
{
    if !section.is_allocated() {
        return Err(MeshError::SectionNotAllocated);
    }
    let my_rank = comm.rank();

    // 1) discover which points each neighbor needs
    let links = neighbour_links(section, patch, send, recv, my_rank);
    let neighbors = links.neighbors();
    if neighbors.is_empty() {
        return Ok(());
    }

    // 2) exchange the item counts
    let counts = exchange_sizes_symmetric(&links, comm, tags.sizes, &neighbors)?;

    // 3) exchange the values & fuse into our section
    exchange_data_symmetric::<V, D, C>(&links, &counts, comm, tags.data, section, patch, &neighbors)
}

/// Complete `patch` of `section` over a topology's overlaps with the default tags.
pub fn complete_section<V, D, C>(
    section: &mut Section<V>,
    patch: PatchId,
    overlaps: &OverlapPair,
    comm: &C,
) -> Result<(), MeshError>
where
    V: Clone + Default,
    D: ValueDelta<V>,
    C: Communicator,
{
    let tags = SectionCommTags::from_base(DEFAULT_COMPLETION_TAG);
    complete_section_with_tags::<V, D, C>(section, patch, &overlaps.send, &overlaps.recv, comm, tags)
}
