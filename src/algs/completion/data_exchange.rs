//! Stage 2 of section completion: exchange the values themselves.
//!
//! All outgoing payloads are packed before anything is fused, so a point that
//! is both sent and received ships its pre-completion value. Incoming payloads
//! are fused in descending neighbor rank, which makes the lowest rank the last
//! writer under [`CopyDelta`](crate::overlap::delta::CopyDelta).

use std::collections::{BTreeMap, BTreeSet};

use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::algs::completion::neighbour_links::NeighbourLinks;
use crate::algs::wire::{cast_slice, decode_records};
use crate::data::section::Section;
use crate::mesh_error::MeshError;
use crate::overlap::delta::ValueDelta;
use crate::topology::point::PatchId;

/// Pack, exchange and fuse one round of values.
pub fn exchange_data_symmetric<V, D, C>(
    links: &NeighbourLinks,
    recv_counts: &BTreeMap<usize, usize>,
    comm: &C,
    tag: CommTag,
    section: &mut Section<V>,
    patch: PatchId,
    neighbors: &BTreeSet<usize>,
) -> Result<(), MeshError>
where
    V: Clone + Default,
    D: ValueDelta<V>,
    C: Communicator,
{
    // 1) pack everything first
    let mut outgoing: BTreeMap<usize, Vec<D::Part>> = BTreeMap::new();
    for &nbr in neighbors {
        let mut scratch = Vec::with_capacity(links.send_count(nbr));
        for &(p, _) in links.send.get(&nbr).map(Vec::as_slice).unwrap_or(&[]) {
            scratch.extend(section.restrict(patch, p)?.iter().map(D::restrict));
        }
        outgoing.insert(nbr, scratch);
    }

    // 2) post receives, then sends
    let recvs: Vec<_> = neighbors
        .iter()
        .map(|&nbr| (nbr, comm.irecv(nbr, tag.as_u16())))
        .collect();
    let sends: Vec<_> = outgoing
        .iter()
        .map(|(&nbr, parts)| {
            log::trace!("completion: sending {} values to rank {nbr}", parts.len());
            comm.isend(nbr, tag.as_u16(), cast_slice(parts))
        })
        .collect();

    // 3) wait for all receives
    let mut incoming: BTreeMap<usize, Vec<D::Part>> = BTreeMap::new();
    let mut maybe_err = None;
    for (nbr, h) in recvs {
        let parts = match h.wait() {
            Some(raw) => decode_records::<D::Part>(&raw, nbr),
            None => Err(MeshError::CommError {
                neighbor: nbr,
                message: format!("failed to receive data from rank {nbr}"),
            }),
        };
        match parts {
            Ok(parts) => {
                let announced = recv_counts.get(&nbr).copied().unwrap_or(0);
                let expected = links.recv_count(nbr);
                if (parts.len() != announced || parts.len() != expected) && maybe_err.is_none() {
                    maybe_err = Some(MeshError::CommError {
                        neighbor: nbr,
                        message: format!(
                            "rank {nbr} sent {} values (announced {announced}), expected {expected}",
                            parts.len()
                        ),
                    });
                }
                incoming.insert(nbr, parts);
            }
            Err(e) if maybe_err.is_none() => maybe_err = Some(e),
            Err(_) => {}
        }
    }
    for s in sends {
        let _ = s.wait();
    }
    if let Some(e) = maybe_err {
        return Err(e);
    }

    // 4) fuse, highest rank first
    for (nbr, parts) in incoming.into_iter().rev() {
        log::trace!("completion: fusing {} values from rank {nbr}", parts.len());
        let mut parts = parts.into_iter();
        for &(p, _) in links.recv.get(&nbr).map(Vec::as_slice).unwrap_or(&[]) {
            for slot in section.restrict_mut(patch, p)?.iter_mut() {
                if let Some(part) = parts.next() {
                    D::fuse(slot, part);
                }
            }
        }
    }
    Ok(())
}
