//! Stage 1 of section completion: exchange value counts with each neighbor.
//!
//! The exchange is symmetric: every neighbor receives exactly one count message
//! from us and sends us exactly one, even when one direction carries nothing.
//! Every handle is drained before returning, even if an error occurs.

use std::collections::{BTreeMap, BTreeSet};

use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::algs::completion::neighbour_links::NeighbourLinks;
use crate::algs::wire::{WireCount, cast_slice, expect_exact_len};
use crate::mesh_error::MeshError;

/// Returns `nbr → number of values nbr will send us`.
pub fn exchange_sizes_symmetric<C>(
    links: &NeighbourLinks,
    comm: &C,
    tag: CommTag,
    neighbors: &BTreeSet<usize>,
) -> Result<BTreeMap<usize, usize>, MeshError>
where
    C: Communicator,
{
    let counts = neighbors
        .iter()
        .map(|&nbr| Ok((nbr, WireCount::new(links.send_count(nbr))?)))
        .collect::<Result<Vec<_>, MeshError>>()?;

    // 1) post all receives
    let recvs: Vec<_> = neighbors
        .iter()
        .map(|&nbr| (nbr, comm.irecv(nbr, tag.as_u16())))
        .collect();

    // 2) post all sends
    let sends: Vec<_> = counts
        .iter()
        .map(|(nbr, count)| comm.isend(*nbr, tag.as_u16(), cast_slice(std::slice::from_ref(count))))
        .collect();

    // 3) wait for all receives, collect counts (but do not early-return)
    let mut sizes_in = BTreeMap::new();
    let mut maybe_err = None;
    for (nbr, h) in recvs {
        match h.wait() {
            Some(data) => match expect_exact_len(data.len(), std::mem::size_of::<WireCount>()) {
                Ok(()) => {
                    let cnt: WireCount = bytemuck::pod_read_unaligned(&data);
                    sizes_in.insert(nbr, cnt.get());
                }
                Err(msg) if maybe_err.is_none() => {
                    maybe_err = Some(MeshError::CommError {
                        neighbor: nbr,
                        message: format!("size header: {msg}"),
                    });
                }
                Err(_) => {}
            },
            None if maybe_err.is_none() => {
                maybe_err = Some(MeshError::CommError {
                    neighbor: nbr,
                    message: format!("failed to receive size from rank {nbr}"),
                });
            }
            None => {}
        }
    }

    // 4) drain sends
    for s in sends {
        let _ = s.wait();
    }

    match maybe_err {
        Some(e) => Err(e),
        None => Ok(sizes_in),
    }
}
