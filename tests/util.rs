#![allow(dead_code)]
use std::sync::Arc;

use sieve_bundle::{
    algs::communicator::{Communicator, ThreadComm},
    data::{numbering::NumberingFactory, section::Section},
    mesh::{COORDINATES, Mesh, MeshBuilder},
    overlap::overlap::{OverlapPair, SharedPoint},
    topology::{Topology, point::PointId},
};

pub fn pid(u: u64) -> PointId {
    PointId::new(u)
}

/// Run `f` once per rank of a fresh `n`-rank thread group; results by rank.
pub fn run_ranks<T, F>(n: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(ThreadComm) -> T + Sync,
{
    let comms = ThreadComm::world(n);
    std::thread::scope(|s| {
        let f = &f;
        let handles: Vec<_> = comms
            .into_iter()
            .map(|c| s.spawn(move || f(c)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}

/// Two unit right triangles forming the square `[0,1]^2`, on rank 0 only.
///
/// Cells 0 and 1; vertices 2 = (0,0), 3 = (1,0), 4 = (1,1), 5 = (0,1).
pub fn unit_square<C: Communicator>(comm: C) -> Mesh<C> {
    MeshBuilder::from_cells(
        comm,
        2,
        &[vec![0, 1, 3], vec![2, 3, 1]],
        &[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0],
        2,
        0,
    )
    .unwrap()
}

/// A strip of two triangles split over two ranks, one cell each.
///
/// Global vertices 0 = (0,0), 1 = (1,0), 2 = (0,1), 3 = (1,1). Rank 0 holds
/// cell (0, 1, 2), rank 1 holds cell (1, 3, 2). On every rank the cell is point
/// 0 and its vertices are points 1, 2, 3 in cone order, so global vertices 1
/// and 2 are shared: rank 0 points 2, 3 alias rank 1 points 1, 3.
pub fn split_strip(comm: ThreadComm) -> Mesh<ThreadComm> {
    let rank = comm.rank();
    let coords: [f64; 6] = if rank == 0 {
        [0.0, 0.0, 1.0, 0.0, 0.0, 1.0]
    } else {
        [1.0, 0.0, 1.0, 1.0, 0.0, 1.0]
    };
    let mut topology = Topology::new(0);
    for v in 1..=3 {
        topology.add_arrow(0, pid(0), pid(v), v as i32);
    }
    topology.stratify().unwrap();
    let shared = if rank == 0 {
        [
            SharedPoint { local: pid(2), rank: 1, remote: pid(1) },
            SharedPoint { local: pid(3), rank: 1, remote: pid(3) },
        ]
    } else {
        [
            SharedPoint { local: pid(1), rank: 0, remote: pid(2) },
            SharedPoint { local: pid(3), rank: 0, remote: pid(3) },
        ]
    };
    topology.set_overlaps(OverlapPair::from_shared_points(rank, shared));

    let mut section = Section::new();
    MeshBuilder::build_coordinates(&topology, 0, &mut section, 2, 1, &coords).unwrap();
    let mut mesh = Mesh::with_factory(comm, 2, 0, Arc::new(NumberingFactory::new(0)));
    mesh.set_topology(topology);
    mesh.set_real_section(COORDINATES, section);
    mesh.set_distributed(true);
    mesh
}
