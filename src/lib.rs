#![cfg_attr(docsrs, feature(doc_cfg))]
//! # sieve-bundle
//!
//! sieve-bundle is a distributed, topology-indexed storage layer for
//! unstructured simplicial meshes. It keeps the incidence structure of a mesh
//! as a patched sieve, attaches typed per-point data to it through sections,
//! and moves that data between the processes of a group.
//!
//! ## Features
//! - `Topology`: one sieve per patch, height/depth strata, integer labels and send/receive overlaps
//! - `Section<V>`: variable-length per-point storage with constrained (boundary) slots
//! - `Bundle` and `Mesh`: named section registries, discretization, boundary conditions
//! - Collective section completion with pluggable merge rules (`CopyDelta`, `AddDelta`)
//! - A memoizing `NumberingFactory` producing contiguous global numberings
//! - Simplex geometry (Jacobian, inverse, determinant) and point location
//! - Communication backends: serial (`NoComm`), threads (`ThreadComm`) and MPI (`MpiComm`)
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! sieve-bundle = "0.1"
//! # Optional features:
//! # features = ["mpi-support", "check-invariants"]
//! ```
//!
//! ## Conventions
//!
//! Arrows point from a covering entity to what it covers (`cell → edge → vertex`).
//! Cells have height 0, vertices have depth 0. Strata are computed by
//! [`Topology::stratify`](topology::Topology::stratify) and go stale on any
//! arrow insertion.
//!
//! The library logs through the `log` facade and never installs a logger.

pub mod algs;
pub mod data;
pub mod debug_invariants;
pub mod geometry;
pub mod mesh;
pub mod mesh_error;
pub mod overlap;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::communicator::{CommTag, Communicator, NoComm, ThreadComm};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::completion::{complete_section, complete_section_with_tags};
    pub use crate::data::atlas::Atlas;
    pub use crate::data::bc::{BOUNDARY_MARKER, BoundaryCondition};
    pub use crate::data::bundle::Bundle;
    pub use crate::data::discretization::Discretization;
    pub use crate::data::numbering::{Numbering, NumberingFactory, PointSelector};
    pub use crate::data::section::{PairValue, Section};
    pub use crate::geometry::ElementGeometry;
    pub use crate::mesh::{BcValue, COORDINATES, Mesh, MeshBuilder};
    pub use crate::mesh_error::MeshError;
    pub use crate::overlap::delta::{AddDelta, CopyDelta, ValueDelta};
    pub use crate::overlap::overlap::{Overlap, OverlapPair, SharedPoint};
    pub use crate::topology::point::{DEFAULT_PATCH, PatchId, PointId};
    pub use crate::topology::sieve::{InMemorySieve, Sieve};
    pub use crate::topology::Topology;
}
