//! MeshError: unified error type for sieve-bundle public APIs
//!
//! Every fallible operation in the crate returns `Result<_, MeshError>`; nothing in
//! the library panics on bad input or a failed exchange.

use crate::topology::point::{PatchId, PointId};
use thiserror::Error;

/// Unified error type for topology, section, geometry and communication operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    /// The arrows of a patch contain a cycle; expected a DAG.
    #[error("Topology error: cycle detected in patch {0} (expected DAG)")]
    CycleDetected(PatchId),
    /// A query named a patch the topology does not have.
    #[error("Topology error: unknown patch {0}")]
    UnknownPatch(PatchId),
    /// Height/depth were queried before `stratify()` or after a structural change.
    #[error("Topology error: strata of patch {0} are stale; call stratify() first")]
    StrataStale(PatchId),
    /// The point is not part of the patch.
    #[error("Topology error: point {point} is not in patch {patch}")]
    UnknownPoint { patch: PatchId, point: PointId },
    /// A label was written before it was created.
    #[error("Topology error: no label `{name}` on patch {patch}")]
    UnknownLabel { patch: PatchId, name: String },

    /// `restrict`/`update` before `allocate()`.
    #[error("Section error: storage has not been allocated")]
    SectionNotAllocated,
    /// Fiber dimension change after `allocate()`.
    #[error("Section error: cannot change fiber dimension of {point} after allocation")]
    SectionAlreadyAllocated { point: PointId },
    /// The point has no fiber in this section.
    #[error("Section error: point {point} is not in patch {patch} of the section")]
    PointNotInSection { patch: PatchId, point: PointId },
    /// `update_bc` on a point whose fiber dimension is not negative.
    #[error("Section error: point {point} in patch {patch} is not constrained")]
    NotConstrained { patch: PatchId, point: PointId },
    /// Value slice length does not match the fiber dimension.
    #[error("Section error: point {point} expects {expected} values, got {found}")]
    SliceLengthMismatch {
        point: PointId,
        expected: usize,
        found: usize,
    },
    /// Atlas bookkeeping is inconsistent.
    #[error("Section error: atlas invariant violated: {0}")]
    AtlasCorrupted(String),
    /// A named section the operation depends on is missing.
    #[error("Bundle error: no section named `{0}`")]
    MissingSection(String),

    /// Only triangles (2) and tetrahedra (3) are supported.
    #[error("Geometry error: unsupported dimension {0}")]
    UnsupportedDimension(usize),
    /// No height-0 cell contains the query point.
    #[error("Geometry error: point {0:?} lies outside the domain")]
    PointOutsideDomain(Vec<f64>),
    /// A coordinate tuple has the wrong number of components.
    #[error("Geometry error: expected {expected} coordinates, got {found}")]
    DimensionMismatch { expected: usize, found: usize },
    /// The Jacobian of a cell is not invertible.
    #[error("Geometry error: cell {cell} has a singular Jacobian (detJ = {det})")]
    SingularJacobian { cell: PointId, det: f64 },
    /// The closure of a cell does not describe a simplex.
    #[error("Geometry error: {0}")]
    InvalidGeometry(String),

    /// A boundary condition was evaluated without a function.
    #[error("Boundary error: no function set for boundary label `{0}`")]
    MissingBoundaryFunction(String),

    /// An item count does not fit the 32-bit wire count.
    #[error("Communication error: count {0} does not fit in a wire count")]
    CountOverflow(usize),
    /// A message exchange with a neighbor failed or delivered a malformed payload.
    #[error("Communication error with rank {neighbor}: {message}")]
    CommError { neighbor: usize, message: String },
}
