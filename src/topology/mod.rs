//! Top-level module for mesh topology abstractions.
//!
//! This module provides:
//! - `PointId` / `PatchId` identifiers
//! - The `Sieve` trait, its in-memory implementation and strata computation
//! - Integer labels
//! - `Topology`, the patched incidence structure a mesh is built on
//!
//! Most users will interact with [`Topology`] directly.

pub mod cache;
pub mod labels;
pub mod mesh_topology;
pub mod point;
pub mod sieve;

pub use cache::InvalidateCache;
pub use labels::{Label, LabelSet};
pub use mesh_topology::{ArrowOrder, PatchSieve, Topology};
pub use point::{DEFAULT_PATCH, PatchId, PointId};
pub use sieve::*;
