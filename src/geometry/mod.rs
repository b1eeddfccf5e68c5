//! Geometry of simplicial cells: affine maps, Jacobians and point containment.

pub mod simplex;

pub use simplex::{ElementGeometry, LOCATE_TOLERANCE};
