//! Boundary conditions: a label selecting boundary points and a scalar functional.

use std::fmt;
use std::sync::Arc;

use crate::mesh_error::MeshError;

/// Scalar function of a point's coordinates.
pub type BoundaryFunction = Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>;

/// Label value that marks boundary points.
pub const BOUNDARY_MARKER: i32 = 1;

/// A boundary condition: points labelled [`BOUNDARY_MARKER`] under `label_name`
/// get constrained slots filled with `function(coords)`.
///
/// An empty label name means the field has no boundary.
#[derive(Clone, Default)]
pub struct BoundaryCondition {
    label_name: String,
    function: Option<BoundaryFunction>,
}

impl BoundaryCondition {
    pub fn new(label_name: impl Into<String>, function: BoundaryFunction) -> Self {
        Self {
            label_name: label_name.into(),
            function: Some(function),
        }
    }

    pub fn label_name(&self) -> &str {
        &self.label_name
    }

    pub fn set_label_name(&mut self, name: impl Into<String>) {
        self.label_name = name.into();
    }

    pub fn set_function(&mut self, function: BoundaryFunction) {
        self.function = Some(function);
    }

    /// Whether a boundary label is configured.
    pub fn is_active(&self) -> bool {
        !self.label_name.is_empty()
    }

    /// Evaluate the boundary functional at `coords`.
    pub fn evaluate(&self, coords: &[f64]) -> Result<f64, MeshError> {
        self.function
            .as_ref()
            .map(|f| f(coords))
            .ok_or_else(|| MeshError::MissingBoundaryFunction(self.label_name.clone()))
    }
}

impl fmt::Debug for BoundaryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundaryCondition")
            .field("label_name", &self.label_name)
            .field("has_function", &self.function.is_some())
            .finish()
    }
}
