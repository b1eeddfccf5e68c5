//! Affine geometry of linear simplices.
//!
//! Vertices are given as a flat array of `dim + 1` points with `dim`
//! components each, `v0` first. The Jacobian maps the bi-unit reference
//! simplex onto the element:
//!
//! `J[d][f] = ½ (x_{f+1,d} − x_{0,d})`
//!
//! so `detJ` is one quarter (2D) or one eighth (3D) of the parallelotope
//! spanned by the edges at `v0`. Reference coordinates `ξ = ½ J⁻¹ (x − v0)`
//! then lie in the unit simplex exactly when `x` lies in the element.

use crate::mesh_error::MeshError;
use crate::topology::point::PointId;

/// Tolerance of [`ElementGeometry::contains`].
pub const LOCATE_TOLERANCE: f64 = 1e-10;

/// Affine map of one triangle or tetrahedron. Matrices are row-major with
/// stride `dim`; unused trailing entries are zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementGeometry {
    pub dim: usize,
    pub v0: [f64; 3],
    pub j: [f64; 9],
    pub inv_j: [f64; 9],
    pub det_j: f64,
}

impl ElementGeometry {
    /// Compute the geometry of `cell` from its flattened vertex coordinates.
    ///
    /// # Errors
    /// - [`MeshError::UnsupportedDimension`] unless `dim` is 2 or 3.
    /// - [`MeshError::InvalidGeometry`] when `coords` does not hold `dim + 1` vertices.
    /// - [`MeshError::SingularJacobian`] for degenerate elements.
    pub fn compute(cell: PointId, dim: usize, coords: &[f64]) -> Result<Self, MeshError> {
        if dim != 2 && dim != 3 {
            return Err(MeshError::UnsupportedDimension(dim));
        }
        if coords.len() != (dim + 1) * dim {
            return Err(MeshError::InvalidGeometry(format!(
                "cell {cell}: expected {} coordinates for {} vertices, got {}",
                (dim + 1) * dim,
                dim + 1,
                coords.len()
            )));
        }

        let mut g = ElementGeometry {
            dim,
            v0: [0.0; 3],
            j: [0.0; 9],
            inv_j: [0.0; 9],
            det_j: 0.0,
        };
        g.v0[..dim].copy_from_slice(&coords[..dim]);
        for d in 0..dim {
            for f in 0..dim {
                g.j[d * dim + f] = 0.5 * (coords[(f + 1) * dim + d] - coords[d]);
            }
        }

        let j = &g.j;
        if dim == 2 {
            g.det_j = j[0] * j[3] - j[1] * j[2];
            if g.det_j == 0.0 {
                return Err(MeshError::SingularJacobian { cell, det: g.det_j });
            }
            let inv = 1.0 / g.det_j;
            g.inv_j[..4].copy_from_slice(&[inv * j[3], -inv * j[1], -inv * j[2], inv * j[0]]);
        } else {
            // cofactors of J, transposed into the inverse
            let c00 = j[4] * j[8] - j[5] * j[7];
            let c01 = j[5] * j[6] - j[3] * j[8];
            let c02 = j[3] * j[7] - j[4] * j[6];
            g.det_j = j[0] * c00 + j[1] * c01 + j[2] * c02;
            if g.det_j == 0.0 {
                return Err(MeshError::SingularJacobian { cell, det: g.det_j });
            }
            let inv = 1.0 / g.det_j;
            g.inv_j = [
                inv * c00,
                inv * (j[2] * j[7] - j[1] * j[8]),
                inv * (j[1] * j[5] - j[2] * j[4]),
                inv * c01,
                inv * (j[0] * j[8] - j[2] * j[6]),
                inv * (j[2] * j[3] - j[0] * j[5]),
                inv * c02,
                inv * (j[1] * j[6] - j[0] * j[7]),
                inv * (j[0] * j[4] - j[1] * j[3]),
            ];
        }
        Ok(g)
    }

    /// Reference coordinates `ξ = ½ J⁻¹ (x − v0)` of a physical point.
    ///
    /// # Errors
    /// [`MeshError::DimensionMismatch`] unless `x` has exactly `dim` components.
    pub fn reference_coords(&self, x: &[f64]) -> Result<[f64; 3], MeshError> {
        let dim = self.dim;
        if x.len() != dim {
            return Err(MeshError::DimensionMismatch {
                expected: dim,
                found: x.len(),
            });
        }
        let mut xi = [0.0; 3];
        for (r, out) in xi.iter_mut().enumerate().take(dim) {
            *out = 0.5
                * (0..dim)
                    .map(|c| self.inv_j[r * dim + c] * (x[c] - self.v0[c]))
                    .sum::<f64>();
        }
        Ok(xi)
    }

    /// Whether `x` lies in the closed element, up to `tol`.
    pub fn contains(&self, x: &[f64], tol: f64) -> Result<bool, MeshError> {
        let xi = self.reference_coords(x)?;
        let xi = &xi[..self.dim];
        Ok(xi.iter().all(|&c| c >= -tol) && xi.iter().sum::<f64>() <= 1.0 + tol)
    }

    /// Physical coordinates of reference point `xi`.
    pub fn map_to_physical(&self, xi: &[f64]) -> [f64; 3] {
        let dim = self.dim;
        let mut x = self.v0;
        for (d, out) in x.iter_mut().enumerate().take(dim) {
            *out += 2.0
                * (0..dim)
                    .map(|f| self.j[d * dim + f] * xi.get(f).copied().unwrap_or(0.0))
                    .sum::<f64>();
        }
        x
    }
}
