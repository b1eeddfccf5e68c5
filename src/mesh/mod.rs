//! Mesh: a [`Bundle`] with a spatial dimension, a discretization, boundary
//! conditions and a numbering factory.
//!
//! `Mesh` dereferences to its bundle, so topology access and the section
//! registries are available directly on it. Coordinates live in the real
//! section called [`COORDINATES`], one `embed_dim`-vector per vertex.

pub mod bc_values;
pub mod builder;

use std::collections::BTreeMap;
use std::fmt::{Display, Write as _};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::algs::communicator::{Communicator, NoComm};
use crate::data::bc::{BOUNDARY_MARKER, BoundaryCondition};
use crate::data::bundle::Bundle;
use crate::data::discretization::Discretization;
use crate::data::numbering::{Numbering, NumberingFactory, PointSelector};
use crate::data::section::Section;
use crate::geometry::{ElementGeometry, LOCATE_TOLERANCE};
use crate::mesh_error::MeshError;
use crate::topology::mesh_topology::Topology;
use crate::topology::point::{DEFAULT_PATCH, PatchId, PointId};

pub use bc_values::{BC_VALUES_TAG, BcValue};
pub use builder::MeshBuilder;

/// Name of the real section holding vertex coordinates.
pub const COORDINATES: &str = "coordinates";

/// Per-point `(boundary id, value)` pairs attached to boundary points.
pub type BoundarySection = Section<(i32, f64)>;

/// Distributed simplicial mesh.
#[derive(Debug)]
pub struct Mesh<C: Communicator = NoComm> {
    bundle: Bundle<C>,
    dim: usize,
    factory: Arc<NumberingFactory>,
    discretization: Discretization,
    boundary_condition: BoundaryCondition,
    bc_values: BTreeMap<i32, BcValue>,
    boundaries: Option<BoundarySection>,
}

impl<C: Communicator> Deref for Mesh<C> {
    type Target = Bundle<C>;

    fn deref(&self) -> &Bundle<C> {
        &self.bundle
    }
}

impl<C: Communicator> DerefMut for Mesh<C> {
    fn deref_mut(&mut self) -> &mut Bundle<C> {
        &mut self.bundle
    }
}

impl<C: Communicator> Mesh<C> {
    /// Empty mesh of topological dimension `dim`, sharing the process-wide
    /// numbering factory for `debug`.
    pub fn new(comm: C, dim: usize, debug: i32) -> Self {
        Self::with_factory(comm, dim, debug, NumberingFactory::singleton(debug))
    }

    pub fn with_factory(comm: C, dim: usize, debug: i32, factory: Arc<NumberingFactory>) -> Self {
        Self {
            bundle: Bundle::new(comm, debug),
            dim,
            factory,
            discretization: Discretization::new(),
            boundary_condition: BoundaryCondition::default(),
            bc_values: BTreeMap::new(),
            boundaries: None,
        }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dim
    }

    pub fn factory(&self) -> &Arc<NumberingFactory> {
        &self.factory
    }

    pub fn discretization(&self) -> &Discretization {
        &self.discretization
    }

    pub fn discretization_mut(&mut self) -> &mut Discretization {
        &mut self.discretization
    }

    pub fn set_discretization(&mut self, discretization: Discretization) {
        self.discretization = discretization;
    }

    pub fn boundary_condition(&self) -> &BoundaryCondition {
        &self.boundary_condition
    }

    pub fn boundary_condition_mut(&mut self) -> &mut BoundaryCondition {
        &mut self.boundary_condition
    }

    pub fn set_boundary_condition(&mut self, bc: BoundaryCondition) {
        self.boundary_condition = bc;
    }

    /// The coordinates section, if any.
    pub fn coordinates(&self) -> Option<&Section<f64>> {
        self.real_section(COORDINATES)
    }

    /// The foliated boundary section, created empty on first use.
    pub fn get_boundaries_new(&mut self) -> &mut BoundarySection {
        self.boundaries.get_or_insert_with(Section::new)
    }

    /// Global numbering of `selector`'s points in `patch`. Collective on a cache miss.
    pub fn numbering(
        &self,
        patch: PatchId,
        selector: &PointSelector,
    ) -> Result<Arc<Numbering>, MeshError> {
        self.factory
            .get_numbering(self.topology(), patch, selector, self.comm())
    }

    // --- fields ---

    /// Lay out `section` for the current discretization on the default patch
    /// and fill boundary slots.
    ///
    /// Every point of depth `d < dim` gets `num_dof(d)` values. Points labelled
    /// [`BOUNDARY_MARKER`] under the boundary label are constrained and receive
    /// the boundary functional evaluated at their coordinates (or at the
    /// centroid of their vertices when they carry none).
    pub fn setup_field(&self, section: &mut Section<f64>) -> Result<(), MeshError> {
        setup_field_on(
            self.topology(),
            self.coordinates(),
            &self.discretization,
            &self.boundary_condition,
            self.dim,
            section,
        )
    }

    /// [`setup_field`](Self::setup_field) on the registered real section `name`,
    /// created if absent.
    pub fn setup_named_field(&mut self, name: &str) -> Result<(), MeshError> {
        if name == COORDINATES {
            return Err(MeshError::InvalidGeometry(
                "the coordinates section cannot be set up as a field".into(),
            ));
        }
        let debug = self.debug();
        let mut section = self
            .real_sections_mut()
            .remove(name)
            .unwrap_or_default();
        if debug > 0 && section.patches().next().is_none() {
            log::debug!("Creating new real section: {name}");
        }
        let res = self.setup_field(&mut section);
        self.set_real_section(name, section);
        res
    }

    // --- geometry ---

    /// Affine geometry of simplex `cell`, its vertices taken in closure order.
    ///
    /// # Errors
    /// [`MeshError::UnsupportedDimension`] unless the mesh is 2D or 3D,
    /// [`MeshError::InvalidGeometry`] unless the closure holds exactly
    /// `dim + 1` vertices with coordinates.
    pub fn compute_element_geometry(
        &self,
        coordinates: &Section<f64>,
        patch: PatchId,
        cell: PointId,
    ) -> Result<ElementGeometry, MeshError> {
        if self.dim != 2 && self.dim != 3 {
            return Err(MeshError::UnsupportedDimension(self.dim));
        }
        let coords = cell_vertex_coordinates(self.topology(), coordinates, patch, cell, self.dim)?;
        ElementGeometry::compute(cell, self.dim, &coords)
    }

    /// First cell of `patch`, in insertion order, containing `point`.
    ///
    /// Degenerate cells (zero `detJ`) contain nothing and are skipped.
    pub fn locate_point(&self, patch: PatchId, point: &[f64]) -> Result<PointId, MeshError> {
        if self.dim != 2 && self.dim != 3 {
            return Err(MeshError::UnsupportedDimension(self.dim));
        }
        if point.len() != self.dim {
            return Err(MeshError::DimensionMismatch {
                expected: self.dim,
                found: point.len(),
            });
        }
        let coordinates = self
            .coordinates()
            .ok_or_else(|| MeshError::MissingSection(COORDINATES.into()))?;
        for &cell in self.topology().height_stratum(patch, 0)? {
            let g = match self.compute_element_geometry(coordinates, patch, cell) {
                Ok(g) => g,
                Err(MeshError::SingularJacobian { .. }) => continue,
                Err(e) => return Err(e),
            };
            if g.contains(point, LOCATE_TOLERANCE)? {
                return Ok(cell);
            }
        }
        Err(MeshError::PointOutsideDomain(point.to_vec()))
    }

    /// Largest `detJ` over the cells of every patch; 0 for a mesh without cells.
    /// Degenerate cells count as volume 0.
    pub fn get_max_volume(&self) -> Result<f64, MeshError> {
        let coordinates = self
            .coordinates()
            .ok_or_else(|| MeshError::MissingSection(COORDINATES.into()))?;
        let mut max_volume = 0.0_f64;
        for patch in self.topology().patches() {
            for &cell in self.topology().height_stratum(patch, 0)? {
                let det_j = match self.compute_element_geometry(coordinates, patch, cell) {
                    Ok(g) => g.det_j,
                    Err(MeshError::SingularJacobian { .. }) => 0.0,
                    Err(e) => return Err(e),
                };
                max_volume = max_volume.max(det_j);
            }
        }
        Ok(max_volume)
    }

    /// Dump of the topology and every registered section.
    pub fn view(&self, name: &str) -> String {
        let mut out = if name.is_empty() {
            "viewing a Mesh\n".to_string()
        } else {
            format!("viewing Mesh '{name}'\n")
        };
        out.push_str(&self.topology().view("mesh topology"));
        for (n, s) in self.real_sections().iter() {
            out.push_str(&s.view(n));
        }
        for (n, s) in self.int_sections().iter() {
            out.push_str(&s.view(n));
        }
        for (n, s) in self.pair_sections().iter() {
            out.push_str(&s.view(n));
        }
        out
    }
}

fn setup_field_on(
    topology: &Topology,
    coordinates: Option<&Section<f64>>,
    disc: &Discretization,
    bc: &BoundaryCondition,
    dim: usize,
    section: &mut Section<f64>,
) -> Result<(), MeshError> {
    let patch = DEFAULT_PATCH;
    // cells take dofs only through the boundary override below
    for d in 0..dim as u32 {
        section.set_fiber_dimension_by_depth(topology, patch, d, disc.num_dof(d))?;
    }
    let boundary = if bc.is_active() {
        topology.get_label_stratum(patch, bc.label_name(), BOUNDARY_MARKER)
    } else {
        Vec::new()
    };
    let mut constrained = Vec::with_capacity(boundary.len());
    for &p in &boundary {
        let n = disc.num_dof(topology.depth(patch, p)?);
        section.set_fiber_dimension(patch, p, -n)?;
        constrained.push((p, n));
    }
    section.allocate()?;

    for (p, n) in constrained {
        if n == 0 {
            continue;
        }
        let coordinates = coordinates.ok_or_else(|| MeshError::MissingSection(COORDINATES.into()))?;
        let x = point_coordinates(topology, coordinates, patch, p)?;
        let value = bc.evaluate(&x)?;
        section.update_bc(patch, p, &vec![value; n.unsigned_abs() as usize])?;
    }
    Ok(())
}

/// Coordinates of `p`, or the centroid of its closure's vertices when `p` has none.
fn point_coordinates(
    topology: &Topology,
    coordinates: &Section<f64>,
    patch: PatchId,
    p: PointId,
) -> Result<Vec<f64>, MeshError> {
    if coordinates.contains(patch, p) {
        let own = coordinates.restrict(patch, p)?;
        if !own.is_empty() {
            return Ok(own.to_vec());
        }
    }
    let strata = topology.strata(patch)?;
    let mut sum: Vec<f64> = Vec::new();
    let mut count = 0usize;
    for q in topology.closure(patch, p)? {
        if strata.depth_of(q) != Some(0) || !coordinates.contains(patch, q) {
            continue;
        }
        let x = coordinates.restrict(patch, q)?;
        if sum.is_empty() {
            sum = vec![0.0; x.len()];
        }
        for (s, v) in sum.iter_mut().zip(x) {
            *s += v;
        }
        count += 1;
    }
    if count == 0 {
        return Err(MeshError::InvalidGeometry(format!(
            "point {p} has no coordinates and no vertices with coordinates"
        )));
    }
    Ok(sum.into_iter().map(|s| s / count as f64).collect())
}

fn cell_vertex_coordinates(
    topology: &Topology,
    coordinates: &Section<f64>,
    patch: PatchId,
    cell: PointId,
    dim: usize,
) -> Result<Vec<f64>, MeshError> {
    let strata = topology.strata(patch)?;
    let mut coords = Vec::with_capacity((dim + 1) * dim);
    let mut n = 0;
    for q in topology.closure(patch, cell)? {
        if strata.depth_of(q) != Some(0) {
            continue;
        }
        let x = coordinates.restrict(patch, q)?;
        if x.len() < dim {
            return Err(MeshError::InvalidGeometry(format!(
                "vertex {q} of cell {cell} has {} coordinates, need {dim}",
                x.len()
            )));
        }
        coords.extend_from_slice(&x[..dim]);
        n += 1;
    }
    if n != dim + 1 {
        return Err(MeshError::InvalidGeometry(format!(
            "cell {cell} has {n} vertices, a {dim}-simplex needs {}",
            dim + 1
        )));
    }
    Ok(coords)
}

/// Render a dense row-major matrix with bracket art, prefixing each line with
/// `[rank]` when a rank is given.
pub fn print_matrix<V: Display>(
    name: &str,
    rows: usize,
    cols: usize,
    matrix: &[V],
    rank: Option<usize>,
) -> String {
    let prefix = rank.map(|r| format!("[{r}]")).unwrap_or_default();
    let mut out = String::new();
    let _ = writeln!(out, "{prefix}{name} = ");
    for r in 0..rows {
        let (open, close) = if r == 0 {
            ("/", "\\")
        } else if r == rows - 1 {
            ("\\", "/")
        } else {
            ("|", "|")
        };
        let _ = write!(out, "{prefix} {open}");
        for v in (0..cols).filter_map(|c| matrix.get(r * cols + c)) {
            let _ = write!(out, " {v}");
        }
        let _ = writeln!(out, " {close}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn pid(i: u64) -> PointId {
        PointId::new(i)
    }

    /// Unit right triangle: cell 0, edges 1..=3, vertices 4 (origin), 5, 6.
    fn unit_triangle() -> Mesh {
        let mut m = Mesh::with_factory(NoComm, 2, 0, Arc::new(NumberingFactory::new(0)));
        let t = m.topology_mut();
        for (k, e) in [1, 2, 3].into_iter().enumerate() {
            t.add_arrow(0, pid(0), pid(e), k as i32);
        }
        t.add_arrow(0, pid(1), pid(4), 0);
        t.add_arrow(0, pid(1), pid(5), 1);
        t.add_arrow(0, pid(2), pid(5), 0);
        t.add_arrow(0, pid(2), pid(6), 1);
        t.add_arrow(0, pid(3), pid(6), 0);
        t.add_arrow(0, pid(3), pid(4), 1);
        t.stratify().unwrap();
        let coords = m.get_real_section(COORDINATES);
        for v in 4..=6 {
            coords.set_fiber_dimension(0, pid(v), 2).unwrap();
        }
        coords.allocate().unwrap();
        coords.update(0, pid(4), &[0.0, 0.0]).unwrap();
        coords.update(0, pid(5), &[1.0, 0.0]).unwrap();
        coords.update(0, pid(6), &[0.0, 1.0]).unwrap();
        m
    }

    #[test]
    fn geometry_of_the_unit_triangle() {
        let m = unit_triangle();
        let g = m
            .compute_element_geometry(m.coordinates().unwrap(), 0, pid(0))
            .unwrap();
        assert_eq!(g.det_j, 0.25);
        assert_eq!(&g.v0[..2], &[0.0, 0.0]);
        assert_eq!(m.get_max_volume().unwrap(), 0.25);
    }

    #[test]
    fn locate_inside_and_outside() {
        let m = unit_triangle();
        assert_eq!(m.locate_point(0, &[0.25, 0.25]).unwrap(), pid(0));
        assert_eq!(
            m.locate_point(0, &[2.0, 2.0]).unwrap_err(),
            MeshError::PointOutsideDomain(vec![2.0, 2.0])
        );
    }

    #[test]
    fn non_simplex_cells_are_rejected() {
        let mut m = unit_triangle();
        // an edge used as a cell has too few vertices
        let edge_geom = m.compute_element_geometry(m.coordinates().unwrap(), 0, pid(1));
        assert!(matches!(edge_geom, Err(MeshError::InvalidGeometry(_))));
        m.dim = 1;
        assert_eq!(
            m.locate_point(0, &[0.0]).unwrap_err(),
            MeshError::UnsupportedDimension(1)
        );
    }

    #[test]
    fn query_point_dimension_is_checked() {
        let m = unit_triangle();
        assert_eq!(
            m.locate_point(0, &[0.25]).unwrap_err(),
            MeshError::DimensionMismatch { expected: 2, found: 1 }
        );
    }

    #[test]
    fn setup_field_constrains_marked_points() {
        let mut m = unit_triangle();
        m.discretization_mut().set_num_dof(0, 1);
        m.discretization_mut().set_num_dof(1, 2);
        let t = m.topology_mut();
        t.create_label(0, "marker");
        t.set_value(0, "marker", pid(5), 1).unwrap();
        t.set_value(0, "marker", pid(2), 1).unwrap();
        t.set_value(0, "marker", pid(6), 2).unwrap();
        m.set_boundary_condition(BoundaryCondition::new(
            "marker",
            Arc::new(|x: &[f64]| x[0] + 10.0 * x[1]),
        ));

        m.setup_named_field("u").unwrap();
        let u = m.real_section("u").unwrap();
        assert_eq!(u.fiber_dimension(0, pid(4)), Some(1));
        assert_eq!(u.fiber_dimension(0, pid(5)), Some(-1));
        assert_eq!(u.fiber_dimension(0, pid(6)), Some(1));
        assert_eq!(u.fiber_dimension(0, pid(2)), Some(-2));
        assert_eq!(u.fiber_dimension(0, pid(0)), None);
        assert_eq!(u.restrict(0, pid(5)).unwrap(), &[1.0]);
        // edge 2 joins (1, 0) and (0, 1): centroid (0.5, 0.5)
        assert_eq!(u.restrict(0, pid(2)).unwrap(), &[5.5, 5.5]);
        assert_eq!(u.restrict(0, pid(6)).unwrap(), &[0.0]);
    }

    #[test]
    fn setup_field_without_boundary_label() {
        let mut m = unit_triangle();
        m.discretization_mut().set_num_dof(1, 2);
        m.discretization_mut().set_num_dof(2, 3);
        let mut s = Section::new();
        m.setup_field(&mut s).unwrap();
        assert_eq!(s.size(0), 6);
        assert_eq!(s.fiber_dimension(0, pid(1)), Some(2));
        assert_eq!(s.fiber_dimension(0, pid(0)), None);
        assert!(m.setup_named_field(COORDINATES).is_err());
    }

    #[test]
    fn boundaries_section_is_created_once() {
        let mut m = unit_triangle();
        m.get_boundaries_new()
            .set_fiber_dimension(0, pid(4), 1)
            .unwrap();
        assert!(m.get_boundaries_new().contains(0, pid(4)));
    }

    #[test]
    fn view_lists_sections() {
        let m = unit_triangle();
        let v = m.view("tri");
        assert!(v.starts_with("viewing Mesh 'tri'"));
        assert!(v.contains("viewing Section coordinates"));
        assert!(m.view("").starts_with("viewing a Mesh"));
    }

    #[test]
    fn matrix_rendering() {
        let s = print_matrix("J", 2, 2, &[1.0, 2.0, 3.0, 4.0], Some(1));
        assert_eq!(s, "[1]J = \n[1] / 1 2 \\\n[1] \\ 3 4 /\n");
        let s = print_matrix("v", 3, 1, &[1, 2, 3], None);
        assert_eq!(s, "v = \n / 1 \\\n | 2 |\n \\ 3 /\n");
    }
}
