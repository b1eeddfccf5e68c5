//! Constructors for small structured meshes and for meshes given as cell lists.
//!
//! All builders put the whole mesh on rank 0; other ranks get an empty default
//! patch so collective operations see the same patch set everywhere.

use crate::algs::communicator::Communicator;
use crate::data::section::Section;
use crate::mesh::{COORDINATES, Mesh};
use crate::mesh_error::MeshError;
use crate::topology::mesh_topology::Topology;
use crate::topology::point::{DEFAULT_PATCH, PatchId, PointId};

/// Label marking boundary points.
pub const MARKER_LABEL: &str = "marker";

pub struct MeshBuilder;

impl MeshBuilder {
    /// The boundary of the rectangle `[lower, upper]` subdivided into
    /// `edges[0] × edges[1]` cells, as a 1D mesh of edges embedded in 2D.
    ///
    /// Horizontal edges are numbered first, row by row, then vertical edges
    /// column by column; vertices follow the edges, row by row. Edges and
    /// vertices on the outer rectangle carry marker 1.
    pub fn create_square_boundary<C: Communicator>(
        comm: C,
        lower: [f64; 2],
        upper: [f64; 2],
        edges: [usize; 2],
        debug: i32,
    ) -> Result<Mesh<C>, MeshError> {
        let [nx, ny] = edges;
        if nx == 0 || ny == 0 {
            return Err(MeshError::InvalidGeometry(format!(
                "square boundary needs at least one edge per side, got {nx} x {ny}"
            )));
        }
        let num_vertices = (nx + 1) * (ny + 1);
        let num_edges = nx * (ny + 1) + (nx + 1) * ny;
        let vertex = |v: usize| PointId::new((num_edges + v) as u64);

        let mut mesh = Mesh::new(comm, 1, debug);
        let root = mesh.rank() == 0;
        let t = mesh.topology_mut();
        t.create_patch(DEFAULT_PATCH);
        t.create_label(DEFAULT_PATCH, MARKER_LABEL);
        if root {
            let mut order = 0;
            for vy in 0..=ny {
                for ex in 0..nx {
                    let edge = PointId::new((vy * nx + ex) as u64);
                    let v = vy * (nx + 1) + ex;
                    t.add_arrow(DEFAULT_PATCH, edge, vertex(v), order);
                    t.add_arrow(DEFAULT_PATCH, edge, vertex(v + 1), order + 1);
                    order += 2;
                    if vy == 0 || vy == ny {
                        mark(t, edge)?;
                        mark(t, vertex(v))?;
                        mark(t, vertex(v + 1))?;
                    }
                }
            }
            for vx in 0..=nx {
                for ey in 0..ny {
                    let edge = PointId::new((vx * ny + ey + nx * (ny + 1)) as u64);
                    let v = ey * (nx + 1) + vx;
                    t.add_arrow(DEFAULT_PATCH, edge, vertex(v), order);
                    t.add_arrow(DEFAULT_PATCH, edge, vertex(v + nx + 1), order + 1);
                    order += 2;
                    if vx == 0 || vx == nx {
                        mark(t, edge)?;
                        mark(t, vertex(v))?;
                        mark(t, vertex(v + nx + 1))?;
                    }
                }
            }
        }
        t.stratify()?;

        let mut coords = Vec::with_capacity(num_vertices * 2);
        for vy in 0..=ny {
            for vx in 0..=nx {
                coords.push(lower[0] + (upper[0] - lower[0]) / nx as f64 * vx as f64);
                coords.push(lower[1] + (upper[1] - lower[1]) / ny as f64 * vy as f64);
            }
        }
        Self::build_mesh_coordinates(&mut mesh, 2, num_edges as u64, &coords)?;
        Ok(mesh)
    }

    /// The surface of the box `[lower, upper]` as six quadrilateral faces
    /// (points 0..6) over eight vertices (points 6..14), embedded in 3D.
    /// Every point carries marker 1.
    pub fn create_cube_boundary<C: Communicator>(
        comm: C,
        lower: [f64; 3],
        upper: [f64; 3],
        debug: i32,
    ) -> Result<Mesh<C>, MeshError> {
        const FACES: [[usize; 4]; 6] = [
            [0, 1, 2, 3], // front
            [4, 5, 6, 7], // back
            [5, 4, 1, 0], // bottom
            [3, 2, 6, 7], // top
            [1, 4, 7, 2], // left
            [5, 0, 3, 6], // right
        ];
        let num_faces = FACES.len() as u64;
        let vertex = |v: usize| PointId::new(num_faces + v as u64);

        let mut mesh = Mesh::new(comm, 2, debug);
        let root = mesh.rank() == 0;
        let t = mesh.topology_mut();
        t.create_patch(DEFAULT_PATCH);
        t.create_label(DEFAULT_PATCH, MARKER_LABEL);
        if root {
            let mut order = 0;
            for (f, face) in FACES.iter().enumerate() {
                let face_pt = PointId::new(f as u64);
                for &v in face {
                    t.add_arrow(DEFAULT_PATCH, face_pt, vertex(v), order);
                    order += 1;
                }
                mark(t, face_pt)?;
            }
            for v in 0..8 {
                mark(t, vertex(v))?;
            }
        }
        t.stratify()?;

        let [x0, y0, z0] = lower;
        let [x1, y1, z1] = upper;
        #[rustfmt::skip]
        let coords = [
            x0, y0, z1,
            x1, y0, z1,
            x1, y1, z1,
            x0, y1, z1,
            x1, y0, z0,
            x0, y0, z0,
            x0, y1, z0,
            x1, y1, z0,
        ];
        Self::build_mesh_coordinates(&mut mesh, 3, num_faces, &coords)?;
        Ok(mesh)
    }

    /// A mesh of dimension `dim` from cell → vertex lists.
    ///
    /// Cells become points `0..cells.len()`; vertex `i` of the lists becomes
    /// point `cells.len() + i`. `coords` holds `embed_dim` values per vertex.
    /// Only rank 0 inserts the cells.
    pub fn from_cells<C: Communicator>(
        comm: C,
        dim: usize,
        cells: &[Vec<usize>],
        coords: &[f64],
        embed_dim: usize,
        debug: i32,
    ) -> Result<Mesh<C>, MeshError> {
        if embed_dim == 0 || coords.len() % embed_dim != 0 {
            return Err(MeshError::InvalidGeometry(format!(
                "{} coordinates do not split into {embed_dim}-vectors",
                coords.len()
            )));
        }
        let num_vertices = coords.len() / embed_dim;
        let first_vertex = cells.len() as u64;

        let mut mesh = Mesh::new(comm, dim, debug);
        let root = mesh.rank() == 0;
        let t = mesh.topology_mut();
        t.create_patch(DEFAULT_PATCH);
        if root {
            for (c, cone) in cells.iter().enumerate() {
                let cell = PointId::new(c as u64);
                for (k, &v) in cone.iter().enumerate() {
                    if v >= num_vertices {
                        return Err(MeshError::InvalidGeometry(format!(
                            "cell {c} references vertex {v}, only {num_vertices} have coordinates"
                        )));
                    }
                    t.add_arrow(DEFAULT_PATCH, cell, PointId::new(first_vertex + v as u64), k as i32);
                }
            }
        }
        t.stratify()?;
        Self::build_mesh_coordinates(&mut mesh, embed_dim, first_vertex, coords)?;
        Ok(mesh)
    }

    /// Lay out `section` with `embed_dim` values on every vertex of `patch` and
    /// copy them from `coords`, vertex `v` reading entry `v - first_vertex`.
    pub fn build_coordinates(
        topology: &Topology,
        patch: PatchId,
        section: &mut Section<f64>,
        embed_dim: usize,
        first_vertex: u64,
        coords: &[f64],
    ) -> Result<(), MeshError> {
        let vertices = topology.depth_stratum(patch, 0)?;
        for &v in vertices {
            section.set_fiber_dimension(patch, v, embed_dim as i32)?;
        }
        section.allocate()?;
        for &v in vertices {
            let start = v
                .get()
                .checked_sub(first_vertex)
                .map(|i| i as usize * embed_dim)
                .filter(|&s| s + embed_dim <= coords.len())
                .ok_or_else(|| {
                    MeshError::InvalidGeometry(format!("no coordinates given for vertex {v}"))
                })?;
            section.update(patch, v, &coords[start..start + embed_dim])?;
        }
        Ok(())
    }

    fn build_mesh_coordinates<C: Communicator>(
        mesh: &mut Mesh<C>,
        embed_dim: usize,
        first_vertex: u64,
        coords: &[f64],
    ) -> Result<(), MeshError> {
        let mut section = Section::new();
        Self::build_coordinates(
            mesh.topology(),
            DEFAULT_PATCH,
            &mut section,
            embed_dim,
            first_vertex,
            coords,
        )?;
        mesh.set_real_section(COORDINATES, section);
        Ok(())
    }
}

fn mark(t: &mut Topology, p: PointId) -> Result<(), MeshError> {
    t.set_value(DEFAULT_PATCH, MARKER_LABEL, p, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::NoComm;

    #[test]
    fn square_boundary_2x2() {
        let m = MeshBuilder::create_square_boundary(NoComm, [0.0, 0.0], [2.0, 1.0], [2, 2], 0)
            .unwrap();
        let t = m.topology();
        assert_eq!(t.height_stratum(0, 0).unwrap().len(), 12);
        assert_eq!(t.depth_stratum(0, 0).unwrap().len(), 9);
        // edge 0 joins vertices 12 and 13
        assert_eq!(
            t.cone(0, PointId::new(0)).collect::<Vec<_>>(),
            vec![PointId::new(12), PointId::new(13)]
        );
        // first vertical edge: x = 0, lower half
        assert_eq!(
            t.cone(0, PointId::new(6)).collect::<Vec<_>>(),
            vec![PointId::new(12), PointId::new(15)]
        );
        let marked = t.get_label_stratum(0, MARKER_LABEL, 1);
        // 8 outer edges, 8 outer vertices
        assert_eq!(marked.len(), 16);
        assert!(!marked.contains(&PointId::new(16)));
        let c = m.coordinates().unwrap();
        assert_eq!(c.restrict(0, PointId::new(20)).unwrap(), &[2.0, 1.0]);
        assert_eq!(c.restrict(0, PointId::new(16)).unwrap(), &[1.0, 0.5]);
    }

    #[test]
    fn cube_boundary_has_three_dimensional_corners() {
        let m = MeshBuilder::create_cube_boundary(NoComm, [0.0; 3], [1.0, 2.0, 3.0], 0).unwrap();
        let t = m.topology();
        assert_eq!(t.height_stratum(0, 0).unwrap().len(), 6);
        assert_eq!(t.depth_stratum(0, 0).unwrap().len(), 8);
        assert_eq!(t.get_label_stratum(0, MARKER_LABEL, 1).len(), 14);
        let c = m.coordinates().unwrap();
        assert_eq!(c.restrict(0, PointId::new(6)).unwrap(), &[0.0, 0.0, 3.0]);
        assert_eq!(c.restrict(0, PointId::new(13)).unwrap(), &[1.0, 2.0, 0.0]);
    }

    #[test]
    fn from_cells_rejects_dangling_vertices() {
        let err = MeshBuilder::from_cells(NoComm, 2, &[vec![0, 1, 5]], &[0.0; 6], 2, 0).unwrap_err();
        assert!(matches!(err, MeshError::InvalidGeometry(_)));
    }
}
