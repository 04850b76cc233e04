// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Solid boolean operations
//!
//! Feature processors carve material out of the member body through the
//! [`BooleanKernel`] trait. The shipped implementation wraps csgrs; swapping
//! the kernel only touches this module because processors never see csgrs
//! types, only [`Mesh`] in and [`Mesh`] out.

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::triangulation::{calculate_polygon_normal, project_to_2d, triangulate_polygon};
use nalgebra::{Point3, Vector3};

/// Mesh-in, mesh-out boolean difference
pub trait BooleanKernel: Send + Sync {
    /// Subtract `tool` from `host`, returning the remaining solid
    fn subtract(&self, host: &Mesh, tool: &Mesh) -> Result<Mesh>;
}

/// Default kernel backed by csgrs BSP booleans
#[derive(Debug, Default)]
pub struct CsgrsKernel;

impl CsgrsKernel {
    pub fn new() -> Self {
        Self
    }
}

impl BooleanKernel for CsgrsKernel {
    fn subtract(&self, host: &Mesh, tool: &Mesh) -> Result<Mesh> {
        use csgrs::traits::CSG;

        if tool.is_empty() {
            return Ok(host.clone());
        }
        if host.is_empty() {
            return Ok(Mesh::new());
        }

        let host_csg = mesh_to_csgrs(host)?;
        let tool_csg = mesh_to_csgrs(tool)?;

        let result = host_csg.difference(&tool_csg);

        let out = csgrs_to_mesh(&result)?;
        if out.is_empty() && !host.is_empty() {
            return Err(Error::BooleanFailed(
                "difference consumed the entire host".to_string(),
            ));
        }
        Ok(out)
    }
}

/// Convert our Mesh format to csgrs polygons
fn mesh_to_csgrs(mesh: &Mesh) -> Result<csgrs::mesh::Mesh<()>> {
    use csgrs::mesh::{polygon::Polygon, vertex::Vertex, Mesh as CsgMesh};

    let mut polygons = Vec::with_capacity(mesh.triangle_count());

    for tri in mesh.indices.chunks_exact(3) {
        let v0 = mesh.position(tri[0] as usize);
        let v1 = mesh.position(tri[1] as usize);
        let v2 = mesh.position(tri[2] as usize);

        // Degenerate triangles would feed NaN into the BSP tree
        let face_normal = match (v1 - v0).cross(&(v2 - v0)).try_normalize(1e-10) {
            Some(n) => n,
            None => continue,
        };

        let vertices = vec![
            Vertex::new(v0, face_normal),
            Vertex::new(v1, face_normal),
            Vertex::new(v2, face_normal),
        ];
        polygons.push(Polygon::new(vertices, None));
    }

    Ok(CsgMesh::from_polygons(&polygons, None))
}

/// Convert csgrs polygons back to an indexed triangle mesh
fn csgrs_to_mesh(csg_mesh: &csgrs::mesh::Mesh<()>) -> Result<Mesh> {
    let mut mesh = Mesh::new();

    for polygon in &csg_mesh.polygons {
        let vertices = &polygon.vertices;
        if vertices.len() < 3 {
            continue;
        }

        let points_3d: Vec<Point3<f64>> = vertices
            .iter()
            .map(|v| Point3::new(v.pos[0], v.pos[1], v.pos[2]))
            .collect();

        let raw_normal = Vector3::new(
            vertices[0].normal[0],
            vertices[0].normal[1],
            vertices[0].normal[2],
        );
        let normal = match raw_normal.try_normalize(1e-10) {
            Some(n) if n.x.is_finite() && n.y.is_finite() && n.z.is_finite() => n,
            _ => match calculate_polygon_normal(&points_3d).try_normalize(1e-10) {
                Some(n) => n,
                None => continue,
            },
        };

        // FAST PATH: already a triangle
        if points_3d.len() == 3 {
            let base = mesh.vertex_count() as u32;
            for v in vertices {
                mesh.add_vertex(v.pos, v.normal);
            }
            mesh.add_triangle(base, base + 1, base + 2);
            continue;
        }

        // csgrs emits planar n-gons after clipping; project and ear-cut them
        let (points_2d, _, _, _) = project_to_2d(&points_3d, &normal);
        let indices = match triangulate_polygon(&points_2d) {
            Ok(idx) => idx,
            Err(_) => continue,
        };

        let base = mesh.vertex_count();
        for v in vertices {
            mesh.add_vertex(v.pos, v.normal);
        }
        for tri in indices.chunks_exact(3) {
            mesh.add_triangle(
                (base + tri[0]) as u32,
                (base + tri[1]) as u32,
                (base + tri[2]) as u32,
            );
        }
    }

    Ok(mesh)
}

/// Axis-aligned box solid, 12 triangles with outward winding
pub fn box_mesh(min: Point3<f64>, max: Point3<f64>) -> Mesh {
    let mut mesh = Mesh::with_capacity(24, 36);

    let v = [
        Point3::new(min.x, min.y, min.z),
        Point3::new(max.x, min.y, min.z),
        Point3::new(max.x, max.y, min.z),
        Point3::new(min.x, max.y, min.z),
        Point3::new(min.x, min.y, max.z),
        Point3::new(max.x, min.y, max.z),
        Point3::new(max.x, max.y, max.z),
        Point3::new(min.x, max.y, max.z),
    ];

    let faces: [([usize; 4], Vector3<f64>); 6] = [
        ([0, 3, 2, 1], -Vector3::z()),
        ([4, 5, 6, 7], Vector3::z()),
        ([0, 4, 7, 3], -Vector3::x()),
        ([1, 2, 6, 5], Vector3::x()),
        ([0, 1, 5, 4], -Vector3::y()),
        ([3, 7, 6, 2], Vector3::y()),
    ];

    for (quad, normal) in faces {
        let base = mesh.vertex_count() as u32;
        for &i in &quad {
            mesh.add_vertex(v[i], normal);
        }
        mesh.add_triangle(base, base + 1, base + 2);
        mesh.add_triangle(base, base + 2, base + 3);
    }

    mesh
}
