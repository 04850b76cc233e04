// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Prismatic extrusion
//!
//! Everything solid in a scene is a prism: the member body is the
//! cross-section swept along the member axis, and every cutting tool is a
//! face-plane outline swept into the material. [`extrude_region`] is the
//! single primitive behind both; it takes a 2D region (outer boundary plus
//! holes) and a placement frame and produces a closed, outward-wound mesh.

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::profile::Profile2D;
use nalgebra::{Point2, Point3, Vector3};

/// Placement of a 2D region in scene space for extrusion.
///
/// Region-local `(x, y)` maps to `origin + x * axis_u + y * axis_v` and the
/// solid grows along `direction`.
#[derive(Debug, Clone, Copy)]
pub struct ExtrusionFrame {
    pub origin: Point3<f64>,
    pub axis_u: Vector3<f64>,
    pub axis_v: Vector3<f64>,
    pub direction: Vector3<f64>,
}

impl ExtrusionFrame {
    #[inline]
    fn map(&self, p: &Point2<f64>) -> Point3<f64> {
        self.origin + self.axis_u * p.x + self.axis_v * p.y
    }
}

/// Extrude a cross-section along the member axis from x=0 to x=length.
///
/// Section coordinates map as (sx, sy) -> (z, y): profile width across Z,
/// profile depth up Y.
pub fn extrude_profile(profile: &Profile2D, length: f64) -> Result<Mesh> {
    if !(length > 0.0) || !length.is_finite() {
        return Err(Error::InvalidExtrusion(format!(
            "member length must be positive, got {length}"
        )));
    }

    let frame = ExtrusionFrame {
        origin: Point3::origin(),
        axis_u: Vector3::z(),
        axis_v: Vector3::y(),
        direction: Vector3::x(),
    };
    extrude_region(profile, &frame, length)
}

/// Extrude a 2D region along its frame's direction by `depth`.
///
/// Outer boundary counter-clockwise, holes clockwise, as everywhere else.
pub fn extrude_region(profile: &Profile2D, frame: &ExtrusionFrame, depth: f64) -> Result<Mesh> {
    if profile.outer.len() < 3 {
        return Err(Error::InvalidExtrusion(
            "region needs at least 3 outline points".to_string(),
        ));
    }
    if !(depth > 0.0) || !depth.is_finite() {
        return Err(Error::InvalidExtrusion(format!(
            "extrusion depth must be positive, got {depth}"
        )));
    }

    let direction = frame
        .direction
        .try_normalize(1e-12)
        .ok_or_else(|| Error::InvalidExtrusion("zero extrusion direction".to_string()))?;
    let sweep = direction * depth;

    // Handedness of the frame decides which way region-CCW triangles face
    let orient = frame.axis_u.cross(&frame.axis_v).dot(&direction);
    if orient.abs() < 1e-12 {
        return Err(Error::InvalidExtrusion(
            "extrusion direction lies in the region plane".to_string(),
        ));
    }

    let tri = profile.triangulate()?;
    let ring_edges: usize =
        profile.outer.len() + profile.holes.iter().map(|h| h.len()).sum::<usize>();

    let mut mesh = Mesh::with_capacity(
        tri.points.len() * 2 + ring_edges * 4,
        tri.indices.len() * 2 + ring_edges * 6,
    );

    add_cap(&mut mesh, &tri, frame, Vector3::zeros(), -direction, orient);
    add_cap(&mut mesh, &tri, frame, sweep, direction, orient);

    add_ring_walls(&mut mesh, &profile.outer, frame, &sweep);
    for hole in &profile.holes {
        add_ring_walls(&mut mesh, hole, frame, &sweep);
    }

    Ok(mesh)
}

/// 2D cross of triangle (p0, p1, p2); positive = counter-clockwise
#[inline]
fn triangle_cross(p0: &Point2<f64>, p1: &Point2<f64>, p2: &Point2<f64>) -> f64 {
    (p1.x - p0.x) * (p2.y - p0.y) - (p1.y - p0.y) * (p2.x - p0.x)
}

fn add_cap(
    mesh: &mut Mesh,
    tri: &crate::profile::Triangulation,
    frame: &ExtrusionFrame,
    offset: Vector3<f64>,
    facing: Vector3<f64>,
    orient: f64,
) {
    let base = mesh.vertex_count() as u32;
    for p in &tri.points {
        mesh.add_vertex(frame.map(p) + offset, facing);
    }

    let wants_positive = facing.dot(&frame.direction) > 0.0;
    for t in tri.indices.chunks_exact(3) {
        let (i0, i1, i2) = (t[0], t[1], t[2]);
        let ccw = triangle_cross(&tri.points[i0], &tri.points[i1], &tri.points[i2]) > 0.0;
        // A region-CCW triangle faces along the direction iff the frame is
        // right-handed
        let faces_positive = ccw == (orient > 0.0);
        if faces_positive == wants_positive {
            mesh.add_triangle(base + i0 as u32, base + i1 as u32, base + i2 as u32);
        } else {
            mesh.add_triangle(base + i0 as u32, base + i2 as u32, base + i1 as u32);
        }
    }
}

fn add_ring_walls(
    mesh: &mut Mesh,
    ring: &[Point2<f64>],
    frame: &ExtrusionFrame,
    sweep: &Vector3<f64>,
) {
    let n = ring.len();
    for i in 0..n {
        let p0 = &ring[i];
        let p1 = &ring[(i + 1) % n];

        let dx = p1.x - p0.x;
        let dy = p1.y - p0.y;
        if (dx * dx + dy * dy).sqrt() < 1e-12 {
            continue;
        }

        // Outward 2D edge normal (dy, -dx) for a CCW ring, mapped through
        // the frame. The map takes region interior to prism interior, so
        // outward stays outward regardless of frame handedness.
        let normal = match (frame.axis_u * dy - frame.axis_v * dx).try_normalize(1e-12) {
            Some(n) => n,
            None => continue,
        };

        let a = frame.map(p0);
        let b = frame.map(p1);

        let base = mesh.vertex_count() as u32;
        mesh.add_vertex(a, normal);
        mesh.add_vertex(b, normal);
        mesh.add_vertex(b + sweep, normal);
        mesh.add_vertex(a + sweep, normal);

        // (a, b, b+s) winds along (b-a) x s
        if (b - a).cross(sweep).dot(&normal) > 0.0 {
            mesh.add_triangle(base, base + 1, base + 2);
            mesh.add_triangle(base, base + 2, base + 3);
        } else {
            mesh.add_triangle(base, base + 2, base + 1);
            mesh.add_triangle(base, base + 3, base + 2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square_profile(size: f64) -> Profile2D {
        let h = size / 2.0;
        Profile2D::new(vec![
            Point2::new(-h, 0.0),
            Point2::new(h, 0.0),
            Point2::new(h, size),
            Point2::new(-h, size),
        ])
    }

    #[test]
    fn extruded_square_bounds() {
        let mesh = extrude_profile(&square_profile(100.0), 1000.0).unwrap();
        let bounds = mesh.bounds();
        assert_relative_eq!(bounds.min[0], 0.0);
        assert_relative_eq!(bounds.max[0], 1000.0);
        assert_relative_eq!(bounds.min[1], 0.0);
        assert_relative_eq!(bounds.max[1], 100.0);
        assert_relative_eq!(bounds.min[2], -50.0);
        assert_relative_eq!(bounds.max[2], 50.0);
    }

    #[test]
    fn extruded_square_is_closed() {
        let mesh = extrude_profile(&square_profile(10.0), 20.0).unwrap();
        // 2 caps of 2 triangles plus 4 walls of 2 triangles
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn negative_length_rejected() {
        assert!(extrude_profile(&square_profile(10.0), -5.0).is_err());
    }

    #[test]
    fn region_prism_spans_depth() {
        let region = Profile2D::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ]);
        let frame = ExtrusionFrame {
            origin: Point3::origin(),
            axis_u: Vector3::x(),
            axis_v: Vector3::y(),
            direction: Vector3::z(),
        };
        let mesh = extrude_region(&region, &frame, 5.0).unwrap();
        let bounds = mesh.bounds();
        assert_relative_eq!(bounds.min[2], 0.0);
        assert_relative_eq!(bounds.max[2], 5.0);
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn hollow_region_gets_inner_walls() {
        let mut region = Profile2D::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ]);
        region.add_hole(vec![
            Point2::new(4.0, 4.0),
            Point2::new(4.0, 6.0),
            Point2::new(6.0, 6.0),
            Point2::new(6.0, 4.0),
        ]);
        let frame = ExtrusionFrame {
            origin: Point3::origin(),
            axis_u: Vector3::x(),
            axis_v: Vector3::y(),
            direction: Vector3::z(),
        };
        let mesh = extrude_region(&region, &frame, 5.0).unwrap();
        // 8 cap triangles per side plus 8 edges of 2 wall triangles
        assert_eq!(mesh.triangle_count(), 32);
    }

    #[test]
    fn direction_in_plane_rejected() {
        let region = square_profile(10.0);
        let frame = ExtrusionFrame {
            origin: Point3::origin(),
            axis_u: Vector3::x(),
            axis_v: Vector3::y(),
            direction: Vector3::x(),
        };
        assert!(extrude_region(&region, &frame, 5.0).is_err());
    }
}
