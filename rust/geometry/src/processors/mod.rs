// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Built-in feature processors
//!
//! One processor per machining family. All of them build their cutting tool
//! as a face-plane region swept into the material, so the only geometry
//! primitive they touch is [`extrude_region`](crate::extrusion::extrude_region)
//! plus the boolean kernel from the context.

mod annotate;
mod contour;
mod cut;
mod hole;

pub use annotate::AnnotationProcessor;
pub use contour::ContourProcessor;
pub use cut::CutProcessor;
pub use hole::HoleProcessor;

use crate::extrusion::ExtrusionFrame;
use crate::mesh::Aabb;
use crate::scene::FeatureFrame;

/// Overshoot applied to cutting tools so coplanar surfaces never graze
pub(crate) const TOOL_MARGIN: f64 = 1.0;

/// Extrusion frame entering the material from `margin` above the face plane
pub(crate) fn tool_frame(frame: &FeatureFrame, margin: f64) -> ExtrusionFrame {
    ExtrusionFrame {
        origin: frame.origin + frame.normal * margin,
        axis_u: frame.axis_u,
        axis_v: frame.axis_v,
        direction: -frame.normal,
    }
}

/// Extent of a bounding box along the face normal, as
/// `(start_above_origin, total)` distances measured from the frame origin.
pub(crate) fn normal_span(frame: &FeatureFrame, bounds: &Aabb) -> (f64, f64) {
    let mut dmin = f64::MAX;
    let mut dmax = f64::MIN;
    for &x in &[bounds.min[0], bounds.max[0]] {
        for &y in &[bounds.min[1], bounds.max[1]] {
            for &z in &[bounds.min[2], bounds.max[2]] {
                let d = frame.normal.x * (x - frame.origin.x)
                    + frame.normal.y * (y - frame.origin.y)
                    + frame.normal.z * (z - frame.origin.z);
                dmin = dmin.min(d);
                dmax = dmax.max(d);
            }
        }
    }
    (dmax, dmax - dmin)
}

/// Face-local extents of a bounding box as `(umin, umax, vmin, vmax)`
pub(crate) fn face_extents(frame: &FeatureFrame, bounds: &Aabb) -> (f64, f64, f64, f64) {
    let mut umin = f64::MAX;
    let mut umax = f64::MIN;
    let mut vmin = f64::MAX;
    let mut vmax = f64::MIN;
    for &x in &[bounds.min[0], bounds.max[0]] {
        for &y in &[bounds.min[1], bounds.max[1]] {
            for &z in &[bounds.min[2], bounds.max[2]] {
                let dx = x - frame.origin.x;
                let dy = y - frame.origin.y;
                let dz = z - frame.origin.z;
                let u = frame.axis_u.x * dx + frame.axis_u.y * dy + frame.axis_u.z * dz;
                let v = frame.axis_v.x * dx + frame.axis_v.y * dy + frame.axis_v.z * dz;
                umin = umin.min(u);
                umax = umax.max(u);
                vmin = vmin.min(v);
                vmax = vmax.max(v);
            }
        }
    }
    (umin, umax, vmin, vmax)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::extrusion::extrude_profile;
    use crate::mesh::Mesh;
    use crate::profiles::SectionBuilder;
    use crate::scene::FeatureFrame;
    use dstv_pivot_core::{Face, NormalizedHeader, ProfileClass, SectionDims};

    pub fn hea240_header(length: f64) -> NormalizedHeader {
        NormalizedHeader {
            order: "PRJ-7".into(),
            drawing: "D-100".into(),
            phase: "1".into(),
            piece: "B-12".into(),
            steel_grade: "S355J2".into(),
            quantity: 4,
            profile_name: "HEA240".into(),
            class: ProfileClass::I,
            length,
            dims: SectionDims {
                depth: 230.0,
                flange_width: 240.0,
                flange_thickness: 12.0,
                web_thickness: 7.5,
                root_radius: 21.0,
            },
            weight_per_m: 60.3,
            paint_surface_per_m: 1.37,
        }
    }

    pub fn plate_header(length: f64) -> NormalizedHeader {
        NormalizedHeader {
            order: "PRJ-7".into(),
            drawing: "D-100".into(),
            phase: "1".into(),
            piece: "P-3".into(),
            steel_grade: "S235JR".into(),
            quantity: 1,
            profile_name: "FL200x10".into(),
            class: ProfileClass::Plate,
            length,
            dims: SectionDims {
                depth: 200.0,
                flange_width: 0.0,
                flange_thickness: 0.0,
                web_thickness: 10.0,
                root_radius: 0.0,
            },
            weight_per_m: 15.7,
            paint_surface_per_m: 0.41,
        }
    }

    pub fn body(header: &NormalizedHeader) -> Mesh {
        let profile = SectionBuilder::build(header.class, &header.dims).unwrap();
        extrude_profile(&profile, header.length).unwrap()
    }

    pub fn frame(face: Face, header: &NormalizedHeader) -> FeatureFrame {
        FeatureFrame::for_face(face, header).unwrap()
    }
}
