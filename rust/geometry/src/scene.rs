// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory scene model
//!
//! Scene axes: X runs along the member from the part start, Y is the profile
//! depth (bottom fibre at 0), Z is the profile width centered on the web
//! axis. All units are millimetres, straight from the NC file.
//!
//! Every feature carries a [`FeatureFrame`] that maps its face-local 2D
//! coordinates into these axes, so processors never re-derive face placement.

use crate::error::{Error, Result};
use crate::mesh::{Aabb, Mesh};
use crate::profile::Profile2D;
use dstv_pivot_core::{
    Face, FeatureKind, HoleShape, NormalizedHeader, PlanePoint, ProfileClass, SubFace,
};
use nalgebra::{Point3, Vector3};
use rustc_hash::FxHashMap;

/// Material resolved from the header's steel grade
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Material {
    pub grade: String,
    /// Mass per metre as declared in the header, kg/m
    pub weight_per_m: f64,
}

/// Placement of a machinable face in scene space.
///
/// Face-local `(x, y)` maps to `origin + x * axis_u + y * axis_v`; material
/// lies behind the plane along `-normal` for `wall_thickness` millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureFrame {
    pub origin: Point3<f64>,
    pub axis_u: Vector3<f64>,
    pub axis_v: Vector3<f64>,
    /// Outward face normal
    pub normal: Vector3<f64>,
    /// Material thickness behind this face
    pub wall_thickness: f64,
}

impl FeatureFrame {
    /// Frame for a concrete face of the given profile.
    ///
    /// Compound spans take the frame of their first face with the wall
    /// opened up to the full section extent, so tools pass through every
    /// face the span names.
    pub fn for_face(face: Face, header: &NormalizedHeader) -> Result<FeatureFrame> {
        let dims = &header.dims;
        let width = section_width(header);

        let frame = match face {
            Face::Web => match header.class {
                // Channel webs sit at the back of the section
                ProfileClass::U | ProfileClass::C | ProfileClass::L => FeatureFrame {
                    origin: Point3::new(0.0, 0.0, -width / 2.0 + dims.web_thickness),
                    axis_u: Vector3::x(),
                    axis_v: Vector3::y(),
                    normal: Vector3::z(),
                    wall_thickness: dims.web_thickness,
                },
                // Plates machine their single face from above
                ProfileClass::Plate => FeatureFrame {
                    origin: Point3::new(0.0, dims.web_thickness, -width / 2.0),
                    axis_u: Vector3::x(),
                    axis_v: Vector3::z(),
                    normal: Vector3::y(),
                    wall_thickness: dims.web_thickness,
                },
                ProfileClass::RoundBar => FeatureFrame {
                    origin: Point3::new(0.0, 0.0, dims.depth / 2.0),
                    axis_u: Vector3::x(),
                    axis_v: Vector3::y(),
                    normal: Vector3::z(),
                    wall_thickness: dims.depth,
                },
                ProfileClass::RoundTube | ProfileClass::RectTube => FeatureFrame {
                    origin: Point3::new(0.0, 0.0, width / 2.0),
                    axis_u: Vector3::x(),
                    axis_v: Vector3::y(),
                    normal: Vector3::z(),
                    wall_thickness: dims.web_thickness,
                },
                _ => FeatureFrame {
                    origin: Point3::new(0.0, 0.0, dims.web_thickness / 2.0),
                    axis_u: Vector3::x(),
                    axis_v: Vector3::y(),
                    normal: Vector3::z(),
                    wall_thickness: dims.web_thickness,
                },
            },
            Face::Behind => match header.class {
                ProfileClass::U | ProfileClass::C | ProfileClass::L => FeatureFrame {
                    origin: Point3::new(0.0, 0.0, -width / 2.0),
                    axis_u: Vector3::x(),
                    axis_v: Vector3::y(),
                    normal: -Vector3::z(),
                    wall_thickness: dims.web_thickness,
                },
                ProfileClass::Plate => FeatureFrame {
                    origin: Point3::new(0.0, 0.0, -width / 2.0),
                    axis_u: Vector3::x(),
                    axis_v: Vector3::z(),
                    normal: -Vector3::y(),
                    wall_thickness: dims.web_thickness,
                },
                _ => FeatureFrame {
                    origin: Point3::new(0.0, 0.0, -dims.web_thickness / 2.0),
                    axis_u: Vector3::x(),
                    axis_v: Vector3::y(),
                    normal: -Vector3::z(),
                    wall_thickness: dims.web_thickness,
                },
            },
            Face::TopFlange => FeatureFrame {
                origin: Point3::new(0.0, section_depth(header), -width / 2.0),
                axis_u: Vector3::x(),
                axis_v: Vector3::z(),
                normal: Vector3::y(),
                wall_thickness: flange_wall(header),
            },
            Face::BottomFlange => FeatureFrame {
                origin: Point3::new(0.0, 0.0, -width / 2.0),
                axis_u: Vector3::x(),
                axis_v: Vector3::z(),
                normal: -Vector3::y(),
                wall_thickness: flange_wall(header),
            },
            // Start plane of the member; machined end-on
            Face::Front => FeatureFrame {
                origin: Point3::new(0.0, 0.0, -width / 2.0),
                axis_u: Vector3::y(),
                axis_v: Vector3::z(),
                normal: -Vector3::x(),
                wall_thickness: header.length,
            },
            Face::Span(first, _) => {
                let mut frame = FeatureFrame::for_face(Face::from(first), header)?;
                frame.wall_thickness = span_wall(first, header);
                // The tool must enter from the section's outer surface, not
                // the first face's wall plane, to pass through every face
                // the span names
                match first {
                    SubFace::Web => frame.origin.z = width / 2.0,
                    SubFace::Behind => frame.origin.z = -width / 2.0,
                    SubFace::TopFlange => frame.origin.y = section_depth(header),
                    SubFace::BottomFlange => frame.origin.y = 0.0,
                }
                frame
            }
        };

        if !(frame.wall_thickness > 0.0) {
            return Err(Error::InvalidSection(format!(
                "face {face} has no material thickness"
            )));
        }
        Ok(frame)
    }

    /// Map a face-local point into scene space
    #[inline]
    pub fn to_scene(&self, x: f64, y: f64) -> Point3<f64> {
        self.origin + self.axis_u * x + self.axis_v * y
    }
}

/// Section extent across Z
fn section_width(header: &NormalizedHeader) -> f64 {
    match header.class {
        // Plate width is declared in the depth field
        ProfileClass::Plate => header.dims.depth,
        ProfileClass::RoundBar | ProfileClass::RoundTube => header.dims.depth,
        _ => header.dims.flange_width,
    }
}

/// Section extent across Y
fn section_depth(header: &NormalizedHeader) -> f64 {
    match header.class {
        ProfileClass::Plate => header.dims.web_thickness,
        _ => header.dims.depth,
    }
}

fn flange_wall(header: &NormalizedHeader) -> f64 {
    match header.class {
        ProfileClass::RectTube => header.dims.web_thickness,
        _ => header.dims.flange_thickness,
    }
}

/// Wall for a compound span: the tool runs through the full section along
/// the first face's drill direction
fn span_wall(first: SubFace, header: &NormalizedHeader) -> f64 {
    match first {
        SubFace::Web | SubFace::Behind => section_width(header),
        SubFace::TopFlange | SubFace::BottomFlange => section_depth(header),
    }
}

/// A machining feature placed in the scene, ready for its processor
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Feature {
    /// Stable id, unique within the element, in source order
    pub id: u32,
    pub kind: FeatureKind,
    pub face: Face,
    /// Face-local points; negative x is end-relative and resolved by the
    /// processor against live bounds
    pub points: Vec<PlanePoint>,
    pub shape: Option<HoleShape>,
    pub depth: Option<f64>,
    pub angle: Option<f64>,
    pub text: Option<String>,
    pub text_height: Option<f64>,
    pub frame: FeatureFrame,
    pub source_line: u32,
}

/// Provenance record of one applied (or annotated) feature
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CutRecord {
    pub feature_id: u32,
    pub kind: FeatureKind,
    pub face: Face,
    /// Scene-space bounds of the removed (or marked) region
    pub bounds: Aabb,
    pub source_line: u32,
}

/// Processed geometry of one element
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementGeometry {
    pub mesh: Mesh,
    /// Features applied to the mesh, in machining order
    pub applied: Vec<CutRecord>,
}

/// One structural member built from a single NC file
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PivotElement {
    pub header: NormalizedHeader,
    pub material: Material,
    /// Cross-section after contour replacement, pre-extrusion
    #[cfg_attr(feature = "serde", serde(skip))]
    pub section: Option<Profile2D>,
    pub features: Vec<Feature>,
    pub geometry: ElementGeometry,
}

impl PivotElement {
    /// Scene-space bounds of the element body
    pub fn bounds(&self) -> Aabb {
        self.geometry.mesh.bounds()
    }
}

/// The complete imported scene
#[derive(Debug, Clone, Default)]
pub struct PivotScene {
    pub elements: Vec<PivotElement>,
    index: FxHashMap<String, usize>,
}

impl PivotScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element, indexing it by piece mark
    pub fn push(&mut self, element: PivotElement) {
        self.index
            .insert(element.header.piece.clone(), self.elements.len());
        self.elements.push(element);
    }

    /// Look up an element by its piece mark
    pub fn element_by_piece(&self, piece: &str) -> Option<&PivotElement> {
        self.index.get(piece).map(|&i| &self.elements[i])
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use dstv_pivot_core::SectionDims;

    fn hea_header() -> NormalizedHeader {
        NormalizedHeader {
            order: "PRJ-7".into(),
            drawing: "D-100".into(),
            phase: "1".into(),
            piece: "B-12".into(),
            steel_grade: "S355J2".into(),
            quantity: 4,
            profile_name: "HEA240".into(),
            class: ProfileClass::I,
            length: 8000.0,
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

    #[test]
    fn web_frame_maps_into_the_web_plane() {
        let header = hea_header();
        let frame = FeatureFrame::for_face(Face::Web, &header).unwrap();
        let p = frame.to_scene(100.0, 50.0);
        assert_relative_eq!(p.x, 100.0);
        assert_relative_eq!(p.y, 50.0);
        assert_relative_eq!(p.z, 3.75);
        assert_relative_eq!(frame.wall_thickness, 7.5);
    }

    #[test]
    fn top_flange_frame_runs_across_width() {
        let header = hea_header();
        let frame = FeatureFrame::for_face(Face::TopFlange, &header).unwrap();
        let p = frame.to_scene(100.0, 60.0);
        assert_relative_eq!(p.y, 230.0);
        assert_relative_eq!(p.z, -60.0);
        assert_relative_eq!(frame.wall_thickness, 12.0);
    }

    #[test]
    fn span_frame_opens_the_full_section() {
        let header = hea_header();
        let frame =
            FeatureFrame::for_face(Face::Span(SubFace::Web, SubFace::TopFlange), &header).unwrap();
        assert_relative_eq!(frame.wall_thickness, 240.0);
    }

    #[test]
    fn scene_indexes_by_piece_mark() {
        let header = hea_header();
        let mut scene = PivotScene::new();
        scene.push(PivotElement {
            material: Material {
                grade: header.steel_grade.clone(),
                weight_per_m: header.weight_per_m,
            },
            header,
            section: None,
            features: Vec::new(),
            geometry: ElementGeometry::default(),
        });
        assert!(scene.element_by_piece("B-12").is_some());
        assert!(scene.element_by_piece("missing").is_none());
    }
}
