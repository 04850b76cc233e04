// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Normalization: typed blocks → geometry-ready primitives.
//!
//! After this stage every feature carries a concrete [`Face`] (never a raw
//! letter, never unspecified), coordinates live in the profile's canonical
//! face-local frame, and oblong-hole modifiers are expanded into an explicit
//! [`HoleShape`]. These are closed types on purpose: the original system let
//! faces and positions degrade to untyped values and that is where its
//! defects clustered.
//!
//! Canonical frame: x runs along the member axis from the part start; y runs
//! across the face from the common bottom/left edge. DSTV measures y on the
//! bottom flange (`u`) and rear web (`h`) faces from the opposite edge, so
//! those faces mirror during normalization.

use crate::error::{Diagnostic, Stage, ValidationError};
use crate::face::{Face, FaceCode, DEFAULT_FACE};
use crate::semantic::{
    Contour, CutOutline, Hole, ProfileClass, ProfileHeader, SectionDims, SemanticBlock,
};
use tracing::{debug, warn};

/// A 3-axis position. Fixed length by construction; never an untyped array.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Explicit hole shape after modifier expansion
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HoleShape {
    Round {
        diameter: f64,
    },
    Oblong {
        width: f64,
        length: f64,
        /// Rotation of the slot's long axis in degrees
        angle: f64,
    },
}

/// Machining feature family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FeatureKind {
    Hole,
    OuterContour,
    InnerContour,
    Cut,
    Marking,
    Bend,
    PunchMark,
    FreeContour,
}

impl std::fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FeatureKind::Hole => "hole",
            FeatureKind::OuterContour => "outer-contour",
            FeatureKind::InnerContour => "inner-contour",
            FeatureKind::Cut => "cut",
            FeatureKind::Marking => "marking",
            FeatureKind::Bend => "bend",
            FeatureKind::PunchMark => "punch-mark",
            FeatureKind::FreeContour => "free-contour",
        };
        f.write_str(name)
    }
}

/// Face-local 2D point in the canonical frame, with optional notch radius
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlanePoint {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

/// Normalized profile header
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NormalizedHeader {
    pub order: String,
    pub drawing: String,
    pub phase: String,
    pub piece: String,
    pub steel_grade: String,
    pub quantity: u32,
    pub profile_name: String,
    pub class: ProfileClass,
    pub length: f64,
    pub dims: SectionDims,
    pub weight_per_m: f64,
    pub paint_surface_per_m: f64,
}

/// Normalized machining feature
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NormalizedFeature {
    pub kind: FeatureKind,
    /// Always a concrete face; defaulting happened here and only here
    pub face: Face,
    /// Outline / position points in the canonical face-local frame.
    /// Negative x values are end-relative (measured from the member's far
    /// end) and are resolved against live geometry during processing.
    pub points: Vec<PlanePoint>,
    pub shape: Option<HoleShape>,
    pub depth: Option<f64>,
    pub angle: Option<f64>,
    pub text_height: Option<f64>,
    pub text: Option<String>,
    pub source_line: u32,
}

/// Output of the normalization stage
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NormalizedBlock {
    Header(NormalizedHeader),
    Feature(NormalizedFeature),
}

/// Normalization policy knobs
#[derive(Debug, Clone, Copy)]
pub struct NormalizeOptions {
    /// Face applied when a block carries no indicator. Defaults to
    /// [`DEFAULT_FACE`].
    pub default_face: Face,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            default_face: DEFAULT_FACE,
        }
    }
}

/// Normalization result: blocks in source order plus soft diagnostics
#[derive(Debug, Clone)]
pub struct Normalized {
    pub blocks: Vec<NormalizedBlock>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Normalize classified blocks.
///
/// Feature blocks that fail validation are skipped with a diagnostic; a
/// missing profile header is fatal. The output never contains an unresolved
/// face.
pub fn normalize(
    blocks: &[SemanticBlock],
    options: &NormalizeOptions,
) -> Result<Normalized, ValidationError> {
    let mut out = Vec::with_capacity(blocks.len());
    let mut diagnostics = Vec::new();
    let mut header: Option<NormalizedHeader> = None;

    for block in blocks {
        match block {
            SemanticBlock::ProfileHeader(raw) => {
                let normalized = normalize_header(raw)?;
                debug!(
                    piece = %normalized.piece,
                    profile = %normalized.profile_name,
                    class = %normalized.class,
                    "normalized profile header"
                );
                out.push(NormalizedBlock::Header(normalized.clone()));
                header = Some(normalized);
            }
            SemanticBlock::Vendor(vendor) => {
                // Vendor payloads carry no portable geometry; surface them
                diagnostics.push(Diagnostic::warning(
                    Stage::Normalize,
                    Some(vendor.source_line),
                    format!("vendor block {} not interpreted", vendor.code),
                ));
            }
            feature => {
                let Some(header) = header.as_ref() else {
                    return Err(ValidationError::MissingProfileHeader);
                };
                match normalize_feature(feature, header, options) {
                    Ok(features) => out.extend(features.into_iter().map(NormalizedBlock::Feature)),
                    Err(err) => {
                        warn!(line = block.source_line(), %err, "feature failed normalization");
                        diagnostics.push(Diagnostic::warning(
                            Stage::Normalize,
                            Some(block.source_line()),
                            format!("feature skipped: {err}"),
                        ));
                    }
                }
            }
        }
    }

    if header.is_none() {
        return Err(ValidationError::MissingProfileHeader);
    }

    Ok(Normalized {
        blocks: out,
        diagnostics,
    })
}

fn normalize_header(raw: &ProfileHeader) -> Result<NormalizedHeader, ValidationError> {
    for (field, value) in [
        ("length", raw.length),
        ("depth", raw.dims.depth),
        ("flange width", raw.dims.flange_width),
        ("flange thickness", raw.dims.flange_thickness),
        ("web thickness", raw.dims.web_thickness),
    ] {
        if !value.is_finite() {
            return Err(ValidationError::BadFieldValue {
                field: "header dimension",
                line: raw.source_line,
                reason: format!("{field} is not finite"),
            });
        }
    }

    Ok(NormalizedHeader {
        order: raw.order.clone(),
        drawing: raw.drawing.clone(),
        phase: raw.phase.clone(),
        piece: raw.piece.clone(),
        steel_grade: raw.steel_grade.clone(),
        quantity: raw.quantity,
        profile_name: raw.profile_name.clone(),
        class: raw.class,
        length: raw.length,
        dims: raw.dims,
        weight_per_m: raw.weight_per_m,
        paint_surface_per_m: raw.paint_surface_per_m,
    })
}

/// Normalize one feature block. BO and PU blocks expand to one feature per
/// row so downstream ordering stays per-machining-operation.
fn normalize_feature(
    block: &SemanticBlock,
    header: &NormalizedHeader,
    options: &NormalizeOptions,
) -> Result<Vec<NormalizedFeature>, ValidationError> {
    match block {
        SemanticBlock::HoleSet(set) => set
            .holes
            .iter()
            .map(|hole| normalize_hole(hole, set.source_line, header, options))
            .collect(),
        SemanticBlock::OuterContour(contour) => Ok(vec![normalize_contour(
            contour,
            FeatureKind::OuterContour,
            header,
            options,
        )?]),
        SemanticBlock::InnerContour(contour) => Ok(vec![normalize_contour(
            contour,
            FeatureKind::InnerContour,
            header,
            options,
        )?]),
        SemanticBlock::FreeContour(contour) => Ok(vec![normalize_contour(
            contour,
            FeatureKind::FreeContour,
            header,
            options,
        )?]),
        SemanticBlock::Marking(mark) => {
            let face = resolve_face(mark.face, header.class, mark.source_line, options)?;
            let (x, y) = canonical_point(mark.x, mark.y, face, header);
            Ok(vec![NormalizedFeature {
                kind: FeatureKind::Marking,
                face,
                points: vec![PlanePoint { x, y, radius: 0.0 }],
                shape: None,
                depth: None,
                angle: Some(mark.angle),
                text_height: Some(mark.height),
                text: Some(mark.text.clone()),
                source_line: mark.source_line,
            }])
        }
        SemanticBlock::Cut(cut) => Ok(vec![normalize_cut(cut, header, options)?]),
        SemanticBlock::Bend(bend) => {
            let face = resolve_face(bend.face, header.class, bend.source_line, options)?;
            let (x1, y1) = canonical_point(bend.start.0, bend.start.1, face, header);
            let (x2, y2) = canonical_point(bend.end.0, bend.end.1, face, header);
            if (x2 - x1).abs() < f64::EPSILON && (y2 - y1).abs() < f64::EPSILON {
                return Err(ValidationError::DegenerateContour {
                    line: bend.source_line,
                    reason: "bend line start equals end".to_string(),
                });
            }
            Ok(vec![NormalizedFeature {
                kind: FeatureKind::Bend,
                face,
                points: vec![
                    PlanePoint {
                        x: x1,
                        y: y1,
                        radius: 0.0,
                    },
                    PlanePoint {
                        x: x2,
                        y: y2,
                        radius: 0.0,
                    },
                ],
                shape: None,
                depth: None,
                angle: Some(bend.angle),
                text_height: None,
                text: None,
                source_line: bend.source_line,
            }])
        }
        SemanticBlock::PunchMarks(punches) => {
            let face = resolve_face(punches.face, header.class, punches.source_line, options)?;
            Ok(punches
                .points
                .iter()
                .map(|&(x, y)| {
                    let (x, y) = canonical_point(x, y, face, header);
                    NormalizedFeature {
                        kind: FeatureKind::PunchMark,
                        face,
                        points: vec![PlanePoint { x, y, radius: 0.0 }],
                        shape: None,
                        depth: None,
                        angle: None,
                        text_height: None,
                        text: None,
                        source_line: punches.source_line,
                    }
                })
                .collect())
        }
        SemanticBlock::ProfileHeader(_) | SemanticBlock::Vendor(_) => {
            unreachable!("handled by the caller")
        }
    }
}

fn normalize_hole(
    hole: &Hole,
    line: u32,
    header: &NormalizedHeader,
    options: &NormalizeOptions,
) -> Result<NormalizedFeature, ValidationError> {
    let face = resolve_face(hole.face, header.class, line, options)?;
    let (x, y) = canonical_point(hole.x, hole.y, face, header);

    ensure_finite("hole position", line, &[x, y, hole.diameter])?;

    let shape = match hole.slot {
        Some(slot) => HoleShape::Oblong {
            width: slot.width,
            length: slot.length,
            angle: slot.angle,
        },
        None => HoleShape::Round {
            diameter: hole.diameter,
        },
    };

    Ok(NormalizedFeature {
        kind: FeatureKind::Hole,
        face,
        points: vec![PlanePoint { x, y, radius: 0.0 }],
        shape: Some(shape),
        depth: hole.depth,
        angle: None,
        text_height: None,
        text: None,
        source_line: line,
    })
}

fn normalize_contour(
    contour: &Contour,
    kind: FeatureKind,
    header: &NormalizedHeader,
    options: &NormalizeOptions,
) -> Result<NormalizedFeature, ValidationError> {
    let face = resolve_face(contour.face, header.class, contour.source_line, options)?;

    let mut points = Vec::with_capacity(contour.vertices.len());
    for vertex in &contour.vertices {
        ensure_finite(
            "contour vertex",
            contour.source_line,
            &[vertex.x, vertex.y, vertex.radius],
        )?;
        let (x, y) = canonical_point(vertex.x, vertex.y, face, header);
        points.push(PlanePoint {
            x,
            y,
            radius: vertex.radius,
        });
    }

    // Closing vertex repeated in the file is redundant after normalization
    if points.len() > 3 {
        let first = points[0];
        let last = points[points.len() - 1];
        if (first.x - last.x).abs() < 1e-9 && (first.y - last.y).abs() < 1e-9 {
            points.pop();
        }
    }

    Ok(NormalizedFeature {
        kind,
        face,
        points,
        shape: None,
        depth: None,
        angle: None,
        text_height: None,
        text: None,
        source_line: contour.source_line,
    })
}

fn normalize_cut(
    cut: &CutOutline,
    header: &NormalizedHeader,
    options: &NormalizeOptions,
) -> Result<NormalizedFeature, ValidationError> {
    let face = resolve_face(cut.face, header.class, cut.source_line, options)?;

    let mut points = Vec::with_capacity(cut.points.len());
    for &(x, y) in &cut.points {
        ensure_finite("cut vertex", cut.source_line, &[x, y])?;
        // End-relative coordinates (negative x) keep their sign; the cut
        // processor resolves them against the element's current bounds
        let (cx, cy) = canonical_point_keep_relative(x, y, face, header);
        points.push(PlanePoint {
            x: cx,
            y: cy,
            radius: 0.0,
        });
    }

    Ok(NormalizedFeature {
        kind: FeatureKind::Cut,
        face,
        points,
        shape: None,
        // Zero depth means the cut goes all the way through
        depth: (cut.depth > 0.0).then_some(cut.depth),
        angle: None,
        text_height: None,
        text: None,
        source_line: cut.source_line,
    })
}

/// Resolve a raw face indicator to a concrete [`Face`] against the profile's
/// face table. Missing indicators take the options default.
pub fn resolve_face(
    code: Option<FaceCode>,
    class: ProfileClass,
    line: u32,
    options: &NormalizeOptions,
) -> Result<Face, ValidationError> {
    let face = match code {
        None => options.default_face,
        Some(FaceCode::Single(sub)) => {
            check_face_on_profile(sub, class, line)?;
            Face::from(sub)
        }
        Some(FaceCode::Compound(a, b)) => {
            check_face_on_profile(a, class, line)?;
            check_face_on_profile(b, class, line)?;
            Face::Span(a, b)
        }
    };
    Ok(face)
}

fn check_face_on_profile(
    sub: crate::face::SubFace,
    class: ProfileClass,
    line: u32,
) -> Result<(), ValidationError> {
    if class.has_face(sub) {
        return Ok(());
    }
    Err(ValidationError::FaceNotOnProfile {
        face: Face::from(sub).to_string(),
        class: class.to_string(),
        line,
    })
}

/// Extent of the face-local y axis for a given face
fn face_y_extent(face: Face, header: &NormalizedHeader) -> f64 {
    match face {
        Face::Web | Face::Behind | Face::Front => header.dims.depth,
        Face::TopFlange | Face::BottomFlange => header.dims.flange_width,
        // Spans are measured in the frame of their first face
        Face::Span(a, _) => face_y_extent(Face::from(a), header),
    }
}

/// Map a raw face-local point into the canonical frame. Absolute coordinates
/// only (end-relative x already resolved or not applicable).
fn canonical_point(x: f64, y: f64, face: Face, header: &NormalizedHeader) -> (f64, f64) {
    let x = match x < 0.0 {
        // End-relative x collapses to an absolute position using the declared
        // member length for all feature kinds except cuts
        true => header.length + x,
        false => x,
    };
    (x, mirror_y(y, face, header))
}

/// Like [`canonical_point`] but preserving end-relative (negative) x values
fn canonical_point_keep_relative(
    x: f64,
    y: f64,
    face: Face,
    header: &NormalizedHeader,
) -> (f64, f64) {
    (x, mirror_y(y, face, header))
}

/// DSTV mirrors the y axis on the bottom flange and rear web faces
fn mirror_y(y: f64, face: Face, header: &NormalizedHeader) -> f64 {
    match face {
        Face::BottomFlange | Face::Behind => face_y_extent(face, header) - y,
        Face::Span(a, _) if matches!(a, crate::face::SubFace::BottomFlange) => {
            face_y_extent(face, header) - y
        }
        _ => y,
    }
}

fn ensure_finite(field: &'static str, line: u32, values: &[f64]) -> Result<(), ValidationError> {
    match values.iter().all(|v| v.is_finite()) {
        true => Ok(()),
        false => Err(ValidationError::BadFieldValue {
            field,
            line,
            reason: "value is not finite".to_string(),
        }),
    }
}
