// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Drilled and slotted holes (BO blocks)

use super::{tool_frame, TOOL_MARGIN};
use crate::error::{Error, Result};
use crate::extrusion::extrude_region;
use crate::profile::Profile2D;
use crate::profiles::circle;
use crate::registry::{FeatureProcessor, ProcessContext};
use crate::scene::{CutRecord, Feature};
use dstv_pivot_core::{FeatureKind, HoleShape};
use nalgebra::Point2;
use tracing::debug;

/// Segments per slot end arc
const ARC_SEGMENTS: usize = 16;

/// Drills round holes and mills oblong slots
pub struct HoleProcessor;

impl HoleProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HoleProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureProcessor for HoleProcessor {
    fn name(&self) -> &'static str {
        "hole"
    }

    fn accepts(&self, feature: &Feature) -> bool {
        feature.kind == FeatureKind::Hole && feature.shape.is_some()
    }

    fn process(
        &self,
        ctx: &mut ProcessContext<'_>,
        feature: &Feature,
    ) -> Result<Option<CutRecord>> {
        let center = feature.points.first().ok_or_else(|| {
            Error::InvalidExtrusion(format!("hole feature {} has no position", feature.id))
        })?;
        let shape = feature.shape.ok_or_else(|| {
            Error::InvalidExtrusion(format!("hole feature {} has no shape", feature.id))
        })?;

        let wall = feature.frame.wall_thickness;
        let (depth, through) = match feature.depth {
            Some(d) if d > wall => {
                return Err(Error::DepthExceedsSection {
                    feature_id: feature.id,
                    depth: d,
                    wall,
                });
            }
            // A floor only exists when the tool stops inside the wall
            Some(d) if d > 0.0 && d < wall => (d, false),
            _ => (wall, true),
        };

        let outline = match shape {
            HoleShape::Round { diameter } => {
                if !(diameter > 0.0) {
                    return Err(Error::InvalidExtrusion(format!(
                        "hole feature {} has diameter {diameter}",
                        feature.id
                    )));
                }
                circle(center.x, center.y, diameter / 2.0, false)
            }
            HoleShape::Oblong {
                width,
                length,
                angle,
            } => {
                if !(width > 0.0) || length < width {
                    return Err(Error::InvalidExtrusion(format!(
                        "slot feature {} has width {width} and length {length}",
                        feature.id
                    )));
                }
                stadium(center.x, center.y, width, length, angle)
            }
        };

        // Blind tools overshoot only on the entry side so the floor lands at
        // the programmed depth
        let tool_depth = depth + if through { 2.0 * TOOL_MARGIN } else { TOOL_MARGIN };
        let tool = extrude_region(
            &Profile2D::new(outline),
            &tool_frame(&feature.frame, TOOL_MARGIN),
            tool_depth,
        )?;
        let bounds = tool.bounds();

        debug!(
            feature = feature.id,
            face = %feature.face,
            through,
            "drilling hole"
        );
        *ctx.mesh = ctx.kernel.subtract(ctx.mesh, &tool)?;

        Ok(Some(CutRecord {
            feature_id: feature.id,
            kind: feature.kind,
            face: feature.face,
            bounds,
            source_line: feature.source_line,
        }))
    }
}

/// Slot outline: two semicircular ends joined by straight flanks, rotated by
/// `angle_deg` around the center. `length` is the overall slot length.
fn stadium(cx: f64, cy: f64, width: f64, length: f64, angle_deg: f64) -> Vec<Point2<f64>> {
    let r = width / 2.0;
    let half = (length - width) / 2.0;
    let (sin, cos) = angle_deg.to_radians().sin_cos();

    let mut points = Vec::with_capacity(2 * (ARC_SEGMENTS + 1));
    let mut push = |lx: f64, ly: f64| {
        points.push(Point2::new(
            cx + lx * cos - ly * sin,
            cy + lx * sin + ly * cos,
        ));
    };

    // Right end arc, bottom to top, then left end arc, top to bottom
    for i in 0..=ARC_SEGMENTS {
        let t = -std::f64::consts::FRAC_PI_2
            + std::f64::consts::PI * i as f64 / ARC_SEGMENTS as f64;
        push(half + r * t.cos(), r * t.sin());
    }
    for i in 0..=ARC_SEGMENTS {
        let t = std::f64::consts::FRAC_PI_2
            + std::f64::consts::PI * i as f64 / ARC_SEGMENTS as f64;
        push(-half + r * t.cos(), r * t.sin());
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csg::CsgrsKernel;
    use crate::processors::test_support::{body, frame, hea240_header};
    use crate::scene::Feature;
    use dstv_pivot_core::{Face, PlanePoint};

    fn web_hole(id: u32, x: f64, y: f64, diameter: f64, depth: Option<f64>) -> Feature {
        let header = hea240_header(2000.0);
        Feature {
            id,
            kind: FeatureKind::Hole,
            face: Face::Web,
            points: vec![PlanePoint { x, y, radius: 0.0 }],
            shape: Some(HoleShape::Round { diameter }),
            depth,
            angle: None,
            text: None,
            text_height: None,
            frame: frame(Face::Web, &header),
            source_line: 4,
        }
    }

    #[test]
    fn through_hole_removes_material() {
        let header = hea240_header(2000.0);
        let kernel = CsgrsKernel::new();
        let mut mesh = body(&header);
        let before = mesh.triangle_count();

        let mut ctx = ProcessContext {
            header: &header,
            mesh: &mut mesh,
            kernel: &kernel,
        };
        let record = HoleProcessor::new()
            .process(&mut ctx, &web_hole(1, 500.0, 100.0, 22.0, None))
            .unwrap()
            .unwrap();

        assert_eq!(record.feature_id, 1);
        assert_ne!(mesh.triangle_count(), before);
        // Tool bounds sit around the hole position
        assert!(record.bounds.min[0] < 500.0 && record.bounds.max[0] > 500.0);
    }

    #[test]
    fn blind_hole_deeper_than_wall_is_rejected() {
        let header = hea240_header(2000.0);
        let kernel = CsgrsKernel::new();
        let mut mesh = body(&header);
        let mut ctx = ProcessContext {
            header: &header,
            mesh: &mut mesh,
            kernel: &kernel,
        };

        // Web is 7.5mm; a 20mm blind hole cannot exist
        let err = HoleProcessor::new()
            .process(&mut ctx, &web_hole(2, 500.0, 100.0, 22.0, Some(20.0)))
            .unwrap_err();
        assert!(matches!(err, Error::DepthExceedsSection { wall, .. } if wall == 7.5));
    }

    #[test]
    fn full_wall_depth_drills_through() {
        let header = hea240_header(2000.0);
        let kernel = CsgrsKernel::new();
        let mut mesh = body(&header);
        let mut ctx = ProcessContext {
            header: &header,
            mesh: &mut mesh,
            kernel: &kernel,
        };

        // Programmed depth equals the 7.5mm web, so the tool must clear both
        // surfaces like a through hole rather than leave a coplanar floor
        let record = HoleProcessor::new()
            .process(&mut ctx, &web_hole(3, 500.0, 100.0, 22.0, Some(7.5)))
            .unwrap()
            .unwrap();
        let tool_span = record.bounds.max[2] - record.bounds.min[2];
        assert!((tool_span - (7.5 + 2.0 * TOOL_MARGIN)).abs() < 1e-6);
    }

    #[test]
    fn stadium_outline_spans_slot_length() {
        let outline = stadium(0.0, 0.0, 10.0, 40.0, 0.0);
        let max_x = outline.iter().map(|p| p.x).fold(f64::MIN, f64::max);
        let min_x = outline.iter().map(|p| p.x).fold(f64::MAX, f64::min);
        assert!((max_x - min_x - 40.0).abs() < 1e-9);
    }

    #[test]
    fn rotated_stadium_swaps_axes() {
        let outline = stadium(0.0, 0.0, 10.0, 40.0, 90.0);
        let max_y = outline.iter().map(|p| p.y).fold(f64::MIN, f64::max);
        let min_y = outline.iter().map(|p| p.y).fold(f64::MAX, f64::min);
        assert!((max_y - min_y - 40.0).abs() < 1e-9);
    }
}
