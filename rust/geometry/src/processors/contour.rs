// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Contour machining (AK, IK and KO blocks)
//!
//! Outer contours redraw the member silhouette in their face plane: material
//! outside the outline goes, through the full section. The waste region is
//! computed in 2D first and only then extruded, which keeps the solid
//! boolean small and well-conditioned.
//!
//! Inner and free contours punch their outline through the face wall.

use super::{face_extents, normal_span, tool_frame, TOOL_MARGIN};
use crate::bool2d::{difference_all, is_valid_contour, outline_self_intersects};
use crate::error::{Error, Result};
use crate::extrusion::extrude_region;
use crate::mesh::Mesh;
use crate::profile::Profile2D;
use crate::registry::{FeatureProcessor, ProcessContext};
use crate::scene::{CutRecord, Feature};
use dstv_pivot_core::FeatureKind;
use nalgebra::Point2;
use smallvec::SmallVec;
use tracing::debug;

/// Applies outline-based machining
pub struct ContourProcessor;

impl ContourProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ContourProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureProcessor for ContourProcessor {
    fn name(&self) -> &'static str {
        "contour"
    }

    fn accepts(&self, feature: &Feature) -> bool {
        matches!(
            feature.kind,
            FeatureKind::OuterContour | FeatureKind::InnerContour | FeatureKind::FreeContour
        )
    }

    fn process(
        &self,
        ctx: &mut ProcessContext<'_>,
        feature: &Feature,
    ) -> Result<Option<CutRecord>> {
        if feature.points.len() < 3 {
            return Err(Error::InvalidExtrusion(format!(
                "contour feature {} has fewer than 3 vertices",
                feature.id
            )));
        }

        let outline: Vec<Point2<f64>> = feature
            .points
            .iter()
            .map(|p| Point2::new(p.x, p.y))
            .collect();

        if outline_self_intersects(&outline) {
            return Err(Error::SelfIntersectingOutline {
                feature_id: feature.id,
            });
        }
        if !is_valid_contour(&outline) {
            return Err(Error::InvalidExtrusion(format!(
                "contour feature {} outline has no area",
                feature.id
            )));
        }

        match feature.kind {
            FeatureKind::OuterContour => self.apply_silhouette(ctx, feature, &outline),
            _ => self.apply_pocket(ctx, feature, outline),
        }
    }
}

impl ContourProcessor {
    /// Remove everything outside the outline, through the whole section
    fn apply_silhouette(
        &self,
        ctx: &mut ProcessContext<'_>,
        feature: &Feature,
        outline: &[Point2<f64>],
    ) -> Result<Option<CutRecord>> {
        let live = ctx.mesh.bounds();
        let (umin, umax, vmin, vmax) = face_extents(&feature.frame, &live);
        let m = TOOL_MARGIN;

        // Face-plane rectangle covering the whole member, margin-expanded
        let cover = Profile2D::new(vec![
            Point2::new(umin - m, vmin - m),
            Point2::new(umax + m, vmin - m),
            Point2::new(umax + m, vmax + m),
            Point2::new(umin - m, vmax + m),
        ]);

        let waste: SmallVec<[Profile2D; 4]> =
            difference_all(&cover, outline)?.into_iter().collect();
        if waste.is_empty() {
            // Outline swallows the whole footprint; nothing to remove
            return Ok(Some(CutRecord {
                feature_id: feature.id,
                kind: feature.kind,
                face: feature.face,
                bounds: crate::mesh::Aabb::empty(),
                source_line: feature.source_line,
            }));
        }

        // Silhouettes always run through the full section, not just the
        // face wall
        let (start, extent) = normal_span(&feature.frame, &live);
        let depth = extent + 2.0 * m;
        let mut frame = feature.frame;
        frame.origin += frame.normal * start;

        let mut removed = crate::mesh::Aabb::empty();
        let mut tool = Mesh::new();
        for region in &waste {
            tool.merge(&extrude_region(region, &tool_frame(&frame, m), depth)?);
        }
        removed.union(&tool.bounds());

        debug!(
            feature = feature.id,
            regions = waste.len(),
            "replacing member silhouette"
        );
        *ctx.mesh = ctx.kernel.subtract(ctx.mesh, &tool)?;

        Ok(Some(CutRecord {
            feature_id: feature.id,
            kind: feature.kind,
            face: feature.face,
            bounds: removed,
            source_line: feature.source_line,
        }))
    }

    /// Punch the outline through the face wall
    fn apply_pocket(
        &self,
        ctx: &mut ProcessContext<'_>,
        feature: &Feature,
        outline: Vec<Point2<f64>>,
    ) -> Result<Option<CutRecord>> {
        let depth = feature.frame.wall_thickness + 2.0 * TOOL_MARGIN;
        let tool = extrude_region(
            &Profile2D::new(outline),
            &tool_frame(&feature.frame, TOOL_MARGIN),
            depth,
        )?;
        let bounds = tool.bounds();

        debug!(feature = feature.id, face = %feature.face, "punching contour");
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csg::CsgrsKernel;
    use crate::processors::test_support::{body, frame, plate_header};
    use crate::scene::Feature;
    use dstv_pivot_core::{Face, PlanePoint};

    fn plate_contour(kind: FeatureKind, pts: &[(f64, f64)]) -> Feature {
        let header = plate_header(1000.0);
        Feature {
            id: 1,
            kind,
            face: Face::Web,
            points: pts
                .iter()
                .map(|&(x, y)| PlanePoint { x, y, radius: 0.0 })
                .collect(),
            shape: None,
            depth: None,
            angle: None,
            text: None,
            text_height: None,
            frame: frame(Face::Web, &header),
            source_line: 4,
        }
    }

    #[test]
    fn outer_contour_trims_the_footprint() {
        let header = plate_header(1000.0);
        let kernel = CsgrsKernel::new();
        let mut mesh = body(&header);
        let mut ctx = ProcessContext {
            header: &header,
            mesh: &mut mesh,
            kernel: &kernel,
        };

        // Keep only the first 600mm of the plate
        let ak = plate_contour(
            FeatureKind::OuterContour,
            &[(0.0, 0.0), (600.0, 0.0), (600.0, 200.0), (0.0, 200.0)],
        );
        ContourProcessor::new().process(&mut ctx, &ak).unwrap();
        assert!((mesh.bounds().max[0] - 600.0).abs() < 1e-6);
    }

    #[test]
    fn inner_contour_opens_a_window() {
        let header = plate_header(1000.0);
        let kernel = CsgrsKernel::new();
        let mut mesh = body(&header);
        let before = mesh.triangle_count();
        let mut ctx = ProcessContext {
            header: &header,
            mesh: &mut mesh,
            kernel: &kernel,
        };

        let ik = plate_contour(
            FeatureKind::InnerContour,
            &[(200.0, 50.0), (400.0, 50.0), (400.0, 150.0), (200.0, 150.0)],
        );
        let record = ContourProcessor::new()
            .process(&mut ctx, &ik)
            .unwrap()
            .unwrap();

        assert_ne!(mesh.triangle_count(), before);
        // Footprint untouched, only a window added
        assert!((mesh.bounds().max[0] - 1000.0).abs() < 1e-6);
        assert_eq!(record.kind, FeatureKind::InnerContour);
    }

    #[test]
    fn degenerate_contour_is_rejected() {
        let header = plate_header(1000.0);
        let kernel = CsgrsKernel::new();
        let mut mesh = body(&header);
        let mut ctx = ProcessContext {
            header: &header,
            mesh: &mut mesh,
            kernel: &kernel,
        };

        let line = plate_contour(
            FeatureKind::InnerContour,
            &[(0.0, 0.0), (100.0, 0.0), (200.0, 0.0)],
        );
        assert!(ContourProcessor::new().process(&mut ctx, &line).is_err());
    }
}
