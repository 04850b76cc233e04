// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Saw and flame cuts (SC blocks)
//!
//! Cut outlines keep end-relative x coordinates through normalization and
//! resolve them here against the element's live bounds. That makes a cut
//! see the member as previous cuts left it, so overlapping cuts applied in
//! file order remove different material than the reverse order would.

use super::{tool_frame, TOOL_MARGIN};
use crate::bool2d::{is_valid_contour, outline_self_intersects};
use crate::error::{Error, Result};
use crate::extrusion::extrude_region;
use crate::profile::Profile2D;
use crate::registry::{FeatureProcessor, ProcessContext};
use crate::scene::{CutRecord, Feature};
use dstv_pivot_core::FeatureKind;
use nalgebra::Point2;
use tracing::debug;

/// Applies cut outlines to the member body
pub struct CutProcessor;

impl CutProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CutProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureProcessor for CutProcessor {
    fn name(&self) -> &'static str {
        "cut"
    }

    fn accepts(&self, feature: &Feature) -> bool {
        feature.kind == FeatureKind::Cut
    }

    fn process(
        &self,
        ctx: &mut ProcessContext<'_>,
        feature: &Feature,
    ) -> Result<Option<CutRecord>> {
        if feature.points.len() < 3 {
            return Err(Error::InvalidExtrusion(format!(
                "cut feature {} has fewer than 3 outline points",
                feature.id
            )));
        }

        // End-relative x resolves against what is left of the member, not
        // the declared length
        let live_end = ctx.mesh.bounds().max[0];
        let outline: Vec<Point2<f64>> = feature
            .points
            .iter()
            .map(|p| {
                let x = if p.x < 0.0 { live_end + p.x } else { p.x };
                Point2::new(x, p.y)
            })
            .collect();

        if outline_self_intersects(&outline) {
            return Err(Error::SelfIntersectingOutline {
                feature_id: feature.id,
            });
        }
        if !is_valid_contour(&outline) {
            return Err(Error::InvalidExtrusion(format!(
                "cut feature {} outline has no area",
                feature.id
            )));
        }

        let wall = feature.frame.wall_thickness;
        let (depth, through) = match feature.depth {
            Some(d) if d > 0.0 && d < wall => (d, false),
            _ => (wall, true),
        };

        let tool_depth = depth + if through { 2.0 * TOOL_MARGIN } else { TOOL_MARGIN };
        let tool = extrude_region(
            &Profile2D::new(outline),
            &tool_frame(&feature.frame, TOOL_MARGIN),
            tool_depth,
        )?;
        let bounds = tool.bounds();

        debug!(feature = feature.id, face = %feature.face, "applying cut");
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
