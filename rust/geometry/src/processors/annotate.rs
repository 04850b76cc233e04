// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Annotation features (SI, PU and BR blocks)
//!
//! Markings, punch marks and bend lines carry no removable volume; they are
//! recorded as provenance with their scene-space location and leave the mesh
//! alone. Downstream consumers (nesting, shop drawings) read them off the
//! element's applied-feature list.

use crate::error::Result;
use crate::mesh::Aabb;
use crate::registry::{FeatureProcessor, ProcessContext};
use crate::scene::{CutRecord, Feature};
use dstv_pivot_core::FeatureKind;
use tracing::trace;

/// Records annotation features without touching geometry
pub struct AnnotationProcessor;

impl AnnotationProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AnnotationProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureProcessor for AnnotationProcessor {
    fn name(&self) -> &'static str {
        "annotate"
    }

    fn accepts(&self, feature: &Feature) -> bool {
        matches!(
            feature.kind,
            FeatureKind::Marking | FeatureKind::PunchMark | FeatureKind::Bend
        )
    }

    fn process(
        &self,
        _ctx: &mut ProcessContext<'_>,
        feature: &Feature,
    ) -> Result<Option<CutRecord>> {
        let mut bounds = Aabb::empty();
        for p in &feature.points {
            let scene = feature.frame.to_scene(p.x, p.y);
            bounds.grow([scene.x, scene.y, scene.z]);
        }

        trace!(
            feature = feature.id,
            kind = %feature.kind,
            text = feature.text.as_deref().unwrap_or(""),
            "recording annotation"
        );

        Ok(Some(CutRecord {
            feature_id: feature.id,
            kind: feature.kind,
            face: feature.face,
            bounds,
            source_line: feature.source_line,
        }))
    }
}
