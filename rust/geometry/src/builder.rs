// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scene building
//!
//! Turns one file's normalized blocks into a [`PivotElement`]: build the
//! cross-section, extrude the body, then run every feature through the
//! processor registry in source order. Feature order is machining order, so
//! processing is strictly sequential within an element.

use crate::csg::BooleanKernel;
use crate::error::{Error, Result};
use crate::extrusion::extrude_profile;
use crate::profiles::SectionBuilder;
use crate::registry::{ProcessContext, ProcessorRegistry};
use crate::scene::{ElementGeometry, Feature, FeatureFrame, Material, PivotElement};
use dstv_pivot_core::{
    Diagnostic, Normalized, NormalizedBlock, NormalizedHeader, Stage, ValidationError,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span};

/// Per-element build policy
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Abort on the first feature failure instead of diagnosing and moving on
    pub strict: bool,
    pub cancel: CancellationToken,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            strict: false,
            cancel: CancellationToken::new(),
        }
    }
}

/// A built element plus the soft failures collected on the way
#[derive(Debug)]
pub struct BuiltElement {
    pub element: PivotElement,
    pub diagnostics: Vec<Diagnostic>,
}

/// Build one element from normalized blocks.
///
/// In lenient mode a feature that fails placement or processing becomes a
/// diagnostic and the build continues; the returned element then carries
/// partial geometry. A missing header is fatal in both modes.
pub fn build_element(
    normalized: &Normalized,
    registry: &ProcessorRegistry,
    kernel: &dyn BooleanKernel,
    options: &BuildOptions,
) -> Result<BuiltElement> {
    let header = normalized
        .blocks
        .iter()
        .find_map(|b| match b {
            NormalizedBlock::Header(h) => Some(h),
            _ => None,
        })
        .ok_or_else(|| {
            Error::CoreError(ValidationError::MissingProfileHeader.into())
        })?;

    let span = info_span!("build_element", piece = %header.piece);
    let _guard = span.enter();

    let mut diagnostics = Vec::new();

    let section = SectionBuilder::build(header.class, &header.dims)?;
    let mut mesh = extrude_profile(&section, header.length)?;
    debug!(
        triangles = mesh.triangle_count(),
        length = header.length,
        "extruded member body"
    );

    let features = place_features(normalized, header, options, &mut diagnostics)?;

    let mut applied = Vec::with_capacity(features.len());
    for feature in &features {
        if options.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mut ctx = ProcessContext {
            header,
            mesh: &mut mesh,
            kernel,
        };
        match registry.dispatch(&mut ctx, feature) {
            Ok(Some(record)) => applied.push(record),
            Ok(None) => {}
            Err(err) if options.strict => return Err(err),
            Err(err) => {
                // Partial scene: the feature is reported, never dropped
                diagnostics.push(Diagnostic::error(
                    Stage::Process,
                    Some(feature.source_line),
                    format!("feature {} not applied: {err}", feature.id),
                ));
            }
        }
    }

    let element = PivotElement {
        material: Material {
            grade: header.steel_grade.clone(),
            weight_per_m: header.weight_per_m,
        },
        header: header.clone(),
        section: Some(section),
        features,
        geometry: ElementGeometry { mesh, applied },
    };

    Ok(BuiltElement {
        element,
        diagnostics,
    })
}

/// Assign ids and face frames to the normalized features, in source order
fn place_features(
    normalized: &Normalized,
    header: &NormalizedHeader,
    options: &BuildOptions,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Vec<Feature>> {
    let mut features = Vec::new();
    let mut next_id = 1u32;

    for block in &normalized.blocks {
        let NormalizedBlock::Feature(f) = block else {
            continue;
        };

        let frame = match FeatureFrame::for_face(f.face, header) {
            Ok(frame) => frame,
            Err(err) if options.strict => return Err(err),
            Err(err) => {
                diagnostics.push(Diagnostic::error(
                    Stage::Scene,
                    Some(f.source_line),
                    format!("feature skipped: {err}"),
                ));
                continue;
            }
        };

        features.push(Feature {
            id: next_id,
            kind: f.kind,
            face: f.face,
            points: f.points.clone(),
            shape: f.shape,
            depth: f.depth,
            angle: f.angle,
            text: f.text.clone(),
            text_height: f.text_height,
            frame,
            source_line: f.source_line,
        });
        next_id += 1;
    }

    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csg::CsgrsKernel;
    use dstv_pivot_core::{
        classify, normalize, parse_blocks, tokenize, NormalizeOptions,
    };

    const HEADER: &str =
        "ST\n  PRJ-7 D-100 1 B-12 S355J2 4 HEA240 I\n  2000 230 240 12 7.5 21 60.3 1.37\n";

    fn normalized(text: &str) -> Normalized {
        let tokens = tokenize(text).unwrap();
        let blocks = parse_blocks(&tokens).unwrap();
        let classified = classify(&blocks).unwrap();
        normalize(&classified.blocks, &NormalizeOptions::default()).unwrap()
    }

    #[test]
    fn header_only_file_builds_a_bare_prism() {
        let built = build_element(
            &normalized(&format!("{HEADER}EN\n")),
            &ProcessorRegistry::with_defaults(),
            &CsgrsKernel::new(),
            &BuildOptions::default(),
        )
        .unwrap();

        let bounds = built.element.bounds();
        assert!((bounds.max[0] - 2000.0).abs() < 1e-6);
        assert!((bounds.max[1] - 230.0).abs() < 1e-6);
        assert!(built.element.features.is_empty());
        assert!(built.diagnostics.is_empty());
    }

    #[test]
    fn features_get_sequential_ids_in_source_order() {
        let text = format!("{HEADER}BO\n  v 500 100 22\nBO\n  v 800 100 22\nEN\n");
        let built = build_element(
            &normalized(&text),
            &ProcessorRegistry::with_defaults(),
            &CsgrsKernel::new(),
            &BuildOptions::default(),
        )
        .unwrap();

        let ids: Vec<u32> = built.element.features.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(built.element.geometry.applied.len(), 2);
    }

    #[test]
    fn lenient_build_diagnoses_unhandled_features() {
        // Empty registry handles nothing
        let text = format!("{HEADER}BO\n  v 500 100 22\nEN\n");
        let built = build_element(
            &normalized(&text),
            &ProcessorRegistry::new(),
            &CsgrsKernel::new(),
            &BuildOptions::default(),
        )
        .unwrap();

        assert!(built.element.geometry.applied.is_empty());
        assert_eq!(built.diagnostics.len(), 1);
        assert!(built.diagnostics[0].message.contains("No processor"));
    }

    #[test]
    fn strict_build_fails_on_unhandled_features() {
        let text = format!("{HEADER}BO\n  v 500 100 22\nEN\n");
        let err = build_element(
            &normalized(&text),
            &ProcessorRegistry::new(),
            &CsgrsKernel::new(),
            &BuildOptions {
                strict: true,
                cancel: CancellationToken::new(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::NoProcessorFound { .. }));
    }

    #[test]
    fn cancelled_build_stops_early() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let text = format!("{HEADER}BO\n  v 500 100 22\nEN\n");
        let err = build_element(
            &normalized(&text),
            &ProcessorRegistry::with_defaults(),
            &CsgrsKernel::new(),
            &BuildOptions {
                strict: false,
                cancel,
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }
}
