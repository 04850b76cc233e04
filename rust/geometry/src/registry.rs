// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Feature processor registry
//!
//! Processors are registered explicitly on a [`ProcessorRegistry`] value and
//! the registry is handed to the builder. There is no global registration
//! and no fallback processor: a feature nobody accepts surfaces as
//! [`Error::NoProcessorFound`](crate::error::Error::NoProcessorFound), never
//! as a silent drop.
//!
//! Registration order is priority order. The first processor whose
//! `accepts` returns true wins, so a custom processor registered before the
//! defaults can take over a feature kind for specific shapes only.

use crate::csg::BooleanKernel;
use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::scene::{CutRecord, Feature};
use dstv_pivot_core::NormalizedHeader;
use tracing::trace;

/// Mutable element state a processor works against
pub struct ProcessContext<'a> {
    pub header: &'a NormalizedHeader,
    /// Element body; processors carve it in place
    pub mesh: &'a mut Mesh,
    pub kernel: &'a dyn BooleanKernel,
}

/// One feature family's machining strategy.
///
/// `process` mutates the element mesh through the context and returns the
/// provenance record for the applied feature, or `None` when the feature is
/// annotation-only and leaves the mesh alone.
pub trait FeatureProcessor: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Whether this processor handles the given feature
    fn accepts(&self, feature: &Feature) -> bool;

    fn process(&self, ctx: &mut ProcessContext<'_>, feature: &Feature)
        -> Result<Option<CutRecord>>;
}

/// Ordered collection of processors
#[derive(Default)]
pub struct ProcessorRegistry {
    processors: Vec<Box<dyn FeatureProcessor>>,
}

impl ProcessorRegistry {
    /// Empty registry; nothing is handled until something is registered
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in processors for every standard feature kind
    pub fn with_defaults() -> Self {
        use crate::processors::{
            AnnotationProcessor, ContourProcessor, CutProcessor, HoleProcessor,
        };

        let mut registry = Self::new();
        registry.register(Box::new(HoleProcessor::new()));
        registry.register(Box::new(ContourProcessor::new()));
        registry.register(Box::new(CutProcessor::new()));
        registry.register(Box::new(AnnotationProcessor::new()));
        registry
    }

    /// Append a processor at the lowest priority
    pub fn register(&mut self, processor: Box<dyn FeatureProcessor>) {
        self.processors.push(processor);
    }

    /// First registered processor that accepts the feature
    pub fn find(&self, feature: &Feature) -> Option<&dyn FeatureProcessor> {
        self.processors
            .iter()
            .map(|p| p.as_ref())
            .find(|p| p.accepts(feature))
    }

    /// Route one feature to its processor and run it
    pub fn dispatch(
        &self,
        ctx: &mut ProcessContext<'_>,
        feature: &Feature,
    ) -> Result<Option<CutRecord>> {
        let processor = self.find(feature).ok_or(Error::NoProcessorFound {
            feature_id: feature.id,
            kind: feature.kind,
        })?;
        trace!(
            feature = feature.id,
            kind = %feature.kind,
            processor = processor.name(),
            "dispatching feature"
        );
        processor.process(ctx, feature)
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csg::CsgrsKernel;
    use crate::scene::FeatureFrame;
    use dstv_pivot_core::{Face, FeatureKind, PlanePoint, ProfileClass, SectionDims};

    struct StubProcessor {
        name: &'static str,
        kind: FeatureKind,
    }

    impl FeatureProcessor for StubProcessor {
        fn name(&self) -> &'static str {
            self.name
        }
        fn accepts(&self, feature: &Feature) -> bool {
            feature.kind == self.kind
        }
        fn process(
            &self,
            _ctx: &mut ProcessContext<'_>,
            _feature: &Feature,
        ) -> Result<Option<CutRecord>> {
            Ok(None)
        }
    }

    fn header() -> NormalizedHeader {
        NormalizedHeader {
            order: String::new(),
            drawing: String::new(),
            phase: String::new(),
            piece: "P1".into(),
            steel_grade: "S235JR".into(),
            quantity: 1,
            profile_name: "IPE200".into(),
            class: ProfileClass::I,
            length: 1000.0,
            dims: SectionDims {
                depth: 200.0,
                flange_width: 100.0,
                flange_thickness: 8.5,
                web_thickness: 5.6,
                root_radius: 12.0,
            },
            weight_per_m: 22.4,
            paint_surface_per_m: 0.77,
        }
    }

    fn feature(kind: FeatureKind) -> Feature {
        let header = header();
        Feature {
            id: 0,
            kind,
            face: Face::Web,
            points: vec![PlanePoint {
                x: 100.0,
                y: 100.0,
                radius: 0.0,
            }],
            shape: None,
            depth: None,
            angle: None,
            text: None,
            text_height: None,
            frame: FeatureFrame::for_face(Face::Web, &header).unwrap(),
            source_line: 4,
        }
    }

    #[test]
    fn registration_order_is_priority_order() {
        let mut registry = ProcessorRegistry::new();
        registry.register(Box::new(StubProcessor {
            name: "first",
            kind: FeatureKind::Hole,
        }));
        registry.register(Box::new(StubProcessor {
            name: "second",
            kind: FeatureKind::Hole,
        }));

        let found = registry.find(&feature(FeatureKind::Hole)).unwrap();
        assert_eq!(found.name(), "first");
    }

    #[test]
    fn unhandled_feature_is_an_error_not_a_drop() {
        let registry = ProcessorRegistry::new();
        let header = header();
        let kernel = CsgrsKernel::new();
        let mut mesh = Mesh::new();
        let mut ctx = ProcessContext {
            header: &header,
            mesh: &mut mesh,
            kernel: &kernel,
        };

        let err = registry
            .dispatch(&mut ctx, &feature(FeatureKind::FreeContour))
            .unwrap_err();
        assert!(matches!(err, Error::NoProcessorFound { .. }));
    }

    #[test]
    fn defaults_cover_every_standard_kind() {
        let registry = ProcessorRegistry::with_defaults();
        for kind in [
            FeatureKind::Hole,
            FeatureKind::OuterContour,
            FeatureKind::InnerContour,
            FeatureKind::Cut,
            FeatureKind::Marking,
            FeatureKind::Bend,
            FeatureKind::PunchMark,
            FeatureKind::FreeContour,
        ] {
            let mut f = feature(kind);
            if kind == FeatureKind::Hole {
                f.shape = Some(dstv_pivot_core::HoleShape::Round { diameter: 10.0 });
            }
            assert!(registry.find(&f).is_some(), "no processor for {kind}");
        }
    }
}
