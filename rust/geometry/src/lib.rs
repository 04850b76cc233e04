// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # DSTV-Pivot Geometry
//!
//! Scene building and feature processing on top of `dstv-pivot-core`. Takes
//! normalized DSTV blocks and produces an in-memory 3D scene: one prismatic
//! member per file with holes drilled, contours applied and cuts taken out
//! of the solid, plus provenance for every applied feature.
//!
//! ## Pipeline
//!
//! 1. **Section** ([`profiles::SectionBuilder`]) — header dims → 2D cross-section
//! 2. **Extrusion** ([`extrusion::extrude_profile`]) — section → member body
//! 3. **Dispatch** ([`registry::ProcessorRegistry`]) — each feature to its processor
//! 4. **Processing** ([`processors`]) — cutting tools and boolean subtraction
//!
//! The usual entry point is [`pipeline::import`]:
//!
//! ```rust,ignore
//! use dstv_pivot_geometry::pipeline::{import, ImportOptions};
//!
//! let text = std::fs::read_to_string("beam.nc1")?;
//! let result = import(&text, &ImportOptions::default())?;
//! for element in &result.scene.elements {
//!     println!("{}: {} triangles", element.header.piece,
//!         element.geometry.mesh.triangle_count());
//! }
//! ```
//!
//! Custom machining plugs in through [`registry::FeatureProcessor`]; an
//! alternative boolean backend through [`csg::BooleanKernel`].

pub mod bool2d;
pub mod builder;
pub mod csg;
pub mod error;
pub mod extrusion;
pub mod mesh;
pub mod pipeline;
pub mod processors;
pub mod profile;
pub mod profiles;
pub mod registry;
pub mod scene;
pub mod triangulation;

pub use builder::{build_element, BuildOptions, BuiltElement};
pub use csg::{BooleanKernel, CsgrsKernel};
pub use error::{Error, Result};
pub use extrusion::{extrude_profile, extrude_region, ExtrusionFrame};
pub use mesh::{Aabb, Mesh};
pub use pipeline::{import, import_many, import_with_registry, Import, ImportOptions, ValidationLevel};
pub use profile::{Profile2D, Triangulation};
pub use profiles::SectionBuilder;
pub use registry::{FeatureProcessor, ProcessContext, ProcessorRegistry};
pub use scene::{
    CutRecord, ElementGeometry, Feature, FeatureFrame, Material, PivotElement, PivotScene,
};
