// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use dstv_pivot_core::FeatureKind;
use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during scene building and feature processing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Triangulation failed: {0}")]
    TriangulationError(String),

    #[error("Invalid cross-section: {0}")]
    InvalidSection(String),

    #[error("Invalid extrusion parameters: {0}")]
    InvalidExtrusion(String),

    #[error("Feature {feature_id} outline self-intersects")]
    SelfIntersectingOutline { feature_id: u32 },

    #[error("Feature {feature_id} depth {depth}mm exceeds the {wall}mm wall of its face")]
    DepthExceedsSection {
        feature_id: u32,
        depth: f64,
        wall: f64,
    },

    #[error("Boolean operation failed: {0}")]
    BooleanFailed(String),

    #[error("No processor registered for {kind} feature {feature_id}")]
    NoProcessorFound { feature_id: u32, kind: FeatureKind },

    #[error("Import cancelled")]
    Cancelled,

    #[error("Core parser error: {0}")]
    CoreError(#[from] dstv_pivot_core::Error),
}
