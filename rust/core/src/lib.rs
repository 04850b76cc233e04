// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # DSTV-Pivot Core Parser
//!
//! Parser pipeline for DSTV NC files, the steel-fabrication exchange format
//! describing one structural profile and its machining features as
//! line-oriented, two-letter-coded blocks.
//!
//! ## Pipeline
//!
//! Four stages, each a pure function of the previous stage's output:
//!
//! 1. **Lexer** ([`tokenize`]) — raw text → ordered token stream
//! 2. **Syntax** ([`parse_blocks`]) — tokens → raw blocks (code + fields)
//! 3. **Semantic** ([`classify`]) — raw blocks → typed block records
//! 4. **Normalize** ([`normalize`]) — typed blocks → geometry-ready
//!    primitives with resolved faces and canonical coordinates
//!
//! Scene building and feature processing live in `dstv-pivot-geometry`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dstv_pivot_core::{classify, normalize, parse_blocks, tokenize, NormalizeOptions};
//!
//! let text = std::fs::read_to_string("beam.nc1")?;
//! let tokens = tokenize(&text)?;
//! let blocks = parse_blocks(&tokens)?;
//! let classified = classify(&blocks)?;
//! let normalized = normalize(&classified.blocks, &NormalizeOptions::default())?;
//! ```
//!
//! ## Format quirks handled
//!
//! - `**` comments (line and trailing) without corrupting field boundaries
//! - scientific notation (`1.23E+02`) and trailing-dot floats (`40.`)
//! - compound face notation (`vou` = feature spanning two faces)
//! - trailing `l` modifier marking oblong holes
//! - unknown block codes preserved as vendor blocks
//!
//! ## Feature Flags
//!
//! - `serde`: serialization support for parsed data

pub mod error;
pub mod face;
pub mod lexer;
pub mod normalize;
pub mod semantic;
pub mod syntax;

pub use error::{Diagnostic, Error, LexError, Result, Severity, Stage, SyntaxError, ValidationError};
pub use face::{Face, FaceCode, SubFace, DEFAULT_FACE};
pub use lexer::{tokenize, tokenize_lenient, Token, TokenKind};
pub use normalize::{
    normalize, FeatureKind, HoleShape, Normalized, NormalizedBlock, NormalizedFeature,
    NormalizedHeader, NormalizeOptions, PlanePoint, Position3,
};
pub use semantic::{
    classify, Classified, Contour, ContourVertex, CutOutline, Hole, HoleSet, Marking,
    ProfileClass, ProfileHeader, SectionDims, SemanticBlock, Slot, VendorBlock,
};
pub use syntax::{parse_blocks, parse_blocks_lenient, BlockCode, RawBlock};
