// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Block grammar: token stream → ordered raw blocks.
//!
//! This stage detects block boundaries and validates field arity per block
//! code. It does not interpret field meaning; that is the semantic stage's
//! job. Unknown two-letter codes are preserved as vendor blocks rather than
//! rejected.

use crate::error::SyntaxError;
use crate::lexer::{Token, TokenKind};
use std::fmt;

/// DSTV block code. Closed set of standard codes plus a preserved
/// vendor/unknown variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlockCode {
    /// Profile header (Stammdaten)
    St,
    /// Hole set
    Bo,
    /// Outer contour
    Ak,
    /// Inner contour
    Ik,
    /// Marking
    Si,
    /// Saw/plate cut
    Sc,
    /// Bend line
    Br,
    /// Punch marks
    Pu,
    /// Free (scribed) contour
    Ko,
    /// Vendor extension
    Ue,
    /// End of file marker
    En,
    /// Unrecognized vendor code, preserved verbatim
    Unknown(String),
}

impl BlockCode {
    /// Map a two-letter marker lexeme to its code
    pub fn from_marker(marker: &str) -> BlockCode {
        match marker {
            "ST" => BlockCode::St,
            "BO" => BlockCode::Bo,
            "AK" => BlockCode::Ak,
            "IK" => BlockCode::Ik,
            "SI" => BlockCode::Si,
            "SC" => BlockCode::Sc,
            "BR" => BlockCode::Br,
            "PU" => BlockCode::Pu,
            "KO" => BlockCode::Ko,
            "UE" => BlockCode::Ue,
            "EN" => BlockCode::En,
            other => BlockCode::Unknown(other.to_string()),
        }
    }

    /// Allowed field count per block code: `(min, max)`.
    ///
    /// Row-structured blocks (BO, AK, PU, …) only get a lower bound here; row
    /// shape is validated during classification.
    pub fn field_arity(&self) -> (usize, Option<usize>) {
        match self {
            // order, drawing, phase, piece, grade, quantity, name, class
            // + eight dimension fields
            BlockCode::St => (16, None),
            // x, y, diameter at minimum; the face indicator may be omitted
            BlockCode::Bo => (3, None),
            // face + at least three (x, y, radius) vertices
            BlockCode::Ak | BlockCode::Ik | BlockCode::Ko => (10, None),
            // face, x, y, angle, height, text…
            BlockCode::Si => (6, None),
            // face, depth + at least three (x, y) vertices
            BlockCode::Sc => (8, None),
            // face, x1, y1, x2, y2, angle
            BlockCode::Br => (6, Some(6)),
            // face + at least one (x, y) point
            BlockCode::Pu => (3, None),
            BlockCode::Ue | BlockCode::Unknown(_) => (0, None),
            BlockCode::En => (0, Some(0)),
        }
    }
}

impl fmt::Display for BlockCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockCode::St => write!(f, "ST"),
            BlockCode::Bo => write!(f, "BO"),
            BlockCode::Ak => write!(f, "AK"),
            BlockCode::Ik => write!(f, "IK"),
            BlockCode::Si => write!(f, "SI"),
            BlockCode::Sc => write!(f, "SC"),
            BlockCode::Br => write!(f, "BR"),
            BlockCode::Pu => write!(f, "PU"),
            BlockCode::Ko => write!(f, "KO"),
            BlockCode::Ue => write!(f, "UE"),
            BlockCode::En => write!(f, "EN"),
            BlockCode::Unknown(code) => write!(f, "{code}"),
        }
    }
}

/// One physical block occurrence: code plus its ordered field tokens
#[derive(Debug, Clone, PartialEq)]
pub struct RawBlock<'a> {
    pub code: BlockCode,
    pub fields: Vec<Token<'a>>,
    /// First and last source line covered by this block
    pub line_range: (u32, u32),
}

/// Split the token stream into raw blocks, failing on the first arity
/// violation. See [`parse_blocks_lenient`] for per-block error recovery.
pub fn parse_blocks<'a>(tokens: &[Token<'a>]) -> Result<Vec<RawBlock<'a>>, SyntaxError> {
    let (blocks, mut errors) = parse_blocks_lenient(tokens);
    match errors.is_empty() {
        true => Ok(blocks),
        false => Err(errors.remove(0)),
    }
}

/// Split the token stream into raw blocks, collecting arity violations
/// instead of aborting. Invalid blocks are dropped from the output and
/// reported; valid neighbours are unaffected.
pub fn parse_blocks_lenient<'a>(
    tokens: &[Token<'a>],
) -> (Vec<RawBlock<'a>>, Vec<SyntaxError>) {
    let mut blocks = Vec::new();
    let mut errors = Vec::new();

    let mut current: Option<RawBlock<'a>> = None;
    let mut saw_any_marker = false;
    let mut past_end = false;
    let mut orphan_line: Option<u32> = None;

    for token in tokens {
        if past_end {
            break;
        }
        match &token.kind {
            TokenKind::BlockMarker(marker) => {
                saw_any_marker = true;
                if let Some(block) = current.take() {
                    finish_block(block, &mut blocks, &mut errors);
                }
                let code = BlockCode::from_marker(marker);
                let is_end = code == BlockCode::En;
                current = Some(RawBlock {
                    code,
                    fields: Vec::new(),
                    line_range: (token.line, token.line),
                });
                if is_end {
                    // EN terminates the file; anything after it is ignored
                    past_end = true;
                }
            }
            TokenKind::Eof => break,
            _ => match current.as_mut() {
                Some(block) => {
                    block.line_range.1 = token.line;
                    block.fields.push(token.clone());
                }
                None => {
                    // One diagnostic per stray line is enough
                    if orphan_line != Some(token.line) {
                        errors.push(SyntaxError::FieldsBeforeBlock { line: token.line });
                        orphan_line = Some(token.line);
                    }
                }
            },
        }
    }

    if let Some(block) = current.take() {
        finish_block(block, &mut blocks, &mut errors);
    }

    if !saw_any_marker {
        errors.push(SyntaxError::EmptyFile);
    }

    (blocks, errors)
}

fn finish_block<'a>(
    block: RawBlock<'a>,
    blocks: &mut Vec<RawBlock<'a>>,
    errors: &mut Vec<SyntaxError>,
) {
    let (min, max) = block.code.field_arity();
    let count = block.fields.len();
    let over = max.map(|m| count > m).unwrap_or(false);
    if count < min || over {
        errors.push(SyntaxError::FieldCount {
            code: block.code,
            line: block.line_range.0,
            count,
            min,
            max,
        });
        return;
    }
    blocks.push(block);
}
