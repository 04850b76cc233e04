// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Semantic classification: raw blocks → typed block records.
//!
//! Each raw block's flat field list is converted into named, typed fields.
//! Classification fails softly: a malformed block yields a warning diagnostic
//! and is skipped, so one bad block does not block import of an otherwise
//! valid file. A missing ST header before the first feature block is the one
//! fatal case (features cannot be placed without a profile).

use crate::error::{Diagnostic, Stage, ValidationError};
use crate::face::FaceCode;
use crate::lexer::{Token, TokenKind};
use crate::syntax::{BlockCode, RawBlock};
use std::fmt;
use tracing::warn;

/// Profile class letter from the ST header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProfileClass {
    /// I / H sections (IPE, HEA, …)
    I,
    /// U channels (UPN, UPE)
    U,
    /// Angles
    L,
    /// Tees
    T,
    /// Cold-formed channels
    C,
    /// Flat plate (code `B`)
    Plate,
    /// Round bar (code `RO`)
    RoundBar,
    /// Round tube (code `RU`)
    RoundTube,
    /// Rectangular hollow section (code `M`)
    RectTube,
}

impl ProfileClass {
    /// Parse the ST header's profile code field
    pub fn from_code(code: &str) -> Option<ProfileClass> {
        match code {
            "I" => Some(ProfileClass::I),
            "U" => Some(ProfileClass::U),
            "L" => Some(ProfileClass::L),
            "T" => Some(ProfileClass::T),
            "C" => Some(ProfileClass::C),
            "B" => Some(ProfileClass::Plate),
            "RO" => Some(ProfileClass::RoundBar),
            "RU" => Some(ProfileClass::RoundTube),
            "M" => Some(ProfileClass::RectTube),
            _ => None,
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            ProfileClass::I => "I",
            ProfileClass::U => "U",
            ProfileClass::L => "L",
            ProfileClass::T => "T",
            ProfileClass::C => "C",
            ProfileClass::Plate => "B",
            ProfileClass::RoundBar => "RO",
            ProfileClass::RoundTube => "RU",
            ProfileClass::RectTube => "M",
        }
    }

    /// Faces that exist on this profile class, by raw letter
    pub fn has_face(&self, sub: crate::face::SubFace) -> bool {
        use crate::face::SubFace;
        match self {
            ProfileClass::I | ProfileClass::U | ProfileClass::C | ProfileClass::RectTube => true,
            ProfileClass::L => matches!(sub, SubFace::Web | SubFace::BottomFlange),
            ProfileClass::T => matches!(sub, SubFace::Web | SubFace::TopFlange),
            ProfileClass::Plate | ProfileClass::RoundBar | ProfileClass::RoundTube => {
                matches!(sub, SubFace::Web)
            }
        }
    }
}

impl fmt::Display for ProfileClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

/// Cross-section dimensions from the ST header, in millimetres.
///
/// For flat plates (`B`) `depth` is the plate width and `web_thickness` the
/// plate thickness; the flange fields are zero.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SectionDims {
    pub depth: f64,
    pub flange_width: f64,
    pub flange_thickness: f64,
    pub web_thickness: f64,
    pub root_radius: f64,
}

/// Typed ST block
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProfileHeader {
    pub order: String,
    pub drawing: String,
    pub phase: String,
    pub piece: String,
    pub steel_grade: String,
    pub quantity: u32,
    pub profile_name: String,
    pub class: ProfileClass,
    pub length: f64,
    pub dims: SectionDims,
    pub weight_per_m: f64,
    pub paint_surface_per_m: f64,
    pub source_line: u32,
}

/// One BO row. `slot` is present iff the diameter carried the `l` modifier.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Hole {
    pub face: Option<FaceCode>,
    pub x: f64,
    pub y: f64,
    pub diameter: f64,
    pub depth: Option<f64>,
    pub slot: Option<Slot>,
}

/// Oblong-hole extension of a BO row
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Slot {
    pub length: f64,
    pub width: f64,
    pub angle: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HoleSet {
    pub holes: Vec<Hole>,
    pub source_line: u32,
}

/// Contour vertex: position plus optional notch radius
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContourVertex {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Contour {
    pub face: Option<FaceCode>,
    pub vertices: Vec<ContourVertex>,
    pub source_line: u32,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Marking {
    pub face: Option<FaceCode>,
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub height: f64,
    pub text: String,
    pub source_line: u32,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CutOutline {
    pub face: Option<FaceCode>,
    pub depth: f64,
    pub points: Vec<(f64, f64)>,
    pub source_line: u32,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BendLine {
    pub face: Option<FaceCode>,
    pub start: (f64, f64),
    pub end: (f64, f64),
    pub angle: f64,
    pub source_line: u32,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PunchMarks {
    pub face: Option<FaceCode>,
    pub points: Vec<(f64, f64)>,
    pub source_line: u32,
}

/// Unrecognized or vendor-extension block, preserved verbatim
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VendorBlock {
    pub code: String,
    pub fields: Vec<String>,
    pub source_line: u32,
}

/// Typed block record, one variant per block code
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SemanticBlock {
    ProfileHeader(ProfileHeader),
    HoleSet(HoleSet),
    OuterContour(Contour),
    InnerContour(Contour),
    Marking(Marking),
    Cut(CutOutline),
    Bend(BendLine),
    PunchMarks(PunchMarks),
    FreeContour(Contour),
    Vendor(VendorBlock),
}

impl SemanticBlock {
    /// Whether this block describes a machining feature (as opposed to the
    /// header or a vendor extension)
    pub fn is_feature(&self) -> bool {
        !matches!(
            self,
            SemanticBlock::ProfileHeader(_) | SemanticBlock::Vendor(_)
        )
    }

    pub fn source_line(&self) -> u32 {
        match self {
            SemanticBlock::ProfileHeader(h) => h.source_line,
            SemanticBlock::HoleSet(h) => h.source_line,
            SemanticBlock::OuterContour(c)
            | SemanticBlock::InnerContour(c)
            | SemanticBlock::FreeContour(c) => c.source_line,
            SemanticBlock::Marking(m) => m.source_line,
            SemanticBlock::Cut(c) => c.source_line,
            SemanticBlock::Bend(b) => b.source_line,
            SemanticBlock::PunchMarks(p) => p.source_line,
            SemanticBlock::Vendor(v) => v.source_line,
        }
    }
}

/// Classification output: typed blocks plus soft-failure diagnostics
#[derive(Debug, Clone)]
pub struct Classified {
    pub blocks: Vec<SemanticBlock>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Classify raw blocks into typed records.
///
/// Fatal only when no ST header precedes the first feature block; every other
/// failure is a [`Diagnostic`] attached to the output.
pub fn classify(blocks: &[RawBlock<'_>]) -> Result<Classified, ValidationError> {
    let mut out = Vec::with_capacity(blocks.len());
    let mut diagnostics = Vec::new();
    let mut saw_header = false;

    for block in blocks {
        if block.code == BlockCode::En {
            continue;
        }
        if block.code == BlockCode::St {
            saw_header = true;
        } else if !saw_header && !matches!(block.code, BlockCode::Ue | BlockCode::Unknown(_)) {
            return Err(ValidationError::MissingProfileHeader);
        }

        match classify_block(block) {
            Ok(semantic) => out.push(semantic),
            Err(err) => {
                let line = block.line_range.0;
                warn!(code = %block.code, line, %err, "block failed classification");
                diagnostics.push(Diagnostic::warning(
                    Stage::Classify,
                    Some(line),
                    format!("block {} skipped: {err}", block.code),
                ));
            }
        }
    }

    if !saw_header {
        return Err(ValidationError::MissingProfileHeader);
    }

    Ok(Classified {
        blocks: out,
        diagnostics,
    })
}

fn classify_block(block: &RawBlock<'_>) -> Result<SemanticBlock, ValidationError> {
    let line = block.line_range.0;
    let mut fields = Fields::new(&block.fields, line);

    match &block.code {
        BlockCode::St => classify_header(&mut fields, line),
        BlockCode::Bo => classify_holes(&mut fields, line),
        BlockCode::Ak => Ok(SemanticBlock::OuterContour(classify_contour(
            &mut fields,
            line,
        )?)),
        BlockCode::Ik => Ok(SemanticBlock::InnerContour(classify_contour(
            &mut fields,
            line,
        )?)),
        BlockCode::Ko => Ok(SemanticBlock::FreeContour(classify_contour(
            &mut fields,
            line,
        )?)),
        BlockCode::Si => classify_marking(&mut fields, line),
        BlockCode::Sc => classify_cut(&mut fields, line),
        BlockCode::Br => classify_bend(&mut fields, line),
        BlockCode::Pu => classify_punches(&mut fields, line),
        BlockCode::Ue | BlockCode::Unknown(_) => Ok(SemanticBlock::Vendor(VendorBlock {
            code: block.code.to_string(),
            fields: block.fields.iter().map(|t| t.text.to_string()).collect(),
            source_line: line,
        })),
        BlockCode::En => unreachable!("EN blocks are filtered before classification"),
    }
}

fn classify_header(fields: &mut Fields<'_, '_>, line: u32) -> Result<SemanticBlock, ValidationError> {
    let order = fields.text("order")?;
    let drawing = fields.text("drawing")?;
    let phase = fields.text("phase")?;
    let piece = fields.text("piece")?;
    let steel_grade = fields.text("steel grade")?;
    let quantity = fields.number("quantity")? as u32;
    let profile_name = fields.text("profile name")?;

    let class_code = fields.text("profile class")?;
    let class = ProfileClass::from_code(&class_code).ok_or(ValidationError::BadFieldValue {
        field: "profile class",
        line,
        reason: format!("unknown profile code '{class_code}'"),
    })?;

    let length = fields.positive("length")?;
    let depth = fields.positive("depth")?;
    let flange_width = fields.number("flange width")?;
    let flange_thickness = fields.number("flange thickness")?;
    let web_thickness = fields.positive("web thickness")?;
    let root_radius = fields.number("root radius")?;
    let weight_per_m = fields.number("weight per metre")?;
    let paint_surface_per_m = fields.number("paint surface per metre")?;
    // Trailing header fields (info texts, processing codes) are tolerated

    Ok(SemanticBlock::ProfileHeader(ProfileHeader {
        order,
        drawing,
        phase,
        piece,
        steel_grade,
        quantity,
        profile_name,
        class,
        length,
        dims: SectionDims {
            depth,
            flange_width,
            flange_thickness,
            web_thickness,
            root_radius,
        },
        weight_per_m,
        paint_surface_per_m,
        source_line: line,
    }))
}

fn classify_holes(fields: &mut Fields<'_, '_>, line: u32) -> Result<SemanticBlock, ValidationError> {
    let mut holes = Vec::new();

    while !fields.is_empty() {
        let face = fields.face();
        let x = fields.number("hole x")?;
        let y = fields.number("hole y")?;
        let diameter = fields.positive("hole diameter")?;

        let slot = match fields.modifier() {
            Some('l') => Some(Slot {
                length: fields.positive("slot length")?,
                width: fields.positive("slot width")?,
                angle: fields.number("slot angle")?,
            }),
            Some(other) => {
                return Err(ValidationError::BadFieldValue {
                    field: "hole modifier",
                    line,
                    reason: format!("unsupported modifier '{other}'"),
                })
            }
            None => None,
        };

        // A number before the next face indicator is a blind-hole depth
        let depth = match fields.peek_number() {
            true => Some(fields.positive("hole depth")?),
            false => None,
        };

        holes.push(Hole {
            face,
            x,
            y,
            diameter,
            depth,
            slot,
        });
    }

    if holes.is_empty() {
        return Err(ValidationError::MissingField {
            field: "hole rows",
            line,
        });
    }

    Ok(SemanticBlock::HoleSet(HoleSet {
        holes,
        source_line: line,
    }))
}

fn classify_contour(fields: &mut Fields<'_, '_>, line: u32) -> Result<Contour, ValidationError> {
    let face = fields.face();
    let mut vertices = Vec::new();

    while !fields.is_empty() {
        vertices.push(ContourVertex {
            x: fields.number("contour x")?,
            y: fields.number("contour y")?,
            radius: fields.number("contour radius")?,
        });
    }

    if vertices.len() < 3 {
        return Err(ValidationError::DegenerateContour {
            line,
            reason: format!("{} vertices, need at least 3", vertices.len()),
        });
    }

    Ok(Contour {
        face,
        vertices,
        source_line: line,
    })
}

fn classify_marking(fields: &mut Fields<'_, '_>, line: u32) -> Result<SemanticBlock, ValidationError> {
    let face = fields.face();
    let x = fields.number("marking x")?;
    let y = fields.number("marking y")?;
    let angle = fields.number("marking angle")?;
    let height = fields.positive("marking text height")?;
    let text = fields.remaining_text();
    if text.is_empty() {
        return Err(ValidationError::MissingField {
            field: "marking text",
            line,
        });
    }

    Ok(SemanticBlock::Marking(Marking {
        face,
        x,
        y,
        angle,
        height,
        text,
        source_line: line,
    }))
}

fn classify_cut(fields: &mut Fields<'_, '_>, line: u32) -> Result<SemanticBlock, ValidationError> {
    let face = fields.face();
    // Depth 0 is the conventional through-cut marker
    let depth = fields.non_negative("cut depth")?;
    let mut points = Vec::new();

    while !fields.is_empty() {
        let x = fields.number("cut x")?;
        let y = fields.number("cut y")?;
        points.push((x, y));
    }

    if points.len() < 3 {
        return Err(ValidationError::DegenerateContour {
            line,
            reason: format!("cut outline has {} points, need at least 3", points.len()),
        });
    }

    Ok(SemanticBlock::Cut(CutOutline {
        face,
        depth,
        points,
        source_line: line,
    }))
}

fn classify_bend(fields: &mut Fields<'_, '_>, line: u32) -> Result<SemanticBlock, ValidationError> {
    let face = fields.face();
    if face.is_none() {
        return Err(ValidationError::MissingField {
            field: "bend face",
            line,
        });
    }

    let start = (fields.number("bend x1")?, fields.number("bend y1")?);
    let end = (fields.number("bend x2")?, fields.number("bend y2")?);
    let angle = fields.number("bend angle")?;

    Ok(SemanticBlock::Bend(BendLine {
        face,
        start,
        end,
        angle,
        source_line: line,
    }))
}

fn classify_punches(fields: &mut Fields<'_, '_>, line: u32) -> Result<SemanticBlock, ValidationError> {
    let face = fields.face();
    let mut points = Vec::new();

    while !fields.is_empty() {
        let x = fields.number("punch x")?;
        let y = fields.number("punch y")?;
        points.push((x, y));
    }

    if points.is_empty() {
        return Err(ValidationError::MissingField {
            field: "punch points",
            line,
        });
    }

    Ok(SemanticBlock::PunchMarks(PunchMarks {
        face,
        points,
        source_line: line,
    }))
}

/// Typed cursor over a block's field tokens
struct Fields<'a, 't> {
    tokens: &'t [Token<'a>],
    pos: usize,
    block_line: u32,
}

impl<'a, 't> Fields<'a, 't> {
    fn new(tokens: &'t [Token<'a>], block_line: u32) -> Self {
        Self {
            tokens,
            pos: 0,
            block_line,
        }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn line(&self) -> u32 {
        self.tokens
            .get(self.pos)
            .map(|t| t.line)
            .unwrap_or(self.block_line)
    }

    /// Next field as a number
    fn number(&mut self, field: &'static str) -> Result<f64, ValidationError> {
        let line = self.line();
        let token = self.tokens.get(self.pos).ok_or(ValidationError::MissingField {
            field,
            line,
        })?;
        match token.kind {
            TokenKind::Number(v) => {
                self.pos += 1;
                Ok(v)
            }
            _ => Err(ValidationError::BadFieldValue {
                field,
                line,
                reason: format!("expected number, found '{}'", token.text),
            }),
        }
    }

    /// Next field as a strictly positive number
    fn positive(&mut self, field: &'static str) -> Result<f64, ValidationError> {
        let line = self.line();
        let value = self.number(field)?;
        if value <= 0.0 {
            return Err(ValidationError::BadFieldValue {
                field,
                line,
                reason: format!("must be positive, found {value}"),
            });
        }
        Ok(value)
    }

    /// Next field as a number that must not be negative
    fn non_negative(&mut self, field: &'static str) -> Result<f64, ValidationError> {
        let line = self.line();
        let value = self.number(field)?;
        if value < 0.0 {
            return Err(ValidationError::BadFieldValue {
                field,
                line,
                reason: format!("must not be negative, found {value}"),
            });
        }
        Ok(value)
    }

    /// Next field as free text (identifiers and numbers both allowed; order
    /// and piece ids are frequently numeric)
    fn text(&mut self, field: &'static str) -> Result<String, ValidationError> {
        let line = self.line();
        let token = self.tokens.get(self.pos).ok_or(ValidationError::MissingField {
            field,
            line,
        })?;
        match token.kind {
            TokenKind::Ident(_) | TokenKind::Number(_) | TokenKind::Face(_) => {
                self.pos += 1;
                Ok(token.text.to_string())
            }
            _ => Err(ValidationError::BadFieldValue {
                field,
                line,
                reason: format!("expected text, found '{}'", token.text),
            }),
        }
    }

    /// Consume a face indicator if one is next
    fn face(&mut self) -> Option<FaceCode> {
        match self.tokens.get(self.pos)?.kind {
            TokenKind::Face(code) => {
                self.pos += 1;
                Some(code)
            }
            _ => None,
        }
    }

    /// Consume a shape modifier if one is next. Accepts both the attached
    /// form (`20.5l`, already split by the lexer) and a free-standing
    /// single-letter field.
    fn modifier(&mut self) -> Option<char> {
        let token = self.tokens.get(self.pos)?;
        let ch = match token.kind {
            TokenKind::Modifier(ch) => Some(ch),
            TokenKind::Ident(text) if text.len() == 1 => text.chars().next(),
            _ => None,
        }?;
        self.pos += 1;
        Some(ch)
    }

    fn peek_number(&self) -> bool {
        matches!(
            self.tokens.get(self.pos).map(|t| &t.kind),
            Some(TokenKind::Number(_))
        )
    }

    /// Join all remaining fields into one text value (marking strings may
    /// contain spaces and digits)
    fn remaining_text(&mut self) -> String {
        let mut parts = Vec::new();
        while let Some(token) = self.tokens.get(self.pos) {
            parts.push(token.text);
            self.pos += 1;
        }
        parts.join(" ")
    }
}
