// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Machinable faces of a structural profile.
//!
//! DSTV addresses faces with single letters (`v` web, `o` top flange, `u`
//! bottom flange, `h` behind) or a compound three-letter sequence ending in a
//! literal `u` (`vou` = feature spanning web and top flange). After
//! normalization a feature's face is always a concrete [`Face`] value; raw
//! letters never survive past the normalize stage.

use std::fmt;

/// A concrete machinable face after normalization. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Face {
    /// Web plane (`v`). Also the single face of flat plates.
    Web,
    /// Top flange (`o`)
    TopFlange,
    /// Bottom flange (`u`)
    BottomFlange,
    /// Rear web plane (`h`)
    Behind,
    /// Front reference plane (profile start)
    Front,
    /// Feature spanning two faces (compound `v…u` notation)
    Span(SubFace, SubFace),
}

/// A face that can participate in a compound span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SubFace {
    Web,
    TopFlange,
    BottomFlange,
    Behind,
}

impl From<SubFace> for Face {
    fn from(sub: SubFace) -> Self {
        match sub {
            SubFace::Web => Face::Web,
            SubFace::TopFlange => Face::TopFlange,
            SubFace::BottomFlange => Face::BottomFlange,
            SubFace::Behind => Face::Behind,
        }
    }
}

/// Default face applied by normalization when a block carries no face
/// indicator. This is the only defaulting constant in the pipeline; callers
/// can override it per import via the options.
pub const DEFAULT_FACE: Face = Face::Web;

/// Raw face indicator as lexed, prior to resolution against a profile's face
/// table. `None` means the block carried no indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FaceCode {
    Single(SubFace),
    /// Compound `<a><b>u` notation: feature spans faces `a` and `b`
    Compound(SubFace, SubFace),
}

impl FaceCode {
    /// Parse a lexeme as a face indicator. Returns `None` when the lexeme is
    /// not face notation (and should lex as an identifier instead).
    pub fn parse(lexeme: &str) -> Option<FaceCode> {
        let bytes = lexeme.as_bytes();
        match bytes.len() {
            1 => sub_face(bytes[0]).map(FaceCode::Single),
            // Compound notation: two face letters joined by the trailing span
            // marker 'u', e.g. "vou".
            3 if bytes[2] == b'u' => {
                let a = sub_face(bytes[0])?;
                let b = sub_face(bytes[1])?;
                if a == b {
                    return None;
                }
                Some(FaceCode::Compound(a, b))
            }
            _ => None,
        }
    }

    /// Faces referenced by this indicator
    pub fn sub_faces(&self) -> (SubFace, Option<SubFace>) {
        match *self {
            FaceCode::Single(a) => (a, None),
            FaceCode::Compound(a, b) => (a, Some(b)),
        }
    }
}

fn sub_face(letter: u8) -> Option<SubFace> {
    match letter {
        b'v' => Some(SubFace::Web),
        b'o' => Some(SubFace::TopFlange),
        b'u' => Some(SubFace::BottomFlange),
        b'h' => Some(SubFace::Behind),
        _ => None,
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Face::Web => write!(f, "web"),
            Face::TopFlange => write!(f, "top-flange"),
            Face::BottomFlange => write!(f, "bottom-flange"),
            Face::Behind => write!(f, "behind"),
            Face::Front => write!(f, "front"),
            Face::Span(a, b) => write!(f, "{}+{}", Face::from(*a), Face::from(*b)),
        }
    }
}

impl fmt::Display for FaceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaceCode::Single(a) => write!(f, "{}", letter(*a)),
            FaceCode::Compound(a, b) => write!(f, "{}{}u", letter(*a), letter(*b)),
        }
    }
}

fn letter(sub: SubFace) -> char {
    match sub {
        SubFace::Web => 'v',
        SubFace::TopFlange => 'o',
        SubFace::BottomFlange => 'u',
        SubFace::Behind => 'h',
    }
}
