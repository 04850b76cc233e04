// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error taxonomy for the DSTV import pipeline.
//!
//! Errors are scoped to the stage that produced them: [`LexError`] for malformed
//! tokens, [`SyntaxError`] for malformed block grammar, [`ValidationError`] for
//! semantic violations. Soft failures travel as [`Diagnostic`] records instead
//! of aborting the import.

use crate::syntax::BlockCode;
use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Umbrella error for the core parsing stages
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Malformed token in the raw text
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    #[error("malformed numeric literal '{text}' at line {line}, column {column}")]
    MalformedNumber {
        line: u32,
        column: u32,
        text: String,
    },

    #[error("unterminated comment marker at line {line}, column {column}")]
    UnterminatedComment { line: u32, column: u32 },

    #[error("unexpected character '{ch}' at line {line}, column {column}")]
    UnexpectedCharacter { line: u32, column: u32, ch: char },
}

impl LexError {
    /// Source line the error occurred on
    pub fn line(&self) -> u32 {
        match self {
            LexError::MalformedNumber { line, .. }
            | LexError::UnterminatedComment { line, .. }
            | LexError::UnexpectedCharacter { line, .. } => *line,
        }
    }
}

/// Malformed block grammar
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyntaxError {
    #[error(
        "block {code} at line {line} has {count} fields, expected at least {min}{}",
        max.map(|m| format!(" and at most {m}")).unwrap_or_default()
    )]
    FieldCount {
        code: BlockCode,
        line: u32,
        count: usize,
        min: usize,
        max: Option<usize>,
    },

    #[error("field data at line {line} precedes the first block marker")]
    FieldsBeforeBlock { line: u32 },

    #[error("file contains no blocks")]
    EmptyFile,
}

impl SyntaxError {
    /// Source line the error occurred on
    pub fn line(&self) -> u32 {
        match self {
            SyntaxError::FieldCount { line, .. } | SyntaxError::FieldsBeforeBlock { line } => *line,
            SyntaxError::EmptyFile => 0,
        }
    }
}

/// Semantic violation that makes a block (or the whole file) unusable
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("no ST profile header precedes the first feature block")]
    MissingProfileHeader,

    #[error("face '{face}' at line {line} does not exist on profile class {class}")]
    FaceNotOnProfile {
        face: String,
        class: String,
        line: u32,
    },

    #[error("block at line {line} is missing field '{field}'")]
    MissingField { field: &'static str, line: u32 },

    #[error("field '{field}' at line {line} has invalid value: {reason}")]
    BadFieldValue {
        field: &'static str,
        line: u32,
        reason: String,
    },

    #[error("contour at line {line} is degenerate: {reason}")]
    DegenerateContour { line: u32, reason: String },
}

/// Pipeline stage a diagnostic originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Stage {
    Lex,
    Syntax,
    Classify,
    Normalize,
    Scene,
    Process,
}

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    Warning,
    Error,
}

/// A soft failure surfaced to the caller without aborting the import.
///
/// Every skipped block and every feature that could not be applied produces
/// exactly one diagnostic; features are never dropped silently.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    pub severity: Severity,
    pub stage: Stage,
    /// Source line, when the diagnostic maps to one
    pub line: Option<u32>,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        match self.line {
            Some(line) => write!(f, "{severity}: line {line}: {}", self.message),
            None => write!(f, "{severity}: {}", self.message),
        }
    }
}

impl Diagnostic {
    pub fn warning(stage: Stage, line: Option<u32>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            stage,
            line,
            message: message.into(),
        }
    }

    pub fn error(stage: Stage, line: Option<u32>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            stage,
            line,
            message: message.into(),
        }
    }
}
