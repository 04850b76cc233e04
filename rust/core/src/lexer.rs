// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! DSTV tokenizer
//!
//! Zero-copy tokenization of the line-oriented DSTV NC format. Lines are
//! located with SIMD-accelerated byte search ([memchr](https://docs.rs/memchr)),
//! individual fields are classified with [nom](https://docs.rs/nom) recognizers
//! and parsed with [lexical-core](https://docs.rs/lexical-core).
//!
//! The lexer is stateless: tokenizing the same input twice yields identical
//! token streams.

use nom::{
    character::complete::{char, digit1, one_of},
    combinator::{opt, recognize},
    sequence::{pair, tuple},
    IResult,
};

use crate::error::LexError;
use crate::face::FaceCode;

/// Kind and payload of a DSTV token
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind<'a> {
    /// Two-letter block code at column 0, e.g. `ST`, `BO`, `AK`
    BlockMarker(&'a str),
    /// Numeric field, including scientific notation (`1.23E+02`)
    Number(f64),
    /// Face indicator: single letter or compound `v…u` sequence
    Face(FaceCode),
    /// Single-letter shape modifier attached to the preceding number
    /// (e.g. trailing `l` marking an oblong hole)
    Modifier(char),
    /// Any other field (profile names, steel grades, marking text)
    Ident(&'a str),
    /// End of input
    Eof,
}

/// A single token with its source position
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    /// Raw lexeme (empty for `Eof`)
    pub text: &'a str,
    /// 1-based source line
    pub line: u32,
    /// 1-based byte column within the line
    pub column: u32,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind<'a>, text: &'a str, line: u32, column: u32) -> Self {
        Self {
            kind,
            text,
            line,
            column,
        }
    }

    /// Numeric value if this token is a number
    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self.kind {
            TokenKind::Number(v) => Some(v),
            _ => None,
        }
    }
}

/// Tokenize DSTV text. Fails on the first malformed token.
///
/// For block-scoped error recovery use [`tokenize_lenient`], which drops the
/// offending field and reports it instead of aborting.
pub fn tokenize(text: &str) -> Result<Vec<Token<'_>>, LexError> {
    let (tokens, mut errors) = tokenize_lenient(text);
    match errors.is_empty() {
        true => Ok(tokens),
        false => Err(errors.remove(0)),
    }
}

/// Tokenize DSTV text, collecting malformed-token errors instead of aborting.
///
/// Malformed fields produce no token; the surrounding fields keep their
/// positions so block boundaries stay intact.
pub fn tokenize_lenient(text: &str) -> (Vec<Token<'_>>, Vec<LexError>) {
    let bytes = text.as_bytes();
    let mut tokens = Vec::with_capacity(bytes.len() / 8);
    let mut errors = Vec::new();

    let mut line_no: u32 = 0;
    let mut line_start = 0usize;

    loop {
        line_no += 1;
        let line_end = memchr::memchr(b'\n', &bytes[line_start..])
            .map(|off| line_start + off)
            .unwrap_or(bytes.len());

        let mut line = &text[line_start..line_end];
        // Tolerate CRLF input (DSTV files come from Windows CAM stations)
        if line.ends_with('\r') {
            line = &line[..line.len() - 1];
        }

        lex_line(line, line_no, &mut tokens, &mut errors);

        if line_end >= bytes.len() {
            break;
        }
        line_start = line_end + 1;
    }

    tokens.push(Token::new(TokenKind::Eof, "", line_no + 1, 1));
    (tokens, errors)
}

/// Lex one physical line into tokens
fn lex_line<'a>(
    line: &'a str,
    line_no: u32,
    tokens: &mut Vec<Token<'a>>,
    errors: &mut Vec<LexError>,
) {
    // Strip `**` comments; they run to end of line and must not merge the
    // surrounding fields.
    let content = match memchr::memmem::find(line.as_bytes(), b"**") {
        Some(pos) => &line[..pos],
        None => line,
    };

    // A two-letter code at column 0 starts a new block. Field lines are
    // indented, so a marker never collides with field data.
    let mut rest = content;
    let mut offset = 0usize;
    if is_block_marker(content) {
        tokens.push(Token::new(
            TokenKind::BlockMarker(&content[..2]),
            &content[..2],
            line_no,
            1,
        ));
        rest = &content[2..];
        offset = 2;
    }

    // Remaining fields, separated by whitespace runs
    let mut cursor = 0usize;
    let rest_bytes = rest.as_bytes();
    while cursor < rest_bytes.len() {
        if rest_bytes[cursor].is_ascii_whitespace() {
            cursor += 1;
            continue;
        }
        let field_start = cursor;
        while cursor < rest_bytes.len() && !rest_bytes[cursor].is_ascii_whitespace() {
            cursor += 1;
        }
        let field = &rest[field_start..cursor];
        let column = (offset + field_start + 1) as u32;

        if let Err(err) = lex_field(field, line_no, column, tokens) {
            errors.push(err);
        }
    }
}

/// Marker lines start at column 0 with exactly two uppercase letters
fn is_block_marker(content: &str) -> bool {
    let bytes = content.as_bytes();
    bytes.len() >= 2
        && bytes[0].is_ascii_uppercase()
        && bytes[1].is_ascii_uppercase()
        && (bytes.len() == 2 || bytes[2].is_ascii_whitespace())
}

/// Recognize a numeric lexeme: `-35`, `35.5`, `1.23E+02`, `40.` (trailing dot
/// without decimals appears in the wild)
fn number_lexeme(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        opt(one_of("+-")),
        digit1,
        opt(pair(char('.'), opt(digit1))),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    )))(input)
}

/// Classify one whitespace-delimited field
fn lex_field<'a>(
    field: &'a str,
    line: u32,
    column: u32,
    tokens: &mut Vec<Token<'a>>,
) -> Result<(), LexError> {
    debug_assert!(!field.is_empty());

    // A stray comment half ('*' that is not '**') never forms a valid field
    if field.starts_with('*') {
        return Err(LexError::UnterminatedComment { line, column });
    }

    if field.as_bytes()[0].is_ascii_digit() || matches!(field.as_bytes()[0], b'+' | b'-') {
        return lex_numeric_field(field, line, column, tokens);
    }

    if let Some(code) = FaceCode::parse(field) {
        tokens.push(Token::new(TokenKind::Face(code), field, line, column));
        return Ok(());
    }

    if field.chars().any(|c| c.is_control()) {
        let ch = field.chars().find(|c| c.is_control()).unwrap_or('?');
        return Err(LexError::UnexpectedCharacter { line, column, ch });
    }

    tokens.push(Token::new(TokenKind::Ident(field), field, line, column));
    Ok(())
}

/// Lex a field that starts like a number. A single trailing letter is a
/// shape modifier bound to the number (`20.5l` = oblong hole marker);
/// anything else trailing is a malformed literal.
fn lex_numeric_field<'a>(
    field: &'a str,
    line: u32,
    column: u32,
    tokens: &mut Vec<Token<'a>>,
) -> Result<(), LexError> {
    let malformed = || LexError::MalformedNumber {
        line,
        column,
        text: field.to_string(),
    };

    let (remainder, lexeme) = number_lexeme(field).map_err(|_| malformed())?;

    let modifier = match remainder.len() {
        0 => None,
        1 => {
            let ch = remainder.chars().next().unwrap_or('?');
            if ch.is_ascii_lowercase() {
                Some(ch)
            } else {
                return Err(malformed());
            }
        }
        _ => return Err(malformed()),
    };

    let value: f64 = parse_float(lexeme).ok_or_else(malformed)?;
    tokens.push(Token::new(TokenKind::Number(value), lexeme, line, column));

    if let Some(ch) = modifier {
        let mod_column = column + lexeme.len() as u32;
        tokens.push(Token::new(
            TokenKind::Modifier(ch),
            &field[lexeme.len()..],
            line,
            mod_column,
        ));
    }
    Ok(())
}

/// Parse a numeric lexeme with lexical-core, tolerating the DSTV trailing-dot
/// form (`40.`) that strict float grammars reject
#[inline]
fn parse_float(lexeme: &str) -> Option<f64> {
    let bytes = lexeme.as_bytes();
    match lexical_core::parse::<f64>(bytes) {
        Ok(v) => Some(v),
        Err(_) => {
            let trimmed = lexeme.strip_suffix('.')?;
            lexical_core::parse::<f64>(trimmed.as_bytes()).ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::{FaceCode, SubFace};

    fn kinds(text: &str) -> Vec<TokenKind<'_>> {
        tokenize(text).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn block_marker_then_fields() {
        let toks = tokenize("BO\n  v  100.00  50.00  20.00\n").unwrap();
        assert_eq!(toks[0].kind, TokenKind::BlockMarker("BO"));
        assert_eq!(toks[0].line, 1);
        assert_eq!(toks[1].kind, TokenKind::Face(FaceCode::Single(SubFace::Web)));
        assert_eq!(toks[2].kind, TokenKind::Number(100.0));
        assert_eq!(toks[2].column, 6);
        assert_eq!(toks[4].kind, TokenKind::Number(20.0));
        assert_eq!(toks[5].kind, TokenKind::Eof);
    }

    #[test]
    fn scientific_notation() {
        assert_eq!(
            kinds("  1.23E+02 5e3 -2.5E-01\n"),
            vec![
                TokenKind::Number(123.0),
                TokenKind::Number(5000.0),
                TokenKind::Number(-0.25),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn oblong_modifier_binds_to_number() {
        assert_eq!(
            kinds("  20.50l 60 30\n"),
            vec![
                TokenKind::Number(20.5),
                TokenKind::Modifier('l'),
                TokenKind::Number(60.0),
                TokenKind::Number(30.0),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn compound_face_notation() {
        assert_eq!(
            kinds("  vou 10 20\n"),
            vec![
                TokenKind::Face(FaceCode::Compound(SubFace::Web, SubFace::TopFlange)),
                TokenKind::Number(10.0),
                TokenKind::Number(20.0),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn comments_do_not_merge_fields() {
        assert_eq!(
            kinds("  100 ** trailing comment 5.0\n  200\n"),
            vec![TokenKind::Number(100.0), TokenKind::Number(200.0), TokenKind::Eof]
        );
    }

    #[test]
    fn malformed_number_is_an_error() {
        let err = tokenize("  1.2E+\n").unwrap_err();
        assert!(matches!(err, LexError::MalformedNumber { line: 1, .. }));
    }

    #[test]
    fn stray_comment_half_is_an_error() {
        let err = tokenize("  100 * 50\n").unwrap_err();
        assert!(matches!(err, LexError::UnterminatedComment { line: 1, .. }));
    }

    #[test]
    fn lenient_mode_drops_only_the_bad_field() {
        let (toks, errs) = tokenize_lenient("  100 1.2.3.4e 200\n");
        assert_eq!(errs.len(), 1);
        let numbers: Vec<f64> = toks.iter().filter_map(|t| t.as_number()).collect();
        assert_eq!(numbers, vec![100.0, 200.0]);
    }

    #[test]
    fn tokenizing_twice_is_deterministic() {
        let text = "ST\n  IPE200\nBO\n  v 100.00 50.00 20.00l 60 30\nEN\n";
        assert_eq!(tokenize(text).unwrap(), tokenize(text).unwrap());
    }

    #[test]
    fn trailing_dot_number() {
        assert_eq!(kinds("  40.\n"), vec![TokenKind::Number(40.0), TokenKind::Eof]);
    }

    #[test]
    fn idents_for_names_and_grades() {
        assert_eq!(
            kinds("  IPE200 S235JR\n"),
            vec![TokenKind::Ident("IPE200"), TokenKind::Ident("S235JR"), TokenKind::Eof]
        );
    }
}
