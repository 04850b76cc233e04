// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Import pipeline
//!
//! End-to-end path from NC file text to a [`PivotScene`]: lex, block split,
//! classify, normalize, then scene building and feature processing. One file
//! describes one member; [`import_many`] runs files in parallel and merges
//! the elements back in input order, so the resulting scene is deterministic
//! regardless of scheduling.
//!
//! Lenient imports turn recoverable failures into [`Diagnostic`] records and
//! return whatever scene could be built. A missing profile header is fatal
//! in both modes.

use crate::builder::{build_element, BuildOptions};
use crate::csg::{BooleanKernel, CsgrsKernel};
use crate::error::{Error, Result};
use crate::registry::ProcessorRegistry;
use crate::scene::PivotScene;
use dstv_pivot_core::{
    classify, normalize, parse_blocks, parse_blocks_lenient, tokenize, tokenize_lenient,
    Diagnostic, Face, NormalizeOptions, Stage, DEFAULT_FACE,
};
use rayon::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span};

/// How hard to push back on malformed input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationLevel {
    /// First error aborts the import
    Strict,
    /// Recoverable errors become diagnostics; the scene may be partial
    #[default]
    Lenient,
}

/// Import policy knobs
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub validation: ValidationLevel,
    /// Face applied to blocks without an indicator
    pub default_face: Face,
    /// Cooperative cancellation, checked between stages and features
    pub cancel: CancellationToken,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            validation: ValidationLevel::Lenient,
            default_face: DEFAULT_FACE,
            cancel: CancellationToken::new(),
        }
    }
}

/// Import result: the scene plus every soft failure along the way
#[derive(Debug)]
pub struct Import {
    pub scene: PivotScene,
    pub diagnostics: Vec<Diagnostic>,
}

/// Import a single NC file with the default processors and kernel
pub fn import(text: &str, options: &ImportOptions) -> Result<Import> {
    import_with_registry(
        text,
        options,
        &ProcessorRegistry::with_defaults(),
        &CsgrsKernel::new(),
    )
}

/// Import a single NC file through a caller-supplied registry and kernel
pub fn import_with_registry(
    text: &str,
    options: &ImportOptions,
    registry: &ProcessorRegistry,
    kernel: &dyn BooleanKernel,
) -> Result<Import> {
    let mut diagnostics = Vec::new();
    let built = import_one(text, options, registry, kernel, &mut diagnostics)?;

    let mut scene = PivotScene::new();
    scene.push(built);

    info!(
        elements = scene.len(),
        diagnostics = diagnostics.len(),
        "import finished"
    );
    Ok(Import { scene, diagnostics })
}

/// Import several NC files into one scene.
///
/// Files are parsed and processed in parallel; elements land in the scene in
/// input order. In lenient mode a file that fails fatally is skipped with an
/// error diagnostic instead of sinking the whole import.
pub fn import_many(texts: &[&str], options: &ImportOptions) -> Result<Import> {
    import_many_with_registry(
        texts,
        options,
        &ProcessorRegistry::with_defaults(),
        &CsgrsKernel::new(),
    )
}

pub fn import_many_with_registry(
    texts: &[&str],
    options: &ImportOptions,
    registry: &ProcessorRegistry,
    kernel: &dyn BooleanKernel,
) -> Result<Import> {
    let results: Vec<_> = texts
        .par_iter()
        .enumerate()
        .map(|(index, text)| {
            let mut diagnostics = Vec::new();
            let result = import_one(text, options, registry, kernel, &mut diagnostics);
            (index, result, diagnostics)
        })
        .collect();

    let mut scene = PivotScene::new();
    let mut diagnostics = Vec::new();

    // Sequential merge keeps element order and diagnostics deterministic
    for (index, result, file_diags) in results {
        diagnostics.extend(file_diags);
        match result {
            Ok(element) => scene.push(element),
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(err) if options.validation == ValidationLevel::Strict => return Err(err),
            Err(err) => {
                diagnostics.push(Diagnostic::error(
                    Stage::Scene,
                    None,
                    format!("file {index} skipped: {err}"),
                ));
            }
        }
    }

    info!(
        files = texts.len(),
        elements = scene.len(),
        diagnostics = diagnostics.len(),
        "import finished"
    );
    Ok(Import { scene, diagnostics })
}

/// Run the full pipeline for one file
fn import_one(
    text: &str,
    options: &ImportOptions,
    registry: &ProcessorRegistry,
    kernel: &dyn BooleanKernel,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<crate::scene::PivotElement> {
    let span = info_span!("import_file");
    let _guard = span.enter();

    if options.cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let strict = options.validation == ValidationLevel::Strict;

    let tokens = if strict {
        tokenize(text).map_err(dstv_pivot_core::Error::from)?
    } else {
        let (tokens, errors) = tokenize_lenient(text);
        for err in errors {
            // Malformed tokens poison their line, not the file
            diagnostics.push(Diagnostic::warning(
                Stage::Lex,
                Some(err.line()),
                err.to_string(),
            ));
        }
        tokens
    };

    if options.cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let blocks = if strict {
        parse_blocks(&tokens).map_err(dstv_pivot_core::Error::from)?
    } else {
        let (blocks, errors) = parse_blocks_lenient(&tokens);
        for err in errors {
            diagnostics.push(Diagnostic::warning(
                Stage::Syntax,
                Some(err.line()),
                err.to_string(),
            ));
        }
        blocks
    };

    // Missing header stays fatal in both modes
    let classified = classify(&blocks).map_err(dstv_pivot_core::Error::from)?;
    diagnostics.extend(classified.diagnostics.iter().cloned());

    let normalized = normalize(
        &classified.blocks,
        &NormalizeOptions {
            default_face: options.default_face,
        },
    )
    .map_err(dstv_pivot_core::Error::from)?;
    diagnostics.extend(normalized.diagnostics.iter().cloned());

    let built = build_element(
        &normalized,
        registry,
        kernel,
        &BuildOptions {
            strict,
            cancel: options.cancel.clone(),
        },
    )?;
    diagnostics.extend(built.diagnostics);

    Ok(built.element)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "ST\n  PRJ-7 D-100 1 B-12 S355J2 4 HEA240 I\n  2000 230 240 12 7.5 21 60.3 1.37\n";

    #[test]
    fn lenient_import_survives_a_bad_line() {
        let text = format!("{HEADER}BO\n  v 500 1x0 22\nBO\n  v 800 100 22\nEN\n");
        let import = import(&text, &ImportOptions::default()).unwrap();
        assert_eq!(import.scene.len(), 1);
        // The malformed row is diagnosed, the good one applied
        assert!(!import.diagnostics.is_empty());
    }

    #[test]
    fn strict_import_fails_on_a_bad_line() {
        let text = format!("{HEADER}BO\n  v 500 1x0 22\nEN\n");
        let err = import(
            &text,
            &ImportOptions {
                validation: ValidationLevel::Strict,
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::CoreError(_)));
    }

    #[test]
    fn missing_header_is_fatal_even_when_lenient() {
        let text = "BO\n  v 500 100 22\nEN\n";
        assert!(import(text, &ImportOptions::default()).is_err());
    }

    #[test]
    fn cancelled_import_returns_cancelled() {
        let options = ImportOptions::default();
        options.cancel.cancel();
        let text = format!("{HEADER}EN\n");
        assert!(matches!(
            import(&text, &options).unwrap_err(),
            Error::Cancelled
        ));
    }

    #[test]
    fn multi_file_import_keeps_input_order() {
        let a = format!("{HEADER}EN\n");
        let b = a.replace("B-12", "B-13");
        let import = import_many(&[&a, &b], &ImportOptions::default()).unwrap();
        assert_eq!(import.scene.len(), 2);
        assert_eq!(import.scene.elements[0].header.piece, "B-12");
        assert_eq!(import.scene.elements[1].header.piece, "B-13");
    }
}
