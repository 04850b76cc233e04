// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end import tests over complete NC file texts

use dstv_pivot_core::{FeatureKind, HoleShape, Severity};
use dstv_pivot_geometry::{
    import, import_with_registry, CsgrsKernel, Error, ImportOptions, ProcessorRegistry,
    ValidationLevel,
};

const HEA240: &str = "ST\n  PRJ-7 D-100 1 B-12 S355J2 4 HEA240 I\n  2000 230 240 12 7.5 21 60.3 1.37\n";

const PLATE: &str =
    "ST\n  PRJ-7 D-100 1 P-3 S235JR 1 FL200x10 B\n  1000 200 0 0 10 0 15.7 0.41\n";

#[test]
fn header_only_file_builds_the_bare_member() {
    let text = format!("{HEA240}EN\n");
    let result = import(&text, &ImportOptions::default()).unwrap();

    assert_eq!(result.scene.len(), 1);
    assert!(result.diagnostics.is_empty());

    let element = &result.scene.elements[0];
    assert_eq!(element.header.piece, "B-12");
    assert_eq!(element.material.grade, "S355J2");

    // Body spans exactly the declared envelope
    let bounds = element.bounds();
    assert!((bounds.max[0] - 2000.0).abs() < 1e-6);
    assert!((bounds.max[1] - 230.0).abs() < 1e-6);
    assert!((bounds.max[2] - 120.0).abs() < 1e-6);
    assert!((bounds.min[2] + 120.0).abs() < 1e-6);
    assert!(element.geometry.applied.is_empty());
}

#[test]
fn web_hole_is_drilled_with_provenance() {
    let bare = import(&format!("{HEA240}EN\n"), &ImportOptions::default()).unwrap();
    let text = format!("{HEA240}BO\n  v 500 100 22\nEN\n");
    let result = import(&text, &ImportOptions::default()).unwrap();

    let element = &result.scene.elements[0];
    assert_ne!(
        element.geometry.mesh,
        bare.scene.elements[0].geometry.mesh
    );

    let record = &element.geometry.applied[0];
    assert_eq!(record.kind, FeatureKind::Hole);
    assert_eq!(record.feature_id, element.features[0].id);
    // Tool bounds straddle the hole position in member coordinates
    assert!(record.bounds.min[0] < 500.0 && record.bounds.max[0] > 500.0);
    assert!(record.bounds.min[1] < 100.0 && record.bounds.max[1] > 100.0);
}

#[test]
fn oblong_modifier_produces_a_slot() {
    let text = format!("{HEA240}BO\n  v 500 100 10l 40 10 30\nEN\n");
    let result = import(&text, &ImportOptions::default()).unwrap();

    let feature = &result.scene.elements[0].features[0];
    assert_eq!(
        feature.shape,
        Some(HoleShape::Oblong {
            width: 10.0,
            length: 40.0,
            angle: 30.0
        })
    );
    assert_eq!(result.scene.elements[0].geometry.applied.len(), 1);
}

#[test]
fn compound_face_hole_goes_through_the_whole_section() {
    let text = format!("{HEA240}BO\n  vou 500 100 22\nEN\n");
    let result = import(&text, &ImportOptions::default()).unwrap();

    let record = &result.scene.elements[0].geometry.applied[0];
    // The tool spans the full 240mm profile width, not just the 7.5mm web
    let z_span = record.bounds.max[2] - record.bounds.min[2];
    assert!(z_span > 240.0, "tool z span was {z_span}");
}

#[test]
fn unhandled_feature_surfaces_as_a_diagnostic_when_lenient() {
    let text = format!("{HEA240}BO\n  v 500 100 22\nEN\n");
    let empty = ProcessorRegistry::new();
    let result = import_with_registry(
        &text,
        &ImportOptions::default(),
        &empty,
        &CsgrsKernel::new(),
    )
    .unwrap();

    // Element exists, hole was not applied, and the miss is loud
    assert_eq!(result.scene.len(), 1);
    assert!(result.scene.elements[0].geometry.applied.is_empty());
    let diag = result
        .diagnostics
        .iter()
        .find(|d| d.severity == Severity::Error)
        .expect("expected an error diagnostic");
    assert!(diag.message.contains("No processor"));
}

#[test]
fn unhandled_feature_fails_a_strict_import() {
    let text = format!("{HEA240}BO\n  v 500 100 22\nEN\n");
    let empty = ProcessorRegistry::new();
    let err = import_with_registry(
        &text,
        &ImportOptions {
            validation: ValidationLevel::Strict,
            ..Default::default()
        },
        &empty,
        &CsgrsKernel::new(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::NoProcessorFound { .. }));
}

#[test]
fn overlapping_end_relative_cuts_depend_on_order() {
    // Cut A trims the last 200mm of the plate; cut B notches a 100mm wide,
    // half-width pocket measured from the member end. Both use end-relative
    // x, which resolves against whatever material is left when the cut runs.
    let cut_a = "SC\n  v 0 -200 -1 1200 -1 1200 201 -200 201\n";
    let cut_b = "SC\n  v 0 -150 -1 -50 -1 -50 100 -150 100\n";

    let ab = import(
        &format!("{PLATE}{cut_a}{cut_b}EN\n"),
        &ImportOptions::default(),
    )
    .unwrap();
    let ba = import(
        &format!("{PLATE}{cut_b}{cut_a}EN\n"),
        &ImportOptions::default(),
    )
    .unwrap();

    let elem_ab = &ab.scene.elements[0];
    let elem_ba = &ba.scene.elements[0];

    // Both orders trim the member to 800mm
    assert!((elem_ab.bounds().max[0] - 800.0).abs() < 1e-6);
    assert!((elem_ba.bounds().max[0] - 800.0).abs() < 1e-6);

    // A-then-B: the notch lands at 650..750 in what is left.
    // B-then-A: the notch lands at 850..950 and the trim then removes it.
    let notch_ab = &elem_ab.geometry.applied[1];
    let notch_ba = &elem_ba.geometry.applied[0];
    assert!((notch_ab.bounds.min[0] - 650.0).abs() < 1e-6);
    assert!((notch_ba.bounds.min[0] - 850.0).abs() < 1e-6);

    assert_ne!(elem_ab.geometry.mesh, elem_ba.geometry.mesh);
}

#[test]
fn blind_hole_deeper_than_the_wall_is_diagnosed() {
    // 7.5mm web, 20mm programmed depth
    let text = format!("{HEA240}BO\n  v 500 100 22 20\nEN\n");
    let result = import(&text, &ImportOptions::default()).unwrap();

    assert!(result.scene.elements[0].geometry.applied.is_empty());
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.severity == Severity::Error && d.message.contains("exceeds")));
}

#[test]
fn repeated_imports_are_deterministic() {
    let text = format!(
        "{HEA240}AK\n  v 0 0 0 1800 0 0 1800 230 0 0 230 0\nBO\n  v 500 100 22\nSI\n  o 300 120 0 10 B-12\nEN\n"
    );
    let first = import(&text, &ImportOptions::default()).unwrap();
    let second = import(&text, &ImportOptions::default()).unwrap();

    let a = &first.scene.elements[0];
    let b = &second.scene.elements[0];
    assert_eq!(a.geometry.mesh, b.geometry.mesh);
    assert_eq!(a.geometry.applied, b.geometry.applied);
    assert_eq!(first.diagnostics, second.diagnostics);
}

#[test]
fn marking_is_recorded_but_cuts_nothing() {
    let bare = import(&format!("{HEA240}EN\n"), &ImportOptions::default()).unwrap();
    let text = format!("{HEA240}SI\n  o 300 120 0 10 B-12\nEN\n");
    let result = import(&text, &ImportOptions::default()).unwrap();

    let element = &result.scene.elements[0];
    assert_eq!(element.geometry.mesh, bare.scene.elements[0].geometry.mesh);
    assert_eq!(element.geometry.applied.len(), 1);
    assert_eq!(element.geometry.applied[0].kind, FeatureKind::Marking);
    assert_eq!(element.features[0].text.as_deref(), Some("B-12"));
}

#[test]
fn comments_and_vendor_blocks_do_not_derail_an_import() {
    let text = format!(
        "** fabricator export v2.1\n{HEA240}UE\n  proprietary payload 1 2 3\nBO\n  v 500 100 22 ** web hole\nEN\n"
    );
    let result = import(&text, &ImportOptions::default()).unwrap();

    assert_eq!(result.scene.len(), 1);
    assert_eq!(result.scene.elements[0].geometry.applied.len(), 1);
    // Vendor block is surfaced, not silently eaten
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.message.contains("vendor")));
}
