// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D boolean operations for contour features
//!
//! An outer contour (AK) redraws the member silhouette. The waste it leaves
//! behind is computed here in 2D, where the overlay is cheap and robust, and
//! the resulting regions are extruded into tools for the solid kernel. The
//! outline validity checks for cut and contour processing also live here.

use crate::error::{Error, Result};
use crate::profile::Profile2D;
use crate::triangulation::signed_area;
use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use nalgebra::Point2;

/// Polygons below this area are treated as degenerate
const MIN_AREA_THRESHOLD: f64 = 1e-10;

/// Subtract a contour from a region and keep every resulting piece.
///
/// Does not collapse to the largest shape, so a silhouette complement that
/// falls apart into disjoint waste regions comes back whole.
pub fn difference_all(region: &Profile2D, contour: &[Point2<f64>]) -> Result<Vec<Profile2D>> {
    if region.outer.len() < 3 {
        return Err(Error::InvalidSection(
            "region must have at least 3 vertices".to_string(),
        ));
    }
    if contour.len() < 3 {
        return Ok(vec![region.clone()]);
    }

    let subject = profile_to_paths(region);
    let clip = vec![contour_to_path(contour)];

    let result = subject.overlay(&clip, OverlayRule::Difference, FillRule::EvenOdd);

    let mut pieces = Vec::with_capacity(result.len());
    for shape in &result {
        if shape.is_empty() {
            continue;
        }
        let outer = ensure_ccw(&path_to_contour(&shape[0]));
        if !is_valid_contour(&outer) {
            continue;
        }
        let mut holes = Vec::new();
        for path in shape.iter().skip(1) {
            let hole = path_to_contour(path);
            if is_valid_contour(&hole) {
                holes.push(ensure_cw(&hole));
            }
        }
        pieces.push(Profile2D { outer, holes });
    }
    Ok(pieces)
}

/// True when the contour has enough area to matter
pub fn is_valid_contour(contour: &[Point2<f64>]) -> bool {
    contour.len() >= 3 && signed_area(contour).abs() > MIN_AREA_THRESHOLD
}

/// Force counter-clockwise winding
pub fn ensure_ccw(contour: &[Point2<f64>]) -> Vec<Point2<f64>> {
    if signed_area(contour) < 0.0 {
        contour.iter().rev().copied().collect()
    } else {
        contour.to_vec()
    }
}

/// Force clockwise winding (hole convention)
pub fn ensure_cw(contour: &[Point2<f64>]) -> Vec<Point2<f64>> {
    if signed_area(contour) > 0.0 {
        contour.iter().rev().copied().collect()
    } else {
        contour.to_vec()
    }
}

/// Check whether any two non-adjacent edges of a closed outline cross.
///
/// O(n^2) segment test; contour outlines are small so this is fine.
pub fn outline_self_intersects(outline: &[Point2<f64>]) -> bool {
    let n = outline.len();
    if n < 4 {
        return false;
    }

    for i in 0..n {
        let a0 = &outline[i];
        let a1 = &outline[(i + 1) % n];
        for j in i + 1..n {
            // Skip adjacent edges, they share an endpoint
            if j == i || (j + 1) % n == i || (i + 1) % n == j {
                continue;
            }
            let b0 = &outline[j];
            let b1 = &outline[(j + 1) % n];
            if segments_cross(a0, a1, b0, b1) {
                return true;
            }
        }
    }
    false
}

fn segments_cross(
    a0: &Point2<f64>,
    a1: &Point2<f64>,
    b0: &Point2<f64>,
    b1: &Point2<f64>,
) -> bool {
    let d1 = cross(b0, b1, a0);
    let d2 = cross(b0, b1, a1);
    let d3 = cross(a0, a1, b0);
    let d4 = cross(a0, a1, b1);

    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

#[inline]
fn cross(o: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

fn profile_to_paths(profile: &Profile2D) -> Vec<Vec<[f64; 2]>> {
    let mut paths = Vec::with_capacity(1 + profile.holes.len());
    paths.push(contour_to_path(&ensure_ccw(&profile.outer)));
    for hole in &profile.holes {
        paths.push(contour_to_path(&ensure_cw(hole)));
    }
    paths
}

fn contour_to_path(contour: &[Point2<f64>]) -> Vec<[f64; 2]> {
    contour.iter().map(|p| [p.x, p.y]).collect()
}

fn path_to_contour(path: &[[f64; 2]]) -> Vec<Point2<f64>> {
    path.iter().map(|p| Point2::new(p[0], p[1])).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2<f64>> {
        vec![
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ]
    }

    #[test]
    fn difference_all_keeps_disjoint_pieces() {
        let region = Profile2D::new(square(0.0, 0.0, 10.0, 10.0));
        // Vertical band through the middle splits the region in two
        let band = square(4.0, -1.0, 6.0, 11.0);
        let pieces = difference_all(&region, &band).unwrap();
        assert_eq!(pieces.len(), 2);
    }

    #[test]
    fn interior_contour_stays_a_single_piece_with_a_hole() {
        let region = Profile2D::new(square(0.0, 0.0, 10.0, 10.0));
        let pieces = difference_all(&region, &square(4.0, 4.0, 6.0, 6.0)).unwrap();
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0].holes.len(), 1);
    }

    #[test]
    fn bowtie_self_intersects() {
        let bowtie = vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(10.0, 0.0),
            Point2::new(0.0, 10.0),
        ];
        assert!(outline_self_intersects(&bowtie));
        assert!(!outline_self_intersects(&square(0.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn degenerate_contour_detected() {
        let line = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
        ];
        assert!(!is_valid_contour(&line));
    }
}
