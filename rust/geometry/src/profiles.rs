// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parametric steel cross-sections
//!
//! Builds the 2D cross-section outline for each DSTV profile class from the
//! ST header dimensions. Section frame: x runs across the profile width
//! (centered on the web axis), y from the bottom fibre to the profile depth.
//! Root/toe radii are not modelled in the outline; the notch radius of
//! contours handles the cases fabrication cares about.

use crate::error::{Error, Result};
use crate::profile::Profile2D;
use dstv_pivot_core::{ProfileClass, SectionDims};
use nalgebra::Point2;
use std::f64::consts::TAU;

/// Segment count for circular sections and drilled holes
pub const CIRCLE_SEGMENTS: usize = 32;

/// Cross-section outline builder
pub struct SectionBuilder;

impl SectionBuilder {
    /// Build the cross-section outline for a profile class
    pub fn build(class: ProfileClass, dims: &SectionDims) -> Result<Profile2D> {
        match class {
            ProfileClass::I => i_section(dims),
            ProfileClass::U | ProfileClass::C => channel_section(dims),
            ProfileClass::L => angle_section(dims),
            ProfileClass::T => tee_section(dims),
            ProfileClass::Plate => plate_section(dims),
            ProfileClass::RoundBar => round_section(dims, false),
            ProfileClass::RoundTube => round_section(dims, true),
            ProfileClass::RectTube => rect_tube_section(dims),
        }
    }
}

fn require(value: f64, what: &str) -> Result<f64> {
    if value > 0.0 && value.is_finite() {
        return Ok(value);
    }
    Err(Error::InvalidSection(format!(
        "{what} must be positive, got {value}"
    )))
}

/// I / H section, counter-clockwise from the bottom-left flange tip
fn i_section(dims: &SectionDims) -> Result<Profile2D> {
    let depth = require(dims.depth, "depth")?;
    let width = require(dims.flange_width, "flange width")?;
    let tf = require(dims.flange_thickness, "flange thickness")?;
    let tw = require(dims.web_thickness, "web thickness")?;
    if 2.0 * tf >= depth {
        return Err(Error::InvalidSection(
            "flanges thicker than profile depth".to_string(),
        ));
    }

    let hw = width / 2.0;
    let hweb = tw / 2.0;

    Ok(Profile2D::new(vec![
        // Bottom flange
        Point2::new(-hw, 0.0),
        Point2::new(hw, 0.0),
        Point2::new(hw, tf),
        // Right web side
        Point2::new(hweb, tf),
        Point2::new(hweb, depth - tf),
        // Top flange
        Point2::new(hw, depth - tf),
        Point2::new(hw, depth),
        Point2::new(-hw, depth),
        Point2::new(-hw, depth - tf),
        // Left web side
        Point2::new(-hweb, depth - tf),
        Point2::new(-hweb, tf),
        Point2::new(-hw, tf),
    ]))
}

/// U / C channel, web on the left
fn channel_section(dims: &SectionDims) -> Result<Profile2D> {
    let depth = require(dims.depth, "depth")?;
    let width = require(dims.flange_width, "flange width")?;
    let tf = require(dims.flange_thickness, "flange thickness")?;
    let tw = require(dims.web_thickness, "web thickness")?;

    let hw = width / 2.0;

    Ok(Profile2D::new(vec![
        Point2::new(-hw, 0.0),
        Point2::new(hw, 0.0),
        Point2::new(hw, tf),
        Point2::new(-hw + tw, tf),
        Point2::new(-hw + tw, depth - tf),
        Point2::new(hw, depth - tf),
        Point2::new(hw, depth),
        Point2::new(-hw, depth),
    ]))
}

/// Angle: vertical leg of `depth`, horizontal leg of `flange_width`
fn angle_section(dims: &SectionDims) -> Result<Profile2D> {
    let depth = require(dims.depth, "depth")?;
    let width = require(dims.flange_width, "flange width")?;
    let tf = require(dims.flange_thickness, "flange thickness")?;
    let tw = require(dims.web_thickness, "web thickness")?;

    let hw = width / 2.0;

    Ok(Profile2D::new(vec![
        Point2::new(-hw, 0.0),
        Point2::new(hw, 0.0),
        Point2::new(hw, tf),
        Point2::new(-hw + tw, tf),
        Point2::new(-hw + tw, depth),
        Point2::new(-hw, depth),
    ]))
}

/// Tee: flange on top, web hanging below
fn tee_section(dims: &SectionDims) -> Result<Profile2D> {
    let depth = require(dims.depth, "depth")?;
    let width = require(dims.flange_width, "flange width")?;
    let tf = require(dims.flange_thickness, "flange thickness")?;
    let tw = require(dims.web_thickness, "web thickness")?;

    let hw = width / 2.0;
    let hweb = tw / 2.0;

    Ok(Profile2D::new(vec![
        Point2::new(-hweb, 0.0),
        Point2::new(hweb, 0.0),
        Point2::new(hweb, depth - tf),
        Point2::new(hw, depth - tf),
        Point2::new(hw, depth),
        Point2::new(-hw, depth),
        Point2::new(-hw, depth - tf),
        Point2::new(-hweb, depth - tf),
    ]))
}

/// Flat plate: `depth` is the plate width, `web_thickness` the thickness
fn plate_section(dims: &SectionDims) -> Result<Profile2D> {
    let width = require(dims.depth, "plate width")?;
    let thickness = require(dims.web_thickness, "plate thickness")?;

    let hw = width / 2.0;

    Ok(Profile2D::new(vec![
        Point2::new(-hw, 0.0),
        Point2::new(hw, 0.0),
        Point2::new(hw, thickness),
        Point2::new(-hw, thickness),
    ]))
}

/// Round bar or tube: `depth` is the outer diameter
fn round_section(dims: &SectionDims, hollow: bool) -> Result<Profile2D> {
    let diameter = require(dims.depth, "diameter")?;
    let radius = diameter / 2.0;

    let mut profile = Profile2D::new(circle(0.0, radius, radius, false));

    if hollow {
        let wall = require(dims.web_thickness, "wall thickness")?;
        if wall >= radius {
            return Err(Error::InvalidSection(
                "tube wall swallows the bore".to_string(),
            ));
        }
        profile.add_hole(circle(0.0, radius, radius - wall, true));
    }

    Ok(profile)
}

/// Rectangular hollow section
fn rect_tube_section(dims: &SectionDims) -> Result<Profile2D> {
    let depth = require(dims.depth, "depth")?;
    let width = require(dims.flange_width, "width")?;
    let wall = require(dims.web_thickness, "wall thickness")?;
    if 2.0 * wall >= width.min(depth) {
        return Err(Error::InvalidSection(
            "tube wall swallows the bore".to_string(),
        ));
    }

    let hw = width / 2.0;

    let mut profile = Profile2D::new(vec![
        Point2::new(-hw, 0.0),
        Point2::new(hw, 0.0),
        Point2::new(hw, depth),
        Point2::new(-hw, depth),
    ]);
    profile.add_hole(vec![
        Point2::new(-hw + wall, wall),
        Point2::new(-hw + wall, depth - wall),
        Point2::new(hw - wall, depth - wall),
        Point2::new(hw - wall, wall),
    ]);

    Ok(profile)
}

/// Circle outline centered at `(cx, cy)`. Clockwise when used as a hole.
pub fn circle(cx: f64, cy: f64, radius: f64, clockwise: bool) -> Vec<Point2<f64>> {
    let mut points = Vec::with_capacity(CIRCLE_SEGMENTS);
    for i in 0..CIRCLE_SEGMENTS {
        let t = i as f64 / CIRCLE_SEGMENTS as f64 * TAU;
        let t = if clockwise { -t } else { t };
        points.push(Point2::new(cx + radius * t.cos(), cy + radius * t.sin()));
    }
    points
}
