//! LiveML graphics prelude.
//!
//! A pure image algebra: primitive shapes and paths, styling, and
//! layout-relative composition. [`bbox`] infers an axis-aligned bounding
//! box from the structure of an image and [`render`] produces a typed SVG
//! tree positioned with the same box arithmetic, so what is laid out is
//! exactly what is drawn. [`draw`] wraps the result in a padded viewport.
//! The `_with` variants take a per-node step callback so a caller can
//! meter or interrupt the walk over a large image.
//!
//! The [`turtle`] module converts move/turn/branch programs into paths.

use std::convert::Infallible;

mod bbox;
mod error;
mod image;
mod svg;
pub mod turtle;

pub use bbox::{bbox, bbox_with, focus, BBox};
pub use error::{GraphicsError, GraphicsResult};
pub use image::{
    Anchor, Color, FontFamily, FontStyle, FontWeight, Image, PathSegment, Point, Style,
};
pub use svg::{
    draw, draw_with, render, render_with, SvgDocument, SvgElement, SvgNode, ViewBox,
};

/// The value of a traversal whose step never fails.
pub(crate) fn unfailing<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

/// Degrees to radians.
pub fn radians(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

/// The point at distance `r` from the origin in direction `degrees`.
///
/// Heading 0 is +x; positive angles turn towards +y, which points down in
/// SVG coordinates.
pub fn polar(r: f64, degrees: f64) -> Point {
    let a = radians(degrees);
    (r * a.cos(), r * a.sin())
}
