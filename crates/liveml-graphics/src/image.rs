//! The image data model.
//!
//! Images are immutable trees. Leaves are centred on the origin and every
//! composite positions its children relative to their bounding boxes, so
//! an image never refers to a fixed canvas size.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{GraphicsError, GraphicsResult};

/// `(x, y)` in user units. `y` grows downwards.
pub type Point = (f64, f64);

// ══════════════════════════════════════════════════════════════════════════════
// Image
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Image {
    Empty,
    /// Full width and height, centred on the origin.
    Ellipse(f64, f64),
    Rectangle(f64, f64),
    /// Centred text. Text has no measured size and a zero bounding box.
    Text(String),
    OpenPath(Vec<PathSegment>),
    ClosedPath(Vec<PathSegment>),
    /// Left beside right, vertically centred.
    Beside(Box<Image>, Box<Image>),
    /// Top above bottom, horizontally centred.
    Above(Box<Image>, Box<Image>),
    /// Top drawn over bottom, sharing the origin.
    On(Box<Image>, Box<Image>),
    Styled(Box<Image>, Vec<Style>),
    Translate(Box<Image>, f64, f64),
    /// Clockwise rotation in degrees.
    Rotate(Box<Image>, f64),
    Scale(Box<Image>, f64, f64),
    /// Explicit `(left, right, top, bottom)` override of the child's box.
    Bounds(Box<Image>, f64, f64, f64, f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathSegment {
    MoveTo(Point),
    LineTo(Point),
    /// Two control points, then the end point.
    CurveTo(Point, Point, Point),
}

impl PathSegment {
    /// The point the pen rests on after this segment.
    pub fn end(&self) -> Point {
        match *self {
            Self::MoveTo(p) | Self::LineTo(p) | Self::CurveTo(_, _, p) => p,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::MoveTo(_) => "MoveTo",
            Self::LineTo(_) => "LineTo",
            Self::CurveTo(..) => "CurveTo",
        }
    }
}

impl Image {
    pub fn circle(r: f64) -> Self {
        Self::Ellipse(2.0 * r, 2.0 * r)
    }

    pub fn square(size: f64) -> Self {
        Self::Rectangle(size, size)
    }

    pub fn beside(self, right: Image) -> Self {
        Self::Beside(Box::new(self), Box::new(right))
    }

    pub fn above(self, below: Image) -> Self {
        Self::Above(Box::new(self), Box::new(below))
    }

    /// `self` drawn on top of `bottom`.
    pub fn on(self, bottom: Image) -> Self {
        Self::On(Box::new(self), Box::new(bottom))
    }

    pub fn styled(self, styles: Vec<Style>) -> Self {
        Self::Styled(Box::new(self), styles)
    }

    pub fn translate(self, dx: f64, dy: f64) -> Self {
        Self::Translate(Box::new(self), dx, dy)
    }

    pub fn rotate(self, degrees: f64) -> Self {
        Self::Rotate(Box::new(self), degrees)
    }

    pub fn scale(self, sx: f64, sy: f64) -> Self {
        Self::Scale(Box::new(self), sx, sy)
    }

    pub fn with_bounds(self, left: f64, right: f64, top: f64, bottom: f64) -> Self {
        Self::Bounds(Box::new(self), left, right, top, bottom)
    }

    /// Check the structural contracts the renderer relies on: every
    /// non-empty path starts with `MoveTo` and every number is finite.
    pub fn validate(&self) -> GraphicsResult<()> {
        match self {
            Self::Empty | Self::Text(_) => Ok(()),
            Self::Ellipse(w, h) | Self::Rectangle(w, h) => {
                finite("width", *w)?;
                finite("height", *h)
            }
            Self::OpenPath(segments) | Self::ClosedPath(segments) => validate_path(segments),
            Self::Beside(a, b) | Self::Above(a, b) | Self::On(a, b) => {
                a.validate()?;
                b.validate()
            }
            Self::Styled(image, styles) => {
                for style in styles {
                    if let Style::LineWidth(w) | Style::Font { size: w, .. } = style {
                        finite("style size", *w)?;
                    }
                }
                image.validate()
            }
            Self::Translate(image, dx, dy) => {
                finite("translation", *dx)?;
                finite("translation", *dy)?;
                image.validate()
            }
            Self::Rotate(image, degrees) => {
                finite("rotation", *degrees)?;
                image.validate()
            }
            Self::Scale(image, sx, sy) => {
                finite("scale factor", *sx)?;
                finite("scale factor", *sy)?;
                image.validate()
            }
            Self::Bounds(image, l, r, t, b) => {
                for v in [l, r, t, b] {
                    finite("bound", *v)?;
                }
                image.validate()
            }
        }
    }
}

pub(crate) fn validate_path(segments: &[PathSegment]) -> GraphicsResult<()> {
    match segments.first() {
        None | Some(PathSegment::MoveTo(_)) => {}
        Some(other) => return Err(GraphicsError::PathStart { found: other.name() }),
    }
    for segment in segments {
        let points = match *segment {
            PathSegment::MoveTo(p) | PathSegment::LineTo(p) => vec![p],
            PathSegment::CurveTo(c1, c2, p) => vec![c1, c2, p],
        };
        for (x, y) in points {
            finite("path coordinate", x)?;
            finite("path coordinate", y)?;
        }
    }
    Ok(())
}

fn finite(what: &'static str, value: f64) -> GraphicsResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(GraphicsError::NonFinite { what, value })
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Styles
// ══════════════════════════════════════════════════════════════════════════════

/// Presentation attributes. Styles never affect layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Style {
    LineWidth(f64),
    LineColor(Color),
    FillColor(Color),
    Dashed,
    /// Size in rem.
    Font {
        size: f64,
        family: FontFamily,
        weight: FontWeight,
        style: FontStyle,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Color {
    /// Any CSS color string.
    Named(String),
    /// Channels 0-255, alpha 0-1.
    Rgba(i64, i64, i64, f64),
    /// Hue in degrees; saturation, lightness and alpha 0-1.
    Hsla(f64, f64, f64, f64),
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::Rgba(r, g, b, a) => write!(f, "rgba({r},{g},{b},{})", crate::svg::number(*a)),
            Self::Hsla(h, s, l, a) => write!(
                f,
                "hsla({},{}%,{}%,{})",
                crate::svg::number(*h),
                (s * 100.0) as i64,
                (l * 100.0) as i64,
                crate::svg::number(*a)
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontFamily {
    Mono,
    Sans,
    Serif,
}

impl FontFamily {
    pub fn css(self) -> &'static str {
        match self {
            Self::Mono => "Roboto Mono, monospace",
            Self::Sans => "Roboto, sans-serif",
            Self::Serif => "Lora, serif",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontWeight {
    Bold,
    Regular,
}

impl FontWeight {
    pub fn css(self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Regular => "normal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontStyle {
    Italic,
    Normal,
}

impl FontStyle {
    pub fn css(self) -> &'static str {
        match self {
            Self::Italic => "italic",
            Self::Normal => "normal",
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Anchors
// ══════════════════════════════════════════════════════════════════════════════

/// One of the nine reference points of a bounding box: top, middle or
/// bottom row crossed with left, centre or right column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Anchor {
    TL,
    TC,
    TR,
    ML,
    MC,
    MR,
    BL,
    BC,
    BR,
}

impl Anchor {
    pub const ALL: [Anchor; 9] = [
        Self::TL,
        Self::TC,
        Self::TR,
        Self::ML,
        Self::MC,
        Self::MR,
        Self::BL,
        Self::BC,
        Self::BR,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::TL => "TL",
            Self::TC => "TC",
            Self::TR => "TR",
            Self::ML => "ML",
            Self::MC => "MC",
            Self::MR => "MR",
            Self::BL => "BL",
            Self::BC => "BC",
            Self::BR => "BR",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }
}
