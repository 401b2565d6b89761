//! Bounding-box inference and anchoring.

use serde::{Deserialize, Serialize};

use crate::image::{Anchor, Image, PathSegment, Point};
use crate::radians;

/// An axis-aligned box in user units. `top < bottom` for boxes with
/// height, since `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl BBox {
    pub fn new(left: f64, right: f64, top: f64, bottom: f64) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    /// A box of the given size centred on the origin.
    pub fn centred(width: f64, height: f64) -> Self {
        Self::new(-width / 2.0, width / 2.0, -height / 2.0, height / 2.0)
    }

    /// Smallest box containing every point; the zero box when empty.
    pub fn of_points(points: impl IntoIterator<Item = Point>) -> Self {
        let mut points = points.into_iter();
        let Some((x, y)) = points.next() else {
            return Self::default();
        };
        points.fold(Self::new(x, x, y, y), |b, (x, y)| {
            Self::new(b.left.min(x), b.right.max(x), b.top.min(y), b.bottom.max(y))
        })
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn union(&self, other: &BBox) -> BBox {
        Self::new(
            self.left.min(other.left),
            self.right.max(other.right),
            self.top.min(other.top),
            self.bottom.max(other.bottom),
        )
    }

    pub fn translate(&self, dx: f64, dy: f64) -> BBox {
        Self::new(self.left + dx, self.right + dx, self.top + dy, self.bottom + dy)
    }

    pub fn corners(&self) -> [Point; 4] {
        [
            (self.left, self.top),
            (self.right, self.top),
            (self.left, self.bottom),
            (self.right, self.bottom),
        ]
    }

    pub fn anchor(&self, anchor: Anchor) -> Point {
        let cx = (self.left + self.right) / 2.0;
        let cy = (self.top + self.bottom) / 2.0;
        match anchor {
            Anchor::TL => (self.left, self.top),
            Anchor::TC => (cx, self.top),
            Anchor::TR => (self.right, self.top),
            Anchor::ML => (self.left, cy),
            Anchor::MC => (cx, cy),
            Anchor::MR => (self.right, cy),
            Anchor::BL => (self.left, self.bottom),
            Anchor::BC => (cx, self.bottom),
            Anchor::BR => (self.right, self.bottom),
        }
    }
}

/// Infer the bounding box of `image` from its structure.
///
/// Paths contribute only the points the pen lands on: curve control
/// points are ignored, so a bulging curve may extend past its box. Text
/// has a zero box and must be sized with an explicit `Bounds`.
pub fn bbox(image: &Image) -> BBox {
    crate::unfailing(bbox_with(image, &mut || Ok(())))
}

/// [`bbox`], calling `step` once per node visited and stopping at the
/// first error it returns.
pub fn bbox_with<E, F>(image: &Image, step: &mut F) -> Result<BBox, E>
where
    F: FnMut() -> Result<(), E>,
{
    step()?;
    let (first, second) = match image {
        Image::Beside(a, b) | Image::Above(a, b) | Image::On(a, b) => {
            (bbox_with(a, step)?, bbox_with(b, step)?)
        }
        Image::Styled(inner, _)
        | Image::Translate(inner, ..)
        | Image::Rotate(inner, _)
        | Image::Scale(inner, ..) => (bbox_with(inner, step)?, BBox::default()),
        _ => (BBox::default(), BBox::default()),
    };
    Ok(combine(image, first, second))
}

/// The box of one node given the boxes of its sub-images in order.
/// Leaves and `Bounds` ignore them.
pub(crate) fn combine(image: &Image, first: BBox, second: BBox) -> BBox {
    match image {
        Image::Empty | Image::Text(_) => BBox::default(),
        Image::Ellipse(w, h) | Image::Rectangle(w, h) => BBox::centred(*w, *h),
        Image::OpenPath(segments) | Image::ClosedPath(segments) => {
            BBox::of_points(segments.iter().map(PathSegment::end))
        }
        Image::Beside(..) => {
            let w = first.width() + second.width();
            BBox::new(
                -w / 2.0,
                w / 2.0,
                first.top.min(second.top),
                first.bottom.max(second.bottom),
            )
        }
        Image::Above(..) => {
            let h = first.height() + second.height();
            BBox::new(
                first.left.min(second.left),
                first.right.max(second.right),
                -h / 2.0,
                h / 2.0,
            )
        }
        Image::On(..) => first.union(&second),
        Image::Styled(..) => first,
        Image::Translate(_, dx, dy) => first.translate(*dx, *dy),
        Image::Rotate(_, degrees) => {
            let (sin, cos) = radians(*degrees).sin_cos();
            BBox::of_points(
                first
                    .corners()
                    .into_iter()
                    .map(|(x, y)| (x * cos - y * sin, x * sin + y * cos)),
            )
        }
        Image::Scale(_, sx, sy) => BBox::of_points([
            (first.left * sx, first.top * sy),
            (first.right * sx, first.bottom * sy),
        ]),
        Image::Bounds(_, l, r, t, b) => BBox::new(*l, *r, *t, *b),
    }
}

/// Move `image` so that `anchor` of its bounding box sits on the origin.
pub fn focus(anchor: Anchor, image: Image) -> Image {
    let (x, y) = bbox(&image).anchor(anchor);
    image.translate(-x, -y)
}
