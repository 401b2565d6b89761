//! SVG rendering.
//!
//! Images render to a tree of typed nodes that is serialized at the end.
//! All text content and attribute values are escaped on output, so a
//! `Text` payload can never inject markup.

use serde::Serialize;
use std::fmt;

use crate::bbox::{combine, BBox};
use crate::image::{Image, PathSegment, Style};

// ══════════════════════════════════════════════════════════════════════════════
// Node Tree
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SvgNode {
    Element(SvgElement),
    Text(String),
    /// Siblings with no wrapping element.
    Fragment(Vec<SvgNode>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SvgElement {
    pub name: &'static str,
    pub attrs: Vec<(&'static str, String)>,
    pub children: Vec<SvgNode>,
}

impl SvgElement {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    pub fn child(mut self, child: SvgNode) -> Self {
        self.children.push(child);
        self
    }

    /// First value of attribute `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

impl From<SvgElement> for SvgNode {
    fn from(element: SvgElement) -> Self {
        SvgNode::Element(element)
    }
}

impl fmt::Display for SvgNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element(element) => write!(f, "{element}"),
            Self::Text(text) => f.write_str(&escape_text(text)),
            Self::Fragment(nodes) => nodes.iter().try_for_each(|n| write!(f, "{n}")),
        }
    }
}

impl fmt::Display for SvgElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        for (name, value) in &self.attrs {
            write!(f, " {name}=\"{}\"", escape_attr(value))?;
        }
        if self.children.is_empty() {
            return f.write_str("/>");
        }
        f.write_str(">")?;
        for child in &self.children {
            write!(f, "{child}")?;
        }
        write!(f, "</{}>", self.name)
    }
}

fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;").replace('\'', "&#39;")
}

/// Compact decimal form: integers print without a fraction and other
/// values keep at most six decimals.
pub(crate) fn number(x: f64) -> String {
    if !x.is_finite() {
        return format!("{x}");
    }
    if x.fract() == 0.0 && x.abs() < 1e15 {
        return format!("{}", x as i64);
    }
    let text = format!("{x:.6}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Rendering
// ══════════════════════════════════════════════════════════════════════════════

/// Render `image` centred on the origin.
///
/// Beside and Above offset their children with the same box arithmetic
/// as [`bbox`](crate::bbox()), so the drawn extent of every composite is its box.
pub fn render(image: &Image) -> SvgNode {
    crate::unfailing(render_with(image, &mut || Ok(()))).0
}

/// [`render`], also returning the image's box. `step` is called once per
/// node and the first error it returns stops rendering.
///
/// Every node's box is computed once, from its children's, so the cost
/// is linear in the size of the image.
pub fn render_with<E, F>(image: &Image, step: &mut F) -> Result<(SvgNode, BBox), E>
where
    F: FnMut() -> Result<(), E>,
{
    step()?;
    let none = BBox::default();
    let (node, first, second) = match image {
        Image::Empty => (SvgNode::Fragment(Vec::new()), none, none),
        Image::Ellipse(w, h) => {
            let node = SvgElement::new("ellipse")
                .attr("rx", number(w / 2.0))
                .attr("ry", number(h / 2.0))
                .attr("cx", "0")
                .attr("cy", "0");
            (node.into(), none, none)
        }
        Image::Rectangle(w, h) => {
            let node = SvgElement::new("rect")
                .attr("width", number(*w))
                .attr("height", number(*h))
                .attr("x", number(-w / 2.0))
                .attr("y", number(-h / 2.0));
            (node.into(), none, none)
        }
        Image::Text(text) => {
            let node = SvgElement::new("text")
                .attr("x", "0")
                .attr("y", "0")
                .attr("text-anchor", "middle")
                .attr("dominant-baseline", "middle")
                .attr("vector-effect", "non-scaling-stroke")
                .child(SvgNode::Text(text.clone()));
            (node.into(), none, none)
        }
        Image::OpenPath(segments) => {
            let node = path_element(path_data(segments))
                .attr("fill", "none")
                .attr("stroke-linejoin", "round")
                .attr("stroke-linecap", "round");
            (node.into(), none, none)
        }
        Image::ClosedPath(segments) => {
            let mut d = path_data(segments);
            if !d.is_empty() {
                d.push(' ');
            }
            d.push('Z');
            (path_element(d).into(), none, none)
        }
        Image::Beside(left, right) => {
            let (left, l) = render_with(left, step)?;
            let (right, r) = render_with(right, step)?;
            let w = l.width() + r.width();
            let node = SvgNode::Fragment(vec![
                translated(left, -w / 2.0 - l.left, 0.0),
                translated(right, w / 2.0 - r.right, 0.0),
            ]);
            (node, l, r)
        }
        Image::Above(top, bottom) => {
            let (top, t) = render_with(top, step)?;
            let (bottom, b) = render_with(bottom, step)?;
            let h = t.height() + b.height();
            let node = SvgNode::Fragment(vec![
                translated(top, 0.0, -h / 2.0 - t.top),
                translated(bottom, 0.0, h / 2.0 - b.bottom),
            ]);
            (node, t, b)
        }
        Image::On(top, bottom) => {
            let (top, t) = render_with(top, step)?;
            let (bottom, b) = render_with(bottom, step)?;
            // The bottom image is painted first.
            (SvgNode::Fragment(vec![bottom, top]), t, b)
        }
        Image::Styled(image, styles) => {
            let (inner, b) = render_with(image, step)?;
            let group = styles.iter().fold(SvgElement::new("g"), style_attrs);
            (group.child(inner).into(), b, none)
        }
        Image::Translate(image, dx, dy) => {
            let (inner, b) = render_with(image, step)?;
            (translated(inner, *dx, *dy), b, none)
        }
        Image::Rotate(image, degrees) => {
            let (inner, b) = render_with(image, step)?;
            let node = SvgElement::new("g")
                .attr("transform", format!("rotate({})", number(*degrees)))
                .child(inner);
            (node.into(), b, none)
        }
        Image::Scale(image, sx, sy) => {
            let (inner, b) = render_with(image, step)?;
            let node = SvgElement::new("g")
                .attr("transform", format!("scale({},{})", number(*sx), number(*sy)))
                .child(inner);
            (node.into(), b, none)
        }
        Image::Bounds(image, ..) => (render_with(image, step)?.0, none, none),
    };
    Ok((node, combine(image, first, second)))
}

fn translated(node: SvgNode, dx: f64, dy: f64) -> SvgNode {
    SvgElement::new("g")
        .attr("transform", format!("translate({},{})", number(dx), number(dy)))
        .child(node)
        .into()
}

fn path_element(d: String) -> SvgElement {
    SvgElement::new("path").attr("d", d)
}

fn path_data(segments: &[PathSegment]) -> String {
    let point = |(x, y): (f64, f64)| format!("{} {}", number(x), number(y));
    segments
        .iter()
        .map(|segment| match *segment {
            PathSegment::MoveTo(p) => format!("M {}", point(p)),
            PathSegment::LineTo(p) => format!("L {}", point(p)),
            PathSegment::CurveTo(c1, c2, p) => {
                format!("C {}, {}, {}", point(c1), point(c2), point(p))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn style_attrs(group: SvgElement, style: &Style) -> SvgElement {
    match style {
        Style::LineWidth(w) => group.attr("stroke-width", number(*w)),
        Style::LineColor(color) => group.attr("stroke", color.to_string()),
        Style::FillColor(color) => group.attr("fill", color.to_string()),
        Style::Dashed => group.attr("stroke-dasharray", "4"),
        Style::Font {
            size,
            family,
            weight,
            style,
        } => group
            .attr("font-size", format!("{}rem", number(*size)))
            .attr("font-family", family.css())
            .attr("font-weight", weight.css())
            .attr("font-style", style.css()),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Documents
// ══════════════════════════════════════════════════════════════════════════════

/// Padding added around the content box, as a fraction of its size.
const PADDING: f64 = 0.05;

/// Minimum horizontal reach of the viewport on each side of the origin.
const MIN_HALF_WIDTH: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    /// Pad `content` by 5% per axis and widen the horizontal extent to at
    /// least [-100, 100] so small drawings are not over-zoomed.
    pub fn around(content: BBox) -> Self {
        let pad_w = PADDING * content.width();
        let pad_h = PADDING * content.height();
        let min_x = (content.left - pad_w).min(-MIN_HALF_WIDTH);
        let max_x = (content.right + pad_w).max(MIN_HALF_WIDTH);
        let min_y = content.top - pad_h;
        let max_y = content.bottom + pad_h;
        Self {
            min_x,
            min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }
}

impl fmt::Display for ViewBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            number(self.min_x),
            number(self.min_y),
            number(self.width),
            number(self.height)
        )
    }
}

/// A self-contained SVG document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SvgDocument {
    pub view_box: ViewBox,
    pub content: SvgNode,
}

impl SvgDocument {
    /// The `<svg>` root, with default presentation on its only group.
    pub fn to_element(&self) -> SvgElement {
        let group = SvgElement::new("g")
            .attr("fill", "grey")
            .attr("stroke", "black")
            .attr("font-family", "Roboto Mono, monospace")
            .attr("font-size", "1rem")
            .child(self.content.clone());
        SvgElement::new("svg")
            .attr("xmlns", "http://www.w3.org/2000/svg")
            .attr("viewBox", self.view_box.to_string())
            .attr("width", "100%")
            .attr("preserveAspectRatio", "xMidYMid meet")
            .child(group.into())
    }
}

impl fmt::Display for SvgDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_element())
    }
}

/// Render `image` into a document whose viewport fits its bounding box.
pub fn draw(image: &Image) -> SvgDocument {
    crate::unfailing(draw_with(image, &mut || Ok(())))
}

/// [`draw`] with a per-node `step`, as in [`render_with`].
pub fn draw_with<E, F>(image: &Image, step: &mut F) -> Result<SvgDocument, E>
where
    F: FnMut() -> Result<(), E>,
{
    let (content, content_box) = render_with(image, step)?;
    Ok(SvgDocument {
        view_box: ViewBox::around(content_box),
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox;

    #[test]
    fn test_number_format() {
        assert_eq!(number(3.0), "3");
        assert_eq!(number(-0.0), "0");
        assert_eq!(number(0.5), "0.5");
        assert_eq!(number(1.0 / 3.0), "0.333333");
        assert_eq!(number(-2.25), "-2.25");
        assert_eq!(number(-1e-9), "0");
    }

    #[test]
    fn test_escaping() {
        let node = render(&Image::Text("<b>\"x\" & 'y'</b>".into()));
        let markup = node.to_string();
        assert!(markup.contains("&lt;b&gt;\"x\" &amp; 'y'&lt;/b&gt;"));
        assert!(!markup.contains("<b>"));

        let attr = SvgElement::new("g").attr("fill", "a\"><script>");
        assert_eq!(attr.to_string(), "<g fill=\"a&quot;&gt;&lt;script&gt;\"/>");
    }

    #[test]
    fn test_rect_markup() {
        assert_eq!(
            render(&Image::Rectangle(10.0, 4.0)).to_string(),
            "<rect width=\"10\" height=\"4\" x=\"-5\" y=\"-2\"/>"
        );
    }

    #[test]
    fn test_closed_path_data() {
        let node = render(&Image::ClosedPath(vec![
            PathSegment::MoveTo((0.0, 0.0)),
            PathSegment::LineTo((10.0, 0.0)),
            PathSegment::CurveTo((1.0, 2.0), (3.0, 4.0), (5.0, 6.0)),
        ]));
        let SvgNode::Element(path) = node else {
            panic!("expected a path element");
        };
        assert_eq!(path.get("d"), Some("M 0 0 L 10 0 C 1 2, 3 4, 5 6 Z"));
    }

    #[test]
    fn test_render_box_matches_bbox() {
        let image = Image::Rectangle(10.0, 4.0)
            .beside(Image::circle(3.0).translate(0.0, 5.0))
            .above(Image::Text("x".into()).with_bounds(-1.0, 1.0, -1.0, 1.0).rotate(30.0))
            .scale(2.0, -1.0);
        let (node, rendered) = render_with(&image, &mut || Ok::<_, ()>(())).unwrap();
        assert_eq!(rendered, bbox(&image));
        assert_eq!(node, render(&image));
    }

    #[test]
    fn test_render_visits_each_node_once() {
        let mut image = Image::circle(1.0);
        for _ in 0..12 {
            image = image.clone().beside(image);
        }
        let mut visited = 0u64;
        render_with(&image, &mut || {
            visited += 1;
            Ok::<_, ()>(())
        })
        .unwrap();
        assert_eq!(visited, (1 << 13) - 1);
    }

    #[test]
    fn test_draw_stops_when_step_fails() {
        let image = Image::circle(1.0).beside(Image::circle(2.0));
        let mut budget = 2;
        let result = draw_with(&image, &mut || {
            if budget == 0 {
                return Err("stopped");
            }
            budget -= 1;
            Ok(())
        });
        assert_eq!(result.unwrap_err(), "stopped");
    }

    #[test]
    fn test_view_box_floor() {
        let vb = ViewBox::around(BBox::centred(20.0, 20.0));
        assert_eq!(vb.min_x, -100.0);
        assert_eq!(vb.width, 200.0);
        assert_eq!(vb.min_y, -11.0);
        assert_eq!(vb.height, 22.0);

        let wide = ViewBox::around(BBox::new(-300.0, 100.0, 0.0, 10.0));
        assert_eq!(wide.min_x, -320.0);
        assert_eq!(wide.width, 440.0);
    }
}
