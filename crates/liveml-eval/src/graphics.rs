//! Bridge between language values and the graphics engine.
//!
//! The image types are declared here rather than in the prelude so that
//! natives such as `Turtle.run` can build values of them. Constructor
//! names follow the language (`Color`, `RGBA`, `HSLA`), not the Rust
//! enums.
//!
//! Converting and drawing an image costs one unit of gas per node, so a
//! huge image stops at the same limits as any other long computation.

use std::rc::Rc;

use liveml_graphics::turtle::{self, Instruction};
use liveml_graphics::{
    bbox_with, draw_with, render_with, Anchor, Color, FontFamily, FontStyle, FontWeight, Image, PathSegment,
    Point, Style,
};

use crate::env::Namespace;
use crate::error::{EvalError, EvalResult};
use crate::evaluator::Evaluator;
use crate::natives::{list, take, Native};
use crate::value::{Constructor, Value, Variant};

pub(crate) static GLOBALS: &[Native] = &[
    Native::fixed("bbox", 1, |ev, args| {
        let [image] = take(args)?;
        let image = image_of_value(ev, &image)?;
        let b = bbox_with(&image, &mut || ev.tick())?;
        Ok(Value::tuple(vec![
            Value::Float(b.left),
            Value::Float(b.right),
            Value::Float(b.top),
            Value::Float(b.bottom),
        ]))
    }),
    Native::fixed("focus", 2, |ev, args| {
        let [position, image] = take(args)?;
        let anchor = anchor_of_value(&position)?;
        let shape = image_of_value(ev, &image)?;
        let (x, y) = bbox_with(&shape, &mut || ev.tick())?.anchor(anchor);
        ev.construct("Translate", vec![image, Value::Float(-x), Value::Float(-y)])
    }),
    Native::fixed("render", 1, |ev, args| {
        let [image] = take(args)?;
        let image = image_of_value(ev, &image)?;
        image.validate()?;
        let (node, _) = render_with(&image, &mut || ev.tick())?;
        Ok(Value::str(node.to_string()))
    }),
    Native::fixed("draw", 1, |ev, args| {
        let [image] = take(args)?;
        let image = image_of_value(ev, &image)?;
        image.validate()?;
        let document = draw_with(&image, &mut || ev.tick())?;
        ev.print(&document.to_string());
        ev.print("\n");
        Ok(Value::Unit)
    }),
];

static TURTLE: &[Native] = &[Native::fixed("run", 1, |ev, args| {
    let [program] = take(args)?;
    let program = program
        .as_list()?
        .iter()
        .map(instruction_of_value)
        .collect::<EvalResult<Vec<_>>>()?;
    value_of_image(ev, &turtle::run(&program))
})];

/// Declare the image types, the drawing natives and the `Turtle` module.
pub fn declare(ns: &mut Namespace) {
    ns.declare_type("pathElement", &[("MoveTo", 1), ("LineTo", 1), ("CurveTo", 3)]);
    ns.declare_type("color", &[("Color", 1), ("RGBA", 4), ("HSLA", 4)]);
    ns.declare_type("fontFamily", &[("Mono", 0), ("Sans", 0), ("Serif", 0)]);
    ns.declare_type("fontWeight", &[("Bold", 0), ("Regular", 0)]);
    ns.declare_type("fontStyle", &[("Italic", 0), ("Normal", 0)]);
    ns.declare_type(
        "style",
        &[
            ("LineWidth", 1),
            ("LineColor", 1),
            ("FillColor", 1),
            ("Dashed", 0),
            ("Font", 4),
        ],
    );
    ns.declare_type(
        "image",
        &[
            ("Empty", 0),
            ("Ellipse", 2),
            ("Rectangle", 2),
            ("Text", 1),
            ("OpenPath", 1),
            ("ClosedPath", 1),
            ("Beside", 2),
            ("Above", 2),
            ("On", 2),
            ("Styled", 2),
            ("Translate", 3),
            ("Rotate", 2),
            ("Scale", 3),
            ("Bounds", 5),
        ],
    );
    let positions: Vec<(&str, usize)> = Anchor::ALL.iter().map(|a| (a.name(), 0)).collect();
    ns.declare_type("position", &positions);

    for native in GLOBALS {
        ns.define(native.name, native.value());
    }

    let mut module = Namespace::default();
    module.declare_type(
        "instruction",
        &[("Forward", 1), ("Turn", 1), ("Branch", 1), ("NoOp", 0)],
    );
    for native in TURTLE {
        module.define(native.name, native.value());
    }
    ns.modules.insert("Turtle".into(), Rc::new(module));
}

// ══════════════════════════════════════════════════════════════════════════════
// Values → graphics
// ══════════════════════════════════════════════════════════════════════════════

fn variant<'a>(value: &'a Value, type_name: &str) -> EvalResult<&'a Variant> {
    match value {
        Value::Variant(v) if v.ctor.type_name == type_name => Ok(v),
        other => Err(EvalError::type_mismatch(type_name, other.type_name())),
    }
}

fn unexpected(v: &Variant) -> EvalError {
    EvalError::TypeMismatch(format!(
        "{} is not a drawable {}",
        v.name(),
        v.ctor.type_name
    ))
}

fn point(value: &Value) -> EvalResult<Point> {
    let p = value.as_tuple(2)?;
    Ok((p[0].as_number()?, p[1].as_number()?))
}

fn boxed(ev: &mut Evaluator, value: &Value) -> EvalResult<Box<Image>> {
    image_of_value(ev, value).map(Box::new)
}

/// Convert a value of type `image`, charging one unit of gas per node.
///
/// Shared sub-images are expanded every time they occur, so the gas
/// charged follows the size of the drawing rather than of the value.
pub fn image_of_value(ev: &mut Evaluator, value: &Value) -> EvalResult<Image> {
    ev.tick()?;
    let v = variant(value, "image")?;
    let image = match (v.name(), v.args.as_slice()) {
        ("Empty", []) => Image::Empty,
        ("Ellipse", [w, h]) => Image::Ellipse(w.as_number()?, h.as_number()?),
        ("Rectangle", [w, h]) => Image::Rectangle(w.as_number()?, h.as_number()?),
        ("Text", [s]) => Image::Text(s.as_str()?.to_string()),
        ("OpenPath", [segments]) => Image::OpenPath(segments_of_value(segments)?),
        ("ClosedPath", [segments]) => Image::ClosedPath(segments_of_value(segments)?),
        ("Beside", [a, b]) => Image::Beside(boxed(ev, a)?, boxed(ev, b)?),
        ("Above", [a, b]) => Image::Above(boxed(ev, a)?, boxed(ev, b)?),
        ("On", [a, b]) => Image::On(boxed(ev, a)?, boxed(ev, b)?),
        ("Styled", [image, styles]) => Image::Styled(
            boxed(ev, image)?,
            styles
                .as_list()?
                .iter()
                .map(style_of_value)
                .collect::<EvalResult<_>>()?,
        ),
        ("Translate", [image, dx, dy]) => {
            Image::Translate(boxed(ev, image)?, dx.as_number()?, dy.as_number()?)
        }
        ("Rotate", [image, degrees]) => Image::Rotate(boxed(ev, image)?, degrees.as_number()?),
        ("Scale", [image, sx, sy]) => {
            Image::Scale(boxed(ev, image)?, sx.as_number()?, sy.as_number()?)
        }
        ("Bounds", [image, l, r, t, b]) => Image::Bounds(
            boxed(ev, image)?,
            l.as_number()?,
            r.as_number()?,
            t.as_number()?,
            b.as_number()?,
        ),
        _ => return Err(unexpected(v)),
    };
    Ok(image)
}

fn segments_of_value(value: &Value) -> EvalResult<Vec<PathSegment>> {
    value.as_list()?.iter().map(segment_of_value).collect()
}

fn segment_of_value(value: &Value) -> EvalResult<PathSegment> {
    let v = variant(value, "pathElement")?;
    match (v.name(), v.args.as_slice()) {
        ("MoveTo", [p]) => Ok(PathSegment::MoveTo(point(p)?)),
        ("LineTo", [p]) => Ok(PathSegment::LineTo(point(p)?)),
        ("CurveTo", [c1, c2, p]) => Ok(PathSegment::CurveTo(point(c1)?, point(c2)?, point(p)?)),
        _ => Err(unexpected(v)),
    }
}

fn style_of_value(value: &Value) -> EvalResult<Style> {
    let v = variant(value, "style")?;
    match (v.name(), v.args.as_slice()) {
        ("LineWidth", [w]) => Ok(Style::LineWidth(w.as_number()?)),
        ("LineColor", [c]) => Ok(Style::LineColor(color_of_value(c)?)),
        ("FillColor", [c]) => Ok(Style::FillColor(color_of_value(c)?)),
        ("Dashed", []) => Ok(Style::Dashed),
        ("Font", [size, family, weight, style]) => Ok(Style::Font {
            size: size.as_number()?,
            family: match variant(family, "fontFamily")?.name() {
                "Mono" => FontFamily::Mono,
                "Sans" => FontFamily::Sans,
                _ => FontFamily::Serif,
            },
            weight: match variant(weight, "fontWeight")?.name() {
                "Bold" => FontWeight::Bold,
                _ => FontWeight::Regular,
            },
            style: match variant(style, "fontStyle")?.name() {
                "Italic" => FontStyle::Italic,
                _ => FontStyle::Normal,
            },
        }),
        _ => Err(unexpected(v)),
    }
}

fn color_of_value(value: &Value) -> EvalResult<Color> {
    let v = variant(value, "color")?;
    match (v.name(), v.args.as_slice()) {
        ("Color", [name]) => Ok(Color::Named(name.as_str()?.to_string())),
        ("RGBA", [r, g, b, a]) => Ok(Color::Rgba(r.as_int()?, g.as_int()?, b.as_int()?, a.as_number()?)),
        ("HSLA", [h, s, l, a]) => Ok(Color::Hsla(
            h.as_number()?,
            s.as_number()?,
            l.as_number()?,
            a.as_number()?,
        )),
        _ => Err(unexpected(v)),
    }
}

fn anchor_of_value(value: &Value) -> EvalResult<Anchor> {
    let v = variant(value, "position")?;
    Anchor::from_name(v.name()).ok_or_else(|| unexpected(v))
}

fn instruction_of_value(value: &Value) -> EvalResult<Instruction> {
    let v = variant(value, "instruction")?;
    match (v.name(), v.args.as_slice()) {
        ("Forward", [d]) => Ok(Instruction::Forward(d.as_number()?)),
        ("Turn", [a]) => Ok(Instruction::Turn(a.as_number()?)),
        ("Branch", [body]) => Ok(Instruction::Branch(
            body.as_list()?
                .iter()
                .map(instruction_of_value)
                .collect::<EvalResult<_>>()?,
        )),
        ("NoOp", []) => Ok(Instruction::NoOp),
        _ => Err(unexpected(v)),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Graphics → values
// ══════════════════════════════════════════════════════════════════════════════

fn point_value((x, y): Point) -> Value {
    Value::tuple(vec![Value::Float(x), Value::Float(y)])
}

/// Build the language value for `image` using the built-in constructors.
pub fn value_of_image(ev: &Evaluator, image: &Image) -> EvalResult<Value> {
    let (name, args) = match image {
        Image::Empty => ("Empty", vec![]),
        Image::Ellipse(w, h) => ("Ellipse", vec![Value::Float(*w), Value::Float(*h)]),
        Image::Rectangle(w, h) => ("Rectangle", vec![Value::Float(*w), Value::Float(*h)]),
        Image::Text(s) => ("Text", vec![Value::str(s.as_str())]),
        Image::OpenPath(segments) => ("OpenPath", vec![path_value(ev, segments)?]),
        Image::ClosedPath(segments) => ("ClosedPath", vec![path_value(ev, segments)?]),
        Image::Beside(a, b) => ("Beside", vec![value_of_image(ev, a)?, value_of_image(ev, b)?]),
        Image::Above(a, b) => ("Above", vec![value_of_image(ev, a)?, value_of_image(ev, b)?]),
        Image::On(a, b) => ("On", vec![value_of_image(ev, a)?, value_of_image(ev, b)?]),
        Image::Styled(image, styles) => {
            let styles = styles
                .iter()
                .map(|s| style_value(ev, s))
                .collect::<EvalResult<Vec<_>>>()?;
            ("Styled", vec![value_of_image(ev, image)?, list(styles)])
        }
        Image::Translate(image, dx, dy) => (
            "Translate",
            vec![value_of_image(ev, image)?, Value::Float(*dx), Value::Float(*dy)],
        ),
        Image::Rotate(image, degrees) => {
            ("Rotate", vec![value_of_image(ev, image)?, Value::Float(*degrees)])
        }
        Image::Scale(image, sx, sy) => (
            "Scale",
            vec![value_of_image(ev, image)?, Value::Float(*sx), Value::Float(*sy)],
        ),
        Image::Bounds(image, l, r, t, b) => (
            "Bounds",
            vec![
                value_of_image(ev, image)?,
                Value::Float(*l),
                Value::Float(*r),
                Value::Float(*t),
                Value::Float(*b),
            ],
        ),
    };
    ev.construct(name, args)
}

fn path_value(ev: &Evaluator, segments: &[PathSegment]) -> EvalResult<Value> {
    let items = segments
        .iter()
        .map(|segment| match *segment {
            PathSegment::MoveTo(p) => ev.construct("MoveTo", vec![point_value(p)]),
            PathSegment::LineTo(p) => ev.construct("LineTo", vec![point_value(p)]),
            PathSegment::CurveTo(c1, c2, p) => ev.construct(
                "CurveTo",
                vec![point_value(c1), point_value(c2), point_value(p)],
            ),
        })
        .collect::<EvalResult<Vec<_>>>()?;
    Ok(list(items))
}

fn style_value(ev: &Evaluator, style: &Style) -> EvalResult<Value> {
    match style {
        Style::LineWidth(w) => ev.construct("LineWidth", vec![Value::Float(*w)]),
        Style::LineColor(c) => ev.construct("LineColor", vec![color_value(ev, c)?]),
        Style::FillColor(c) => ev.construct("FillColor", vec![color_value(ev, c)?]),
        Style::Dashed => ev.construct("Dashed", vec![]),
        Style::Font {
            size,
            family,
            weight,
            style,
        } => {
            let family = match family {
                FontFamily::Mono => "Mono",
                FontFamily::Sans => "Sans",
                FontFamily::Serif => "Serif",
            };
            let weight = match weight {
                FontWeight::Bold => "Bold",
                FontWeight::Regular => "Regular",
            };
            let font_style = match style {
                FontStyle::Italic => "Italic",
                FontStyle::Normal => "Normal",
            };
            ev.construct(
                "Font",
                vec![
                    Value::Float(*size),
                    ev.construct(family, vec![])?,
                    ev.construct(weight, vec![])?,
                    ev.construct(font_style, vec![])?,
                ],
            )
        }
    }
}

fn color_value(ev: &Evaluator, color: &Color) -> EvalResult<Value> {
    match color {
        Color::Named(name) => ev.construct("Color", vec![Value::str(name.as_str())]),
        Color::Rgba(r, g, b, a) => ev.construct(
            "RGBA",
            vec![Value::Int(*r), Value::Int(*g), Value::Int(*b), Value::Float(*a)],
        ),
        Color::Hsla(h, s, l, a) => ev.construct(
            "HSLA",
            vec![
                Value::Float(*h),
                Value::Float(*s),
                Value::Float(*l),
                Value::Float(*a),
            ],
        ),
    }
}

/// The built-in constructor `name`, for natives that build values.
pub(crate) fn builtin_constructor(ns: &Namespace, name: &str) -> EvalResult<Rc<Constructor>> {
    ns.constructors
        .get(name)
        .cloned()
        .ok_or_else(|| EvalError::UnboundConstructor(name.to_string()))
}
