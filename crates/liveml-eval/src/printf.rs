//! `Printf`-style format strings.
//!
//! Supported conversions: `%d %i %x %X %f %F %e %s %S %c %C %b %B %%`,
//! with `-`, `0` and `+` flags, a width and a precision.

use crate::display::{float_text, quote_string};
use crate::error::{EvalError, EvalResult};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Text(String),
    Conversion(Spec),
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Spec {
    left: bool,
    zero: bool,
    plus: bool,
    width: usize,
    precision: Option<usize>,
    conv: char,
}

/// Number of arguments `fmt` consumes, or `None` if it is malformed.
pub fn arity(fmt: &str) -> Option<usize> {
    parse(fmt)
        .ok()
        .map(|pieces| pieces.iter().filter(|p| matches!(p, Piece::Conversion(_))).count())
}

/// Render `fmt` with one argument per conversion.
pub fn format(fmt: &str, args: &[Value]) -> EvalResult<String> {
    let pieces = parse(fmt)?;
    let mut args = args.iter();
    let mut out = String::new();
    for piece in pieces {
        match piece {
            Piece::Text(text) => out.push_str(&text),
            Piece::Conversion(spec) => {
                let arg = args
                    .next()
                    .ok_or_else(|| EvalError::invalid_argument("format: missing argument"))?;
                out.push_str(&pad(convert(&spec, arg)?, &spec));
            }
        }
    }
    Ok(out)
}

fn parse(fmt: &str) -> EvalResult<Vec<Piece>> {
    let mut pieces = Vec::new();
    let mut text = String::new();
    let mut chars = fmt.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            text.push(c);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            text.push('%');
            continue;
        }
        let mut spec = Spec::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => spec.left = true,
                '0' => spec.zero = true,
                '+' => spec.plus = true,
                _ => break,
            }
            chars.next();
        }
        while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
            spec.width = spec.width * 10 + d as usize;
            chars.next();
        }
        if chars.peek() == Some(&'.') {
            chars.next();
            let mut precision = 0;
            while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
                precision = precision * 10 + d as usize;
                chars.next();
            }
            spec.precision = Some(precision);
        }
        match chars.next() {
            Some(conv @ ('d' | 'i' | 'x' | 'X' | 'f' | 'F' | 'e' | 's' | 'S' | 'c' | 'C' | 'b' | 'B')) => {
                spec.conv = conv;
            }
            Some(other) => {
                return Err(EvalError::invalid_argument(format!(
                    "format: unknown conversion %{other}"
                )))
            }
            None => return Err(EvalError::invalid_argument("format: trailing %")),
        }
        if !text.is_empty() {
            pieces.push(Piece::Text(std::mem::take(&mut text)));
        }
        pieces.push(Piece::Conversion(spec));
    }
    if !text.is_empty() {
        pieces.push(Piece::Text(text));
    }
    Ok(pieces)
}

fn convert(spec: &Spec, arg: &Value) -> EvalResult<String> {
    let sign = |negative: bool| if !negative && spec.plus { "+" } else { "" };
    Ok(match spec.conv {
        'd' | 'i' => {
            let n = arg.as_int()?;
            format!("{}{n}", sign(n < 0))
        }
        'x' => format!("{:x}", arg.as_int()?),
        'X' => format!("{:X}", arg.as_int()?),
        'f' => {
            let x = arg.as_float()?;
            format!("{}{x:.*}", sign(x < 0.0), spec.precision.unwrap_or(6))
        }
        'F' => float_text(arg.as_float()?),
        'e' => {
            let x = arg.as_float()?;
            format!("{}{x:.*e}", sign(x < 0.0), spec.precision.unwrap_or(6))
        }
        's' => arg.as_str()?.to_string(),
        'S' => quote_string(arg.as_str()?),
        'c' => arg.as_char()?.to_string(),
        'C' => format!("'{}'", arg.as_char()?),
        'b' | 'B' => arg.as_bool()?.to_string(),
        other => {
            return Err(EvalError::invalid_argument(format!(
                "format: unknown conversion %{other}"
            )))
        }
    })
}

fn pad(text: String, spec: &Spec) -> String {
    let len = text.chars().count();
    if len >= spec.width {
        return text;
    }
    let fill = spec.width - len;
    if spec.left {
        format!("{text}{}", " ".repeat(fill))
    } else if spec.zero && matches!(spec.conv, 'd' | 'i' | 'f' | 'x' | 'X') {
        let (sign, digits) = match text.strip_prefix(['-', '+']) {
            Some(rest) => (&text[..1], rest),
            None => ("", text.as_str()),
        };
        format!("{sign}{}{digits}", "0".repeat(fill))
    } else {
        format!("{}{text}", " ".repeat(fill))
    }
}
