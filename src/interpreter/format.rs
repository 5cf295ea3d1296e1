//! String formatting: format specs, `str.format` and `%`-formatting
//!
//! [`FormatSpec`] parses the format-spec mini-language
//! (`[[fill]align][sign][#][0][width][,][.precision][type]`) used by
//! f-string fields, `format()` and `str.format`. `%`-formatting translates
//! each conversion into a spec and reuses the same renderer.

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::{ExceptionKind, RuntimeError};
use crate::interpreter::ops::binary::float_operand;
use crate::memory::value::{float_repr, Value};
use crate::parser::ast::SourceLocation;
use num_bigint::{BigInt, Sign};
use num_traits::{FromPrimitive, ToPrimitive};

/// A parsed format spec
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct FormatSpec {
    fill: Option<char>,
    align: Option<char>,
    sign: Option<char>,
    alternate: bool,
    zero_pad: bool,
    width: Option<usize>,
    grouping: Option<char>,
    precision: Option<usize>,
    kind: Option<char>,
}

impl FormatSpec {
    pub(crate) fn parse(spec: &str, location: SourceLocation) -> Result<Self, RuntimeError> {
        let chars: Vec<char> = spec.chars().collect();
        let mut parsed = FormatSpec::default();
        let mut i = 0;

        let is_align = |c: char| matches!(c, '<' | '>' | '^' | '=');
        if chars.len() >= 2 && is_align(chars[1]) {
            parsed.fill = Some(chars[0]);
            parsed.align = Some(chars[1]);
            i = 2;
        } else if chars.first().copied().is_some_and(is_align) {
            parsed.align = Some(chars[0]);
            i = 1;
        }

        if let Some(&c @ ('+' | '-' | ' ')) = chars.get(i) {
            parsed.sign = Some(c);
            i += 1;
        }
        if chars.get(i) == Some(&'#') {
            parsed.alternate = true;
            i += 1;
        }
        if chars.get(i) == Some(&'0') {
            parsed.zero_pad = true;
            i += 1;
        }

        let start = i;
        while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
            i += 1;
        }
        if i > start {
            parsed.width = chars[start..i].iter().collect::<String>().parse().ok();
        }

        if let Some(&c @ (',' | '_')) = chars.get(i) {
            parsed.grouping = Some(c);
            i += 1;
        }

        if chars.get(i) == Some(&'.') {
            i += 1;
            let start = i;
            while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
                i += 1;
            }
            if i == start {
                return Err(RuntimeError::value_error("Format specifier missing precision", location));
            }
            parsed.precision = chars[start..i].iter().collect::<String>().parse().ok();
        }

        if let Some(&c) = chars.get(i) {
            parsed.kind = Some(c);
            i += 1;
        }

        if i != chars.len() {
            return Err(RuntimeError::value_error("Invalid format specifier", location));
        }
        Ok(parsed)
    }

    /// Pad `body` (a rendered value without its sign) to the spec's width
    fn pad(&self, sign: &str, body: &str, default_align: char) -> String {
        let (fill, align) = match (self.align, self.zero_pad) {
            (Some(align), _) => (self.fill.unwrap_or(' '), align),
            (None, true) => (self.fill.unwrap_or('0'), '='),
            (None, false) => (' ', default_align),
        };
        let len = sign.chars().count() + body.chars().count();
        let padding = self.width.unwrap_or(0).saturating_sub(len);
        let fill_str = |n: usize| fill.to_string().repeat(n);

        match align {
            '<' => format!("{}{}{}", sign, body, fill_str(padding)),
            '^' => format!(
                "{}{}{}{}",
                fill_str(padding / 2),
                sign,
                body,
                fill_str(padding - padding / 2)
            ),
            '=' => format!("{}{}{}", sign, fill_str(padding), body),
            _ => format!("{}{}{}", fill_str(padding), sign, body),
        }
    }

    fn sign_for(&self, negative: bool) -> &'static str {
        match (negative, self.sign) {
            (true, _) => "-",
            (false, Some('+')) => "+",
            (false, Some(' ')) => " ",
            _ => "",
        }
    }
}

/// Insert `separator` between groups of three digits
fn group_digits(digits: &str, separator: char) -> String {
    let (int_part, rest) = match digits.find(|c: char| !c.is_ascii_digit()) {
        Some(i) => digits.split_at(i),
        None => (digits, ""),
    };
    let mut grouped = String::new();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(c);
    }
    grouped.push_str(rest);
    grouped
}

/// Python-style exponent: `e+05` rather than Rust's `e5`
fn fix_exponent(formatted: &str, upper: bool) -> String {
    let (mantissa, exponent) = formatted.split_once('e').unwrap_or((formatted, "0"));
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    let marker = if upper { 'E' } else { 'e' };
    format!("{}{}{}{:0>2}", mantissa, marker, sign, digits)
}

/// Render a finite, non-negative float for a float presentation type
fn render_float(x: f64, kind: char, precision: Option<usize>, alternate: bool) -> String {
    if x.is_nan() {
        return if kind.is_ascii_uppercase() { "NAN" } else { "nan" }.to_string();
    }
    if x.is_infinite() {
        return if kind.is_ascii_uppercase() { "INF" } else { "inf" }.to_string();
    }

    match kind {
        'f' | 'F' => {
            let text = format!("{:.*}", precision.unwrap_or(6), x);
            if alternate && !text.contains('.') {
                format!("{}.", text)
            } else {
                text
            }
        }
        'e' | 'E' => fix_exponent(&format!("{:.*e}", precision.unwrap_or(6), x), kind == 'E'),
        '%' => format!("{:.*}%", precision.unwrap_or(6), x * 100.0),
        'g' | 'G' => general_float(x, precision.unwrap_or(6).max(1), alternate, kind == 'G'),
        // No presentation type: like 'g' but keeps a fractional digit,
        // or the shortest repr when no precision is given
        _ => match precision {
            None => float_repr(x),
            Some(p) => {
                let text = general_float(x, p.max(1), alternate, false);
                if text.contains(['.', 'e']) {
                    text
                } else {
                    format!("{}.0", text)
                }
            }
        },
    }
}

/// `g` presentation: fixed or scientific depending on the exponent
fn general_float(x: f64, precision: usize, alternate: bool, upper: bool) -> String {
    let scientific = format!("{:.*e}", precision - 1, x);
    let exponent: i64 = scientific
        .split_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0);

    let strip = |text: String| {
        if alternate || !text.contains('.') {
            text
        } else {
            text.trim_end_matches('0').trim_end_matches('.').to_string()
        }
    };

    if -4 <= exponent && exponent < precision as i64 {
        let decimals = (precision as i64 - 1 - exponent).max(0) as usize;
        strip(format!("{:.*}", decimals, x))
    } else {
        let (mantissa, _) = scientific.split_once('e').unwrap_or((scientific.as_str(), ""));
        let mantissa = strip(mantissa.to_string());
        fix_exponent(&format!("{}e{}", mantissa, exponent), upper)
    }
}

impl Interpreter<'_> {
    /// `format(value, spec)`
    pub(crate) fn format_value(
        &self,
        value: &Value,
        spec: &str,
        location: SourceLocation,
    ) -> Result<String, RuntimeError> {
        if spec.is_empty() {
            return self.str_of(value, location);
        }
        let parsed = FormatSpec::parse(spec, location)?;

        match value {
            Value::Str(text) => {
                if !matches!(parsed.kind, None | Some('s')) {
                    return Err(unknown_code(parsed.kind, value, location));
                }
                if parsed.sign.is_some() {
                    return Err(RuntimeError::value_error(
                        "Sign not allowed in string format specifier",
                        location,
                    ));
                }
                let body: String = match parsed.precision {
                    Some(p) => text.chars().take(p).collect(),
                    None => text.to_string(),
                };
                Ok(parsed.pad("", &body, '<'))
            }
            Value::Int(_) | Value::Bool(_) | Value::Long(_) => match parsed.kind {
                Some('f' | 'F' | 'e' | 'E' | 'g' | 'G' | '%') => {
                    self.format_float(float_operand(value, location)?, &parsed, location)
                }
                _ => format_int(&value.as_bigint().unwrap_or_default(), &parsed, value, location),
            },
            Value::Float(x) => self.format_float(*x, &parsed, location),
            other => Err(RuntimeError::type_error(
                format!("unsupported format string passed to {}.__format__", other.type_name()),
                location,
            )),
        }
    }

    fn format_float(
        &self,
        x: f64,
        spec: &FormatSpec,
        location: SourceLocation,
    ) -> Result<String, RuntimeError> {
        let kind = spec.kind.unwrap_or('\0');
        if !matches!(kind, '\0' | 'f' | 'F' | 'e' | 'E' | 'g' | 'G' | '%' | 'n') {
            return Err(unknown_code(spec.kind, &Value::Float(x), location));
        }
        let kind = if kind == 'n' { 'g' } else { kind };

        let negative = x.is_sign_negative() && !x.is_nan();
        let mut body = render_float(x.abs(), kind, spec.precision, spec.alternate);
        if let Some(separator) = spec.grouping {
            body = group_digits(&body, separator);
        }
        Ok(spec.pad(spec.sign_for(negative), &body, '>'))
    }

    /// Render `template % args`
    pub(crate) fn percent_format(
        &self,
        template: &str,
        args: &Value,
        location: SourceLocation,
    ) -> Result<String, RuntimeError> {
        let mapping = matches!(args, Value::Dict(_));
        let values: Vec<Value> = match args {
            Value::Tuple(items) => items.to_vec(),
            other => vec![other.clone()],
        };
        let mut next = 0;
        let mut out = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }

            let mut key = None;
            if chars.peek() == Some(&'(') {
                chars.next();
                let name: String = chars.by_ref().take_while(|&c| c != ')').collect();
                key = Some(name);
            }

            let mut flags = String::new();
            while let Some(&c @ ('-' | '+' | ' ' | '0' | '#')) = chars.peek() {
                flags.push(c);
                chars.next();
            }
            let mut width = String::new();
            while let Some(&c) = chars.peek().filter(|c| c.is_ascii_digit()) {
                width.push(c);
                chars.next();
            }
            let mut precision = None;
            if chars.peek() == Some(&'.') {
                chars.next();
                let mut digits = String::new();
                while let Some(&c) = chars.peek().filter(|c| c.is_ascii_digit()) {
                    digits.push(c);
                    chars.next();
                }
                precision = Some(digits);
            }

            let Some(conversion) = chars.next() else {
                return Err(RuntimeError::value_error("incomplete format", location));
            };
            if conversion == '%' {
                out.push('%');
                continue;
            }

            let value = match (&key, args) {
                (Some(name), Value::Dict(dict)) => dict
                    .borrow()
                    .get(&Value::from(name.as_str()))
                    .cloned()
                    .ok_or_else(|| RuntimeError::key_error(Value::from(name.as_str()), location))?,
                (Some(_), _) => {
                    return Err(RuntimeError::type_error("format requires a mapping", location))
                }
                (None, _) => {
                    let value = values.get(next).cloned().ok_or_else(|| {
                        RuntimeError::type_error("not enough arguments for format string", location)
                    })?;
                    next += 1;
                    value
                }
            };

            let mut spec = String::new();
            if flags.contains('-') {
                spec.push('<');
            } else if conversion == 's' || conversion == 'r' {
                spec.push('>');
            }
            if flags.contains('+') {
                spec.push('+');
            } else if flags.contains(' ') {
                spec.push(' ');
            }
            if flags.contains('#') {
                spec.push('#');
            }
            if flags.contains('0') && !flags.contains('-') && !matches!(conversion, 's' | 'r') {
                spec.push('0');
            }
            spec.push_str(&width);
            if let Some(precision) = &precision {
                spec.push('.');
                spec.push_str(if precision.is_empty() { "0" } else { precision });
            }

            let rendered = match conversion {
                's' => self.format_value(&Value::from(self.str_of(&value, location)?), &spec, location)?,
                'r' | 'a' => {
                    self.format_value(&Value::from(self.repr_of(&value, location)?), &spec, location)?
                }
                'd' | 'i' | 'u' => {
                    let n = match &value {
                        Value::Float(x) => BigInt::from_f64(x.trunc()).ok_or_else(|| {
                            RuntimeError::raise(
                                ExceptionKind::OverflowError,
                                "cannot convert float infinity to integer",
                                location,
                            )
                        })?,
                        other => other.as_bigint().ok_or_else(|| {
                            RuntimeError::type_error(
                                format!(
                                    "%{} format: a real number is required, not {}",
                                    conversion,
                                    other.type_name()
                                ),
                                location,
                            )
                        })?,
                    };
                    // precision on an integer means minimum digits
                    let spec = spec.split('.').next().unwrap_or("").to_string();
                    self.format_value(&Value::from_bigint(n), &format!("{}d", spec), location)?
                }
                'x' | 'X' | 'o' | 'c' => {
                    if !value.is_int() && !(conversion == 'c' && matches!(value, Value::Str(_))) {
                        return Err(RuntimeError::type_error(
                            format!(
                                "%{} format: an integer is required, not {}",
                                conversion,
                                value.type_name()
                            ),
                            location,
                        ));
                    }
                    match value {
                        Value::Str(_) => self.format_value(&value, &spec, location)?,
                        _ => self.format_value(&value, &format!("{}{}", spec, conversion), location)?,
                    }
                }
                'f' | 'F' | 'e' | 'E' | 'g' | 'G' => {
                    let x = value.as_f64().ok_or_else(|| {
                        RuntimeError::type_error(
                            format!("must be real number, not {}", value.type_name()),
                            location,
                        )
                    })?;
                    self.format_value(&Value::Float(x), &format!("{}{}", spec, conversion), location)?
                }
                other => {
                    return Err(RuntimeError::value_error(
                        format!(
                            "unsupported format character '{}' (0x{:x})",
                            other, other as u32
                        ),
                        location,
                    ))
                }
            };
            out.push_str(&rendered);
        }

        if !mapping && next < values.len() {
            return Err(RuntimeError::type_error(
                "not all arguments converted during string formatting",
                location,
            ));
        }
        Ok(out)
    }

    /// `template.format(*args, **kwargs)`
    pub(crate) fn str_format(
        &self,
        template: &str,
        args: &[Value],
        kwargs: &[(String, Value)],
        location: SourceLocation,
    ) -> Result<String, RuntimeError> {
        let mut out = String::new();
        let mut chars = template.chars().peekable();
        let mut auto_index = 0;
        let mut numbering: Option<bool> = None;

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '}' => {
                    return Err(RuntimeError::value_error(
                        "Single '}' encountered in format string",
                        location,
                    ))
                }
                '{' => {
                    let mut field = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        field.push(c);
                    }
                    if !closed {
                        return Err(RuntimeError::value_error(
                            "Single '{' encountered in format string",
                            location,
                        ));
                    }

                    let (field, spec) = field.split_once(':').unwrap_or((field.as_str(), ""));
                    let (name, conversion) = match field.split_once('!') {
                        Some((name, conversion)) => (name, conversion.chars().next()),
                        None => (field, None),
                    };

                    let value = if name.is_empty() {
                        if numbering == Some(true) {
                            return Err(RuntimeError::value_error(
                                "cannot switch from manual field specification to automatic field numbering",
                                location,
                            ));
                        }
                        numbering = Some(false);
                        let index = auto_index;
                        auto_index += 1;
                        positional(args, index, location)?
                    } else if let Ok(index) = name.parse::<usize>() {
                        if numbering == Some(false) {
                            return Err(RuntimeError::value_error(
                                "cannot switch from automatic field numbering to manual field specification",
                                location,
                            ));
                        }
                        numbering = Some(true);
                        positional(args, index, location)?
                    } else {
                        kwargs
                            .iter()
                            .find(|(key, _)| key == name)
                            .map(|(_, value)| value.clone())
                            .ok_or_else(|| RuntimeError::key_error(Value::from(name), location))?
                    };

                    let value = match conversion {
                        Some('r') | Some('a') => Value::from(self.repr_of(&value, location)?),
                        Some('s') => Value::from(self.str_of(&value, location)?),
                        Some(other) => {
                            return Err(RuntimeError::value_error(
                                format!("Unknown conversion specifier {}", other),
                                location,
                            ))
                        }
                        None => value,
                    };
                    out.push_str(&self.format_value(&value, spec, location)?);
                }
                c => out.push(c),
            }
        }
        Ok(out)
    }
}

fn positional(args: &[Value], index: usize, location: SourceLocation) -> Result<Value, RuntimeError> {
    args.get(index).cloned().ok_or_else(|| {
        RuntimeError::index_error(
            format!(
                "Replacement index {} out of range for positional args tuple",
                index
            ),
            location,
        )
    })
}

fn unknown_code(kind: Option<char>, value: &Value, location: SourceLocation) -> RuntimeError {
    RuntimeError::value_error(
        format!(
            "Unknown format code '{}' for object of type '{}'",
            kind.unwrap_or(' '),
            value.type_name()
        ),
        location,
    )
}

fn format_int(
    n: &BigInt,
    spec: &FormatSpec,
    value: &Value,
    location: SourceLocation,
) -> Result<String, RuntimeError> {
    if spec.precision.is_some() {
        return Err(RuntimeError::value_error(
            "Precision not allowed in integer format specifier",
            location,
        ));
    }
    let magnitude = n.magnitude();
    let (digits, prefix) = match spec.kind {
        None | Some('d') | Some('n') => (magnitude.to_string(), ""),
        Some('b') => (format!("{:b}", magnitude), "0b"),
        Some('o') => (format!("{:o}", magnitude), "0o"),
        Some('x') => (format!("{:x}", magnitude), "0x"),
        Some('X') => (format!("{:X}", magnitude), "0X"),
        Some('c') => {
            let c = n.to_u32().and_then(char::from_u32).ok_or_else(|| {
                RuntimeError::raise(
                    ExceptionKind::OverflowError,
                    "%c arg not in range(0x110000)",
                    location,
                )
            })?;
            return Ok(spec.pad("", &c.to_string(), '<'));
        }
        other => return Err(unknown_code(other, value, location)),
    };

    let digits = match spec.grouping {
        Some(separator) => group_digits(&digits, separator),
        None => digits,
    };
    let sign = spec.sign_for(n.sign() == Sign::Minus);
    let sign = if spec.alternate {
        format!("{}{}", sign, prefix)
    } else {
        sign.to_string()
    };
    Ok(spec.pad(&sign, &digits, '>'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::OutputCapture;

    fn fmt(value: Value, spec: &str) -> String {
        let mut output = OutputCapture::new();
        let interpreter = Interpreter::new(&mut output);
        interpreter
            .format_value(&value, spec, SourceLocation::default())
            .unwrap()
    }

    #[test]
    fn test_float_specs() {
        assert_eq!(fmt(Value::Float(3.14159), ".2f"), "3.14");
        assert_eq!(fmt(Value::Float(3.14159), "8.3f"), "   3.142");
        assert_eq!(fmt(Value::Float(-2.5), "+.1f"), "-2.5");
        assert_eq!(fmt(Value::Float(12345.678), ",.1f"), "12,345.7");
        assert_eq!(fmt(Value::Float(0.25), ".0%"), "25%");
        assert_eq!(fmt(Value::Float(1234.5), ".2e"), "1.23e+03");
        assert_eq!(fmt(Value::Float(0.0001), "g"), "0.0001");
        assert_eq!(fmt(Value::Float(2.0), ".3"), "2.0");
    }

    #[test]
    fn test_int_specs() {
        assert_eq!(fmt(Value::Int(42), "5d"), "   42");
        assert_eq!(fmt(Value::Int(42), "<5"), "42   ");
        assert_eq!(fmt(Value::Int(42), "^6"), "  42  ");
        assert_eq!(fmt(Value::Int(-42), "05"), "-0042");
        assert_eq!(fmt(Value::Int(255), "#x"), "0xff");
        assert_eq!(fmt(Value::Int(1234567), ","), "1,234,567");
        assert_eq!(fmt(Value::Int(5), "b"), "101");
        assert_eq!(fmt(Value::Int(3), ".1f"), "3.0");
        let big = Value::from_bigint(BigInt::from(u64::MAX) + 1u32);
        assert_eq!(fmt(big.clone(), "x"), "10000000000000000");
        assert_eq!(fmt(big, ","), "18,446,744,073,709,551,616");
    }

    #[test]
    fn test_string_specs() {
        assert_eq!(fmt(Value::from("ab"), ">4"), "  ab");
        assert_eq!(fmt(Value::from("ab"), "*^6"), "**ab**");
        assert_eq!(fmt(Value::from("abcdef"), ".3"), "abc");
        assert_eq!(fmt(Value::from("x"), ""), "x");
    }

    #[test]
    fn test_percent_format() {
        let mut output = OutputCapture::new();
        let interpreter = Interpreter::new(&mut output);
        let loc = SourceLocation::default();
        let args = Value::new_tuple(vec![Value::from("a"), Value::Int(3), Value::Float(0.5)]);
        assert_eq!(
            interpreter.percent_format("%s=%d (%.2f) 100%%", &args, loc).unwrap(),
            "a=3 (0.50) 100%"
        );
        assert_eq!(
            interpreter.percent_format("%5s|%-3d|", &Value::new_tuple(vec![Value::from("x"), Value::Int(7)]), loc).unwrap(),
            "    x|7  |"
        );
        let err = interpreter.percent_format("%d %d", &Value::Int(1), loc).unwrap_err();
        assert_eq!(err.to_string(), "not enough arguments for format string");
        let err = interpreter.percent_format("%d", &Value::new_tuple(vec![Value::Int(1), Value::Int(2)]), loc).unwrap_err();
        assert_eq!(err.to_string(), "not all arguments converted during string formatting");
    }

    #[test]
    fn test_str_format() {
        let mut output = OutputCapture::new();
        let interpreter = Interpreter::new(&mut output);
        let loc = SourceLocation::default();
        let args = [Value::Int(1), Value::from("b")];
        let kwargs = [("name".to_string(), Value::from("z"))];
        assert_eq!(
            interpreter.str_format("{} {!r} {name:>3} {{}}", &args, &kwargs, loc).unwrap(),
            "1 'b'   z {}"
        );
        assert_eq!(interpreter.str_format("{1}{0}", &args, &[], loc).unwrap(), "b1");
        let err = interpreter.str_format("{2}", &args, &[], loc).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Replacement index 2 out of range for positional args tuple"
        );
    }
}
