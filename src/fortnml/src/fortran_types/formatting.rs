// fortnml/src/fortran_types/formatting.rs

//! Literal formatting of scalar values.
//!
//! Floats are formatted with a small subset of the Python format
//! mini-language (`[[fill]align][sign][0][width][.precision][type]`), which
//! is the notation namelist users already know from `f90nml`-style tools.

use crate::error::{FortnmlError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
    /// Pad between the sign and the digits.
    SignAware,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sign {
    Minus,
    Plus,
    Space,
}

/// A parsed floating point format specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloatFormat {
    spec: String,
    fill: char,
    align: Option<Align>,
    sign: Sign,
    width: usize,
    precision: Option<usize>,
    kind: Option<char>,
}

impl Default for FloatFormat {
    fn default() -> Self {
        Self {
            spec: String::new(),
            fill: ' ',
            align: None,
            sign: Sign::Minus,
            width: 0,
            precision: None,
            kind: None,
        }
    }
}

fn align_of(c: char) -> Option<Align> {
    match c {
        '<' => Some(Align::Left),
        '>' => Some(Align::Right),
        '^' => Some(Align::Center),
        '=' => Some(Align::SignAware),
        _ => None,
    }
}

impl FloatFormat {
    /// Parse a format specification. The empty string selects the shortest
    /// representation that reads back to the same value.
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = |message: &str| FortnmlError::InvalidFormat {
            format: spec.to_string(),
            message: message.to_string(),
        };

        let chars: Vec<char> = spec.chars().collect();
        let mut fmt = FloatFormat {
            spec: spec.to_string(),
            ..FloatFormat::default()
        };
        let mut idx = 0;

        if chars.len() >= 2 && align_of(chars[1]).is_some() {
            fmt.fill = chars[0];
            fmt.align = align_of(chars[1]);
            idx = 2;
        } else if let Some(align) = chars.first().copied().and_then(align_of) {
            fmt.align = Some(align);
            idx = 1;
        }

        match chars.get(idx) {
            Some('+') => {
                fmt.sign = Sign::Plus;
                idx += 1;
            }
            Some(' ') => {
                fmt.sign = Sign::Space;
                idx += 1;
            }
            Some('-') => idx += 1,
            _ => {}
        }

        if chars.get(idx) == Some(&'0') {
            if fmt.align.is_none() {
                fmt.fill = '0';
                fmt.align = Some(Align::SignAware);
            }
            idx += 1;
        }

        let width_start = idx;
        while chars.get(idx).is_some_and(char::is_ascii_digit) {
            idx += 1;
        }
        if idx > width_start {
            let digits: String = chars[width_start..idx].iter().collect();
            fmt.width = digits.parse().map_err(|_| invalid("width is too large"))?;
        }

        if chars.get(idx) == Some(&'.') {
            idx += 1;
            let prec_start = idx;
            while chars.get(idx).is_some_and(char::is_ascii_digit) {
                idx += 1;
            }
            if idx == prec_start {
                return Err(invalid("format specifier missing precision"));
            }
            let digits: String = chars[prec_start..idx].iter().collect();
            fmt.precision = Some(digits.parse().map_err(|_| invalid("precision is too large"))?);
        }

        if let Some(&c) = chars.get(idx) {
            if !"eEfFgG%".contains(c) {
                return Err(invalid(&format!("unknown format code '{}' for float", c)));
            }
            fmt.kind = Some(c);
            idx += 1;
        }

        if idx != chars.len() {
            return Err(invalid("invalid format specifier"));
        }

        Ok(fmt)
    }

    /// The specification this format was parsed from.
    pub fn spec(&self) -> &str {
        &self.spec
    }

    pub fn format(&self, value: f64) -> String {
        let (negative, body) = self.format_magnitude(value);
        let sign = match (negative, self.sign) {
            (true, _) => "-",
            (false, Sign::Plus) => "+",
            (false, Sign::Space) => " ",
            (false, Sign::Minus) => "",
        };

        let len = sign.chars().count() + body.chars().count();
        if len >= self.width {
            return format!("{}{}", sign, body);
        }

        let pad = self.width - len;
        let fill = |n: usize| self.fill.to_string().repeat(n);
        match self.align.unwrap_or(Align::Right) {
            Align::Left => format!("{}{}{}", sign, body, fill(pad)),
            Align::Right => format!("{}{}{}", fill(pad), sign, body),
            Align::Center => format!("{}{}{}{}", fill(pad / 2), sign, body, fill(pad - pad / 2)),
            Align::SignAware => format!("{}{}{}", sign, fill(pad), body),
        }
    }

    /// Format `|value|`, returning whether a minus sign is needed.
    fn format_magnitude(&self, value: f64) -> (bool, String) {
        let negative = value.is_sign_negative() && !value.is_nan();
        let x = value.abs();
        let upper = matches!(self.kind, Some('E' | 'F' | 'G'));

        if !x.is_finite() {
            let word = if x.is_nan() { "nan" } else { "inf" };
            let word = if upper { word.to_uppercase() } else { word.to_string() };
            let word = if self.kind == Some('%') { word + "%" } else { word };
            return (negative, word);
        }

        let body = match (self.kind, self.precision) {
            (Some('f' | 'F'), p) => format!("{:.*}", p.unwrap_or(6), x),
            (Some('e' | 'E'), p) => exponential(x, p.unwrap_or(6)),
            (Some('g' | 'G'), p) => general(x, p.unwrap_or(6), false),
            (Some('%'), p) => format!("{:.*}%", p.unwrap_or(6), x * 100.0),
            (_, Some(p)) => general(x, p, true),
            (_, None) => repr(x),
        };

        let body = if upper { body.to_uppercase() } else { body };
        (negative, body)
    }
}

/// Scientific notation with a signed, at least two-digit exponent.
fn exponential(x: f64, precision: usize) -> String {
    let raw = format!("{:.*e}", precision, x);
    fix_exponent(&raw)
}

/// Rewrite Rust's `1.5e-7` exponent style as `1.5e-07`.
fn fix_exponent(raw: &str) -> String {
    match raw.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        None => raw.to_string(),
    }
}

/// General format: fixed or scientific depending on the exponent, with
/// insignificant trailing zeros removed.
fn general(x: f64, precision: usize, keep_point: bool) -> String {
    let p = precision.max(1);
    let sci = format!("{:.*e}", p - 1, x);
    let exp: i64 = sci
        .split_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0);

    if exp >= -4 && exp < p as i64 {
        let decimals = (p as i64 - 1 - exp).max(0) as usize;
        let fixed = strip_zeros(&format!("{:.*}", decimals, x));
        if keep_point && !fixed.contains('.') {
            fixed + ".0"
        } else {
            fixed
        }
    } else {
        let (mantissa, _) = sci.split_once('e').unwrap_or((&sci, ""));
        fix_exponent(&format!("{}e{}", strip_zeros(mantissa), exp))
    }
}

fn strip_zeros(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}

/// Shortest round-trip representation, `1e-05` style for small and large
/// magnitudes.
fn repr(x: f64) -> String {
    fix_exponent(&format!("{:?}", x))
}

/// Quote a character value.
///
/// Apostrophes are preferred. A value containing an apostrophe but no
/// double quote is wrapped in double quotes instead; otherwise embedded
/// apostrophes are doubled.
pub fn quote_character(value: &str) -> String {
    if value.contains('\'') && !value.contains('"') {
        format!("\"{}\"", value)
    } else {
        format!("'{}'", value.replace('\'', "''"))
    }
}
