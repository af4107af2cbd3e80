// fortnml/src/fortran_types/parsing.rs

//! Recasting of literal text into Fortran values.
//!
//! Literal types are never declared in a namelist, so each value token is
//! tried as an integer, a real, a logical and finally a string, in that
//! order. Complex values are assembled by the parser from their two parts.

use super::value::FortranValue;
use crate::scanner::unquote;

/// Recast a literal token into the first type it parses as.
pub fn parse_literal(text: &str, strict_logical: bool) -> FortranValue {
    if text.starts_with('\'') || text.starts_with('"') {
        return FortranValue::Character(parse_character(text));
    }

    if let Some(i) = parse_integer(text) {
        return FortranValue::Integer(i);
    }
    if let Some(r) = parse_real(text) {
        return FortranValue::Real(r);
    }
    if let Some(b) = parse_logical(text, strict_logical) {
        return FortranValue::Logical(b);
    }
    FortranValue::Character(parse_character(text))
}

/// Strip a `_kind` suffix such as `_8` or `_dp` from a numeric literal.
fn strip_kind(text: &str) -> &str {
    match text.split_once('_') {
        Some((number, kind)) if !kind.is_empty() && kind.chars().all(char::is_alphanumeric) => {
            number
        }
        _ => text,
    }
}

/// Parse a (possibly signed, possibly kinded) integer literal.
pub fn parse_integer(text: &str) -> Option<i64> {
    strip_kind(text).parse::<i64>().ok()
}

/// Parse a Fortran real literal.
///
/// Accepts `d`/`D` exponent markers and the exponent-letter-free form
/// `1.0-5`, which Fortran reads as `1.0e-5`.
pub fn parse_real(text: &str) -> Option<f64> {
    let lowered = strip_kind(text).to_lowercase().replace('d', "e");
    let mut normalized = String::with_capacity(lowered.len() + 1);
    let mut prev: Option<char> = None;
    for (i, c) in lowered.chars().enumerate() {
        if (c == '+' || c == '-') && i > 0 && prev != Some('e') {
            normalized.push('e');
        }
        normalized.push(c);
        prev = Some(c);
    }
    normalized.parse::<f64>().ok()
}

/// Parse the two parts of a complex literal `(re, im)`.
pub fn parse_complex(re: &str, im: &str) -> Option<(f64, f64)> {
    Some((parse_real(re)?, parse_real(im)?))
}

/// Parse a logical literal.
///
/// Strict parsing accepts `.true.`, `.t.`, `true` and `t` (and the false
/// forms) only. Otherwise the first letter after an optional leading `.`
/// decides, as most compilers do.
pub fn parse_logical(text: &str, strict: bool) -> Option<bool> {
    let lowered = text.to_lowercase();
    let word = if strict {
        lowered.as_str()
    } else {
        let body = lowered.strip_prefix('.').unwrap_or(&lowered);
        body.get(..1)?
    };

    match word {
        ".true." | ".t." | "true" | "t" => Some(true),
        ".false." | ".f." | "false" | "f" => Some(false),
        _ => None,
    }
}

/// Parse a character value, removing delimiters if present.
pub fn parse_character(text: &str) -> String {
    unquote(text)
}
