// fortnml/src/namelist/formatting.rs

//! Output formatting properties of a namelist.
//!
//! Every property is validated when it is set, so a namelist can always be
//! written once it has been configured.

use super::core::Namelist;
use crate::error::{FortnmlError, Result};
use crate::fortran_types::{quote_character, FloatFormat, FortranValue};

/// Formatting properties used when rendering values as Fortran text.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatOptions {
    pub(crate) column_width: usize,
    pub(crate) indent: String,
    pub(crate) end_comma: bool,
    pub(crate) uppercase: bool,
    pub(crate) float_format: FloatFormat,
    pub(crate) false_repr: String,
    pub(crate) true_repr: String,
    pub(crate) index_spacing: bool,
    pub(crate) repeat_counter: bool,
    pub(crate) split_strings: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            column_width: 72,
            indent: "    ".to_string(),
            end_comma: false,
            uppercase: false,
            float_format: FloatFormat::default(),
            false_repr: ".false.".to_string(),
            true_repr: ".true.".to_string(),
            index_spacing: false,
            repeat_counter: false,
            split_strings: false,
        }
    }
}

impl FormatOptions {
    /// Render a scalar as a Fortran literal. Null renders as an empty field.
    pub fn repr(&self, value: &FortranValue) -> String {
        match value {
            FortranValue::Integer(i) => i.to_string(),
            FortranValue::Real(r) => self.float_format.format(*r),
            FortranValue::Complex(re, im) => format!(
                "({}, {})",
                self.float_format.format(*re),
                self.float_format.format(*im)
            ),
            FortranValue::Logical(true) => self.true_repr.clone(),
            FortranValue::Logical(false) => self.false_repr.clone(),
            FortranValue::Character(s) => quote_character(s),
            FortranValue::Null => String::new(),
            FortranValue::Array(values) => values
                .iter()
                .map(|v| self.repr(v))
                .collect::<Vec<_>>()
                .join(", "),
            FortranValue::Derived(_) | FortranValue::DerivedArray(_) => String::new(),
        }
    }

    /// Render `count` repetitions of a value, as `N*value` when `count > 1`.
    pub fn repr_repeated(&self, value: &FortranValue, count: usize) -> String {
        if count > 1 {
            format!("{}*{}", count, self.repr(value))
        } else {
            self.repr(value)
        }
    }
}

fn validate_true(value: &str) -> Result<()> {
    let lower = value.to_lowercase();
    if lower.starts_with('t') || lower.starts_with(".t") {
        Ok(())
    } else {
        Err(FortnmlError::invalid_setting(
            "logical true representation",
            format!("'{}' must start with T or .T", value),
        ))
    }
}

fn validate_false(value: &str) -> Result<()> {
    let lower = value.to_lowercase();
    if lower.starts_with('f') || lower.starts_with(".f") {
        Ok(())
    } else {
        Err(FortnmlError::invalid_setting(
            "logical false representation",
            format!("'{}' must start with F or .F", value),
        ))
    }
}

impl Namelist {
    pub(crate) fn format_options(&self) -> &FormatOptions {
        &self.format
    }

    /// Maximum line width of the output (default 72).
    pub fn column_width(&self) -> usize {
        self.format.column_width
    }

    pub fn set_column_width(&mut self, width: i64) -> Result<()> {
        let width = usize::try_from(width).map_err(|_| {
            FortnmlError::invalid_setting("column width", "must be nonnegative")
        })?;
        self.format.column_width = width;
        Ok(())
    }

    /// Whitespace prepended to each variable line (default four spaces).
    pub fn indent(&self) -> &str {
        &self.format.indent
    }

    /// Set the indentation to an explicit whitespace string.
    pub fn set_indent(&mut self, indent: &str) -> Result<()> {
        if !indent.chars().all(char::is_whitespace) {
            return Err(FortnmlError::invalid_setting(
                "indent",
                "indentation must contain only whitespace",
            ));
        }
        self.format.indent = indent.to_string();
        Ok(())
    }

    /// Set the indentation to a number of spaces.
    pub fn set_indent_width(&mut self, width: i64) -> Result<()> {
        let width = usize::try_from(width)
            .map_err(|_| FortnmlError::invalid_setting("indent", "width must be nonnegative"))?;
        self.format.indent = " ".repeat(width);
        Ok(())
    }

    /// Whether every value, including the last, is followed by a comma.
    pub fn end_comma(&self) -> bool {
        self.format.end_comma
    }

    pub fn set_end_comma(&mut self, end_comma: bool) {
        self.format.end_comma = end_comma;
    }

    /// Whether group and variable names are written in upper case.
    pub fn uppercase(&self) -> bool {
        self.format.uppercase
    }

    pub fn set_uppercase(&mut self, uppercase: bool) {
        self.format.uppercase = uppercase;
    }

    pub fn float_format(&self) -> &str {
        self.format.float_format.spec()
    }

    /// Set the float format, e.g. `".3f"` or `"12.5e"`. An empty string
    /// restores the shortest round-trip form.
    pub fn set_float_format(&mut self, spec: &str) -> Result<()> {
        let fmt = FloatFormat::parse(spec)?;
        log::trace!("float format '{}' renders 1.23 as {}", spec, fmt.format(1.23));
        self.format.float_format = fmt;
        Ok(())
    }

    /// The `(false, true)` logical spellings.
    pub fn logical_repr(&self) -> (&str, &str) {
        (&self.format.false_repr, &self.format.true_repr)
    }

    pub fn set_logical_repr(&mut self, false_repr: &str, true_repr: &str) -> Result<()> {
        validate_false(false_repr)?;
        validate_true(true_repr)?;
        self.format.false_repr = false_repr.to_string();
        self.format.true_repr = true_repr.to_string();
        Ok(())
    }

    pub fn true_repr(&self) -> &str {
        &self.format.true_repr
    }

    pub fn set_true_repr(&mut self, repr: &str) -> Result<()> {
        validate_true(repr)?;
        self.format.true_repr = repr.to_string();
        Ok(())
    }

    pub fn false_repr(&self) -> &str {
        &self.format.false_repr
    }

    pub fn set_false_repr(&mut self, repr: &str) -> Result<()> {
        validate_false(repr)?;
        self.format.false_repr = repr.to_string();
        Ok(())
    }

    /// Whether multidimensional subscripts are written as `(:, 2)` rather
    /// than `(:,2)`.
    pub fn index_spacing(&self) -> bool {
        self.format.index_spacing
    }

    pub fn set_index_spacing(&mut self, spacing: bool) {
        self.format.index_spacing = spacing;
    }

    /// Whether runs of equal values are written as `N*value`.
    pub fn repeat_counter(&self) -> bool {
        self.format.repeat_counter
    }

    pub fn set_repeat_counter(&mut self, repeat: bool) {
        self.format.repeat_counter = repeat;
    }

    /// Whether long strings are split across lines to respect the column width.
    pub fn split_strings(&self) -> bool {
        self.format.split_strings
    }

    pub fn set_split_strings(&mut self, split: bool) {
        self.format.split_strings = split;
    }
}
