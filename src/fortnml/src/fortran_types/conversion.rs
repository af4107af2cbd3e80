// fortnml/src/fortran_types/conversion.rs

//! Conversions between Rust values and FortranValue.

use super::value::FortranValue;
use crate::namelist::Namelist;

impl From<i32> for FortranValue {
    fn from(value: i32) -> Self {
        FortranValue::Integer(value as i64)
    }
}

impl From<i64> for FortranValue {
    fn from(value: i64) -> Self {
        FortranValue::Integer(value)
    }
}

impl From<f64> for FortranValue {
    fn from(value: f64) -> Self {
        FortranValue::Real(value)
    }
}

impl From<f32> for FortranValue {
    fn from(value: f32) -> Self {
        FortranValue::Real(value as f64)
    }
}

impl From<bool> for FortranValue {
    fn from(value: bool) -> Self {
        FortranValue::Logical(value)
    }
}

impl From<String> for FortranValue {
    fn from(value: String) -> Self {
        FortranValue::Character(value)
    }
}

impl From<&str> for FortranValue {
    fn from(value: &str) -> Self {
        FortranValue::Character(value.to_string())
    }
}

/// Complex value from a `(re, im)` pair.
impl From<(f64, f64)> for FortranValue {
    fn from((re, im): (f64, f64)) -> Self {
        FortranValue::Complex(re, im)
    }
}

impl From<Namelist> for FortranValue {
    fn from(value: Namelist) -> Self {
        FortranValue::Derived(value)
    }
}

/// `None` becomes a null value.
impl<T: Into<FortranValue>> From<Option<T>> for FortranValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FortranValue::Null, Into::into)
    }
}

impl<T: Into<FortranValue>> From<Vec<T>> for FortranValue {
    fn from(values: Vec<T>) -> Self {
        FortranValue::from_elements(values.into_iter().map(Into::into).collect())
    }
}

impl TryFrom<&FortranValue> for i64 {
    type Error = &'static str;

    fn try_from(value: &FortranValue) -> std::result::Result<Self, Self::Error> {
        value.as_i64().ok_or("value is not an integer")
    }
}

impl TryFrom<&FortranValue> for f64 {
    type Error = &'static str;

    fn try_from(value: &FortranValue) -> std::result::Result<Self, Self::Error> {
        value.as_f64().ok_or("value is not numeric")
    }
}

impl TryFrom<&FortranValue> for bool {
    type Error = &'static str;

    fn try_from(value: &FortranValue) -> std::result::Result<Self, Self::Error> {
        value.as_bool().ok_or("value is not a logical")
    }
}

impl TryFrom<&FortranValue> for String {
    type Error = &'static str;

    fn try_from(value: &FortranValue) -> std::result::Result<Self, Self::Error> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or("value is not a character string")
    }
}
