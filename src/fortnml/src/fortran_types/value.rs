// fortnml/src/fortran_types/value.rs

//! Core FortranValue enum and basic operations.

use crate::namelist::Namelist;
use serde::Serialize;

/// Represents a Fortran value that can appear in a namelist.
///
/// Multidimensional arrays are nested `Array`s, outermost Fortran axis
/// first, so `v(i, j)` lives at `v[j][i]` unless a row-major read was
/// requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FortranValue {
    Integer(i64),
    Real(f64),
    /// Complex value (real, imaginary)
    Complex(f64, f64),
    Logical(bool),
    Character(String),
    /// Unset value, written as an empty field
    Null,
    Array(Vec<FortranValue>),
    /// Derived type
    Derived(Namelist),
    /// Array of derived types; `None` marks an element never assigned
    DerivedArray(Vec<Option<Namelist>>),
}

impl FortranValue {
    pub fn character<S: Into<String>>(value: S) -> Self {
        FortranValue::Character(value.into())
    }

    /// Get the type name as a string.
    pub fn type_name(&self) -> &'static str {
        match self {
            FortranValue::Integer(_) => "integer",
            FortranValue::Real(_) => "real",
            FortranValue::Complex(_, _) => "complex",
            FortranValue::Logical(_) => "logical",
            FortranValue::Character(_) => "character",
            FortranValue::Null => "null",
            FortranValue::Array(_) => "array",
            FortranValue::Derived(_) => "derived_type",
            FortranValue::DerivedArray(_) => "derived_type_array",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FortranValue::Null)
    }

    /// True for both plain arrays and arrays of derived types.
    pub fn is_array(&self) -> bool {
        matches!(self, FortranValue::Array(_) | FortranValue::DerivedArray(_))
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FortranValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Reals, and integers widened to reals.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FortranValue::Real(r) => Some(*r),
            FortranValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FortranValue::Logical(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FortranValue::Character(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[FortranValue]> {
        match self {
            FortranValue::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_namelist(&self) -> Option<&Namelist> {
        match self {
            FortranValue::Derived(nml) => Some(nml),
            _ => None,
        }
    }

    pub fn as_namelist_mut(&mut self) -> Option<&mut Namelist> {
        match self {
            FortranValue::Derived(nml) => Some(nml),
            _ => None,
        }
    }

    /// True for an array whose elements are arrays or nulls, i.e. one that
    /// carries a further dimension.
    pub fn is_multidimensional(&self) -> bool {
        match self {
            FortranValue::Array(values) => {
                values.iter().any(|v| matches!(v, FortranValue::Array(_)))
                    && values
                        .iter()
                        .all(|v| matches!(v, FortranValue::Array(_) | FortranValue::Null))
            }
            _ => false,
        }
    }

    /// Unwrap a sequence into its elements; a scalar becomes a single element.
    pub fn into_elements(self) -> Vec<FortranValue> {
        match self {
            FortranValue::Array(values) => values,
            FortranValue::DerivedArray(items) => items
                .into_iter()
                .map(|item| item.map_or(FortranValue::Null, FortranValue::Derived))
                .collect(),
            other => vec![other],
        }
    }

    /// Build a sequence, promoting a list of derived types (and nulls) to
    /// [`FortranValue::DerivedArray`].
    pub fn from_elements(values: Vec<FortranValue>) -> Self {
        let has_derived = values.iter().any(|v| matches!(v, FortranValue::Derived(_)));
        let only_derived = values
            .iter()
            .all(|v| matches!(v, FortranValue::Derived(_) | FortranValue::Null));

        if has_derived && only_derived {
            FortranValue::DerivedArray(
                values
                    .into_iter()
                    .map(|v| match v {
                        FortranValue::Derived(nml) => Some(nml),
                        _ => None,
                    })
                    .collect(),
            )
        } else {
            FortranValue::Array(values)
        }
    }

    /// Collapse an empty list to null and a one-element list to its element.
    pub fn delist(mut values: Vec<FortranValue>) -> Self {
        match values.len() {
            0 => FortranValue::Null,
            1 => values.remove(0),
            _ => FortranValue::from_elements(values),
        }
    }

    /// Recursively promote arrays of derived types to `DerivedArray`.
    pub fn normalize(self) -> Self {
        match self {
            FortranValue::Array(values) => FortranValue::from_elements(
                values.into_iter().map(FortranValue::normalize).collect(),
            ),
            other => other,
        }
    }

    /// Elements in Fortran storage order, descending through nested arrays.
    pub fn flatten(&self) -> Vec<FortranValue> {
        match self {
            FortranValue::Array(values) => values.iter().flat_map(FortranValue::flatten).collect(),
            other => vec![other.clone()],
        }
    }
}
