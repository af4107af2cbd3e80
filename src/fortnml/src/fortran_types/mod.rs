// fortnml/src/fortran_types/mod.rs

//! Fortran data types, literal recasting and literal formatting.

pub mod conversion;
pub mod formatting;
pub mod parsing;
pub mod value;

pub use formatting::{quote_character, FloatFormat};
pub use parsing::{
    parse_character, parse_complex, parse_integer, parse_literal, parse_logical, parse_real,
};
pub use value::FortranValue;
