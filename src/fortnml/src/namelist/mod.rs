// fortnml/src/namelist/mod.rs

//! The in-memory namelist model.
//!
//! A [`Namelist`] is an insertion-ordered, case-insensitive map which also
//! carries array start indices and output formatting properties. Groups,
//! derived types and the top-level file all share this one type.

pub mod cogroup;
pub mod core;
pub mod formatting;
pub mod patching;
pub mod writer;

pub use self::core::Namelist;
pub use cogroup::{Cogroup, CogroupMut};
pub use formatting::FormatOptions;
pub use patching::{merge_lists, merge_namelists, merge_values};
