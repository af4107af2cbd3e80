// fortnml/src/lib.rs

//! # fortnml
//!
//! Reading, writing and patching of Fortran namelist files.
//!
//! This crate provides:
//! - Parsing of namelist groups (`&name ... /`, or `$name ... $end`) into
//!   ordered, case-insensitive [`Namelist`] maps
//! - Array subscripts with strides, multidimensional arrays in column- or
//!   row-major order, derived types and arrays of derived types
//! - Repeated groups (cogroups), kept in file order
//! - Writing with configurable layout: column width, indentation, float
//!   format, logical representation and repeat counters
//! - Patching of an existing file, where only the patched values change and
//!   every comment and blank survives

pub mod error;
pub mod findex;
pub mod fortran_types;
pub mod namelist;
pub mod parser;
pub mod scanner;

pub use error::{ErrorKind, FortnmlError, Result};
pub use findex::{FIndex, IndexBound};
pub use fortran_types::FortranValue;
pub use namelist::{Cogroup, CogroupMut, FormatOptions, Namelist};
pub use parser::Parser;

use std::io::{Read, Write};
use std::path::Path;

/// Parse a namelist file with the default parser settings.
///
/// # Examples
///
/// ```no_run
/// # fn main() -> Result<(), fortnml::FortnmlError> {
/// let nml = fortnml::read("param.nml")?;
/// if let Some(core) = nml.group("core") {
///     println!("dt = {:?}", core.get("dt"));
/// }
/// # Ok(())
/// # }
/// ```
pub fn read<P: AsRef<Path>>(path: P) -> Result<Namelist> {
    Parser::new().read(path)
}

/// Parse namelist text from any reader with the default parser settings.
pub fn read_from<R: Read>(reader: R) -> Result<Namelist> {
    Parser::new().read_from(reader)
}

/// Parse namelist text with the default parser settings.
///
/// # Examples
///
/// ```
/// # use fortnml::FortranValue;
/// # fn main() -> Result<(), fortnml::FortnmlError> {
/// let nml = fortnml::reads("&data_nml x=1 y=2.0 z=.true. /")?;
/// let group = nml.group("data_nml").unwrap();
///
/// assert_eq!(group.get("x"), Some(&FortranValue::Integer(1)));
/// assert_eq!(group.get("z"), Some(&FortranValue::Logical(true)));
/// # Ok(())
/// # }
/// ```
pub fn reads(text: &str) -> Result<Namelist> {
    Parser::new().reads(text)
}

/// Options for writing namelist files.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Overwrite the target file if it exists
    pub force: bool,
    /// Write groups and variables in alphabetical order
    pub sort: bool,
}

/// Write a namelist to a new file.
///
/// Fails with [`FortnmlError::FileExists`] if the file is already there;
/// use [`write_with_options`] to overwrite it.
///
/// # Examples
///
/// ```no_run
/// # use fortnml::Namelist;
/// # fn main() -> Result<(), fortnml::FortnmlError> {
/// let mut grp = Namelist::new();
/// grp.set("rnday", 30.0).set("dt", 100.0);
///
/// let mut nml = Namelist::new();
/// nml.set("core", grp);
/// fortnml::write(&nml, "param.nml")?;
/// # Ok(())
/// # }
/// ```
pub fn write<P: AsRef<Path>>(nml: &Namelist, path: P) -> Result<()> {
    write_with_options(nml, path, &WriteOptions::default())
}

/// Write a namelist to a file with custom options.
pub fn write_with_options<P: AsRef<Path>>(
    nml: &Namelist,
    path: P,
    options: &WriteOptions,
) -> Result<()> {
    nml.write(path, options.force, options.sort)
}

/// Write a namelist to any writer.
pub fn write_to_writer<W: Write>(nml: &Namelist, writer: W, sort: bool) -> Result<()> {
    nml.write_to(writer, sort)
}

/// Apply `patch` to the namelist file `source`.
///
/// The patched text goes to `dest`, or to `source` with a trailing `~` when
/// no destination is given. Only the patched values are rewritten; comments,
/// blanks and the layout of everything else are copied unchanged. Variables
/// the file does not assign are added at the end of their group.
///
/// Returns the contents of the file with the patch applied.
///
/// # Examples
///
/// ```no_run
/// # use fortnml::Namelist;
/// # fn main() -> Result<(), fortnml::FortnmlError> {
/// let mut core = Namelist::new();
/// core.set("dt", 150.0);
/// let mut patch = Namelist::new();
/// patch.set("core", core);
///
/// fortnml::patch("param.nml", &patch, Some("param.patched.nml"))?;
/// # Ok(())
/// # }
/// ```
pub fn patch<P1, P2>(source: P1, patch: &Namelist, dest: Option<P2>) -> Result<Namelist>
where
    P1: AsRef<Path>,
    P2: AsRef<Path>,
{
    let dest = dest.as_ref().map(|d| d.as_ref());
    Parser::new().patch(source.as_ref(), patch, dest)
}

/// Apply `patch` to namelist text and write the patched text to `writer`.
///
/// # Examples
///
/// ```
/// # use fortnml::Namelist;
/// # fn main() -> Result<(), fortnml::FortnmlError> {
/// let mut grp = Namelist::new();
/// grp.set("x", 42);
/// let mut patch = Namelist::new();
/// patch.set("data_nml", grp);
///
/// let mut output = Vec::new();
/// fortnml::patch_to_writer("&data_nml x=1 y=2.0 /", &patch, &mut output)?;
///
/// assert_eq!(String::from_utf8_lossy(&output), "&data_nml x=42 y=2.0 /");
/// # Ok(())
/// # }
/// ```
pub fn patch_to_writer<W: Write>(text: &str, patch: &Namelist, writer: W) -> Result<Namelist> {
    Parser::new().patch_to_writer(text, patch, writer)
}
