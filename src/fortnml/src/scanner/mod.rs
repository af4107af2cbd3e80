// fortnml/src/scanner/mod.rs

//! Lexical scanner for Fortran namelist files.
//!
//! Tokenization runs line by line. The scanner keeps every byte of the
//! input (whitespace and comments included) so that patch mode can copy the
//! untouched parts of a file verbatim.

pub mod lexer;
pub mod scanner;
pub mod token;

pub use lexer::Lexer;
pub use scanner::{unquote, Scanner};
pub use token::{Token, TokenKind};

use crate::error::Result;

/// Convenience function to scan a string with the default comment token.
pub fn scan(input: &str) -> Result<Vec<Token>> {
    Scanner::new().scan_all(input)
}
