// fortnml/src/scanner/token.rs

//! Token types and structures for Fortran namelist lexical analysis.

use std::fmt;

/// A token in the Fortran namelist.
///
/// The lexeme always holds the exact source text, so concatenating the
/// lexemes of a scanned file reproduces the file byte for byte.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    /// Line number (1-based) where the token starts.
    pub line: usize,
}

impl Token {
    pub fn new<S: Into<String>>(kind: TokenKind, lexeme: S, line: usize) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            line,
        }
    }

    /// Whitespace, comments and line breaks carry no meaning for the parser.
    pub fn is_padding(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Whitespace | TokenKind::Comment | TokenKind::Newline
        )
    }

    /// True for a quote-delimited string literal.
    pub fn is_quoted(&self) -> bool {
        self.kind == TokenKind::Str
    }

    /// True if this is the punctuation character `c`.
    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct && self.lexeme.starts_with(c)
    }

    /// Group terminators: `/`, or a closing `&` or `$`.
    pub fn is_terminator(&self) -> bool {
        self.is_punct('/') || self.is_punct('&') || self.is_punct('$')
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?})", self.kind, self.lexeme)
    }
}

/// Types of tokens that can appear in a Fortran namelist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Run of blanks, tabs or carriage returns
    Whitespace,
    /// Comment up to the end of the line, or text outside of any group
    Comment,
    /// End of a source line; empty when the input has no final newline
    Newline,
    /// Identifier, keyword or non-delimited string
    Name,
    /// Integer or real literal, possibly signed or with a kind suffix
    Number,
    /// Signed IEEE special value such as `-inf` or `+nan`
    Ieee,
    /// Quote-delimited string, possibly spanning several lines
    Str,
    /// Dotted word such as `.true.`
    DotWord,
    /// A single punctuation character
    Punct,
}
