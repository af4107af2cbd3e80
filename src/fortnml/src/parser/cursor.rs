// fortnml/src/parser/cursor.rs

//! Read cursor over the significant tokens of a scanned file.

use crate::scanner::{Token, TokenKind};

/// Walks the non-padding tokens of a file while keeping their positions in
/// the full token list, so edits can be expressed against the original text.
pub(crate) struct TokenCursor<'a> {
    tokens: &'a [Token],
    significant: Vec<usize>,
    pos: usize,
}

impl<'a> TokenCursor<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        let significant = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.is_padding())
            .map(|(i, _)| i)
            .collect();
        Self {
            tokens,
            significant,
            pos: 0,
        }
    }

    /// The current token, or `None` at the end of the input.
    pub fn token(&self) -> Option<&'a Token> {
        self.nth(self.pos)
    }

    /// The token after the current one.
    pub fn peek(&self) -> Option<&'a Token> {
        self.nth(self.pos + 1)
    }

    fn nth(&self, pos: usize) -> Option<&'a Token> {
        self.significant.get(pos).map(|&i| &self.tokens[i])
    }

    pub fn advance(&mut self) {
        if self.pos < self.significant.len() {
            self.pos += 1;
        }
    }

    /// Position of the current token in the full token list.
    pub fn raw_index(&self) -> usize {
        self.significant
            .get(self.pos)
            .copied()
            .unwrap_or(self.tokens.len())
    }

    /// Position just past the previously consumed token.
    pub fn prior_end(&self) -> usize {
        match self.pos.checked_sub(1) {
            Some(prior) => self.significant[prior] + 1,
            None => 0,
        }
    }

    /// True if the raw token right after the previous one is the current
    /// token, with no whitespace or comment between them.
    pub fn is_adjacent(&self) -> bool {
        self.pos > 0 && self.prior_end() == self.raw_index()
    }

    /// Line of the current token, or of the last token at the end of input.
    pub fn line(&self) -> usize {
        self.token()
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    pub fn tokens(&self) -> &'a [Token] {
        self.tokens
    }

    /// True when the current token starts an assignment: a name followed by
    /// `=`, `(` or `%`.
    pub fn at_assignment(&self) -> bool {
        let is_name = self.token().is_some_and(|t| t.kind == TokenKind::Name);
        is_name
            && self
                .peek()
                .is_some_and(|t| t.is_punct('=') || t.is_punct('(') || t.is_punct('%'))
    }
}
