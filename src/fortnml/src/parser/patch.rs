// fortnml/src/parser/patch.rs

//! Output side of patch mode.
//!
//! While the parser reads a file it records edits against the positions of
//! the scanned tokens. Rendering copies every token that no edit touches
//! verbatim, so whitespace, comments and quoting outside the changed values
//! survive byte for byte.

use crate::scanner::{Token, TokenKind};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Edit {
    /// Replace the tokens in `start..end` with new text. An empty range
    /// inserts the text ahead of `start`.
    Replace {
        start: usize,
        end: usize,
        text: String,
    },
    /// Drop the tokens in `start..end`, keeping any comments in the range.
    Remove { start: usize, end: usize },
    /// Insert text ahead of token `at`.
    Insert { at: usize, text: String },
}

impl Edit {
    fn start(&self) -> usize {
        match self {
            Edit::Replace { start, .. } | Edit::Remove { start, .. } => *start,
            Edit::Insert { at, .. } => *at,
        }
    }
}

/// Collects edits over a token list and renders the patched text.
pub(crate) struct PatchWriter<'a> {
    tokens: &'a [Token],
    edits: Vec<Edit>,
}

impl<'a> PatchWriter<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            edits: Vec::new(),
        }
    }

    pub fn replace(&mut self, start: usize, end: usize, text: String) {
        self.edits.push(Edit::Replace { start, end, text });
    }

    pub fn remove(&mut self, start: usize, end: usize) {
        if start < end {
            self.edits.push(Edit::Remove { start, end });
        }
    }

    pub fn insert(&mut self, at: usize, text: String) {
        self.edits.push(Edit::Insert { at, text });
    }

    /// Apply the edits in source order. Edits at the same position apply in
    /// the order they were recorded.
    pub fn render(mut self) -> String {
        self.edits.sort_by_key(Edit::start);

        let mut out = String::new();
        let mut pos = 0;
        for edit in &self.edits {
            let start = edit.start().clamp(pos, self.tokens.len());
            self.copy(&mut out, pos, start);
            pos = start;

            match edit {
                Edit::Replace { end, text, .. } => {
                    out.push_str(text);
                    pos = (*end).clamp(pos, self.tokens.len());
                }
                Edit::Remove { end, .. } => {
                    let end = (*end).clamp(pos, self.tokens.len());
                    self.keep_comments(&mut out, pos, end);
                    pos = if out.ends_with('\n') {
                        self.skip_blank_line(end)
                    } else {
                        end
                    };
                }
                Edit::Insert { text, .. } => out.push_str(text),
            }
        }
        self.copy(&mut out, pos, self.tokens.len());
        out
    }

    fn copy(&self, out: &mut String, start: usize, end: usize) {
        for token in &self.tokens[start..end] {
            out.push_str(&token.lexeme);
        }
    }

    /// Position past the rest of a line that holds only blanks from `start`,
    /// or `start` itself if anything else remains on the line.
    fn skip_blank_line(&self, start: usize) -> usize {
        let mut idx = start;
        while idx < self.tokens.len() && self.tokens[idx].kind == TokenKind::Whitespace {
            idx += 1;
        }
        match self.tokens.get(idx) {
            Some(token) if token.kind == TokenKind::Newline => idx + 1,
            _ => start,
        }
    }

    /// Copy the comments of a removed range with their leading blanks and
    /// line breaks.
    fn keep_comments(&self, out: &mut String, start: usize, end: usize) {
        let range = &self.tokens[start..end];
        for (i, token) in range.iter().enumerate() {
            let keep = match token.kind {
                TokenKind::Comment => true,
                TokenKind::Whitespace => range
                    .get(i + 1)
                    .is_some_and(|next| next.kind == TokenKind::Comment),
                TokenKind::Newline => i > 0 && range[i - 1].kind == TokenKind::Comment,
                _ => false,
            };
            if keep {
                out.push_str(&token.lexeme);
            }
        }
    }
}
