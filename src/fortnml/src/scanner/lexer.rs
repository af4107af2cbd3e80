// fortnml/src/scanner/lexer.rs

//! Line-level lexical analysis for Fortran namelist tokens.

use super::token::{Token, TokenKind};
use crate::error::{FortnmlError, Result};

/// Characters which always form a single-character token.
const PUNCTUATION: &str = "=+-*/\\()[]{},:;%&~<>?`|$#@";

const IEEE_WORDS: [&str; 3] = ["inf", "infinity", "nan"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupState {
    BeforeFirst,
    Inside(char),
    Between,
}

/// Tokenizer for one line of namelist text at a time.
///
/// The lexer is stateless between lines except for two things: where it
/// stands relative to the namelist groups, and the delimiter of a string which
/// ran into the end of the previous line. Text ahead of the first group is a
/// comment.
pub struct Lexer {
    comment_tokens: Vec<char>,
    group: GroupState,
    pending_delim: Option<char>,
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lexer {
    pub fn new() -> Self {
        Self {
            comment_tokens: vec!['!'],
            group: GroupState::BeforeFirst,
            pending_delim: None,
        }
    }

    /// Set comment tokens (default: `!`).
    pub fn with_comment_tokens(mut self, tokens: Vec<char>) -> Self {
        self.comment_tokens = tokens;
        self
    }

    /// Delimiter of a string left open at the end of the last line, if any.
    pub fn pending_delimiter(&self) -> Option<char> {
        self.pending_delim
    }

    /// Tokenize one line of source, without its trailing newline.
    pub fn tokenize_line(&mut self, line: &str, line_no: usize) -> Result<Vec<Token>> {
        let chars: Vec<char> = line.chars().collect();
        let mut tokens = Vec::new();
        let mut idx = 0;

        if self.pending_delim.is_some() {
            let end = self.scan_string(&chars, idx);
            tokens.push(Token::new(TokenKind::Str, slice(&chars, idx, end), line_no));
            idx = end;
        }

        while idx < chars.len() {
            let c = chars[idx];
            let opened = self.open_group(c);

            let (kind, end) = if is_blank(c) {
                (TokenKind::Whitespace, scan_while(&chars, idx, is_blank))
            } else if self.comment_tokens.contains(&c) || self.group == GroupState::BeforeFirst {
                (TokenKind::Comment, chars.len())
            } else if c == '\'' || c == '"' {
                (TokenKind::Str, self.scan_string(&chars, idx))
            } else if c.is_alphabetic() {
                (TokenKind::Name, scan_while(&chars, idx, is_name_char))
            } else if c == '+' || c == '-' {
                scan_signed(&chars, idx)
            } else if c.is_ascii_digit() {
                (TokenKind::Number, scan_numeric(&chars, idx))
            } else if c == '.' {
                if chars.get(idx + 1).is_some_and(|d| d.is_ascii_digit()) {
                    (TokenKind::Number, scan_numeric(&chars, idx))
                } else {
                    (TokenKind::DotWord, scan_dot_word(&chars, idx))
                }
            } else if PUNCTUATION.contains(c) {
                (TokenKind::Punct, idx + 1)
            } else if self.group == GroupState::Between {
                (TokenKind::Comment, chars.len())
            } else {
                return Err(FortnmlError::UnexpectedCharacter {
                    line: line_no,
                    character: c,
                });
            };

            tokens.push(Token::new(kind, slice(&chars, idx, end), line_no));
            if kind == TokenKind::Punct && !opened {
                self.close_group(c);
            }
            idx = end;
        }

        log::trace!("line {}: {} tokens", line_no, tokens.len());
        Ok(tokens)
    }

    /// Enter a group on `&` or `$`. Returns true if this character opened it.
    fn open_group(&mut self, c: char) -> bool {
        if !matches!(self.group, GroupState::Inside(_)) && (c == '&' || c == '$') {
            self.group = GroupState::Inside(c);
            return true;
        }
        false
    }

    /// Leave the group on `/` or on a repeat of the opening character.
    fn close_group(&mut self, c: char) {
        if let GroupState::Inside(opener) = self.group {
            if c == '/' || c == opener {
                self.group = GroupState::Between;
            }
        }
    }

    /// Scan a quoted string starting at `start`, returning its end.
    ///
    /// Doubled delimiters are escapes. Reaching the end of the line leaves
    /// the delimiter pending for the next line.
    fn scan_string(&mut self, chars: &[char], start: usize) -> usize {
        let mut idx = start;
        let delim = match self.pending_delim.take() {
            Some(delim) => delim,
            None => {
                idx += 1;
                chars[start]
            }
        };

        loop {
            match chars.get(idx) {
                None => {
                    self.pending_delim = Some(delim);
                    return idx;
                }
                Some(&c) if c == delim => {
                    if chars.get(idx + 1) == Some(&delim) {
                        idx += 2;
                    } else {
                        return idx + 1;
                    }
                }
                Some(_) => idx += 1,
            }
        }
    }
}

fn slice(chars: &[char], start: usize, end: usize) -> String {
    chars[start..end].iter().collect()
}

fn is_blank(c: char) -> bool {
    c.is_whitespace() && c != '\n'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '\'' || c == '"'
}

fn scan_while(chars: &[char], start: usize, pred: fn(char) -> bool) -> usize {
    let mut idx = start;
    while idx < chars.len() && pred(chars[idx]) {
        idx += 1;
    }
    idx
}

/// A leading sign may introduce an IEEE value, a non-delimited string or a number.
fn scan_signed(chars: &[char], start: usize) -> (TokenKind, usize) {
    let word_end = scan_while(chars, start + 1, char::is_alphabetic);
    if word_end > start + 1 {
        let word = slice(chars, start + 1, word_end).to_lowercase();
        if IEEE_WORDS.contains(&word.as_str()) {
            return (TokenKind::Ieee, word_end);
        }
        return (TokenKind::Name, scan_while(chars, start + 1, is_name_char));
    }
    (TokenKind::Number, scan_numeric(chars, start))
}

/// Scan a numeric literal: sign, digits with at most one decimal point, an
/// optional exponent marker and signed exponent, and an optional `_kind`.
fn scan_numeric(chars: &[char], start: usize) -> usize {
    let at = |i: usize| chars.get(i).copied().unwrap_or('\n');
    let mut idx = start;

    if at(idx) == '+' || at(idx) == '-' {
        idx += 1;
    }

    let mut frac = false;
    while at(idx).is_ascii_digit() || (at(idx) == '.' && !frac) {
        if at(idx) == '.' {
            frac = true;
        }
        idx += 1;
    }

    if "eEdD".contains(at(idx)) {
        idx += 1;
    }
    if at(idx) == '+' || at(idx) == '-' {
        idx += 1;
    }
    idx = scan_while(chars, idx, |c| c.is_ascii_digit());

    if at(idx) == '_' && at(idx + 1).is_alphanumeric() {
        idx = scan_while(chars, idx + 1, |c| c.is_alphanumeric() || c == '_');
    }

    idx
}

/// Scan `.word.` style tokens, or a lone `.`.
fn scan_dot_word(chars: &[char], start: usize) -> usize {
    let mut idx = scan_while(chars, start + 1, char::is_alphabetic);
    if chars.get(idx) == Some(&'.') {
        idx += 1;
    }
    idx
}
