// fortnml/src/scanner/scanner.rs

//! Multi-line scanner feeding the line lexer.

use super::lexer::Lexer;
use super::token::{Token, TokenKind};
use crate::error::{FortnmlError, Result};

/// Lexical scanner for whole namelist files.
pub struct Scanner {
    comment_tokens: Vec<char>,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner {
    pub fn new() -> Self {
        Self {
            comment_tokens: vec!['!'],
        }
    }

    /// Set comment tokens (default: `!`).
    pub fn with_comment_tokens(mut self, tokens: Vec<char>) -> Self {
        self.comment_tokens = tokens;
        self
    }

    /// Scan the complete input, keeping whitespace and comments.
    ///
    /// Each line contributes a [`TokenKind::Newline`] token. A quoted string
    /// left open at the end of a line is joined with its continuation into a
    /// single token whose lexeme still contains the line break.
    pub fn scan_all(&self, input: &str) -> Result<Vec<Token>> {
        let mut lexer = Lexer::new().with_comment_tokens(self.comment_tokens.clone());
        let mut tokens: Vec<Token> = Vec::new();
        let mut open_string: Option<(usize, usize)> = None;

        for (line_idx, raw) in input.split_inclusive('\n').enumerate() {
            let line_no = line_idx + 1;
            let (body, newline) = match raw.strip_suffix('\n') {
                Some(body) => (body, "\n"),
                None => (raw, ""),
            };

            let mut line_tokens = lexer.tokenize_line(body, line_no)?.into_iter();

            if let Some((idx, _)) = open_string {
                if let Some(rest) = line_tokens.next() {
                    tokens[idx].lexeme.push_str(&rest.lexeme);
                }
            }
            tokens.extend(line_tokens);

            open_string = match lexer.pending_delimiter() {
                Some(_) => {
                    let idx = match open_string {
                        Some((idx, _)) => idx,
                        None => tokens.len() - 1,
                    };
                    let start_line = open_string.map_or(line_no, |(_, line)| line);
                    tokens[idx].lexeme.push_str(newline);
                    Some((idx, start_line))
                }
                None => {
                    tokens.push(Token::new(TokenKind::Newline, newline, line_no));
                    None
                }
            };
        }

        if let Some((_, line)) = open_string {
            return Err(FortnmlError::UnterminatedString { line });
        }

        Ok(tokens)
    }
}

/// Value of a quoted string token: delimiters removed, doubled delimiters
/// collapsed, and line breaks of a continued string dropped.
pub fn unquote(lexeme: &str) -> String {
    let mut chars = lexeme.chars();
    let delim = match chars.next() {
        Some(c @ ('\'' | '"')) if lexeme.len() >= 2 && lexeme.ends_with(c) => c,
        _ => return lexeme.to_string(),
    };
    let inner = &lexeme[1..lexeme.len() - 1];
    let doubled: String = [delim, delim].iter().collect();
    inner
        .replace("\r\n", "")
        .replace('\n', "")
        .replace(&doubled, &delim.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_reproduces_input() -> Result<()> {
        let input = "! header\n&data_nml  ! group comment\n    x = 1,  ! inline\n    y = 'a', \"b\"\n/\ntrailer";
        let tokens = Scanner::new().scan_all(input)?;
        let rebuilt: String = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(rebuilt, input);
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Newline));
        Ok(())
    }

    #[test]
    fn test_multiline_string_is_one_token() -> Result<()> {
        let input = "&g\n s = 'first\nsecond'\n/\n";
        let tokens = Scanner::new().scan_all(input)?;
        let strings: Vec<&Token> = tokens.iter().filter(|t| t.is_quoted()).collect();
        assert_eq!(strings.len(), 1);
        assert_eq!(strings[0].lexeme, "'first\nsecond'");
        assert_eq!(strings[0].line, 2);
        assert_eq!(unquote(&strings[0].lexeme), "firstsecond");

        let rebuilt: String = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(rebuilt, input);
        Ok(())
    }

    #[test]
    fn test_unterminated_string() {
        let err = Scanner::new().scan_all("&g\n s = 'open\n").unwrap_err();
        assert!(matches!(err, FortnmlError::UnterminatedString { line: 2 }));
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("'it''s'"), "it's");
        assert_eq!(unquote("\"say \"\"hi\"\"\""), "say \"hi\"");
        assert_eq!(unquote("'mixed \"x\"'"), "mixed \"x\"");
        assert_eq!(unquote("a''b"), "a''b");
        assert_eq!(unquote("'"), "'");
        assert_eq!(unquote("''"), "");
    }
}
