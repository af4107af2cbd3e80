// fortnml/src/parser/state.rs

//! Group-level parsing loop.

use super::cursor::TokenCursor;
use super::patch::PatchWriter;
use super::Parser;
use crate::error::{FortnmlError, Result};
use crate::fortran_types::FortranValue;
use crate::namelist::{merge_values, FormatOptions, Namelist};
use crate::scanner::{Token, TokenKind};

/// Patch values and the edits made to the source so far.
pub(super) struct PatchContext<'a> {
    pub values: &'a Namelist,
    pub format: FormatOptions,
    pub writer: PatchWriter<'a>,
    seen: Vec<(String, usize)>,
}

/// State of one pass over a scanned file.
pub(super) struct ParseState<'a> {
    pub config: &'a Parser,
    pub cursor: TokenCursor<'a>,
    pub patch: Option<PatchContext<'a>>,
}

impl<'a> ParseState<'a> {
    pub fn new(config: &'a Parser, tokens: &'a [Token], patch: Option<&'a Namelist>) -> Self {
        let patch = patch.map(|values| PatchContext {
            values,
            format: values.format_options().clone(),
            writer: PatchWriter::new(tokens),
            seen: Vec::new(),
        });
        Self {
            config,
            cursor: TokenCursor::new(tokens),
            patch,
        }
    }

    /// Read every group of the file. In patch mode the patched text is
    /// returned as well.
    pub fn run(mut self) -> Result<(Namelist, Option<String>)> {
        let mut nmls = Namelist::new();

        while self.skip_to_group() {
            let (name, group) = self.parse_group()?;
            if nmls.contains(&name) {
                nmls.add_cogroup(&name, group);
            } else {
                nmls.set(&name, group);
            }
        }

        let output = self.patch.map(|ctx| ctx.writer.render());
        Ok((nmls, output))
    }

    /// Move to the next `&` or `$`. Anything else between groups, such as a
    /// classic `$end`, is ignored.
    fn skip_to_group(&mut self) -> bool {
        while let Some(tok) = self.cursor.token() {
            if tok.is_punct('&') || tok.is_punct('$') {
                return true;
            }
            self.cursor.advance();
        }
        false
    }

    fn parse_group(&mut self) -> Result<(String, Namelist)> {
        self.cursor.advance();
        let name = match self.cursor.token() {
            Some(tok) if tok.kind == TokenKind::Name => tok.lexeme.to_lowercase(),
            Some(tok) => {
                return Err(FortnmlError::syntax(
                    tok.line,
                    format!("expected a group name, found '{}'", tok.lexeme),
                ))
            }
            None => {
                return Err(FortnmlError::UnterminatedGroup {
                    group: String::new(),
                })
            }
        };
        log::debug!("line {}: reading group {}", self.cursor.line(), name);
        self.cursor.advance();

        let mut grp_patch = self.group_patch(&name);
        let mut g_vars = Namelist::new();

        loop {
            let Some(tok) = self.cursor.token() else {
                return Err(FortnmlError::UnterminatedGroup { group: name });
            };

            if tok.is_terminator() {
                if let Some(patch_grp) = grp_patch.take() {
                    self.append_patch_vars(&mut g_vars, patch_grp);
                }
                self.cursor.advance();
                log::debug!("closing group {}", name);
                return Ok((name, g_vars));
            }

            if !self.cursor.at_assignment() {
                return Err(FortnmlError::syntax(
                    tok.line,
                    format!("expected a variable assignment in group {}, found '{}'", name, tok.lexeme),
                ));
            }
            let (v_name, v_values) = self.parse_variable(&mut g_vars, grp_patch.as_mut())?;
            assign(&mut g_vars, &v_name, v_values);
        }
    }

    /// Patch values for the next occurrence of group `name`. When the patch
    /// holds a cogroup, its members apply to successive occurrences.
    fn group_patch(&mut self, name: &str) -> Option<Namelist> {
        let ctx = self.patch.as_mut()?;

        let occurrence = match ctx.seen.iter_mut().find(|(n, _)| n == name) {
            Some((_, count)) => {
                *count += 1;
                *count
            }
            None => {
                ctx.seen.push((name.to_string(), 0));
                0
            }
        };

        if ctx.values.is_cogroup(name) {
            ctx.values.cogroup(name)?.get(occurrence).cloned()
        } else {
            ctx.values.group(name).cloned()
        }
    }

    /// Write the patch variables the group did not assign just ahead of its
    /// terminator, and add them to the group.
    fn append_patch_vars(&mut self, g_vars: &mut Namelist, patch_grp: Namelist) {
        if patch_grp.is_empty() {
            return;
        }
        let (at, line_start) = self.terminator_line_start();
        let Some(ctx) = self.patch.as_mut() else {
            return;
        };

        let mut text = String::new();
        if !line_start {
            text.push('\n');
        }
        for (key, value) in patch_grp.raw_entries() {
            log::debug!("appending patch variable {}", key);
            for line in ctx.values.var_strings(key, value, patch_grp.start_index(key)) {
                text.push_str(&line);
                text.push('\n');
            }
            if let Some(start) = patch_grp.start_index(key) {
                g_vars.set_start_index(key, start.to_vec());
            }
            assign(g_vars, key, value.clone());
        }
        ctx.writer.insert(at, text);
    }

    /// Where to insert lines ahead of the current terminator: the start of
    /// its line if only blanks precede it there, else the terminator itself.
    fn terminator_line_start(&self) -> (usize, bool) {
        let tokens = self.cursor.tokens();
        let at = self.cursor.raw_index();

        let mut idx = at;
        while idx > 0 && tokens[idx - 1].kind == TokenKind::Whitespace {
            idx -= 1;
        }
        if idx == 0 || tokens[idx - 1].kind == TokenKind::Newline {
            (idx, true)
        } else {
            (at, false)
        }
    }
}

/// Store a parsed assignment, merging it with an earlier assignment to the
/// same variable.
pub(super) fn assign(parent: &mut Namelist, name: &str, value: FortranValue) {
    let indexed = parent.start_index(name).is_some();
    match parent.get_mut(name) {
        Some(slot) => {
            let prior = std::mem::replace(slot, FortranValue::Null);
            let merged = merge_values(prior, value);
            *slot = if indexed {
                merged
            } else {
                FortranValue::delist(merged.into_elements())
            };
        }
        None => {
            parent.set(name, value);
        }
    }
}
