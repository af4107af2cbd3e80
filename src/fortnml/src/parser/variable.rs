// fortnml/src/parser/variable.rs

//! Parsing of a single assignment: subscripts, derived type paths, value
//! lists and their placement into nested storage.

use super::state::ParseState;
use crate::error::{FortnmlError, Result};
use crate::findex::{FIndex, IndexBound};
use crate::fortran_types::{parse_complex, parse_integer, parse_literal, FortranValue};
use crate::namelist::Namelist;
use crate::scanner::{unquote, TokenKind};

/// One value slot of a value list and the raw tokens it came from.
#[derive(Debug, Clone)]
struct Slot {
    value: FortranValue,
    count: usize,
    start: usize,
    end: usize,
    /// Start of the separator ahead of this slot, if any.
    sep: Option<usize>,
    /// Text put ahead of a substituted value.
    prefix: &'static str,
}

impl<'a> ParseState<'a> {
    /// Parse one assignment, starting at the variable name, and return the
    /// lower-cased name with its values. Start indices and earlier values in
    /// `parent` are updated in place when the subscripts demand it.
    pub(super) fn parse_variable(
        &mut self,
        parent: &mut Namelist,
        mut patch: Option<&mut Namelist>,
    ) -> Result<(String, FortranValue)> {
        let v_name = match self.cursor.token() {
            Some(tok) => tok.lexeme.to_lowercase(),
            None => return Err(FortnmlError::syntax(self.cursor.line(), "expected a variable name")),
        };
        self.cursor.advance();

        let mut v_idx: Option<FIndex> = None;
        let mut dt_index: Option<i64> = None;
        let mut starts: Vec<i64> = Vec::new();

        if self.is_punct('(') {
            let bounds = self.parse_indices(&v_name)?;
            self.cursor.advance();
            let derived = self.is_punct('%');

            if derived {
                match bounds.as_slice() {
                    [bound] if bound.is_single() => dt_index = bound.start,
                    _ => {
                        return Err(FortnmlError::invalid_index(
                            &v_name,
                            "derived type index must be a single element",
                        ))
                    }
                }
            }

            let mut idx = FIndex::new(&bounds, self.config.global_start_index);
            self.reconcile_start(parent, &v_name, &mut idx, derived);
            starts = idx
                .first
                .iter()
                .map(|first| self.storage_start(*first, derived))
                .collect();
            v_idx = Some(idx);
        } else {
            self.reindex_unindexed(parent, &v_name);
        }

        let mut values = Vec::new();

        if self.is_punct('%') {
            let dt_offset = match (dt_index, starts.first()) {
                (Some(index), Some(anchor)) => Some((index - anchor) as usize),
                _ => None,
            };
            self.cursor.advance();

            let (att, att_values, att_start) = {
                let child_patch = patch
                    .as_deref_mut()
                    .and_then(|p| derived_patch(p, &v_name, dt_index));
                let mut scratch = Namelist::new();
                let target: &mut Namelist = match parent.get_mut(&v_name) {
                    Some(FortranValue::Derived(nml)) if dt_offset.unwrap_or(0) == 0 => nml,
                    Some(FortranValue::DerivedArray(items)) => {
                        match dt_offset.and_then(|i| items.get_mut(i)) {
                            Some(Some(nml)) => nml,
                            _ => &mut scratch,
                        }
                    }
                    _ => &mut scratch,
                };
                let (att, att_values) = self.parse_variable(target, child_patch)?;
                let att_start = target.start_index(&att).map(<[_]>::to_vec);
                (att, att_values, att_start)
            };
            if let Some(p) = patch {
                prune_patch(p, &v_name);
            }

            let mut next_value = Namelist::new();
            next_value.set(&att, att_values);
            if let Some(start) = att_start {
                next_value.set_start_index(&att, start);
            }
            self.store(&mut values, v_idx.as_mut(), &starts, FortranValue::Derived(next_value), &v_name)?;
        } else if self.is_punct('=') {
            let eq = self.cursor.raw_index();
            self.cursor.advance();
            let slots = self.parse_slots(eq, &v_name)?;

            let patch_value = patch.and_then(|p| p.remove(&v_name));
            match patch_value {
                Some(patch_value) => {
                    log::debug!("patching {}", v_name);
                    let flat = patch_value.flatten();
                    self.substitute(&slots, &flat);
                    match v_idx.as_mut() {
                        Some(idx) => {
                            for value in flat {
                                self.store(&mut values, Some(&mut *idx), &starts, value, &v_name)?;
                            }
                        }
                        None => {
                            return Ok((v_name, FortranValue::delist(patch_value.into_elements())))
                        }
                    }
                }
                None => {
                    let shift = self.unindexed_shift(parent, &v_name, v_idx.is_none());
                    values.extend(std::iter::repeat(FortranValue::Null).take(shift));
                    for slot in slots {
                        for _ in 0..slot.count {
                            self.store(&mut values, v_idx.as_mut(), &starts, slot.value.clone(), &v_name)?;
                        }
                    }
                }
            }
        } else {
            let found = self.cursor.token().map_or("end of input", |t| t.lexeme.as_str());
            return Err(FortnmlError::syntax(
                self.cursor.line(),
                format!("expected '=' after {}, found '{}'", v_name, found),
            ));
        }

        let value = match v_idx {
            Some(_) => FortranValue::from_elements(values),
            None => FortranValue::delist(values),
        };
        Ok((v_name, value))
    }

    fn is_punct(&self, c: char) -> bool {
        self.cursor.token().is_some_and(|t| t.is_punct(c))
    }

    /// Storage offset zero of an axis. Derived type arrays are anchored at
    /// index 1 or below so their elements line up with the writer.
    fn storage_start(&self, first: Option<i64>, derived: bool) -> i64 {
        let start = first.unwrap_or(self.config.default_start_index);
        if derived {
            start.min(1)
        } else {
            start
        }
    }

    /// Merge the subscripts of an indexed assignment with what `parent`
    /// already knows about the variable, shifting earlier values when this
    /// assignment reaches below the recorded start.
    fn reconcile_start(&self, parent: &mut Namelist, v_name: &str, idx: &mut FIndex, derived: bool) {
        let prior = match parent.start_index(v_name) {
            Some(start) => Some(start.to_vec()),
            None if parent.contains(v_name) => {
                Some(vec![Some(self.config.default_start_index); idx.rank()])
            }
            None => None,
        };

        if let Some(prior) = prior {
            let old: Vec<i64> = prior
                .iter()
                .map(|first| self.storage_start(*first, derived))
                .collect();
            idx.reconcile_first(&prior);

            let rank = idx.rank();
            for (axis, old_start) in old.iter().enumerate().take(rank) {
                let new_start = self.storage_start(idx.first[axis], derived);
                if new_start < *old_start {
                    let depth = self.axis_depth(axis, rank);
                    if let Some(value) = parent.get_mut(v_name) {
                        pad_front(value, depth, (old_start - new_start) as usize);
                    }
                }
            }
        }

        parent.set_start_index(v_name, idx.first.clone());
    }

    /// An assignment without subscripts to a variable with recorded start
    /// indices starts at the default start index. Earlier values are shifted
    /// when that lies below the recorded start.
    fn reindex_unindexed(&self, parent: &mut Namelist, v_name: &str) {
        let Some(prior) = parent.start_index(v_name).map(<[_]>::to_vec) else {
            return;
        };
        let default = self.config.default_start_index;
        let rank = prior.len();

        let mut start = Vec::with_capacity(rank);
        for (axis, first) in prior.iter().enumerate() {
            match first {
                Some(first) if default < *first => {
                    if let Some(value) = parent.get_mut(v_name) {
                        pad_front(value, self.axis_depth(axis, rank), (first - default) as usize);
                    }
                    start.push(Some(default));
                }
                Some(first) if default > *first && rank == 1 => start.push(Some(*first)),
                _ => start.push(Some(default)),
            }
        }
        parent.set_start_index(v_name, start);
    }

    /// Number of nulls to put ahead of unindexed values when the recorded
    /// start lies below the default start index.
    fn unindexed_shift(&self, parent: &Namelist, v_name: &str, unindexed: bool) -> usize {
        if !unindexed {
            return 0;
        }
        match parent.start_index(v_name) {
            Some([Some(first)]) => (self.config.default_start_index - first).max(0) as usize,
            _ => 0,
        }
    }

    /// Nesting depth of `axis` in storage. Column-major storage nests the
    /// last axis outermost.
    fn axis_depth(&self, axis: usize, rank: usize) -> usize {
        if self.config.row_major {
            axis
        } else {
            rank - 1 - axis
        }
    }

    /// Parse `(i, j:k, l:m:n, ...)`, leaving the cursor on the closing `)`.
    fn parse_indices(&mut self, v_name: &str) -> Result<Vec<IndexBound>> {
        let mut bounds = Vec::new();
        loop {
            self.cursor.advance();
            bounds.push(self.parse_index(v_name)?);
            if self.is_punct(')') {
                return Ok(bounds);
            }
        }
    }

    /// Parse one `start:end:stride` triplet, stopping at `,` or `)`.
    fn parse_index(&mut self, v_name: &str) -> Result<IndexBound> {
        let start = match self.index_value(v_name)? {
            Some(start) => {
                self.cursor.advance();
                Some(start)
            }
            None if self.at_index_delim() => {
                return Err(FortnmlError::invalid_index(v_name, "index cannot be empty"))
            }
            None => None,
        };

        let mut end = None;
        if self.is_punct(':') {
            self.cursor.advance();
            match self.index_value(v_name)? {
                Some(value) => {
                    end = Some(value);
                    self.cursor.advance();
                }
                None if self.is_punct(':') => {
                    return Err(FortnmlError::invalid_index(
                        v_name,
                        "end index cannot be implicit when using stride",
                    ))
                }
                None => {}
            }
        } else if self.at_index_delim() {
            end = start;
        }

        let mut stride = None;
        if self.is_punct(':') {
            self.cursor.advance();
            match self.index_value(v_name)? {
                Some(0) => {
                    return Err(FortnmlError::invalid_index(v_name, "stride index cannot be zero"))
                }
                Some(value) => {
                    stride = Some(value);
                    self.cursor.advance();
                }
                None => {
                    return Err(FortnmlError::invalid_index(v_name, "stride index cannot be implicit"))
                }
            }
        }

        if !self.at_index_delim() {
            return Err(FortnmlError::invalid_index(v_name, "index did not terminate correctly"));
        }
        Ok(IndexBound::new(start, end, stride))
    }

    fn at_index_delim(&self) -> bool {
        self.is_punct(',') || self.is_punct(')')
    }

    /// The current token as an integer subscript. `None` for punctuation;
    /// anything else that is not an integer is an error.
    fn index_value(&self, v_name: &str) -> Result<Option<i64>> {
        match self.cursor.token() {
            Some(tok) if tok.kind == TokenKind::Punct => Ok(None),
            Some(tok) => parse_integer(&tok.lexeme).map(Some).ok_or_else(|| {
                FortnmlError::invalid_index(v_name, format!("'{}' is not an integer index", tok.lexeme))
            }),
            None => Err(FortnmlError::UnterminatedGroup {
                group: String::new(),
            }),
        }
    }

    /// Read the value slots after `=` up to the next assignment or group
    /// terminator. `eq` is the position of the `=` token.
    fn parse_slots(&mut self, eq: usize, v_name: &str) -> Result<Vec<Slot>> {
        let mut slots: Vec<Slot> = Vec::new();
        let mut expecting = true;
        let mut last_sep: Option<usize> = None;

        while let Some(tok) = self.cursor.token() {
            if tok.is_terminator() || self.cursor.at_assignment() {
                break;
            }

            let raw = self.cursor.raw_index();
            if tok.is_punct(',') {
                if expecting {
                    slots.push(Slot {
                        value: FortranValue::Null,
                        count: 1,
                        start: raw,
                        end: raw,
                        sep: last_sep,
                        prefix: "",
                    });
                }
                last_sep = Some(raw);
                expecting = true;
                self.cursor.advance();
                continue;
            }

            let sep = match (expecting, slots.last()) {
                (true, _) => last_sep,
                (false, Some(prior)) => Some(prior.end),
                (false, None) => None,
            };
            let slot = self.parse_slot(sep, v_name)?;
            slots.push(slot);
            expecting = false;
        }

        if slots.is_empty() && last_sep.is_none() {
            slots.push(Slot {
                value: FortranValue::Null,
                count: 1,
                start: eq + 1,
                end: eq + 1,
                sep: None,
                prefix: " ",
            });
        }
        Ok(slots)
    }

    /// Read one value, with an optional `N*` repeat count.
    fn parse_slot(&mut self, sep: Option<usize>, v_name: &str) -> Result<Slot> {
        let start = self.cursor.raw_index();
        let mut count = 1;

        let repeated = self.cursor.peek().is_some_and(|t| t.is_punct('*'))
            && self
                .cursor
                .token()
                .is_some_and(|t| matches!(t.kind, TokenKind::Number | TokenKind::Name));
        if repeated {
            let text = self.cursor.token().map_or("", |t| t.lexeme.as_str());
            count = parse_integer(text)
                .filter(|n| *n > 0)
                .map(|n| n as usize)
                .ok_or_else(|| {
                    FortnmlError::syntax(
                        self.cursor.line(),
                        format!("{}: '{}' is not a valid repeat count", v_name, text),
                    )
                })?;
            self.cursor.advance();
            self.cursor.advance();

            let is_null = match self.cursor.token() {
                None => true,
                Some(tok) => {
                    tok.is_punct(',') || tok.is_terminator() || self.cursor.at_assignment()
                }
            };
            if is_null {
                return Ok(Slot {
                    value: FortranValue::Null,
                    count,
                    start,
                    end: self.cursor.prior_end(),
                    sep,
                    prefix: "",
                });
            }
        }

        let value = self.parse_value(v_name)?;
        Ok(Slot {
            value,
            count,
            start,
            end: self.cursor.prior_end(),
            sep,
            prefix: "",
        })
    }

    /// Read a literal, a complex `(re, im)` pair, or a run of adjacent
    /// quoted strings.
    fn parse_value(&mut self, v_name: &str) -> Result<FortranValue> {
        let Some(tok) = self.cursor.token() else {
            return Err(FortnmlError::syntax(self.cursor.line(), "unexpected end of input"));
        };
        let line = tok.line;

        if tok.is_punct('(') {
            let mut parts = Vec::with_capacity(2);
            for close in [',', ')'] {
                self.cursor.advance();
                let part = self.cursor.token().filter(|t| t.kind != TokenKind::Punct);
                self.cursor.advance();
                match part {
                    Some(part) if self.is_punct(close) => parts.push(part.lexeme.as_str()),
                    _ => {
                        return Err(FortnmlError::syntax(
                            line,
                            format!("{}: malformed complex value", v_name),
                        ))
                    }
                }
            }
            self.cursor.advance();
            let (re, im) = parse_complex(parts[0], parts[1]).ok_or_else(|| {
                FortnmlError::syntax(
                    line,
                    format!("{}: invalid complex value ({}, {})", v_name, parts[0], parts[1]),
                )
            })?;
            return Ok(FortranValue::Complex(re, im));
        }

        match tok.kind {
            TokenKind::Str => {
                let mut text = unquote(&tok.lexeme);
                self.cursor.advance();
                while let Some(next) = self.cursor.token().filter(|t| t.is_quoted()) {
                    if !self.cursor.is_adjacent() {
                        break;
                    }
                    text.push_str(&unquote(&next.lexeme));
                    self.cursor.advance();
                }
                Ok(FortranValue::Character(text))
            }
            TokenKind::Number | TokenKind::Ieee | TokenKind::Name | TokenKind::DotWord => {
                self.cursor.advance();
                Ok(parse_literal(&tok.lexeme, self.config.strict_logical))
            }
            _ => Err(FortnmlError::syntax(
                line,
                format!("{}: unexpected '{}' in value list", v_name, tok.lexeme),
            )),
        }
    }

    /// Place one value, either appended or at the next subscript of `idx`.
    fn store(
        &self,
        values: &mut Vec<FortranValue>,
        idx: Option<&mut FIndex>,
        starts: &[i64],
        value: FortranValue,
        v_name: &str,
    ) -> Result<()> {
        let Some(idx) = idx else {
            values.push(value);
            return Ok(());
        };
        let Some(coords) = idx.advance() else {
            log::warn!(
                "{}: value {:?} lies beyond the last index and was dropped",
                v_name,
                value
            );
            return Ok(());
        };

        let mut offsets = Vec::with_capacity(coords.len());
        for (coord, start) in coords.iter().zip(starts) {
            if coord < start {
                return Err(FortnmlError::invalid_index(
                    v_name,
                    format!("index {} lies below the first index {}", coord, start),
                ));
            }
            offsets.push((coord - start) as usize);
        }
        if !self.config.row_major {
            offsets.reverse();
        }
        place(values, &offsets, value);
        Ok(())
    }

    /// Replace the source slots with the rendered patch values, one value per
    /// repeated element. Leftover slots are removed and leftover values are
    /// appended after the last slot.
    fn substitute(&mut self, slots: &[Slot], values: &[FortranValue]) {
        let Some(ctx) = self.patch.as_mut() else {
            return;
        };

        let mut queue = values.iter();
        let mut last_end = None;
        for slot in slots {
            let taken: Vec<String> = queue
                .by_ref()
                .take(slot.count)
                .map(|v| ctx.format.repr(v))
                .collect();
            if taken.is_empty() {
                ctx.writer.remove(slot.sep.unwrap_or(slot.start), slot.end);
            } else {
                let text = format!("{}{}", slot.prefix, taken.join(", "));
                ctx.writer.replace(slot.start, slot.end, text);
                last_end = Some(slot.end);
            }
        }

        let rest: String = queue.map(|v| format!(", {}", ctx.format.repr(v))).collect();
        if let Some(at) = last_end.filter(|_| !rest.is_empty()) {
            ctx.writer.insert(at, rest);
        }
    }
}

/// Prepend `count` nulls along the axis at nesting `depth`.
fn pad_front(value: &mut FortranValue, depth: usize, count: usize) {
    if depth == 0 {
        let prior = std::mem::replace(value, FortranValue::Null);
        let mut elements = vec![FortranValue::Null; count];
        elements.extend(prior.into_elements());
        *value = FortranValue::from_elements(elements);
    } else if let FortranValue::Array(items) = value {
        for item in items.iter_mut().filter(|item| item.is_array()) {
            pad_front(item, depth - 1, count);
        }
    }
}

/// Assign `value` at the nested `offsets`, growing every level with nulls
/// (or empty rows) as needed.
fn place(level: &mut Vec<FortranValue>, offsets: &[usize], value: FortranValue) {
    let Some((&offset, rest)) = offsets.split_first() else {
        return;
    };
    if level.len() <= offset {
        level.resize(offset + 1, FortranValue::Null);
    }
    if rest.is_empty() {
        level[offset] = value;
        return;
    }
    if !matches!(level[offset], FortranValue::Array(_)) {
        level[offset] = FortranValue::Array(Vec::new());
    }
    if let FortranValue::Array(inner) = &mut level[offset] {
        place(inner, rest, value);
    }
}

/// The part of a patch addressed by `name(index)%...`.
fn derived_patch<'p>(patch: &'p mut Namelist, name: &str, index: Option<i64>) -> Option<&'p mut Namelist> {
    let anchor = patch
        .start_index(name)
        .and_then(|start| start.first().copied().flatten())
        .unwrap_or(1)
        .min(1);
    match patch.get_mut(name)? {
        FortranValue::Derived(nml) => Some(nml),
        FortranValue::DerivedArray(items) => {
            let offset = usize::try_from(index? - anchor).ok()?;
            items.get_mut(offset)?.as_mut()
        }
        _ => None,
    }
}

/// Drop a derived type patch once all of its fields have been used.
fn prune_patch(patch: &mut Namelist, name: &str) {
    let used = match patch.get_mut(name) {
        Some(FortranValue::Derived(nml)) => nml.is_empty(),
        Some(FortranValue::DerivedArray(items)) => {
            for item in items.iter_mut() {
                if item.as_ref().is_some_and(Namelist::is_empty) {
                    *item = None;
                }
            }
            items.iter().all(Option::is_none)
        }
        _ => false,
    };
    if used {
        patch.remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[Option<i64>]) -> Vec<FortranValue> {
        values.iter().map(|v| (*v).into()).collect()
    }

    #[test]
    fn test_place_grows_levels() {
        let mut values = Vec::new();
        place(&mut values, &[1, 2], FortranValue::Integer(5));
        assert_eq!(
            values,
            vec![
                FortranValue::Null,
                FortranValue::Array(ints(&[None, None, Some(5)])),
            ]
        );
        place(&mut values, &[0, 0], FortranValue::Integer(1));
        assert_eq!(values[0], FortranValue::Array(ints(&[Some(1)])));
    }

    #[test]
    fn test_pad_front() {
        let mut value = FortranValue::Array(ints(&[Some(3), Some(4)]));
        pad_front(&mut value, 0, 2);
        assert_eq!(value, FortranValue::Array(ints(&[None, None, Some(3), Some(4)])));

        let mut scalar = FortranValue::Integer(7);
        pad_front(&mut scalar, 0, 1);
        assert_eq!(scalar, FortranValue::Array(ints(&[None, Some(7)])));

        let mut matrix = FortranValue::Array(vec![
            FortranValue::Array(ints(&[Some(1)])),
            FortranValue::Null,
        ]);
        pad_front(&mut matrix, 1, 1);
        assert_eq!(
            matrix,
            FortranValue::Array(vec![
                FortranValue::Array(ints(&[None, Some(1)])),
                FortranValue::Null,
            ])
        );
    }

    #[test]
    fn test_prune_patch() {
        let mut patch = Namelist::new();
        patch.set("a", Namelist::new());
        let mut kept = Namelist::new();
        kept.set("x", 1);
        patch.set("b", kept);

        prune_patch(&mut patch, "a");
        prune_patch(&mut patch, "b");
        assert!(!patch.contains("a"));
        assert!(patch.contains("b"));
    }
}
