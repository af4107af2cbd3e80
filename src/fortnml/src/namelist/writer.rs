// fortnml/src/namelist/writer.rs

//! Rendering of namelists as Fortran text.
//!
//! Each variable becomes one or more `name(index) = v1, v2, ...` lines,
//! wrapped at the column width with continuation lines aligned under the
//! first value. Multidimensional arrays are written one outer slice per
//! line, derived types as `parent%field`, and arrays of derived types as
//! one `name(i)%field` block per assigned element.

use super::core::{basename, Namelist};
use crate::error::{FortnmlError, Result};
use crate::fortran_types::FortranValue;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

impl Namelist {
    /// Render a single variable as output lines, indentation included.
    pub fn var_strings(
        &self,
        name: &str,
        value: &FortranValue,
        start: Option<&[Option<i64>]>,
    ) -> Vec<String> {
        let mut lines = Vec::new();
        self.push_var_strings(&mut lines, name, value, &[], start);
        lines
    }

    fn push_var_strings(
        &self,
        lines: &mut Vec<String>,
        name: &str,
        value: &FortranValue,
        v_idx: &[i64],
        v_start: Option<&[Option<i64>]>,
    ) {
        let name = if self.format.uppercase {
            name.to_uppercase()
        } else {
            name.to_string()
        };

        // Start of the axis at the current nesting depth, outermost first.
        let axis_start = |depth: usize| -> Option<i64> {
            let start = v_start?;
            start.iter().rev().nth(depth).copied().flatten()
        };

        match value {
            FortranValue::Array(rows) if value.is_multidimensional() => {
                // Unknown outer starts are taken as 1, which is only an
                // approximation when the array was never explicitly indexed.
                let i_s = axis_start(v_idx.len()).unwrap_or(1);
                for (offset, row) in rows.iter().enumerate() {
                    let mut idx = v_idx.to_vec();
                    idx.push(i_s + offset as i64);
                    self.push_var_strings(lines, &name, row, &idx, v_start);
                }
            }
            FortranValue::Derived(nml) => {
                for (field, field_value) in nml.iter() {
                    let title = format!("{}%{}", name, field);
                    self.push_var_strings(lines, &title, field_value, &[], nml.start_index(field));
                }
            }
            FortranValue::DerivedArray(items) => {
                let anchor = axis_start(v_idx.len()).unwrap_or(1).min(1);
                for (offset, item) in items.iter().enumerate() {
                    let Some(item) = item else {
                        continue;
                    };
                    let title = format!("{}({})", name, anchor + offset as i64);
                    for (field, field_value) in item.iter() {
                        let title = format!("{}%{}", title, field);
                        self.push_var_strings(lines, &title, field_value, &[], item.start_index(field));
                    }
                }
            }
            _ => self.push_value_lines(lines, &name, value, v_idx, v_start),
        }
    }

    /// Write a scalar or vector assignment, wrapping at the column width.
    fn push_value_lines(
        &self,
        lines: &mut Vec<String>,
        name: &str,
        value: &FortranValue,
        v_idx: &[i64],
        v_start: Option<&[Option<i64>]>,
    ) {
        let opts = &self.format;
        let (values, is_list): (Vec<&FortranValue>, bool) = match value {
            FortranValue::Array(values) => (values.iter().collect(), true),
            other => (vec![other], false),
        };

        let v_start = v_start.filter(|s| !s.is_empty());
        let use_default_start = is_list && self.default_start_index.is_some();

        let mut idx_repr = String::new();
        if !v_idx.is_empty() || v_start.is_some() || use_default_start {
            idx_repr.push('(');
            let first = match v_start {
                Some(start) => Some(start[0]),
                None if use_default_start => Some(self.default_start_index),
                None => None,
            };
            match first.flatten() {
                Some(i_s) => {
                    let i_e = i_s + values.len() as i64 - 1;
                    if i_s == i_e {
                        idx_repr.push_str(&i_s.to_string());
                    } else {
                        idx_repr.push_str(&format!("{}:{}", i_s, i_e));
                    }
                }
                _ => idx_repr.push(':'),
            }

            if !v_idx.is_empty() {
                let delim = if opts.index_spacing { ", " } else { "," };
                idx_repr.push_str(delim);
                let outer: Vec<String> = v_idx.iter().rev().map(i64::to_string).collect();
                idx_repr.push_str(&outer.join(delim));
            }
            idx_repr.push(')');
        }

        let header = format!("{}{}{} = ", opts.indent, name, idx_repr);
        let header_len = header.chars().count();
        let column_width = if header_len >= opts.column_width {
            header_len + 1
        } else {
            opts.column_width
        };

        // Runs of equal values, collapsed only when repeat counters are on.
        let mut runs: Vec<(&FortranValue, usize)> = Vec::new();
        for v in values {
            if let Some((prev, count)) = runs.last_mut() {
                if opts.repeat_counter && *prev == v {
                    *count += 1;
                    continue;
                }
            }
            runs.push((v, 1));
        }

        let mut val_strs: Vec<String> = Vec::new();
        let mut val_line = header.clone();
        let n_runs = runs.len();

        for (i_val, (v_val, count)) in runs.iter().enumerate() {
            if char_len(&val_line) < column_width {
                let mut v_str = opts.repr_repeated(v_val, *count);
                let v_comma = if i_val + 1 < n_runs || opts.end_comma {
                    ", "
                } else {
                    ""
                };

                if opts.split_strings && matches!(v_val, FortranValue::Character(_)) {
                    let comma_len = v_comma.trim_end().len();
                    let idx = column_width.saturating_sub(char_len(&val_line) + comma_len);
                    let (mut v_l, mut v_r) = split_at_char(&v_str, idx);

                    if !v_r.is_empty() {
                        let new_line = format!("{}{}{}", " ".repeat(header_len), v_str, v_comma);
                        if char_len(new_line.trim_end()) <= column_width {
                            val_strs.push(std::mem::take(&mut val_line));
                            val_line = " ".repeat(header_len);
                        } else {
                            while !v_r.is_empty() {
                                val_line.push_str(&v_l);
                                val_strs.push(std::mem::take(&mut val_line));
                                let width = column_width.saturating_sub(comma_len);
                                (v_l, v_r) = split_at_char(&v_r, width);
                            }
                            v_str = v_l;
                        }
                    }
                }

                val_line.push_str(&v_str);
                val_line.push_str(v_comma);
            }

            if char_len(&val_line) >= column_width {
                val_strs.push(val_line.trim_end().to_string());
                val_line = " ".repeat(header_len);
            }
        }

        if !val_line.is_empty() && !val_line.chars().all(char::is_whitespace) {
            val_strs.push(val_line.trim_end().to_string());
        }

        // A trailing null needs an explicit comma to be read back.
        if let (Some(last), Some((v_last, 1))) = (val_strs.last_mut(), runs.last()) {
            if v_last.is_null() {
                last.push_str(" ,");
            }
        }

        lines.extend(val_strs);
    }

    fn write_group<W: Write>(
        &self,
        out: &mut W,
        name: &str,
        group: &Namelist,
        sort: bool,
    ) -> std::io::Result<()> {
        let name = if self.format.uppercase {
            name.to_uppercase()
        } else {
            name.to_string()
        };
        writeln!(out, "&{}", name)?;

        let mut vars: Vec<(&String, &FortranValue)> = group.raw_entries().collect();
        if sort {
            vars.sort_by(|a, b| basename(a.0).cmp(basename(b.0)));
        }
        for (var, value) in vars {
            let var = basename(var);
            for line in self.var_strings(var, value, group.start_index(var)) {
                writeln!(out, "{}", line)?;
            }
        }

        writeln!(out, "/")
    }

    /// Write every group to `out`, separated by blank lines.
    pub fn write_to<W: Write>(&self, mut out: W, sort: bool) -> Result<()> {
        let mut groups: Vec<(&String, &FortranValue)> = self.raw_entries().collect();
        if sort {
            groups.sort_by(|a, b| basename(a.0).cmp(basename(b.0)));
        }

        let mut first = true;
        for (key, value) in groups {
            let Some(group) = value.as_namelist() else {
                log::warn!("skipping '{}': top-level entries must be groups", key);
                continue;
            };
            if !first {
                writeln!(out)?;
            }
            first = false;
            self.write_group(&mut out, basename(key), group, sort)?;
        }
        out.flush()?;
        Ok(())
    }

    /// Write the namelist to a file. Fails with [`FortnmlError::FileExists`]
    /// if the file exists and `force` is not set.
    pub fn write<P: AsRef<Path>>(&self, path: P, force: bool, sort: bool) -> Result<()> {
        let path = path.as_ref();
        if !force && path.exists() {
            return Err(FortnmlError::FileExists(path.to_path_buf()));
        }
        log::debug!("writing namelist to {}", path.display());
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file), sort)
    }
}

impl fmt::Display for Namelist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        self.write_to(&mut buf, false).map_err(|_| fmt::Error)?;
        let text = String::from_utf8_lossy(&buf);
        write!(f, "{}", text.trim_end())
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn split_at_char(s: &str, idx: usize) -> (String, String) {
    let byte = s.char_indices().nth(idx).map_or(s.len(), |(b, _)| b);
    (s[..byte].to_string(), s[byte..].to_string())
}
