// fortnml/src/parser/mod.rs

//! Namelist parser.
//!
//! The parser reads the token stream of a whole file and builds a
//! [`Namelist`] of groups. Array subscripts are resolved through
//! [`FIndex`](crate::findex::FIndex), repeated assignments to one variable
//! are merged, and repeated groups become cogroups.
//!
//! In patch mode the same pass also records edits against the source tokens:
//! the values of patched variables are substituted in place and any patch
//! variables missing from a group are written ahead of its terminator. All
//! other text is copied unchanged.

mod cursor;
mod patch;
mod state;
mod variable;

use crate::error::{FortnmlError, Result};
use crate::namelist::Namelist;
use crate::scanner::{Scanner, Token};
use state::ParseState;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Configurable namelist parser.
///
/// ```
/// use fortnml::Parser;
///
/// let nml = Parser::new()
///     .with_default_start_index(0)
///     .reads("&grid n(3:4) = 3, 4 /")
///     .unwrap();
/// assert_eq!(nml.group("grid").unwrap().start_index("n"), Some(&[Some(3)][..]));
/// ```
#[derive(Debug, Clone)]
pub struct Parser {
    row_major: bool,
    strict_logical: bool,
    default_start_index: i64,
    global_start_index: Option<i64>,
    comment_tokens: Vec<char>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            row_major: false,
            strict_logical: true,
            default_start_index: 1,
            global_start_index: None,
            comment_tokens: vec!['!'],
        }
    }

    /// Store multidimensional arrays with the first index outermost.
    pub fn with_row_major(mut self, row_major: bool) -> Self {
        self.row_major = row_major;
        self
    }

    /// With strict parsing only `.true.`, `.t.`, `true` and `t` (and the
    /// false forms) are logicals. Otherwise any word whose first letter after
    /// an optional `.` is `t` or `f` is read as a logical.
    pub fn with_strict_logical(mut self, strict: bool) -> Self {
        self.strict_logical = strict;
        self
    }

    /// First index assumed for arrays assigned without subscripts.
    pub fn with_default_start_index(mut self, index: i64) -> Self {
        self.default_start_index = index;
        self
    }

    /// Lower every explicit first index to `index` where it is larger.
    pub fn with_global_start_index(mut self, index: Option<i64>) -> Self {
        self.global_start_index = index;
        self
    }

    /// Characters which start a comment (default: `!`).
    pub fn with_comment_tokens(mut self, tokens: Vec<char>) -> Self {
        self.comment_tokens = tokens;
        self
    }

    fn scan(&self, text: &str) -> Result<Vec<Token>> {
        Scanner::new()
            .with_comment_tokens(self.comment_tokens.clone())
            .scan_all(text)
    }

    /// Parse a namelist file.
    pub fn read<P: AsRef<Path>>(&self, path: P) -> Result<Namelist> {
        let text = fs::read_to_string(path.as_ref())?;
        log::debug!("read {} bytes from {}", text.len(), path.as_ref().display());
        self.reads(&text)
    }

    /// Parse namelist text from any reader.
    pub fn read_from<R: Read>(&self, mut reader: R) -> Result<Namelist> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        self.reads(&text)
    }

    /// Parse namelist text.
    pub fn reads(&self, text: &str) -> Result<Namelist> {
        let tokens = self.scan(text)?;
        let (nml, _) = ParseState::new(self, &tokens, None).run()?;
        Ok(nml)
    }

    /// Apply `patch` to namelist text, returning the patched namelist and the
    /// patched text.
    pub fn patch_str(&self, text: &str, patch: &Namelist) -> Result<(Namelist, String)> {
        let tokens = self.scan(text)?;
        let (nml, output) = ParseState::new(self, &tokens, Some(patch)).run()?;
        Ok((nml, output.unwrap_or_default()))
    }

    /// Apply `patch` to namelist text and write the patched text to `out`.
    /// Nothing is written if the text cannot be parsed.
    pub fn patch_to_writer<W: Write>(&self, text: &str, patch: &Namelist, mut out: W) -> Result<Namelist> {
        let (nml, patched) = self.patch_str(text, patch)?;
        out.write_all(patched.as_bytes())?;
        out.flush()?;
        Ok(nml)
    }

    /// Apply `patch` to the file `source` and write the result to `dest`,
    /// which defaults to `source` with a trailing `~`.
    ///
    /// The destination must differ from the source. It is only created once
    /// the source has been parsed successfully.
    pub fn patch<P: AsRef<Path>>(&self, source: P, patch: &Namelist, dest: Option<P>) -> Result<Namelist> {
        let source = source.as_ref();
        let dest = match dest {
            Some(dest) => dest.as_ref().to_path_buf(),
            None => backup_path(source),
        };
        if same_file(source, &dest) {
            return Err(FortnmlError::PatchTarget(dest));
        }

        let text = fs::read_to_string(source)?;
        let (nml, patched) = self.patch_str(&text, patch)?;

        let mut out = BufWriter::new(File::create(&dest)?);
        out.write_all(patched.as_bytes())?;
        out.flush()?;
        log::debug!("patched {} into {}", source.display(), dest.display());
        Ok(nml)
    }
}

/// `path` with `~` appended to its file name.
fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push("~");
    PathBuf::from(name)
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fortran_types::FortranValue;

    fn init() {
        let _ = pretty_env_logger::try_init();
    }

    fn ints(values: &[Option<i64>]) -> FortranValue {
        FortranValue::Array(values.iter().map(|v| (*v).into()).collect())
    }

    fn group(nml: &Namelist, name: &str) -> Namelist {
        nml.group(name).cloned().unwrap_or_default()
    }

    #[test]
    fn test_scalars() -> Result<()> {
        init();
        let nml = Parser::new().reads(
            "&config\n  i = 42\n  r = 1.5d2\n  z = (1.0, -2.0)\n  b = .true.\n  s = 'it''s'\n  w = word\n/\n",
        )?;
        let grp = group(&nml, "config");
        assert_eq!(grp.get("i"), Some(&FortranValue::Integer(42)));
        assert_eq!(grp.get("r"), Some(&FortranValue::Real(150.0)));
        assert_eq!(grp.get("z"), Some(&FortranValue::Complex(1.0, -2.0)));
        assert_eq!(grp.get("b"), Some(&FortranValue::Logical(true)));
        assert_eq!(grp.get("s"), Some(&FortranValue::character("it's")));
        assert_eq!(grp.get("w"), Some(&FortranValue::character("word")));
        Ok(())
    }

    #[test]
    fn test_case_insensitive_names() -> Result<()> {
        let nml = Parser::new().reads("&GRP\n  Alpha = 1\n/")?;
        assert_eq!(nml.group("grp").and_then(|g| g.get("ALPHA")), Some(&FortranValue::Integer(1)));
        Ok(())
    }

    #[test]
    fn test_index_reconstruction() -> Result<()> {
        let text = "&g\n  v(3:5) = 3, 4, 5\n  v = 1, 2\n/";

        let nml = Parser::new().reads(text)?;
        let grp = group(&nml, "g");
        assert_eq!(grp.get("v"), Some(&ints(&[Some(1), Some(2), Some(3), Some(4), Some(5)])));
        assert_eq!(grp.start_index("v"), Some(&[Some(1)][..]));

        let nml = Parser::new().with_default_start_index(0).reads(text)?;
        assert_eq!(
            group(&nml, "g").get("v"),
            Some(&ints(&[Some(1), Some(2), None, Some(3), Some(4), Some(5)]))
        );
        Ok(())
    }

    #[test]
    fn test_stride() -> Result<()> {
        let nml = Parser::new().reads("&g v(1:7:2) = 1, 3, 5, 7 /")?;
        assert_eq!(
            group(&nml, "g").get("v"),
            Some(&ints(&[Some(1), None, Some(3), None, Some(5), None, Some(7)]))
        );
        Ok(())
    }

    #[test]
    fn test_nulls() -> Result<()> {
        let nml = Parser::new().reads("&g\n  x = 2.0, 2.0\n  y = , , ,\n  z = 1, , 3\n  n =\n  t = 1, 2,\n/")?;
        let grp = group(&nml, "g");
        assert_eq!(grp.get("y"), Some(&ints(&[None, None, None])));
        assert_eq!(grp.get("z"), Some(&ints(&[Some(1), None, Some(3)])));
        assert_eq!(grp.get("n"), Some(&FortranValue::Null));
        assert_eq!(grp.get("t"), Some(&ints(&[Some(1), Some(2)])));
        Ok(())
    }

    #[test]
    fn test_repeat_counts() -> Result<()> {
        let nml = Parser::new().reads("&g\n  a = 3*7, 2\n  b = 2*, 1\n/")?;
        let grp = group(&nml, "g");
        assert_eq!(grp.get("a"), Some(&ints(&[Some(7), Some(7), Some(7), Some(2)])));
        assert_eq!(grp.get("b"), Some(&ints(&[None, None, Some(1)])));

        let err = Parser::new().reads("&g a = 1.5*2 /").unwrap_err();
        assert!(matches!(err, FortnmlError::Syntax { .. }));
        Ok(())
    }

    #[test]
    fn test_repeated_assignments_merge() -> Result<()> {
        let nml = Parser::new().reads("&g\n  v(1) = 1\n  v(3) = 3\n  x = 1\n  x = 2\n/")?;
        let grp = group(&nml, "g");
        assert_eq!(grp.get("v"), Some(&ints(&[Some(1), None, Some(3)])));
        assert_eq!(grp.get("x"), Some(&FortranValue::Integer(2)));
        Ok(())
    }

    #[test]
    fn test_lower_index_pads_earlier_values() -> Result<()> {
        let nml = Parser::new().reads("&g\n  v = 1, 2\n  v(0) = 0\n/")?;
        let grp = group(&nml, "g");
        assert_eq!(grp.get("v"), Some(&ints(&[Some(0), Some(1), Some(2)])));
        assert_eq!(grp.start_index("v"), Some(&[Some(0)][..]));
        Ok(())
    }

    #[test]
    fn test_single_index_keeps_list() -> Result<()> {
        let nml = Parser::new().reads("&g v(2) = 5 /")?;
        let grp = group(&nml, "g");
        assert_eq!(grp.get("v"), Some(&ints(&[Some(5)])));
        assert_eq!(grp.start_index("v"), Some(&[Some(2)][..]));
        Ok(())
    }

    #[test]
    fn test_multidimensional() -> Result<()> {
        let text = "&g m(1:2, 1:2) = 1, 2, 3, 4 /";

        let nml = Parser::new().reads(text)?;
        assert_eq!(
            group(&nml, "g").get("m"),
            Some(&FortranValue::Array(vec![
                ints(&[Some(1), Some(2)]),
                ints(&[Some(3), Some(4)]),
            ]))
        );

        let nml = Parser::new().with_row_major(true).reads(text)?;
        assert_eq!(
            group(&nml, "g").get("m"),
            Some(&FortranValue::Array(vec![
                ints(&[Some(1), Some(3)]),
                ints(&[Some(2), Some(4)]),
            ]))
        );
        Ok(())
    }

    #[test]
    fn test_values_past_last_index_are_dropped() -> Result<()> {
        init();
        let nml = Parser::new().reads("&g v(1:2) = 1, 2, 3 /")?;
        assert_eq!(group(&nml, "g").get("v"), Some(&ints(&[Some(1), Some(2)])));
        Ok(())
    }

    #[test]
    fn test_derived_types() -> Result<()> {
        let nml = Parser::new().reads("&g\n  a%b = 1\n  a%c%d = 'x'\n/")?;
        let a = group(&nml, "g").get("a").and_then(FortranValue::as_namelist).cloned().unwrap_or_default();
        assert_eq!(a.get("b"), Some(&FortranValue::Integer(1)));
        assert_eq!(
            a.get("c").and_then(FortranValue::as_namelist).and_then(|c| c.get("d")),
            Some(&FortranValue::character("x"))
        );
        Ok(())
    }

    #[test]
    fn test_derived_type_arrays() -> Result<()> {
        let nml = Parser::new().reads("&g a%b(2)%c = 2 /")?;
        let a = group(&nml, "g").get("a").and_then(FortranValue::as_namelist).cloned().unwrap_or_default();

        let mut c = Namelist::new();
        c.set("c", 2);
        assert_eq!(a.get("b"), Some(&FortranValue::DerivedArray(vec![None, Some(c)])));
        assert_eq!(a.start_index("b"), Some(&[Some(2)][..]));

        let nml = Parser::new().reads("&g\n  p(1)%x = 1\n  p(2)%x = 2\n  p(1)%y = 3\n/")?;
        let p = group(&nml, "g").get("p").cloned();
        let Some(FortranValue::DerivedArray(items)) = p else {
            panic!("expected a derived type array, got {:?}", p);
        };
        assert_eq!(items.len(), 2);
        let first = items[0].clone().unwrap_or_default();
        assert_eq!(first.get("x"), Some(&FortranValue::Integer(1)));
        assert_eq!(first.get("y"), Some(&FortranValue::Integer(3)));
        Ok(())
    }

    #[test]
    fn test_cogroups() -> Result<()> {
        let nml = Parser::new().reads("&grp x = 1 /\n&other y = 0 /\n&grp x = 2 /\n")?;
        let values: Vec<i64> = nml
            .cogroup("grp")
            .map(|c| c.iter().filter_map(|g| g.get("x").and_then(FortranValue::as_i64)).collect())
            .unwrap_or_default();
        assert_eq!(values, vec![1, 2]);
        assert_eq!(nml.keys().collect::<Vec<_>>(), vec!["grp", "other", "grp"]);
        Ok(())
    }

    #[test]
    fn test_classic_groups_and_comments() -> Result<()> {
        let text = "leading text\n$legacy\n  x = 1 ! note\n$end\n&modern y = 2 &end\n";
        let nml = Parser::new().reads(text)?;
        assert_eq!(nml.group("legacy").and_then(|g| g.get("x")), Some(&FortranValue::Integer(1)));
        assert_eq!(nml.group("modern").and_then(|g| g.get("y")), Some(&FortranValue::Integer(2)));
        Ok(())
    }

    #[test]
    fn test_comment_tokens() -> Result<()> {
        let text = "&g\n  x = 1 # hash comment\n/";
        let nml = Parser::new().with_comment_tokens(vec!['!', '#']).reads(text)?;
        assert_eq!(nml.group("g").and_then(|g| g.get("x")), Some(&FortranValue::Integer(1)));
        Ok(())
    }

    #[test]
    fn test_strict_logical() -> Result<()> {
        let text = "&g b = .tru /";
        let strict = Parser::new().reads(text)?;
        assert_eq!(strict.group("g").and_then(|g| g.get("b")), Some(&FortranValue::character(".tru")));
        let lenient = Parser::new().with_strict_logical(false).reads(text)?;
        assert_eq!(lenient.group("g").and_then(|g| g.get("b")), Some(&FortranValue::Logical(true)));
        Ok(())
    }

    #[test]
    fn test_adjacent_strings_concatenate() -> Result<()> {
        let nml = Parser::new().reads("&g s = 'abc'\"def\" 'ghi' /")?;
        assert_eq!(
            nml.group("g").and_then(|g| g.get("s")),
            Some(&FortranValue::Array(vec!["abcdef".into(), "ghi".into()]))
        );
        Ok(())
    }

    #[test]
    fn test_global_start_index() -> Result<()> {
        let nml = Parser::new().with_global_start_index(Some(0)).reads("&g v(2:3) = 2, 3 /")?;
        let grp = group(&nml, "g");
        assert_eq!(grp.get("v"), Some(&ints(&[None, None, Some(2), Some(3)])));
        assert_eq!(grp.start_index("v"), Some(&[Some(0)][..]));
        Ok(())
    }

    #[test]
    fn test_index_errors() {
        let cases = [
            ("&g v() = 1 /", "index cannot be empty"),
            ("&g v(1::2) = 1 /", "end index cannot be implicit when using stride"),
            ("&g v(1:3:) = 1 /", "stride index cannot be implicit"),
            ("&g v(1:3:0) = 1 /", "stride index cannot be zero"),
            ("&g v(1 2) = 1 /", "index did not terminate correctly"),
            ("&g a(1:2)%b = 1 /", "derived type index must be a single element"),
        ];
        for (text, expected) in cases {
            match Parser::new().reads(text) {
                Err(FortnmlError::InvalidIndex { variable, message }) => {
                    assert_eq!(variable, text[3..4].to_string());
                    assert_eq!(message, expected);
                }
                other => panic!("{}: unexpected result {:?}", text, other),
            }
        }
    }

    #[test]
    fn test_unterminated_group() {
        let err = Parser::new().reads("&g\n  x = 1\n").unwrap_err();
        assert!(matches!(err, FortnmlError::UnterminatedGroup { ref group } if group == "g"));
    }

    #[test]
    fn test_unexpected_token_in_values() {
        let err = Parser::new().reads("&g x = 1, ; /").unwrap_err();
        assert!(matches!(err, FortnmlError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_stray_token_in_group() {
        for text in ["&g 1 = 2 /", "&g\n  x = 1\n/\n&h\n  y\n/"] {
            let err = Parser::new().reads(text).unwrap_err();
            assert!(matches!(err, FortnmlError::Syntax { .. }), "{}: {:?}", text, err);
        }
        let err = Parser::new().reads("&g\n  x = 1\n/\n&h\n  y\n/").unwrap_err();
        assert!(matches!(err, FortnmlError::Syntax { line: 5, .. }));
    }

    #[test]
    fn test_patch_scalar_keeps_formatting() -> Result<()> {
        let text = "! run settings\n&run\n  dt = 100.0  ! seconds\n  nspool = 36 ! output\n/\n";
        let mut patch = Namelist::new();
        let mut run = Namelist::new();
        run.set("nspool", 72);
        patch.set("run", run);

        let (nml, output) = Parser::new().patch_str(text, &patch)?;
        assert_eq!(
            output,
            "! run settings\n&run\n  dt = 100.0  ! seconds\n  nspool = 72 ! output\n/\n"
        );
        assert_eq!(nml.group("run").and_then(|g| g.get("nspool")), Some(&FortranValue::Integer(72)));
        Ok(())
    }

    #[test]
    fn test_patch_lists() -> Result<()> {
        let text = "&g\n  a = 1, 2, 3\n  b = 1\n  c = 1, , 3\n/\n";
        let mut grp = Namelist::new();
        grp.set("a", vec![7])
            .set("b", vec![4, 5, 6])
            .set("c", vec![FortranValue::Null, 2.into(), FortranValue::Null]);
        let mut patch = Namelist::new();
        patch.set("g", grp);

        let (_, output) = Parser::new().patch_str(text, &patch)?;
        assert_eq!(output, "&g\n  a = 7\n  b = 4, 5, 6\n  c = , 2, \n/\n");
        Ok(())
    }

    #[test]
    fn test_patch_shortened_list_leaves_no_blank_line() -> Result<()> {
        let text = "&g\n  x = 1,\n  2, ! two\n  3\n  y = 0\n/\n";
        let mut grp = Namelist::new();
        grp.set("x", 7);
        let mut patch = Namelist::new();
        patch.set("g", grp);

        let (_, output) = Parser::new().patch_str(text, &patch)?;
        assert_eq!(output, "&g\n  x = 7 ! two\n  y = 0\n/\n");
        Ok(())
    }

    #[test]
    fn test_patch_appends_missing_variables() -> Result<()> {
        let text = "&g\n  x = 1\n/\n&h y = 2 /\n";
        let mut g = Namelist::new();
        g.set("z", true);
        let mut h = Namelist::new();
        h.set("w", "new");
        let mut patch = Namelist::new();
        patch.set("g", g).set("h", h);

        let (nml, output) = Parser::new().patch_str(text, &patch)?;
        assert_eq!(output, "&g\n  x = 1\n    z = .true.\n/\n&h y = 2 \n    w = 'new'\n/\n");
        assert_eq!(nml.group("g").and_then(|g| g.get("z")), Some(&FortranValue::Logical(true)));
        Ok(())
    }

    #[test]
    fn test_patch_derived_field() -> Result<()> {
        let text = "&g\n  a%b = 1\n  a%c = 2\n/\n";
        let mut a = Namelist::new();
        a.set("c", 20);
        let mut grp = Namelist::new();
        grp.set("a", a);
        let mut patch = Namelist::new();
        patch.set("g", grp);

        let (nml, output) = Parser::new().patch_str(text, &patch)?;
        assert_eq!(output, "&g\n  a%b = 1\n  a%c = 20\n/\n");
        let a = nml.group("g").and_then(|g| g.get("a")).and_then(FortranValue::as_namelist).cloned().unwrap_or_default();
        assert_eq!(a.get("b"), Some(&FortranValue::Integer(1)));
        assert_eq!(a.get("c"), Some(&FortranValue::Integer(20)));
        Ok(())
    }

    #[test]
    fn test_patch_cogroup_members_in_order() -> Result<()> {
        let text = "&g x = 1 /\n&g x = 2 /\n";
        let member = |x: i64| {
            let mut g = Namelist::new();
            g.set("x", x);
            g
        };
        let mut patch = Namelist::new();
        patch.add_cogroup("g", member(10));
        patch.add_cogroup("g", member(20));

        let (_, output) = Parser::new().patch_str(text, &patch)?;
        assert_eq!(output, "&g x = 10 /\n&g x = 20 /\n");
        Ok(())
    }

    #[test]
    fn test_patch_single_value_matches_reread() -> Result<()> {
        let text = "&g v = 3*1, 2 /\n";
        let mut grp = Namelist::new();
        grp.set("v", vec![5]);
        let mut patch = Namelist::new();
        patch.set("g", grp);

        let (nml, output) = Parser::new().patch_str(text, &patch)?;
        assert_eq!(output, "&g v = 5 /\n");
        assert_eq!(nml.group("g").and_then(|g| g.get("v")), Some(&FortranValue::Integer(5)));
        assert_eq!(nml, Parser::new().reads(&output)?);
        Ok(())
    }

    #[test]
    fn test_failed_patch_writes_nothing() {
        let mut out = Vec::new();
        let result = Parser::new().patch_to_writer("&g x = 1\n", &Namelist::new(), &mut out);
        assert!(result.is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn test_backup_path() {
        assert_eq!(backup_path(Path::new("dir/param.nml")), PathBuf::from("dir/param.nml~"));
    }
}
