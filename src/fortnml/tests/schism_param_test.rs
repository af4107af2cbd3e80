// fortnml/tests/schism_param_test.rs

//! Integration tests against a trimmed SCHISM `param.nml`.

use fortnml::{FortnmlError, FortranValue, Namelist, Result};
use std::fs;
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn init() {
    let _ = pretty_env_logger::try_init();
}

fn group<'a>(nml: &'a Namelist, name: &str) -> &'a Namelist {
    nml.group(name)
        .unwrap_or_else(|| panic!("group {} not found", name))
}

#[test]
fn test_parse_schism_param_nml() -> Result<()> {
    init();
    let nml = fortnml::read(fixture("param.nml"))?;

    assert_eq!(nml.keys().collect::<Vec<_>>(), vec!["core", "opt", "schout"]);
    assert_eq!(group(&nml, "core").len(), 13);
    assert!(group(&nml, "CORE").contains("IHFSKIP"));
    Ok(())
}

#[test]
fn test_schism_param_specific_values() -> Result<()> {
    let nml = fortnml::read(fixture("param.nml"))?;

    let core = group(&nml, "core");
    assert_eq!(core.get("ibc"), Some(&FortranValue::Integer(0)));
    assert_eq!(core.get("ibtp"), Some(&FortranValue::Integer(1)));
    assert_eq!(core.get("rnday"), Some(&FortranValue::Real(30.0)));
    assert_eq!(core.get("dt"), Some(&FortranValue::Real(100.0)));

    let opt = group(&nml, "opt");
    assert_eq!(opt.get("slam0"), Some(&FortranValue::Integer(-124)));
    assert_eq!(opt.get("h0"), Some(&FortranValue::Real(0.01)));
    assert_eq!(opt.get("ic_elev"), Some(&FortranValue::Logical(false)));
    assert_eq!(opt.get("flag_ic"), Some(&FortranValue::from(vec![1, 1])));
    assert_eq!(opt.start_index("flag_ic"), Some(&[Some(1)][..]));
    assert_eq!(opt.get("veg_vert_scale_cd"), Some(&FortranValue::from(vec![1.0; 10])));

    let veg_z = opt.get("veg_vert_z").and_then(FortranValue::as_array).unwrap_or_default();
    assert_eq!(veg_z.len(), 10);
    assert_eq!(veg_z[9], FortranValue::Real(4.5));

    let schout = group(&nml, "schout");
    let iof = schout.get("iof_hydro").and_then(FortranValue::as_array).unwrap_or_default();
    assert_eq!(iof.len(), 14);
    assert_eq!(iof[0], FortranValue::Integer(1));
    assert!(iof[1..13].iter().all(FortranValue::is_null));
    assert_eq!(iof[13], FortranValue::Integer(1));
    Ok(())
}

#[test]
fn test_schism_param_roundtrip() -> Result<()> {
    let nml = fortnml::read(fixture("param.nml"))?;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("param.nml");
    fortnml::write(&nml, &path)?;

    let reparsed = fortnml::read(&path)?;
    assert_eq!(nml, reparsed);
    assert_eq!(
        group(&reparsed, "schout").start_index("iof_hydro"),
        Some(&[Some(1)][..])
    );
    Ok(())
}

#[test]
fn test_schism_param_patch_keeps_layout() -> Result<()> {
    init();
    let source = fixture("param.nml");
    let original = fs::read_to_string(&source)?;

    let mut core = Namelist::new();
    core.set("dt", 150.0).set("nramp", 1);
    let mut opt = Namelist::new();
    opt.set("ihot", 1);
    let mut schout = Namelist::new();
    schout.set("nhot_write", 4320);
    let mut patch = Namelist::new();
    patch.set("core", core).set("opt", opt).set("schout", schout);

    let dir = tempfile::tempdir()?;
    let dest = dir.path().join("param.patched.nml");
    let nml = fortnml::patch(&source, &patch, Some(&dest))?;

    let expected = original
        .replace("dt = 100. !Time step", "dt = 150.0 !Time step")
        .replace("ihot = 0", "ihot = 1")
        .replace("nhot_write = 8640", "nhot_write = 4320")
        .replace(
            "ihfskip = 864 !stack spool\n/",
            "ihfskip = 864 !stack spool\n    nramp = 1\n/",
        );
    assert_eq!(fs::read_to_string(&dest)?, expected);

    let core = group(&nml, "core");
    assert_eq!(core.get("dt"), Some(&FortranValue::Real(150.0)));
    assert_eq!(core.get("nramp"), Some(&FortranValue::Integer(1)));
    assert_eq!(group(&nml, "opt").get("ihot"), Some(&FortranValue::Integer(1)));
    Ok(())
}

#[test]
fn test_patch_defaults_to_backup_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let source = dir.path().join("param.nml");
    fs::copy(fixture("param.nml"), &source)?;

    let mut patch = Namelist::new();
    patch.set("core", Namelist::new());
    fortnml::patch(&source, &patch, None::<&Path>)?;

    let backup = dir.path().join("param.nml~");
    assert_eq!(fs::read_to_string(&backup)?, fs::read_to_string(&source)?);
    Ok(())
}

#[test]
fn test_patch_refuses_source_as_target() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let source = dir.path().join("param.nml");
    fs::copy(fixture("param.nml"), &source)?;

    let mut core = Namelist::new();
    core.set("dt", 1.0);
    let mut patch = Namelist::new();
    patch.set("core", core);

    let err = fortnml::patch(&source, &patch, Some(&source)).unwrap_err();
    assert!(matches!(err, FortnmlError::PatchTarget(_)));
    assert_eq!(
        fs::read_to_string(&source)?,
        fs::read_to_string(fixture("param.nml"))?
    );
    Ok(())
}
