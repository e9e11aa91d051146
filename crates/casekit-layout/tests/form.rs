//! Tests for the case directory form display model.

use std::fs;
use std::path::{Path, PathBuf};

use casekit_layout::form::{
    CaseForm, NOT_FOUND_PLACEHOLDER, UNKNOWN_DIR_PLACEHOLDER, initial_case_path,
};
use casekit_layout::resolve_display;
use casekit_model::{LayoutConfig, Subdir};

fn make_case(root: &Path, study: &str, case: &str, subdirs: &[&str]) -> PathBuf {
    let case_dir = root.join(study).join(case);
    for name in subdirs {
        fs::create_dir_all(case_dir.join(name)).expect("create subdir");
    }
    fs::create_dir_all(&case_dir).expect("create case");
    case_dir
}

#[test]
fn present_and_missing_fields() {
    let root = tempfile::tempdir().expect("temp dir");
    let case = make_case(root.path(), "S1", "C1", &["DATA", "SRC"]);

    let model = resolve_display(&case, &LayoutConfig::default());

    let data = model.field(Subdir::Data).expect("data field");
    assert_eq!(data.text, "DATA");
    assert_eq!(data.warning, None);
    assert_eq!(data.path.as_deref(), Some(case.join("DATA").as_path()));

    let results = model.field(Subdir::Results).expect("results field");
    assert_eq!(results.text, NOT_FOUND_PLACEHOLDER);
    assert_eq!(
        results.warning.as_deref(),
        Some("the RESU sub-directory is required")
    );

    let mesh = model.field(Subdir::Mesh).expect("mesh field");
    assert_eq!(mesh.text, NOT_FOUND_PLACEHOLDER);
    assert!(
        mesh.warning
            .as_deref()
            .is_some_and(|warning| warning.contains("at the level of the case directory"))
    );
    assert_eq!(model.warnings().count(), 3);
}

#[test]
fn missing_directory_shows_unknown_everywhere() {
    let root = tempfile::tempdir().expect("temp dir");
    let model = resolve_display(&root.path().join("gone"), &LayoutConfig::default());

    assert!(!model.case_exists);
    assert!(
        model
            .fields
            .iter()
            .all(|field| field.text == UNKNOWN_DIR_PLACEHOLDER)
    );
    let warnings: Vec<&str> = model.warnings().collect();
    assert_eq!(warnings, vec!["the given directory does not exist"]);
}

#[test]
fn selecting_directory_updates_fields_and_identity() {
    let root = tempfile::tempdir().expect("temp dir");
    let first = make_case(root.path(), "S1", "C1", &["DATA"]);
    let second = make_case(root.path(), "S2", "C9", &["DATA", "RESU", "SRC", "SCRIPTS"]);
    fs::create_dir_all(root.path().join("S2/MESH")).expect("mesh");
    let xml = first.join("DATA/setup.xml");

    let mut form = CaseForm::open(Some(&first), Some(&xml), root.path(), LayoutConfig::default());
    assert_eq!(form.identity().case, "C1");
    assert_eq!(form.identity().xml_file.as_deref(), Some("setup.xml"));

    let model = form.select_directory(&second).clone();
    assert!(model.warnings().next().is_none());
    assert_eq!(form.case_path(), second.as_path());
    assert_eq!(form.identity().study, "S2");
    assert_eq!(form.identity().case, "C9");
    assert_eq!(form.identity().xml_file.as_deref(), Some("setup.xml"));
}

#[test]
fn initial_path_follows_setup_file_location() {
    let layout = LayoutConfig::default();
    let cwd = Path::new("/work/S1/C1");

    let initial = initial_case_path(None, cwd, &layout);
    assert_eq!(initial.path, PathBuf::from("/work/S1/C1"));

    let initial = initial_case_path(None, Path::new("/work/S1/C1/DATA"), &layout);
    assert_eq!(initial.path, PathBuf::from("/work/S1/C1"));

    let initial = initial_case_path(Some(Path::new("/work/S1/C2/DATA/case.xml")), cwd, &layout);
    assert_eq!(initial.path, PathBuf::from("/work/S1/C2"));
    assert_eq!(initial.warning, None);

    let initial = initial_case_path(Some(Path::new("/work/S1/C2/case.xml")), cwd, &layout);
    assert_eq!(initial.path, PathBuf::from("/work/S1/C2"));
    assert!(initial.warning.is_some());

    let initial = initial_case_path(Some(Path::new("case.xml")), cwd, &layout);
    assert_eq!(initial.path, PathBuf::from("/work/S1"));
}

#[test]
fn open_without_case_path_uses_working_directory() {
    let root = tempfile::tempdir().expect("temp dir");
    let case = make_case(root.path(), "S1", "C1", &["DATA", "RESU"]);

    let form = CaseForm::open(None, None, &case.join("DATA"), LayoutConfig::default());

    assert_eq!(form.case_path(), case.as_path());
    assert_eq!(form.open_warning(), None);
    assert_eq!(form.identity().study, "S1");
}

#[test]
fn selecting_a_parent_path_keeps_study_and_case() {
    let root = tempfile::tempdir().expect("temp dir");
    let case = make_case(root.path(), "S1", "C1", &["DATA"]);
    fs::create_dir_all(root.path().join("S1/MESH")).expect("mesh");
    let mut form = CaseForm::open(Some(&case), None, root.path(), LayoutConfig::default());

    let model = form.select_directory(&case.join("DATA").join("..")).clone();

    assert_eq!(form.case_path(), case.as_path());
    assert!(model.field(Subdir::Mesh).is_some_and(|field| field.path.is_some()));
    assert_eq!(form.identity().study, "S1");
    assert_eq!(form.identity().case, "C1");
}
