//! Tests for the update and inspect commands.

use std::fs;
use std::path::Path;

use casekit_cli::commands::{run_inspect, run_update};
use casekit_cli::summary::{campaign_table, display_table};
use casekit_model::{PackageConfig, Platform, Subdir};
use casekit_vnv::{CampaignOutcome, CaseRecord, ReportLog, StepStatus};

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, contents).expect("write file");
}

fn package(root: &Path) -> PackageConfig {
    let package = PackageConfig {
        prefix: root.join("install"),
        ..PackageConfig::default()
    };
    let pkgdata = package.pkgdata_dir();
    write(&pkgdata.join("user/cs_user_parameters.c"), "/* params */\n");
    write(&pkgdata.join("user_examples/cs_user_example.c"), "/* example */\n");
    write(&pkgdata.join("cs_user_scripts.py"), "# scripts\n");
    package
}

#[test]
fn update_named_cases_relative_to_study() {
    let root = tempfile::tempdir().expect("temp dir");
    let package = package(root.path());
    let study = root.path().join("PIPE");
    fs::create_dir_all(study.join("LAMINAR")).expect("case");
    fs::create_dir_all(study.join("TURBULENT/DATA")).expect("case");

    let updates = run_update(
        &package,
        &["LAMINAR".to_string(), "TURBULENT".to_string()],
        &study,
        Platform::Unix,
        true,
    )
    .expect("update");

    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].name, "LAMINAR");
    assert_eq!(updates[0].report.created_dirs.len(), 4);
    assert_eq!(updates[1].report.created_dirs.len(), 3);
    for case in ["LAMINAR", "TURBULENT"] {
        let case_root = study.join(case);
        assert!(case_root.join("SRC/REFERENCE/cs_user_parameters.c").is_file());
        assert!(case_root.join("DATA/SaturneGUI").is_file());
        let runcase = fs::read_to_string(case_root.join("SCRIPTS/runcase")).expect("runcase");
        assert!(runcase.contains("code_saturne run"));
    }
}

#[test]
fn update_dot_uses_current_directory_name() {
    let root = tempfile::tempdir().expect("temp dir");
    let package = package(root.path());
    let case_root = root.path().join("PIPE/LAMINAR");
    fs::create_dir_all(&case_root).expect("case");

    let updates =
        run_update(&package, &[".".to_string()], &case_root, Platform::Unix, true).expect("update");

    assert_eq!(updates[0].name, "LAMINAR");
    assert!(case_root.join("RESU").is_dir());
}

#[test]
fn update_fails_for_missing_case() {
    let root = tempfile::tempdir().expect("temp dir");
    let package = package(root.path());

    let err = run_update(&package, &["GONE".to_string()], root.path(), Platform::Unix, true)
        .expect_err("missing case");

    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn inspect_reports_present_and_missing_directories() {
    let root = tempfile::tempdir().expect("temp dir");
    let package = PackageConfig::default();
    let case_root = root.path().join("PIPE/LAMINAR");
    fs::create_dir_all(case_root.join("DATA")).expect("data");
    fs::create_dir_all(root.path().join("PIPE/MESH")).expect("mesh");

    let form = run_inspect(&package, Some(Path::new("PIPE/LAMINAR")), None, root.path());

    assert_eq!(form.identity().study, "PIPE");
    let model = form.display();
    assert!(model.field(Subdir::Data).is_some_and(|field| field.path.is_some()));
    assert!(model.field(Subdir::Mesh).is_some_and(|field| field.path.is_some()));
    assert!(model.field(Subdir::Scripts).is_some_and(|field| field.path.is_none()));

    let table = display_table(model).to_string();
    assert!(table.contains("the SCRIPTS sub-directory is required"));
}

#[test]
fn campaign_table_lists_each_case() {
    let mut record = CaseRecord::new("PIPE", "LAMINAR");
    record.skeleton = StepStatus::Ok;
    record.compile = StepStatus::Failed;
    let outcome = CampaignOutcome {
        phases: Vec::new(),
        records: vec![record],
        reports: Vec::new(),
        mail: None,
        log: ReportLog::new(),
    };

    let table = campaign_table(&outcome).to_string();

    assert!(table.contains("LAMINAR"));
    assert!(table.contains("FAILED"));
}
