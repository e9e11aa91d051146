//! Tests for launcher script generation.

use std::fs;
use std::path::PathBuf;

use casekit_layout::{LauncherSpec, render_launcher, write_launcher};
use casekit_model::Platform;

fn spec(path: PathBuf, platform: Platform) -> LauncherSpec {
    LauncherSpec {
        path,
        product: "code_saturne".to_string(),
        subcommand: "gui".to_string(),
        bin_dir: PathBuf::from("/opt/code_saturne/bin"),
        platform,
        labels: None,
    }
}

#[test]
fn unix_launcher_snapshot() {
    let script = render_launcher(&spec(PathBuf::from("SaturneGUI"), Platform::Unix));
    insta::assert_snapshot!(script, @r#"
    #!/bin/sh

    # Ensure the correct command is found:
    export PATH="/opt/code_saturne/bin":$PATH

    # Run command:
    \code_saturne gui "$@"
    "#);
}

#[test]
fn windows_launcher_uses_batch_syntax() {
    let script = render_launcher(&spec(PathBuf::from("runcase"), Platform::Windows));
    let lines: Vec<&str> = script.split("\r\n").collect();
    assert_eq!(lines[0], "@echo off");
    assert!(lines.contains(&"set PATH=/opt/code_saturne/bin;%PATH%"));
    assert!(lines.contains(&"code_saturne gui %*"));
    assert!(!script.contains('\\'));
}

#[test]
fn write_overwrites_existing_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("SaturneGUI");
    fs::write(&path, "old content").expect("write old");

    let written = write_launcher(&spec(path.clone(), Platform::Unix)).expect("write launcher");

    assert_eq!(written, path);
    let script = fs::read_to_string(&path).expect("read launcher");
    assert!(!script.contains("old content"));
    assert!(script.ends_with("\\code_saturne gui \"$@\"\n"));
}

#[cfg(unix)]
#[test]
fn written_launcher_is_executable() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().expect("temp dir");
    let written =
        write_launcher(&spec(dir.path().join("runcase"), Platform::Unix)).expect("write launcher");
    let mode = fs::metadata(&written).expect("meta").permissions().mode();
    assert_eq!(mode & 0o111, 0o111);
}
