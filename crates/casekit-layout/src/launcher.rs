//! Launcher scripts that forward to the installed main tool.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use casekit_model::Platform;
use tracing::debug;

use crate::error::{LayoutError, Result};
use crate::fsops::set_executable;

/// What a launcher runs and where it is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherSpec {
    /// Target path; on Windows a `.bat` extension is added when missing.
    pub path: PathBuf,
    /// Main tool executable name.
    pub product: String,
    /// Sub-command passed to the tool (`gui`, `run`).
    pub subcommand: String,
    /// Directory prepended to `PATH` so the right tool is found.
    pub bin_dir: PathBuf,
    pub platform: Platform,
    /// Study and case names recorded in a comment at the top of the script.
    pub labels: Option<(String, String)>,
}

impl LauncherSpec {
    /// Path the launcher is written to on its platform.
    #[must_use]
    pub fn target_path(&self) -> PathBuf {
        match self.platform {
            Platform::Unix => self.path.clone(),
            Platform::Windows => {
                let has_bat = self
                    .path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("bat"));
                if has_bat {
                    self.path.clone()
                } else {
                    let mut name = self.path.as_os_str().to_os_string();
                    name.push(".bat");
                    PathBuf::from(name)
                }
            }
        }
    }

    /// The command line the launcher ends with.
    #[must_use]
    pub fn invocation(&self) -> String {
        match self.platform {
            // The leading backslash bypasses shell aliases.
            Platform::Unix => format!("\\{} {} \"$@\"", self.product, self.subcommand),
            Platform::Windows => format!("{} {} %*", self.product, self.subcommand),
        }
    }
}

/// Render the launcher script text.
#[must_use]
pub fn render_launcher(spec: &LauncherSpec) -> String {
    let bin_dir = spec.bin_dir.display().to_string();
    let mut script = String::new();
    match spec.platform {
        Platform::Unix => {
            let _ = writeln!(script, "#!/bin/sh");
            let _ = writeln!(script);
            if let Some((study, case)) = &spec.labels {
                let _ = writeln!(script, "# Study: {study}  Case: {case}");
                let _ = writeln!(script);
            }
            let _ = writeln!(script, "# Ensure the correct command is found:");
            let _ = writeln!(script, "export PATH=\"{}\":$PATH", sh_quoted(&bin_dir));
            let _ = writeln!(script);
            let _ = writeln!(script, "# Run command:");
            let _ = writeln!(script, "{}", spec.invocation());
        }
        Platform::Windows => {
            let _ = write!(script, "@echo off\r\n\r\n");
            if let Some((study, case)) = &spec.labels {
                let _ = write!(script, "rem Study: {study}  Case: {case}\r\n\r\n");
            }
            let _ = write!(script, "rem Ensure the correct command is found:\r\n");
            let _ = write!(
                script,
                "set PATH={};%PATH%\r\n\r\n",
                bin_dir.replace('%', "%%")
            );
            let _ = write!(script, "rem Run command:\r\n");
            let _ = write!(script, "{}\r\n", spec.invocation());
        }
    }
    script
}

/// Escape the characters that stay special inside a double-quoted sh word.
fn sh_quoted(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '"' | '\\' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted
}

/// Write the launcher, overwriting any existing file, and mark it executable.
///
/// Returns the path actually written.
pub fn write_launcher(spec: &LauncherSpec) -> Result<PathBuf> {
    let path = spec.target_path();
    write_script(&path, &render_launcher(spec))?;
    if spec.platform.has_executable_bit() {
        set_executable(&path)?;
    }
    debug!(
        path = %path.display(),
        product = %spec.product,
        subcommand = %spec.subcommand,
        "wrote launcher"
    );
    Ok(path)
}

fn write_script(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|source| LayoutError::Launcher {
        path: path.to_path_buf(),
        source,
    })
}
