//! External tool invocation.
//!
//! The solver and the checkpoint comparison utility are opaque executables;
//! the campaign only sees them through [`ToolRunner`].

use std::path::{Path, PathBuf};
use std::process::Command;

use casekit_model::PackageConfig;
use tracing::{debug, warn};

use crate::error::{Result, VnvError};

/// One blocking subprocess call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub current_dir: PathBuf,
}

impl Invocation {
    pub fn new(program: &Path, current_dir: &Path) -> Self {
        Self {
            program: program.to_path_buf(),
            args: Vec::new(),
            current_dir: current_dir.to_path_buf(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Command line as written in reports.
    #[must_use]
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Result of a finished subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutcome {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutcome {
    /// Short description of the exit state for report lines.
    #[must_use]
    pub fn describe(&self) -> String {
        match (self.success, self.code) {
            (true, _) => "success".to_string(),
            (false, Some(code)) => format!("exit status {code}"),
            (false, None) => "terminated by signal".to_string(),
        }
    }
}

/// Runs external tools on behalf of the campaign.
pub trait ToolRunner {
    /// Run to completion. An `Err` means the program could not be started;
    /// a non-zero exit is reported through [`ToolOutcome::success`].
    fn run(&mut self, invocation: &Invocation) -> Result<ToolOutcome>;
}

/// [`ToolRunner`] backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<ToolOutcome> {
        debug!(
            command = %invocation.command_line(),
            cwd = %invocation.current_dir.display(),
            "running tool"
        );
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.current_dir)
            .output()
            .map_err(|source| VnvError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;
        let outcome = ToolOutcome {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if !outcome.success {
            warn!(
                command = %invocation.command_line(),
                status = %outcome.describe(),
                "tool failed"
            );
        }
        Ok(outcome)
    }
}

/// Located solver and comparison executables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tools {
    pub solver: PathBuf,
    pub io_dump: PathBuf,
}

impl Tools {
    /// Check that both executables exist as files.
    pub fn locate(package: &PackageConfig) -> Result<Self> {
        let solver = package.solver_executable();
        let io_dump = package.io_dump();
        for path in [&solver, &io_dump] {
            if !path.is_file() {
                return Err(VnvError::MissingExecutable { path: path.clone() });
            }
        }
        Ok(Self { solver, io_dump })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn command_line_joins_arguments() {
        let invocation = Invocation::new(Path::new("/opt/bin/code_saturne"), Path::new("/tmp"))
            .arg("run")
            .args(["--id", "vnv"]);
        assert_eq!(invocation.command_line(), "/opt/bin/code_saturne run --id vnv");
    }

    #[test]
    fn locate_reports_first_missing_executable() {
        let dir = tempfile::tempdir().expect("temp dir");
        let package = PackageConfig {
            prefix: dir.path().to_path_buf(),
            ..PackageConfig::default()
        };
        let err = Tools::locate(&package).expect_err("solver missing");
        let solver = package.solver_executable();
        assert!(matches!(err, VnvError::MissingExecutable { ref path } if *path == solver));

        fs::create_dir_all(package.bin_dir()).expect("bin dir");
        fs::write(package.solver_executable(), "").expect("solver");
        let err = Tools::locate(&package).expect_err("io_dump missing");
        assert!(
            matches!(err, VnvError::MissingExecutable { ref path } if *path == package.io_dump())
        );

        fs::create_dir_all(package.libexec_dir()).expect("libexec dir");
        fs::write(package.io_dump(), "").expect("io_dump");
        let tools = Tools::locate(&package).expect("both present");
        assert_eq!(tools.solver, package.solver_executable());
    }

    #[cfg(unix)]
    #[test]
    fn process_runner_captures_exit_status() {
        let dir = tempfile::tempdir().expect("temp dir");
        let ok = ProcessRunner
            .run(&Invocation::new(Path::new("/bin/sh"), dir.path()).args(["-c", "echo hi"]))
            .expect("spawn");
        assert!(ok.success);
        assert_eq!(ok.stdout, "hi\n");

        let failed = ProcessRunner
            .run(&Invocation::new(Path::new("/bin/sh"), dir.path()).args(["-c", "exit 3"]))
            .expect("spawn");
        assert!(!failed.success);
        assert_eq!(failed.describe(), "exit status 3");

        let err = ProcessRunner
            .run(&Invocation::new(&dir.path().join("absent"), dir.path()))
            .expect_err("no such program");
        assert!(matches!(err, VnvError::Spawn { .. }));
    }
}
