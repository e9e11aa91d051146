use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use casekit_layout::{CaseForm, SkeletonReport, SkeletonRequest, ensure_skeleton};
use casekit_model::{PackageConfig, Platform};
use casekit_vnv::{CampaignOptions, CampaignOutcome, ProcessRunner, SmtpTransport, run_campaign};
use tracing::info_span;

/// One case refreshed by [`run_update`].
#[derive(Debug, Clone)]
pub struct CaseUpdate {
    pub name: String,
    pub report: SkeletonReport,
}

/// Case directories to update: `-c` values, else positional values, else `.`.
#[must_use]
pub fn case_targets(flagged: &[String], positional: &[String]) -> Vec<String> {
    if !flagged.is_empty() {
        flagged.to_vec()
    } else if !positional.is_empty() {
        positional.to_vec()
    } else {
        vec![".".to_string()]
    }
}

#[must_use]
pub fn update_banner(package: &PackageConfig) -> String {
    format!("{} {} case update", package.name, package.version)
}

/// Refresh the skeleton of each case, relative to the study directory `cwd`.
///
/// Stops at the first case that cannot be updated.
pub fn run_update(
    package: &PackageConfig,
    cases: &[String],
    cwd: &Path,
    platform: Platform,
    quiet: bool,
) -> Result<Vec<CaseUpdate>> {
    let study_name = base_name(cwd)?;
    let mut updates = Vec::with_capacity(cases.len());
    for case in cases {
        let (case_root, case_name) = if case == "." {
            (cwd.to_path_buf(), study_name.clone())
        } else {
            (cwd.join(case), case.clone())
        };
        let span = info_span!("update", case = %case_name);
        let _guard = span.enter();
        if !quiet {
            println!("  o Updating case '{case_name}' paths...");
        }
        if !case_root.is_dir() {
            bail!("case directory {} does not exist", case_root.display());
        }
        let report = ensure_skeleton(&SkeletonRequest {
            case_root: &case_root,
            package,
            study_name: &study_name,
            case_name: &case_name,
            platform,
        })
        .with_context(|| format!("update case {case_name}"))?;
        updates.push(CaseUpdate {
            name: case_name,
            report,
        });
    }
    Ok(updates)
}

/// Open the case form on `dir` (or the working directory) and return it.
#[must_use]
pub fn run_inspect(
    package: &PackageConfig,
    dir: Option<&Path>,
    xml_file: Option<&Path>,
    cwd: &Path,
) -> CaseForm {
    let case_path = dir.map(|dir| absolute_from(cwd, dir));
    let xml_file = xml_file.map(|xml| absolute_from(cwd, xml));
    CaseForm::open(
        case_path.as_deref(),
        xml_file.as_deref(),
        cwd,
        package.layout.clone(),
    )
}

/// Run a campaign with real subprocesses and SMTP delivery.
pub fn run_autovnv(package: &PackageConfig, options: &CampaignOptions) -> Result<CampaignOutcome> {
    let mut runner = ProcessRunner;
    let mut mailer = SmtpTransport::new(options.mail.clone(), local_host_name());
    let outcome = run_campaign(package, options, &mut runner, &mut mailer)?;
    Ok(outcome)
}

fn absolute_from(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

fn base_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no directory name", path.display()))
}

fn local_host_name() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|name| !name.is_empty())
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
        })
        .unwrap_or_else(|| "localhost".to_string())
}
