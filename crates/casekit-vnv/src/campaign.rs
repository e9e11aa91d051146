//! Validation campaign driver.
//!
//! Phases run in a fixed order:
//! `Init -> (UpdateRepository | CheckRepository) -> CreateStudies -> Compile
//! -> [Run] -> [CompareCheckpoints] -> [Postprocess] -> Report -> [Mail]`.
//! Studies and cases are processed sequentially in declaration order. A case
//! whose skeleton could not be built takes no further part in the campaign;
//! compile and run failures are recorded and the campaign moves on.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use casekit_layout::fsops::{MergePolicy, copy_merge, create_dir};
use casekit_layout::{SkeletonRequest, ensure_skeleton};
use casekit_model::{PackageConfig, Platform};
use serde::Serialize;
use tracing::{info, info_span, warn};

use crate::error::Result;
use crate::mail::{MailDelivery, MailMessage, MailSettings, MailTransport, send_report};
use crate::params::{
    CaseParams, CompareParams, Parameters, PlotParams, ScriptParams, StudyParams, split_args,
};
use crate::report::{
    CaseRecord, HostInfo, ReportHeader, ReportLog, StepStatus, build_reports, write_footer,
    write_header,
};
use crate::tools::{Invocation, ToolOutcome, ToolRunner, Tools};

/// Checkpoint file compared by the comparison utility, relative to a run directory.
pub const CHECKPOINT_FILE: &str = "checkpoint/main";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignOptions {
    pub parameter_file: PathBuf,
    /// Refresh repository case skeletons and stop.
    pub update_repository: bool,
    pub run: bool,
    pub compare: bool,
    pub postprocess: bool,
    /// Report recipients; no mail is sent when empty.
    pub recipients: Vec<String>,
    pub platform: Platform,
    pub mail: MailSettings,
}

impl CampaignOptions {
    #[must_use]
    pub fn new(parameter_file: impl Into<PathBuf>) -> Self {
        Self {
            parameter_file: parameter_file.into(),
            update_repository: false,
            run: false,
            compare: false,
            postprocess: false,
            recipients: Vec::new(),
            platform: Platform::current(),
            mail: MailSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Init,
    UpdateRepository,
    CheckRepository,
    CreateStudies,
    Compile,
    Run,
    CompareCheckpoints,
    Postprocess,
    Report,
    Mail,
}

/// Everything a campaign produced.
#[derive(Debug, Clone)]
pub struct CampaignOutcome {
    /// Phases entered, in order.
    pub phases: Vec<Phase>,
    pub records: Vec<CaseRecord>,
    /// Written report files; empty after a repository update.
    pub reports: Vec<PathBuf>,
    pub mail: Option<MailDelivery>,
    pub log: ReportLog,
}

impl CampaignOutcome {
    #[must_use]
    pub fn entered(&self, phase: Phase) -> bool {
        self.phases.contains(&phase)
    }

    #[must_use]
    pub fn failed_cases(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.has_failures())
            .count()
    }
}

struct CaseEntry<'a> {
    study: &'a StudyParams,
    case: &'a CaseParams,
    repo_root: PathBuf,
    dest_root: PathBuf,
    record: CaseRecord,
}

impl CaseEntry<'_> {
    fn active(&self) -> bool {
        self.record.skeleton == StepStatus::Ok
    }

    fn label(&self) -> String {
        format!("{}/{}", self.study.label, self.case.label)
    }
}

struct Campaign<'a> {
    package: &'a PackageConfig,
    options: &'a CampaignOptions,
    params: &'a Parameters,
    tools: Tools,
    log: ReportLog,
    phases: Vec<Phase>,
}

/// Run a full campaign.
///
/// # Errors
///
/// Missing executables, an unreadable parameter file, report write failures
/// and a failed fallback mail are fatal. Per-case failures are recorded in
/// the outcome instead.
pub fn run_campaign(
    package: &PackageConfig,
    options: &CampaignOptions,
    runner: &mut dyn ToolRunner,
    mailer: &mut dyn MailTransport,
) -> Result<CampaignOutcome> {
    let span = info_span!("campaign", file = %options.parameter_file.display());
    let _guard = span.enter();

    let tools = Tools::locate(package)?;
    let params = Parameters::load(&options.parameter_file)?;
    let mut campaign = Campaign {
        package,
        options,
        params: &params,
        tools,
        log: ReportLog::new(),
        phases: vec![Phase::Init],
    };
    campaign.header();

    let mut entries = campaign.entries();

    if options.update_repository {
        campaign.enter(Phase::UpdateRepository);
        campaign.update_repository(&mut entries);
        info!("repository updated");
        return Ok(campaign.finish(entries, Vec::new(), None));
    }

    if options.compare || options.postprocess {
        campaign.enter(Phase::CheckRepository);
        campaign.check_repository(&mut entries);
    }

    campaign.enter(Phase::CreateStudies);
    campaign.create_studies(&mut entries)?;

    campaign.enter(Phase::Compile);
    campaign.compile(runner, &mut entries);

    if options.run {
        campaign.enter(Phase::Run);
        campaign.run_cases(runner, &mut entries);
    }
    if options.compare {
        campaign.enter(Phase::CompareCheckpoints);
        campaign.compare(runner, &mut entries);
    }
    if options.postprocess {
        campaign.enter(Phase::Postprocess);
        campaign.postprocess(runner, &mut entries);
    }

    campaign.enter(Phase::Report);
    write_footer(&mut campaign.log);
    let records: Vec<CaseRecord> = entries.iter().map(|entry| entry.record.clone()).collect();
    let reports = build_reports(&params.destination, &campaign.log, &records)?;

    let mut delivery = None;
    if !options.recipients.is_empty() {
        campaign.enter(Phase::Mail);
        let message = MailMessage {
            from: options.mail.from.clone(),
            to: options.recipients.clone(),
            subject: mail_subject(&package.code_name, chrono::Local::now().date_naive()),
            body: campaign.log.to_text(),
            attachments: reports.clone(),
        };
        delivery = Some(send_report(mailer, &message)?);
    }

    Ok(campaign.finish(entries, reports, delivery))
}

/// Subject line of the report mail.
#[must_use]
pub fn mail_subject(code_name: &str, date: chrono::NaiveDate) -> String {
    format!("{code_name}. Auto V&V {}", date.format("%Y-%m-%d"))
}

impl<'a> Campaign<'a> {
    fn enter(&mut self, phase: Phase) {
        info!(?phase, "entering phase");
        self.phases.push(phase);
    }

    fn header(&mut self) {
        let header = ReportHeader {
            product: self.package.name.clone(),
            version: self.package.version.clone(),
            prefix: self.package.prefix.clone(),
            compare_command: format!("{} -d", self.tools.io_dump.display()),
            repository: self.params.repository.clone(),
            destination: self.params.destination.clone(),
        };
        write_header(&mut self.log, &header, &HostInfo::collect());
    }

    fn entries(&self) -> Vec<CaseEntry<'a>> {
        self.params
            .enabled_cases()
            .map(|(study, case)| CaseEntry {
                study,
                case,
                repo_root: self.params.repository.join(&study.label).join(&case.label),
                dest_root: self.params.destination.join(&study.label).join(&case.label),
                record: CaseRecord::new(&study.label, &case.label),
            })
            .collect()
    }

    fn finish(
        self,
        entries: Vec<CaseEntry<'_>>,
        reports: Vec<PathBuf>,
        mail: Option<MailDelivery>,
    ) -> CampaignOutcome {
        CampaignOutcome {
            phases: self.phases,
            records: entries.into_iter().map(|entry| entry.record).collect(),
            reports,
            mail,
            log: self.log,
        }
    }

    fn skeleton(&self, case_root: &Path, entry: &CaseEntry<'_>) -> casekit_layout::Result<()> {
        ensure_skeleton(&SkeletonRequest {
            case_root,
            package: self.package,
            study_name: &entry.study.label,
            case_name: &entry.case.label,
            platform: self.options.platform,
        })
        .map(|_| ())
    }

    fn update_repository(&mut self, entries: &mut [CaseEntry<'_>]) {
        self.log.push(" Update repository:");
        for entry in entries.iter_mut() {
            let result = self.skeleton(&entry.repo_root, entry);
            let status = match result {
                Ok(()) => StepStatus::Ok,
                Err(error) => {
                    warn!(case = %entry.label(), %error, "repository case update failed");
                    entry.record.notes.push(format!("update failed: {error}"));
                    StepStatus::Failed
                }
            };
            entry.record.skeleton = status;
            self.log
                .push(format!("    o update {}: {status}", entry.label()));
        }
    }

    fn check_repository(&mut self, entries: &mut [CaseEntry<'_>]) {
        self.log.push(" Check repository:");
        let results_dir = &self.package.layout.results_dir;
        for entry in entries.iter_mut() {
            if self.options.compare {
                for compare in enabled_compares(entry.case) {
                    let checkpoint = entry
                        .repo_root
                        .join(results_dir)
                        .join(&compare.repo)
                        .join(CHECKPOINT_FILE);
                    if !checkpoint.is_file() {
                        self.log.push(format!(
                            "    o missing reference checkpoint for {}: {}",
                            entry.label(),
                            checkpoint.display()
                        ));
                        entry.record.notes.push(format!(
                            "repository checkpoint {} not found",
                            checkpoint.display()
                        ));
                    }
                }
            }
            if self.options.postprocess && entry.case.post.is_on() {
                let post_dir = self
                    .params
                    .repository
                    .join(&entry.study.label)
                    .join(&self.package.layout.post_dir);
                let labels = enabled_scripts(entry.case)
                    .map(|script| ("script", &script.label))
                    .chain(enabled_plots(entry.case).map(|plot| ("plot script", &plot.label)));
                for (kind, label) in labels {
                    let path = post_dir.join(label);
                    if !path.is_file() {
                        self.log.push(format!(
                            "    o missing {kind} for {}: {}",
                            entry.label(),
                            path.display()
                        ));
                        entry
                            .record
                            .notes
                            .push(format!("repository {kind} {} not found", path.display()));
                    }
                }
            }
        }
    }

    fn create_studies(&mut self, entries: &mut [CaseEntry<'_>]) -> Result<()> {
        self.log.push(" Create studies:");
        create_dir(&self.params.destination)?;
        let mut seeded_studies = BTreeSet::new();

        for entry in entries.iter_mut() {
            let span = info_span!("case", study = %entry.study.label, case = %entry.case.label);
            let _guard = span.enter();

            let result = self.create_case(entry, &mut seeded_studies);
            let status = match result {
                Ok(()) => StepStatus::Ok,
                Err(error) => {
                    warn!(%error, "case creation failed");
                    entry.record.notes.push(format!("case creation failed: {error}"));
                    StepStatus::Failed
                }
            };
            entry.record.skeleton = status;
            self.log
                .push(format!("    o create {}: {status}", entry.label()));
        }
        Ok(())
    }

    /// Create the study directory on first use, seed a new case from the
    /// repository, then build its skeleton.
    fn create_case(
        &self,
        entry: &CaseEntry<'_>,
        seeded_studies: &mut BTreeSet<String>,
    ) -> casekit_layout::Result<()> {
        let layout = &self.package.layout;
        let repo_study = self.params.repository.join(&entry.study.label);
        let dest_study = self.params.destination.join(&entry.study.label);
        if seeded_studies.insert(entry.study.label.clone()) {
            create_dir(&dest_study)?;
            for shared in [&layout.mesh_dir, &layout.post_dir] {
                let src = repo_study.join(shared);
                if src.is_dir() {
                    copy_merge(&src, &dest_study.join(shared), MergePolicy::Overlay)?;
                }
            }
        }
        if !entry.dest_root.is_dir() {
            for seeded in [&layout.data_dir, &layout.sources_dir] {
                let src = entry.repo_root.join(seeded);
                if src.is_dir() {
                    copy_merge(&src, &entry.dest_root.join(seeded), MergePolicy::Overlay)?;
                }
            }
        }
        self.skeleton(&entry.dest_root, entry)
    }

    fn compile(&mut self, runner: &mut dyn ToolRunner, entries: &mut [CaseEntry<'_>]) {
        self.log.push(" Compile:");
        for entry in entries.iter_mut().filter(|entry| entry.active()) {
            let src = entry.dest_root.join(&self.package.layout.sources_dir);
            let status = if has_user_sources(&src) {
                let invocation = Invocation::new(&self.tools.solver, &src).arg("compile");
                run_step(runner, &invocation, "compile", &mut entry.record)
            } else {
                StepStatus::Skipped
            };
            entry.record.compile = status;
            self.log
                .push(format!("    o compile {}: {status}", entry.label()));
        }
    }

    fn run_cases(&mut self, runner: &mut dyn ToolRunner, entries: &mut [CaseEntry<'_>]) {
        self.log.push(" Run:");
        for entry in entries.iter_mut().filter(|entry| entry.active()) {
            let status = if entry.record.compile == StepStatus::Failed {
                entry
                    .record
                    .notes
                    .push("run skipped after compile failure".to_string());
                StepStatus::Skipped
            } else if !entry.case.compute.is_on() {
                StepStatus::Skipped
            } else {
                let data = entry.dest_root.join(&self.package.layout.data_dir);
                let invocation = Invocation::new(&self.tools.solver, &data)
                    .arg("run")
                    .args(["--id", entry.case.run_id()]);
                run_step(runner, &invocation, "run", &mut entry.record)
            };
            entry.record.run = status;
            self.log.push(format!("    o run {}: {status}", entry.label()));
        }
    }

    fn compare(&mut self, runner: &mut dyn ToolRunner, entries: &mut [CaseEntry<'_>]) {
        self.log.push(" Compare checkpoints:");
        let results_dir = &self.package.layout.results_dir;
        for entry in entries.iter_mut().filter(|entry| entry.active()) {
            let mut status = StepStatus::NotRun;
            for compare in enabled_compares(entry.case) {
                let reference = entry
                    .repo_root
                    .join(results_dir)
                    .join(&compare.repo)
                    .join(CHECKPOINT_FILE);
                let result_run = compare.dest.as_deref().unwrap_or(entry.case.run_id());
                let result = entry
                    .dest_root
                    .join(results_dir)
                    .join(result_run)
                    .join(CHECKPOINT_FILE);
                let missing: Vec<&Path> = [reference.as_path(), result.as_path()]
                    .into_iter()
                    .filter(|path| !path.is_file())
                    .collect();
                if !missing.is_empty() {
                    for path in missing {
                        entry
                            .record
                            .notes
                            .push(format!("checkpoint {} not found", path.display()));
                        self.log
                            .push(format!("    o missing checkpoint {}", path.display()));
                    }
                    status = status.merge(StepStatus::Missing);
                    continue;
                }
                let invocation = Invocation::new(&self.tools.io_dump, &entry.dest_root)
                    .arg("-d")
                    .arg(reference.display().to_string())
                    .arg(result.display().to_string())
                    .args(split_args(compare.args.as_deref()));
                let result = run_step(runner, &invocation, "compare", &mut entry.record);
                status = status.merge(result);
            }
            entry.record.compare = status;
            self.log
                .push(format!("    o compare {}: {status}", entry.label()));
        }
    }

    fn postprocess(&mut self, runner: &mut dyn ToolRunner, entries: &mut [CaseEntry<'_>]) {
        self.log.push(" Postprocess:");
        let package = self.package;
        let layout = &package.layout;
        for entry in entries.iter_mut().filter(|entry| entry.active()) {
            if !entry.case.post.is_on() {
                entry.record.post = StepStatus::Skipped;
                entry.record.plot = StepStatus::Skipped;
                self.log
                    .push(format!("    o post {}: {}", entry.label(), StepStatus::Skipped));
                self.log
                    .push(format!("    o plot {}: {}", entry.label(), StepStatus::Skipped));
                continue;
            }
            let post_dir = self
                .params
                .destination
                .join(&entry.study.label)
                .join(&layout.post_dir);

            let mut status = StepStatus::NotRun;
            for script in enabled_scripts(entry.case) {
                let step = PostStep {
                    kind: "script",
                    path: post_dir.join(&script.label),
                    args: split_args(script.args.as_deref()),
                };
                let result = self.post_step(runner, &post_dir, step, &mut entry.record);
                status = status.merge(result);
            }
            entry.record.post = status;
            self.log
                .push(format!("    o post {}: {status}", entry.label()));

            let run_dir = entry
                .dest_root
                .join(&layout.results_dir)
                .join(entry.case.run_id());
            let mut status = StepStatus::NotRun;
            for plot in enabled_plots(entry.case) {
                if !run_dir.is_dir() {
                    entry
                        .record
                        .notes
                        .push(format!("results {} not found", run_dir.display()));
                    status = status.merge(StepStatus::Missing);
                    continue;
                }
                let mut args = split_args(plot.args.as_deref());
                args.push(run_dir.display().to_string());
                let step = PostStep {
                    kind: "plot script",
                    path: post_dir.join(&plot.label),
                    args,
                };
                let result = self.post_step(runner, &post_dir, step, &mut entry.record);
                status = status.merge(result);
            }
            entry.record.plot = status;
            self.log
                .push(format!("    o plot {}: {status}", entry.label()));
        }
    }

    fn post_step(
        &mut self,
        runner: &mut dyn ToolRunner,
        post_dir: &Path,
        step: PostStep,
        record: &mut CaseRecord,
    ) -> StepStatus {
        if !step.path.is_file() {
            record
                .notes
                .push(format!("{} {} not found", step.kind, step.path.display()));
            self.log
                .push(format!("    o missing {} {}", step.kind, step.path.display()));
            return StepStatus::Missing;
        }
        let invocation = Invocation::new(&step.path, post_dir).args(step.args);
        run_step(runner, &invocation, step.kind, record)
    }
}

/// A POST directory executable and its arguments.
struct PostStep {
    kind: &'static str,
    path: PathBuf,
    args: Vec<String>,
}

fn enabled_scripts(case: &CaseParams) -> impl Iterator<Item = &ScriptParams> {
    case.scripts.iter().filter(|script| script.status.is_on())
}

fn enabled_plots(case: &CaseParams) -> impl Iterator<Item = &PlotParams> {
    case.plots.iter().filter(|plot| plot.status.is_on())
}

fn enabled_compares(case: &CaseParams) -> impl Iterator<Item = &CompareParams> {
    case.compare.iter().filter(|compare| compare.status.is_on())
}

/// SRC holds user sources when it contains at least one regular file at its top level.
fn has_user_sources(src: &Path) -> bool {
    fs::read_dir(src)
        .map(|entries| {
            entries
                .filter_map(std::result::Result::ok)
                .any(|entry| entry.file_type().is_ok_and(|kind| kind.is_file()))
        })
        .unwrap_or(false)
}

fn run_step(
    runner: &mut dyn ToolRunner,
    invocation: &Invocation,
    step: &str,
    record: &mut CaseRecord,
) -> StepStatus {
    match runner.run(invocation) {
        Ok(ToolOutcome { success: true, .. }) => StepStatus::Ok,
        Ok(outcome) => {
            record.notes.push(format!(
                "{step} failed ({}): {}",
                outcome.describe(),
                invocation.command_line()
            ));
            StepStatus::Failed
        }
        Err(error) => {
            warn!(%error, step, "tool could not be started");
            record.notes.push(format!("{step} failed: {error}"));
            StepStatus::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_carries_code_name_and_iso_date() {
        let date = chrono::NaiveDate::from_ymd_opt(2026, 10, 18).expect("date");
        assert_eq!(mail_subject("Code_Saturne", date), "Code_Saturne. Auto V&V 2026-10-18");
    }

    #[test]
    fn user_sources_are_top_level_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::create_dir_all(dir.path().join("REFERENCE")).expect("reference");
        fs::write(dir.path().join("REFERENCE/usini1.f90"), "").expect("reference file");
        assert!(!has_user_sources(dir.path()));

        fs::write(dir.path().join("cs_user_boundary_conditions.c"), "").expect("user file");
        assert!(has_user_sources(dir.path()));
        assert!(!has_user_sources(&dir.path().join("absent")));
    }
}
