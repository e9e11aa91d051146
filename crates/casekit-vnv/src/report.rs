//! Campaign report log and report files.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use comfy_table::presets::ASCII_MARKDOWN;
use comfy_table::Table;
use serde::Serialize;
use tracing::info;

use crate::error::{Result, VnvError};

/// Append-only sequence of report lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportLog {
    lines: Vec<String>,
}

impl ReportLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        info!(target: "casekit_vnv::report", "{line}");
        self.lines.push(line);
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[must_use]
    pub fn to_text(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

/// Status of one campaign step for one case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Step not requested or not reached.
    #[default]
    NotRun,
    Ok,
    Failed,
    /// Step requested but not applicable (nothing to compile, compute off, ...).
    Skipped,
    /// An expected input (checkpoint, script) is absent.
    Missing,
}

impl StepStatus {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            StepStatus::NotRun => "-",
            StepStatus::Ok => "OK",
            StepStatus::Failed => "FAILED",
            StepStatus::Skipped => "SKIPPED",
            StepStatus::Missing => "MISSING",
        }
    }

    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, StepStatus::Failed | StepStatus::Missing)
    }

    /// Combine statuses of several sub-steps; failures win over success.
    #[must_use]
    pub fn merge(self, other: StepStatus) -> StepStatus {
        fn rank(status: StepStatus) -> u8 {
            match status {
                StepStatus::NotRun => 0,
                StepStatus::Skipped => 1,
                StepStatus::Ok => 2,
                StepStatus::Missing => 3,
                StepStatus::Failed => 4,
            }
        }
        if rank(other) > rank(self) { other } else { self }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-case results collected during a campaign.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CaseRecord {
    pub study: String,
    pub case: String,
    pub skeleton: StepStatus,
    pub compile: StepStatus,
    pub run: StepStatus,
    pub compare: StepStatus,
    pub post: StepStatus,
    pub plot: StepStatus,
    pub notes: Vec<String>,
}

impl CaseRecord {
    #[must_use]
    pub fn new(study: &str, case: &str) -> Self {
        Self {
            study: study.to_string(),
            case: case.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        [
            self.skeleton,
            self.compile,
            self.run,
            self.compare,
            self.post,
            self.plot,
        ]
        .into_iter()
        .any(StepStatus::is_failure)
    }
}

/// Installation and campaign paths written at the top of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportHeader {
    pub product: String,
    pub version: String,
    pub prefix: PathBuf,
    pub compare_command: String,
    pub repository: PathBuf,
    pub destination: PathBuf,
}

/// Execution environment written after the installation block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub date: String,
    pub platform: String,
    pub computer: String,
    pub process_id: u32,
    pub user: String,
    pub working_dir: PathBuf,
}

impl HostInfo {
    /// Gather host information from the running process.
    #[must_use]
    pub fn collect() -> Self {
        let computer = std::env::var("HOSTNAME")
            .ok()
            .filter(|name| !name.is_empty())
            .or_else(|| {
                fs::read_to_string("/etc/hostname")
                    .ok()
                    .map(|name| name.trim().to_string())
            })
            .unwrap_or_default();
        let release = fs::read_to_string("/etc/issue")
            .map(|issue| issue.lines().next().unwrap_or_default().trim().to_string())
            .unwrap_or_default();
        let user = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_default();
        Self {
            date: chrono::Local::now().format("%A %B %d %H:%M:%S %Y").to_string(),
            platform: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
            computer: format!("{computer}  {release}").trim_end().to_string(),
            process_id: std::process::id(),
            user,
            working_dir: std::env::current_dir().unwrap_or_default(),
        }
    }
}

/// Append the report banner, installation block and host block.
pub fn write_header(log: &mut ReportLog, header: &ReportHeader, host: &HostInfo) {
    log.push(" ----------");
    log.push(" Auto V & V");
    log.push(" ----------");
    log.push("");
    log.push(format!(" Code name:         {}", header.product));
    log.push(format!(" Kernel version:    {}", header.version));
    log.push(format!(" Install directory: {}", header.prefix.display()));
    log.push(format!(" File dump:         {}", header.compare_command));
    log.push(format!(" Repository:        {}", header.repository.display()));
    log.push(format!(" Destination:       {}", header.destination.display()));
    log.push("");
    log.push(" Informations:");
    log.push(" -------------");
    log.push("");
    log.push(format!(" Date:               {}", host.date));
    log.push(format!(" Platform:           {}", host.platform));
    log.push(format!(" Computer:           {}", host.computer));
    log.push(format!(" Process Id:         {}", host.process_id));
    log.push(format!(" User name:          {}", host.user));
    log.push(format!(" Working directory:  {}", host.working_dir.display()));
    log.push("");
}

pub fn write_footer(log: &mut ReportLog) {
    log.push("");
    log.push(" -----------------");
    log.push(" End of Auto V & V");
    log.push(" -----------------");
}

/// File names used by [`build_reports`].
pub const GLOBAL_REPORT: &str = "report_global";
pub const DETAILED_REPORT: &str = "report_detailed";
pub const JSON_REPORT: &str = "report.json";

#[derive(Serialize)]
struct JsonReport<'a> {
    cases: &'a [CaseRecord],
    failures: usize,
}

/// Render the per-case status table used in the detailed report.
#[must_use]
pub fn render_case_table(records: &[CaseRecord]) -> String {
    let mut table = Table::new();
    table.load_preset(ASCII_MARKDOWN);
    table.set_header(vec![
        "Study", "Case", "Skeleton", "Compile", "Run", "Compare", "Post", "Plot",
    ]);
    for record in records {
        table.add_row(vec![
            record.study.clone(),
            record.case.clone(),
            record.skeleton.to_string(),
            record.compile.to_string(),
            record.run.to_string(),
            record.compare.to_string(),
            record.post.to_string(),
            record.plot.to_string(),
        ]);
    }
    table.to_string()
}

/// Write the global, detailed and JSON reports into `dir`.
///
/// Returns the written paths, in that order, for use as mail attachments.
pub fn build_reports(dir: &Path, log: &ReportLog, records: &[CaseRecord]) -> Result<Vec<PathBuf>> {
    let global = dir.join(format!("{GLOBAL_REPORT}.txt"));
    write_report(&global, &log.to_text())?;

    let mut detailed_text = render_case_table(records);
    detailed_text.push('\n');
    for record in records.iter().filter(|record| !record.notes.is_empty()) {
        detailed_text.push_str(&format!("\n{}/{}:\n", record.study, record.case));
        for note in &record.notes {
            detailed_text.push_str(&format!("  - {note}\n"));
        }
    }
    let detailed = dir.join(format!("{DETAILED_REPORT}.txt"));
    write_report(&detailed, &detailed_text)?;

    let json = dir.join(JSON_REPORT);
    let summary = JsonReport {
        cases: records,
        failures: records.iter().filter(|record| record.has_failures()).count(),
    };
    let json_text = serde_json::to_string_pretty(&summary).map_err(|error| VnvError::Report {
        path: json.clone(),
        source: std::io::Error::other(error),
    })?;
    write_report(&json, &json_text)?;

    Ok(vec![global, detailed, json])
}

fn write_report(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|source| VnvError::Report {
        path: path.to_path_buf(),
        source,
    })
}
