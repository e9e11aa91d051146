//! Campaign parameter file.
//!
//! ```xml
//! <autovnv>
//!   <repository>/data/vnv/repository</repository>
//!   <destination>/scratch/vnv</destination>
//!   <study label="PIPE" status="on">
//!     <case label="LAMINAR" status="on" compute="on" post="on" run_id="vnv">
//!       <compare repo="reference" args="--section velocity" status="on"/>
//!       <script label="profiles.py" args="-n 10" status="on"/>
//!       <plot label="plot_profiles.py" args="--png" status="on"/>
//!     </case>
//!   </study>
//! </autovnv>
//! ```
//!
//! Relative repository and destination paths are taken relative to the
//! directory of the parameter file.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, VnvError};

/// Run identifier used when a case does not name one.
pub const DEFAULT_RUN_ID: &str = "vnv";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Toggle {
    #[default]
    On,
    Off,
}

impl Toggle {
    #[must_use]
    pub fn is_on(self) -> bool {
        self == Toggle::On
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Parameters {
    pub repository: PathBuf,
    pub destination: PathBuf,
    #[serde(rename = "study", default)]
    pub studies: Vec<StudyParams>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StudyParams {
    #[serde(rename = "@label")]
    pub label: String,
    #[serde(rename = "@status", default)]
    pub status: Toggle,
    #[serde(rename = "case", default)]
    pub cases: Vec<CaseParams>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CaseParams {
    #[serde(rename = "@label")]
    pub label: String,
    #[serde(rename = "@status", default)]
    pub status: Toggle,
    #[serde(rename = "@compute", default)]
    pub compute: Toggle,
    #[serde(rename = "@post", default)]
    pub post: Toggle,
    #[serde(rename = "@run_id", default)]
    pub run_id: Option<String>,
    #[serde(rename = "compare", default)]
    pub compare: Vec<CompareParams>,
    #[serde(rename = "script", default)]
    pub scripts: Vec<ScriptParams>,
    #[serde(rename = "plot", default)]
    pub plots: Vec<PlotParams>,
}

impl CaseParams {
    #[must_use]
    pub fn run_id(&self) -> &str {
        self.run_id.as_deref().unwrap_or(DEFAULT_RUN_ID)
    }
}

/// Checkpoint comparison against a reference run stored in the repository.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompareParams {
    /// Run directory under the repository case RESU.
    #[serde(rename = "@repo")]
    pub repo: String,
    /// Run directory under the destination case RESU; defaults to the case run id.
    #[serde(rename = "@dest", default)]
    pub dest: Option<String>,
    #[serde(rename = "@args", default)]
    pub args: Option<String>,
    #[serde(rename = "@status", default)]
    pub status: Toggle,
}

/// Post-processing script stored in the study POST directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScriptParams {
    #[serde(rename = "@label")]
    pub label: String,
    #[serde(rename = "@args", default)]
    pub args: Option<String>,
    #[serde(rename = "@status", default)]
    pub status: Toggle,
}

/// Plotting script stored in the study POST directory.
///
/// It runs after the case scripts and receives the case run directory as its
/// last argument.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlotParams {
    #[serde(rename = "@label")]
    pub label: String,
    #[serde(rename = "@args", default)]
    pub args: Option<String>,
    #[serde(rename = "@status", default)]
    pub status: Toggle,
}

impl Parameters {
    /// Read, parse and validate a parameter file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| VnvError::ParameterIo {
            path: path.to_path_buf(),
            source,
        })?;
        let mut params = Self::parse(&text, path)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        params.repository = base.join(&params.repository);
        params.destination = base.join(&params.destination);
        Ok(params)
    }

    /// Parse and validate parameter text; `origin` is only used in errors.
    pub fn parse(text: &str, origin: &Path) -> Result<Self> {
        let params: Parameters =
            quick_xml::de::from_str(text).map_err(|source| VnvError::ParameterXml {
                path: origin.to_path_buf(),
                source,
            })?;
        params
            .validate()
            .map_err(|message| VnvError::InvalidParameters {
                path: origin.to_path_buf(),
                message,
            })?;
        Ok(params)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.repository.as_os_str().is_empty() {
            return Err("repository must not be empty".to_string());
        }
        if self.destination.as_os_str().is_empty() {
            return Err("destination must not be empty".to_string());
        }
        let mut studies = BTreeSet::new();
        for study in &self.studies {
            check_label("study", &study.label)?;
            if !studies.insert(study.label.as_str()) {
                return Err(format!("duplicate study `{}`", study.label));
            }
            let mut cases = BTreeSet::new();
            for case in &study.cases {
                check_label("case", &case.label)?;
                if !cases.insert(case.label.as_str()) {
                    return Err(format!(
                        "duplicate case `{}` in study `{}`",
                        case.label, study.label
                    ));
                }
                if let Some(run_id) = &case.run_id {
                    check_label("run_id", run_id)?;
                }
            }
        }
        Ok(())
    }

    /// Enabled studies with their enabled cases, in declaration order.
    pub fn enabled_cases(&self) -> impl Iterator<Item = (&StudyParams, &CaseParams)> {
        self.studies
            .iter()
            .filter(|study| study.status.is_on())
            .flat_map(|study| {
                study
                    .cases
                    .iter()
                    .filter(|case| case.status.is_on())
                    .map(move |case| (study, case))
            })
    }
}

fn check_label(kind: &str, label: &str) -> std::result::Result<(), String> {
    if label.trim().is_empty() {
        return Err(format!("{kind} label must not be empty"));
    }
    if label.contains(['/', '\\']) || label == "." || label == ".." {
        return Err(format!("{kind} label `{label}` must be a plain directory name"));
    }
    Ok(())
}

/// Split an argument string on whitespace.
#[must_use]
pub fn split_args(args: Option<&str>) -> Vec<String> {
    args.map(|args| args.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0"?>
<autovnv>
  <repository>repo</repository>
  <destination>/scratch/vnv</destination>
  <study label="PIPE" status="on">
    <case label="LAMINAR" status="on" compute="on" post="off" run_id="r1">
      <compare repo="reference" args="--section velocity"/>
      <script label="profiles.py" args="-n 10" status="on"/>
      <script label="old.py" status="off"/>
      <plot label="plot_profiles.py" args="--png"/>
    </case>
    <case label="TURBULENT" status="off"/>
  </study>
  <study label="CAVITY" status="off">
    <case label="C1"/>
  </study>
</autovnv>
"#;

    #[test]
    fn parses_studies_cases_and_entries() {
        let params = Parameters::parse(SAMPLE, Path::new("params.xml")).expect("parse");
        assert_eq!(params.repository, PathBuf::from("repo"));
        assert_eq!(params.studies.len(), 2);
        let pipe = &params.studies[0];
        assert_eq!(pipe.cases.len(), 2);
        let laminar = &pipe.cases[0];
        assert_eq!(laminar.run_id(), "r1");
        assert!(!laminar.post.is_on());
        assert_eq!(laminar.compare[0].repo, "reference");
        assert_eq!(laminar.compare[0].dest, None);
        assert!(laminar.compare[0].status.is_on());
        assert_eq!(laminar.scripts.len(), 2);
        assert!(!laminar.scripts[1].status.is_on());
        assert_eq!(laminar.plots.len(), 1);
        assert_eq!(laminar.plots[0].label, "plot_profiles.py");
        assert_eq!(laminar.plots[0].args.as_deref(), Some("--png"));
        assert!(laminar.plots[0].status.is_on());
        assert!(pipe.cases[1].plots.is_empty());
        assert_eq!(pipe.cases[1].run_id(), DEFAULT_RUN_ID);
    }

    #[test]
    fn enabled_cases_skip_disabled_studies_and_cases() {
        let params = Parameters::parse(SAMPLE, Path::new("params.xml")).expect("parse");
        let enabled: Vec<(&str, &str)> = params
            .enabled_cases()
            .map(|(study, case)| (study.label.as_str(), case.label.as_str()))
            .collect();
        assert_eq!(enabled, vec![("PIPE", "LAMINAR")]);
    }

    #[test]
    fn rejects_duplicate_and_nested_labels() {
        let duplicate = r#"<autovnv><repository>r</repository><destination>d</destination>
            <study label="S"/><study label="S"/></autovnv>"#;
        let err = Parameters::parse(duplicate, Path::new("p.xml")).expect_err("duplicate");
        assert!(err.to_string().contains("duplicate study"));

        let nested = r#"<autovnv><repository>r</repository><destination>d</destination>
            <study label="S"><case label="a/b"/></study></autovnv>"#;
        let err = Parameters::parse(nested, Path::new("p.xml")).expect_err("nested");
        assert!(matches!(err, VnvError::InvalidParameters { .. }));
    }

    #[test]
    fn missing_destination_is_a_parse_error() {
        let text = "<autovnv><repository>r</repository></autovnv>";
        let err = Parameters::parse(text, Path::new("p.xml")).expect_err("missing field");
        assert!(matches!(err, VnvError::ParameterXml { .. }));
    }

    #[test]
    fn split_args_handles_absent_and_spaced_values() {
        assert!(split_args(None).is_empty());
        assert_eq!(split_args(Some("  -n  10 ")), vec!["-n", "10"]);
    }
}
