//! Display model for the case directory form.
//!
//! The form shows one field per case subdirectory. Rendering and event wiring
//! live elsewhere; this module only computes what to show, both when the form
//! opens and when the user selects another directory.

use std::path::{Path, PathBuf};

use casekit_model::{CaseIdentity, LayoutConfig, Subdir};
use serde::Serialize;
use tracing::debug;

use crate::resolver::{Resolution, SubdirStatus, resolve_or_missing};

/// Field text for a subdirectory that is not in the listing.
pub const NOT_FOUND_PLACEHOLDER: &str = "Associated sub-directory not found";

/// Field text used for every field when the case directory itself is missing.
pub const UNKNOWN_DIR_PLACEHOLDER: &str = "????????";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayField {
    pub subdir: Subdir,
    pub text: String,
    pub warning: Option<String>,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayModel {
    pub case_path: PathBuf,
    pub case_exists: bool,
    pub fields: Vec<DisplayField>,
}

impl DisplayModel {
    #[must_use]
    pub fn from_resolution(resolution: &Resolution) -> Self {
        let case_exists = resolution.case_exists();
        let fields = resolution
            .entries
            .iter()
            .map(|entry| {
                if !case_exists {
                    let warning = entry
                        .subdir
                        .in_study_dir()
                        .then(|| "the given directory does not exist".to_string());
                    return DisplayField {
                        subdir: entry.subdir,
                        text: UNKNOWN_DIR_PLACEHOLDER.to_string(),
                        warning,
                        path: None,
                    };
                }
                match &entry.status {
                    SubdirStatus::Present(path) => DisplayField {
                        subdir: entry.subdir,
                        text: entry.name.clone(),
                        warning: None,
                        path: Some(path.clone()),
                    },
                    SubdirStatus::Missing => DisplayField {
                        subdir: entry.subdir,
                        text: NOT_FOUND_PLACEHOLDER.to_string(),
                        warning: Some(missing_warning(entry.subdir, &entry.name)),
                        path: None,
                    },
                }
            })
            .collect();
        Self {
            case_path: resolution.case_path.clone(),
            case_exists,
            fields,
        }
    }

    #[must_use]
    pub fn field(&self, subdir: Subdir) -> Option<&DisplayField> {
        self.fields.iter().find(|field| field.subdir == subdir)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().filter_map(|field| field.warning.as_deref())
    }
}

fn missing_warning(subdir: Subdir, name: &str) -> String {
    if subdir.in_study_dir() {
        format!("the {name} directory is required, at the level of the case directory")
    } else {
        format!("the {name} sub-directory is required")
    }
}

/// Resolve a case path and build its display model.
#[must_use]
pub fn resolve_display(case_path: &Path, layout: &LayoutConfig) -> DisplayModel {
    DisplayModel::from_resolution(&resolve_or_missing(case_path, layout))
}

/// Case path chosen when the form opens without one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialCasePath {
    pub path: PathBuf,
    pub warning: Option<String>,
}

/// Pick the initial case path from the open setup file and the working directory.
#[must_use]
pub fn initial_case_path(
    xml_file: Option<&Path>,
    cwd: &Path,
    layout: &LayoutConfig,
) -> InitialCasePath {
    let is_data_dir =
        |dir: &Path| dir.file_name().is_some_and(|name| name == layout.data_dir.as_str());
    let parent_or_self = |dir: &Path| dir.parent().unwrap_or(dir).to_path_buf();

    let Some(xml_file) = xml_file else {
        let path = if is_data_dir(cwd) {
            parent_or_self(cwd)
        } else {
            cwd.to_path_buf()
        };
        return InitialCasePath {
            path,
            warning: None,
        };
    };

    match xml_file.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        Some(file_dir) if is_data_dir(file_dir) => InitialCasePath {
            path: parent_or_self(file_dir),
            warning: None,
        },
        Some(file_dir) => InitialCasePath {
            path: file_dir.to_path_buf(),
            warning: Some(format!(
                "the xml file must be in directory {} of the case",
                layout.data_dir
            )),
        },
        None => InitialCasePath {
            path: parent_or_self(cwd),
            warning: None,
        },
    }
}

/// State of an open case directory form.
#[derive(Debug, Clone)]
pub struct CaseForm {
    layout: LayoutConfig,
    identity: CaseIdentity,
    display: DisplayModel,
    open_warning: Option<String>,
}

impl CaseForm {
    /// Open the form on an explicit case path, or on the initial path derived
    /// from the setup file and working directory.
    #[must_use]
    pub fn open(
        case_path: Option<&Path>,
        xml_file: Option<&Path>,
        cwd: &Path,
        layout: LayoutConfig,
    ) -> Self {
        let (path, open_warning) = match case_path {
            Some(path) => (path.to_path_buf(), None),
            None => {
                let initial = initial_case_path(xml_file, cwd, &layout);
                (initial.path, initial.warning)
            }
        };
        let xml_name = xml_file
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned());
        let display = resolve_display(&path, &layout);
        let identity = CaseIdentity::from_case_path(&display.case_path, xml_name);
        Self {
            layout,
            identity,
            display,
            open_warning,
        }
    }

    /// Re-resolve after the user picked a directory and recompute the identity.
    pub fn select_directory(&mut self, dir: &Path) -> &DisplayModel {
        self.display = resolve_display(dir, &self.layout);
        self.identity = self.identity.with_case_path(&self.display.case_path);
        debug!(
            case_path = %self.display.case_path.display(),
            study = %self.identity.study,
            case = %self.identity.case,
            "case directory selected"
        );
        &self.display
    }

    #[must_use]
    pub fn case_path(&self) -> &Path {
        &self.display.case_path
    }

    #[must_use]
    pub fn display(&self) -> &DisplayModel {
        &self.display
    }

    #[must_use]
    pub fn identity(&self) -> &CaseIdentity {
        &self.identity
    }

    /// Warning raised while choosing the initial path, if any.
    #[must_use]
    pub fn open_warning(&self) -> Option<&str> {
        self.open_warning.as_deref()
    }
}
