//! Case subdirectory resolution.
//!
//! Existence is decided by literal, case-sensitive membership in a directory
//! listing, so the result is the same on case-insensitive file systems.

use std::collections::BTreeSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Component, Path, PathBuf};

use casekit_model::{CaseIdentity, LayoutConfig, Subdir};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{LayoutError, Result};

/// Outcome of looking up one subdirectory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "path", rename_all = "snake_case")]
pub enum SubdirStatus {
    Present(PathBuf),
    Missing,
}

impl SubdirStatus {
    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, SubdirStatus::Present(_))
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            SubdirStatus::Present(path) => Some(path),
            SubdirStatus::Missing => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubdirEntry {
    pub subdir: Subdir,
    /// Directory name that was looked up.
    pub name: String,
    pub status: SubdirStatus,
}

/// Condition reported for the resolution as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionCondition {
    CaseDirectoryNotFound,
}

/// Result of one resolution pass over a case path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Absolute form of the requested case path.
    pub case_path: PathBuf,
    /// One entry per [`Subdir::ALL`], in that order.
    pub entries: Vec<SubdirEntry>,
    pub condition: Option<ResolutionCondition>,
}

impl Resolution {
    fn all_missing(
        case_path: PathBuf,
        layout: &LayoutConfig,
        condition: Option<ResolutionCondition>,
    ) -> Self {
        let entries = Subdir::ALL
            .into_iter()
            .map(|subdir| SubdirEntry {
                subdir,
                name: layout.dir_name(subdir).to_string(),
                status: SubdirStatus::Missing,
            })
            .collect();
        Self {
            case_path,
            entries,
            condition,
        }
    }

    #[must_use]
    pub fn case_exists(&self) -> bool {
        self.condition != Some(ResolutionCondition::CaseDirectoryNotFound)
    }

    #[must_use]
    pub fn entry(&self, subdir: Subdir) -> Option<&SubdirEntry> {
        self.entries.iter().find(|entry| entry.subdir == subdir)
    }

    #[must_use]
    pub fn status(&self, subdir: Subdir) -> &SubdirStatus {
        self.entry(subdir)
            .map_or(&SubdirStatus::Missing, |entry| &entry.status)
    }

    pub fn missing(&self) -> impl Iterator<Item = Subdir> + '_ {
        self.entries
            .iter()
            .filter(|entry| !entry.status.is_present())
            .map(|entry| entry.subdir)
    }

    #[must_use]
    pub fn identity(&self, xml_file: Option<String>) -> CaseIdentity {
        CaseIdentity::from_case_path(&self.case_path, xml_file)
    }
}

/// Resolve the five case subdirectories of `case_path`.
///
/// A path that does not exist, or is not a directory, resolves every entry
/// to [`SubdirStatus::Missing`] with [`ResolutionCondition::CaseDirectoryNotFound`].
///
/// # Errors
///
/// Returns [`LayoutError::Resolution`] when the path cannot be made absolute
/// or when the case or study directory cannot be listed.
pub fn resolve(case_path: &Path, layout: &LayoutConfig) -> Result<Resolution> {
    let case_path = normalized_absolute(case_path).map_err(|source| LayoutError::Resolution {
        path: case_path.to_path_buf(),
        source,
    })?;

    if !case_path.is_dir() {
        debug!(case_path = %case_path.display(), "case directory not found");
        return Ok(Resolution::all_missing(
            case_path,
            layout,
            Some(ResolutionCondition::CaseDirectoryNotFound),
        ));
    }

    let case_listing = list_names(&case_path)?;
    let study_dir = case_path.parent().filter(|parent| parent.is_dir());
    let study_listing = match study_dir {
        Some(dir) => Some(list_names(dir)?),
        None => None,
    };

    let entries = Subdir::ALL
        .into_iter()
        .map(|subdir| {
            let name = layout.dir_name(subdir);
            let (base, listing) = if subdir.in_study_dir() {
                (study_dir, study_listing.as_ref())
            } else {
                (Some(case_path.as_path()), Some(&case_listing))
            };
            let status = match (base, listing) {
                (Some(base), Some(listing)) if listing.contains(OsStr::new(name)) => {
                    SubdirStatus::Present(base.join(name))
                }
                _ => SubdirStatus::Missing,
            };
            SubdirEntry {
                subdir,
                name: name.to_string(),
                status,
            }
        })
        .collect();

    Ok(Resolution {
        case_path,
        entries,
        condition: None,
    })
}

/// Resolve, treating a listing failure as "every entry missing".
#[must_use]
pub fn resolve_or_missing(case_path: &Path, layout: &LayoutConfig) -> Resolution {
    match resolve(case_path, layout) {
        Ok(resolution) => resolution,
        Err(error) => {
            warn!(case_path = %case_path.display(), %error, "case resolution failed");
            let absolute =
                normalized_absolute(case_path).unwrap_or_else(|_| case_path.to_path_buf());
            Resolution::all_missing(absolute, layout, None)
        }
    }
}

/// Absolute form of `path` with `.` and `..` folded away lexically, so that
/// `S1/C1/DATA/..` ends in `S1/C1`.
///
/// # Errors
///
/// Fails when the working directory is needed and cannot be read.
pub fn normalized_absolute(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}

fn list_names(dir: &Path) -> Result<BTreeSet<OsString>> {
    let read_dir = fs::read_dir(dir).map_err(|source| LayoutError::Resolution {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut names = BTreeSet::new();
    for entry in read_dir {
        let entry = entry.map_err(|source| LayoutError::Resolution {
            path: dir.to_path_buf(),
            source,
        })?;
        names.insert(entry.file_name());
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_case_dir_reports_single_condition() {
        let dir = tempfile::tempdir().expect("temp dir");
        let resolution = resolve(&dir.path().join("nope"), &LayoutConfig::default())
            .expect("resolve missing dir");
        assert!(!resolution.case_exists());
        assert_eq!(resolution.entries.len(), 5);
        assert_eq!(resolution.missing().count(), 5);
    }

    #[test]
    fn relative_paths_are_made_absolute() {
        let resolution =
            resolve(Path::new("does-not-exist-here"), &LayoutConfig::default()).expect("resolve");
        assert!(resolution.case_path.is_absolute());
        assert!(resolution.case_path.ends_with("does-not-exist-here"));
    }

    #[cfg(unix)]
    #[test]
    fn parent_components_are_folded() {
        let normalized =
            normalized_absolute(Path::new("/studies/S1/C1/DATA/../.")).expect("normalize");
        assert_eq!(normalized, PathBuf::from("/studies/S1/C1"));
    }

    #[cfg(unix)]
    #[test]
    fn parent_of_root_stays_at_root() {
        let normalized = normalized_absolute(Path::new("/../C1")).expect("normalize");
        assert_eq!(normalized, PathBuf::from("/C1"));
    }

    #[test]
    fn regular_file_is_not_a_case_dir() {
        let dir = tempfile::tempdir().expect("temp dir");
        let file = dir.path().join("case.txt");
        fs::write(&file, "x").expect("write file");
        let resolution = resolve(&file, &LayoutConfig::default()).expect("resolve file");
        assert_eq!(
            resolution.condition,
            Some(ResolutionCondition::CaseDirectoryNotFound)
        );
    }
}
