use std::path::Path;

use serde::{Deserialize, Serialize};

/// Study and case names derived from a case path.
///
/// The case name is the basename of the case path and the study name is the
/// basename of its parent. The xml file name is the case setup file currently
/// associated with the case and survives path changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseIdentity {
    pub study: String,
    pub case: String,
    pub xml_file: Option<String>,
}

impl CaseIdentity {
    #[must_use]
    pub fn from_case_path(case_path: &Path, xml_file: Option<String>) -> Self {
        let case = basename(case_path);
        let study = case_path.parent().map(basename).unwrap_or_default();
        Self {
            study,
            case,
            xml_file,
        }
    }

    /// Recompute names for a new case path, keeping the xml file name.
    #[must_use]
    pub fn with_case_path(&self, case_path: &Path) -> Self {
        Self::from_case_path(case_path, self.xml_file.clone())
    }
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
