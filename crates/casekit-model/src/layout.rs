//! Names of the directories and files that make up a case skeleton.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the directories a case is expected to provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subdir {
    Data,
    Results,
    Sources,
    Scripts,
    /// Lives next to the case, in the study directory.
    Mesh,
}

impl Subdir {
    /// Every subdirectory, in display order.
    pub const ALL: [Subdir; 5] = [
        Subdir::Data,
        Subdir::Results,
        Subdir::Sources,
        Subdir::Scripts,
        Subdir::Mesh,
    ];

    /// Subdirectories that live directly under the case root.
    pub const CASE_LOCAL: [Subdir; 4] = [
        Subdir::Data,
        Subdir::Results,
        Subdir::Sources,
        Subdir::Scripts,
    ];

    /// Whether the directory is looked up in the parent (study) directory.
    #[must_use]
    pub const fn in_study_dir(self) -> bool {
        matches!(self, Subdir::Mesh)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Subdir::Data => "Data",
            Subdir::Results => "Results",
            Subdir::Sources => "User sources",
            Subdir::Scripts => "Scripts",
            Subdir::Mesh => "Meshes",
        }
    }
}

impl fmt::Display for Subdir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Directory and file names used by the resolver and the skeleton builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub data_dir: String,
    pub results_dir: String,
    pub sources_dir: String,
    pub scripts_dir: String,
    pub mesh_dir: String,
    /// Post-processing scripts directory of a study.
    pub post_dir: String,
    /// Reference copy of the package user sources, under SRC and DATA.
    pub reference_dir: String,
    /// Example user sources, under SRC.
    pub examples_dir: String,
    /// Base name of the run launcher in SCRIPTS (`.bat` is appended on Windows).
    pub runcase_name: String,
    /// Package data subdirectory holding user source templates.
    pub user_sources: String,
    /// Package data subdirectory holding user source examples.
    pub user_examples: String,
    /// Package data file refreshed into DATA/REFERENCE.
    pub user_scripts_file: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            data_dir: "DATA".to_string(),
            results_dir: "RESU".to_string(),
            sources_dir: "SRC".to_string(),
            scripts_dir: "SCRIPTS".to_string(),
            mesh_dir: "MESH".to_string(),
            post_dir: "POST".to_string(),
            reference_dir: "REFERENCE".to_string(),
            examples_dir: "EXAMPLES".to_string(),
            runcase_name: "runcase".to_string(),
            user_sources: "user".to_string(),
            user_examples: "user_examples".to_string(),
            user_scripts_file: "cs_user_scripts.py".to_string(),
        }
    }
}

impl LayoutConfig {
    /// Directory name for a subdirectory kind.
    #[must_use]
    pub fn dir_name(&self, subdir: Subdir) -> &str {
        match subdir {
            Subdir::Data => &self.data_dir,
            Subdir::Results => &self.results_dir,
            Subdir::Sources => &self.sources_dir,
            Subdir::Scripts => &self.scripts_dir,
            Subdir::Mesh => &self.mesh_dir,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        for subdir in Subdir::ALL {
            check_component(&subdir.to_string(), self.dir_name(subdir))?;
        }
        for (key, name) in [
            ("post_dir", &self.post_dir),
            ("reference_dir", &self.reference_dir),
            ("examples_dir", &self.examples_dir),
            ("runcase_name", &self.runcase_name),
            ("user_sources", &self.user_sources),
            ("user_examples", &self.user_examples),
            ("user_scripts_file", &self.user_scripts_file),
        ] {
            check_component(key, name)?;
        }
        if self.reference_dir == self.examples_dir {
            return Err(format!(
                "layout reference_dir and examples_dir must differ, both are `{}`",
                self.reference_dir
            ));
        }
        Ok(())
    }
}

/// A layout name is joined onto a directory, so it must name exactly one entry.
fn check_component(key: &str, name: &str) -> Result<(), String> {
    if name.trim().is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(format!(
            "layout name for {key} must be a single non-empty path component, got `{name}`"
        ));
    }
    Ok(())
}
