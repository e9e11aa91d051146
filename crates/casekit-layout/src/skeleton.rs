//! Case skeleton creation and refresh.
//!
//! Every step is idempotent: running the builder again on an existing case
//! recreates nothing that is already there, and replaces the reference and
//! example sources with the current package content.

use std::path::{Path, PathBuf};

use casekit_model::{PackageConfig, Platform, Subdir};
use serde::Serialize;
use tracing::{debug, info, info_span};

use crate::error::Result;
use crate::fsops::{MergePolicy, copy_file_into, copy_merge, create_dir, unset_executable};
use crate::launcher::{LauncherSpec, write_launcher};

/// Inputs for [`ensure_skeleton`].
#[derive(Debug, Clone, Copy)]
pub struct SkeletonRequest<'a> {
    pub case_root: &'a Path,
    pub package: &'a PackageConfig,
    pub study_name: &'a str,
    pub case_name: &'a str,
    pub platform: Platform,
}

/// What a skeleton pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkeletonReport {
    pub case_root: PathBuf,
    /// Subdirectories that did not exist before this pass.
    pub created_dirs: Vec<PathBuf>,
    pub reference_files: usize,
    pub example_files: usize,
    /// Product-specific directories overlaid on the generic package data.
    pub overlays: Vec<PathBuf>,
    pub data_reference_refreshed: bool,
    pub gui_launcher: PathBuf,
    pub runcase: PathBuf,
}

/// Ensure the case skeleton exists and its package-provided files are current.
///
/// # Errors
///
/// Any copy failure aborts the pass for this case; files already written stay
/// in place.
pub fn ensure_skeleton(request: &SkeletonRequest<'_>) -> Result<SkeletonReport> {
    let span = info_span!("skeleton", study = %request.study_name, case = %request.case_name);
    let _guard = span.enter();

    let package = request.package;
    let layout = &package.layout;
    let case_root = request.case_root;
    let mut report = SkeletonReport {
        case_root: case_root.to_path_buf(),
        ..SkeletonReport::default()
    };

    for subdir in Subdir::CASE_LOCAL {
        let dir = case_root.join(layout.dir_name(subdir));
        if !dir.is_dir() {
            create_dir(&dir)?;
            report.created_dirs.push(dir);
        }
    }

    let pkgdata = package.pkgdata_dir();
    let src_dir = case_root.join(&layout.sources_dir);
    let reference = src_dir.join(&layout.reference_dir);
    let examples = src_dir.join(&layout.examples_dir);

    report.reference_files = copy_merge(
        &pkgdata.join(&layout.user_sources),
        &reference,
        MergePolicy::Refresh,
    )?;
    report.example_files = copy_merge(
        &pkgdata.join(&layout.user_examples),
        &examples,
        MergePolicy::Refresh,
    )?;

    let product_dir = package.product_data_dir();
    if product_dir.is_dir() && product_dir != pkgdata {
        for (source, dest, count) in [
            (&layout.user_sources, &reference, &mut report.reference_files),
            (&layout.user_examples, &examples, &mut report.example_files),
        ] {
            let source = product_dir.join(source);
            if source.is_dir() {
                *count += copy_merge(&source, dest, MergePolicy::Overlay)?;
                report.overlays.push(source);
            }
        }
    }

    unset_executable(&reference)?;
    unset_executable(&examples)?;

    let data_dir = case_root.join(&layout.data_dir);
    let data_reference = data_dir.join(&layout.reference_dir);
    if data_reference.is_dir() {
        copy_file_into(&pkgdata.join(&layout.user_scripts_file), &data_reference)?;
        unset_executable(&data_reference)?;
        report.data_reference_refreshed = true;
        debug!(path = %data_reference.display(), "refreshed data reference");
    }

    report.gui_launcher = write_launcher(&LauncherSpec {
        path: data_dir.join(&package.gui_name),
        product: package.name.clone(),
        subcommand: "gui".to_string(),
        bin_dir: package.bin_dir(),
        platform: request.platform,
        labels: None,
    })?;
    report.runcase = write_launcher(&LauncherSpec {
        path: case_root
            .join(&layout.scripts_dir)
            .join(&layout.runcase_name),
        product: package.name.clone(),
        subcommand: "run".to_string(),
        bin_dir: package.bin_dir(),
        platform: request.platform,
        labels: Some((
            request.study_name.to_string(),
            request.case_name.to_string(),
        )),
    })?;

    info!(
        created = report.created_dirs.len(),
        reference_files = report.reference_files,
        example_files = report.example_files,
        "case skeleton ready"
    );
    Ok(report)
}
