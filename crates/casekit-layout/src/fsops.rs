//! Directory copy and permission helpers used when building case skeletons.

use std::fs;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{LayoutError, Result};

/// How an existing destination directory is treated by [`copy_merge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Remove everything in the destination before copying.
    Refresh,
    /// Copy on top of the destination, keeping files that are not in the source.
    Overlay,
}

/// Copy `src` into `dest`.
///
/// When `dest` does not exist the whole tree is copied. When it exists the
/// policy decides whether stale entries are removed first. Returns the number
/// of files copied.
pub fn copy_merge(src: &Path, dest: &Path, policy: MergePolicy) -> Result<usize> {
    if !src.is_dir() {
        return Err(LayoutError::MissingSource {
            path: src.to_path_buf(),
        });
    }
    if dest.is_dir() && policy == MergePolicy::Refresh {
        clear_dir(dest)?;
    }
    copy_tree(src, dest)
}

/// Recursively copy the contents of `src` into `dest`, creating `dest` if needed.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<usize> {
    create_dir(dest)?;
    let mut copied = 0;
    for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|source| LayoutError::Walk {
            path: src.to_path_buf(),
            source,
        })?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            create_dir(&target)?;
            continue;
        }
        fs::copy(entry.path(), &target).map_err(|source| LayoutError::Copy {
            from: entry.path().to_path_buf(),
            to: target.clone(),
            source,
        })?;
        copied += 1;
    }
    debug!(src = %src.display(), dest = %dest.display(), copied, "copied tree");
    Ok(copied)
}

/// Copy a single file into a directory, keeping its file name.
pub fn copy_file_into(file: &Path, dest_dir: &Path) -> Result<()> {
    let Some(name) = file.file_name() else {
        return Err(LayoutError::MissingSource {
            path: file.to_path_buf(),
        });
    };
    if !file.is_file() {
        return Err(LayoutError::MissingSource {
            path: file.to_path_buf(),
        });
    }
    let target = dest_dir.join(name);
    fs::copy(file, &target).map_err(|source| LayoutError::Copy {
        from: file.to_path_buf(),
        to: target,
        source,
    })?;
    Ok(())
}

/// Remove every entry of a directory, keeping the directory itself.
pub fn clear_dir(dir: &Path) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|source| LayoutError::Remove {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| LayoutError::Remove {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let is_dir = entry.file_type().is_ok_and(|kind| kind.is_dir());
        let removed = if is_dir {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.map_err(|source| LayoutError::Remove { path, source })?;
    }
    Ok(())
}

/// Create a directory and its parents; existing directories are fine.
pub fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| LayoutError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Add the executable bits to a file (no-op on platforms without them).
pub fn set_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    update_mode(path, |mode| mode | 0o111)?;
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Strip the executable bits from a file, or from every file below a directory.
pub fn unset_executable(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    #[cfg(unix)]
    {
        if path.is_dir() {
            for entry in WalkDir::new(path).min_depth(1) {
                let entry = entry.map_err(|source| LayoutError::Walk {
                    path: path.to_path_buf(),
                    source,
                })?;
                if entry.file_type().is_file() {
                    update_mode(entry.path(), |mode| mode & !0o111)?;
                }
            }
        } else {
            update_mode(path, |mode| mode & !0o111)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn update_mode(path: &Path, change: impl Fn(u32) -> u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let permissions_error = |source| LayoutError::Permissions {
        path: path.to_path_buf(),
        source,
    };
    let mut permissions = fs::metadata(path).map_err(permissions_error)?.permissions();
    permissions.set_mode(change(permissions.mode()));
    fs::set_permissions(path, permissions).map_err(permissions_error)
}
