//! Case directory layout: resolution, skeleton building and launchers.

pub mod error;
pub mod form;
pub mod fsops;
pub mod launcher;
pub mod resolver;
pub mod skeleton;

pub use error::{LayoutError, Result};
pub use form::{CaseForm, DisplayField, DisplayModel, resolve_display};
pub use launcher::{LauncherSpec, render_launcher, write_launcher};
pub use resolver::{
    Resolution, ResolutionCondition, SubdirEntry, SubdirStatus, normalized_absolute, resolve,
    resolve_or_missing,
};
pub use skeleton::{SkeletonReport, SkeletonRequest, ensure_skeleton};
