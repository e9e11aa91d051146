//! Shared types for case directories and installed packages.

pub mod error;
pub mod identity;
pub mod layout;
pub mod package;
pub mod platform;

pub use error::{ModelError, Result};
pub use identity::CaseIdentity;
pub use layout::{LayoutConfig, Subdir};
pub use package::{PACKAGE_CONFIG_ENV_VAR, PackageConfig};
pub use platform::Platform;
