//! Description of the installed solver package.
//!
//! The package configuration is read from a TOML file. Resolution order:
//! 1. an explicit path (command line)
//! 2. the `CASEKIT_PACKAGE_CONFIG` environment variable
//! 3. built-in defaults for a `code_saturne` install under `/usr/local`
//!
//! ```toml
//! name = "code_saturne"
//! version = "6.0.0"
//! prefix = "/opt/code_saturne"
//!
//! [layout]
//! runcase_name = "runcase"
//! ```

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::layout::LayoutConfig;

/// Environment variable pointing at a package configuration file.
pub const PACKAGE_CONFIG_ENV_VAR: &str = "CASEKIT_PACKAGE_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
    /// Executable name of the main tool (`code_saturne`, `neptune_cfd`).
    pub name: String,
    /// Human-readable code name used in reports and mail subjects.
    pub code_name: String,
    pub version: String,
    /// Install prefix; other directories default relative to it.
    pub prefix: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bin_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pkgdata_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub libexec_dir: Option<PathBuf>,
    /// Name of the GUI launcher written into DATA.
    pub gui_name: String,
    /// Checkpoint comparison utility; defaults to `<libexec>/cs_io_dump`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub io_dump: Option<PathBuf>,
    pub layout: LayoutConfig,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            name: "code_saturne".to_string(),
            code_name: "Code_Saturne".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            prefix: PathBuf::from("/usr/local"),
            bin_dir: None,
            data_dir: None,
            pkgdata_dir: None,
            libexec_dir: None,
            gui_name: "SaturneGUI".to_string(),
            io_dump: None,
            layout: LayoutConfig::default(),
        }
    }
}

impl PackageConfig {
    /// Load and validate a package configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: PackageConfig = toml::from_str(&text).map_err(|source| ModelError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the configuration from an explicit path, the environment, or defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        Self::resolve_with_env(explicit, std::env::var_os(PACKAGE_CONFIG_ENV_VAR))
    }

    /// Same as [`PackageConfig::resolve`] with the environment value supplied by the caller.
    pub fn resolve_with_env(explicit: Option<&Path>, env_value: Option<OsString>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match env_value.filter(|value| !value.is_empty()) {
            Some(value) => Self::load(Path::new(&value)),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ModelError::Invalid {
                message: "package name must not be empty".to_string(),
            });
        }
        if self.gui_name.trim().is_empty() {
            return Err(ModelError::Invalid {
                message: "gui_name must not be empty".to_string(),
            });
        }
        self.layout
            .validate()
            .map_err(|message| ModelError::Invalid { message })
    }

    #[must_use]
    pub fn bin_dir(&self) -> PathBuf {
        self.bin_dir
            .clone()
            .unwrap_or_else(|| self.prefix.join("bin"))
    }

    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| self.prefix.join("share"))
    }

    #[must_use]
    pub fn pkgdata_dir(&self) -> PathBuf {
        self.pkgdata_dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join(&self.name))
    }

    #[must_use]
    pub fn libexec_dir(&self) -> PathBuf {
        self.libexec_dir
            .clone()
            .unwrap_or_else(|| self.prefix.join("libexec").join(&self.name))
    }

    /// Product-specific data directory overlaid on the generic package data.
    #[must_use]
    pub fn product_data_dir(&self) -> PathBuf {
        self.data_dir().join(&self.name)
    }

    /// Path of the main solver executable.
    #[must_use]
    pub fn solver_executable(&self) -> PathBuf {
        self.bin_dir().join(&self.name)
    }

    /// Path of the checkpoint comparison utility.
    #[must_use]
    pub fn io_dump(&self) -> PathBuf {
        self.io_dump
            .clone()
            .unwrap_or_else(|| self.libexec_dir().join("cs_io_dump"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_derive_directories_from_prefix() {
        let config = PackageConfig::default();
        assert_eq!(config.bin_dir(), PathBuf::from("/usr/local/bin"));
        assert_eq!(
            config.pkgdata_dir(),
            PathBuf::from("/usr/local/share/code_saturne")
        );
        assert_eq!(
            config.solver_executable(),
            PathBuf::from("/usr/local/bin/code_saturne")
        );
        assert_eq!(
            config.io_dump(),
            PathBuf::from("/usr/local/libexec/code_saturne/cs_io_dump")
        );
    }

    #[test]
    fn explicit_directories_win_over_prefix() {
        let config: PackageConfig = toml::from_str(
            r#"
            name = "neptune_cfd"
            prefix = "/opt/nc"
            bin_dir = "/opt/tools/bin"
            io_dump = "/opt/tools/dump"
            "#,
        )
        .expect("parse config");
        assert_eq!(config.solver_executable(), PathBuf::from("/opt/tools/bin/neptune_cfd"));
        assert_eq!(config.io_dump(), PathBuf::from("/opt/tools/dump"));
        assert_eq!(config.product_data_dir(), PathBuf::from("/opt/nc/share/neptune_cfd"));
        assert_eq!(config.gui_name, "SaturneGUI");
        assert_eq!(config.layout, LayoutConfig::default());
    }

    #[test]
    fn resolve_without_path_or_env_uses_defaults() {
        let config = PackageConfig::resolve_with_env(None, None).expect("defaults");
        assert_eq!(config, PackageConfig::default());
        let config =
            PackageConfig::resolve_with_env(None, Some(OsString::new())).expect("empty env");
        assert_eq!(config, PackageConfig::default());
    }

    #[test]
    fn validate_rejects_empty_name() {
        let config = PackageConfig {
            name: " ".to_string(),
            ..PackageConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ModelError::Invalid { .. })
        ));
    }
}
