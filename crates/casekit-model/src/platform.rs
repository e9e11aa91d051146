use std::fmt;

use serde::{Deserialize, Serialize};

/// Target platform family for generated launcher scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Unix,
    Windows,
}

impl Platform {
    /// Platform the binary was built for.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }

    /// Launcher file name for a base name (`runcase` -> `runcase.bat` on Windows).
    #[must_use]
    pub fn launcher_file_name(self, base: &str) -> String {
        match self {
            Platform::Unix => base.to_string(),
            Platform::Windows => format!("{base}.bat"),
        }
    }

    #[must_use]
    pub const fn has_executable_bit(self) -> bool {
        matches!(self, Platform::Unix)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Unix => f.write_str("unix"),
            Platform::Windows => f.write_str("windows"),
        }
    }
}
