//! CLI library components for casekit.

pub mod commands;
pub mod logging;
pub mod summary;
