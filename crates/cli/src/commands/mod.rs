//! Subcommand implementations

pub mod bulk;
pub mod catalog;
pub mod insights;
pub mod size;
