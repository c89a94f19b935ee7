//! smart-organizer - sort a directory tree into category folders
//!
//! This library walks a source directory, classifies every regular file by its
//! extension, and moves it into `<target>/<Category>/`. The binary wraps it in
//! an interactive command-line tool.

pub mod cli;
pub mod config;
pub mod file_category;
pub mod file_organizer;
pub mod output;
pub mod report;
pub mod walker;

pub use cli::{Cli, CliError, run};
pub use config::{CompiledFilters, ConfigError, OrganizerConfig};
pub use file_category::{Category, FileMapper, classify};
pub use file_organizer::{ConflictPolicy, FileOrganizer, MoveRecord, OrganizeError};
pub use report::{RunReport, RunSummary};
pub use walker::{DirectoryWalker, WalkError, WalkOptions};
