//! Optional filtering and conflict configuration.
//!
//! Without a configuration file every regular file under the source directory
//! is organized and destination conflicts are reported as errors. A TOML file
//! passed with `--config` can narrow the set of files and choose another
//! conflict policy:
//!
//! ```toml
//! [filters]
//! enable_hidden_files = true
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db", "desktop.ini"]
//! patterns = ["node_modules/**", "*.part"]
//! extensions = ["tmp", "bak"]
//! regex = ["^~\\$"]
//!
//! [filters.include]
//! patterns = ["keep/**"]
//!
//! [organize]
//! on_conflict = "rename"
//! ```
//!
//! Glob patterns are matched against the path relative to the source
//! directory; regexes are matched against the file name only.

use glob::Pattern;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::file_organizer::ConflictPolicy;

/// Errors that can occur during configuration loading and compilation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(#[from] toml::de::Error),
    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidGlobPattern { pattern: String, reason: String },
    /// Invalid regex pattern provided.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizerConfig {
    #[serde(default)]
    pub filters: FilterRules,

    #[serde(default)]
    pub organize: OrganizeSettings,
}

/// Which files take part in a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether files whose name starts with `.` are organized. Defaults to true.
    #[serde(default = "default_enable_hidden_files")]
    pub enable_hidden_files: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Whitelist, overrides every exclude rule.
    #[serde(default)]
    pub include: IncludeRules,
}

fn default_enable_hidden_files() -> bool {
    true
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            enable_hidden_files: default_enable_hidden_files(),
            exclude: ExcludeRules::default(),
            include: IncludeRules::default(),
        }
    }
}

/// Rules for leaving files where they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames (e.g. "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns relative to the source directory (e.g. "cache/**").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Extensions without the dot, compared case-insensitively.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regexes matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

/// Settings for the move step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizeSettings {
    #[serde(default)]
    pub on_conflict: ConflictPolicy,
}

impl OrganizerConfig {
    /// Loads the configuration from `config_path`, or the defaults if none.
    ///
    /// No file is ever picked up implicitly.
    ///
    /// # Errors
    ///
    /// Returns an error if the given file is missing, unreadable or not valid TOML.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Compiles the filter rules into matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex pattern is invalid.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }
}

/// Filter rules with every pattern parsed once up front.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl Default for CompiledFilters {
    /// Filters that let every file through.
    fn default() -> Self {
        Self {
            enable_hidden_files: true,
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
            include_patterns: Vec::new(),
        }
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|e| ConfigError::InvalidGlobPattern {
                pattern: pattern.clone(),
                reason: e.msg.to_string(),
            })
        })
        .collect()
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns: compile_globs(&rules.exclude.patterns)?,
            exclude_regexes,
            include_patterns: compile_globs(&rules.include.patterns)?,
        })
    }

    /// Checks whether a file takes part in the run.
    ///
    /// `relative_path` is the file's path relative to the source directory.
    /// Checks run in this order, first decisive match wins:
    /// 1. Include patterns - always include
    /// 2. Hidden files, when disabled - exclude
    /// 3. Exact filename - exclude
    /// 4. Extension - exclude
    /// 5. Glob pattern - exclude
    /// 6. Regex on the file name - exclude
    pub fn should_include(&self, relative_path: &Path) -> bool {
        let file_name = relative_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self
            .include_patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative_path))
        {
            return true;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = relative_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative_path))
        {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(toml_text: &str) -> CompiledFilters {
        let config: OrganizerConfig = toml::from_str(toml_text).expect("valid toml");
        config.compile_filters().expect("valid filters")
    }

    #[test]
    fn test_defaults_include_everything() {
        let config = OrganizerConfig::load(None).unwrap();
        assert!(config.filters.enable_hidden_files);
        assert_eq!(config.organize.on_conflict, ConflictPolicy::Error);

        let filters = config.compile_filters().unwrap();
        assert!(filters.should_include(Path::new(".bashrc")));
        assert!(filters.should_include(Path::new("sub/c.xyz")));
    }

    #[test]
    fn test_empty_file_parses_to_defaults() {
        let config: OrganizerConfig = toml::from_str("").unwrap();
        assert!(config.filters.enable_hidden_files);
        assert_eq!(config.organize.on_conflict, ConflictPolicy::Error);
    }

    #[test]
    fn test_on_conflict_setting() {
        let config: OrganizerConfig = toml::from_str(
            r#"
[organize]
on_conflict = "rename"
"#,
        )
        .unwrap();
        assert_eq!(config.organize.on_conflict, ConflictPolicy::Rename);
    }

    #[test]
    fn test_unknown_conflict_policy_rejected() {
        let result: Result<OrganizerConfig, _> = toml::from_str(
            r#"
[organize]
on_conflict = "merge"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_hidden_files_can_be_disabled() {
        let filters = compile(
            r#"
[filters]
enable_hidden_files = false
"#,
        );
        assert!(!filters.should_include(Path::new(".DS_Store")));
        assert!(!filters.should_include(Path::new("sub/.env")));
        assert!(filters.should_include(Path::new("notes.txt")));
    }

    #[test]
    fn test_exclude_filename_and_extension() {
        let filters = compile(
            r#"
[filters.exclude]
filenames = ["Thumbs.db"]
extensions = ["tmp", ".bak"]
"#,
        );
        assert!(!filters.should_include(Path::new("photos/Thumbs.db")));
        assert!(!filters.should_include(Path::new("draft.TMP")));
        assert!(!filters.should_include(Path::new("old.bak")));
        assert!(filters.should_include(Path::new("draft.txt")));
    }

    #[test]
    fn test_exclude_glob_is_relative_to_source() {
        let filters = compile(
            r#"
[filters.exclude]
patterns = ["cache/**", "**/logs/**"]
"#,
        );
        assert!(!filters.should_include(Path::new("cache/blob.bin")));
        assert!(!filters.should_include(Path::new("app/logs/run.log")));
        assert!(filters.should_include(Path::new("my_logs/run.log")));
        assert!(filters.should_include(Path::new("app/cache.txt")));
    }

    #[test]
    fn test_exclude_regex_on_file_name() {
        let filters = compile(
            r#"
[filters.exclude]
regex = ['^~\$']
"#,
        );
        assert!(!filters.should_include(Path::new("docs/~$report.docx")));
        assert!(filters.should_include(Path::new("docs/report.docx")));
    }

    #[test]
    fn test_include_overrides_exclude() {
        let filters = compile(
            r#"
[filters.exclude]
extensions = ["log"]

[filters.include]
patterns = ["keep/**"]
"#,
        );
        assert!(filters.should_include(Path::new("keep/app.log")));
        assert!(!filters.should_include(Path::new("other/app.log")));
    }

    #[test]
    fn test_invalid_patterns_return_errors() {
        let config: OrganizerConfig = toml::from_str(
            r#"
[filters.exclude]
regex = ["[invalid("]
"#,
        )
        .unwrap();
        assert!(matches!(
            config.compile_filters(),
            Err(ConfigError::InvalidRegexPattern { .. })
        ));

        let config: OrganizerConfig = toml::from_str(
            r#"
[filters.exclude]
patterns = ["[invalid"]
"#,
        )
        .unwrap();
        assert!(matches!(
            config.compile_filters(),
            Err(ConfigError::InvalidGlobPattern { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = OrganizerConfig::load(Some(Path::new("/no/such/organizer.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("organizer.toml");
        fs::write(&path, "[organize]\non_conflict = \"overwrite\"\n").unwrap();

        let config = OrganizerConfig::load(Some(&path)).unwrap();
        assert_eq!(config.organize.on_conflict, ConflictPolicy::Overwrite);
    }
}
